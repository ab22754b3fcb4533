// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module handles and their export records

use crate::module_system::descriptor::ModuleDescriptor;
use crate::value::{Record, Value};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Live export record of a module.
///
/// Clones share the same record; the factory populates it and every
/// caller of `use`/`require` receives a handle to it.
#[derive(Clone, Default)]
pub struct Exports {
    inner: Arc<RwLock<Record>>,
}

impl Exports {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record seeded with `record`
    pub fn from_record(record: Record) -> Self {
        Self {
            inner: Arc::new(RwLock::new(record)),
        }
    }

    /// Get an exported value
    pub fn get(&self, name: &str) -> Option<Value> {
        self.inner.read().get(name).cloned()
    }

    /// Set an exported value
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.inner.write().insert(name.into(), value.into());
    }

    /// Remove an exported value
    pub fn remove(&self, name: &str) -> Option<Value> {
        self.inner.write().remove(name)
    }

    /// Check if an export exists
    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().contains_key(name)
    }

    /// All export names, sorted
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }

    /// Number of exports
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Check if nothing is exported
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Copy of the current record
    pub fn snapshot(&self) -> Record {
        self.inner.read().clone()
    }

    /// Copy every key of `record` onto the exports, overwriting on conflict
    pub fn merge(&self, record: Record) {
        self.inner.write().extend(record);
    }

    /// True when both handles refer to the same record
    pub fn ptr_eq(a: &Exports, b: &Exports) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl fmt::Debug for Exports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Exports").field(&*self.inner.read()).finish()
    }
}

/// The module handle passed to a factory
#[derive(Debug, Clone)]
pub struct Module {
    descriptor: Arc<ModuleDescriptor>,
    id: Arc<str>,
    exports: Exports,
}

impl Module {
    pub(crate) fn new(descriptor: Arc<ModuleDescriptor>, id: Arc<str>) -> Self {
        Self {
            descriptor,
            id,
            exports: Exports::new(),
        }
    }

    /// The module name
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// The module version, if any
    pub fn version(&self) -> Option<&str> {
        self.descriptor.version()
    }

    /// The canonical module id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The live export record
    pub fn exports(&self) -> &Exports {
        &self.exports
    }
}
