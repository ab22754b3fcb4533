// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module factories

use crate::error::{ModuleError, Result};
use crate::module_system::module::{Exports, Module};
use crate::module_system::require::Require;
use crate::value::{Record, Value};
use futures::future::{self, BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Outcome of a factory: `Some(record)` is merged onto the exports
pub type FactoryResult = anyhow::Result<Option<Record>>;

/// Future returned by a function factory
pub type FactoryFuture = BoxFuture<'static, FactoryResult>;

type FactoryFn = dyn Fn(Require, Exports, Module) -> FactoryFuture + Send + Sync;

/// Supplies a module's exports
#[derive(Clone)]
pub enum Factory {
    /// Called with `(require, exports, module)` when the module is first used
    Function(Arc<FactoryFn>),
    /// Already-resolved exports
    Static(Record),
}

impl Factory {
    /// Create an async function factory
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Require, Exports, Module) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FactoryResult> + Send + 'static,
    {
        Factory::Function(Arc::new(move |require, exports, module| {
            f(require, exports, module).boxed()
        }))
    }

    /// Create a factory from a synchronous function
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(Require, Exports, Module) -> FactoryResult + Send + Sync + 'static,
    {
        Factory::Function(Arc::new(move |require, exports, module| {
            future::ready(f(require, exports, module)).boxed()
        }))
    }

    /// Create a data module
    pub fn data(record: Record) -> Self {
        Factory::Static(record)
    }

    /// Create a data module from a JSON object
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        match Value::from_json(&json) {
            Value::Object(record) => Ok(Factory::Static(record)),
            other => Err(ModuleError::configuration(format!(
                "factory should be a function or object, got {}",
                other.type_of()
            ))),
        }
    }

    /// Returns true for data modules
    pub fn is_static(&self) -> bool {
        matches!(self, Factory::Static(_))
    }
}

impl From<Record> for Factory {
    fn from(record: Record) -> Self {
        Factory::Static(record)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factory::Function(_) => write!(f, "Factory::Function"),
            Factory::Static(record) => f.debug_tuple("Factory::Static").field(record).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_object() {
        let factory = Factory::from_json(json!({ "value": 4 })).unwrap();
        match factory {
            Factory::Static(record) => assert_eq!(record["value"], Value::Number(4.0)),
            other => panic!("unexpected factory: {other:?}"),
        }
    }

    #[test]
    fn test_from_json_rejects_scalars() {
        for json in [json!(4), json!("text"), json!(null), json!([1, 2])] {
            let err = Factory::from_json(json).unwrap_err();
            assert!(matches!(err, ModuleError::Configuration(_)));
            assert!(err.to_string().contains("factory should be a function or object"));
        }
    }

    #[test]
    fn test_sync_factory_is_function() {
        let factory = Factory::sync(|_, _, _| Ok(None));
        assert!(!factory.is_static());
    }
}
