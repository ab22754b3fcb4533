// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module registry - definitions, lookups and waiters

use crate::config::{Redefinition, RegistryConfig};
use crate::error::{ModuleError, Result};
use crate::module_system::chain::ResolutionChain;
use crate::module_system::descriptor::ModuleDescriptor;
use crate::module_system::factory::Factory;
use crate::module_system::module::Exports;
use crate::module_system::resolver::ModuleResolver;
use crate::module_system::waiter::{self, WaiterQueue};
use futures::future::{BoxFuture, FutureExt};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Future resolving to a module's exports
pub type ResolveFuture = BoxFuture<'static, Result<Exports>>;

#[derive(Default)]
struct Namespace {
    /// Resolvers keyed by both bare name and module id
    modules: HashMap<String, Arc<ModuleResolver>>,
    /// Waiters keyed by the name or id they asked for
    waiters: HashMap<String, WaiterQueue>,
}

/// One generation of registry state.
///
/// Top-level requests keep the generation they were made against alive
/// until they settle, so a cleared generation keeps working for
/// resolutions already in flight. Once cleared it is retired: nothing can
/// define modules in it any more.
pub struct RegistryState {
    generation: u64,
    config: Arc<RegistryConfig>,
    namespace: Mutex<Namespace>,
    retired: AtomicBool,
}

impl RegistryState {
    /// Create an empty generation
    pub fn create(config: Arc<RegistryConfig>, generation: u64) -> Arc<Self> {
        Arc::new(Self {
            generation,
            config,
            namespace: Mutex::new(Namespace::default()),
            retired: AtomicBool::new(false),
        })
    }

    /// Generation number, starting at 0
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `clear()` has replaced this generation
    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }

    /// The configuration of this generation
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a module under its name and its module id, then hand the
    /// resolution to everyone already waiting on either key.
    pub fn define(self: &Arc<Self>, descriptor: ModuleDescriptor, factory: Factory) -> Result<()> {
        descriptor.validate()?;
        let id = descriptor.module_id(&self.config.version_separator);
        let resolver = Arc::new(ModuleResolver::new(descriptor, id, factory));
        let name = resolver.name().to_string();
        let id = resolver.id().to_string();

        let mut keys = vec![name];
        if id != keys[0] {
            keys.push(id);
        }

        let waiters = {
            let mut ns = self.namespace.lock();

            if self.config.redefinition == Redefinition::Reject {
                if let Some(key) = keys.iter().find(|key| ns.modules.contains_key(key.as_str())) {
                    return Err(ModuleError::configuration(format!(
                        "module '{key}' is already defined"
                    )));
                }
            }

            let mut waiters = WaiterQueue::default();
            for key in &keys {
                if let Some(previous) = ns.modules.insert(key.clone(), Arc::clone(&resolver)) {
                    warn!(
                        "Definition of '{}' shadows '{}' under key '{}'",
                        resolver.id(),
                        previous.id(),
                        key
                    );
                }
                if let Some(queue) = ns.waiters.remove(key) {
                    waiters.append(queue);
                }
            }
            waiters
        };

        debug!(module = %resolver.id(), generation = self.generation, "Defined module");

        if !waiters.is_empty() {
            let delivered = waiters.deliver(|| resolver.resolve(self, None));
            debug!(module = %resolver.id(), waiters = delivered, "Notified waiters");
        }
        Ok(())
    }

    /// Resolve `name`, or wait until something defines it.
    ///
    /// `chain` is `None` for a top-level request, whose future keeps this
    /// generation alive. The lookup or waiter registration happens now;
    /// the returned future only drives the resolution.
    pub fn require(self: &Arc<Self>, name: &str, chain: Option<ResolutionChain>) -> ResolveFuture {
        if chain.is_some() {
            return self.lookup(name, chain);
        }

        let resolution = self.lookup(name, None);
        let generation = Arc::clone(self);
        async move {
            let outcome = resolution.await;
            drop(generation);
            outcome
        }
        .boxed()
    }

    fn lookup(self: &Arc<Self>, name: &str, chain: Option<ResolutionChain>) -> ResolveFuture {
        let mut ns = self.namespace.lock();
        if let Some(resolver) = ns.modules.get(name).cloned() {
            drop(ns);
            return resolver.resolve(self, chain);
        }

        let policy = self.config.orphaned_waiters;
        if self.is_retired() {
            drop(ns);
            debug!(
                module = name,
                generation = self.generation,
                "Require of undefined module in a cleared registry"
            );
            return waiter::orphaned(name.to_string(), policy);
        }

        let rx = ns.waiters.entry(name.to_string()).or_default().push();
        drop(ns);
        debug!(module = name, generation = self.generation, "Waiting for module definition");
        waiter::wait(rx, name.to_string(), policy)
    }

    /// Check if `name` (bare name or module id) is registered
    pub fn is_defined(&self, name: &str) -> bool {
        self.namespace.lock().modules.contains_key(name)
    }

    /// All registered keys, sorted
    pub fn defined(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.namespace.lock().modules.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of callers waiting for a definition
    pub fn pending(&self) -> usize {
        self.namespace.lock().waiters.values().map(WaiterQueue::len).sum()
    }

    /// Retire this generation and drop every waiter
    fn retire(&self) -> usize {
        self.retired.store(true, Ordering::Release);
        let waiters = std::mem::take(&mut self.namespace.lock().waiters);
        waiters.values().map(WaiterQueue::len).sum()
    }
}

/// Handle to the current registry generation
///
/// # Example
///
/// ```
/// use acmd_core::{factory, record, Registry};
/// use futures::FutureExt;
///
/// let registry = Registry::new();
/// registry.define("config", record! { "debug" => true }).unwrap();
/// registry
///     .define("app", factory!(|require, exports, _module| {
///         let config = require.require("config").await?;
///         exports.set("debug", config.get("debug").unwrap_or_default());
///         Ok(None)
///     }))
///     .unwrap();
///
/// let app = registry.use_module("app").now_or_never().unwrap().unwrap();
/// assert_eq!(app.get("debug").and_then(|v| v.as_bool()), Some(true));
/// ```
pub struct Registry {
    config: Arc<RegistryConfig>,
    state: RwLock<Arc<RegistryState>>,
}

impl Registry {
    /// Create a registry with the default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a registry with `config`
    pub fn with_config(config: RegistryConfig) -> Self {
        let config = Arc::new(config);
        Self {
            state: RwLock::new(RegistryState::create(Arc::clone(&config), 0)),
            config,
        }
    }

    /// The registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The current generation
    pub fn state(&self) -> Arc<RegistryState> {
        Arc::clone(&self.state.read())
    }

    /// Number of `clear()` calls so far
    pub fn generation(&self) -> u64 {
        self.state.read().generation()
    }

    /// Define a module.
    ///
    /// Callers already waiting for the name or the module id are handed
    /// the module's resolution in the order they asked. Defining does not
    /// run the factory: the first waiter to poll its future starts it, and
    /// if every waiter has dropped its future it stays unstarted until the
    /// next `use_module`.
    pub fn define(
        &self,
        descriptor: impl Into<ModuleDescriptor>,
        factory: impl Into<Factory>,
    ) -> Result<()> {
        self.state().define(descriptor.into(), factory.into())
    }

    /// Request a module by name or module id
    pub fn use_module(&self, name: &str) -> ResolveFuture {
        self.state().require(name, None)
    }

    /// Check if a module is defined
    pub fn is_defined(&self, name: &str) -> bool {
        self.state.read().is_defined(name)
    }

    /// All registered keys, sorted
    pub fn defined(&self) -> Vec<String> {
        self.state.read().defined()
    }

    /// Number of callers waiting for a definition
    pub fn pending(&self) -> usize {
        self.state.read().pending()
    }

    /// Start a new, empty generation.
    ///
    /// Resolutions already running finish against the old generation.
    /// Waiters of the old generation are dropped and follow the
    /// configured [`OrphanPolicy`](crate::OrphanPolicy).
    pub fn clear(&self) {
        let retired = {
            let mut state = self.state.write();
            let next = RegistryState::create(Arc::clone(&self.config), state.generation() + 1);
            std::mem::replace(&mut *state, next)
        };

        let abandoned = retired.retire();
        if abandoned > 0 {
            warn!(
                generation = retired.generation(),
                "Registry cleared with {} pending waiters",
                abandoned
            );
        }
        debug!(generation = retired.generation() + 1, "Registry cleared");
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("generation", &self.generation())
            .field("defined", &self.defined())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use futures::FutureExt;

    #[test]
    fn test_define_registers_both_keys() {
        let registry = Registry::new();
        registry
            .define(("m", "2"), record! { "value" => 4 })
            .unwrap();

        assert_eq!(registry.defined(), vec!["m".to_string(), "m#2".to_string()]);
        assert!(registry.is_defined("m"));
        assert!(registry.is_defined("m#2"));
        assert!(!registry.is_defined("m#1"));
    }

    #[test]
    fn test_is_defined_does_not_resolve() {
        let registry = Registry::new();
        registry.define("m", record! {}).unwrap();
        assert!(registry.is_defined("m"));

        let state = registry.state();
        let ns = state.namespace.lock();
        assert!(!ns.modules["m"].is_started());
    }

    #[test]
    fn test_blank_name_rejected() {
        let registry = Registry::new();
        let err = registry.define("", record! {}).unwrap_err();
        assert!(matches!(err, ModuleError::Configuration(_)));
        assert!(registry.defined().is_empty());
    }

    #[test]
    fn test_redefinition_reject() {
        let registry = Registry::with_config(RegistryConfig {
            redefinition: Redefinition::Reject,
            ..RegistryConfig::default()
        });
        registry.define(("m", "1"), record! {}).unwrap();

        let err = registry.define(("m", "2"), record! {}).unwrap_err();
        assert!(err.to_string().contains("'m' is already defined"));
        assert!(!registry.is_defined("m#2"));
    }

    #[test]
    fn test_custom_version_separator() {
        let registry = Registry::with_config(RegistryConfig {
            version_separator: "@".into(),
            ..RegistryConfig::default()
        });
        registry.define(("lodash", "4"), record! {}).unwrap();
        assert!(registry.is_defined("lodash@4"));
        assert!(!registry.is_defined("lodash#4"));
    }

    #[test]
    fn test_pending_counts_waiters() {
        let registry = Registry::new();
        let first = registry.use_module("late");
        let second = registry.use_module("late#1");
        assert_eq!(registry.pending(), 2);

        registry.define(("late", "1"), record! { "ok" => true }).unwrap();
        assert_eq!(registry.pending(), 0);

        for future in [first, second] {
            let exports = future.now_or_never().unwrap().unwrap();
            assert_eq!(exports.get("ok"), Some(crate::Value::Boolean(true)));
        }
    }

    #[test]
    fn test_retired_generation_does_not_queue_waiters() {
        let registry = Registry::new();
        let retired = registry.state();
        registry.clear();
        assert!(retired.is_retired());
        assert!(!registry.state().is_retired());

        let waiting = retired.require("missing", Some(ResolutionChain::new()));
        assert_eq!(retired.pending(), 0);
        assert!(waiting.now_or_never().is_none());
    }

    #[test]
    fn test_generation_advances_on_clear() {
        let registry = Registry::new();
        assert_eq!(registry.generation(), 0);
        registry.clear();
        registry.clear();
        assert_eq!(registry.generation(), 2);
    }
}
