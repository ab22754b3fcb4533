// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module resolver - lazy, memoized factory invocation

use crate::error::{ModuleError, Result};
use crate::module_system::chain::ResolutionChain;
use crate::module_system::descriptor::ModuleDescriptor;
use crate::module_system::factory::Factory;
use crate::module_system::module::{Exports, Module};
use crate::module_system::registry::{RegistryState, ResolveFuture};
use crate::module_system::require::Require;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use std::sync::{Arc, OnceLock, Weak};
use tracing::debug;

/// The single, shared resolution of one module
pub type ResolutionTask = Shared<BoxFuture<'static, Result<Exports>>>;

/// Owns one module definition and runs its factory at most once
pub struct ModuleResolver {
    descriptor: Arc<ModuleDescriptor>,
    id: Arc<str>,
    factory: Factory,
    task: OnceLock<ResolutionTask>,
}

impl ModuleResolver {
    /// Create a resolver; `id` is the canonical module id of `descriptor`
    pub fn new(descriptor: ModuleDescriptor, id: String, factory: Factory) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            id: Arc::from(id),
            factory,
            task: OnceLock::new(),
        }
    }

    /// The lookup name
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// The canonical module id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The descriptor this resolver was defined with
    pub fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    /// Whether the factory has been started
    pub fn is_started(&self) -> bool {
        self.task.get().is_some()
    }

    /// Resolve the module's exports.
    ///
    /// `chain` is the path of the requesting module, `None` for a
    /// top-level `use`. The first call starts the factory; later calls
    /// share its outcome. A caller whose chain already holds this module,
    /// or whose resolution this module is already waiting on, gets a cycle
    /// error without touching the shared task.
    ///
    /// The shared task only holds a weak handle to `state`, so a task
    /// nobody awaits any more does not pin its generation.
    pub fn resolve(
        &self,
        state: &Arc<RegistryState>,
        chain: Option<ResolutionChain>,
    ) -> ResolveFuture {
        let mut chain = chain.unwrap_or_default();
        let edge = chain.enter(&self.id).and_then(|()| chain.register_wait());
        let edge = match edge {
            Ok(edge) => edge,
            Err(err) => {
                debug!(module = %self.id, "circular dependency: {}", err);
                return future::ready(Err(err)).boxed();
            }
        };

        let task = self
            .task
            .get_or_init(|| self.start(Arc::downgrade(state), chain))
            .clone();
        async move {
            let outcome = task.await;
            drop(edge);
            outcome
        }
        .boxed()
    }

    fn start(&self, state: Weak<RegistryState>, mut chain: ResolutionChain) -> ResolutionTask {
        let descriptor = Arc::clone(&self.descriptor);
        let id = Arc::clone(&self.id);
        let factory = self.factory.clone();

        async move {
            let module = Module::new(descriptor, Arc::clone(&id));
            let exports = module.exports().clone();

            let outcome = match factory {
                Factory::Function(factory) => {
                    debug!(module = %id, depth = chain.depth(), "Running module factory");
                    let require = Require::new(state, chain.clone());
                    factory(require, exports.clone(), module).await
                }
                Factory::Static(record) => Ok(Some(record)),
            };

            chain.exit(&id);

            match outcome {
                Ok(returned) => {
                    if let Some(record) = returned {
                        exports.merge(record);
                    }
                    debug!(module = %id, exports = exports.len(), "Module resolved");
                    Ok(exports)
                }
                Err(err) => {
                    let err = ModuleError::from_factory(&id, err);
                    debug!(module = %id, "Module failed: {}", err);
                    Err(err)
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl std::fmt::Debug for ModuleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleResolver")
            .field("id", &self.id)
            .field("factory", &self.factory)
            .field("started", &self.is_started())
            .finish()
    }
}
