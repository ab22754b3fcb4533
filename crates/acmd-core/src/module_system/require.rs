// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The require() handle given to factories

use crate::error::ModuleError;
use crate::module_system::chain::ResolutionChain;
use crate::module_system::registry::{RegistryState, ResolveFuture};
use futures::future::{self, FutureExt};
use std::fmt;
use std::sync::{Arc, Weak};

/// Resolves dependencies on behalf of a module factory.
///
/// Lookups go to the registry generation the module was defined in and
/// carry the module's resolution chain, so requiring an ancestor fails
/// with a cycle error instead of waiting on itself.
///
/// The generation is held weakly; it lives as long as some top-level
/// request against it is still pending. A handle that outlives it fails
/// every lookup with [`ModuleError::Abandoned`].
#[derive(Clone)]
pub struct Require {
    state: Weak<RegistryState>,
    chain: Arc<ResolutionChain>,
}

impl Require {
    pub(crate) fn new(state: Weak<RegistryState>, chain: ResolutionChain) -> Self {
        Self {
            state,
            chain: Arc::new(chain),
        }
    }

    /// Resolve a dependency by name or module id
    pub fn require(&self, name: &str) -> ResolveFuture {
        match self.state.upgrade() {
            Some(state) => state.require(name, Some(ResolutionChain::clone(&self.chain))),
            None => future::ready(Err(ModuleError::Abandoned {
                module: name.to_string(),
            }))
            .boxed(),
        }
    }

    /// The chain leading to the module owning this handle
    pub fn chain(&self) -> &ResolutionChain {
        &self.chain
    }

    /// Check whether `name` is defined in this handle's registry generation
    pub fn is_defined(&self, name: &str) -> bool {
        self.state.upgrade().is_some_and(|state| state.is_defined(name))
    }
}

impl fmt::Debug for Require {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Require")
            .field("generation", &self.state.upgrade().map(|s| s.generation()))
            .field("chain", &self.chain.path())
            .finish()
    }
}
