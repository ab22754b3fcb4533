// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module system implementation
//!
//! Modules are declared with a factory and resolved on first use:
//!
//! - `define()` registers a resolver under the module's name and id
//! - `use()` / `require()` run the factory once and share its exports
//! - requests for undefined modules wait until a matching `define()`
//! - a module appearing twice on one resolution path is a cycle error

mod chain;
mod descriptor;
mod factory;
mod module;
mod registry;
mod require;
mod resolver;
mod waiter;

pub use chain::ResolutionChain;
pub use descriptor::ModuleDescriptor;
pub use factory::{Factory, FactoryFuture, FactoryResult};
pub use module::{Exports, Module};
pub use registry::{Registry, RegistryState, ResolveFuture};
pub use require::Require;
pub use resolver::{ModuleResolver, ResolutionTask};
