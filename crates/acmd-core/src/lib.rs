// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # acmd-core
//!
//! The resolution engine behind the `acmd` module registry.
//!
//! Code units declare named, optionally versioned modules with a factory;
//! other code asks for a module by name and gets its exports once every
//! dependency the factory requires has resolved.
//!
//! - Factories run lazily, at most once per definition
//! - Concurrent requests share one resolution and one result
//! - Requests for modules not yet defined wait for the definition
//! - Circular dependencies fail with the full chain, e.g. `a => b => a`
//!
//! The engine does not spawn tasks or depend on a particular runtime;
//! whoever awaits a resolution drives it. That includes waiters: defining
//! a module they wait for hands them the resolution, and polling it is
//! what runs the factory.
//!
//! ## Quick Start
//!
//! ```
//! use acmd_core::{factory, Registry};
//!
//! # futures::executor::block_on(async {
//! let registry = Registry::new();
//! registry.define("greeter", factory!(|require, exports, _module| {
//!     let words = require.require("words").await?;
//!     exports.set("greeting", format!("{} world", words.get("hello").unwrap_or_default()));
//!     Ok(None)
//! }))?;
//! registry.define("words", acmd_core::record! { "hello" => "hello" })?;
//!
//! let greeter = registry.use_module("greeter").await?;
//! assert_eq!(greeter.get("greeting").unwrap().as_str(), Some("hello world"));
//! # Ok::<(), acmd_core::ModuleError>(())
//! # }).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod macros;

pub mod config;
pub mod error;
pub mod module_system;
pub mod value;

// Re-exports
pub use config::{OrphanPolicy, Redefinition, RegistryConfig};
pub use error::{ModuleError, Result};
pub use module_system::{
    Exports, Factory, FactoryFuture, FactoryResult, Module, ModuleDescriptor, ModuleResolver,
    Registry, RegistryState, Require, ResolutionChain, ResolveFuture,
};
pub use value::{NativeFunction, Record, Value};

/// Version of the acmd-core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
