// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # acmd
//!
//! Asynchronous in-process module registry.
//!
//! This crate is the host-facing surface: a process-wide default
//! [`Registry`] plus free functions operating on it. Hosts that want
//! isolated registries (tests, plugins, sandboxes) create their own
//! [`Registry`] values instead.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use acmd::{factory, record};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     acmd::init_tracing("acmd_core=debug");
//!
//!     acmd::define("settings", record! { "port" => 8080 })?;
//!     acmd::define("server", factory!(|require, exports, _module| {
//!         let settings = require.require("settings").await?;
//!         exports.set("port", settings.get("port").unwrap_or_default());
//!         Ok(None)
//!     }))?;
//!
//!     let server = acmd::use_module("server").await?;
//!     println!("listening on {}", server.get("port").unwrap_or_default());
//!     Ok(())
//! }
//! ```
//!
//! The default registry reads its configuration once, on first use, via
//! [`RegistryConfig::load`]: defaults, then the TOML file named by
//! `ACMD_CONFIG`, then `ACMD_*` environment overrides.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::sync::LazyLock;
use tracing::warn;

// Re-exports
pub use acmd_core::{
    Exports, Factory, FactoryResult, Module, ModuleDescriptor, ModuleError, OrphanPolicy, Record,
    Redefinition, Registry, RegistryConfig, Require, ResolutionChain, ResolveFuture, Result, Value,
    factory, record,
};

/// Version of the acmd crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

static GLOBAL: LazyLock<Registry> = LazyLock::new(|| {
    let config = RegistryConfig::load().unwrap_or_else(|err| {
        warn!("Ignoring registry configuration: {}", err);
        RegistryConfig::default()
    });
    Registry::with_config(config)
});

/// The process-wide default registry
pub fn global() -> &'static Registry {
    &GLOBAL
}

/// Define a module in the default registry
pub fn define(descriptor: impl Into<ModuleDescriptor>, factory: impl Into<Factory>) -> Result<()> {
    global().define(descriptor, factory)
}

/// Request a module from the default registry
pub fn use_module(name: &str) -> ResolveFuture {
    global().use_module(name)
}

/// Check if a module is defined in the default registry
pub fn is_defined(name: &str) -> bool {
    global().is_defined(name)
}

/// Reset the default registry
pub fn clear() {
    global().clear()
}

/// Install a `tracing` subscriber filtered by `filter` (EnvFilter syntax).
///
/// `RUST_LOG` takes precedence when set. Does nothing if a global
/// subscriber is already installed.
pub fn init_tracing(filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
