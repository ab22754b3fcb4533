// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the module registry

use std::sync::Arc;
use thiserror::Error;

/// Separator used when rendering a resolution chain
pub const CHAIN_SEPARATOR: &str = " => ";

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, ModuleError>;

/// Errors that can occur while defining or resolving modules
///
/// Errors are cheap to clone so a single failed resolution can be handed
/// to every caller waiting on it.
#[derive(Debug, Clone, Error)]
pub enum ModuleError {
    /// Invalid descriptor, factory shape or registry configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A module was requested again while it was still being resolved
    #[error("loop dependencies found: {}", .path.join(CHAIN_SEPARATOR))]
    CyclicDependency {
        /// The resolution chain, ending with the repeated module id
        path: Vec<String>,
    },

    /// The module factory failed
    #[error("{error}")]
    Factory {
        /// Id of the module whose factory failed
        module: String,
        /// The error raised by the factory
        error: Arc<anyhow::Error>,
    },

    /// The registry was cleared while the caller waited for a definition
    #[error("registry was cleared while waiting for module '{module}'")]
    Abandoned {
        /// The requested name or id
        module: String,
    },
}

impl ModuleError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Classify an error raised by the factory of `module`.
    ///
    /// Registry errors surfacing through a factory (a dependency's cycle
    /// error propagated with `?`, possibly under added context) keep their
    /// own kind. Anything else is attributed to the factory.
    pub fn from_factory(module: &str, error: anyhow::Error) -> Self {
        match error.downcast_ref::<ModuleError>() {
            Some(inner) => inner.clone(),
            None => Self::Factory {
                module: module.to_string(),
                error: Arc::new(error),
            },
        }
    }

    /// Returns true for cycle errors
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::CyclicDependency { .. })
    }

    /// The cycle path, if this is a cycle error
    pub fn cycle_path(&self) -> Option<&[String]> {
        match self {
            Self::CyclicDependency { path } => Some(path),
            _ => None,
        }
    }

    /// The original factory error, for downcasting
    pub fn factory_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Factory { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[derive(Debug, Error)]
    #[error("disk on fire")]
    struct DiskError;

    #[test]
    fn test_cycle_message() {
        let err = ModuleError::CyclicDependency {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "loop dependencies found: a => b => a");
        assert!(err.is_cycle());
        assert_eq!(err.cycle_path().map(|p| p.len()), Some(3));
    }

    #[test]
    fn test_factory_error_keeps_message() {
        let err = ModuleError::from_factory("m", anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "boom");
        assert!(!err.is_cycle());
        match &err {
            ModuleError::Factory { module, .. } => assert_eq!(module, "m"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_factory_error_downcast() {
        let err = ModuleError::from_factory("m", anyhow::Error::new(DiskError));
        let source = err.factory_error().unwrap();
        assert!(source.downcast_ref::<DiskError>().is_some());
    }

    #[test]
    fn test_nested_cycle_is_normalized() {
        let cycle = ModuleError::CyclicDependency {
            path: vec!["x".into(), "x".into()],
        };
        let wrapped: anyhow::Result<()> = Err(cycle).context("while loading y");
        let err = ModuleError::from_factory("y", wrapped.unwrap_err());
        assert_eq!(err.cycle_path().unwrap(), ["x", "x"]);
    }
}
