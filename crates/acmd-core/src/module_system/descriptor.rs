// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module descriptors and identity

use crate::error::{ModuleError, Result};

/// Name and optional version of a module
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleDescriptor {
    /// Lookup name
    pub name: String,
    /// Version tag
    pub version: Option<String>,
}

impl ModuleDescriptor {
    /// Create an unversioned descriptor
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    /// Attach a version tag
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// The version tag, with an empty tag treated as absent
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref().filter(|v| !v.is_empty())
    }

    /// Canonical module id: the name, or `name + separator + version`
    pub fn module_id(&self, separator: &str) -> String {
        match self.version() {
            Some(version) => format!("{}{}{}", self.name, separator, version),
            None => self.name.clone(),
        }
    }

    /// Reject descriptors with a blank name
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ModuleError::configuration("module name must not be empty"));
        }
        Ok(())
    }
}

impl From<&str> for ModuleDescriptor {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ModuleDescriptor {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<(&str, &str)> for ModuleDescriptor {
    fn from((name, version): (&str, &str)) -> Self {
        Self::new(name).with_version(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_id() {
        assert_eq!(ModuleDescriptor::new("m").module_id("#"), "m");
        assert_eq!(ModuleDescriptor::from(("m", "2")).module_id("#"), "m#2");
        assert_eq!(ModuleDescriptor::from(("m", "2")).module_id("@"), "m@2");
    }

    #[test]
    fn test_empty_version_is_absent() {
        let descriptor = ModuleDescriptor::from(("m", ""));
        assert_eq!(descriptor.version(), None);
        assert_eq!(descriptor.module_id("#"), "m");
    }

    #[test]
    fn test_string_descriptor_is_not_parsed() {
        let descriptor = ModuleDescriptor::from("m#2");
        assert_eq!(descriptor.name, "m#2");
        assert_eq!(descriptor.version(), None);
    }

    #[test]
    fn test_validate() {
        assert!(ModuleDescriptor::new("ok").validate().is_ok());
        assert!(ModuleDescriptor::new("  ").validate().is_err());
    }
}
