//! Session configuration
//!
//! Options can be built in code or read from a TOML file:
//!
//! ```toml
//! new_args_attribute = "_new_args"
//! state_args_attribute = "_setstate_args"
//! fake_packages = ["renpy"]
//! builtin_overrides = true
//! ```

use crate::namespace::validate_name;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options for a decode session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionOptions {
    /// Attribute that receives constructor arguments the default
    /// constructor cannot honour
    pub new_args_attribute: String,

    /// Attribute that receives state payloads of unrecognized shape
    pub state_args_attribute: String,

    /// Packages mounted as fake at session start, shadowing real modules
    pub fake_packages: Vec<String>,

    /// Start from the built-in override table
    pub builtin_overrides: bool,
}

fn default_new_args_attribute() -> String {
    "_new_args".to_string()
}

fn default_state_args_attribute() -> String {
    "_setstate_args".to_string()
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            new_args_attribute: default_new_args_attribute(),
            state_args_attribute: default_state_args_attribute(),
            fake_packages: Vec::new(),
            builtin_overrides: true,
        }
    }
}

impl SessionOptions {
    /// Parse options from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let options: SessionOptions =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Read options from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Serialize options to TOML text
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Add a package to mount as fake
    pub fn with_fake_package(mut self, name: impl Into<String>) -> Self {
        self.fake_packages.push(name.into());
        self
    }

    /// Check option values
    pub fn validate(&self) -> Result<()> {
        if self.new_args_attribute.is_empty() {
            return Err(Error::Config("new_args_attribute must not be empty".to_string()));
        }
        if self.state_args_attribute.is_empty() {
            return Err(Error::Config(
                "state_args_attribute must not be empty".to_string(),
            ));
        }
        for package in &self.fake_packages {
            validate_name(package)
                .map_err(|_| Error::Config(format!("invalid fake package name: {:?}", package)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = SessionOptions::default();
        assert_eq!(options.new_args_attribute, "_new_args");
        assert_eq!(options.state_args_attribute, "_setstate_args");
        assert!(options.fake_packages.is_empty());
        assert!(options.builtin_overrides);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let options = SessionOptions::from_toml_str(r#"fake_packages = ["renpy"]"#).unwrap();
        assert_eq!(options.fake_packages, vec!["renpy".to_string()]);
        assert_eq!(options.new_args_attribute, "_new_args");
        assert!(options.builtin_overrides);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            SessionOptions::from_toml_str("fake_packages = 3"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            SessionOptions::from_toml_str(r#"new_args_attribute = """#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            SessionOptions::from_toml_str(r#"fake_packages = ["a..b"]"#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_round_trip_through_file() {
        let options = SessionOptions {
            state_args_attribute: "__state__".to_string(),
            builtin_overrides: false,
            ..SessionOptions::default()
        }
        .with_fake_package("game.store");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(options.to_toml_string().unwrap().as_bytes())
            .unwrap();

        let loaded = SessionOptions::from_file(file.path()).unwrap();
        assert_eq!(loaded, options);
    }

    #[test]
    fn test_missing_file() {
        let result = SessionOptions::from_file(Path::new("/nonexistent/revenant.toml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
