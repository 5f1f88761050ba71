//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject mutually exclusive verb defaults
//! - Validate value ranges (limits > 0, bind address parses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AutorouteConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AutorouteConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("routing.all_verbs_by_default and routing.hidden_by_default are mutually exclusive")]
    ConflictingVerbDefaults,

    #[error("discovery.roots must name at least one directory")]
    NoRoots,

    #[error("discovery.extensions must not be empty")]
    NoExtensions,

    #[error("root prefix `{0}` must start with `/`")]
    InvalidRootPrefix(String),

    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),

    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &AutorouteConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.routing.all_verbs_by_default && config.routing.hidden_by_default {
        errors.push(ValidationError::ConflictingVerbDefaults);
    }

    if config.discovery.roots.is_empty() {
        errors.push(ValidationError::NoRoots);
    }
    for root in &config.discovery.roots {
        if !root.prefix.starts_with('/') {
            errors.push(ValidationError::InvalidRootPrefix(root.prefix.clone()));
        }
    }

    if config.discovery.extensions.is_empty() {
        errors.push(ValidationError::NoExtensions);
    }

    if config.body.json_limit_bytes == 0 {
        errors.push(ValidationError::ZeroLimit("body.json_limit_bytes"));
    }
    if config.body.urlencoded_limit_bytes == 0 {
        errors.push(ValidationError::ZeroLimit("body.urlencoded_limit_bytes"));
    }
    if config.uploads.default_limit_bytes == 0 {
        errors.push(ValidationError::ZeroLimit("uploads.default_limit_bytes"));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RootConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AutorouteConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AutorouteConfig::default();
        config.routing.all_verbs_by_default = true;
        config.routing.hidden_by_default = true;
        config.discovery.roots = vec![RootConfig {
            path: "routes".into(),
            prefix: "api".into(),
        }];
        config.uploads.default_limit_bytes = 0;
        config.listener.bind_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ConflictingVerbDefaults,
                ValidationError::InvalidRootPrefix("api".into()),
                ValidationError::ZeroLimit("uploads.default_limit_bytes"),
                ValidationError::InvalidBindAddress("nowhere".into()),
            ]
        );
    }

    #[test]
    fn test_no_roots() {
        let mut config = AutorouteConfig::default();
        config.discovery.roots.clear();
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::NoRoots]
        );
    }
}
