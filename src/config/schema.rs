//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for route discovery
//! and serving. All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AutorouteConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Where and how route modules are discovered.
    pub discovery: DiscoveryConfig,

    /// Path and verb resolution options.
    pub routing: RoutingOptions,

    /// Standard body-decoding middleware.
    pub body: BodyConfig,

    /// File-upload middleware.
    pub uploads: UploadConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Route discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Root directories to scan, each with the prefix its routes live under.
    pub roots: Vec<RootConfig>,

    /// File extensions treated as route modules.
    pub extensions: Vec<String>,

    /// File names never treated as route modules.
    pub skip_files: Vec<String>,

    /// Log every discovered route at startup.
    pub log_discovered_routes: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            roots: vec![RootConfig::default()],
            extensions: vec!["rs".to_string()],
            skip_files: vec!["mod.rs".to_string()],
            log_discovered_routes: false,
        }
    }
}

/// One directory tree of route modules.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RootConfig {
    /// Directory to walk.
    pub path: PathBuf,

    /// URL prefix for everything below `path`.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("src/routes"),
            prefix: default_prefix(),
        }
    }
}

fn default_prefix() -> String {
    "/".to_string()
}

/// Path and verb resolution options.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RoutingOptions {
    /// Use a class's own type name as its route segment when no override is set.
    pub use_type_name_for_prefix: bool,

    /// Handlers without declared verbs answer every verb.
    pub all_verbs_by_default: bool,

    /// Handlers without declared verbs are not routed at all.
    /// Mutually exclusive with `all_verbs_by_default`.
    pub hidden_by_default: bool,
}

/// What a handler with no declared verbs resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbDefault {
    Get,
    All,
    Hidden,
}

impl RoutingOptions {
    /// The single verb-default policy in force.
    ///
    /// Validation rejects configs setting both flags; should one slip through,
    /// `all` wins.
    pub fn verb_default(&self) -> VerbDefault {
        if self.all_verbs_by_default {
            VerbDefault::All
        } else if self.hidden_by_default {
            VerbDefault::Hidden
        } else {
            VerbDefault::Get
        }
    }
}

/// Standard body-decoding middleware configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Do not attach the JSON/urlencoded pair to body-capable routes.
    pub disabled: bool,

    /// Maximum JSON body size in bytes.
    pub json_limit_bytes: usize,

    /// Maximum urlencoded body size in bytes.
    pub urlencoded_limit_bytes: usize,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            json_limit_bytes: 100 * 1024,
            urlencoded_limit_bytes: 100 * 1024,
        }
    }
}

/// File-upload middleware configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Reject any handler declaring an upload.
    pub disabled: bool,

    /// Limit used by `file_upload()` without an explicit size.
    pub default_limit_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            default_limit_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty output for development, JSON for production.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
