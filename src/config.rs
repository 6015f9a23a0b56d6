//! Configuration System
//!
//! Layered configuration: built-in defaults, the global file, workspace
//! files, then `WOOD__*` environment variables. Validation reports every
//! problem at once rather than stopping at the first.

use crate::cdn::{CdnInvalidator, CloudflareConfig, CloudflareInvalidator, DryRunInvalidator};
use crate::deploy::{DeployConfig, DeployOrdering};
use crate::error::ApiError;
use crate::invalidation::{AggregationConfig, InvalidatorConfig};
use crate::logging::LoggingConfig;
use crate::sync::SyncConfig;
use crate::tree::path::normalize_served_key;
use crate::tree::walker::WalkerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WoodConfig {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub walker: WalkerConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub invalidation: InvalidationSettings,

    #[serde(default)]
    pub store: StoreConfig,

    /// CDNs to invalidate, in submission order
    #[serde(default)]
    pub cdn: Vec<CdnConfig>,

    #[serde(default)]
    pub deploy: DeploySettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Local tree to deploy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory to deploy, relative to the workspace root
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// Remote object store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory mirrored as the object store
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Key prefix inside the store; objects outside it are left alone
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Aggregation and batching settings, as one `[invalidation]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationSettings {
    #[serde(default = "default_collapse_threshold")]
    pub collapse_threshold: f64,
    #[serde(default = "default_min_changed_children")]
    pub min_changed_children: usize,
    #[serde(default)]
    pub include_added: bool,
    #[serde(default = "default_max_patterns_per_request")]
    pub max_patterns_per_request: usize,
    #[serde(default = "default_invalidation_concurrency")]
    pub max_concurrent: usize,
}

fn default_collapse_threshold() -> f64 {
    AggregationConfig::default().collapse_threshold
}

fn default_min_changed_children() -> usize {
    AggregationConfig::default().min_changed_children
}

fn default_max_patterns_per_request() -> usize {
    InvalidatorConfig::default().max_patterns_per_request
}

fn default_invalidation_concurrency() -> usize {
    InvalidatorConfig::default().max_concurrent
}

impl Default for InvalidationSettings {
    fn default() -> Self {
        Self {
            collapse_threshold: default_collapse_threshold(),
            min_changed_children: default_min_changed_children(),
            include_added: false,
            max_patterns_per_request: default_max_patterns_per_request(),
            max_concurrent: default_invalidation_concurrency(),
        }
    }
}

impl InvalidationSettings {
    pub fn aggregation(&self) -> AggregationConfig {
        AggregationConfig {
            collapse_threshold: self.collapse_threshold,
            min_changed_children: self.min_changed_children,
            include_added: self.include_added,
        }
    }

    pub fn invalidator(&self) -> InvalidatorConfig {
        InvalidatorConfig {
            max_patterns_per_request: self.max_patterns_per_request,
            max_concurrent: self.max_concurrent,
        }
    }
}

/// One CDN, tagged by provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum CdnConfig {
    Cloudflare(CloudflareConfig),
    DryRun {
        #[serde(default = "default_dry_run_name")]
        name: String,
        #[serde(default = "default_max_patterns_per_request")]
        max_patterns_per_request: usize,
    },
}

fn default_dry_run_name() -> String {
    "dry-run".to_string()
}

impl CdnConfig {
    /// Construct the adapter this entry describes
    pub fn build(&self) -> Result<Arc<dyn CdnInvalidator>, ApiError> {
        Ok(match self {
            CdnConfig::Cloudflare(config) => Arc::new(CloudflareInvalidator::new(config.clone())?),
            CdnConfig::DryRun {
                name,
                max_patterns_per_request,
            } => Arc::new(DryRunInvalidator::new(name.clone(), *max_patterns_per_request)),
        })
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            CdnConfig::Cloudflare(config) => {
                if config.zone_id.trim().is_empty() {
                    return Err("Cloudflare zone_id cannot be empty".to_string());
                }
                if !config.url_prefix.starts_with("http://")
                    && !config.url_prefix.starts_with("https://")
                {
                    return Err(format!(
                        "Cloudflare url_prefix must be an http(s) URL: {}",
                        config.url_prefix
                    ));
                }
                let has_key = config.email.is_some() && config.api_key.is_some();
                if config.api_token.is_none() && !has_key {
                    return Err("Cloudflare requires api_token or email and api_key".to_string());
                }
                if config.max_patterns_per_request == Some(0) {
                    return Err("max_patterns_per_request must be at least 1".to_string());
                }
                Ok(())
            }
            CdnConfig::DryRun {
                max_patterns_per_request,
                ..
            } => {
                if *max_patterns_per_request == 0 {
                    return Err("max_patterns_per_request must be at least 1".to_string());
                }
                Ok(())
            }
        }
    }

    fn label(&self) -> String {
        match self {
            CdnConfig::Cloudflare(config) => format!("cloudflare:{}", config.zone_id),
            CdnConfig::DryRun { name, .. } => name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploySettings {
    #[serde(default)]
    pub ordering: DeployOrdering,
    #[serde(default)]
    pub dry_run: bool,
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Invalidation(String),
    Sync(String),
    Cdn(String, String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Invalidation(msg) => write!(f, "Invalidation: {}", msg),
            ValidationError::Sync(msg) => write!(f, "Sync: {}", msg),
            ValidationError::Cdn(name, msg) => write!(f, "CDN '{}': {}", name, msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl WoodConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let threshold = self.invalidation.collapse_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            errors.push(ValidationError::Invalidation(format!(
                "collapse_threshold must be within (0, 1], got {}",
                threshold
            )));
        }
        if self.invalidation.min_changed_children == 0 {
            errors.push(ValidationError::Invalidation(
                "min_changed_children must be at least 1".to_string(),
            ));
        }
        if self.invalidation.max_patterns_per_request == 0 {
            errors.push(ValidationError::Invalidation(
                "max_patterns_per_request must be at least 1".to_string(),
            ));
        }
        if self.invalidation.max_concurrent == 0 {
            errors.push(ValidationError::Invalidation(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.sync.max_concurrent == 0 {
            errors.push(ValidationError::Sync(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        if let Some(prefix) = &self.store.prefix {
            if let Err(e) = normalize_served_key(prefix) {
                errors.push(ValidationError::Sync(format!(
                    "store.prefix is not a valid key prefix: {}",
                    e
                )));
            }
        }

        for cdn in &self.cdn {
            if let Err(e) = cdn.validate() {
                errors.push(ValidationError::Cdn(cdn.label(), e));
            }
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding every problem into one error
    pub fn validated(self) -> Result<Self, ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(self)
    }

    /// Deployment settings assembled from the individual sections
    pub fn deploy_config(&self) -> DeployConfig {
        DeployConfig {
            ordering: self.deploy.ordering,
            dry_run: self.deploy.dry_run,
            walker: self.walker.clone(),
            sync: self.sync.clone(),
            aggregation: self.invalidation.aggregation(),
            invalidator: self.invalidation.invalidator(),
        }
    }

    /// Local root resolved against the workspace root
    pub fn source_root(&self, workspace_root: &Path) -> Option<PathBuf> {
        self.source
            .root
            .as_ref()
            .map(|root| workspace_root.join(root))
    }

    /// Store directory resolved against the workspace root
    pub fn store_directory(&self, workspace_root: &Path) -> Option<PathBuf> {
        self.store
            .directory
            .as_ref()
            .map(|dir| workspace_root.join(dir))
    }

    /// Build every configured CDN adapter
    pub fn build_cdns(&self) -> Result<Vec<Arc<dyn CdnInvalidator>>, ApiError> {
        self.cdn.iter().map(CdnConfig::build).collect()
    }
}
