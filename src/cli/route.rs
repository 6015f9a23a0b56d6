//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::output::CommandOutput;
use crate::cli::parse::{Commands, ConfigCommands, TargetArgs};
use crate::cli::presentation::{
    format_comparison_json, format_comparison_text, format_config, format_deploy_report_json,
    format_deploy_report_text, format_plan_json, format_plan_text, format_tree_json,
    format_tree_text,
};
use crate::cli::command_name;
use crate::concurrency::CancelToken;
use crate::config::{ConfigLoader, WoodConfig};
use crate::deploy::{DeployOrdering, Deployment};
use crate::error::ApiError;
use crate::store::{DirectoryStore, ObjectStore, PrefixedStore};
use crate::tree::TreeBuilder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};

/// Runtime context for CLI execution: workspace root and merged configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: WoodConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Ok(Self::with_config(workspace_root, config))
    }

    pub fn with_config(workspace_root: PathBuf, config: WoodConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn config(&self) -> &WoodConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub async fn execute(
        &self,
        command: &Commands,
        cancel: &CancelToken,
    ) -> Result<CommandOutput, ApiError> {
        let name = command_name(command);
        let started = Instant::now();
        let result = self
            .execute_inner(command, cancel)
            .instrument(info_span!("command", name = %name))
            .await;
        info!(
            command = %name,
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    async fn execute_inner(
        &self,
        command: &Commands,
        cancel: &CancelToken,
    ) -> Result<CommandOutput, ApiError> {
        match command {
            Commands::Hash { path, format } => self.handle_hash(path.as_deref(), format).await,
            Commands::Compare {
                target,
                all,
                format,
            } => self.handle_compare(target, *all, format).await,
            Commands::Plan { target, format } => self.handle_plan(target, format).await,
            Commands::Deploy {
                target,
                dry_run,
                concurrent,
                format,
            } => {
                self.handle_deploy(target, *dry_run, *concurrent, format, cancel)
                    .await
            }
            Commands::Config { command } => self.handle_config(command),
        }
    }

    async fn handle_hash(&self, path: Option<&Path>, format: &str) -> Result<CommandOutput, ApiError> {
        let root = match path {
            Some(path) => path.to_path_buf(),
            None => self.local_root(None)?,
        };
        let builder = TreeBuilder::new(root).with_walker_config(self.config.walker.clone());
        let tree = tokio::task::spawn_blocking(move || builder.build())
            .await
            .map_err(|e| ApiError::Runtime(format!("Tree build task failed: {}", e)))??;

        let text = if format == "json" {
            format_tree_json(&tree)?
        } else {
            format_tree_text(&tree)
        };
        Ok(CommandOutput::ok(text))
    }

    async fn handle_compare(
        &self,
        target: &TargetArgs,
        include_unchanged: bool,
        format: &str,
    ) -> Result<CommandOutput, ApiError> {
        let plan = self.deployment(target, Vec::new())?.plan().await?;
        let summary = plan.comparison.summary();
        let text = if format == "json" {
            format_comparison_json(&summary)?
        } else {
            format_comparison_text(&summary, include_unchanged)
        };
        Ok(CommandOutput::ok(text))
    }

    async fn handle_plan(&self, target: &TargetArgs, format: &str) -> Result<CommandOutput, ApiError> {
        let plan = self.deployment(target, Vec::new())?.plan().await?;
        let text = if format == "json" {
            format_plan_json(&plan)?
        } else {
            format_plan_text(&plan)
        };
        Ok(CommandOutput::ok(text))
    }

    async fn handle_deploy(
        &self,
        target: &TargetArgs,
        dry_run: bool,
        concurrent: bool,
        format: &str,
        cancel: &CancelToken,
    ) -> Result<CommandOutput, ApiError> {
        let config = self.config.clone().validated()?;
        let cdns = config.build_cdns()?;
        if cdns.is_empty() {
            debug!("No CDNs configured, deploy will only sync the store");
        }

        let mut deployment = self.deployment(target, cdns)?;
        if dry_run {
            deployment.config_mut().dry_run = true;
        }
        if concurrent {
            deployment.config_mut().ordering = DeployOrdering::Concurrent;
        }

        let report = deployment.run(cancel).await?;
        let text = if format == "json" {
            format_deploy_report_json(&report)?
        } else {
            format_deploy_report_text(&report)
        };
        Ok(CommandOutput {
            text,
            failed: report.has_failures(),
        })
    }

    fn handle_config(&self, command: &ConfigCommands) -> Result<CommandOutput, ApiError> {
        match command {
            ConfigCommands::Show { format } => Ok(CommandOutput::ok(format_config(
                &self.config,
                format,
            )?)),
            ConfigCommands::Validate => {
                self.config.clone().validated()?;
                Ok(CommandOutput::ok("Configuration is valid".to_string()))
            }
        }
    }

    fn deployment(
        &self,
        target: &TargetArgs,
        cdns: Vec<Arc<dyn crate::cdn::CdnInvalidator>>,
    ) -> Result<Deployment, ApiError> {
        let local_root = self.local_root(target.local.as_deref())?;
        let store = self.store(target.store_dir.as_deref())?;
        Ok(Deployment::new(
            local_root,
            store,
            cdns,
            self.config.deploy_config(),
        ))
    }

    fn local_root(&self, explicit: Option<&Path>) -> Result<PathBuf, ApiError> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.config.source_root(&self.workspace_root))
            .ok_or_else(|| {
                ApiError::ConfigError(
                    "No local directory given and source.root is not configured".to_string(),
                )
            })
    }

    fn store(&self, explicit: Option<&Path>) -> Result<Arc<dyn ObjectStore>, ApiError> {
        let directory = explicit
            .map(Path::to_path_buf)
            .or_else(|| self.config.store_directory(&self.workspace_root))
            .ok_or_else(|| {
                ApiError::ConfigError(
                    "No store directory given and store.directory is not configured".to_string(),
                )
            })?;
        let store: Arc<dyn ObjectStore> = Arc::new(DirectoryStore::new(directory));
        match self.config.store.prefix.as_deref() {
            Some(prefix) => Ok(Arc::new(PrefixedStore::new(store, prefix)?)),
            None => Ok(store),
        }
    }
}
