//! Config command - View and manage AuditDesk configuration
//!
//! Provides the `auditdesk config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON)
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use auditdesk_core::{config::Config, domain::AuditCategory};

use crate::context::CliContext;

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "api.base_url")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx),
            ConfigCommand::Set { key, value } => self.execute_set(ctx, key, value),
            ConfigCommand::Validate => self.execute_validate(ctx),
        }
    }

    /// Show current configuration
    fn execute_show(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config_path = ctx.config_path();
        let config = ctx.config();

        info!(config_path = %config_path.display(), "Showing configuration");

        if ctx.is_json() {
            let json = serde_json::to_value(config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", config_path.display()));
            formatter.info("");

            let yaml = serde_yaml::to_string(config)
                .context("Failed to serialize configuration to YAML")?;

            for line in yaml.lines() {
                formatter.info(line);
            }
        }

        Ok(())
    }

    /// Set a configuration value using dot-notation
    fn execute_set(&self, ctx: &CliContext, key: &str, value: &str) -> Result<()> {
        let formatter = ctx.formatter();
        let config_path = ctx.config_path();
        let mut config = ctx.config().clone();

        info!(key = %key, value = %value, "Setting configuration value");

        apply_config_value(&mut config, key, value)?;

        // Validate the new config before saving
        let error_msgs: Vec<String> = config.validate().iter().map(|e| e.to_string()).collect();
        if !error_msgs.is_empty() {
            if ctx.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "value": value,
                    "errors": error_msgs,
                }));
            } else {
                formatter.error(&format!(
                    "Invalid value for '{}': {}",
                    key,
                    error_msgs.join("; ")
                ));
            }
            anyhow::bail!("Configuration not saved");
        }

        config
            .save(config_path)
            .context("Failed to write configuration file")?;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "key": key,
                "value": value,
                "config_path": config_path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Set {} = {}", key, value));
            formatter.info(&format!("Saved to {}", config_path.display()));
        }

        Ok(())
    }

    /// Validate configuration file
    fn execute_validate(&self, ctx: &CliContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config_path = ctx.config_path();

        // Load the file explicitly; the context already fell back to defaults
        let config = match Config::load(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                if !config_path.exists() {
                    if ctx.is_json() {
                        formatter.print_json(&serde_json::json!({
                            "valid": false,
                            "config_path": config_path.display().to_string(),
                            "errors": ["Configuration file not found. Using defaults."],
                        }));
                    } else {
                        formatter.info(&format!(
                            "Configuration file not found at {}",
                            config_path.display()
                        ));
                        formatter.info("Using default configuration. Run 'auditdesk config set <key> <value>' to create one.");
                    }
                    return Ok(());
                }

                if ctx.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "config_path": config_path.display().to_string(),
                        "errors": [format!("Failed to parse configuration: {}", e)],
                    }));
                } else {
                    formatter.error(&format!("Failed to parse configuration: {}", e));
                    formatter.info(&format!("File: {}", config_path.display()));
                }
                anyhow::bail!("Configuration file is invalid");
            }
        };

        info!(config_path = %config_path.display(), "Validating configuration");

        let errors = config.validate();

        if ctx.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", config_path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            formatter.info(&format!("File: {}", config_path.display()));
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("Configuration file is invalid")
        }
    }
}

/// Apply a dot-notation key/value pair to a Config struct
///
/// Supported keys:
/// - api.base_url, api.request_timeout_secs, api.connect_timeout_secs
/// - audits.default_category, audits.reconcile_max_attempts
/// - session.keyring_service, session.credentials_file
/// - logging.level
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        // --- api ---
        "api.base_url" => {
            config.api.base_url = value.trim_end_matches('/').to_string();
        }
        "api.request_timeout_secs" => {
            config.api.request_timeout_secs = value
                .parse::<u64>()
                .context("Expected a positive integer for api.request_timeout_secs")?;
        }
        "api.connect_timeout_secs" => {
            config.api.connect_timeout_secs = value
                .parse::<u64>()
                .context("Expected a positive integer for api.connect_timeout_secs")?;
        }

        // --- audits ---
        "audits.default_category" => {
            config.audits.default_category = value
                .parse::<AuditCategory>()
                .context("Expected 'internal' or 'external' for audits.default_category")?;
        }
        "audits.reconcile_max_attempts" => {
            config.audits.reconcile_max_attempts = value
                .parse::<u32>()
                .context("Expected a positive integer for audits.reconcile_max_attempts")?;
        }

        // --- session ---
        "session.keyring_service" => {
            config.session.keyring_service = value.to_string();
        }
        "session.credentials_file" => {
            config.session.credentials_file = PathBuf::from(value);
        }

        // --- logging ---
        "logging.level" => {
            config.logging.level = value.to_lowercase();
        }

        _ => anyhow::bail!("Unknown configuration key: {}", key),
    }

    Ok(())
}
