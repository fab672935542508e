//! `check-config` command implementation.

use anyhow::{Context, Result};
use contracts::{StreamCategory, ValidationConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::CheckConfigArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    bucket_count: usize,
    score_category: StreamCategory,
    profile_count: usize,
    rule_count: usize,
    pair_sync: bool,
    group_sync: bool,
}

/// Execute the `check-config` command
pub fn run_check_config(args: &CheckConfigArgs) -> Result<()> {
    let config_path = args
        .config
        .as_ref()
        .map_or_else(|| "<built-in defaults>".to_string(), |p| p.display().to_string());
    info!(config = %config_path, "Validating configuration");

    let result = match config_loader::ConfigLoader::load_or_default(args.config.as_deref()) {
        Ok(config) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            warnings: Some(collect_warnings(&config)).filter(|w| !w.is_empty()),
            summary: Some(summarize(&config)),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    };

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn summarize(config: &ValidationConfig) -> ConfigSummary {
    ConfigSummary {
        version: format!("{:?}", config.version),
        bucket_count: config.bucket_count,
        score_category: config.score_category,
        profile_count: config.profiles.len(),
        rule_count: config.streams.len(),
        pair_sync: config.pair_sync.is_some(),
        group_sync: config.group_sync.is_some(),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &ValidationConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    let mut categories: Vec<StreamCategory> = config.streams.iter().map(|r| r.category).collect();
    categories.sort();
    categories.dedup();
    for category in categories {
        if !config.profiles.iter().any(|p| p.category == category) {
            warnings.push(format!(
                "Category '{category}' has no profile - the default profile will be used"
            ));
        }
    }

    if !config.streams.iter().any(|r| r.category == config.score_category) {
        warnings.push(format!(
            "No rule classifies streams as '{}' - drop and bucket scores will be N/A",
            config.score_category
        ));
    }

    if config.pair_sync.is_none() {
        warnings.push("pair_sync is not configured - intra sync score will be N/A".to_string());
    }
    if config.group_sync.is_none() {
        warnings.push("group_sync is not configured - inter sync score will be N/A".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Buckets: {}", summary.bucket_count);
            println!("  Scored category: {}", summary.score_category);
            println!("  Profiles: {}", summary.profile_count);
            println!("  Classification rules: {}", summary.rule_count);
            println!("  Pair sync: {}", enabled(summary.pair_sync));
            println!("  Group sync: {}", enabled(summary.group_sync));
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
    }
}

fn enabled(flag: bool) -> &'static str {
    if flag { "enabled" } else { "disabled" }
}
