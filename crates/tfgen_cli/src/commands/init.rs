//! Init command - Build and register tools from a run configuration.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::{info, warn};

use tfgen_core::{ReviewMode, RunConfig, ToolRegistry};
use tfgen_iac::{InitReport, SnapshotDiscovery, ToolInitializer};

#[derive(Args)]
pub struct InitArgs {
    /// Run configuration file (.yaml, .yml, .json or .toml)
    #[arg(short, long, env = "TFGEN_CONFIG")]
    config: PathBuf,

    /// Directory of variable snapshot files
    #[arg(short, long)]
    snapshots: Option<PathBuf>,

    /// Override how review-request plan tools are emitted
    #[arg(long, value_enum)]
    review_mode: Option<ReviewModeArg>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReviewModeArg {
    Off,
    Replace,
    Additional,
}

impl From<ReviewModeArg> for ReviewMode {
    fn from(arg: ReviewModeArg) -> Self {
        match arg {
            ReviewModeArg::Off => ReviewMode::Off,
            ReviewModeArg::Replace => ReviewMode::Replace,
            ReviewModeArg::Additional => ReviewMode::Additional,
        }
    }
}

pub async fn execute(args: InitArgs) -> Result<()> {
    let mut config = RunConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load configuration {:?}", args.config))?;
    if let Some(mode) = args.review_mode {
        config.terraform.review_mode = mode.into();
    }
    info!("Loaded configuration from {:?}", args.config);

    let discovery = match &args.snapshots {
        Some(dir) => SnapshotDiscovery::load(dir)?,
        None => {
            if config.has_module_sources() {
                warn!("No snapshot directory given; module variable discovery will fail");
            }
            SnapshotDiscovery::default()
        }
    };

    let registry = Arc::new(ToolRegistry::new());
    let initializer = ToolInitializer::new(config, Arc::new(discovery), registry.clone());
    let report = initializer.initialize().await?;
    info!(
        "Registered {} tool(s) in category {}",
        report.total(),
        initializer.config().tools.category
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &registry);
    }
    Ok(())
}

fn print_report(report: &InitReport, registry: &ToolRegistry) {
    println!("✅ Registered {} tool(s)", registry.len());
    for category in registry.categories() {
        println!();
        println!("  📂 {}", category);
        for tool in registry.tools(&category) {
            println!("    🔧 {:<40} {}", tool.name, tool.arg_names().join(", "));
        }
    }
    if let Some(modules) = &report.modules {
        println!();
        println!("⏱️  Module discovery took {} ms", modules.duration_ms());
    }

    let failures = report.failures();
    if !failures.is_empty() {
        println!();
        println!("⚠️  {} module(s) failed:", failures.len());
        for failure in failures {
            println!("   - {}", failure);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn args(config: PathBuf, snapshots: Option<PathBuf>) -> InitArgs {
        InitArgs {
            config,
            snapshots,
            review_mode: Some(ReviewModeArg::Replace),
            json: true,
        }
    }

    #[tokio::test]
    async fn test_execute_with_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("tfgen.json");
        fs::write(
            &config,
            r#"{"terraform": {"modules": "terraform-aws-modules/vpc/aws"}}"#,
        )
        .unwrap();
        let snapshots = dir.path().join("snapshots");
        fs::create_dir(&snapshots).unwrap();
        fs::write(
            snapshots.join("vpc.json"),
            r#"{"source": "terraform-aws-modules/vpc/aws", "variables": {"cidr": {"type": "string"}}}"#,
        )
        .unwrap();

        execute(args(config, Some(snapshots))).await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_text_report_with_providers() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("tfgen.yaml");
        fs::write(
            &config,
            "terraform:\n  enable_reverse_terraform: true\n  reverse_terraform_providers: [aws]\n",
        )
        .unwrap();

        let mut text = args(config, None);
        text.json = false;
        execute(text).await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_without_tools() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("tfgen.yaml");
        fs::write(&config, "tools:\n  name_prefix: tf\n").unwrap();

        let err = execute(args(config, None)).await.unwrap_err();
        assert!(err.downcast_ref::<tfgen_iac::IacError>().is_some());
    }
}
