//! `depwise analyze` command implementation.
//!
//! Loads a snapshot (optionally refreshed from a real `package.json`),
//! layers the configuration, queries the registry unless offline, and prints
//! the JSON report. Findings never change the exit code.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use depwise_analyzer::{analyze, Advisor, AdvisorOptions};
use depwise_config::{AdvisorSettings, CliOverrides, PackageJson, Settings};
use depwise_core::error::{DepwiseError, DepwiseResult};
use depwise_core::types::{AnalysisReport, ProjectSnapshot, Strategy};
use depwise_registry::{
    AuthConfig, CachedRegistry, MetadataCache, RegistryClient, RegistryIndex, RetryConfig,
};
use tracing::{debug, info};

use super::CommandContext;

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Snapshot JSON describing the manifests and the installed tree
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: Utf8PathBuf,

    /// Candidate strategy: conservative, balanced or aggressive
    #[arg(long)]
    pub strategy: Option<Strategy>,

    /// Allow upgrades across a major version
    #[arg(long)]
    pub allow_major: bool,

    /// Preferred version for a package; repeatable
    #[arg(long = "target", value_name = "NAME=VERSION", value_parser = parse_target)]
    pub targets: Vec<(String, String)>,

    /// Skip registry lookups
    #[arg(long)]
    pub offline: bool,

    /// Registry base URL
    #[arg(long, value_name = "URL")]
    pub registry: Option<String>,

    /// package.json whose manifest and overrides replace the snapshot's
    #[arg(long, value_name = "PACKAGE_JSON")]
    pub manifest: Option<Utf8PathBuf>,

    /// Pretty-print the report
    #[arg(long)]
    pub pretty: bool,
}

impl AnalyzeArgs {
    pub fn cli_overrides(&self) -> CliOverrides {
        CliOverrides {
            strategy: self.strategy,
            allow_major: self.allow_major,
            targets: self.targets.clone(),
            offline: self.offline,
            registry: self.registry.clone(),
        }
    }
}

/// Parse `name=version`; scoped names keep their `@`
pub fn parse_target(value: &str) -> Result<(String, String), String> {
    let (name, version) = value
        .rsplit_once('=')
        .ok_or_else(|| format!("'{}' is not of the form name=version", value))?;
    let (name, version) = (name.trim(), version.trim());
    if name.is_empty() || version.is_empty() {
        return Err(format!("'{}' is missing a package name or version", value));
    }
    Ok((name.to_string(), version.to_string()))
}

/// Execute the `depwise analyze` command
pub async fn execute(args: AnalyzeArgs, ctx: &CommandContext) -> DepwiseResult<()> {
    let report = run(&args, ctx).await?;

    ctx.output.document(&render(&report, args.pretty)?);

    for warning in &report.warnings {
        ctx.output.warn(warning);
    }
    let summary = &report.summary;
    ctx.output.success(&format!(
        "{} conflicts ({} errors, {} warnings, {} infos) across {} packages, {} decisions",
        report.conflicts.len(),
        summary.errors,
        summary.warnings,
        summary.infos,
        summary.packages_scanned,
        report.decisions.len()
    ));
    Ok(())
}

/// Load inputs and produce the report
pub async fn run(args: &AnalyzeArgs, ctx: &CommandContext) -> DepwiseResult<AnalysisReport> {
    let mut snapshot = load_snapshot(&ctx.cwd.join(&args.snapshot)).await?;

    if let Some(manifest) = &args.manifest {
        let package_json = depwise_config::json::load_from_file(&ctx.cwd.join(manifest)).await?;
        apply_manifest(&mut snapshot, &package_json);
    }

    let loaded = ctx.load_config(&args.cli_overrides()).await?;
    let settings = &loaded.settings;
    let options = advisor_options(&settings.advisor);
    debug!(strategy = %options.strategy, allow_major = options.allow_major, "Advisor options");

    if settings.registry.offline {
        info!("Offline: registry lookups skipped");
        return Ok(analyze(&snapshot, &RegistryIndex::new(), &options));
    }

    let advisor = Advisor::new(online_registry(settings)?, options);
    Ok(advisor.analyze(&snapshot).await)
}

/// Read and parse a snapshot file
pub async fn load_snapshot(path: &Utf8Path) -> DepwiseResult<ProjectSnapshot> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DepwiseError::io(format!("Failed to read {}", path), e))?;

    serde_json::from_str(&content).map_err(|e| DepwiseError::JsonParse {
        file: path.to_string(),
        message: e.to_string(),
    })
}

/// Replace the snapshot's root manifest, manager and overrides
pub fn apply_manifest(snapshot: &mut ProjectSnapshot, package_json: &PackageJson) {
    snapshot.root = package_json.to_manifest();
    if let Some(manager) = package_json.package_manager() {
        snapshot.package_manager = manager;
    }
    snapshot.overrides = package_json.normalize_overrides();
}

pub fn advisor_options(settings: &AdvisorSettings) -> AdvisorOptions {
    AdvisorOptions {
        strategy: settings.strategy,
        allow_major: settings.allow_major,
        targets: settings.targets.clone(),
    }
}

fn online_registry(settings: &Settings) -> DepwiseResult<CachedRegistry<RegistryClient>> {
    let auth = AuthConfig {
        token: settings.registry.token.clone(),
    };
    let client = RegistryClient::with_config(&settings.registry.url, auth, RetryConfig::default())?;
    let cache = Arc::new(MetadataCache::new().with_default_ttl(settings.cache_ttl()));

    Ok(CachedRegistry::with_cache(client, cache).with_concurrency(settings.registry.concurrency))
}

pub fn render(report: &AnalysisReport, pretty: bool) -> DepwiseResult<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(report)
    } else {
        serde_json::to_string(report)
    };
    rendered.map_err(|e| DepwiseError::JsonParse {
        file: "report".to_string(),
        message: e.to_string(),
    })
}
