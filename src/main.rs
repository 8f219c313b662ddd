//! `license-tree`: resolve a project's transitive dependencies from their
//! registries and flag copyleft licenses.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load config ([`config::load_config`]).
//! 3. Locate manifests ([`detector`]) and extract top-level requirements ([`analyzer`]).
//! 4. Resolve each ecosystem's dependency forest concurrently ([`resolver`], [`registry`]),
//!    inferring every package's license ([`license`]).
//! 5. Flatten the forests and build tree documents ([`graph`]).
//! 6. Render the requested report ([`report`]).
//! 7. Exit `0`, or `1` with `--fail-on-copyleft` when a copyleft license was found.

mod analyzer;
mod cli;
mod config;
mod detector;
mod error;
mod graph;
mod license;
mod models;
mod registry;
mod report;
mod resolver;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use analyzer::Analyzer;
use cli::{Cli, ReportFormat};
use config::{load_config, Config};
use detector::detect_ecosystems;
use models::{Ecosystem, RequirementSpec};
use registry::npm::NpmRegistry;
use registry::pypi::PypiRegistry;
use registry::Registry;
use report::Report;
use resolver::{Resolution, Resolver};

const DEFAULT_HTML_REPORT: &str = "dependency-license-report.html";

/// Result of resolving one ecosystem.
struct EcosystemRun {
    ecosystem: Ecosystem,
    top_level: usize,
    resolution: Resolution,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    // Resolve project path
    let path = cli
        .path
        .canonicalize()
        .unwrap_or_else(|_| cli.path.clone());

    let config = load_config(&path, cli.config.as_deref())?;

    let excluded: Vec<Ecosystem> = cli.exclude_lang.iter().map(Into::into).collect();
    let show_progress = !cli.quiet && cli.report == ReportFormat::Terminal;
    let report = scan(&path, &config, &excluded, cli.dev, show_progress).await?;
    info!("{}", report.headline());

    match cli.report {
        ReportFormat::Terminal => {
            report::terminal::render(&report, cli.verbose, cli.quiet)?;
        }
        ReportFormat::Json => {
            let json = report::json::render(&report)?;
            match &cli.output {
                Some(out) => std::fs::write(out, json)
                    .with_context(|| format!("failed to write {}", out.display()))?,
                None => println!("{}", json),
            }
        }
        ReportFormat::Html => {
            let out = cli
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HTML_REPORT));
            report::html::write(&report, &out)?;
            if !cli.quiet {
                eprintln!("{} {} generated", "✓".green(), out.display());
            }
        }
    }

    if cli.fail_on_copyleft && report.summary().copyleft > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Resolve every non-excluded ecosystem of the project at `path`.
///
/// A project without manifests still gets one empty tree per ecosystem.
async fn scan(
    path: &Path,
    config: &Config,
    excluded: &[Ecosystem],
    include_dev: bool,
    show_progress: bool,
) -> Result<Report> {
    let detected: Vec<Ecosystem> = detect_ecosystems(path)
        .into_iter()
        .filter(|e| !excluded.contains(e))
        .collect();
    if detected.is_empty() {
        warn!(
            "No package.json or requirements.txt found in {}",
            path.display()
        );
    }

    let ecosystems: Vec<Ecosystem> = [Ecosystem::Node, Ecosystem::Python]
        .into_iter()
        .filter(|e| !excluded.contains(e))
        .collect();

    let client = registry::build_client(&config.registry)?;
    let runs = join_all(ecosystems.iter().map(|&ecosystem| {
        run_ecosystem(ecosystem, path, config, client.clone(), include_dev, show_progress)
    }))
    .await;

    let mut report = Report {
        project: path.to_path_buf(),
        top_level: Vec::new(),
        records: Vec::new(),
        trees: Vec::new(),
        unresolved: 0,
    };
    for run in runs {
        let run = run?;
        report.top_level.push((run.ecosystem, run.top_level));
        report.records.extend(graph::flatten(&run.resolution.forest));
        report
            .trees
            .push(graph::to_tree_document(run.ecosystem, &run.resolution.forest));
        report.unresolved += run.resolution.errors.len();
    }
    Ok(report)
}

async fn run_ecosystem(
    ecosystem: Ecosystem,
    path: &Path,
    config: &Config,
    client: reqwest::Client,
    include_dev: bool,
    show_progress: bool,
) -> Result<EcosystemRun> {
    let analyzed = match ecosystem {
        Ecosystem::Node => analyzer::node::NodeAnalyzer::new(include_dev).analyze(path),
        Ecosystem::Python => analyzer::python::PythonAnalyzer::new().analyze(path),
    };
    // An unreadable manifest only empties this ecosystem.
    let requirements = analyzed.unwrap_or_else(|e| {
        warn!("Skipping {} dependencies: {:#}", ecosystem, e);
        Vec::new()
    });
    let top_level = requirements.len();

    let progress = if show_progress && top_level > 0 {
        Some(spinner(ecosystem)?)
    } else {
        None
    };

    let resolution = match ecosystem {
        Ecosystem::Node => {
            let registry = NpmRegistry::new(client, &config.registry);
            resolve_with(registry, config, requirements, progress.clone()).await
        }
        Ecosystem::Python => {
            let registry = PypiRegistry::new(client, &config.registry);
            resolve_with(registry, config, requirements, progress.clone()).await
        }
    };

    if let Some(pb) = progress {
        pb.finish_with_message("done");
    }

    Ok(EcosystemRun {
        ecosystem,
        top_level,
        resolution,
    })
}

async fn resolve_with<R: Registry>(
    registry: R,
    config: &Config,
    requirements: Vec<RequirementSpec>,
    progress: Option<ProgressBar>,
) -> Resolution {
    let mut resolver = Resolver::new(registry, config.scrape.clone(), config.resolver.concurrency);
    if let Some(pb) = progress {
        resolver = resolver.with_progress(pb);
    }
    resolver.resolve(requirements).await
}

fn spinner(ecosystem: Ecosystem) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {prefix:.cyan} {pos} resolved {msg}")?,
    );
    pb.set_prefix(ecosystem.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}
