//! av - resolve and explode mechanical assemblies from the command line
//!
//! Loads an assembly project, resolves assembled positions and prints the
//! displayed position of every part for one or more explode factors.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;

use av_core::{
    AssemblyProject, ExplodedView, InferenceResult, MachineCatalog, ViewerConfig, apply_inference,
};

#[derive(Parser)]
#[command(name = "av")]
#[command(about = "Resolve and explode mechanical assemblies", long_about = None)]
struct Cli {
    /// Assembly project file (.ron)
    project: PathBuf,
    /// Explode factor in [0, 1]
    #[arg(short, long, default_value_t = 0.0)]
    factor: f32,
    /// Print N+1 evenly spaced frames from assembled to fully exploded
    #[arg(short, long)]
    steps: Option<u32>,
    /// Viewer configuration file (.ron)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Machine catalog file (.ron); overrides the configured catalog
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Machine id in the catalog (default: project name)
    #[arg(long)]
    machine: Option<String>,
    /// Inference result to apply (.json)
    #[arg(long)]
    inference: Option<PathBuf>,
    /// Logical mesh scale
    #[arg(long, default_value_t = 1.0)]
    scale: f32,
}

fn main() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "av_core=info,av_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    let mut project = AssemblyProject::load(&cli.project)
        .with_context(|| format!("Failed to load project {}", cli.project.display()))?;

    let forced_axis = apply_catalog(cli, &config, &mut project)?;

    let base_dir = cli.project.parent().unwrap_or(Path::new("."));
    let mut session = project.build_session(base_dir, cli.scale)?;
    if let Some(solution) = &session.solution
        && !solution.skipped.is_empty()
    {
        tracing::warn!("{} mate steps could not be solved", solution.skipped.len());
    }
    session.resolver.resolve_all()?;

    if let Some(path) = &cli.inference {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read inference result {}", path.display()))?;
        let result = InferenceResult::from_json(&json)?;
        apply_inference(&mut session.resolver, &result, &config.inference)?;
    }

    let view = ExplodedView::new(config.explode.clone(), config.inference.confidence_threshold)
        .with_forced_axis(forced_axis);
    let snapshot = session.resolver.snapshot();

    for factor in factors(cli) {
        println!("# factor {:.3}", factor);
        for part in view.frame(session.resolver.parts(), &snapshot, factor) {
            let p = part.position;
            println!("{}  {:.4} {:.4} {:.4}", part.name, p.x, p.y, p.z);
        }
    }

    Ok(())
}

/// Merge catalog data into the project; returns the machine's forced axis
fn apply_catalog(
    cli: &Cli,
    config: &ViewerConfig,
    project: &mut AssemblyProject,
) -> Result<Option<Vec3>> {
    let Some(path) = cli.catalog.as_ref().or(config.catalog_path.as_ref()) else {
        return Ok(None);
    };
    let catalog = MachineCatalog::load(path)
        .with_context(|| format!("Failed to load catalog {}", path.display()))?;
    let id = cli.machine.as_deref().unwrap_or(&project.name);
    match catalog.get(id) {
        Some(machine) => {
            tracing::info!("Applying catalog entry '{}'", machine.id);
            if project.parts.is_empty() {
                project.parts = machine.to_parts();
            } else {
                machine.apply(&mut project.parts);
            }
            Ok(machine.forced_axis)
        }
        None if cli.machine.is_some() => anyhow::bail!("Machine '{}' not found in catalog", id),
        None => {
            tracing::warn!("No catalog entry for '{}'", id);
            Ok(None)
        }
    }
}

fn factors(cli: &Cli) -> Vec<f32> {
    match cli.steps {
        Some(0) | None => vec![cli.factor.clamp(0.0, 1.0)],
        Some(n) => (0..=n).map(|i| i as f32 / n as f32).collect(),
    }
}
