use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};
use utpl::{TemplateOptions, Templates};

/// Render one template from a directory of `.html` templates.
#[derive(Parser, Debug)]
#[command(name = "utpl", version, about)]
struct Args {
    /// Directory walked for templates
    dir: PathBuf,
    /// Template name, relative to `dir` without the extension
    name: String,
    /// JSON file used as the render context
    context: Option<PathBuf>,
    /// Layout template the page is wrapped in
    #[arg(long)]
    layout: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_env("UTPL_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let dir = args.dir.to_string_lossy();
    let registry = Templates::new();
    let options = TemplateOptions::new().assets_path(&dir);
    registry
        .configure(&options)
        .with_context(|| format!("failed to load templates from {}", dir))?;

    let context: Option<serde_json::Value> = match &args.context {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Some(
                serde_json::from_str(&raw)
                    .with_context(|| format!("invalid JSON in {}", path.display()))?,
            )
        }
        None => None,
    };

    let output = registry
        .render(&args.name, context.as_ref(), args.layout.as_deref())
        .with_context(|| format!("failed to render {}", args.name))?;
    print!("{}", output);
    Ok(())
}
