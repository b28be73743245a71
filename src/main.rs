use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use feedback_overlay::annotate::{export, settings_store, OverlaySettings};
use feedback_overlay::logging;
use feedback_overlay::replay::{run_script, ReplayScript};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "overlay_replay",
    about = "Replay a recorded overlay session and write the exported image"
)]
struct Cli {
    /// JSON script with viewport, document, page elements and commands.
    script: PathBuf,

    /// Settings file; defaults to the one next to the executable.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Output PNG; defaults to a timestamped file in the export folder.
    #[arg(long)]
    out: Option<PathBuf>,

    #[arg(long)]
    debug: bool,

    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn load_settings(path: Option<&Path>) -> Result<OverlaySettings> {
    match path {
        Some(path) => Ok(settings_store::load_from_path(path)?.unwrap_or_default()),
        None => settings_store::load(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug, cli.log_file.clone());

    let settings = load_settings(cli.settings.as_deref())?;
    let script = ReplayScript::load(&cli.script)?;
    let report = run_script(script, settings)?;

    let image = match report.export {
        Some(ref export) => export,
        None => {
            tracing::info!("screenshot excluded; writing the overlay canvas instead");
            &report.overlay
        }
    };

    let out = match cli.out {
        Some(out) => out,
        None => export::export_path(&export::ensure_output_folder()?, Local::now()),
    };
    export::write_png(image, &out)?;
    tracing::info!(path = %out.display(), "image written");

    println!(
        "{}",
        serde_json::to_string_pretty(&report.regions).context("serialize regions")?
    );
    Ok(())
}
