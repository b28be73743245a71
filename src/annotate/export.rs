use crate::annotate::surface::Surface;
use anyhow::{anyhow, Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

pub const OVERLAY_EXPORT_SUBDIR: &str = "overlay_exports";

pub fn exe_relative_output_folder_from_path(exe_path: &Path) -> Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(OVERLAY_EXPORT_SUBDIR))
}

pub fn ensure_output_folder() -> Result<PathBuf> {
    let exe_path = std::env::current_exe().context("resolve current executable")?;
    let output = exe_relative_output_folder_from_path(&exe_path)?;
    fs::create_dir_all(&output)
        .with_context(|| format!("create overlay export folder {}", output.display()))?;
    Ok(output)
}

pub fn timestamped_stem(now: chrono::DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

pub fn export_filename(stem: &str) -> String {
    format!("{stem}_feedback.png")
}

pub fn export_path(output_dir: &Path, now: chrono::DateTime<Local>) -> PathBuf {
    output_dir.join(export_filename(&timestamped_stem(now)))
}

pub fn write_png(surface: &Surface, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create overlay export folder {}", parent.display()))?;
    }
    let bytes = surface.encode_png()?;
    fs::write(path, bytes).with_context(|| format!("write overlay export {}", path.display()))
}
