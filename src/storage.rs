use std::fs::OpenOptions;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::formats::DayReport;

pub fn day_output_path(out_dir: &Path, day_id: &str) -> anyhow::Result<PathBuf> {
    let day_id = day_id.trim();
    if day_id.is_empty()
        || day_id == "."
        || day_id == ".."
        || day_id.contains(['/', '\\'])
    {
        anyhow::bail!("day identifier is not usable as a file name: {day_id:?}");
    }
    Ok(out_dir.join(format!("{day_id}.json")))
}

/// Writes `<out_dir>/<day_id>.json` holding the day's TOC roots.
pub fn write_day(out_dir: &Path, report: &DayReport, force: bool) -> anyhow::Result<PathBuf> {
    let path = day_output_path(out_dir, &report.day_id)?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create output dir: {}", out_dir.display()))?;

    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let file = options.open(&path).with_context(|| {
        if path.exists() && !force {
            format!(
                "day output already exists (use --force to overwrite): {}",
                path.display()
            )
        } else {
            format!("open day output: {}", path.display())
        }
    })?;

    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, &report.roots).context("serialize day output")?;
    out.write_all(b"\n").context("write day output newline")?;
    out.flush().context("flush day output")?;

    Ok(path)
}
