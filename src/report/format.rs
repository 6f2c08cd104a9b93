//! Terminal summaries printed to stdout at the end of a run.

use std::path::Path;

use crate::app::pipeline::DownloadReport;
use crate::domain::{DownloadConfig, MIB, TileOutcome};
use crate::export::ModelBundle;

fn mb(bytes: u64) -> f64 {
    bytes as f64 / MIB as f64
}

/// What a `download` run is about to do, shown before the confirmation prompt.
pub fn format_download_plan(config: &DownloadConfig) -> String {
    let mut out = String::new();
    out.push_str("=== sprep - tiled Earth Engine download ===\n");
    out.push_str(&format!("Region: {}\n", config.bounds));
    out.push_str(&format!(
        "Grid: {}x{} = {} tiles per source\n",
        config.grid.nx(),
        config.grid.ny(),
        config.grid.cell_count()
    ));
    out.push_str(&format!("Scale: {} m, tile ceiling {:.0}MB\n", config.scale_m, mb(config.max_tile_bytes)));
    for s in &config.sources {
        out.push_str(&format!("  {:<12} {:<8} -> {}\n", s.label, s.kind.as_str(), s.output.display()));
    }
    out
}

/// Per-source tile counts, skipped cells and merge results.
pub fn format_download_summary(report: &DownloadReport) -> String {
    let mut out = String::new();
    out.push_str("=== Download summary ===\n");

    for s in &report.sources {
        let bytes: u64 = s
            .tiles
            .iter()
            .map(|t| match &t.outcome {
                TileOutcome::Downloaded { bytes, .. } => *bytes,
                TileOutcome::Skipped(_) => 0,
            })
            .sum();
        out.push_str(&format!(
            "{}: {}/{} tiles ({:.1}MB downloaded)\n",
            s.source.label,
            s.downloaded(),
            report.cells,
            mb(bytes)
        ));
        for t in s.tiles.iter().filter(|t| t.is_skipped()) {
            if let TileOutcome::Skipped(reason) = &t.outcome {
                out.push_str(&format!("  skipped tile {:>2} [{}]: {reason}\n", t.cell.index, t.cell.bounds));
            }
        }
        match &s.merge {
            Ok(m) => out.push_str(&format!(
                "  -> {} ({}x{}, {} band(s), {:.1}MB)\n",
                m.output.display(),
                m.width,
                m.height,
                m.bands,
                mb(m.bytes)
            )),
            Err(err) => out.push_str(&format!("  -> FAILED: {err}\n")),
        }
    }

    if !report.misaligned.is_empty() {
        let cells: Vec<String> = report.misaligned.iter().map(|c| c.to_string()).collect();
        out.push_str(&format!(
            "WARNING: sources differ at tile(s) {}; imagery and labels are not aligned there\n",
            cells.join(", ")
        ));
    }
    out
}

/// Bundle metadata after a successful export.
pub fn format_export_summary<M, S>(bundle: &ModelBundle<M, S>, path: &Path, bytes: u64) -> String {
    let mut out = String::new();
    out.push_str(&format!("Model exported to {} ({:.2}MB)\n", path.display(), mb(bytes)));
    out.push_str(&format!("  type:      {}\n", bundle.model_type));
    out.push_str(&format!("  version:   {}\n", bundle.version));
    match bundle.accuracy {
        Some(acc) => out.push_str(&format!("  accuracy:  {:.2}%\n", acc * 100.0)),
        None => out.push_str("  accuracy:  n/a\n"),
    }
    out.push_str(&format!("  trained:   {}\n", bundle.trained_on));
    out.push_str(&format!("  features:  {}\n", bundle.feature_names.join(", ")));
    if let Some(classes) = &bundle.classes {
        out.push_str(&format!("  classes:   {}\n", classes.join(", ")));
    }
    out
}
