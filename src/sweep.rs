use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::agent::record::{FallbackReason, StructuredObjectRecord};
use crate::agent::AgentInterface;

/// 0.2 through 1.9 in steps of 0.1.
pub fn default_temperatures() -> Vec<f32> {
    (2..=19).map(|tenths| tenths as f32 / 10.0).collect()
}

/// One row of a sweep report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepRow {
    pub temperature: f32,
    #[serde(flatten)]
    pub record: StructuredObjectRecord,
    pub provenance: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fallback_reason: Option<FallbackReason>,
}

/// Run the pipeline once per temperature, in order. Stops early if the
/// token is cancelled between runs.
pub async fn run_sweep(
    agent: &dyn AgentInterface,
    text: &str,
    temperatures: &[f32],
    cancel: &CancellationToken,
) -> Vec<SweepRow> {
    let mut rows = Vec::with_capacity(temperatures.len());
    for &temperature in temperatures {
        if cancel.is_cancelled() {
            info!("Sweep cancelled after {} run(s)", rows.len());
            break;
        }
        let outcome = agent.generate(text, temperature, cancel).await;
        info!(
            "temperature={:.1} object={} provenance={}",
            temperature,
            outcome.record.object,
            outcome.provenance.label()
        );
        rows.push(SweepRow {
            temperature,
            provenance: outcome.provenance.label().to_string(),
            fallback_reason: outcome.provenance.fallback_reason(),
            record: outcome.record,
        });
    }
    rows
}

pub fn render_table(rows: &[SweepRow]) -> String {
    let mut out = format!(
        "{:<6} {:<16} {:<12} {:<12} {:<14} {}\n",
        "temp", "object", "color", "material", "style", "provenance"
    );
    for row in rows {
        out.push_str(&format!(
            "{:<6.1} {:<16} {:<12} {:<12} {:<14} {}\n",
            row.temperature,
            row.record.object,
            row.record.color,
            row.record.material,
            row.record.style,
            row.provenance
        ));
    }
    out
}

pub fn write_report(path: &Path, rows: &[SweepRow]) -> Result<()> {
    let json = serde_json::to_string_pretty(rows).context("Failed to serialize sweep report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write sweep report to {}", path.display()))?;
    info!("Wrote sweep report ({} rows) to {}", rows.len(), path.display());
    Ok(())
}
