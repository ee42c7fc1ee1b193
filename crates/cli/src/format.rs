//! Result → human/json string formatting.

use serde_json::json;

use tablesnap_engine::CompletedSnapshot;
use tablesnap_storage::VerifiedSnapshot;

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Format a committed snapshot.
pub fn format_completed(completed: &CompletedSnapshot, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => pretty(json!({
            "snapshot": completed.description.name,
            "table": completed.description.table,
            "path": completed.path.display().to_string(),
            "regions": completed.regions.iter().map(|r| r.encoded_name()).collect::<Vec<_>>(),
            "servers": completed.servers.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            "elapsed_ms": completed.elapsed.as_millis() as u64,
        })),
        OutputMode::Human => format!(
            "Snapshot {} of table {} committed to {} ({} regions, {} ms)",
            completed.description.name,
            completed.description.table,
            completed.path.display(),
            completed.regions.len(),
            completed.elapsed.as_millis()
        ),
    }
}

/// Format a snapshot listing.
pub fn format_list(names: &[String], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => pretty(json!({ "snapshots": names })),
        OutputMode::Human if names.is_empty() => "(no snapshots)".to_string(),
        OutputMode::Human => names
            .iter()
            .enumerate()
            .map(|(i, n)| format!("{}) {}", i + 1, n))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Format a verification report.
pub fn format_verified(verified: &VerifiedSnapshot, mode: OutputMode) -> String {
    let desc = &verified.description;
    match mode {
        OutputMode::Json => pretty(json!({
            "snapshot": desc,
            "regions": verified.regions,
        })),
        OutputMode::Human => {
            let mut lines = vec![format!("OK {}", desc.describe())];
            for region in &verified.regions {
                lines.push(format!("  {} {}", region.encoded_name(), region));
            }
            lines.join("\n")
        }
    }
}

/// Format an error.
pub fn format_error(message: &str, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => pretty(json!({ "error": message })),
        OutputMode::Human => format!("(error) {}", message),
    }
}

fn pretty(value: serde_json::Value) -> String {
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}
