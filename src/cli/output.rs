//! Output formatting for CLI commands

use serde::Serialize;

use crate::notification::JournalRecord;

/// Format output as pretty JSON
pub fn format_output<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// Format journal records as JSON or one line per record
pub fn format_history(records: &[JournalRecord], json: bool) -> String {
    if json {
        return format_output(&records);
    }
    if records.is_empty() {
        return "No journal records".to_string();
    }

    records
        .iter()
        .map(|r| {
            let kind = serde_json::to_value(r.kind)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            format!(
                "{}  {:<14} {:<20} {:<28} {}",
                r.ts.format("%Y-%m-%d %H:%M:%S"),
                kind,
                r.logical_id.as_deref().unwrap_or("-"),
                r.package.as_deref().unwrap_or("-"),
                r.summary
            )
            .trim_end()
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
