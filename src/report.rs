//! Timing reports
//!
//! A [`Report`] is a snapshot derived from a tracker's accumulated totals.
//! Averages are computed when the snapshot is taken and are never stored
//! back into the tracker.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accumulated statistics for one identifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    /// Iterations represented by all completed stamp pairs
    pub iterations_run: u64,
    /// Sum of elapsed milliseconds
    pub total_time: f64,
    /// `total_time / iterations_run`
    pub average: f64,
}

impl ReportEntry {
    pub fn new(iterations_run: u64, total_time: f64) -> Self {
        Self {
            iterations_run,
            total_time,
            average: total_time / iterations_run as f64,
        }
    }
}

/// Per-identifier timing snapshot, keyed and ordered by identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    entries: BTreeMap<String, ReportEntry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, id: impl Into<String>, entry: ReportEntry) {
        self.entries.insert(id.into(), entry);
    }

    pub fn get(&self, id: &str) -> Option<&ReportEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReportEntry)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Render the summary table, slowest identifier first
    pub fn render_table(&self) -> String {
        if self.entries.is_empty() {
            return "No timing data collected.\n".to_string();
        }

        let mut sorted: Vec<_> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.1.total_time.total_cmp(&a.1.total_time));

        let mut out = String::new();
        out.push_str(&format!(
            "{:<40} {:>12} {:>14} {:>14}\n",
            "Identifier", "Iterations", "Total (ms)", "Avg (ms)"
        ));
        out.push_str(&"─".repeat(83));
        out.push('\n');

        for (id, entry) in sorted {
            out.push_str(&format!(
                "{:<40} {:>12} {:>14.3} {:>14.6}\n",
                id, entry.iterations_run, entry.total_time, entry.average
            ));
        }

        out.push_str(&"─".repeat(83));
        out.push('\n');
        out
    }

    /// Print the summary table to stderr
    pub fn print_summary(&self) {
        eprintln!("\n╔═══════════════════════════════════════════════════════════════════════════════╗");
        eprintln!("║  Timing Summary (sorted by total time)                                       ║");
        eprintln!("╚═══════════════════════════════════════════════════════════════════════════════╝");
        eprint!("{}", self.render_table());
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = (&'a String, &'a ReportEntry);
    type IntoIter = std::collections::btree_map::Iter<'a, String, ReportEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
