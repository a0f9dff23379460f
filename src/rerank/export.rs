//! CSV export of the movement table

use std::path::Path;

use anyhow::{anyhow, Result};

use super::{Movement, RerankComparison};

pub const CSV_HEADER: &str =
    "ID,Title,Before Position,After Position,Before Score,After Score,Delta Position,Delta Score";

pub const DEFAULT_CSV_FILE_NAME: &str = "rerank-comparison.csv";

/// One CSV row; the title is always quoted, embedded quotes are doubled
pub fn format_csv_row(movement: &Movement, title: &str) -> String {
    format!(
        "{},\"{}\",{},{},{},{},{},{}",
        movement.id,
        title.replace('"', "\"\""),
        movement.before_position,
        movement.after_position,
        movement.before_score,
        movement.after_score,
        movement.delta_position,
        movement.delta_score
    )
}

/// Header plus one row per movement, newline separated
pub fn movements_to_csv<F>(movements: &[Movement], title_of: F) -> String
where
    F: Fn(&str) -> String,
{
    std::iter::once(CSV_HEADER.to_string())
        .chain(
            movements
                .iter()
                .map(|m| format_csv_row(m, &title_of(&m.id))),
        )
        .collect::<Vec<_>>()
        .join("\n")
}

impl RerankComparison {
    /// Write the movement table to `path`
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_csv())
            .map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))?;
        tracing::info!(
            "Exported {} movements to {}",
            self.movements.len(),
            path.display()
        );
        Ok(())
    }
}
