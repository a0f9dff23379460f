//! Re-rank comparison
//!
//! Derives a "before" view (vector score only) and an "after" view (the
//! backend's final order) from one result set, plus per-item movement.

mod comparator;
mod export;

pub use comparator::{Movement, RerankComparison};
pub use export::{format_csv_row, movements_to_csv, CSV_HEADER, DEFAULT_CSV_FILE_NAME};
