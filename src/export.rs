//! CSV export of record subsets selected by id-set or filter

use crate::analytics_core::{SaleFilter, SaleRecord};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Fixed export column order
pub const EXPORT_COLUMNS: [&str; 7] = [
    "sale_id",
    "date",
    "region",
    "product",
    "quantity",
    "unit_price",
    "total_price",
];

/// What to export: an explicit id-set takes precedence over the filter.
#[derive(Debug, Clone)]
pub enum ExportSelection {
    Ids(HashSet<String>),
    Filtered(SaleFilter),
}

impl ExportSelection {
    /// Resolve from request parameters: a comma-separated `ids` value wins,
    /// otherwise the filter predicate set applies.
    pub fn from_params(ids: Option<&str>, filter: SaleFilter) -> Self {
        match ids.filter(|v| !v.trim().is_empty()) {
            Some(ids) => ExportSelection::Ids(
                ids.split(',')
                    .map(|id| id.trim().to_string())
                    .filter(|id| !id.is_empty())
                    .collect(),
            ),
            None => ExportSelection::Filtered(filter),
        }
    }
}

/// Matching record subset, in dataset order.
pub fn select_records<'a>(
    records: &'a [SaleRecord],
    selection: &ExportSelection,
) -> Vec<&'a SaleRecord> {
    match selection {
        ExportSelection::Ids(ids) => records
            .iter()
            .filter(|r| ids.contains(&r.sale_id))
            .collect(),
        ExportSelection::Filtered(filter) => {
            records.iter().filter(|r| filter.matches(r)).collect()
        }
    }
}

/// Render records as CSV with a header row, dates as ISO calendar days.
pub fn render_csv(records: &[&SaleRecord]) -> String {
    let mut out = String::new();
    out.push_str(&EXPORT_COLUMNS.join(","));
    out.push('\n');

    for record in records {
        let fields = [
            csv_field(&record.sale_id),
            record.date.date_naive().format("%Y-%m-%d").to_string(),
            csv_field(&record.region),
            csv_field(&record.product),
            record.quantity.to_string(),
            record.unit_price.to_string(),
            record.total_price.to_string(),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    out
}

/// Write the rendered CSV to a file, truncating any previous contents.
pub fn write_csv(path: &Path, records: &[&SaleRecord]) -> std::io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;

    let mut writer = BufWriter::new(file);
    writer.write_all(render_csv(records).as_bytes())?;
    writer.flush()?;

    log::info!("📝 Exported {} records to {}", records.len(), path.display());
    Ok(())
}

/// Quote a field when it contains a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
