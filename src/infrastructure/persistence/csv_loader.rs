use crate::domain::errors::PipelineError;
use crate::domain::market::StockPriceRecord;
use crate::domain::ml::CsvLayout;
use csv::{ReaderBuilder, Trim};
use std::path::Path;
use tracing::info;

/// Reads a filtered price CSV. The header row is skipped and columns are
/// mapped by position according to `layout`, not by header names.
pub fn load_records(path: &Path, layout: &CsvLayout) -> Result<Vec<StockPriceRecord>, PipelineError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| PipelineError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| PipelineError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
        if row.iter().all(|field| field.is_empty()) {
            continue;
        }

        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let record = layout.parse_row(row.iter()).map_err(|reason| PipelineError::Row {
            path: path.to_path_buf(),
            line,
            reason,
        })?;
        records.push(record);
    }

    info!("Loaded {} records from {:?}", records.len(), path);
    Ok(records)
}
