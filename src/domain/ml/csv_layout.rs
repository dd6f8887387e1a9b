use crate::domain::market::StockPriceRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A column of the price CSV files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceColumn {
    Date,
    Open,
    High,
    Low,
    Close,
    Price,
    Volume,
    /// Present in the file but ignored (e.g. an adjusted close the model does not use).
    Skip,
}

impl PriceColumn {
    pub fn name(&self) -> &'static str {
        match self {
            PriceColumn::Date => "date",
            PriceColumn::Open => "open",
            PriceColumn::High => "high",
            PriceColumn::Low => "low",
            PriceColumn::Close => "close",
            PriceColumn::Price => "price",
            PriceColumn::Volume => "volume",
            PriceColumn::Skip => "skip",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, PriceColumn::Date | PriceColumn::Skip)
    }
}

impl fmt::Display for PriceColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PriceColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(PriceColumn::Date),
            "open" => Ok(PriceColumn::Open),
            "high" => Ok(PriceColumn::High),
            "low" => Ok(PriceColumn::Low),
            "close" => Ok(PriceColumn::Close),
            "price" => Ok(PriceColumn::Price),
            "volume" => Ok(PriceColumn::Volume),
            "skip" | "_" => Ok(PriceColumn::Skip),
            other => Err(format!(
                "Unknown column '{}'. Must be one of date, open, high, low, close, price, volume, skip",
                other
            )),
        }
    }
}

/// Pinned column order of the price CSV files.
///
/// Column order and presence changed between data revisions, so it is
/// configured rather than inferred from the header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvLayout {
    columns: Vec<PriceColumn>,
}

impl Default for CsvLayout {
    fn default() -> Self {
        Self {
            columns: vec![
                PriceColumn::Date,
                PriceColumn::Open,
                PriceColumn::High,
                PriceColumn::Low,
                PriceColumn::Close,
                PriceColumn::Price,
                PriceColumn::Volume,
            ],
        }
    }
}

impl CsvLayout {
    /// Exactly one date column is required; other columns may appear at most once.
    pub fn new(columns: Vec<PriceColumn>) -> Result<Self, String> {
        let dates = columns.iter().filter(|c| **c == PriceColumn::Date).count();
        if dates != 1 {
            return Err(format!(
                "Layout must contain exactly one date column, found {}",
                dates
            ));
        }
        for (i, column) in columns.iter().enumerate() {
            if column.is_numeric() && columns[..i].contains(column) {
                return Err(format!("Column '{}' appears more than once", column));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[PriceColumn] {
        &self.columns
    }

    pub fn contains(&self, column: PriceColumn) -> bool {
        self.columns.contains(&column)
    }

    /// Maps the fields of one CSV row onto a record.
    pub fn parse_row<'a, I>(&self, fields: I) -> Result<StockPriceRecord, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let fields: Vec<&str> = fields.into_iter().collect();
        if fields.len() < self.columns.len() {
            return Err(format!(
                "Expected {} columns, found {}",
                self.columns.len(),
                fields.len()
            ));
        }

        let mut record = StockPriceRecord::default();
        for (column, raw) in self.columns.iter().zip(fields) {
            let raw = raw.trim();
            match column {
                PriceColumn::Date => record.date = raw.to_string(),
                PriceColumn::Skip => {}
                numeric => {
                    let value = raw.parse::<f64>().map_err(|_| {
                        format!("Column '{}': invalid number '{}'", numeric, raw)
                    })?;
                    record.set_value(*numeric, value);
                }
            }
        }
        Ok(record)
    }
}

impl FromStr for CsvLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let columns = s
            .split(',')
            .filter(|c| !c.trim().is_empty())
            .map(PriceColumn::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(columns)
    }
}

impl fmt::Display for CsvLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.columns.iter().map(|c| c.name()).collect();
        f.write_str(&names.join(","))
    }
}
