use crate::domain::ml::csv_layout::PriceColumn;
use serde::{Deserialize, Serialize};

/// One trading day of crude oil prices, as read from a CSV row.
///
/// Numeric columns absent from the configured layout stay at `0.0`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPriceRecord {
    pub date: String,
    #[serde(default)]
    pub open: f64,
    #[serde(default)]
    pub high: f64,
    #[serde(default)]
    pub low: f64,
    #[serde(default)]
    pub close: f64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub volume: f64,
}

impl StockPriceRecord {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Self::default()
        }
    }

    /// Numeric value of a column. `None` for the date and skipped columns.
    pub fn value(&self, column: PriceColumn) -> Option<f64> {
        match column {
            PriceColumn::Open => Some(self.open),
            PriceColumn::High => Some(self.high),
            PriceColumn::Low => Some(self.low),
            PriceColumn::Close => Some(self.close),
            PriceColumn::Price => Some(self.price),
            PriceColumn::Volume => Some(self.volume),
            PriceColumn::Date | PriceColumn::Skip => None,
        }
    }

    pub fn set_value(&mut self, column: PriceColumn, value: f64) {
        match column {
            PriceColumn::Open => self.open = value,
            PriceColumn::High => self.high = value,
            PriceColumn::Low => self.low = value,
            PriceColumn::Close => self.close = value,
            PriceColumn::Price => self.price = value,
            PriceColumn::Volume => self.volume = value,
            PriceColumn::Date | PriceColumn::Skip => {}
        }
    }
}

/// A record together with the model's predicted closing price.
///
/// `year` is derived from the date and serialized so clients can group
/// predictions without parsing dates themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    #[serde(flatten)]
    pub record: StockPriceRecord,
    pub predicted_close: f64,
    #[serde(default)]
    pub year: Option<i32>,
}

impl PredictionResult {
    pub fn new(record: StockPriceRecord, predicted_close: f64) -> Self {
        let year = year_of(&record.date);
        Self {
            record,
            predicted_close,
            year,
        }
    }
}

fn year_of(date: &str) -> Option<i32> {
    date.get(0..4)?.parse().ok()
}

/// Charting triplet: actual value of the label next to the prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPriceCorrelate {
    pub date: String,
    pub price: f64,
    pub predicted_price: f64,
}

impl StockPriceCorrelate {
    pub fn from_prediction(prediction: &PredictionResult, label: PriceColumn) -> Self {
        Self {
            date: prediction.record.date.clone(),
            price: prediction.record.value(label).unwrap_or_default(),
            predicted_price: prediction.predicted_close,
        }
    }
}
