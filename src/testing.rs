//! Synthetic price series shared by the unit tests.

use crate::domain::market::StockPriceRecord;
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// `rows` consecutive weekdays from 2018-01-01 whose close is driven by the
/// year and the month, so the date alone explains almost all of the variance.
pub fn synthetic_records(rows: usize) -> Vec<StockPriceRecord> {
    let mut day = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    let mut records = Vec::with_capacity(rows);
    while records.len() < rows {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            let close = 40.0
                + 8.0 * (day.year() - 2018) as f64
                + 0.6 * day.month() as f64
                + 0.05 * (day.day() % 5) as f64;
            records.push(StockPriceRecord {
                date: day.format("%Y-%m-%d").to_string(),
                open: close - 0.3,
                high: close + 0.8,
                low: close - 0.9,
                close,
                price: close,
                volume: 250_000.0 + records.len() as f64,
            });
        }
        day += Duration::days(1);
    }
    records
}

/// CSV text (header plus rows) in the default column layout.
pub fn synthetic_csv(rows: usize) -> String {
    let mut csv = String::from("Date,Open,High,Low,Close,Price,Volume\n");
    for r in synthetic_records(rows) {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            r.date, r.open, r.high, r.low, r.close, r.price, r.volume
        ));
    }
    csv
}
