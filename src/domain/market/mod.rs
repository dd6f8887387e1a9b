// Price records and the views derived from them
pub mod stock_price;

pub use stock_price::{PredictionResult, StockPriceCorrelate, StockPriceRecord};
