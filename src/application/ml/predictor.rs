use crate::domain::errors::PredictionError;
use crate::domain::market::{PredictionResult, StockPriceRecord};

/// Interface for closing-price predictors
pub trait PricePredictor: Send + Sync {
    /// Predict the closing price of one record
    fn predict(&self, record: &StockPriceRecord) -> Result<PredictionResult, PredictionError>;

    /// Predict many records against the same model
    fn predict_batch(
        &self,
        records: &[StockPriceRecord],
    ) -> Result<Vec<PredictionResult>, PredictionError> {
        records.iter().map(|r| self.predict(r)).collect()
    }
}
