//! Feature pipeline: date text featurization followed by concatenation.
//!
//! The pipeline is fitted on the training records and persisted inside the
//! model artifact, so inference applies the exact featurization used in
//! training. The order of the stages is fixed:
//!
//! 1. label copy (the configured label column must be part of the layout)
//! 2. date featurization (bag of word tokens and character trigrams)
//! 3. concatenation of the text features with optional numeric columns
//!    into the single `Features` column.

use crate::domain::errors::{FeatureError, TrainingError};
use crate::domain::market::StockPriceRecord;
use crate::domain::ml::csv_layout::{CsvLayout, PriceColumn};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Name of the assembled feature column.
pub const FEATURES_COLUMN: &str = "Features";

/// Name of the text features derived from the date.
pub const DATE_FEATURES_COLUMN: &str = "DateNumber";

const DATE_FORMAT: &str = "%Y-%m-%d";
const BEGIN_MARKER: char = '^';
const END_MARKER: char = '$';
const CHAR_NGRAM: usize = 3;

/// Parses a `YYYY-MM-DD` date, rejecting empty or malformed input.
///
/// chrono accepts unpadded fields and signed years, so the parsed date is
/// re-rendered and must match the input exactly.
pub fn parse_date(date: &str) -> Result<NaiveDate, FeatureError> {
    let invalid = || FeatureError::InvalidDate {
        date: date.to_string(),
    };
    let trimmed = date.trim();
    let parsed = NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| invalid())?;
    if trimmed.len() != 10 || parsed.format(DATE_FORMAT).to_string() != trimmed {
        return Err(invalid());
    }
    Ok(parsed)
}

/// Bag-of-n-grams vectorizer for the date string.
///
/// Tokens are the alphanumeric words of the normalized date (`2020`, `03`,
/// `22`) and its character trigrams including boundary markers. The
/// vocabulary is sorted, so two fits on the same data are identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateTextFeaturizer {
    vocabulary: BTreeMap<String, usize>,
}

impl DateTextFeaturizer {
    pub fn fit<'a, I>(dates: I) -> Result<Self, FeatureError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut tokens = BTreeSet::new();
        for date in dates {
            parse_date(date)?;
            tokens.extend(Self::tokens(date));
        }
        if tokens.is_empty() {
            return Err(FeatureError::EmptyVocabulary);
        }

        let vocabulary = tokens
            .into_iter()
            .enumerate()
            .map(|(index, token)| (token, index))
            .collect();
        Ok(Self { vocabulary })
    }

    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    /// Feature names in vector order.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = vec![String::new(); self.vocabulary.len()];
        for (token, &index) in &self.vocabulary {
            names[index] = format!("{}.{}", DATE_FEATURES_COLUMN, token);
        }
        names
    }

    /// L2-normalized token counts.
    pub fn transform(&self, date: &str) -> Result<Vec<f64>, FeatureError> {
        parse_date(date)?;

        let mut vector = vec![0.0; self.vocabulary.len()];
        for token in Self::tokens(date) {
            if let Some(&index) = self.vocabulary.get(&token) {
                vector[index] += 1.0;
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm == 0.0 {
            return Err(FeatureError::OutOfVocabulary {
                date: date.to_string(),
            });
        }
        for value in vector.iter_mut() {
            *value /= norm;
        }
        Ok(vector)
    }

    fn tokens(date: &str) -> Vec<String> {
        let normalized = date.trim().to_lowercase();

        let mut tokens: Vec<String> = normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(|word| format!("w:{}", word))
            .collect();

        let chars: Vec<char> = std::iter::once(BEGIN_MARKER)
            .chain(normalized.chars())
            .chain(std::iter::once(END_MARKER))
            .collect();
        tokens.extend(
            chars
                .windows(CHAR_NGRAM)
                .map(|gram| format!("c:{}", gram.iter().collect::<String>())),
        );
        tokens
    }
}

/// Which columns feed the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    /// Column copied into the label.
    pub label: PriceColumn,
    /// Numeric columns appended after the date features.
    pub numeric: Vec<PriceColumn>,
}

impl Default for FeatureSpec {
    fn default() -> Self {
        Self {
            label: PriceColumn::Close,
            numeric: Vec::new(),
        }
    }
}

/// Fitted preprocessing graph of the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePipeline {
    label: PriceColumn,
    date: DateTextFeaturizer,
    numeric: Vec<PriceColumn>,
}

impl FeaturePipeline {
    pub fn fit(
        records: &[StockPriceRecord],
        spec: &FeatureSpec,
        layout: &CsvLayout,
    ) -> Result<Self, TrainingError> {
        if !spec.label.is_numeric() || !layout.contains(spec.label) {
            return Err(TrainingError::MissingLabel {
                label: spec.label.to_string(),
            });
        }
        for column in &spec.numeric {
            if !column.is_numeric() || !layout.contains(*column) {
                return Err(TrainingError::InvalidParameter {
                    reason: format!("Feature column '{}' is not a numeric layout column", column),
                });
            }
            if *column == spec.label {
                return Err(TrainingError::InvalidParameter {
                    reason: format!("Label column '{}' cannot also be a feature", column),
                });
            }
        }

        let date = DateTextFeaturizer::fit(records.iter().map(|r| r.date.as_str()))?;
        Ok(Self {
            label: spec.label,
            date,
            numeric: spec.numeric.clone(),
        })
    }

    pub fn label_column(&self) -> PriceColumn {
        self.label
    }

    pub fn label(&self, record: &StockPriceRecord) -> f64 {
        record.value(self.label).unwrap_or_default()
    }

    pub fn labels(&self, records: &[StockPriceRecord]) -> Vec<f64> {
        records.iter().map(|r| self.label(r)).collect()
    }

    /// Width of the `Features` column.
    pub fn width(&self) -> usize {
        self.date.dimension() + self.numeric.len()
    }

    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.date.feature_names();
        names.extend(self.numeric.iter().map(|c| c.name().to_string()));
        names
    }

    /// The concatenated `Features` vector of one record.
    pub fn transform(&self, record: &StockPriceRecord) -> Result<Vec<f64>, FeatureError> {
        let mut features = self.date.transform(&record.date)?;
        features.extend(
            self.numeric
                .iter()
                .map(|c| record.value(*c).unwrap_or_default()),
        );
        Ok(features)
    }

    pub fn transform_all(&self, records: &[StockPriceRecord]) -> Result<Vec<Vec<f64>>, FeatureError> {
        records.iter().map(|r| self.transform(r)).collect()
    }
}
