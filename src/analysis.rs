//! Buy/sell hints from where a quote sits inside its 52-week range.

use crate::models::QuoteRecord;
use std::fmt;
use thiserror::Error;

/// Share of the 52-week range that counts as "close to" an extreme.
const PROXIMITY_RATIO: f64 = 0.20;

/// A single hint produced by [`analyze`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    SellYearHigh,
    SellCloseToHigh,
    BuyYearLow,
    BuyCloseToLow,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Recommendation::SellYearHigh => "sell, 1y high",
            Recommendation::SellCloseToHigh => "sell, close to high",
            Recommendation::BuyYearLow => "buy, 1y low",
            Recommendation::BuyCloseToLow => "buy, close to low",
        };
        f.write_str(text)
    }
}

impl Recommendation {
    pub fn is_sell(self) -> bool {
        matches!(
            self,
            Recommendation::SellYearHigh | Recommendation::SellCloseToHigh
        )
    }
}

/// The quote cannot be analyzed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("52-week range unknown")]
    MissingYearRange,
    #[error("52-week range {low}..{high} is empty or reversed")]
    InvalidYearRange { low: f64, high: f64 },
}

/// Compute hints for one quote: at most one sell hint, then at most one buy hint.
///
/// Only the 52-week bounds are required. A comparison against a missing
/// bid, ask, or day extreme never fires.
pub fn analyze(quote: &QuoteRecord) -> Result<Vec<Recommendation>, AnalysisError> {
    let (Some(low), Some(high)) = (quote.fifty_two_week_low, quote.fifty_two_week_high) else {
        return Err(AnalysisError::MissingYearRange);
    };
    // `!(>)` also rejects NaN bounds
    if !(high > low) {
        return Err(AnalysisError::InvalidYearRange { low, high });
    }
    let proximity = (high - low) * PROXIMITY_RATIO;
    let above = |value: Option<f64>, limit: f64| value.is_some_and(|v| v > limit);
    let below = |value: Option<f64>, limit: f64| value.is_some_and(|v| v < limit);

    let mut recommendations = Vec::with_capacity(2);

    if quote.day_high == Some(high) || above(quote.bid, high) {
        recommendations.push(Recommendation::SellYearHigh);
    } else if above(quote.bid, high - proximity) {
        recommendations.push(Recommendation::SellCloseToHigh);
    }

    if quote.day_low == Some(low) || below(quote.ask, low) {
        recommendations.push(Recommendation::BuyYearLow);
    } else if below(quote.ask, low + proximity) {
        recommendations.push(Recommendation::BuyCloseToLow);
    }

    Ok(recommendations)
}

/// Join hints the way they appear in the report.
pub fn join_recommendations(recommendations: &[Recommendation]) -> String {
    recommendations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
