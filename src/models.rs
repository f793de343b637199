//! Data models for ticker quotes and the report columns built from them.

use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Snapshot of the price fields fetched for one symbol.
///
/// Every field is optional: the market-data API routinely leaves gaps
/// (no bid outside trading hours, no 52-week range for a fresh listing).
/// A gap means "unknown", never zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteRecord {
    /// 52-week low
    pub fifty_two_week_low: Option<f64>,
    /// 52-week high
    pub fifty_two_week_high: Option<f64>,
    /// Day's low price
    pub day_low: Option<f64>,
    /// Day's high price
    pub day_high: Option<f64>,
    /// Highest price a buyer is ready to pay
    pub bid: Option<f64>,
    /// Lowest price a seller is ready to accept
    pub ask: Option<f64>,
    /// Last traded price
    pub current_price: Option<f64>,
    /// Price change from previous close
    pub regular_market_change: Option<f64>,
    /// Percentage change from previous close
    pub regular_market_change_percent: Option<f64>,
    /// Full name of the security
    pub long_name: Option<String>,
    /// Everything else the API returned, kept for the detail template.
    pub extra: Map<String, Value>,
}

impl QuoteRecord {
    /// The full field mapping of this record, keyed by API field name.
    pub fn template_fields(&self) -> Map<String, Value> {
        let mut fields = self.extra.clone();
        let numbers = [
            ("fiftyTwoWeekLow", self.fifty_two_week_low),
            ("fiftyTwoWeekHigh", self.fifty_two_week_high),
            ("dayLow", self.day_low),
            ("dayHigh", self.day_high),
            ("bid", self.bid),
            ("ask", self.ask),
            ("currentPrice", self.current_price),
            ("regularMarketChange", self.regular_market_change),
            ("regularMarketChangePercent", self.regular_market_change_percent),
        ];
        for (key, value) in numbers {
            match value {
                Some(value) => {
                    fields.insert(key.to_string(), Value::from(value));
                }
                None => {
                    fields.entry(key).or_insert(Value::Null);
                }
            }
        }
        match &self.long_name {
            Some(name) => {
                fields.insert("longName".to_string(), Value::String(name.clone()));
            }
            None => {
                fields.entry("longName").or_insert(Value::Null);
            }
        }
        fields
    }

    /// Copy every known field of `newer` over this record.
    ///
    /// Unknown fields in `newer` leave the current value in place. Returns
    /// the number of displayed cells whose value actually changed.
    pub fn merge_from(&mut self, newer: &QuoteRecord) -> usize {
        let mut changed = 0;
        for column in Column::ALL {
            let Some(slot) = column.slot_mut(self) else {
                continue;
            };
            if let Some(value) = column.value(newer) {
                if *slot != Some(value) {
                    *slot = Some(value);
                    changed += 1;
                }
            }
        }
        if newer.long_name.is_some() {
            self.long_name.clone_from(&newer.long_name);
        }
        for (key, value) in &newer.extra {
            if !value.is_null() {
                self.extra.insert(key.clone(), value.clone());
            }
        }
        changed
    }
}

/// Columns of the report, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Symbol,
    YearLow,
    DayLow,
    Bid,
    Price,
    Ask,
    DayHigh,
    YearHigh,
    Change,
    ChangePercent,
    Recommendations,
}

impl Column {
    pub const ALL: [Column; 11] = [
        Column::Symbol,
        Column::YearLow,
        Column::DayLow,
        Column::Bid,
        Column::Price,
        Column::Ask,
        Column::DayHigh,
        Column::YearHigh,
        Column::Change,
        Column::ChangePercent,
        Column::Recommendations,
    ];

    /// Get column header name.
    pub fn header(self) -> &'static str {
        match self {
            Column::Symbol => "Symbol",
            Column::YearLow => "52w Low",
            Column::DayLow => "Day Low",
            Column::Bid => "Bid",
            Column::Price => "Price",
            Column::Ask => "Ask",
            Column::DayHigh => "Day High",
            Column::YearHigh => "52w High",
            Column::Change => "Change",
            Column::ChangePercent => "Change %",
            Column::Recommendations => "Recommendations",
        }
    }

    /// Position of the column in display order.
    pub fn index(self) -> usize {
        Column::ALL.iter().position(|c| *c == self).unwrap_or(0)
    }

    /// Column at a display position, if any.
    pub fn from_index(index: usize) -> Option<Column> {
        Column::ALL.get(index).copied()
    }

    /// Next column to the right, wrapping around.
    pub fn next(self) -> Self {
        Column::ALL[(self.index() + 1) % Column::ALL.len()]
    }

    /// Previous column to the left, wrapping around.
    pub fn prev(self) -> Self {
        Column::ALL[(self.index() + Column::ALL.len() - 1) % Column::ALL.len()]
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Column::Symbol | Column::Recommendations)
    }

    /// Numeric value of this column in a record; `None` for text columns and gaps.
    pub fn value(self, quote: &QuoteRecord) -> Option<f64> {
        match self {
            Column::Symbol | Column::Recommendations => None,
            Column::YearLow => quote.fifty_two_week_low,
            Column::DayLow => quote.day_low,
            Column::Bid => quote.bid,
            Column::Price => quote.current_price,
            Column::Ask => quote.ask,
            Column::DayHigh => quote.day_high,
            Column::YearHigh => quote.fifty_two_week_high,
            Column::Change => quote.regular_market_change,
            Column::ChangePercent => quote.regular_market_change_percent,
        }
    }

    fn slot_mut(self, quote: &mut QuoteRecord) -> Option<&mut Option<f64>> {
        match self {
            Column::Symbol | Column::Recommendations => None,
            Column::YearLow => Some(&mut quote.fifty_two_week_low),
            Column::DayLow => Some(&mut quote.day_low),
            Column::Bid => Some(&mut quote.bid),
            Column::Price => Some(&mut quote.current_price),
            Column::Ask => Some(&mut quote.ask),
            Column::DayHigh => Some(&mut quote.day_high),
            Column::YearHigh => Some(&mut quote.fifty_two_week_high),
            Column::Change => Some(&mut quote.regular_market_change),
            Column::ChangePercent => Some(&mut quote.regular_market_change_percent),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Orient an ascending comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    pub fn indicator(self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_values_missing_from_newer() {
        let mut shown = QuoteRecord {
            bid: Some(10.0),
            ask: Some(11.0),
            ..Default::default()
        };
        let newer = QuoteRecord {
            bid: Some(10.5),
            ..Default::default()
        };

        assert_eq!(shown.merge_from(&newer), 1);
        assert_eq!(shown.bid, Some(10.5));
        assert_eq!(shown.ask, Some(11.0));
    }

    #[test]
    fn test_merge_counts_only_changed_cells() {
        let mut shown = QuoteRecord {
            bid: Some(10.0),
            ask: Some(11.0),
            ..Default::default()
        };
        let newer = shown.clone();
        assert_eq!(shown.merge_from(&newer), 0);
    }

    #[test]
    fn test_template_fields_use_api_names() {
        let mut quote = QuoteRecord {
            current_price: Some(123.5),
            long_name: Some("Apple Inc.".to_string()),
            ..Default::default()
        };
        quote
            .extra
            .insert("exchange".to_string(), Value::String("NMS".to_string()));

        let fields = quote.template_fields();
        assert_eq!(fields["currentPrice"], Value::from(123.5));
        assert_eq!(fields["longName"], Value::String("Apple Inc.".to_string()));
        assert_eq!(fields["exchange"], Value::String("NMS".to_string()));
        assert_eq!(fields["bid"], Value::Null);
    }

    #[test]
    fn test_template_fields_keep_api_values_for_unknown_slots() {
        let mut quote = QuoteRecord {
            day_high: Some(91.0),
            ..Default::default()
        };
        quote.extra.insert("dayLow".to_string(), Value::from(60.0));
        quote
            .extra
            .insert("regularMarketDayHigh".to_string(), Value::from(91.0));

        let fields = quote.template_fields();
        assert_eq!(fields["dayLow"], Value::from(60.0));
        assert_eq!(fields["dayHigh"], Value::from(91.0));
        assert_eq!(fields["regularMarketDayHigh"], Value::from(91.0));
        assert_eq!(fields["currentPrice"], Value::Null);
    }

    #[test]
    fn test_column_navigation_wraps() {
        assert_eq!(Column::Symbol.prev(), Column::Recommendations);
        assert_eq!(Column::Recommendations.next(), Column::Symbol);
        assert_eq!(Column::from_index(4), Some(Column::Price));
        assert_eq!(Column::from_index(11), None);
    }

    #[test]
    fn test_sort_direction_toggle() {
        assert_eq!(SortDirection::Ascending.toggle(), SortDirection::Descending);
        assert_eq!(
            SortDirection::Descending.apply(Ordering::Less),
            Ordering::Greater
        );
    }
}
