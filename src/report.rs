//! One row per ticker: quote fields plus the analysis outcome.

use crate::analysis::{AnalysisError, Recommendation, analyze, join_recommendations};
use crate::api::{FetchError, QuoteFetcher, QuoteMap};
use crate::models::{Column, QuoteRecord};
use crate::tickers::TickerSymbol;
use std::collections::BTreeSet;

/// A symbol with its latest known quote and analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub symbol: TickerSymbol,
    pub quote: QuoteRecord,
    pub analysis: Result<Vec<Recommendation>, AnalysisError>,
}

impl ReportRow {
    pub fn new(symbol: TickerSymbol, quote: QuoteRecord) -> Self {
        let analysis = analyze(&quote);
        if let Err(e) = &analysis {
            tracing::debug!(%symbol, error = %e, "quote not analyzable");
        }
        Self {
            symbol,
            quote,
            analysis,
        }
    }

    /// Re-run the analysis after the quote changed.
    pub fn reanalyze(&mut self) {
        self.analysis = analyze(&self.quote);
    }

    /// Text shown in the recommendations column.
    pub fn recommendations_text(&self) -> String {
        match &self.analysis {
            Ok(recommendations) => join_recommendations(recommendations),
            Err(e) => format!("n/a ({e})"),
        }
    }

    /// Display text of one cell.
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::Symbol => self.symbol.to_string(),
            Column::Recommendations => self.recommendations_text(),
            numeric => format_number(numeric.value(&self.quote)),
        }
    }
}

/// Two decimals, blank when unknown.
pub fn format_number(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

/// Build rows for every symbol from an already fetched batch, sorted by symbol.
///
/// A symbol absent from `quotes` still gets a row, with every field unknown.
pub fn rows_from_quotes(symbols: &BTreeSet<TickerSymbol>, mut quotes: QuoteMap) -> Vec<ReportRow> {
    // BTreeSet iterates in ascending symbol order
    symbols
        .iter()
        .map(|symbol| {
            let quote = quotes.remove(symbol).unwrap_or_default();
            ReportRow::new(symbol.clone(), quote)
        })
        .collect()
}

/// Fetch all symbols in one batch and build the report.
pub async fn build_report<F: QuoteFetcher>(
    fetcher: &F,
    symbols: &BTreeSet<TickerSymbol>,
) -> Result<Vec<ReportRow>, FetchError> {
    let list: Vec<TickerSymbol> = symbols.iter().cloned().collect();
    let quotes = fetcher.fetch_quotes(&list).await?;
    tracing::info!(symbols = list.len(), quotes = quotes.len(), "building report");
    Ok(rows_from_quotes(symbols, quotes))
}

/// Render rows as a plain-text table.
pub fn render_table(rows: &[ReportRow]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| Column::ALL.iter().map(|c| row.cell(*c)).collect())
        .collect();

    let widths: Vec<usize> = Column::ALL
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.header().chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut output = String::new();
    output.push_str(&format_line(Column::ALL.iter().map(|c| c.header()), &widths));
    output.push('\n');
    output.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    output.push('\n');
    for row in &cells {
        output.push_str(&format_line(row.iter().map(String::as_str), &widths));
        output.push('\n');
    }
    output
}

fn format_line<'a>(values: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let line = values
        .zip(Column::ALL.iter().zip(widths))
        .map(|(value, (column, &width))| {
            if column.is_numeric() {
                format!("{value:>width$}")
            } else {
                format!("{value:<width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}
