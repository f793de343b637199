//! Interactive session state: the live table, its sort and selection, and
//! the refresh state machine.
//!
//! Nothing here touches the terminal or the network. The application shell
//! feeds events in (refresh requested, refresh completed, key actions) and
//! reads the resulting state back out when drawing.

use crate::api::{FetchError, QuoteMap};
use crate::models::{Column, QuoteRecord, SortDirection};
use crate::report::ReportRow;
use crate::template::DetailTemplate;
use crate::tickers::TickerSymbol;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// Where the session is in the refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing { generation: u64 },
}

/// What happened to a completed refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Results were merged into the table.
    Applied { changed_cells: usize },
    /// The fetch failed; the table is untouched.
    Failed,
    /// A newer refresh was requested since; results were dropped.
    Stale,
}

pub struct Session {
    rows: Vec<ReportRow>,
    /// Symbols for which the API has returned data at least once.
    fetched: BTreeSet<TickerSymbol>,
    template: DetailTemplate,
    state: RefreshState,
    generation: u64,
    sort_column: Column,
    sort_direction: SortDirection,
    selected: usize,
    status: String,
    detail: String,
    warning: Option<String>,
    last_refresh: Option<Instant>,
}

impl Session {
    pub fn new(symbols: &BTreeSet<TickerSymbol>, template: DetailTemplate) -> Self {
        let rows = symbols
            .iter()
            .map(|symbol| ReportRow::new(symbol.clone(), QuoteRecord::default()))
            .collect();
        let mut session = Self {
            rows,
            fetched: BTreeSet::new(),
            template,
            state: RefreshState::Idle,
            generation: 0,
            sort_column: Column::Symbol,
            sort_direction: SortDirection::Ascending,
            selected: 0,
            status: String::new(),
            detail: String::new(),
            warning: None,
            last_refresh: None,
        };
        session.update_selection_view();
        session
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// Symbols to fetch on refresh.
    pub fn symbols(&self) -> Vec<TickerSymbol> {
        self.rows.iter().map(|r| r.symbol.clone()).collect()
    }

    /// Display text of a cell. Recommendations stay blank until data arrives.
    pub fn cell(&self, row: &ReportRow, column: Column) -> String {
        if column == Column::Recommendations && !self.fetched.contains(&row.symbol) {
            return String::new();
        }
        row.cell(column)
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(self.state, RefreshState::Refreshing { .. })
    }

    pub fn sort(&self) -> (Column, SortDirection) {
        (self.sort_column, self.sort_direction)
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn dismiss_warning(&mut self) {
        self.warning = None;
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = text.into();
        tracing::debug!(status = %self.status, "status changed");
    }

    /// Start a refresh and return its generation.
    ///
    /// A refresh already in flight is superseded: its results will be
    /// reported as [`RefreshOutcome::Stale`] when they arrive.
    pub fn request_refresh(&mut self) -> u64 {
        if let RefreshState::Refreshing { generation } = self.state {
            tracing::debug!(generation, "superseding refresh");
        }
        self.generation += 1;
        self.state = RefreshState::Refreshing {
            generation: self.generation,
        };
        self.set_status("Updating...");
        self.generation
    }

    /// Apply the result of the refresh started as `generation`.
    pub fn complete_refresh(
        &mut self,
        generation: u64,
        result: Result<QuoteMap, FetchError>,
    ) -> RefreshOutcome {
        if self.state != (RefreshState::Refreshing { generation }) {
            tracing::debug!(generation, latest = self.generation, "dropping stale refresh");
            return RefreshOutcome::Stale;
        }
        self.state = RefreshState::Idle;

        let quotes = match result {
            Ok(quotes) => quotes,
            Err(e) => {
                tracing::warn!(error = %e, "refresh failed");
                self.warning = Some(format!("Refresh failed: {e}"));
                self.set_status("Update failed");
                return RefreshOutcome::Failed;
            }
        };

        let mut changed_cells = 0;
        for row in &mut self.rows {
            let Some(record) = quotes.get(&row.symbol) else {
                continue;
            };
            changed_cells += row.quote.merge_from(record);
            if *record != QuoteRecord::default() {
                self.fetched.insert(row.symbol.clone());
            }
            row.reanalyze();
        }
        self.last_refresh = Some(Instant::now());
        self.warning = None;
        self.sort_rows();
        self.update_selection_view();
        self.set_status("Updated");
        tracing::info!(generation, changed_cells, "refresh applied");

        RefreshOutcome::Applied { changed_cells }
    }

    /// Sort by `column`; picking the current column again flips the direction.
    pub fn select_column(&mut self, column: Column) {
        if self.sort_column == column {
            self.sort_direction = self.sort_direction.toggle();
        } else {
            self.sort_column = column;
            self.sort_direction = SortDirection::Ascending;
        }
        tracing::debug!(?column, direction = ?self.sort_direction, "sorting");
        self.sort_rows();
    }

    fn sort_rows(&mut self) {
        let selected_symbol = self.rows.get(self.selected).map(|r| r.symbol.clone());
        let column = self.sort_column;
        let direction = self.sort_direction;
        let fetched = &self.fetched;

        self.rows.sort_by(|a, b| {
            let cmp = match column {
                Column::Symbol => a.symbol.cmp(&b.symbol),
                Column::Recommendations => {
                    let text = |r: &ReportRow| {
                        if fetched.contains(&r.symbol) {
                            r.recommendations_text()
                        } else {
                            String::new()
                        }
                    };
                    text(a).cmp(&text(b))
                }
                numeric => numeric
                    .value(&a.quote)
                    .partial_cmp(&numeric.value(&b.quote))
                    .unwrap_or(Ordering::Equal),
            };
            direction.apply(cmp).then_with(|| a.symbol.cmp(&b.symbol))
        });

        if let Some(symbol) = selected_symbol {
            self.selected = self
                .rows
                .iter()
                .position(|r| r.symbol == symbol)
                .unwrap_or(0);
        }
    }

    pub fn select(&mut self, index: usize) {
        self.selected = index.min(self.rows.len().saturating_sub(1));
        self.update_selection_view();
    }

    pub fn select_up(&mut self) {
        self.select(self.selected.saturating_sub(1));
    }

    pub fn select_down(&mut self) {
        self.select(self.selected + 1);
    }

    pub fn select_top(&mut self) {
        self.select(0);
    }

    pub fn select_bottom(&mut self) {
        self.select(self.rows.len().saturating_sub(1));
    }

    /// Point status and detail at the selected row.
    fn update_selection_view(&mut self) {
        let Some(row) = self.rows.get(self.selected) else {
            self.detail.clear();
            return;
        };
        if self.fetched.contains(&row.symbol) {
            let status = row
                .quote
                .long_name
                .clone()
                .unwrap_or_else(|| row.symbol.to_string());
            let mut fields = row.quote.template_fields();
            fields.insert("symbol".to_string(), Value::String(row.symbol.to_string()));
            fields.insert(
                "recommendations".to_string(),
                Value::String(row.recommendations_text()),
            );
            self.detail = self.template.render(&fields);
            self.set_status(status);
        } else {
            let status = row.symbol.to_string();
            self.detail.clear();
            self.set_status(status);
        }
    }

    /// Time since the last applied refresh.
    pub fn since_refresh(&self) -> Option<Duration> {
        self.last_refresh.map(|t| t.elapsed())
    }

    /// Human readable age of the data.
    pub fn time_since_refresh(&self) -> String {
        match self.since_refresh() {
            Some(elapsed) => format!(
                "{} ago",
                humantime::format_duration(Duration::from_secs(elapsed.as_secs()))
            ),
            None => "never".to_string(),
        }
    }
}
