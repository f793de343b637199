//! Dashboard application state: the session plus the refresh worker and
//! keyboard handling around it.

use crate::api::{FetchError, QuoteFetcher, QuoteMap};
use crate::models::Column;
use crate::session::{RefreshOutcome, Session};
use crossterm::event::{KeyCode, KeyModifiers};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::AbortHandle;

/// Messages from the refresh worker back to the display loop.
#[derive(Debug)]
pub enum WorkerEvent {
    RefreshComplete {
        generation: u64,
        result: Result<QuoteMap, FetchError>,
    },
}

/// Application state.
pub struct App<F> {
    pub session: Session,
    fetcher: Arc<F>,
    events_tx: UnboundedSender<WorkerEvent>,
    events_rx: UnboundedReceiver<WorkerEvent>,
    /// The one refresh task allowed in flight
    worker: Option<AbortHandle>,
    last_attempt: Option<Instant>,
    /// Auto-refresh interval, `None` for manual refresh only
    pub refresh_interval: Option<Duration>,
    /// Column the sort keys act on
    pub column_cursor: Column,
    pub show_help: bool,
    running: bool,
    interrupted: bool,
}

impl<F> App<F> {
    pub fn new(session: Session, fetcher: F, refresh_interval: Option<Duration>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            session,
            fetcher: Arc::new(fetcher),
            events_tx,
            events_rx,
            worker: None,
            last_attempt: None,
            refresh_interval,
            column_cursor: Column::Symbol,
            show_help: false,
            running: true,
            interrupted: false,
        }
    }

    /// Handle everything the worker has reported since the last call.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: WorkerEvent) -> RefreshOutcome {
        match event {
            WorkerEvent::RefreshComplete { generation, result } => {
                let outcome = self.session.complete_refresh(generation, result);
                if outcome != RefreshOutcome::Stale {
                    self.worker = None;
                }
                outcome
            }
        }
    }

    /// Whether the auto-refresh interval has elapsed.
    pub fn needs_auto_refresh(&self) -> bool {
        let Some(interval) = self.refresh_interval else {
            return false;
        };
        if self.session.is_refreshing() {
            return false;
        }
        match self.last_attempt {
            None => true,
            Some(last) => last.elapsed() >= interval,
        }
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn should_quit(&self) -> bool {
        !self.running
    }

    /// The user hit Ctrl-C.
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// Toggle help display.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    fn sort_by(&mut self, column: Column) {
        self.column_cursor = column;
        self.session.select_column(column);
    }
}

impl<F: QuoteFetcher + 'static> App<F> {
    /// Start fetching fresh quotes in the background.
    ///
    /// A refresh still in flight is aborted; should its result slip through
    /// anyway, the session drops it by generation.
    pub fn request_refresh(&mut self) {
        if let Some(previous) = self.worker.take() {
            previous.abort();
        }
        let generation = self.session.request_refresh();
        let fetcher = Arc::clone(&self.fetcher);
        let symbols = self.session.symbols();
        let events_tx = self.events_tx.clone();
        tracing::debug!(generation, symbols = symbols.len(), "spawning refresh");

        let handle = tokio::spawn(async move {
            let result = fetcher.fetch_quotes(&symbols).await;
            // the receiver only goes away when the app is shutting down
            let _ = events_tx.send(WorkerEvent::RefreshComplete { generation, result });
        });
        self.worker = Some(handle.abort_handle());
        self.last_attempt = Some(Instant::now());
    }

    /// Handle keyboard input.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            self.interrupted = true;
            self.quit();
            return;
        }

        // Close help overlay on any key
        if self.show_help {
            self.show_help = false;
            return;
        }

        // Clear warning on any key
        if self.session.warning().is_some() {
            self.session.dismiss_warning();
            return;
        }

        match code {
            // Quit
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),

            // Refresh
            KeyCode::Char('u') | KeyCode::Char(' ') | KeyCode::Char('R') => self.request_refresh(),

            // Navigation
            KeyCode::Up | KeyCode::Char('k') => self.session.select_up(),
            KeyCode::Down | KeyCode::Char('j') => self.session.select_down(),
            KeyCode::Home | KeyCode::Char('g') => self.session.select_top(),
            KeyCode::End | KeyCode::Char('G') => self.session.select_bottom(),
            KeyCode::PageUp => {
                let target = self.session.selected().saturating_sub(10);
                self.session.select(target);
            }
            KeyCode::PageDown => {
                let target = self.session.selected() + 10;
                self.session.select(target);
            }

            // Sorting
            KeyCode::Left | KeyCode::Char('h') => self.column_cursor = self.column_cursor.prev(),
            KeyCode::Right | KeyCode::Char('l') => self.column_cursor = self.column_cursor.next(),
            KeyCode::Char('s') | KeyCode::Enter => self.sort_by(self.column_cursor),
            KeyCode::Char(digit @ '0'..='9') => {
                // '0' is the tenth column
                let index = digit.to_digit(10).map_or(0, |d| (d as usize + 9) % 10);
                if let Some(column) = Column::from_index(index) {
                    self.sort_by(column);
                }
            }

            KeyCode::Char('?') => self.toggle_help(),

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuoteRecord, SortDirection};
    use crate::session::RefreshState;
    use crate::template::DetailTemplate;
    use crate::tickers::{TickerSymbol, parse_ticker_list};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    impl QuoteFetcher for CountingFetcher {
        async fn fetch_quotes(&self, symbols: &[TickerSymbol]) -> Result<QuoteMap, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(symbols
                .iter()
                .map(|s| {
                    let quote = QuoteRecord {
                        bid: Some(42.0),
                        ..Default::default()
                    };
                    (s.clone(), quote)
                })
                .collect())
        }
    }

    fn app(refresh_interval: Option<Duration>) -> App<CountingFetcher> {
        let session = Session::new(&parse_ticker_list(&["AAPL", "MSFT"]), DetailTemplate::default());
        let fetcher = CountingFetcher {
            calls: AtomicUsize::new(0),
        };
        App::new(session, fetcher, refresh_interval)
    }

    fn press(app: &mut App<CountingFetcher>, code: KeyCode) {
        app.handle_key(code, KeyModifiers::NONE);
    }

    #[tokio::test]
    async fn test_new_refresh_supersedes_running_one() {
        let mut app = app(None);
        app.request_refresh();
        app.request_refresh();
        assert_eq!(app.session.state(), RefreshState::Refreshing { generation: 2 });

        // the first task is aborted; if it got far enough to report, it is stale
        let mut stale = 0;
        loop {
            let event = tokio::time::timeout(Duration::from_secs(5), app.events_rx.recv())
                .await
                .unwrap()
                .unwrap();
            match app.handle_event(event) {
                RefreshOutcome::Stale => stale += 1,
                RefreshOutcome::Applied { .. } => break,
                RefreshOutcome::Failed => panic!("refresh failed"),
            }
        }

        assert!(stale <= 1);
        assert_eq!(app.session.state(), RefreshState::Idle);
        assert_eq!(app.session.rows()[0].quote.bid, Some(42.0));
        assert!(app.worker.is_none());
    }

    #[tokio::test]
    async fn test_refresh_key_spawns_worker() {
        let mut app = app(None);
        press(&mut app, KeyCode::Char('u'));
        assert!(app.session.is_refreshing());
        assert!(app.worker.is_some());
    }

    #[test]
    fn test_sort_keys() {
        let mut app = app(None);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.column_cursor, Column::DayLow);

        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.session.sort(), (Column::DayLow, SortDirection::Ascending));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session.sort(), (Column::DayLow, SortDirection::Descending));

        press(&mut app, KeyCode::Char('0'));
        assert_eq!(app.session.sort().0, Column::ChangePercent);
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.session.sort(), (Column::Symbol, SortDirection::Ascending));
        assert_eq!(app.column_cursor, Column::Symbol);
    }

    #[test]
    fn test_navigation_keys() {
        let mut app = app(None);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.session.selected(), 1);
        assert_eq!(app.session.status(), "MSFT");
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.session.selected(), 0);
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.session.selected(), 1);
    }

    #[test]
    fn test_help_swallows_next_key() {
        let mut app = app(None);
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.show_help);
        assert!(!app.should_quit());
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit());
        assert!(!app.interrupted());
    }

    #[test]
    fn test_ctrl_c_interrupts() {
        let mut app = app(None);
        app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.should_quit());
        assert!(app.interrupted());
    }

    #[tokio::test]
    async fn test_auto_refresh_schedule() {
        assert!(!app(None).needs_auto_refresh());

        let mut app = app(Some(Duration::from_secs(60)));
        assert!(app.needs_auto_refresh());
        app.request_refresh();
        // in flight
        assert!(!app.needs_auto_refresh());
    }
}
