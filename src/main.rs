//! tickrs - stock ticker quotes with buy/sell hints from the 52-week range.

mod analysis;
mod api;
mod app;
mod cli;
mod config;
mod logging;
mod models;
mod report;
mod session;
mod template;
mod tickers;
mod ui;

use anyhow::{Context, Result};
use api::YahooFinanceClient;
use app::App;
use cli::{Args, TemplateSource, TickerSource};
use config::Config;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use logging::LogTarget;
use ratatui::{Terminal, backend::CrosstermBackend};
use session::Session;
use std::collections::BTreeSet;
use std::io::{self, Stdout};
use std::time::Duration;
use template::DetailTemplate;
use thiserror::Error;
use tickers::TickerSymbol;

/// The user asked us to stop.
#[derive(Debug, Error)]
#[error("interrupted")]
struct Interrupted;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse_args();

    // Load configuration
    let config = if let Some(ref path) = args.config {
        Config::load(path)?
    } else {
        Config::load_or_default()
    };

    // The dashboard log file is only created once startup has succeeded
    if args.once {
        logging::init_logging(args.verbose, LogTarget::Stderr)?;
    }

    let symbols = load_symbols(&args.ticker_source(&config))?;
    if symbols.is_empty() {
        eprintln!("Error: No tickers to watch.");
        eprintln!("Provide tickers via --tickers or a tickers file.");
        eprintln!();
        eprintln!("Example: tickrs --once --tickers=AAPL,MSFT,GOOG");
        eprintln!();
        eprintln!("Settings can live in {:?}:", Config::default_config_path());
        eprintln!("{}", config::sample_config());
        std::process::exit(1);
    }

    let client = YahooFinanceClient::new(args.api_url.clone(), args.timeout(&config))
        .context("Failed to set up the quote client")?;

    let result = if args.once {
        tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting one-shot report");
        run_once(&client, &symbols).await
    } else {
        let template_source = args.template_source(&config);
        let template = load_template(&template_source)?;
        logging::init_logging(args.verbose, LogTarget::File(&config.logging.file))?;
        tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting dashboard");
        let template = template.unwrap_or_else(|| {
            tracing::info!(path = %template_source.path.display(), "no details template, using built-in");
            DetailTemplate::default()
        });
        let session = Session::new(&symbols, template);
        let mut app = App::new(session, client, args.refresh_interval(&config));
        run_interactive(&mut app, config.general.refresh_on_start).await
    };

    match result {
        Err(e) if e.is::<Interrupted>() => {
            tracing::info!("interrupted by user");
            eprintln!("Interrupted");
            std::process::exit(1);
        }
        other => other,
    }
}

fn load_symbols(source: &TickerSource) -> Result<BTreeSet<TickerSymbol>> {
    match source {
        TickerSource::List(list) => Ok(tickers::parse_ticker_list(list)),
        TickerSource::File(path) => Ok(tickers::load_tickers_file(path)?),
    }
}

/// Read the detail template. `None` when the default file is absent and the
/// built-in template should be used.
fn load_template(source: &TemplateSource) -> Result<Option<DetailTemplate>> {
    match std::fs::read_to_string(&source.path) {
        Ok(text) => DetailTemplate::parse(&text)
            .map(Some)
            .with_context(|| format!("Invalid details template: {}", source.path.display())),
        Err(e) if !source.explicit && e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| {
            format!("Failed to read details template: {}", source.path.display())
        }),
    }
}

/// Print the report once and exit.
async fn run_once(client: &YahooFinanceClient, symbols: &BTreeSet<TickerSymbol>) -> Result<()> {
    let rows = tokio::select! {
        rows = report::build_report(client, symbols) => rows?,
        _ = tokio::signal::ctrl_c() => return Err(Interrupted.into()),
    };
    print!("{}", report::render_table(&rows));
    Ok(())
}

/// Owns the terminal while the dashboard runs and restores it on drop,
/// error paths included.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Run in interactive mode with TUI.
async fn run_interactive(app: &mut App<YahooFinanceClient>, refresh_on_start: bool) -> Result<()> {
    let mut guard = TerminalGuard::new()?;

    if refresh_on_start {
        app.request_refresh();
    }

    run_app(&mut guard.terminal, app)?;

    if app.interrupted() {
        return Err(Interrupted.into());
    }
    Ok(())
}

/// Main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App<YahooFinanceClient>) -> Result<()> {
    let tick_rate = Duration::from_millis(100);

    loop {
        // Draw UI
        terminal.draw(|f| ui::render(f, app))?;

        // Handle events with timeout
        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code, key.modifiers);
                }
            }
        }

        // Apply finished refreshes
        app.drain_events();

        if app.should_quit() {
            break;
        }

        if app.needs_auto_refresh() {
            app.request_refresh();
        }
    }

    Ok(())
}
