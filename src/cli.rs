//! Command-line interface.

use crate::api::YAHOO_FINANCE_URL;
use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Stock ticker quotes with buy/sell hints from the 52-week range.
///
/// Without `--once`, opens an interactive dashboard with a sortable table
/// and a details pane for the selected ticker.
#[derive(Parser, Debug, Clone)]
#[command(name = "tickrs")]
#[command(version)]
#[command(about = "Stock ticker quotes with 52-week range buy/sell hints", long_about = None)]
#[command(after_help = "Examples:\n  tickrs --once --tickers=AAPL,MSFT,GOOG\n  tickrs --tickers-from watchlist.txt")]
pub struct Args {
    /// One-time tickers table with recommendations, then exit
    #[arg(long, conflicts_with = "details_template")]
    pub once: bool,

    /// Path to the details template [default: details-template.md]
    #[arg(long, value_name = "PATH")]
    pub details_template: Option<PathBuf>,

    /// Tickers to watch (comma-separated)
    #[arg(long, value_delimiter = ',', conflicts_with = "tickers_from")]
    pub tickers: Option<Vec<String>>,

    /// File with tickers, one per line [default: tickers.txt]
    #[arg(long, value_name = "PATH")]
    pub tickers_from: Option<PathBuf>,

    /// Tell more about what is going on
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short = 'c', long, env = "TICKRS_CONFIG")]
    pub config: Option<PathBuf>,

    /// API timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Dashboard auto-refresh interval in seconds, 0 disables
    #[arg(short = 'd', long)]
    pub delay: Option<f64>,

    /// Quote endpoint
    #[arg(long, env = "TICKRS_API_URL", default_value = YAHOO_FINANCE_URL, hide = true)]
    pub api_url: String,
}

/// Where the ticker symbols come from.
#[derive(Debug, Clone, PartialEq)]
pub enum TickerSource {
    List(Vec<String>),
    File(PathBuf),
}

/// Template file to use and whether the user asked for it explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSource {
    pub path: PathBuf,
    pub explicit: bool,
}

impl Args {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Args::parse()
    }

    pub fn ticker_source(&self, config: &Config) -> TickerSource {
        match (&self.tickers, &self.tickers_from) {
            (Some(list), _) => TickerSource::List(list.clone()),
            (None, Some(path)) => TickerSource::File(path.clone()),
            (None, None) => TickerSource::File(config.files.tickers.clone()),
        }
    }

    pub fn template_source(&self, config: &Config) -> TemplateSource {
        match &self.details_template {
            Some(path) => TemplateSource {
                path: path.clone(),
                explicit: true,
            },
            None => TemplateSource {
                path: config.files.details_template.clone(),
                explicit: false,
            },
        }
    }

    pub fn timeout(&self, config: &Config) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(config.general.timeout))
    }

    /// Auto-refresh interval; `None` when disabled.
    pub fn refresh_interval(&self, config: &Config) -> Option<Duration> {
        let secs = self.delay.unwrap_or(config.general.refresh_interval);
        // Never hammer the API faster than once a second
        (secs > 0.0).then(|| Duration::from_secs_f64(secs.max(1.0)))
    }
}
