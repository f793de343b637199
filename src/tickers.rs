//! Ticker symbol loading.
//!
//! Symbols come either from a text file (one per line) or from the
//! `--tickers` list. Both paths normalize the same way.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A trimmed, upper-cased, non-empty ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TickerSymbol(String);

impl TickerSymbol {
    /// Normalize raw text into a symbol. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_uppercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TickerSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum TickerError {
    #[error("failed to read tickers from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read symbols from a line-oriented source.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn load_tickers<R: BufRead>(
    reader: R,
    origin: &Path,
) -> Result<BTreeSet<TickerSymbol>, TickerError> {
    let mut tickers = BTreeSet::new();
    for line in reader.lines() {
        let line = line.map_err(|source| TickerError::Io {
            path: origin.to_path_buf(),
            source,
        })?;
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        if let Some(symbol) = TickerSymbol::parse(line) {
            tickers.insert(symbol);
        }
    }
    Ok(tickers)
}

/// Read symbols from a file on disk.
pub fn load_tickers_file(path: &Path) -> Result<BTreeSet<TickerSymbol>, TickerError> {
    let file = File::open(path).map_err(|source| TickerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let tickers = load_tickers(BufReader::new(file), path)?;
    tracing::debug!(path = %path.display(), count = tickers.len(), "loaded tickers");
    Ok(tickers)
}

/// Normalize symbols given on the command line.
pub fn parse_ticker_list<S: AsRef<str>>(items: &[S]) -> BTreeSet<TickerSymbol> {
    items
        .iter()
        .filter_map(|item| TickerSymbol::parse(item.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn symbols(set: &BTreeSet<TickerSymbol>) -> Vec<&str> {
        set.iter().map(TickerSymbol::as_str).collect()
    }

    #[test]
    fn test_load_skips_comments_and_blanks() {
        let input = Cursor::new("AAPL\n#comment\n\nmsft\n");
        let tickers = load_tickers(input, Path::new("inline")).unwrap();
        assert_eq!(symbols(&tickers), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn test_load_collapses_duplicates_across_case() {
        let input = Cursor::new("goog\n  GOOG  \nGoog\n   # indented comment\n");
        let tickers = load_tickers(input, Path::new("inline")).unwrap();
        assert_eq!(symbols(&tickers), vec!["GOOG"]);
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "nvda").unwrap();
        writeln!(file, "amd").unwrap();

        let tickers = load_tickers_file(file.path()).unwrap();
        assert_eq!(symbols(&tickers), vec!["AMD", "NVDA"]);
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.txt");

        let err = load_tickers_file(&path).unwrap_err();
        assert!(err.to_string().contains("nope.txt"));
    }

    #[test]
    fn test_parse_ticker_list() {
        let tickers = parse_ticker_list(&["aapl", " msft ", "", "AAPL"]);
        assert_eq!(symbols(&tickers), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn test_symbol_rejects_blank() {
        assert!(TickerSymbol::parse("   ").is_none());
        assert_eq!(TickerSymbol::parse(" brk-b ").unwrap().as_str(), "BRK-B");
    }
}
