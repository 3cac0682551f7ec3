//! CSV directory provider.
//!
//! Layout: `{dir}/{SYMBOL}.csv` with a header row. The date column is `date`
//! (any case, `YYYY-MM-DD`); the price column is `close`, falling back to
//! `adj_close` / `adj close`. Extra columns are ignored.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use super::provider::{DataError, PriceProvider};
use crate::domain::{PricePoint, PriceSeries};

const CLOSE_COLUMNS: [&str; 3] = ["close", "adj_close", "adj close"];

pub struct CsvDirProvider {
    dir: PathBuf,
}

impl CsvDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    /// Symbols with a CSV file in the directory, sorted.
    pub fn available_symbols(&self) -> Result<Vec<String>, DataError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| DataError::Io {
            symbol: self.dir.display().to_string(),
            source: e,
        })?;
        let mut symbols: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("csv"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        symbols.sort();
        Ok(symbols)
    }

    /// Parse the full history of a symbol.
    pub fn load(&self, symbol: &str) -> Result<PriceSeries, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let malformed = |reason: String| DataError::Malformed {
            symbol: symbol.to_string(),
            reason,
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| malformed(e.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|e| malformed(e.to_string()))?
            .clone();
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let date_idx = find("date").ok_or_else(|| malformed("missing 'date' column".into()))?;
        let close_idx = CLOSE_COLUMNS
            .iter()
            .find_map(|c| find(c))
            .ok_or_else(|| malformed("missing 'close' column".into()))?;

        let mut points = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| malformed(e.to_string()))?;
            let raw_date = record.get(date_idx).unwrap_or_default();
            let raw_close = record.get(close_idx).unwrap_or_default();
            let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
                .map_err(|e| malformed(format!("row {}: bad date '{raw_date}': {e}", line + 2)))?;
            // Empty cells are gaps, not errors.
            if raw_close.is_empty() {
                continue;
            }
            let close: f64 = raw_close
                .parse()
                .map_err(|e| malformed(format!("row {}: bad close '{raw_close}': {e}", line + 2)))?;
            points.push(PricePoint { date, close });
        }

        Ok(PriceSeries::new(symbol, points))
    }
}

impl PriceProvider for CsvDirProvider {
    fn name(&self) -> &str {
        "csv-dir"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let mut series = self.load(symbol)?;
        series.points.retain(|p| p.date >= start && p.date <= end);
        if series.is_empty() {
            return Err(DataError::NoDataInRange {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        Ok(series)
    }
}
