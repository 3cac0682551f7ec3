//! Multi-symbol close alignment and cleaning.
//!
//! Given close series for several instruments, align them to the union of their
//! dates. Missing closes are NaN until cleaned:
//! 1. `drop_sparse` removes instruments whose coverage is below a threshold
//! 2. `forward_fill` carries the last close across gaps
//! 3. `drop_incomplete_rows` removes dates still holding a NaN (leading gaps)

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::PriceSeries;

/// Close prices for several instruments on a common timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedCloses {
    /// The common date axis (sorted ascending).
    pub dates: Vec<NaiveDate>,
    /// Closes per symbol; each Vec has the same length as `dates`.
    pub closes: BTreeMap<String, Vec<f64>>,
}

/// Align series to the union of their dates. Non-finite or non-positive closes
/// count as missing.
pub fn align_closes(series: &[PriceSeries]) -> AlignedCloses {
    let dates: Vec<NaiveDate> = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut closes = BTreeMap::new();
    for s in series {
        let by_date: HashMap<NaiveDate, f64> = s
            .points
            .iter()
            .filter(|p| p.close.is_finite() && p.close > 0.0)
            .map(|p| (p.date, p.close))
            .collect();
        let column: Vec<f64> = dates
            .iter()
            .map(|d| by_date.get(d).copied().unwrap_or(f64::NAN))
            .collect();
        closes.insert(s.symbol.clone(), column);
    }

    AlignedCloses { dates, closes }
}

impl AlignedCloses {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.closes.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.closes.keys().map(String::as_str)
    }

    /// Fraction of dates on which `symbol` has a close.
    pub fn coverage(&self, symbol: &str) -> f64 {
        match self.closes.get(symbol) {
            Some(col) if !col.is_empty() => {
                col.iter().filter(|c| !c.is_nan()).count() as f64 / col.len() as f64
            }
            _ => 0.0,
        }
    }

    /// Remove instruments with coverage below `min_coverage`. Returns the dropped symbols.
    pub fn drop_sparse(&mut self, min_coverage: f64) -> Vec<String> {
        let dropped: Vec<String> = self
            .closes
            .keys()
            .filter(|s| self.coverage(s) < min_coverage)
            .cloned()
            .collect();
        for s in &dropped {
            self.closes.remove(s);
        }
        dropped
    }

    /// Carry the last observed close forward across gaps.
    pub fn forward_fill(&mut self) {
        for col in self.closes.values_mut() {
            let mut last = f64::NAN;
            for c in col.iter_mut() {
                if c.is_nan() {
                    *c = last;
                } else {
                    last = *c;
                }
            }
        }
    }

    /// Remove dates where any instrument still has no close.
    pub fn drop_incomplete_rows(&mut self) {
        let keep: Vec<bool> = (0..self.dates.len())
            .map(|i| self.closes.values().all(|col| !col[i].is_nan()))
            .collect();
        self.dates = retain_by_mask(&self.dates, &keep);
        for col in self.closes.values_mut() {
            *col = retain_by_mask(col, &keep);
        }
    }

    /// Simple period returns per symbol (one fewer element than `dates`).
    pub fn returns(&self) -> BTreeMap<String, Vec<f64>> {
        self.closes
            .iter()
            .map(|(s, col)| {
                let r = col.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
                (s.clone(), r)
            })
            .collect()
    }
}

fn retain_by_mask<T: Copy>(values: &[T], keep: &[bool]) -> Vec<T> {
    values
        .iter()
        .zip(keep)
        .filter(|(_, &k)| k)
        .map(|(v, _)| *v)
        .collect()
}
