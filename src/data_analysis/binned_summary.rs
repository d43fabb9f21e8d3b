// src/data_analysis/binned_summary.rs

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::BIN_EDGE_EPSILON;
use crate::data_analysis::derived_series::DerivedSeries;
use crate::data_analysis::statistics::{mean, min_max, quantile, std_dev};
use crate::types::{BinIndex, Signal};
use crate::{Error, Result};

/// How a position is assigned to a fixed-width bin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinRule {
    /// Round half up to the nearest bin centre
    #[default]
    Nearest,
    /// Bin `i` covers `[i·w, (i+1)·w)`
    Floor,
}

impl BinRule {
    /// Bin index of `position`, or None for a non-finite position.
    pub fn index(self, position: f64, width: f64) -> Option<BinIndex> {
        if !position.is_finite() {
            return None;
        }
        let scaled = match self {
            BinRule::Nearest => (position / width + 0.5).floor(),
            BinRule::Floor => (position / width + BIN_EDGE_EPSILON).floor(),
        };
        Some(scaled as BinIndex)
    }
}

pub fn bin_centre(index: BinIndex, width: f64) -> f64 {
    index as f64 * width
}

/// Statistics of all samples that fell into one position bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinSummary {
    pub bin: BinIndex,
    pub centre: f64,
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation (ddof = 1); 0 for a single sample
    pub std: f64,
    pub q1: f64,
    pub q3: f64,
    /// `q3 + k·(q3 - q1)`
    pub upper_bound: f64,
}

impl BinSummary {
    /// Summarizes the finite `values` of one bin. None if no value is finite.
    pub fn from_values(bin: BinIndex, width: f64, values: &[f64], iqr_multiplier: f64) -> Option<Self> {
        let mean = mean(values)?;
        let (min, max) = min_max(values)?;
        let q1 = quantile(values, 0.25)?;
        let q3 = quantile(values, 0.75)?;
        Some(Self {
            bin,
            centre: bin_centre(bin, width),
            count: values.iter().filter(|v| v.is_finite()).count(),
            mean,
            min,
            max,
            std: std_dev(values, 1),
            q1,
            q3,
            upper_bound: q3 + iqr_multiplier * (q3 - q1),
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Per-bin statistics of one signal across one or more sessions, ordered by bin.
#[derive(Debug, Clone, PartialEq)]
pub struct BinSummaryTable {
    pub signal: Signal,
    pub bin_width: f64,
    pub rule: BinRule,
    pub iqr_multiplier: f64,
    pub bins: Vec<BinSummary>,
}

/// One coarse row of the dashboard summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeSummary {
    /// Lower edge of the range
    pub range_start: f64,
    pub range_end: f64,
    pub mean: f64,
    pub upper_bound: f64,
    pub bins: usize,
}

/// Coarse re-aggregation of a summary table plus an overall row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplaySummary {
    pub ranges: Vec<RangeSummary>,
    pub overall_mean: f64,
    pub overall_upper_bound: f64,
}

fn check_width(name: &str, width: f64) -> Result<()> {
    if width.is_finite() && width > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{name} must be positive, got {width}")))
    }
}

impl BinSummaryTable {
    /// Groups `(position, value)` pairs into bins and summarizes each bin.
    /// Pairs with a non-finite position or value are ignored.
    pub fn from_pairs<I>(signal: Signal, pairs: I, bin_width: f64, rule: BinRule, iqr_multiplier: f64) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        check_width("bin width", bin_width)?;
        let mut grouped: BTreeMap<BinIndex, Vec<f64>> = BTreeMap::new();
        let mut ignored = 0usize;
        for (position, value) in pairs {
            match rule.index(position, bin_width) {
                Some(bin) if value.is_finite() => grouped.entry(bin).or_default().push(value),
                _ => ignored += 1,
            }
        }
        if ignored > 0 {
            debug!("{}: ignored {} non-finite samples while binning", signal, ignored);
        }

        let bins = grouped
            .iter()
            .filter_map(|(&bin, values)| BinSummary::from_values(bin, bin_width, values, iqr_multiplier))
            .collect();
        Ok(Self {
            signal,
            bin_width,
            rule,
            iqr_multiplier,
            bins,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn get(&self, bin: BinIndex) -> Option<&BinSummary> {
        self.bins
            .binary_search_by_key(&bin, |b| b.bin)
            .ok()
            .map(|i| &self.bins[i])
    }

    /// Summary of the bin a position falls into under this table's rule.
    pub fn lookup(&self, position: f64) -> Option<&BinSummary> {
        self.rule
            .index(position, self.bin_width)
            .and_then(|bin| self.get(bin))
    }

    /// Averages bin means and upper bounds over ranges of `range_width`
    /// (keyed by the bin centre), plus the mean over those ranges.
    pub fn display_ranges(&self, range_width: f64) -> Result<DisplaySummary> {
        check_width("display range width", range_width)?;
        let mut grouped: BTreeMap<i64, Vec<&BinSummary>> = BTreeMap::new();
        for bin in &self.bins {
            let key = (bin.centre / range_width + BIN_EDGE_EPSILON).floor() as i64;
            grouped.entry(key).or_default().push(bin);
        }

        let ranges: Vec<RangeSummary> = grouped
            .into_iter()
            .map(|(key, bins)| {
                let n = bins.len() as f64;
                RangeSummary {
                    range_start: key as f64 * range_width,
                    range_end: (key + 1) as f64 * range_width,
                    mean: bins.iter().map(|b| b.mean).sum::<f64>() / n,
                    upper_bound: bins.iter().map(|b| b.upper_bound).sum::<f64>() / n,
                    bins: bins.len(),
                }
            })
            .collect();

        let overall = |f: fn(&RangeSummary) -> f64| {
            if ranges.is_empty() {
                f64::NAN
            } else {
                ranges.iter().map(f).sum::<f64>() / ranges.len() as f64
            }
        };
        Ok(DisplaySummary {
            overall_mean: overall(|r| r.mean),
            overall_upper_bound: overall(|r| r.upper_bound),
            ranges,
        })
    }

    /// Bin means as `(centre, mean)` pairs, the shape a summary CSV stores.
    pub fn mean_pairs(&self) -> Vec<(f64, f64)> {
        self.bins.iter().map(|b| (b.centre, b.mean)).collect()
    }
}

/// Summarizes one signal of several processed sessions together.
pub fn summarize_signal(
    series: &[DerivedSeries],
    signal: Signal,
    bin_width: f64,
    iqr_multiplier: f64,
) -> Result<BinSummaryTable> {
    let pairs = series
        .iter()
        .flat_map(|s| s.rows.iter().map(move |r| (r.position, r.signal(signal))));
    let table = BinSummaryTable::from_pairs(signal, pairs, bin_width, BinRule::Nearest, iqr_multiplier)?;
    debug!(
        "summarized {} over {} series into {} bins of {} m",
        signal,
        series.len(),
        table.len(),
        bin_width
    );
    Ok(table)
}


// src/data_analysis/binned_summary.rs
