// src/data_analysis/evaluation.rs

use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::BIN_EDGE_EPSILON;
use crate::data_analysis::anomaly_flagger::Baseline;
use crate::data_analysis::derived_series::DerivedSeries;
use crate::types::BinIndex;
use crate::{Error, Result};

/// Single-file verdict of the fine-bin ratio detector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionDetection {
    pub name: String,
    /// `(fine bin index, share of exceeding samples)` for every covered fine bin
    pub bin_ratios: Vec<(BinIndex, f64)>,
    pub anomalous_bins: usize,
    pub detected: bool,
}

/// Flags one processed session on its own.
///
/// Samples without a baseline bin are dropped. The rest are grouped into
/// fine bins of `fine_width` (floor rule); a fine bin is anomalous when the
/// share of its samples outside the baseline envelope is at least
/// `ratio_threshold`.
pub fn detect_session(
    series: &DerivedSeries,
    baseline: &Baseline,
    fine_width: f64,
    ratio_threshold: f64,
) -> Result<SessionDetection> {
    if !(fine_width.is_finite() && fine_width > 0.0) {
        return Err(Error::InvalidConfig(format!("fine bin width must be positive, got {fine_width}")));
    }

    // (exceeding, total) per fine bin
    let mut counts: BTreeMap<BinIndex, (usize, usize)> = BTreeMap::new();
    for row in &series.rows {
        let value = row.signal(baseline.signal);
        let Some(envelope) = baseline.envelope_at(row.position) else {
            continue;
        };
        if !value.is_finite() {
            continue;
        }
        let fine = (row.position / fine_width + BIN_EDGE_EPSILON).floor() as BinIndex;
        let entry = counts.entry(fine).or_insert((0, 0));
        if envelope.is_exceeded(value) {
            entry.0 += 1;
        }
        entry.1 += 1;
    }

    let bin_ratios: Vec<(BinIndex, f64)> = counts
        .into_iter()
        .map(|(bin, (exceeding, total))| (bin, exceeding as f64 / total as f64))
        .collect();
    let anomalous_bins = bin_ratios.iter().filter(|(_, r)| *r >= ratio_threshold).count();
    debug!(
        "{}: {} of {} fine bins at or above {:.0}% exceedance",
        series.name,
        anomalous_bins,
        bin_ratios.len(),
        ratio_threshold * 100.0
    );

    Ok(SessionDetection {
        name: series.name.clone(),
        bin_ratios,
        anomalous_bins,
        detected: anomalous_bins > 0,
    })
}

/// Precision, recall and F1 of one class; 0 where a ratio is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ClassMetrics {
    fn new(true_pos: usize, false_pos: usize, false_neg: usize) -> Self {
        let precision = ratio(true_pos, true_pos + false_pos);
        let recall = ratio(true_pos, true_pos + false_neg);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
            support: true_pos + false_neg,
        }
    }
}

/// Binary confusion matrix; "positive" means anomalous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    /// Builds the matrix from `(truth, prediction)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (bool, bool)>,
    {
        let mut cm = ConfusionMatrix::default();
        for (truth, predicted) in pairs {
            match (truth, predicted) {
                (false, false) => cm.true_negative += 1,
                (false, true) => cm.false_positive += 1,
                (true, false) => cm.false_negative += 1,
                (true, true) => cm.true_positive += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_negative + self.true_positive, self.total())
    }

    pub fn normal(&self) -> ClassMetrics {
        ClassMetrics::new(self.true_negative, self.false_negative, self.false_positive)
    }

    pub fn anomalous(&self) -> ClassMetrics {
        ClassMetrics::new(self.true_positive, self.false_positive, self.false_negative)
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Confusion Matrix ===")?;
        writeln!(f, "               pred normal  pred anomal")?;
        writeln!(f, "true normal    {:>11}  {:>11}", self.true_negative, self.false_positive)?;
        writeln!(f, "true anomal    {:>11}  {:>11}", self.false_negative, self.true_positive)?;
        writeln!(f)?;
        writeln!(f, "=== Classification Report ===")?;
        writeln!(f, "{:>10} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support")?;
        for (label, m) in [("normal", self.normal()), ("anomal", self.anomalous())] {
            writeln!(
                f,
                "{:>10} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                label, m.precision, m.recall, m.f1, m.support
            )?;
        }
        write!(f, "{:>10} {:>32.2} {:>10}", "accuracy", self.accuracy(), self.total())
    }
}


// src/data_analysis/evaluation.rs
