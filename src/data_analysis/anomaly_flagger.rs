// src/data_analysis/anomaly_flagger.rs

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::DetectionConfig;
use crate::constants::BIN_EDGE_EPSILON;
use crate::data_analysis::binned_summary::{bin_centre, BinRule, BinSummaryTable};
use crate::data_analysis::derived_series::DerivedSeries;
use crate::data_analysis::statistics::{mean, std_dev};
use crate::types::{BinIndex, Signal};
use crate::{Error, Result};

/// Rule deciding whether a value lies outside a baseline bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlagStrategy {
    /// Exceeds when above the bin's Q3 + k·IQR
    IqrUpperBound,
    /// Exceeds when outside mean ± k·σ across reference sets
    MeanStdBand { k: f64 },
    /// Exceeds when outside mean_pitch ± mean_tilt·scale
    MeanTiltBand { scale: f64 },
}

/// Allowed value range of one baseline bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub lower: Option<f64>,
    pub upper: f64,
}

impl Envelope {
    pub fn is_exceeded(&self, value: f64) -> bool {
        value > self.upper || self.lower.map_or(false, |lower| value < lower)
    }
}

/// Per-bin envelopes of one signal built from reference runs.
/// Immutable once built; share it behind an `Arc` if several flaggers need it.
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    pub signal: Signal,
    pub strategy: FlagStrategy,
    pub bin_width: f64,
    pub rule: BinRule,
    pub envelopes: BTreeMap<BinIndex, Envelope>,
}

impl Baseline {
    /// Gyro baseline: every summary bin's upper bound.
    pub fn from_summary(table: &BinSummaryTable) -> Self {
        let envelopes = table
            .bins
            .iter()
            .map(|b| (b.bin, Envelope { lower: None, upper: b.upper_bound }))
            .collect();
        Self {
            signal: table.signal,
            strategy: FlagStrategy::IqrUpperBound,
            bin_width: table.bin_width,
            rule: table.rule,
            envelopes,
        }
    }

    /// Upper-bound baseline from `(bin centre, upper bound)` pairs, e.g. stored gyro summaries.
    /// Upper bounds of several summaries landing in one bin are averaged.
    pub fn from_upper_bounds(signal: Signal, points: &[(f64, f64)], bin_width: f64, rule: BinRule) -> Result<Self> {
        check_width(bin_width)?;
        let mut grouped: BTreeMap<BinIndex, Vec<f64>> = BTreeMap::new();
        for &(centre, upper) in points {
            if let Some(bin) = rule.index(centre, bin_width) {
                grouped.entry(bin).or_default().push(upper);
            }
        }
        let envelopes = grouped
            .into_iter()
            .filter_map(|(bin, uppers)| mean(&uppers).map(|upper| (bin, Envelope { lower: None, upper })))
            .collect();
        Ok(Self {
            signal,
            strategy: FlagStrategy::IqrUpperBound,
            bin_width,
            rule,
            envelopes,
        })
    }

    /// `mean ± k·σ` band from the per-bin means of several reference sets.
    /// σ is the sample std (ddof = 1) across sets; a bin seen in one set gets σ = 0.
    pub fn mean_std_band(
        signal: Signal,
        reference_sets: &[Vec<(f64, f64)>],
        bin_width: f64,
        rule: BinRule,
        k: f64,
    ) -> Result<Self> {
        check_width(bin_width)?;
        let mut grouped: BTreeMap<BinIndex, Vec<f64>> = BTreeMap::new();
        for set in reference_sets {
            for &(centre, value) in set {
                if let Some(bin) = rule.index(centre, bin_width) {
                    grouped.entry(bin).or_default().push(value);
                }
            }
        }

        let envelopes = grouped
            .into_iter()
            .filter_map(|(bin, values)| {
                let m = mean(&values)?;
                let sigma = std_dev(&values, 1);
                Some((bin, Envelope { lower: Some(m - k * sigma), upper: m + k * sigma }))
            })
            .collect();
        Ok(Self {
            signal,
            strategy: FlagStrategy::MeanStdBand { k },
            bin_width,
            rule,
            envelopes,
        })
    }

    /// `mean_pitch ± mean_tilt·scale` band from `(bin centre, mean pitch, mean tilt)` rows.
    /// Rows falling into the same bin are averaged.
    pub fn mean_tilt_band(rows: &[(f64, f64, f64)], bin_width: f64, rule: BinRule, scale: f64) -> Result<Self> {
        check_width(bin_width)?;
        let mut grouped: BTreeMap<BinIndex, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
        for &(centre, pitch, tilt) in rows {
            if let Some(bin) = rule.index(centre, bin_width) {
                let entry = grouped.entry(bin).or_default();
                entry.0.push(pitch);
                entry.1.push(tilt);
            }
        }

        let envelopes = grouped
            .into_iter()
            .filter_map(|(bin, (pitch, tilt))| {
                let p = mean(&pitch)?;
                let half = mean(&tilt)?.abs() * scale;
                Some((bin, Envelope { lower: Some(p - half), upper: p + half }))
            })
            .collect();
        Ok(Self {
            signal: Signal::CumulativePitch,
            strategy: FlagStrategy::MeanTiltBand { scale },
            bin_width,
            rule,
            envelopes,
        })
    }

    /// Same envelopes, looked up with a different bin rule.
    pub fn with_rule(mut self, rule: BinRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn envelope_at(&self, position: f64) -> Option<&Envelope> {
        self.rule
            .index(position, self.bin_width)
            .and_then(|bin| self.envelopes.get(&bin))
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }

    /// `(bin centre, envelope)` pairs in position order.
    pub fn points(&self) -> Vec<(f64, Envelope)> {
        self.envelopes
            .iter()
            .map(|(&bin, &env)| (bin_centre(bin, self.bin_width), env))
            .collect()
    }
}

fn check_width(width: f64) -> Result<()> {
    if width.is_finite() && width > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("baseline bin width must be positive, got {width}")))
    }
}

fn coarse_index(position: f64, width: f64) -> BinIndex {
    (position / width + BIN_EDGE_EPSILON).floor() as BinIndex
}

/// Exceedance tally of one coarse position bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinVerdict {
    pub bin: BinIndex,
    pub range_start: f64,
    pub range_end: f64,
    /// Files with at least one exceeding sample in this bin
    pub exceeding_files: usize,
    pub total_files: usize,
    pub percent: f64,
    pub abnormal: bool,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyReport {
    pub signal: Signal,
    pub strategy: FlagStrategy,
    /// Every coarse bin with at least one covered sample, in position order
    pub bins: Vec<BinVerdict>,
    /// Indices of the abnormal subset of `bins`
    pub abnormal_bins: Vec<BinIndex>,
    /// Coarse bins where some sample had no baseline bin
    pub uncovered_bins: Vec<BinIndex>,
    pub uncovered_samples: usize,
    pub anomalous: bool,
}

impl AnomalyReport {
    pub fn abnormal(&self) -> impl Iterator<Item = &BinVerdict> {
        self.bins.iter().filter(|b| b.abnormal)
    }
}

/// Outcome of a multi-file comparison against a baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnomalyVerdict {
    InsufficientData { required: usize, provided: usize },
    Assessed(AnomalyReport),
}

impl AnomalyVerdict {
    pub fn is_anomalous(&self) -> bool {
        matches!(self, AnomalyVerdict::Assessed(report) if report.anomalous)
    }
}

/// Counts, per coarse position bin, how many candidate files leave the
/// baseline envelope, and marks bins abnormal once the count meets the
/// configured threshold.
pub fn flag_anomalies(candidates: &[DerivedSeries], baseline: &Baseline, config: &DetectionConfig) -> Result<AnomalyVerdict> {
    if candidates.len() < config.min_files {
        warn!(
            "only {} candidate files, at least {} are required",
            candidates.len(),
            config.min_files
        );
        return Ok(AnomalyVerdict::InsufficientData {
            required: config.min_files,
            provided: candidates.len(),
        });
    }
    if !(config.coarse_bin_width.is_finite() && config.coarse_bin_width > 0.0) {
        return Err(Error::InvalidConfig(format!(
            "coarse bin width must be positive, got {}",
            config.coarse_bin_width
        )));
    }

    let width = config.coarse_bin_width;
    let mut exceeding: BTreeMap<BinIndex, Vec<String>> = BTreeMap::new();
    let mut uncovered_bins = BTreeSet::new();
    let mut uncovered_samples = 0usize;

    for candidate in candidates {
        let mut file_exceeds = BTreeSet::new();
        for row in &candidate.rows {
            let value = row.signal(baseline.signal);
            if !row.position.is_finite() || !value.is_finite() {
                continue;
            }
            let coarse = coarse_index(row.position, width);
            match baseline.envelope_at(row.position) {
                Some(envelope) => {
                    let files = exceeding.entry(coarse).or_default();
                    if envelope.is_exceeded(value) && file_exceeds.insert(coarse) {
                        files.push(candidate.name.clone());
                    }
                }
                None => {
                    uncovered_samples += 1;
                    uncovered_bins.insert(coarse);
                }
            }
        }
        debug!("{}: exceeds baseline in {} coarse bins", candidate.name, file_exceeds.len());
    }

    if uncovered_samples > 0 {
        warn!(
            "{} samples fell outside the baseline in coarse bins {:?}",
            uncovered_samples, uncovered_bins
        );
    }

    let total = candidates.len();
    let bins: Vec<BinVerdict> = exceeding
        .into_iter()
        .map(|(bin, files)| BinVerdict {
            bin,
            range_start: bin as f64 * width,
            range_end: (bin + 1) as f64 * width,
            exceeding_files: files.len(),
            total_files: total,
            percent: files.len() as f64 / total as f64 * 100.0,
            abnormal: config.exceed_threshold.is_met(files.len(), total),
            files,
        })
        .collect();
    let abnormal_bins: Vec<BinIndex> = bins.iter().filter(|b| b.abnormal).map(|b| b.bin).collect();
    let anomalous = !abnormal_bins.is_empty();
    info!(
        "{}: {} of {} coarse bins abnormal across {} files",
        baseline.signal,
        abnormal_bins.len(),
        bins.len(),
        total
    );

    Ok(AnomalyVerdict::Assessed(AnomalyReport {
        signal: baseline.signal,
        strategy: baseline.strategy,
        bins,
        abnormal_bins,
        uncovered_bins: uncovered_bins.into_iter().collect(),
        uncovered_samples,
        anomalous,
    }))
}


// src/data_analysis/anomaly_flagger.rs
