// src/pipeline.rs
// Stage composition and directory-level batch processing.

use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::AnalysisConfig;
use crate::data_analysis::anomaly_flagger::{self, AnomalyVerdict, Baseline};
use crate::data_analysis::binned_summary::{summarize_signal, BinRule, BinSummaryTable, DisplaySummary};
use crate::data_analysis::derived_series::DerivedSeries;
use crate::data_analysis::evaluation::{detect_session, ConfusionMatrix, SessionDetection};
use crate::data_analysis::outlier_cleaner::{clean_session, CleaningReport};
use crate::data_analysis::position_estimator::estimate_positions;
use crate::data_analysis::shock_trim::{trim_shocks, StableSegment};
use crate::data_input::derived_io::{read_derived_file, write_derived_file, DERIVED_FILE_SUFFIX};
use crate::data_input::log_data::SensorSession;
use crate::data_input::log_parser::{parse_log_file, session_name};
use crate::data_input::summary_io::{
    gyro_rows, pitch_tilt_rows, read_gyro_summary, read_pitch_tilt_summary, write_gyro_summary,
    write_pitch_tilt_summary, SummaryKind,
};
use crate::plot_functions::plot_gyro_summary::plot_gyro_summary;
use crate::plot_functions::plot_pitch_tilt::plot_pitch_tilt;
use crate::plot_functions::plot_session_channels::plot_session_channels;
use crate::plot_functions::plot_shock_trim::plot_shock_trim;
use crate::plot_functions::ChartKind;
use crate::types::Signal;
use crate::{Error, Result};

pub use anomaly_flagger::flag_anomalies;

/// Everything produced from one raw session.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    /// Trimmed and cleaned samples with the trim diagnostics
    pub segment: StableSegment,
    pub cleaning: CleaningReport,
    pub series: DerivedSeries,
}

/// Cuts shock transients, then removes outliers and fills gaps in what is left.
pub fn trim_and_clean(session: &SensorSession, config: &AnalysisConfig) -> (StableSegment, CleaningReport) {
    let mut segment = trim_shocks(session, &config.shock_trim);
    let (cleaned, report) = clean_session(&segment.session, &config.cleaning);
    segment.session = cleaned;
    (segment, report)
}

/// Calibrated positions and derived signals of a stable segment.
pub fn estimate_position(segment: &StableSegment, track_length: f64) -> Result<DerivedSeries> {
    let session = &segment.session;
    let times = session.times();
    let accel: Vec<f64> = session.samples.iter().map(|s| s.forward_accel()).collect();
    let positions = estimate_positions(&times, &accel, track_length).map_err(|e| match e {
        Error::CannotCalibrate { reason } => Error::CannotCalibrate {
            reason: format!("{}: {}", session.name, reason),
        },
        other => other,
    })?;
    Ok(DerivedSeries::from_session(session, &positions))
}

/// Binned statistics of one signal over several processed sessions.
pub fn summarize(series: &[DerivedSeries], signal: Signal, bin_width: f64, iqr_multiplier: f64) -> Result<BinSummaryTable> {
    summarize_signal(series, signal, bin_width, iqr_multiplier)
}

pub fn process_session(session: &SensorSession, config: &AnalysisConfig) -> Result<SessionOutcome> {
    let (segment, cleaning) = trim_and_clean(session, config);
    let series = estimate_position(&segment, config.position.track_length_m)?;
    info!(
        "{}: {} samples kept, {} outliers removed, {} gaps filled",
        session.name,
        series.len(),
        cleaning.total_outliers(),
        cleaning.gaps_filled
    );
    Ok(SessionOutcome {
        segment,
        cleaning,
        series,
    })
}

/// How one file of a batch ended.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Succeeded { output: PathBuf },
    Skipped { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Per-file outcomes of a directory run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn record(&mut self, path: &Path, outcome: FileOutcome) {
        match &outcome {
            FileOutcome::Succeeded { .. } => self.succeeded += 1,
            FileOutcome::Skipped { reason } => {
                warn!("Skipping {}: {}", path.display(), reason);
                self.skipped += 1;
            }
            FileOutcome::Failed { reason } => {
                error!("Failed to process {}: {}", path.display(), reason);
                self.failed += 1;
            }
        }
        self.files.push(FileReport {
            path: path.to_path_buf(),
            outcome,
        });
    }

    /// Files with missing columns or no data are skipped; everything else is a failure.
    pub fn record_error(&mut self, path: &Path, err: &Error) {
        let reason = err.to_string();
        if err.is_skippable() {
            self.record(path, FileOutcome::Skipped { reason });
        } else {
            self.record(path, FileOutcome::Failed { reason });
        }
    }

    pub fn total(&self) -> usize {
        self.files.len()
    }
}

fn is_summary_file(path: &Path) -> bool {
    SummaryKind::from_path(path).is_some()
}

fn is_derived_file(path: &Path) -> bool {
    session_name(path).ends_with(DERIVED_FILE_SUFFIX)
}

/// `*.csv` files directly inside `dir`, sorted by name.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn render_session_charts(
    session: &SensorSession,
    outcome: &SessionOutcome,
    output_dir: &Path,
    config: &AnalysisConfig,
) -> Result<()> {
    plot_session_channels(
        session,
        &ChartKind::SessionChannels.output_path(output_dir, &session.name),
        &config.plot,
    )?;
    plot_shock_trim(
        session,
        &outcome.segment.trim,
        config.shock_trim.threshold,
        &ChartKind::ShockTrim.output_path(output_dir, &session.name),
        &config.plot,
    )?;
    Ok(())
}

/// Processes one raw log and writes its `_add` artifact.
pub fn process_file(path: &Path, output_dir: &Path, config: &AnalysisConfig, plots: bool) -> Result<PathBuf> {
    let session = parse_log_file(path, config.input.time_unit)?;
    let outcome = process_session(&session, config)?;
    let output = write_derived_file(output_dir, &outcome.series)?;
    if plots {
        if let Err(e) = render_session_charts(&session, &outcome, output_dir, config) {
            warn!("{}: charts not rendered: {}", session.name, e);
        }
    }
    Ok(output)
}

/// Processes every raw `*.csv` log in `input_dir` independently.
/// A bad file is recorded in the report and never aborts the batch.
pub fn process_directory(input_dir: &Path, output_dir: &Path, config: &AnalysisConfig, plots: bool) -> Result<BatchReport> {
    fs::create_dir_all(output_dir)?;
    let mut report = BatchReport::default();

    for path in list_csv_files(input_dir)? {
        if is_summary_file(&path) || is_derived_file(&path) {
            debug!("Ignoring processed file {}", path.display());
            continue;
        }
        info!("--- Processing file: {} ---", path.display());
        match process_file(&path, output_dir, config, plots) {
            Ok(output) => report.record(&path, FileOutcome::Succeeded { output }),
            Err(e) => report.record_error(&path, &e),
        }
    }

    info!(
        "Processed {} files: {} succeeded, {} skipped, {} failed",
        report.total(),
        report.succeeded,
        report.skipped,
        report.failed
    );
    Ok(report)
}

/// Reads every processed (`_add` layout) CSV of a directory.
/// Summary files are ignored; unreadable files are recorded in the report.
pub fn load_derived_dir(dir: &Path) -> Result<(Vec<DerivedSeries>, BatchReport)> {
    let mut series = Vec::new();
    let mut report = BatchReport::default();
    for path in list_csv_files(dir)? {
        if is_summary_file(&path) {
            continue;
        }
        match read_derived_file(&path) {
            Ok(s) => {
                report.record(&path, FileOutcome::Succeeded { output: path.clone() });
                series.push(s);
            }
            Err(e) => report.record_error(&path, &e),
        }
    }
    info!("Loaded {} processed sessions from {}", series.len(), dir.display());
    Ok((series, report))
}

/// Reference statistics of one set of runs.
#[derive(Debug, Clone)]
pub struct SetSummary {
    pub gyro: BinSummaryTable,
    pub pitch: BinSummaryTable,
    pub tilt: BinSummaryTable,
    pub gyro_display: DisplaySummary,
}

/// Summarizes a set of processed runs within the configured position clip.
pub fn summarize_set(series: &[DerivedSeries], config: &AnalysisConfig, iqr_multiplier: f64) -> Result<SetSummary> {
    let bins = &config.binning;
    let clipped: Vec<DerivedSeries> = series
        .iter()
        .map(|s| s.clipped(bins.clip_min, bins.clip_max))
        .collect();

    let gyro = summarize(&clipped, Signal::Gyro, bins.gyro_bin_width, iqr_multiplier)?;
    let pitch = summarize(&clipped, Signal::CumulativePitch, bins.pitch_tilt_bin_width, iqr_multiplier)?;
    let tilt = summarize(&clipped, Signal::Tilt, bins.pitch_tilt_bin_width, iqr_multiplier)?;
    let gyro_display = gyro.display_ranges(bins.display_range_width)?;
    Ok(SetSummary {
        gyro,
        pitch,
        tilt,
        gyro_display,
    })
}

/// Writes `summary_gyro_<set>.csv` and `summary_pitch_tilt_<set>.csv`.
pub fn write_set_summary(summary: &SetSummary, output_dir: &Path, set_name: &str) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(output_dir)?;
    let gyro_path = SummaryKind::Gyro.file_path(output_dir, set_name);
    write_gyro_summary(fs::File::create(&gyro_path)?, &gyro_rows(&summary.gyro))?;
    let pitch_tilt_path = SummaryKind::PitchTilt.file_path(output_dir, set_name);
    write_pitch_tilt_summary(
        fs::File::create(&pitch_tilt_path)?,
        &pitch_tilt_rows(&summary.pitch, &summary.tilt),
    )?;
    info!(
        "Wrote {} and {}",
        gyro_path.display(),
        pitch_tilt_path.display()
    );
    Ok((gyro_path, pitch_tilt_path))
}

/// Renders the set-level charts next to the summary files.
pub fn render_set_charts(
    set_name: &str,
    series: &[DerivedSeries],
    summary: &SetSummary,
    output_dir: &Path,
    config: &AnalysisConfig,
) -> Result<()> {
    plot_gyro_summary(
        set_name,
        series,
        &summary.gyro,
        &ChartKind::GyroSummary.output_path(output_dir, set_name),
        &config.plot,
    )?;
    plot_pitch_tilt(
        set_name,
        series,
        &summary.pitch,
        &summary.tilt,
        &[],
        &ChartKind::PitchTilt.output_path(output_dir, set_name),
        &config.plot,
    )?;
    Ok(())
}

/// Which stored summaries a baseline is built from, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselinePolicy {
    /// Gyro summaries, value above the stored upper bound
    GyroUpperBound,
    /// Pitch/tilt summaries, cumulative pitch outside mean ± k·σ
    PitchSigmaBand,
    /// Pitch/tilt summaries, cumulative pitch outside mean_pitch ± mean_tilt·scale
    PitchTiltBand,
    /// Pitch/tilt summaries, tilt outside mean ± k·σ
    TiltSigmaBand,
}

impl BaselinePolicy {
    pub fn signal(self) -> Signal {
        match self {
            BaselinePolicy::GyroUpperBound => Signal::Gyro,
            BaselinePolicy::PitchSigmaBand | BaselinePolicy::PitchTiltBand => Signal::CumulativePitch,
            BaselinePolicy::TiltSigmaBand => Signal::Tilt,
        }
    }
}

fn open_summary(path: &Path) -> Result<(fs::File, String)> {
    Ok((fs::File::open(path)?, path.display().to_string()))
}

/// Builds a baseline from stored summary files.
pub fn load_baseline(paths: &[PathBuf], policy: BaselinePolicy, config: &AnalysisConfig, rule: BinRule) -> Result<Baseline> {
    if paths.is_empty() {
        return Err(Error::InvalidConfig("no baseline summary files given".to_string()));
    }
    let bins = &config.binning;
    let det = &config.detection;

    let baseline = match policy {
        BaselinePolicy::GyroUpperBound => {
            let mut points = Vec::new();
            for path in paths {
                let (file, name) = open_summary(path)?;
                points.extend(
                    read_gyro_summary(file, &name)?
                        .into_iter()
                        .map(|r| (r.position_bin_gyro, r.upper_bound_gyro)),
                );
            }
            Baseline::from_upper_bounds(Signal::Gyro, &points, bins.gyro_bin_width, rule)?
        }
        BaselinePolicy::PitchTiltBand => {
            let mut rows = Vec::new();
            for path in paths {
                let (file, name) = open_summary(path)?;
                rows.extend(
                    read_pitch_tilt_summary(file, &name)?
                        .into_iter()
                        .map(|r| (r.position_bin_pitch_tilt, r.mean_pitch, r.mean_tilt)),
                );
            }
            Baseline::mean_tilt_band(&rows, bins.pitch_tilt_bin_width, rule, det.tilt_band_scale)?
        }
        BaselinePolicy::PitchSigmaBand | BaselinePolicy::TiltSigmaBand => {
            let tilt = policy == BaselinePolicy::TiltSigmaBand;
            let mut sets = Vec::new();
            for path in paths {
                let (file, name) = open_summary(path)?;
                sets.push(
                    read_pitch_tilt_summary(file, &name)?
                        .into_iter()
                        .map(|r| (r.position_bin_pitch_tilt, if tilt { r.mean_tilt } else { r.mean_pitch }))
                        .collect::<Vec<_>>(),
                );
            }
            Baseline::mean_std_band(policy.signal(), &sets, bins.pitch_tilt_bin_width, rule, det.band_sigma)?
        }
    };

    if baseline.is_empty() {
        warn!("Baseline built from {} files has no bins", paths.len());
    } else {
        info!(
            "Loaded {} baseline with {} bins from {} files",
            baseline.signal,
            baseline.envelopes.len(),
            paths.len()
        );
    }
    Ok(baseline)
}

/// Compares a directory of processed candidate runs against a baseline.
/// The batch report lists the candidate files that were skipped or failed to load.
pub fn detect_directory(
    candidate_dir: &Path,
    baseline: &Baseline,
    config: &AnalysisConfig,
) -> Result<(AnomalyVerdict, BatchReport)> {
    let (candidates, batch) = load_derived_dir(candidate_dir)?;
    let verdict = flag_anomalies(&candidates, baseline, &config.detection)?;
    Ok((verdict, batch))
}

/// Per-file detections of labelled validation runs and the resulting confusion matrix.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub normal: Vec<SessionDetection>,
    pub anomalous: Vec<SessionDetection>,
    pub matrix: ConfusionMatrix,
}

pub fn evaluate(
    baseline: &Baseline,
    normal: &[DerivedSeries],
    anomalous: &[DerivedSeries],
    config: &AnalysisConfig,
) -> Result<EvaluationReport> {
    let det = &config.detection;
    let detect_all = |series: &[DerivedSeries]| -> Result<Vec<SessionDetection>> {
        series
            .iter()
            .map(|s| detect_session(s, baseline, det.session_bin_width, det.session_ratio_threshold))
            .collect()
    };
    let normal = detect_all(normal)?;
    let anomalous = detect_all(anomalous)?;
    let matrix = ConfusionMatrix::from_pairs(
        normal
            .iter()
            .map(|d| (false, d.detected))
            .chain(anomalous.iter().map(|d| (true, d.detected))),
    );
    Ok(EvaluationReport {
        normal,
        anomalous,
        matrix,
    })
}

/// Evaluation of two labelled directories with the load outcome of each.
#[derive(Debug, Clone)]
pub struct DirectoryEvaluation {
    pub report: EvaluationReport,
    pub normal_batch: BatchReport,
    pub anomalous_batch: BatchReport,
}

pub fn evaluate_directories(
    baseline: &Baseline,
    normal_dir: &Path,
    anomalous_dir: &Path,
    config: &AnalysisConfig,
) -> Result<DirectoryEvaluation> {
    let (normal, normal_batch) = load_derived_dir(normal_dir)?;
    let (anomalous, anomalous_batch) = load_derived_dir(anomalous_dir)?;
    let report = evaluate(baseline, &normal, &anomalous, config)?;
    Ok(DirectoryEvaluation {
        report,
        normal_batch,
        anomalous_batch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_report_counts() {
        let mut report = BatchReport::default();
        report.record(Path::new("a.csv"), FileOutcome::Succeeded { output: PathBuf::from("a_add.csv") });
        report.record_error(
            Path::new("b.csv"),
            &Error::MissingColumn {
                file: "b".to_string(),
                column: "roll".to_string(),
            },
        );
        report.record_error(Path::new("c.csv"), &Error::calibrate("constant acceleration"));
        assert_eq!((report.succeeded, report.skipped, report.failed), (1, 1, 1));
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn test_file_classification() {
        assert!(is_derived_file(Path::new("run_1_add.csv")));
        assert!(!is_derived_file(Path::new("run_1.csv")));
        assert!(is_summary_file(Path::new("summary_gyro_set1.csv")));
    }

    #[test]
    fn test_policy_signals() {
        assert_eq!(BaselinePolicy::GyroUpperBound.signal(), Signal::Gyro);
        assert_eq!(BaselinePolicy::PitchTiltBand.signal(), Signal::CumulativePitch);
        assert_eq!(BaselinePolicy::TiltSigmaBand.signal(), Signal::Tilt);
    }
}

// src/pipeline.rs
