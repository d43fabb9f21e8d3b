// tests/pipeline_scenarios.rs

use approx::assert_abs_diff_eq;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use bridge_monitor::config::TimeUnit;
use bridge_monitor::data_analysis::anomaly_flagger::{flag_anomalies, AnomalyVerdict, Baseline};
use bridge_monitor::data_analysis::binned_summary::{summarize_signal, BinRule};
use bridge_monitor::data_analysis::derived_series::{DerivedRow, DerivedSeries};
use bridge_monitor::data_input::derived_io::{read_derived, write_derived};
use bridge_monitor::data_input::log_parser::parse_log_reader;
use bridge_monitor::pipeline::{
    detect_directory, evaluate, evaluate_directories, load_baseline, load_derived_dir, process_directory,
    process_session, summarize_set, write_set_summary, BaselinePolicy, FileOutcome,
};
use bridge_monitor::types::Signal;
use bridge_monitor::{AnalysisConfig, Error};

const HEADER: &str = "time,accel_x,accel_y,accel_z,gyro_x,gyro_y,gyro_z,pitch,roll";

/// 3 s drive at 100 Hz with entry/exit bumps in the first and last 0.3 s.
fn raw_drive(accel_amplitude: f64) -> String {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for i in 0..300 {
        let t = i as f64 * 0.01;
        let bump = if i < 30 || i >= 270 { 1.0 } else { 0.02 };
        let accel = accel_amplitude * (t * 2.0).sin();
        writeln!(
            csv,
            "{t:.2},0.0,{accel},9.8,{bump},0.0,0.0,{:.4},{:.4}",
            0.01 * i as f64,
            0.005 * i as f64
        )
        .unwrap();
    }
    csv
}

/// Empties one cell of a CSV body; `row` counts data rows after the header.
fn blank_cell(csv: &str, row: usize, column: usize) -> String {
    let mut out = String::new();
    for (i, line) in csv.lines().enumerate() {
        if i == row + 1 {
            let mut cells: Vec<&str> = line.split(',').collect();
            cells[column] = "";
            out.push_str(&cells.join(","));
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("bridge_monitor_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn row(position: f64, gyro: f64) -> DerivedRow {
    DerivedRow {
        time: 0.0,
        accel_y: 0.0,
        gyro_x: gyro,
        gyro_y: 0.0,
        gyro_z: 0.0,
        pitch: 0.0,
        roll: 0.0,
        position,
        gyro,
        cumulative_pitch: 0.0,
        cumulative_roll: 0.0,
        tilt: 0.0,
    }
}

fn series(name: &str, samples: &[(f64, f64)]) -> DerivedSeries {
    DerivedSeries {
        name: name.to_string(),
        rows: samples.iter().map(|&(p, g)| row(p, g)).collect(),
    }
}

#[test]
fn test_raw_log_to_calibrated_series() {
    let config = AnalysisConfig::default();
    let session = parse_log_reader(raw_drive(0.4).as_bytes(), "drive_1", TimeUnit::Seconds).unwrap();
    let outcome = process_session(&session, &config).unwrap();

    let trim = &outcome.segment.trim;
    assert!(!trim.fallback);
    assert_eq!(trim.shock_regions.len(), 2);
    assert!(trim.kept.0 >= 30, "kept starts inside the entry bump: {:?}", trim.kept);
    assert!(trim.kept.1 <= 270, "kept ends inside the exit bump: {:?}", trim.kept);

    let positions = outcome.series.positions();
    assert_eq!(positions.len(), trim.kept.1 - trim.kept.0);
    assert_eq!(positions[0], 0.0);
    assert_abs_diff_eq!(*positions.last().unwrap(), 2.5, epsilon = 1e-9);
    // Cumulative pitch restarts at the beginning of the kept segment
    assert_eq!(outcome.series.rows[0].cumulative_pitch, 0.0);
    assert!(outcome.series.rows.iter().all(|r| r.gyro < 0.3));
}

#[test]
fn test_empty_gyro_cell_mid_drive_keeps_both_bumps() {
    let config = AnalysisConfig::default();
    // gyro_z of row 150 is left empty
    let csv = blank_cell(&raw_drive(0.4), 150, 6);
    let session = parse_log_reader(csv.as_bytes(), "drive_gap", TimeUnit::Seconds).unwrap();
    assert!(session.samples[150].gyro[2].is_nan());

    let outcome = process_session(&session, &config).unwrap();
    let trim = &outcome.segment.trim;
    assert!(!trim.fallback);
    assert_eq!(trim.shock_regions.len(), 2);
    assert!(trim.kept.0 >= 30 && trim.kept.1 <= 270, "kept {:?}", trim.kept);
    assert!(trim.smoothed_magnitude.iter().all(|v| v.is_finite()));

    let positions = outcome.series.positions();
    assert_abs_diff_eq!(*positions.last().unwrap(), 2.5, epsilon = 1e-9);
    assert!(outcome.series.rows.iter().all(|r| r.gyro.is_finite() && r.gyro < 0.3));
}

#[test]
fn test_processed_series_survives_csv_storage() {
    let config = AnalysisConfig::default();
    let session = parse_log_reader(raw_drive(0.4).as_bytes(), "drive_2", TimeUnit::Seconds).unwrap();
    let series = process_session(&session, &config).unwrap().series;

    let mut buffer = Vec::new();
    write_derived(&mut buffer, &series).unwrap();
    let header = String::from_utf8_lossy(&buffer).lines().next().unwrap().to_string();
    assert!(header.contains("position") && header.contains("cumulative_pitch") && header.contains("tilt"));

    let restored = read_derived(buffer.as_slice(), "drive_2").unwrap();
    assert_eq!(restored.len(), series.len());
    for (a, b) in restored.rows.iter().zip(&series.rows) {
        assert_abs_diff_eq!(a.position, b.position, epsilon = 1e-12);
        assert_abs_diff_eq!(a.tilt, b.tilt, epsilon = 1e-12);
    }
}

#[test]
fn test_all_zero_acceleration_cannot_calibrate() {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for i in 0..100 {
        writeln!(csv, "{:.2},0,0,9.8,0.01,0,0,0,0", i as f64 * 0.01).unwrap();
    }
    let session = parse_log_reader(csv.as_bytes(), "parked", TimeUnit::Seconds).unwrap();
    match process_session(&session, &AnalysisConfig::default()) {
        Err(Error::CannotCalibrate { reason }) => assert!(reason.contains("parked")),
        other => panic!("expected CannotCalibrate, got {:?}", other.map(|o| o.series.len())),
    }
}

#[test]
fn test_two_session_gyro_summary() {
    let runs = vec![
        series("a", &[(0.0, 0.1), (0.5, 0.2), (1.0, 0.9)]),
        series("b", &[(0.0, 0.1), (0.5, 0.3), (1.0, 0.5)]),
    ];
    let table = summarize_signal(&runs, Signal::Gyro, 0.5, 1.5).unwrap();
    assert_eq!(table.len(), 3);

    let last = table.lookup(1.0).unwrap();
    assert_eq!(last.count, 2);
    assert_abs_diff_eq!(last.mean, 0.7, epsilon = 1e-12);
    // Linear-interpolated quartiles of [0.5, 0.9]
    assert_abs_diff_eq!(last.q1, 0.6, epsilon = 1e-12);
    assert_abs_diff_eq!(last.q3, 0.8, epsilon = 1e-12);
    assert_abs_diff_eq!(last.upper_bound, 1.1, epsilon = 1e-12);

    // A single sample collapses the quartiles onto the value itself
    let single = summarize_signal(&runs[..1], Signal::Gyro, 0.5, 1.5).unwrap();
    let bin = single.lookup(1.0).unwrap();
    assert_eq!((bin.q1, bin.q3, bin.upper_bound, bin.std), (0.9, 0.9, 0.9, 0.0));
}

#[test]
fn test_six_of_nine_files_flag_bin() {
    let baseline = Baseline::from_upper_bounds(Signal::Gyro, &[(0.0, 1.0)], 0.2, BinRule::Floor).unwrap();
    let candidates: Vec<DerivedSeries> = (0..9)
        .map(|i| {
            let peak = if i < 6 { 1.4 } else { 0.6 };
            series(&format!("run_{i}"), &[(0.02, 0.3), (0.1, peak), (0.18, 0.4)])
        })
        .collect();

    let config = AnalysisConfig::default();
    let verdict = flag_anomalies(&candidates, &baseline, &config.detection).unwrap();
    let AnomalyVerdict::Assessed(report) = verdict else {
        panic!("expected an assessed verdict");
    };
    assert!(report.anomalous);
    assert_eq!(report.abnormal_bins, vec![0]);
    let bin = &report.bins[0];
    assert_eq!((bin.range_start, bin.range_end), (0.0, 0.2));
    assert_eq!((bin.exceeding_files, bin.total_files), (6, 9));
    assert_abs_diff_eq!(bin.percent, 66.666_666_666, epsilon = 1e-6);
}

#[test]
fn test_evaluation_separates_labelled_runs() {
    let config = AnalysisConfig::default();
    let baseline = Baseline::from_upper_bounds(
        Signal::Gyro,
        &[(0.0, 1.0), (0.1, 1.0), (0.2, 1.0), (0.3, 1.0), (0.4, 1.0), (0.5, 1.0)],
        0.1,
        BinRule::Floor,
    )
    .unwrap();

    let grid: Vec<f64> = (0..60).map(|i| i as f64 * 0.01).collect();
    let quiet = |name: &str| series(name, &grid.iter().map(|&p| (p, 0.5)).collect::<Vec<_>>());
    let rough = |name: &str| {
        let samples: Vec<(f64, f64)> = grid
            .iter()
            .map(|&p| (p, if p >= 0.3 { 2.0 } else { 0.5 }))
            .collect();
        series(name, &samples)
    };

    let normal = vec![quiet("n1"), quiet("n2"), rough("n3")];
    let anomalous = vec![rough("a1"), quiet("a2")];
    let report = evaluate(&baseline, &normal, &anomalous, &config).unwrap();

    assert_eq!(report.matrix.true_negative, 2);
    assert_eq!(report.matrix.false_positive, 1);
    assert_eq!(report.matrix.true_positive, 1);
    assert_eq!(report.matrix.false_negative, 1);
    assert_abs_diff_eq!(report.matrix.accuracy(), 0.6, epsilon = 1e-12);
    assert!(report.anomalous[0].detected);
    assert!(!report.normal[0].detected);
}

#[test]
fn test_directory_batch_end_to_end() {
    let input = scratch_dir("batch_in");
    let processed = scratch_dir("batch_out");
    let summaries = scratch_dir("batch_summary");

    fs::write(input.join("run_a.csv"), raw_drive(0.4)).unwrap();
    fs::write(input.join("run_b.csv"), raw_drive(0.6)).unwrap();
    fs::write(input.join("broken.csv"), "time,accel_y,gyro_x\n0,1,2\n").unwrap();
    fs::write(input.join("notes.txt"), "not a log").unwrap();

    let config = AnalysisConfig::default();
    let report = process_directory(&input, &processed, &config, false).unwrap();
    assert_eq!((report.succeeded, report.skipped, report.failed), (2, 1, 0));
    assert!(report
        .files
        .iter()
        .any(|f| matches!(&f.outcome, FileOutcome::Skipped { reason } if reason.contains("gyro_y"))));
    assert!(processed.join("run_a_add.csv").exists());

    let (series, loaded) = load_derived_dir(&processed).unwrap();
    assert_eq!(loaded.succeeded, 2);
    assert_eq!(series[0].name, "run_a");

    let summary = summarize_set(&series, &config, config.binning.reference_iqr_multiplier).unwrap();
    assert!(!summary.gyro.is_empty());
    assert!(!summary.gyro_display.ranges.is_empty());
    let (gyro_path, pitch_tilt_path) = write_set_summary(&summary, &summaries, "set1").unwrap();
    assert!(gyro_path.ends_with("summary_gyro_set1.csv"));
    assert!(pitch_tilt_path.exists());

    let baseline = load_baseline(&[gyro_path], BaselinePolicy::GyroUpperBound, &config, BinRule::Nearest).unwrap();
    assert_eq!(baseline.envelopes.len(), summary.gyro.len());

    // A candidate without the derived columns is skipped and counted
    fs::write(processed.join("partial_add.csv"), "time,position\n0,0\n").unwrap();

    // Two candidates are fewer than the nine the detector asks for
    let (verdict, batch) = detect_directory(&processed, &baseline, &config).unwrap();
    assert_eq!(
        verdict,
        AnomalyVerdict::InsufficientData {
            required: 9,
            provided: 2
        }
    );
    assert_eq!((batch.succeeded, batch.skipped, batch.failed), (2, 1, 0));
    assert!(batch.files.iter().any(|f| f.path.ends_with("partial_add.csv")
        && matches!(f.outcome, FileOutcome::Skipped { .. })));

    let evaluation = evaluate_directories(&baseline, &processed, &summaries, &config).unwrap();
    assert_eq!(evaluation.normal_batch.skipped, 1);
    assert_eq!(evaluation.report.normal.len(), 2);
    // summary files are not candidate runs
    assert_eq!(evaluation.anomalous_batch.total(), 0);
    assert!(evaluation.report.anomalous.is_empty());

    let pitch = load_baseline(&[pitch_tilt_path], BaselinePolicy::PitchTiltBand, &config, BinRule::Nearest).unwrap();
    assert_eq!(pitch.signal, Signal::CumulativePitch);
    assert!(!pitch.is_empty());

    for dir in [input, processed, summaries] {
        let _ = fs::remove_dir_all(dir);
    }
}

// tests/pipeline_scenarios.rs
