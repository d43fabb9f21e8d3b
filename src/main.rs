// src/main.rs

//! Command-line front end of the bridge monitoring pipeline.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use bridge_monitor::data_analysis::anomaly_flagger::AnomalyVerdict;
use bridge_monitor::data_analysis::binned_summary::BinRule;
use bridge_monitor::data_input::derived_io::read_derived_file;
use bridge_monitor::data_input::log_parser::{parse_log_file, session_name};
use bridge_monitor::pipeline::{
    detect_directory, evaluate_directories, load_baseline, load_derived_dir, process_directory, process_session,
    render_set_charts, summarize_set, write_set_summary, BaselinePolicy, BatchReport, FileOutcome,
};
use bridge_monitor::plot_functions::plot_gyro_summary::plot_gyro_summary;
use bridge_monitor::plot_functions::plot_pitch_tilt::plot_pitch_tilt;
use bridge_monitor::plot_functions::plot_session_channels::plot_session_channels;
use bridge_monitor::plot_functions::plot_shock_trim::plot_shock_trim;
use bridge_monitor::plot_functions::ChartKind;
use bridge_monitor::AnalysisConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Trim, clean and position-calibrate every raw log of a directory
    Process {
        input_dir: PathBuf,
        output_dir: PathBuf,
        /// Also render per-session charts
        #[arg(long)]
        plots: bool,
    },
    /// Summarize a directory of processed runs into per-set summary files
    Summarize {
        set_dir: PathBuf,
        output_dir: PathBuf,
        /// Name used in the summary file names (defaults to the directory name)
        #[arg(long)]
        set_name: Option<String>,
        /// Also render set charts
        #[arg(long)]
        plots: bool,
    },
    /// Compare a directory of processed runs against baseline summaries
    Detect {
        #[arg(required = true)]
        baseline: Vec<PathBuf>,
        #[arg(long)]
        candidates: PathBuf,
        #[arg(long, value_enum, default_value = "gyro")]
        channel: Channel,
        /// Band rule for the pitch channel
        #[arg(long, value_enum, default_value = "sigma")]
        band: Band,
        /// Write the verdict as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Score the per-file detector on labelled validation runs
    Evaluate {
        #[arg(required = true)]
        baseline: Vec<PathBuf>,
        #[arg(long)]
        normal: PathBuf,
        #[arg(long)]
        anomalous: PathBuf,
    },
    /// Render one chart from a raw log or a processed file
    Plot {
        csv: PathBuf,
        /// session-channels, shock-trim, gyro-summary or pitch-tilt
        kind: ChartKind,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Channel {
    Gyro,
    Pitch,
    Tilt,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Band {
    /// mean ± k·σ across reference sets
    Sigma,
    /// mean_pitch ± mean_tilt·scale
    Tilt,
}

fn baseline_policy(channel: Channel, band: Band) -> BaselinePolicy {
    match (channel, band) {
        (Channel::Gyro, _) => BaselinePolicy::GyroUpperBound,
        (Channel::Pitch, Band::Sigma) => BaselinePolicy::PitchSigmaBand,
        (Channel::Pitch, Band::Tilt) => BaselinePolicy::PitchTiltBand,
        (Channel::Tilt, _) => BaselinePolicy::TiltSigmaBand,
    }
}

/// Prints the (succeeded, skipped, failed) line of a batch, listing every file that did not load.
fn print_batch_counts(label: &str, report: &BatchReport) {
    for file in &report.files {
        match &file.outcome {
            FileOutcome::Succeeded { .. } => {}
            FileOutcome::Skipped { reason } => println!("  {}: skipped ({reason})", file.path.display()),
            FileOutcome::Failed { reason } => println!("  {}: FAILED ({reason})", file.path.display()),
        }
    }
    println!(
        "{label}: {} succeeded, {} skipped, {} failed",
        report.succeeded, report.skipped, report.failed
    );
    if report.failed > 0 {
        warn!("{label}: {} files failed", report.failed);
    }
}

fn run_process(input_dir: &Path, output_dir: &Path, config: &AnalysisConfig, plots: bool) -> Result<()> {
    let report = process_directory(input_dir, output_dir, config, plots)
        .with_context(|| format!("processing {}", input_dir.display()))?;

    println!("\n--- Batch Summary ---");
    for file in &report.files {
        if let FileOutcome::Succeeded { output } = &file.outcome {
            println!("  {}: ok -> {}", file.path.display(), output.display());
        }
    }
    print_batch_counts("processed", &report);
    Ok(())
}

fn run_summarize(
    set_dir: &Path,
    output_dir: &Path,
    set_name: Option<String>,
    config: &AnalysisConfig,
    plots: bool,
) -> Result<()> {
    let set_name = set_name.unwrap_or_else(|| session_name(set_dir));
    let (series, report) = load_derived_dir(set_dir)?;
    if series.is_empty() {
        bail!(
            "no processed runs found in {} ({} files skipped, {} failed)",
            set_dir.display(),
            report.skipped,
            report.failed
        );
    }

    let summary = summarize_set(&series, config, config.binning.reference_iqr_multiplier)?;
    let (gyro_path, pitch_tilt_path) = write_set_summary(&summary, output_dir, &set_name)?;

    println!("\n--- {} : gyro summary ({} runs) ---", set_name, series.len());
    println!("{:>12} {:>12} {:>12}", "range (m)", "mean", "upper");
    for range in &summary.gyro_display.ranges {
        println!(
            "{:>5.2}~{:<6.2} {:>12.4} {:>12.4}",
            range.range_start, range.range_end, range.mean, range.upper_bound
        );
    }
    println!(
        "{:>12} {:>12.4} {:>12.4}",
        "overall", summary.gyro_display.overall_mean, summary.gyro_display.overall_upper_bound
    );
    println!("Summaries: {}, {}", gyro_path.display(), pitch_tilt_path.display());

    if plots {
        render_set_charts(&set_name, &series, &summary, output_dir, config)?;
    }
    Ok(())
}

fn run_detect(
    baseline_paths: &[PathBuf],
    candidates: &Path,
    policy: BaselinePolicy,
    json: Option<&Path>,
    config: &AnalysisConfig,
) -> Result<()> {
    let baseline = load_baseline(baseline_paths, policy, config, BinRule::Nearest).context("loading baseline")?;
    let (verdict, batch) = detect_directory(candidates, &baseline, config)?;
    print_batch_counts("candidates", &batch);

    match &verdict {
        AnomalyVerdict::InsufficientData { required, provided } => {
            println!("Insufficient data: {provided} candidate files, at least {required} required");
        }
        AnomalyVerdict::Assessed(report) => {
            println!("\n--- {} anomaly check ---", report.signal);
            for bin in &report.bins {
                println!(
                    "  {:>5.2}~{:<5.2} m: {}/{} files ({:.1}%){}",
                    bin.range_start,
                    bin.range_end,
                    bin.exceeding_files,
                    bin.total_files,
                    bin.percent,
                    if bin.abnormal { "  ABNORMAL" } else { "" }
                );
            }
            if report.uncovered_samples > 0 {
                println!(
                    "  {} samples outside the baseline (coarse bins {:?})",
                    report.uncovered_samples, report.uncovered_bins
                );
            }
            println!("Result: {}", if report.anomalous { "ANOMALOUS" } else { "normal" });
        }
    }

    if let Some(path) = json {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &verdict)?;
        info!("Verdict written to {}", path.display());
    }
    Ok(())
}

fn run_evaluate(baseline_paths: &[PathBuf], normal: &Path, anomalous: &Path, config: &AnalysisConfig) -> Result<()> {
    let baseline = load_baseline(baseline_paths, BaselinePolicy::GyroUpperBound, config, BinRule::Floor)
        .context("loading baseline")?;
    let evaluation = evaluate_directories(&baseline, normal, anomalous, config)?;
    print_batch_counts("normal", &evaluation.normal_batch);
    print_batch_counts("anomal", &evaluation.anomalous_batch);
    let report = &evaluation.report;

    println!("\n{}", report.matrix);
    for (label, detections) in [("normal", &report.normal), ("anomal", &report.anomalous)] {
        println!("\n== {label} ==");
        for d in detections {
            println!("{}: anomalous bins = {}, detected = {}", d.name, d.anomalous_bins, d.detected);
        }
    }
    println!("\nnormal files: {}", report.normal.len());
    println!("anomal files: {}", report.anomalous.len());
    Ok(())
}

fn run_plot(csv: &Path, kind: ChartKind, out: Option<PathBuf>, config: &AnalysisConfig) -> Result<()> {
    let parent = csv.parent().unwrap_or_else(|| Path::new("."));

    let drawn = if kind.needs_raw_session() {
        let session = parse_log_file(csv, config.input.time_unit)?;
        let out = out.unwrap_or_else(|| kind.output_path(parent, &session.name));
        match kind {
            ChartKind::SessionChannels => plot_session_channels(&session, &out, &config.plot)?,
            _ => {
                let outcome = process_session(&session, config)?;
                plot_shock_trim(&session, &outcome.segment.trim, config.shock_trim.threshold, &out, &config.plot)?
            }
        }
    } else {
        let series = vec![read_derived_file(csv)?];
        let name = series[0].name.clone();
        let out = out.unwrap_or_else(|| kind.output_path(parent, &name));
        let summary = summarize_set(&series, config, config.binning.gyro_iqr_multiplier)?;
        match kind {
            ChartKind::GyroSummary => plot_gyro_summary(&name, &series, &summary.gyro, &out, &config.plot)?,
            _ => plot_pitch_tilt(&name, &series, &summary.pitch, &summary.tilt, &[], &out, &config.plot)?,
        }
    };

    if !drawn {
        warn!("Chart for {} has no data panels", csv.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            AnalysisConfig::from_file(path).with_context(|| format!("loading config {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };

    match args.command {
        Command::Process {
            input_dir,
            output_dir,
            plots,
        } => run_process(&input_dir, &output_dir, &config, plots),
        Command::Summarize {
            set_dir,
            output_dir,
            set_name,
            plots,
        } => run_summarize(&set_dir, &output_dir, set_name, &config, plots),
        Command::Detect {
            baseline,
            candidates,
            channel,
            band,
            json,
        } => run_detect(&baseline, &candidates, baseline_policy(channel, band), json.as_deref(), &config),
        Command::Evaluate {
            baseline,
            normal,
            anomalous,
        } => run_evaluate(&baseline, &normal, &anomalous, &config),
        Command::Plot { csv, kind, out } => run_plot(&csv, kind, out, &config),
    }?;

    info!("Done");
    Ok(())
}

// src/main.rs
