//! mouse-calc - rodent telemetry anomaly scoring
//!
//! Commands:
//! - `analyze`: run the detectors over one sample file
//! - `window`: print the window-aggregated table
//! - `version`: print version information

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use mc_common::error::format_error_human;
use mc_common::{Error, OutputFormat, StructuredError};
use mc_config::{
    AnalysisConfig, CorrelationOptions, DistanceOptions, TemperatureOptions, TimeRange, ValidationError,
};
use mc_core::detect::DetectorKind;
use mc_core::dispatch::{BatchRunner, DEFAULT_MAX_WORKERS};
use mc_core::exit_codes::ExitCode;
use mc_core::log_event;
use mc_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use mc_core::store::ResultStore;
use mc_core::{ingest, window};

/// Rodent telemetry anomaly scoring
#[derive(Parser)]
#[command(name = "mouse-calc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Log level (overrides MC_LOG)
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Log format on stderr (overrides MC_LOG_FORMAT)
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a sample file against its baseline
    Analyze(AnalyzeArgs),
    /// Print the window-aggregated table as JSON
    Window(WindowArgs),
    /// Print version information
    Version,
}

/// Which detectors to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    All,
    Temperature,
    MinTemperature,
    Distance,
    Cor,
}

impl Target {
    fn kinds(self) -> Vec<DetectorKind> {
        match self {
            Target::All => vec![
                DetectorKind::MaxTemperature,
                DetectorKind::Distance,
                DetectorKind::Correlation,
            ],
            Target::Temperature => vec![DetectorKind::MaxTemperature],
            Target::MinTemperature => vec![DetectorKind::MinTemperature],
            Target::Distance => vec![DetectorKind::Distance],
            Target::Cor => vec![DetectorKind::Correlation],
        }
    }
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Header-less sample CSV
    csv: PathBuf,

    /// Baseline days, YYYY/MM/DD-YYYY/MM/DD
    #[arg(long)]
    bg: String,

    /// Target days, YYYY/MM/DD-YYYY/MM/DD
    #[arg(long)]
    tg: String,

    #[arg(long, value_enum, default_value = "all")]
    target: Target,

    /// Time-of-day bucket width in minutes, also the window size in rows
    #[arg(long, default_value_t = 8)]
    step_size: u32,

    #[arg(long, default_value_t = 1.5)]
    thres_sd_heat: f64,

    #[arg(long, default_value_t = 0.5)]
    welch_thres: f64,

    /// In-band windows tolerated before the correlation score resets
    #[arg(long, default_value_t = 1)]
    error_step: u32,

    /// Correlation band half-width in residual standard deviations
    #[arg(long, default_value_t = 1.5)]
    sd_num: f64,

    /// Concurrent detector workers
    #[arg(long, default_value_t = DEFAULT_MAX_WORKERS)]
    workers: usize,
}

#[derive(Args, Debug)]
struct WindowArgs {
    /// Header-less sample CSV
    csv: PathBuf,

    /// Rows per window
    #[arg(long, default_value_t = 8)]
    step_size: u32,
}

fn main() {
    let cli = Cli::parse();

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else if cli.global.verbose > 0 {
        let mut level = cli.global.log_level.unwrap_or_default();
        for _ in 0..cli.global.verbose {
            level = level.louder();
        }
        Some(level)
    } else {
        cli.global.log_level
    };
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let ctx = LogContext::new(generate_run_id());
    let exit_code = ctx.span().in_scope(|| match &cli.command {
        Commands::Analyze(args) => run_analyze(&cli.global, &ctx, args),
        Commands::Window(args) => run_window(&cli.global, &ctx, args),
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    });

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Commands
// ============================================================================

fn run_analyze(global: &GlobalOpts, ctx: &LogContext, args: &AnalyzeArgs) -> ExitCode {
    log_event!(ctx, INFO, event_names::RUN_STARTED, Stage::Init, "analysis started",
        csv = %args.csv.display());

    let config = match build_config(args) {
        Ok(config) => config,
        Err(e) => {
            log_event!(ctx, ERROR, event_names::CONFIG_ERROR, Stage::Init, "invalid options",
                error = %e);
            return report_error(global, &e.into(), ExitCode::ArgsError);
        }
    };

    log_event!(ctx, DEBUG, event_names::CONFIG_LOADED, Stage::Init, "options resolved",
        step_size = args.step_size, target = ?args.target, workers = args.workers);

    let table = match ingest::load_samples(&args.csv) {
        Ok(table) => Arc::new(table),
        Err(e) => return fail(global, ctx, Stage::Ingest, &e),
    };

    let store = ResultStore::new();
    let source_id = match store.register_source(Arc::clone(&table)) {
        Ok(id) => id,
        Err(e) => return fail(global, ctx, Stage::Store, &e),
    };
    let ctx = ctx.clone().with_source_id(source_id.to_string());
    let _span = ctx.span().entered();

    let kinds = args.target.kinds();
    let outcomes = match BatchRunner::new(args.workers).run(&store, &[source_id.clone()], &kinds, &config) {
        Ok(outcomes) => outcomes,
        Err(e) => return fail(global, &ctx, Stage::Detect, &e),
    };
    if let Some(err) = outcomes.iter().find_map(|o| o.result.as_ref().err()) {
        return fail(global, &ctx, Stage::Detect, err);
    }

    let records = match store.records() {
        Ok(records) => records,
        Err(e) => return fail(global, &ctx, Stage::Store, &e),
    };
    let anomalous: usize = records.iter().map(|r| r.series.anomalous_count()).sum();

    match global.format {
        OutputFormat::Json => {
            let payload = serde_json::json!({
                "run_id": ctx.run_id,
                "source_id": source_id,
                "rows": table.len(),
                "results": records,
            });
            match serde_json::to_string_pretty(&payload) {
                Ok(text) => println!("{}", text),
                Err(e) => return fail(global, &ctx, Stage::Report, &Error::Json(e)),
            }
        }
        OutputFormat::Summary => {
            println!("source {} ({} rows)", source_id, table.len());
            for record in &records {
                println!(
                    "{:<16} points={:<6} anomalous={:<6} final={:.4}",
                    record.kind.to_string(),
                    record.series.len(),
                    record.series.anomalous_count(),
                    record.series.last_value().unwrap_or(0.0)
                );
            }
        }
    }

    log_event!(ctx, INFO, event_names::RUN_FINISHED, Stage::Report, "analysis finished",
        results = records.len(), anomalous = anomalous);
    if anomalous > 0 {
        ExitCode::AnomaliesFound
    } else {
        ExitCode::Clean
    }
}

fn run_window(global: &GlobalOpts, ctx: &LogContext, args: &WindowArgs) -> ExitCode {
    let windowed = ingest::load_samples(&args.csv)
        .and_then(|table| window::aggregate(&table, args.step_size as usize));
    let windowed = match windowed {
        Ok(w) => w,
        Err(e) => return fail(global, ctx, Stage::Window, &e),
    };
    match serde_json::to_string_pretty(&windowed) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::Clean
        }
        Err(e) => fail(global, ctx, Stage::Report, &Error::Json(e)),
    }
}

fn print_version(global: &GlobalOpts) {
    match global.format {
        OutputFormat::Json => {
            let info = serde_json::json!({
                "name": "mouse-calc",
                "version": env!("CARGO_PKG_VERSION"),
                "rust_version": env!("CARGO_PKG_RUST_VERSION"),
            });
            println!("{}", info);
        }
        OutputFormat::Summary => println!("mouse-calc {}", env!("CARGO_PKG_VERSION")),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn build_config(args: &AnalyzeArgs) -> Result<AnalysisConfig, ValidationError> {
    let baseline = TimeRange::parse_date_span(&args.bg)?;
    let target = TimeRange::parse_date_span(&args.tg)?;
    let config = AnalysisConfig {
        temperature: TemperatureOptions {
            baseline,
            target,
            step_size: args.step_size,
            thres_sd_heat: args.thres_sd_heat,
        },
        distance: DistanceOptions {
            baseline,
            target,
            step_size: args.step_size,
            welch_thres: args.welch_thres,
        },
        cor: CorrelationOptions {
            baseline,
            target,
            step_size: args.step_size,
            error_step: args.error_step,
            sd_num: args.sd_num,
        },
    };
    config.validate()?;
    Ok(config)
}

fn fail(global: &GlobalOpts, ctx: &LogContext, stage: Stage, err: &Error) -> ExitCode {
    let event = if stage == Stage::Detect {
        event_names::DETECT_FAILED
    } else {
        event_names::INTERNAL_ERROR
    };
    log_event!(ctx, ERROR, event, stage, "run failed", code = err.code(), error = %err);
    report_error(global, err, ExitCode::for_error(err))
}

fn report_error(global: &GlobalOpts, err: &Error, code: ExitCode) -> ExitCode {
    match global.format {
        OutputFormat::Json => {
            let structured = StructuredError::from(err).with_context("exit_code", code.as_i32());
            println!("{}", structured.to_json());
        }
        OutputFormat::Summary => {
            let use_color = !global.no_color && std::io::IsTerminal::is_terminal(&std::io::stderr());
            eprintln!("{}", format_error_human(err, use_color));
        }
    }
    code
}
