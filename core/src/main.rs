use anyhow::{Context, Result};
use clap::{Args, Parser};
use colored::Colorize;
use sayonara_shred::report::WipeReport;
use sayonara_shred::ui::human_bytes;
use sayonara_shred::*;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Exit status after SIGINT, matching shell convention (128 + 2)
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser)]
#[command(name = "sayonara-shred")]
#[command(about = "Overwrite files, folders and disks in place, then remove them")]
#[command(version = "1.0.0")]
struct Cli {
    #[command(flatten)]
    target: TargetArgs,

    #[command(flatten)]
    method: MethodArgs,

    /// Read the target back after the final pass and compare
    #[arg(long)]
    verify: bool,

    /// Delete files under their original names (skip truncate and rename)
    #[arg(long)]
    no_scrub_names: bool,

    /// Bytes per write call and pattern buffer
    #[arg(long, value_name = "BYTES")]
    chunk_size: Option<usize>,

    /// Files wiped concurrently in folder mode (1-64)
    #[arg(long, value_name = "N")]
    max_concurrency: Option<usize>,

    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Disable progress bars
    #[arg(long, short)]
    quiet: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Append logs to a file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct TargetArgs {
    /// Wipe and delete a single file
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Wipe every file under a directory, then remove the tree
    #[arg(long, value_name = "PATH")]
    folder: Option<PathBuf>,

    /// Overwrite a whole block device (or disk image)
    #[arg(long, value_name = "PATH")]
    disk: Option<PathBuf>,
}

impl TargetArgs {
    fn resolve(&self) -> Option<(TargetKind, &Path)> {
        if let Some(path) = &self.file {
            return Some((TargetKind::File, path.as_path()));
        }
        if let Some(path) = &self.folder {
            return Some((TargetKind::Folder, path.as_path()));
        }
        self.disk.as_deref().map(|path| (TargetKind::Disk, path))
    }
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct MethodArgs {
    /// 1 pass: zeros
    #[arg(long)]
    clear: bool,

    /// 3 passes: zeros, ones, random
    #[arg(long)]
    purge: bool,

    /// 7 passes: zeros, ones, zeros, 0xAA, 0x55, 0xAA, random
    #[arg(long = "destroy-sw")]
    destroy_sw: bool,
}

impl MethodArgs {
    fn resolve(&self) -> WipeMethod {
        if self.clear {
            WipeMethod::Clear
        } else if self.purge {
            WipeMethod::Purge
        } else {
            WipeMethod::Destroy
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match init_tracing(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            return ExitCode::from(ErrorClass::Rejected.exit_code());
        }
    };

    if let Err(e) = setup_signal_handlers() {
        warn!(error = %e, "could not install SIGINT handler");
    }

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(ErrorClass::Rejected.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<u8> {
    let (kind, path) = cli
        .target
        .resolve()
        .context("one of --file, --folder or --disk is required")?;
    let method = cli.method.resolve();

    let mut config = EngineConfig::load(cli.config.as_deref()).context("loading configuration")?;
    apply_overrides(&mut config, cli);
    config.validate().context("validating configuration")?;

    if kind == TargetKind::Disk && !is_root() {
        warn!("not running as root; opening the device will likely fail");
    }

    debug!(?config, "effective configuration");

    let orchestrator = WipeOrchestrator::new(config)?;
    let report = orchestrator.execute(kind, path, method);
    orchestrator.shutdown();

    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print_summary(&report);
    }

    Ok(report.exit_code())
}

fn apply_overrides(config: &mut EngineConfig, cli: &Cli) {
    if let Some(chunk_size) = cli.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(max) = cli.max_concurrency {
        config.max_concurrency = max;
    }
    if cli.verify {
        config.verify = true;
    }
    if cli.no_scrub_names {
        config.scrub_names = false;
    }
    if cli.quiet || cli.json {
        config.progress = false;
    }
}

fn print_summary(report: &WipeReport) {
    let elapsed = humantime::format_duration(std::time::Duration::from_millis(
        report.elapsed().as_millis() as u64,
    ));

    if report.is_success() {
        println!(
            "{} {} {} wiped with {} ({} passes, {} overwritten in {})",
            "✔".green().bold(),
            report.kind,
            report.target.display(),
            report.method,
            report.passes,
            human_bytes(report.bytes_overwritten),
            elapsed
        );
        if report.verified {
            println!("  {} final pass verified by read-back", "✔".green());
        }
        if report.kind == TargetKind::Folder {
            println!(
                "  {} files wiped, {} directories removed",
                report.files_wiped, report.directories_removed
            );
        }
        return;
    }

    let headline = match report.error_class() {
        Some(ErrorClass::Partial) => "not fully removed".yellow().bold(),
        _ => "wipe failed".red().bold(),
    };
    println!(
        "{} {} {}: {}",
        "✘".red().bold(),
        report.target.display(),
        headline,
        report
            .error_class()
            .map(|class| class.description())
            .unwrap_or_default()
    );
    if report.kind == TargetKind::Folder {
        println!(
            "  {} files wiped, {} directories removed, {} failures",
            report.files_wiped,
            report.directories_removed,
            report.failures.len()
        );
    }
    for failure in &report.failures {
        println!("  {} [{}] {}", "-".red(), failure.class, failure.message);
    }
}

fn init_tracing(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let default_level = if cli.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (writer, guard) = match &cli.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false);

    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(guard)
}

fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

// SIGINT: a pass may have been cut short, so nothing about the target is known
fn setup_signal_handlers() -> Result<()> {
    use signal_hook::{consts::SIGINT, iterator::Signals};

    let mut signals = Signals::new([SIGINT])?;

    std::thread::spawn(move || {
        if signals.forever().next().is_some() {
            tracing::error!("interrupted; wipe status unknown, rerun from pass 1");
            eprintln!(
                "\n{} interrupted: wipe status unknown, rerun from pass 1",
                "✘".red().bold()
            );
            std::process::exit(EXIT_INTERRUPTED);
        }
    });

    Ok(())
}
