use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

use svcoff::{precheck, BackendKind, OutputFormat, Reporter, ShutdownOrchestrator, SvcoffConfig};

#[derive(Parser, Debug)]
#[command(name = "svcoff")]
#[command(about = "Stop and disable a set of host background services")]
#[command(version)]
#[command(long_about = "Stops each named service and sets its startup mode to disabled so it \
does not come back after a reboot. Services are handled in parallel, at most ten at a time. \
Uses sc.exe on Windows and systemctl on systemd hosts.")]
struct Args {
    /// Services to stop and disable (defaults to the configured list)
    #[arg(value_name = "SERVICE")]
    services: Vec<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "svcoff.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<std::path::PathBuf>,

    /// Maximum services handled at once (1-10)
    #[arg(long, value_name = "N")]
    max_parallel: Option<usize>,

    /// Seconds to wait for each service to stop
    #[arg(long, value_name = "SECONDS")]
    stop_timeout: Option<u64>,

    /// Service control backend (auto, windows, systemd)
    #[arg(long, value_name = "BACKEND")]
    backend: Option<BackendKind>,

    /// Result output format (text, json)
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Skip the privilege and OS checks
    #[arg(long)]
    skip_precheck: bool,

    /// Print the default service list and exit
    #[arg(long)]
    list_defaults: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without touching any service")]
    validate_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        println!("# svcoff configuration file");
        println!("{}", SvcoffConfig::default().to_toml()?);
        return Ok(());
    }

    if args.list_defaults {
        for name in svcoff::DEFAULT_SERVICES {
            println!("{}", name);
        }
        return Ok(());
    }

    let _log_guard = init_logging(&args)?;

    info!("Starting svcoff v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match SvcoffConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    apply_overrides(&mut config, &args);

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(2);
    }

    if args.validate_config {
        println!("✓ Configuration is valid");
        return Ok(());
    }

    if !args.skip_precheck {
        if let Err(e) = precheck::run_prechecks(&config.precheck, config.services.backend).await {
            error!("Precheck failed: {}", e);
            eprintln!("✗ {}", e);
            std::process::exit(2);
        }
    }

    let names = if args.services.is_empty() {
        config.services.names.clone()
    } else {
        args.services.clone()
    };

    let orchestrator = ShutdownOrchestrator::from_config(&config);
    let result = orchestrator.run(&names).await;

    let color = !args.no_color && std::io::stdout().is_terminal();
    Reporter::new(args.output, color).print(&result)?;

    let exit_code = result.exit_code();
    info!("svcoff exited with code: {}", exit_code);
    drop(_log_guard);
    std::process::exit(exit_code);
}

/// Command line flags win over file and environment settings
fn apply_overrides(config: &mut SvcoffConfig, args: &Args) {
    if let Some(max_parallel) = args.max_parallel {
        config.orchestrator.max_parallel = max_parallel;
    }
    if let Some(stop_timeout) = args.stop_timeout {
        config.orchestrator.stop_timeout_seconds = stop_timeout;
    }
    if let Some(backend) = args.backend {
        config.services.backend = backend;
    }
    if args.skip_precheck {
        config.precheck.require_admin = false;
        config.precheck.require_supported_os = false;
    }
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("svcoff={}", log_level)));

    // Logs go to stderr so stdout stays clean for the report
    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("pretty") => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some("compact") | None => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer().with_writer(std::io::stderr).boxed()
        }
    };

    let (file_layer, guard) = match &args.log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("invalid log file path: {}", path.display()))?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}
