//! @ai:module:intent CLI entry point for the Go escape highlighter
//! @ai:module:layer presentation
//! @ai:module:public_api main
//! @ai:module:depends_on trigger, scheduler, watch, output, config

use clap::{Parser, Subcommand, ValueEnum};
use go_escape_highlighter::{
    output, AnalysisState, Analyzer, BufferView, Config, FileWatcher, GoBuild, Listener,
    OutputFormat, ReportingView,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "go-escape")]
#[command(author, version, about = "Highlight Go heap escapes reported by `go build -gcflags -m`")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a Go file once and print its heap escapes
    Analyze {
        /// Go source file to analyze
        file: PathBuf,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },

    /// Re-analyze a Go file every time it changes
    Watch {
        /// Go source file to watch
        file: PathBuf,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Check that the configured build tool can be started
    Check {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write the default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "go-escape.toml")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    JsonPretty,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::JsonPretty => OutputFormat::JsonPretty,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("go_escape_highlighter=info"));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            file,
            config,
            format,
        } => analyze(&file, config.as_deref(), format.into()),
        Commands::Watch { file, config } => watch(file, config.as_deref()).await,
        Commands::Check { config } => check(config.as_deref()),
        Commands::Init { output } => init_config(&output),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

/// @ai:intent Run one analysis and print the findings for `file`
/// @ai:effects fs:read, io
fn analyze(
    file: &Path,
    config: Option<&Path>,
    format: OutputFormat,
) -> go_escape_highlighter::Result<ExitCode> {
    let config = Config::load_or_default(config)?;
    let analyzer = Analyzer::from_config(Arc::new(AnalysisState::new()), &config);
    // Analyze the file as it is on disk; never rewrite it.
    let view = BufferView::mirror(file)?;

    match analyzer.analyze(&view) {
        Some(report) => {
            println!("{}", output::format_report(&report, format));
            Ok(ExitCode::SUCCESS)
        }
        None => Ok(ExitCode::from(2)),
    }
}

/// @ai:intent Enable analysis for `file`, then debounce every change until Ctrl-C
/// @ai:effects fs:read, fs:watch, io
async fn watch(file: PathBuf, config: Option<&Path>) -> go_escape_highlighter::Result<ExitCode> {
    let config = Config::load_or_default(config)?;
    let analyzer = Arc::new(Analyzer::from_config(Arc::new(AnalysisState::new()), &config));
    let view = Arc::new(ReportingView::open(&file)?);
    let listener = Listener::new(
        Arc::clone(&analyzer),
        config.quiet_period(),
        tokio::runtime::Handle::current(),
    );
    let shutdown = Arc::new(AtomicBool::new(false));

    let mut watcher = {
        let shutdown = Arc::clone(&shutdown);
        tokio::task::spawn_blocking(move || {
            // Arm the watch first so saves made during the first build are seen.
            let watcher = FileWatcher::new(&file)?;
            analyzer.toggle(view.as_ref());
            watcher.run(view, &listener, &shutdown)
        })
    };

    tokio::select! {
        result = &mut watcher => return watch_finished(result),
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            }
        }
    }

    shutdown.store(true, Ordering::SeqCst);
    watch_finished(watcher.await)
}

fn watch_finished(
    result: Result<go_escape_highlighter::Result<()>, JoinError>,
) -> go_escape_highlighter::Result<ExitCode> {
    match result {
        Ok(result) => result.map(|()| ExitCode::SUCCESS),
        Err(e) => {
            tracing::error!("Watcher task failed: {}", e);
            Ok(ExitCode::from(2))
        }
    }
}

/// @ai:intent Report whether the configured build tool is installed
/// @ai:effects io
fn check(config: Option<&Path>) -> go_escape_highlighter::Result<ExitCode> {
    let config = Config::load_or_default(config)?;
    let tool = GoBuild::new(&config.build);

    if tool.is_available() {
        println!("`{}` is available", tool.program());
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!(
            "Tool '{}' not found - escape analysis will show no findings. Install Go: https://go.dev/dl/",
            tool.program()
        );
        Ok(ExitCode::from(1))
    }
}

/// @ai:intent Write the default configuration file
/// @ai:effects fs:write
fn init_config(output: &Path) -> go_escape_highlighter::Result<ExitCode> {
    Config::default().save(output)?;
    println!("Wrote default configuration to {}", output.display());
    Ok(ExitCode::SUCCESS)
}
