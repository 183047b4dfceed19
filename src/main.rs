// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::LevelFilter;
use std::path::PathBuf;
use std::process::ExitCode;

use mangadispatch::app_config::{self, Config, RunConfig, RunMode, WorkerParams};
use mangadispatch::app_controller::{Controller, DispatchOutcome};
use mangadispatch::engine::ProcessEngine;
use mangadispatch::errors::error_class;
use mangadispatch::logging::{CustomLogger, LogContext};

/// CLI Wrapper for RunMode to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliRunMode {
    Demo,
    Batch,
    Web,
    #[value(name = "web_client")]
    WebClient,
    Ws,
    Api,
    Shared,
}

impl From<CliRunMode> for RunMode {
    fn from(cli_mode: CliRunMode) -> Self {
        match cli_mode {
            CliRunMode::Demo => RunMode::Demo,
            CliRunMode::Batch => RunMode::Batch,
            CliRunMode::Web => RunMode::Web,
            CliRunMode::WebClient => RunMode::WebClient,
            CliRunMode::Ws => RunMode::Ws,
            CliRunMode::Api => RunMode::Api,
            CliRunMode::Shared => RunMode::Shared,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for mangadispatch
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// mangadispatch - run dispatcher for an image translation engine
#[derive(Parser, Debug)]
#[command(name = "mangadispatch")]
#[command(version)]
#[command(about = "Runs the translation engine in demo, batch or service mode")]
#[command(long_about = "mangadispatch drives an external image translation engine.

EXAMPLES:
    mangadispatch -m demo -i page.png                  # Translate one image into result/final.png
    mangadispatch -m batch -i chapter1/ -o out/        # Translate every image of a folder
    mangadispatch -i p1.png p2.png --pre-dict pre.txt  # Batch with a pre-translation dictionary
    mangadispatch -m web --host 0.0.0.0 --port 5003    # Start the web server
    mangadispatch -m ws -p ws_url=ws://host/queue      # Start a websocket worker
    mangadispatch completions bash > mangadispatch.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Run mode
    #[arg(short, long, value_enum, default_value = "batch")]
    mode: CliRunMode,

    /// Input image(s) or folder(s)
    #[arg(short, long, num_args = 1..)]
    input: Vec<PathBuf>,

    /// Output directory for batch mode
    #[arg(short = 'o', long)]
    dest: Option<PathBuf>,

    /// Dictionary applied to recognized text before translation
    #[arg(long)]
    pre_dict: Option<PathBuf>,

    /// Dictionary applied to translated text
    #[arg(long)]
    post_dict: Option<PathBuf>,

    /// Host for web mode
    #[arg(long)]
    host: Option<String>,

    /// Port for web mode
    #[arg(long)]
    port: Option<u16>,

    /// Overwrite existing results
    #[arg(long)]
    overwrite: bool,

    /// Extra engine parameter, may be repeated
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Debug logging and full error chains
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "mangadispatch", &mut std::io::stdout());
        return ExitCode::SUCCESS;
    }

    let mode: RunMode = cli.mode.into();
    let verbose = cli.verbose;
    let log = LogContext::for_mode(mode);

    let Some(result) = run_until_interrupted(run(cli, mode, &log), tokio::signal::ctrl_c()).await
    else {
        if prints_interrupt_newline(mode) {
            println!();
        }
        return ExitCode::from(130);
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            for line in format_top_level_error(&e, verbose) {
                log.error(&line);
            }
            ExitCode::FAILURE
        }
    }
}

/// Drive `work` until it completes or `interrupt` fires; `None` means interrupted
///
/// An interrupt future that fails (no signal handler could be installed)
/// is ignored and `work` runs to completion.
async fn run_until_interrupted<W, S>(work: W, interrupt: S) -> Option<W::Output>
where
    W: Future,
    S: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        output = work => Some(output),
        Ok(()) = interrupt => None,
    }
}

// @returns: Whether an interrupted run ends the terminal line
fn prints_interrupt_newline(mode: RunMode) -> bool {
    mode != RunMode::Web
}

/// Lines logged for an error that ends the run
fn format_top_level_error(error: &anyhow::Error, verbose: bool) -> Vec<String> {
    let mut lines = vec![format!("{}: {}", error_class(error), error)];
    if verbose {
        lines.push(format!("{:?}", error));
    }
    lines
}

async fn run(options: CommandLineOptions, mode: RunMode, log: &LogContext) -> Result<()> {
    if options.verbose {
        log::set_max_level(LevelFilter::Debug);
    } else if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let (config, created) = Config::load_or_create(&options.config_path)?;
    if created {
        log.warn(&format!(
            "Config file not found at '{}', created default config.",
            options.config_path
        ));
    }
    if !options.verbose && options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }
    config.validate()?;

    let mut params = WorkerParams {
        overwrite: options.overwrite,
        extra: config.params.clone(),
    };
    for pair in &options.params {
        let (key, value) = WorkerParams::parse_pair(pair)?;
        params.extra.insert(key, value);
    }

    let mut run_config = RunConfig::from_config(mode, &config);
    run_config.inputs = options.input;
    if let Some(dest) = options.dest {
        run_config.dest = dest;
    }
    run_config.pre_dict = options.pre_dict;
    run_config.post_dict = options.post_dict;
    if let Some(host) = options.host {
        run_config.host = host;
    }
    if let Some(port) = options.port {
        run_config.port = port;
    }
    run_config.verbose = options.verbose;
    run_config.params = params;
    run_config.validate()?;

    if mode != RunMode::Web && log.debug_enabled() {
        log.debug(&format!("{:?}", run_config));
    }

    let engine = ProcessEngine::new(config.engine.clone());
    let controller = Controller::new(Box::new(engine), log.clone()).with_progress(true);

    match controller.dispatch(&run_config).await? {
        DispatchOutcome::Batch(report) => {
            log.debug(&format!(
                "{} input(s) processed, {} failed",
                report.outcomes.len(),
                report.failed()
            ));
        }
        DispatchOutcome::ServiceStopped(stopped) => {
            log.info(&format!("{} service stopped", stopped));
        }
    }

    Ok(())
}
