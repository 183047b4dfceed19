use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::app_config::{RunConfig, RunMode, WorkerParams};
use crate::batch_runner::{BatchReport, BatchRunner};
use crate::dictionary::DictionaryPair;
use crate::engine::{ServiceKind, WorkerFactory};
use crate::errors::{AppError, DispatchError};
use crate::file_utils::FileManager;
use crate::logging::LogContext;

// @module: Application controller dispatching a run to its mode

/// What a completed run produced
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Demo or batch run, with one outcome per input
    Batch(BatchReport),
    /// A service mode whose listen loop has returned
    ServiceStopped(RunMode),
}

/// Main application controller
pub struct Controller {
    // @field: Builds the worker for the active mode
    factory: Box<dyn WorkerFactory>,
    // @field: Log context of this run
    log: LogContext,
    // @field: Show a progress bar in batch mode
    show_progress: bool,
}

impl Controller {
    // @method: Create a new controller around a worker factory
    pub fn new(factory: Box<dyn WorkerFactory>, log: LogContext) -> Self {
        Self {
            factory,
            log,
            show_progress: false,
        }
    }

    /// Show a progress bar over batch inputs
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Run `config` to completion in its mode
    pub async fn dispatch(&self, config: &RunConfig) -> Result<DispatchOutcome, AppError> {
        self.log.info(&format!("Running in {} mode", config.mode));

        match config.mode {
            RunMode::Demo => self.run_demo(config).await,
            RunMode::Batch => self.run_batch(config).await,
            RunMode::Web => self.run_web(config).await,
            RunMode::WebClient => self.run_service(ServiceKind::WebClient, config).await,
            RunMode::Ws => self.run_service(ServiceKind::Ws, config).await,
            RunMode::Api => self.run_service(ServiceKind::Api, config).await,
            RunMode::Shared => self.run_service(ServiceKind::Shared, config).await,
        }
    }

    /// Check the demo input: exactly one path naming an existing file
    pub fn validate_demo_input(inputs: &[PathBuf]) -> Result<&Path, DispatchError> {
        match inputs {
            [] => Err(DispatchError::NoInput),
            [single] if FileManager::file_exists(single) => Ok(single.as_path()),
            _ => Err(DispatchError::InvalidDemoInput(
                inputs
                    .iter()
                    .map(|p| p.to_string_lossy().to_string())
                    .collect::<Vec<_>>()
                    .join(" "),
            )),
        }
    }

    async fn run_demo(&self, config: &RunConfig) -> Result<DispatchOutcome, AppError> {
        let input = Self::validate_demo_input(&config.inputs)?.to_path_buf();

        // Repeated demo runs always replace the previous result
        let dest = config.demo_dest();
        let params = config.params.overwriting();
        FileManager::ensure_dir(&config.result_dir)
            .map_err(|e| AppError::File(e.to_string()))?;

        let report = self
            .translate_inputs(config, &[input], &dest, &params, false)
            .await?;
        Ok(DispatchOutcome::Batch(report))
    }

    async fn run_batch(&self, config: &RunConfig) -> Result<DispatchOutcome, AppError> {
        if config.inputs.is_empty() {
            return Err(DispatchError::NoInput.into());
        }

        // Existence is not checked here; unreadable inputs fail one by one
        let inputs = FileManager::expand_inputs(&config.inputs);
        if inputs.len() != config.inputs.len() {
            self.log.debug(&format!(
                "Expanded {} input(s) into {} file(s)",
                config.inputs.len(),
                inputs.len()
            ));
        }

        let start_time = Instant::now();
        let show_progress = self.show_progress && inputs.len() > 1;
        let report = self
            .translate_inputs(config, &inputs, &config.dest, &config.params, show_progress)
            .await?;
        self.log.debug(&format!(
            "Batch finished in {}",
            Self::format_duration(start_time.elapsed())
        ));
        Ok(DispatchOutcome::Batch(report))
    }

    // @runs: One translation worker and one dictionary load for all inputs
    async fn translate_inputs(
        &self,
        config: &RunConfig,
        inputs: &[PathBuf],
        dest: &Path,
        params: &WorkerParams,
        show_progress: bool,
    ) -> Result<BatchReport, AppError> {
        let worker = self.factory.translator(&self.log)?;

        let dictionaries =
            DictionaryPair::load(config.pre_dict.as_deref(), config.post_dict.as_deref())?;
        for (name, dictionary) in [("pre", &dictionaries.pre), ("post", &dictionaries.post)] {
            for entry in dictionary.skipped() {
                self.log.error(&format!(
                    "Invalid {}-translation dictionary entry at line {}: {}",
                    name, entry.line, entry.text
                ));
            }
        }

        let runner = BatchRunner::new(self.log.clone()).with_progress(show_progress);
        Ok(runner
            .run(worker.as_ref(), &dictionaries, inputs, dest, params)
            .await)
    }

    async fn run_web(&self, config: &RunConfig) -> Result<DispatchOutcome, AppError> {
        let server = self
            .factory
            .web_server(&config.host, config.port, &self.log)?;
        self.log
            .info(&format!("Serving on http://{}:{}", config.host, config.port));
        server.listen(&config.params).await?;
        Ok(DispatchOutcome::ServiceStopped(RunMode::Web))
    }

    async fn run_service(
        &self,
        kind: ServiceKind,
        config: &RunConfig,
    ) -> Result<DispatchOutcome, AppError> {
        let worker = self.factory.service(kind, &self.log)?;
        worker.listen(&config.params).await?;
        Ok(DispatchOutcome::ServiceStopped(kind.mode()))
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
