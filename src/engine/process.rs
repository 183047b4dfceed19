use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::app_config::{EngineConfig, WorkerParams};
use crate::errors::EngineError;
use crate::logging::LogContext;

use super::{ServiceKind, ServiceWorker, TextLine, TranslationWorker, WorkerFactory};

// @module: Engine backed by an external executable

/// Accepted shapes of the engine's stdout
#[derive(Deserialize)]
#[serde(untagged)]
enum EngineOutput {
    Wrapped { textlines: Vec<TextLine> },
    Bare(Vec<TextLine>),
}

/// Factory for workers that run the configured engine command
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    config: EngineConfig,
}

impl ProcessEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    // @builds: Base command with the configured prefix arguments
    fn base_command(config: &EngineConfig) -> Command {
        let mut command = Command::new(&config.command);
        command.args(&config.args).kill_on_drop(true);
        command
    }

    /// Parse the engine's stdout into text lines
    pub fn parse_output(stdout: &str) -> Result<Vec<TextLine>, EngineError> {
        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<EngineOutput>(trimmed) {
            Ok(EngineOutput::Wrapped { textlines }) => Ok(textlines),
            Ok(EngineOutput::Bare(lines)) => Ok(lines),
            Err(e) => Err(EngineError::InvalidOutput(e.to_string())),
        }
    }

    /// Keep only the tail of stderr that explains the failure
    pub fn filter_stderr(stderr: &str) -> String {
        let meaningful: Vec<&str> = stderr
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .collect();

        if meaningful.is_empty() {
            return "unknown engine error (stderr was empty)".to_string();
        }

        // Python tracebacks end with the exception line
        let start = meaningful.len().saturating_sub(5);
        meaningful[start..].join("\n")
    }
}

impl WorkerFactory for ProcessEngine {
    fn translator(&self, log: &LogContext) -> Result<Box<dyn TranslationWorker>, EngineError> {
        Ok(Box::new(ProcessTranslator {
            config: self.config.clone(),
            log: log.clone(),
        }))
    }

    fn web_server(
        &self,
        host: &str,
        port: u16,
        log: &LogContext,
    ) -> Result<Box<dyn ServiceWorker>, EngineError> {
        Ok(Box::new(ProcessService {
            config: self.config.clone(),
            args: vec![
                "web".to_string(),
                "--host".to_string(),
                host.to_string(),
                "--port".to_string(),
                port.to_string(),
            ],
            log: log.clone(),
        }))
    }

    fn service(
        &self,
        kind: ServiceKind,
        log: &LogContext,
    ) -> Result<Box<dyn ServiceWorker>, EngineError> {
        Ok(Box::new(ProcessService {
            config: self.config.clone(),
            args: vec![kind.as_str().to_string()],
            log: log.clone(),
        }))
    }
}

/// Translates one image per engine invocation
#[derive(Debug)]
pub struct ProcessTranslator {
    config: EngineConfig,
    log: LogContext,
}

#[async_trait]
impl TranslationWorker for ProcessTranslator {
    async fn translate_path(
        &self,
        input: &Path,
        dest: &Path,
        params: &WorkerParams,
    ) -> Result<Vec<TextLine>, EngineError> {
        let mut command = ProcessEngine::base_command(&self.config);
        command
            .arg("translate")
            .arg("--input")
            .arg(input)
            .arg("--dest")
            .arg(dest)
            .arg("--params")
            .arg(params.to_json())
            .stdin(Stdio::null());

        self.log.debug(&format!("Translating {:?} -> {:?}", input, dest));

        let output_future = command.output();
        let output = if self.config.timeout_secs > 0 {
            let timeout_duration = Duration::from_secs(self.config.timeout_secs);
            tokio::select! {
                result = output_future => result?,
                _ = tokio::time::sleep(timeout_duration) => {
                    return Err(EngineError::Timeout(self.config.timeout_secs));
                }
            }
        } else {
            output_future.await?
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Failed {
                status: output.status.to_string(),
                message: ProcessEngine::filter_stderr(&stderr),
            });
        }

        ProcessEngine::parse_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Runs one engine service with inherited stdio until it exits
#[derive(Debug)]
pub struct ProcessService {
    config: EngineConfig,
    args: Vec<String>,
    log: LogContext,
}

#[async_trait]
impl ServiceWorker for ProcessService {
    async fn listen(&self, params: &WorkerParams) -> Result<(), EngineError> {
        let mut command = ProcessEngine::base_command(&self.config);
        command.args(&self.args).arg("--params").arg(params.to_json());

        let mut child = command.spawn()?;
        self.log
            .debug(&format!("Started {} (pid {:?})", self.args.join(" "), child.id()));

        // Dropping this future (Ctrl-C) kills the child via kill_on_drop
        let status = child.wait().await?;
        if status.success() {
            Ok(())
        } else {
            Err(EngineError::Failed {
                status: status.to_string(),
                message: format!("service `{}` stopped", self.args.join(" ")),
            })
        }
    }
}
