/*!
 * Interfaces to the external translation engine and service workers.
 *
 * The dispatcher never looks inside the engine. It only relies on:
 * - `TranslationWorker`: translate one input path and return its text lines
 * - `ServiceWorker`: run a long-lived service until it stops
 * - `WorkerFactory`: build the worker matching a run mode
 *
 * Implementations:
 * - `process`: drives an external engine executable
 * - `mock`: in-memory engine for tests
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;

use crate::app_config::{RunMode, WorkerParams};
use crate::errors::EngineError;
use crate::logging::LogContext;

/// One recognized text region and its translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLine {
    /// Recognized source text
    pub text: String,

    /// Translated text
    #[serde(default)]
    pub translation: String,
}

impl TextLine {
    pub fn new(text: &str, translation: &str) -> Self {
        Self {
            text: text.to_string(),
            translation: translation.to_string(),
        }
    }
}

/// Long-running service started by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    // @service: Client polling a remote server
    WebClient,
    // @service: Websocket worker
    Ws,
    // @service: HTTP API worker
    Api,
    // @service: Shared-queue worker
    Shared,
}

impl ServiceKind {
    // @returns: Engine sub-command for the service
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebClient => "web_client",
            Self::Ws => "ws",
            Self::Api => "api",
            Self::Shared => "shared",
        }
    }

    /// Run mode that starts this service
    pub fn mode(&self) -> RunMode {
        match self {
            Self::WebClient => RunMode::WebClient,
            Self::Ws => RunMode::Ws,
            Self::Api => RunMode::Api,
            Self::Shared => RunMode::Shared,
        }
    }
}

/// Translates single inputs
///
/// Results are returned by value; the worker keeps no per-call state the
/// caller has to read back afterwards.
#[async_trait]
pub trait TranslationWorker: Send + Sync + Debug {
    /// Translate `input`, writing the rendered result under `dest`
    ///
    /// # Returns
    /// * The recognized and translated text lines, in engine order
    async fn translate_path(
        &self,
        input: &Path,
        dest: &Path,
        params: &WorkerParams,
    ) -> Result<Vec<TextLine>, EngineError>;
}

/// Long-running service worker
#[async_trait]
pub trait ServiceWorker: Send + Sync + Debug {
    /// Run the service loop; returns when the service stops
    async fn listen(&self, params: &WorkerParams) -> Result<(), EngineError>;
}

/// Builds the worker needed by each run mode
pub trait WorkerFactory: Send + Sync {
    /// Worker for demo and batch modes
    fn translator(&self, log: &LogContext) -> Result<Box<dyn TranslationWorker>, EngineError>;

    /// HTTP server for web mode
    fn web_server(
        &self,
        host: &str,
        port: u16,
        log: &LogContext,
    ) -> Result<Box<dyn ServiceWorker>, EngineError>;

    /// Worker for the four service modes
    fn service(
        &self,
        kind: ServiceKind,
        log: &LogContext,
    ) -> Result<Box<dyn ServiceWorker>, EngineError>;
}

pub mod mock;
pub mod process;

pub use mock::MockEngine;
pub use process::ProcessEngine;
