/*!
 * Mock engine implementation for testing.
 *
 * `MockEngine` records every worker construction and call so tests can
 * assert on ordering and on what was (not) attempted:
 * - `MockEngine::new()` - every translation succeeds
 * - `MockEngine::failing_on(..)` - translations of the listed files fail
 * - `MockEngine::with_service_failure()` - service workers stop with an error
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::WorkerParams;
use crate::errors::EngineError;
use crate::logging::LogContext;

use super::{ServiceKind, ServiceWorker, TextLine, TranslationWorker, WorkerFactory};

/// One recorded translate call
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateCall {
    pub input: PathBuf,
    pub dest: PathBuf,
    pub params: WorkerParams,
}

/// Everything the mock has observed
#[derive(Debug, Default)]
struct MockState {
    translators_built: usize,
    translate_calls: Vec<TranslateCall>,
    services_started: Vec<String>,
}

/// In-memory engine for tests
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
    failing_files: Arc<HashSet<String>>,
    lines: Option<Arc<Vec<TextLine>>>,
    service_fails: bool,
}

impl MockEngine {
    /// Engine whose translations always succeed
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine that fails translating inputs whose file name is listed
    pub fn failing_on(file_names: &[&str]) -> Self {
        Self {
            failing_files: Arc::new(file_names.iter().map(|s| s.to_string()).collect()),
            ..Self::default()
        }
    }

    /// Return these lines for every input instead of the generated ones
    pub fn with_lines(mut self, lines: Vec<TextLine>) -> Self {
        self.lines = Some(Arc::new(lines));
        self
    }

    /// Service workers stop with an error
    pub fn with_service_failure(mut self) -> Self {
        self.service_fails = true;
        self
    }

    /// Number of translation workers constructed
    pub fn translators_built(&self) -> usize {
        self.state.lock().translators_built
    }

    /// Inputs passed to translate_path, in call order
    pub fn translated_inputs(&self) -> Vec<PathBuf> {
        self.state
            .lock()
            .translate_calls
            .iter()
            .map(|c| c.input.clone())
            .collect()
    }

    /// All translate calls, in call order
    pub fn translate_calls(&self) -> Vec<TranslateCall> {
        self.state.lock().translate_calls.clone()
    }

    /// Services started, e.g. `ws` or `web 127.0.0.1:5003`
    pub fn services_started(&self) -> Vec<String> {
        self.state.lock().services_started.clone()
    }

    // @generates: Default text lines for an input
    fn generated_lines(input: &Path) -> Vec<TextLine> {
        let name = file_name(input);
        vec![TextLine::new(
            &format!("cat in {}", name),
            &format!("dog in {}", name),
        )]
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

impl WorkerFactory for MockEngine {
    fn translator(&self, _log: &LogContext) -> Result<Box<dyn TranslationWorker>, EngineError> {
        self.state.lock().translators_built += 1;
        Ok(Box::new(MockTranslator {
            engine: self.clone(),
        }))
    }

    fn web_server(
        &self,
        host: &str,
        port: u16,
        _log: &LogContext,
    ) -> Result<Box<dyn ServiceWorker>, EngineError> {
        Ok(Box::new(MockService {
            engine: self.clone(),
            name: format!("web {}:{}", host, port),
        }))
    }

    fn service(
        &self,
        kind: ServiceKind,
        _log: &LogContext,
    ) -> Result<Box<dyn ServiceWorker>, EngineError> {
        Ok(Box::new(MockService {
            engine: self.clone(),
            name: kind.as_str().to_string(),
        }))
    }
}

/// Translation worker handed out by `MockEngine`
#[derive(Debug)]
pub struct MockTranslator {
    engine: MockEngine,
}

#[async_trait]
impl TranslationWorker for MockTranslator {
    async fn translate_path(
        &self,
        input: &Path,
        dest: &Path,
        params: &WorkerParams,
    ) -> Result<Vec<TextLine>, EngineError> {
        self.engine.state.lock().translate_calls.push(TranslateCall {
            input: input.to_path_buf(),
            dest: dest.to_path_buf(),
            params: params.clone(),
        });

        if self.engine.failing_files.contains(&file_name(input)) {
            return Err(EngineError::Failed {
                status: "exit status: 1".to_string(),
                message: format!("Simulated failure for {}", input.display()),
            });
        }

        Ok(match &self.engine.lines {
            Some(lines) => lines.as_ref().clone(),
            None => MockEngine::generated_lines(input),
        })
    }
}

/// Service worker handed out by `MockEngine`; returns immediately
#[derive(Debug)]
pub struct MockService {
    engine: MockEngine,
    name: String,
}

#[async_trait]
impl ServiceWorker for MockService {
    async fn listen(&self, _params: &WorkerParams) -> Result<(), EngineError> {
        self.engine.state.lock().services_started.push(self.name.clone());
        if self.engine.service_fails {
            return Err(EngineError::Failed {
                status: "exit status: 2".to_string(),
                message: format!("Simulated {} failure", self.name),
            });
        }
        Ok(())
    }
}
