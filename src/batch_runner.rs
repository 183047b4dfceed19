/*!
 * Sequential batch execution with per-item fault isolation.
 *
 * Inputs are visited once each, in natural order. A failing item is recorded
 * in the report and the run moves on to the next one.
 */

use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use crate::app_config::WorkerParams;
use crate::dictionary::DictionaryPair;
use crate::engine::{TextLine, TranslationWorker};
use crate::errors::EngineError;
use crate::file_utils::natural_sort;
use crate::logging::LogContext;

/// Result of processing one input
#[derive(Debug)]
pub struct ItemOutcome {
    /// Input path as given
    pub path: PathBuf,
    /// Substituted text lines, or the error that stopped this item
    pub result: Result<Vec<TextLine>, EngineError>,
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-item outcomes of a batch run, in processing order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Paths in the order they were processed
    pub fn processed_paths(&self) -> Vec<&Path> {
        self.outcomes.iter().map(|o| o.path.as_path()).collect()
    }

    /// Substituted lines of a successful item
    pub fn lines_for<P: AsRef<Path>>(&self, path: P) -> Option<&[TextLine]> {
        self.outcomes
            .iter()
            .find(|o| o.path == path.as_ref())
            .and_then(|o| o.result.as_ref().ok())
            .map(|lines| lines.as_slice())
    }
}

/// Runs one translation per input, one at a time
pub struct BatchRunner {
    log: LogContext,
    show_progress: bool,
}

impl BatchRunner {
    pub fn new(log: LogContext) -> Self {
        Self {
            log,
            show_progress: false,
        }
    }

    /// Show a progress bar while running
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Translate every input in natural order and apply both dictionaries
    pub async fn run(
        &self,
        worker: &dyn TranslationWorker,
        dictionaries: &DictionaryPair,
        inputs: &[PathBuf],
        dest: &Path,
        params: &WorkerParams,
    ) -> BatchReport {
        let ordered = natural_sort(inputs);
        let progress_bar = self.progress_bar(ordered.len());
        let mut report = BatchReport::default();

        for path in ordered {
            let file_name = path
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| path.to_string_lossy().to_string());
            progress_bar.set_message(format!("Processing: {}", file_name));

            let result = match worker.translate_path(&path, dest, params).await {
                Ok(lines) => Ok(self.apply_dictionaries(lines, dictionaries)),
                Err(e) => {
                    self.log
                        .warn(&format!("Error processing file {}: {}", path.display(), e));
                    Err(e)
                }
            };
            report.outcomes.push(ItemOutcome { path, result });
            progress_bar.inc(1);
        }

        progress_bar.finish_and_clear();
        if report.outcomes.len() > 1 {
            self.log.info(&format!(
                "Batch completed: {} succeeded, {} failed",
                report.succeeded(),
                report.failed()
            ));
        }

        report
    }

    // @applies: Pre dictionary to every source text, then post dictionary to every translation
    fn apply_dictionaries(&self, mut lines: Vec<TextLine>, dictionaries: &DictionaryPair) -> Vec<TextLine> {
        for line in lines.iter_mut() {
            line.text = dictionaries.pre.apply(&line.text);
            self.log
                .info(&format!("Pre-translation dictionary applied: {}", line.text));
        }
        for line in lines.iter_mut() {
            line.translation = dictionaries.post.apply(&line.translation);
            self.log.info(&format!(
                "Post-translation dictionary applied: {}",
                line.translation
            ));
        }
        lines
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress_bar = ProgressBar::new(len as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar
    }
}
