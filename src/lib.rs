/*!
 * # mangadispatch - Run dispatcher for a manga/document translation engine
 *
 * A Rust library and CLI that drives an external image translation engine.
 *
 * ## Features
 *
 * - Seven run modes: `demo`, `batch`, `web`, `web_client`, `ws`, `api`, `shared`
 * - Batch processing in natural file order with per-file fault isolation
 * - Pre- and post-translation substitution dictionaries (regex rules)
 * - JSON configuration with CLI overrides
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration file, run modes and per-run configuration
 * - `app_controller`: Dispatches a run to the strategy of its mode
 * - `batch_runner`: Sequential per-input execution
 * - `dictionary`: Substitution dictionaries
 * - `engine`: Interfaces to the external engine and service workers:
 *   - `engine::process`: External engine executable
 *   - `engine::mock`: In-memory engine for tests
 * - `file_utils`: Natural sorting and input expansion
 * - `logging`: Log backend and per-run log context
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod batch_runner;
pub mod dictionary;
pub mod engine;
pub mod errors;
pub mod file_utils;
pub mod logging;

// Re-export main types for easier usage
pub use app_config::{Config, RunConfig, RunMode, WorkerParams};
pub use app_controller::{Controller, DispatchOutcome};
pub use batch_runner::{BatchReport, BatchRunner, ItemOutcome};
pub use dictionary::{Dictionary, DictionaryPair, DictionaryRule, SkippedEntry};
pub use engine::{ServiceKind, ServiceWorker, TextLine, TranslationWorker, WorkerFactory};
pub use errors::{AppError, DictionaryError, DispatchError, EngineError};
pub use logging::LogContext;
