/*!
 * Integration tests for service mode dispatch
 */

use anyhow::Result;
use std::path::PathBuf;

use mangadispatch::app_config::RunMode;
use mangadispatch::app_controller::DispatchOutcome;
use mangadispatch::engine::MockEngine;
use mangadispatch::errors::{AppError, EngineError};
use crate::common;

/// Test that each service mode starts exactly its own worker
#[tokio::test]
async fn test_serviceModes_shouldStartMatchingWorker() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let cases = [
        (RunMode::WebClient, "web_client"),
        (RunMode::Ws, "ws"),
        (RunMode::Api, "api"),
        (RunMode::Shared, "shared"),
    ];

    for (mode, service) in cases {
        let engine = MockEngine::new();
        let config = common::run_config(mode, temp_dir.path(), Vec::new());

        let outcome = common::controller(&engine).dispatch(&config).await?;

        assert!(matches!(outcome, DispatchOutcome::ServiceStopped(m) if m == mode));
        assert_eq!(engine.services_started(), vec![service.to_string()]);
        assert_eq!(engine.translators_built(), 0);
    }
    Ok(())
}

/// Test that web mode starts the server with the configured host and port
#[tokio::test]
async fn test_webMode_shouldUseHostAndPort() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let engine = MockEngine::new();
    let mut config = common::run_config(RunMode::Web, temp_dir.path(), Vec::new());
    config.host = "0.0.0.0".to_string();
    config.port = 8080;

    let outcome = common::controller(&engine).dispatch(&config).await?;

    assert!(matches!(outcome, DispatchOutcome::ServiceStopped(RunMode::Web)));
    assert_eq!(engine.services_started(), vec!["web 0.0.0.0:8080".to_string()]);
    Ok(())
}

/// Test that service modes ignore inputs instead of translating them
#[tokio::test]
async fn test_serviceMode_withInputs_shouldNotTranslate() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let engine = MockEngine::new();
    let config = common::run_config(RunMode::Api, temp_dir.path(), vec![PathBuf::from("a.png")]);

    common::controller(&engine).dispatch(&config).await?;

    assert!(engine.translated_inputs().is_empty());
    Ok(())
}

/// Test that a service failure propagates to the caller
#[tokio::test]
async fn test_serviceMode_withFailingService_shouldPropagateError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let engine = MockEngine::new().with_service_failure();
    let config = common::run_config(RunMode::Ws, temp_dir.path(), Vec::new());

    let result = common::controller(&engine).dispatch(&config).await;

    assert!(matches!(result, Err(AppError::Engine(EngineError::Failed { .. }))));
    assert_eq!(engine.services_started(), vec!["ws".to_string()]);
    Ok(())
}
