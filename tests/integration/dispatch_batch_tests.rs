/*!
 * Integration tests for demo and batch dispatch
 */

use anyhow::Result;
use std::path::PathBuf;

use mangadispatch::app_config::RunMode;
use mangadispatch::app_controller::DispatchOutcome;
use mangadispatch::batch_runner::BatchReport;
use mangadispatch::engine::{MockEngine, TextLine};
use mangadispatch::errors::{AppError, DictionaryError, DispatchError};
use crate::common;

fn expect_report(outcome: DispatchOutcome) -> BatchReport {
    match outcome {
        DispatchOutcome::Batch(report) => report,
        other => panic!("expected a batch outcome, got {:?}", other),
    }
}

/// Test that batch inputs are processed in natural order regardless of input order
#[tokio::test]
async fn test_batch_withUnsortedInputs_shouldProcessInNaturalOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let engine = MockEngine::new();
    let config = common::run_config(
        RunMode::Batch,
        temp_dir.path(),
        vec![PathBuf::from("p10.png"), PathBuf::from("p2.png")],
    );

    let report = expect_report(common::controller(&engine).dispatch(&config).await?);

    assert_eq!(
        engine.translated_inputs(),
        vec![PathBuf::from("p2.png"), PathBuf::from("p10.png")]
    );
    assert_eq!(report.outcomes.len(), 2);
    Ok(())
}

/// Test the failing-first-item scenario: a.png fails, b.png still produces substituted lines
#[tokio::test]
async fn test_batch_withFailingFirstItem_shouldStillProcessSecond() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let pre = common::create_test_file(temp_dir.path(), "pre.txt", "cat neko\n")?;
    let post = common::create_test_file(temp_dir.path(), "post.txt", "dog inu\n")?;

    let engine = MockEngine::failing_on(&["a.png"]);
    let mut config = common::run_config(
        RunMode::Batch,
        temp_dir.path(),
        vec![PathBuf::from("a.png"), PathBuf::from("b.png")],
    );
    config.pre_dict = Some(pre);
    config.post_dict = Some(post);

    let report = expect_report(common::controller(&engine).dispatch(&config).await?);

    assert_eq!(engine.translated_inputs().len(), 2);
    assert!(report.lines_for("a.png").is_none());
    assert_eq!(
        report.lines_for("b.png").unwrap(),
        &[TextLine::new("neko in b.png", "inu in b.png")]
    );
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    Ok(())
}

/// Test that dictionaries and the worker are set up once for the whole batch
#[tokio::test]
async fn test_batch_withManyInputs_shouldBuildOneWorker() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let engine = MockEngine::new();
    let inputs = (1..=5).map(|i| PathBuf::from(format!("page{}.png", i))).collect();
    let config = common::run_config(RunMode::Batch, temp_dir.path(), inputs);

    common::controller(&engine).dispatch(&config).await?;

    assert_eq!(engine.translators_built(), 1);
    assert_eq!(engine.translated_inputs().len(), 5);
    Ok(())
}

/// Test that batch mode forwards the configured destination and parameters untouched
#[tokio::test]
async fn test_batch_shouldPassDestAndParamsThrough() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let engine = MockEngine::new();
    let mut config = common::run_config(RunMode::Batch, temp_dir.path(), vec![PathBuf::from("x.png")]);
    config
        .params
        .extra
        .insert("target_lang".to_string(), serde_json::Value::String("ENG".to_string()));

    common::controller(&engine).dispatch(&config).await?;

    let calls = engine.translate_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].dest, temp_dir.path().join("out"));
    assert!(!calls[0].params.overwrite);
    assert_eq!(calls[0].params.extra["target_lang"], "ENG");
    Ok(())
}

/// Test that a directory input is expanded into its images in natural order
#[tokio::test]
async fn test_batch_withDirectoryInput_shouldExpandImages() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let chapter = temp_dir.path().join("chapter");
    common::create_test_image(&chapter, "10.png")?;
    common::create_test_image(&chapter, "9.jpg")?;
    common::create_test_file(&chapter, "notes.txt", "skip me")?;

    let engine = MockEngine::new();
    let config = common::run_config(RunMode::Batch, temp_dir.path(), vec![chapter.clone()]);

    common::controller(&engine).dispatch(&config).await?;

    assert_eq!(
        engine.translated_inputs(),
        vec![chapter.join("9.jpg"), chapter.join("10.png")]
    );
    Ok(())
}

/// Test that batch mode without inputs is a configuration error
#[test]
fn test_batch_withoutInputs_shouldFailBeforeBuildingWorker() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let engine = MockEngine::new();
    let config = common::run_config(RunMode::Batch, temp_dir.path(), Vec::new());

    let result = tokio_test::block_on(async { common::controller(&engine).dispatch(&config).await });

    assert!(matches!(result, Err(AppError::Dispatch(DispatchError::NoInput))));
    assert_eq!(engine.translators_built(), 0);
    Ok(())
}

/// Test that an unreadable dictionary stops the run before any translation
#[tokio::test]
async fn test_batch_withMissingDictionary_shouldFailBeforeTranslating() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let engine = MockEngine::new();
    let mut config = common::run_config(RunMode::Batch, temp_dir.path(), vec![PathBuf::from("a.png")]);
    config.post_dict = Some(temp_dir.path().join("missing.txt"));

    let result = common::controller(&engine).dispatch(&config).await;

    assert!(matches!(
        result,
        Err(AppError::Dictionary(DictionaryError::Read { .. }))
    ));
    assert!(engine.translated_inputs().is_empty());
    Ok(())
}

/// Test that demo mode with two inputs fails before any translation call
#[tokio::test]
async fn test_demo_withTwoInputs_shouldFailWithConfigurationError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let first = common::create_test_image(temp_dir.path(), "a.png")?;
    let second = common::create_test_image(temp_dir.path(), "b.png")?;
    let engine = MockEngine::new();
    let config = common::run_config(RunMode::Demo, temp_dir.path(), vec![first, second]);

    let result = common::controller(&engine).dispatch(&config).await;

    assert!(matches!(
        result,
        Err(AppError::Dispatch(DispatchError::InvalidDemoInput(_)))
    ));
    assert_eq!(engine.translators_built(), 0);
    assert!(engine.translated_inputs().is_empty());
    Ok(())
}

/// Test that demo mode with a nonexistent file fails with file-not-found
#[tokio::test]
async fn test_demo_withNonexistentFile_shouldFailWithFileNotFound() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let engine = MockEngine::new();
    let missing = temp_dir.path().join("missing.png");
    let config = common::run_config(RunMode::Demo, temp_dir.path(), vec![missing]);

    let error = common::controller(&engine)
        .dispatch(&config)
        .await
        .expect_err("demo with a missing file must fail");

    assert_eq!(error.class_name(), "FileNotFoundError");
    assert!(error.to_string().contains("missing.png"));
    assert!(engine.translated_inputs().is_empty());
    Ok(())
}

/// Test that demo mode writes to the fixed result path with overwrite forced on
#[tokio::test]
async fn test_demo_withSingleFile_shouldForceOverwriteToFinalPng() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let image = common::create_test_image(temp_dir.path(), "page.png")?;
    let engine = MockEngine::new();
    let config = common::run_config(RunMode::Demo, temp_dir.path(), vec![image.clone()]);

    let report = expect_report(common::controller(&engine).dispatch(&config).await?);

    let calls = engine.translate_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].input, image);
    assert_eq!(calls[0].dest, temp_dir.path().join("result").join("final.png"));
    assert!(calls[0].params.overwrite);
    // The shared run configuration is left as it was
    assert!(!config.params.overwrite);
    assert!(temp_dir.path().join("result").is_dir());
    assert_eq!(report.succeeded(), 1);
    Ok(())
}

/// Test that a failing demo translation is reported, not raised
#[tokio::test]
async fn test_demo_withFailingTranslation_shouldReturnNormally() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let image = common::create_test_image(temp_dir.path(), "broken.png")?;
    let engine = MockEngine::failing_on(&["broken.png"]);
    let config = common::run_config(RunMode::Demo, temp_dir.path(), vec![image]);

    let report = expect_report(common::controller(&engine).dispatch(&config).await?);

    assert_eq!(report.failed(), 1);
    Ok(())
}
