/*!
 * Tests for dictionary file loading and application
 */

use anyhow::Result;

use mangadispatch::dictionary::{Dictionary, DictionaryPair};
use mangadispatch::errors::DictionaryError;
use crate::common;

/// Test a realistic post-translation dictionary file
#[test]
fn test_load_withDictionaryFile_shouldApplyRulesInOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "post_dict.txt",
        "\
# Normalize honorifics
(\\w+)-san \\1   // drop -san
Senpai senpai
\\.\\.\\. …
",
    )?;

    let dictionary = Dictionary::load(Some(path.as_path()))?;

    assert_eq!(dictionary.len(), 3);
    assert_eq!(
        dictionary.apply("Tanaka-san... Senpai!"),
        "Tanaka… senpai!"
    );
    Ok(())
}

/// Test that a dictionary file with only comments is empty
#[test]
fn test_load_withOnlyComments_shouldBeEmpty() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "dict.txt", "# nothing\n// here\n\n")?;

    let dictionary = Dictionary::load(Some(path.as_path()))?;

    assert!(dictionary.is_empty());
    assert_eq!(dictionary.apply("keep me"), "keep me");
    Ok(())
}

/// Test that the two dictionaries of a run load independently
#[test]
fn test_dictionaryPair_load_shouldKeepPreAndPostApart() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let pre = common::create_test_file(temp_dir.path(), "pre.txt", "ﾙﾌｨ ルフィ\n")?;

    let pair = DictionaryPair::load(Some(pre.as_path()), None)?;

    assert_eq!(pair.pre.len(), 1);
    assert!(pair.post.is_empty());
    assert_eq!(pair.pre.apply("ﾙﾌｨ!"), "ルフィ!");
    Ok(())
}

/// Test that a missing dictionary file is an error naming the path
#[test]
fn test_dictionaryPair_load_withMissingFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let missing = temp_dir.path().join("missing.txt");

    let error = DictionaryPair::load(None, Some(missing.as_path())).unwrap_err();

    assert!(matches!(error, DictionaryError::Read { .. }));
    assert!(error.to_string().contains("missing.txt"));
    Ok(())
}

/// Test that a second apply call runs every rule again on the substituted text
#[test]
fn test_apply_twice_withGrowingReplacement_shouldRewriteAgain() {
    let cycle = Dictionary::parse("a b\nb c\nc a\n").unwrap();
    assert_eq!(cycle.apply("a"), "a");

    let growing = Dictionary::parse("x xy\n").unwrap();
    let once = growing.apply("x");
    assert_eq!(once, "xy");
    assert_eq!(growing.apply(&once), "xyy");
}

/// Test that entries with too many fields are skipped with their text kept
#[test]
fn test_load_withTooManyFields_shouldRecordSkippedEntryText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "pre.txt",
        "ok fine\nthree fields here # note\n",
    )?;

    let dictionary = Dictionary::load(Some(path.as_path()))?;

    assert_eq!(dictionary.len(), 1);
    assert_eq!(dictionary.skipped().len(), 1);
    assert_eq!(dictionary.skipped()[0].line, 2);
    assert_eq!(dictionary.skipped()[0].text, "three fields here");
    Ok(())
}

/// Test that a file rule with escapes produces real newlines and backslashes
#[test]
fn test_load_withEscapedReplacement_shouldExpandEscapes() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "post.txt", "<br> \\n\nyen \\\\\n")?;

    let dictionary = Dictionary::load(Some(path.as_path()))?;

    assert_eq!(dictionary.apply("one<br>two yen"), "one\ntwo \\");
    Ok(())
}
