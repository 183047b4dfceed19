/*!
 * Substitution dictionaries applied around translation.
 *
 * A dictionary is an ordered list of `pattern replacement` rules. The
 * pre-translation dictionary rewrites recognized source text, the
 * post-translation dictionary rewrites the translated text.
 *
 * File format, one rule per line:
 * - blank lines and lines starting with `#` or `//` are ignored
 * - anything after `#` or `//` on a line is a comment
 * - `pattern` alone deletes every match
 * - `pattern replacement` replaces every match
 *
 * Patterns are regular expressions. Replacements may refer to groups as
 * `\1` or `\g<name>`, and accept the `\\`, `\n`, `\t` and `\r` escapes.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::Path;

use crate::errors::DictionaryError;

static REPLACEMENT_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\\g<(\w+)>|\\(\d{1,2})|\\(.)|\$").expect("valid regex")
});

/// A single substitution rule
#[derive(Debug, Clone)]
pub struct DictionaryRule {
    pattern: Regex,
    replacement: String,
}

impl DictionaryRule {
    /// Compile a rule; `replacement` uses `\1` style group references
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: Self::convert_replacement(replacement),
        })
    }

    /// Source of the matcher
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Replacement in `regex` crate syntax
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Replace every match of this rule in `text`
    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, self.replacement.as_str())
            .into_owned()
    }

    // Single pass, so `\\1` stays a backslash followed by `1`
    fn convert_replacement(replacement: &str) -> String {
        REPLACEMENT_TOKEN
            .replace_all(replacement, |caps: &Captures| {
                if let Some(group) = caps.get(1).or_else(|| caps.get(2)) {
                    return format!("${{{}}}", group.as_str());
                }
                match caps.get(3).map(|m| m.as_str()) {
                    Some("n") => "\n".to_string(),
                    Some("t") => "\t".to_string(),
                    Some("r") => "\r".to_string(),
                    Some("\\") => "\\".to_string(),
                    Some("$") => "\\$$".to_string(),
                    Some(other) => format!("\\{}", other),
                    None => "$$".to_string(),
                }
            })
            .into_owned()
    }
}

/// Ordered, immutable list of substitution rules
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    rules: Vec<DictionaryRule>,
    skipped: Vec<SkippedEntry>,
}

/// Dictionary line that was ignored because it has more than two fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// 1-based line number
    pub line: usize,
    /// Entry text without comments
    pub text: String,
}

impl Dictionary {
    /// Dictionary that leaves text untouched
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a dictionary from already compiled rules
    pub fn from_rules(rules: Vec<DictionaryRule>) -> Self {
        Self {
            rules,
            skipped: Vec::new(),
        }
    }

    /// Load a dictionary file; no path yields an empty dictionary
    pub fn load(source: Option<&Path>) -> Result<Self, DictionaryError> {
        let Some(path) = source else {
            return Ok(Self::empty());
        };

        let content = std::fs::read_to_string(path).map_err(|e| DictionaryError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parse dictionary text in the file format described at module level
    pub fn parse(content: &str) -> Result<Self, DictionaryError> {
        let mut dictionary = Self::empty();

        for (index, raw_line) in content.lines().enumerate() {
            let line_number = index + 1;
            let trimmed = raw_line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
                continue;
            }

            let without_hash = trimmed.split('#').next().unwrap_or_default().trim();
            let line = without_hash.split("//").next().unwrap_or_default().trim();
            let parts: Vec<&str> = line.split_whitespace().collect();

            let (pattern, replacement) = match parts.as_slice() {
                [] => continue,
                [pattern] => (*pattern, ""),
                [pattern, replacement] => (*pattern, *replacement),
                _ => {
                    dictionary.skipped.push(SkippedEntry {
                        line: line_number,
                        text: line.to_string(),
                    });
                    continue;
                }
            };

            let rule = DictionaryRule::new(pattern, replacement).map_err(|e| {
                DictionaryError::Pattern {
                    line: line_number,
                    message: e.to_string(),
                }
            })?;
            dictionary.rules.push(rule);
        }

        Ok(dictionary)
    }

    /// Apply every rule once, in order, each to the output of the previous one
    pub fn apply(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, rule| rule.apply(&acc))
    }

    /// Rules in declaration order
    pub fn rules(&self) -> &[DictionaryRule] {
        &self.rules
    }

    /// Entries with more than two fields, in file order
    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// The two dictionaries of a run, shared read-only by every batch item
#[derive(Debug, Clone, Default)]
pub struct DictionaryPair {
    /// Applied to recognized source text
    pub pre: Dictionary,
    /// Applied to translated text
    pub post: Dictionary,
}

impl DictionaryPair {
    /// Load both dictionaries; a missing path yields an empty dictionary
    pub fn load(pre: Option<&Path>, post: Option<&Path>) -> Result<Self, DictionaryError> {
        Ok(Self {
            pre: Dictionary::load(pre)?,
            post: Dictionary::load(post)?,
        })
    }
}
