//! Regex-group extractor.

use regex::{RegexSet, RegexSetBuilder};

use super::IntentError;

/// Collects `(value, keywords)` rules in priority order.
///
/// ```
/// use zavalinka_engine::intent::CommandExtractorBuilder;
///
/// let extractor = CommandExtractorBuilder::new()
///     .add(1, &["1", "one"])
///     .add(2, &["2", "two"])
///     .add(0, &[])
///     .build()
///     .unwrap();
///
/// assert_eq!(extractor.extract("tWo"), Ok(&2));
/// assert_eq!(extractor.extract("oone two13"), Ok(&0));
/// ```
#[derive(Debug, Clone)]
pub struct CommandExtractorBuilder<T> {
    patterns: Vec<String>,
    values: Vec<T>,
    default_value: Option<T>,
}

impl<T> CommandExtractorBuilder<T> {
    pub fn new() -> Self {
        Self {
            patterns: Vec::new(),
            values: Vec::new(),
            default_value: None,
        }
    }

    /// Register `value` for any of `keywords`, or as the default if `keywords`
    /// holds no non-empty keyword. A later default replaces an earlier one.
    pub fn add(mut self, value: T, keywords: &[&str]) -> Self {
        let alternation = keywords
            .iter()
            .filter(|k| !k.is_empty())
            .map(|k| word_bounded(k))
            .collect::<Vec<_>>();
        if alternation.is_empty() {
            self.default_value = Some(value);
        } else {
            self.patterns.push(format!("(?:{})", alternation.join("|")));
            self.values.push(value);
        }
        self
    }

    /// Compile every group into one case-insensitive matcher.
    pub fn build(self) -> Result<CommandExtractor<T>, IntentError> {
        let set = if self.patterns.is_empty() {
            None
        } else {
            let set = RegexSetBuilder::new(&self.patterns)
                .case_insensitive(true)
                .build()
                .map_err(|e| IntentError::Build(e.to_string()))?;
            Some(set)
        };

        Ok(CommandExtractor {
            set,
            values: self.values,
            default_value: self.default_value,
        })
    }
}

impl<T> Default for CommandExtractorBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape `keyword` and anchor it on word boundaries.
///
/// A boundary is only required on a side that ends in a word character, so
/// keywords like `/cancel` still match at the start of the text.
fn word_bounded(keyword: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let head = if keyword.starts_with(is_word) { r"\b" } else { "" };
    let tail = if keyword.ends_with(is_word) { r"\b" } else { "" };
    format!("{}{}{}", head, regex::escape(keyword), tail)
}

/// Compiled regex-group extractor.
///
/// Registration order is priority order: when several groups match, the one
/// registered first wins no matter where its keyword sits in the text.
#[derive(Debug, Clone)]
pub struct CommandExtractor<T> {
    set: Option<RegexSet>,
    values: Vec<T>,
    default_value: Option<T>,
}

impl<T> CommandExtractor<T> {
    pub fn extract(&self, text: &str) -> Result<&T, IntentError> {
        let matched = self
            .set
            .as_ref()
            .and_then(|set| set.matches(text).into_iter().next());

        match matched {
            Some(index) => self.values.get(index).ok_or(IntentError::NoMatch),
            None => self.default_value.as_ref().ok_or(IntentError::NoMatch),
        }
    }

    pub fn has_default(&self) -> bool {
        self.default_value.is_some()
    }
}
