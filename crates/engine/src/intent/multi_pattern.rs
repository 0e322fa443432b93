//! Multi-pattern (Aho-Corasick) extractor.

use aho_corasick::{AhoCorasick, MatchKind};

use super::IntentError;

/// Literal-pattern extractor backed by an Aho-Corasick automaton.
///
/// Patterns are not word-bounded and are matched case-sensitively; callers
/// lower-case the input (and register lower-case patterns) when they want
/// case-insensitivity. The first match reported by a left-to-right scan wins,
/// so `"one, two"` resolves to the value of `one` whatever the registration
/// order.
///
/// Patterns must be compiled with [`finalize`](Self::finalize) before use.
#[derive(Debug, Clone)]
pub struct MultiPatternExtractor<T> {
    patterns: Vec<String>,
    values: Vec<T>,
    default_value: Option<T>,
    automaton: Option<AhoCorasick>,
}

impl<T> MultiPatternExtractor<T> {
    pub fn new() -> Self {
        Self {
            patterns: Vec::new(),
            values: Vec::new(),
            default_value: None,
            automaton: None,
        }
    }

    pub fn with_default(default_value: T) -> Self {
        Self {
            default_value: Some(default_value),
            ..Self::new()
        }
    }

    /// Register `value` for each of `patterns`, or as the default if
    /// `patterns` holds no non-empty pattern.
    ///
    /// Re-registering a pattern rebinds it to the new value. Adding patterns
    /// after `finalize` requires finalizing again.
    pub fn add(&mut self, value: T, patterns: &[&str]) -> &mut Self
    where
        T: Clone,
    {
        if patterns.iter().all(|p| p.is_empty()) {
            self.default_value = Some(value);
            return self;
        }

        for pattern in patterns.iter().filter(|p| !p.is_empty()) {
            match self.patterns.iter().position(|p| p == pattern) {
                Some(index) => self.values[index] = value.clone(),
                None => {
                    self.patterns.push((*pattern).to_string());
                    self.values.push(value.clone());
                }
            }
            self.automaton = None;
        }
        self
    }

    /// Compile the registered patterns into the scan automaton.
    ///
    /// Calling this again without new patterns is a no-op.
    pub fn finalize(&mut self) -> Result<&mut Self, IntentError> {
        if self.automaton.is_none() && !self.patterns.is_empty() {
            let automaton = AhoCorasick::builder()
                .match_kind(MatchKind::Standard)
                .build(&self.patterns)
                .map_err(|e| IntentError::Build(e.to_string()))?;
            self.automaton = Some(automaton);
        }
        Ok(self)
    }

    pub fn is_finalized(&self) -> bool {
        self.patterns.is_empty() || self.automaton.is_some()
    }

    pub fn has_default(&self) -> bool {
        self.default_value.is_some()
    }

    pub fn extract(&self, text: &str) -> Result<&T, IntentError> {
        if self.patterns.is_empty() {
            return self.default_value.as_ref().ok_or(IntentError::NoMatch);
        }

        let automaton = self.automaton.as_ref().ok_or(IntentError::NotFinalized)?;

        match automaton.find(text) {
            Some(found) => self
                .values
                .get(found.pattern().as_usize())
                .ok_or(IntentError::NoMatch),
            None => self.default_value.as_ref().ok_or(IntentError::NoMatch),
        }
    }
}

impl<T> Default for MultiPatternExtractor<T> {
    fn default() -> Self {
        Self::new()
    }
}
