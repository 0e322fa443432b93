//! Intent extraction.
//!
//! Classifies a raw chat utterance into a value (usually a handler id) from a
//! prioritized set of keyword rules. Two strategies share one shape of input:
//!
//! - [`CommandExtractor`] - case-insensitive, word-bounded regex groups; the
//!   first *registered* group that matches anywhere in the text wins.
//! - [`MultiPatternExtractor`] - Aho-Corasick scan over raw literals; the first
//!   match found scanning left to right wins.
//!
//! Registering a value with no keywords makes it the default, returned when no
//! rule fires. Without a default, a miss is [`IntentError::NoMatch`].

mod command_extractor;
mod multi_pattern;

pub use command_extractor::{CommandExtractor, CommandExtractorBuilder};
pub use multi_pattern::MultiPatternExtractor;

use std::fmt;
use std::str::FromStr;

use zavalinka_domain::PlayerState;

/// The classification contract shared by both strategies.
pub trait IntentExtractor<T>: Send + Sync {
    /// Classify `text`, falling back to the default value.
    fn extract(&self, text: &str) -> Result<&T, IntentError>;

    /// Whether a miss resolves to a default instead of `NoMatch`.
    fn has_default(&self) -> bool;
}

impl<T: Send + Sync> IntentExtractor<T> for CommandExtractor<T> {
    fn extract(&self, text: &str) -> Result<&T, IntentError> {
        CommandExtractor::extract(self, text)
    }

    fn has_default(&self) -> bool {
        CommandExtractor::has_default(self)
    }
}

impl<T: Send + Sync> IntentExtractor<T> for MultiPatternExtractor<T> {
    fn extract(&self, text: &str) -> Result<&T, IntentError> {
        MultiPatternExtractor::extract(self, text)
    }

    fn has_default(&self) -> bool {
        MultiPatternExtractor::has_default(self)
    }
}

/// Which extractor strategy a grammar is compiled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatcherKind {
    /// [`MultiPatternExtractor`] over lower-cased input
    #[default]
    MultiPattern,
    /// [`CommandExtractor`] with word-bounded keywords
    WordBoundary,
}

impl MatcherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatcherKind::MultiPattern => "multi_pattern",
            MatcherKind::WordBoundary => "word_boundary",
        }
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatcherKind {
    type Err = IntentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "multi_pattern" | "aho_corasick" => Ok(Self::MultiPattern),
            "word_boundary" | "regex" => Ok(Self::WordBoundary),
            other => Err(IntentError::Build(format!("unknown matcher kind: {}", other))),
        }
    }
}

/// Errors from building or running an extractor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntentError {
    /// No rule matched and no default value was registered.
    #[error("No rule matched and no default value is registered")]
    NoMatch,

    /// A multi-pattern extractor was used before `finalize()`.
    #[error("Extractor has unfinalized patterns")]
    NotFinalized,

    /// A session state was left without a fallback handler.
    #[error("No default handler registered for state {0}")]
    MissingDefault(PlayerState),

    /// Pattern compilation failed.
    #[error("Failed to compile patterns: {0}")]
    Build(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(extractor: &dyn IntentExtractor<i32>, text: &str) -> Result<i32, IntentError> {
        extractor.extract(text).copied()
    }

    #[test]
    fn both_strategies_share_the_contract() {
        let regex = CommandExtractorBuilder::new()
            .add(1, &["one"])
            .add(0, &[])
            .build()
            .expect("valid");
        let mut scan = MultiPatternExtractor::with_default(0);
        scan.add(1, &["one"]).finalize().expect("valid");

        let extractors: [&dyn IntentExtractor<i32>; 2] = [&regex, &scan];
        for extractor in extractors {
            assert_eq!(classify(extractor, "one"), Ok(1));
            assert_eq!(classify(extractor, "zero"), Ok(0));
            assert!(extractor.has_default());
        }
    }

    #[test]
    fn matcher_kind_parses_aliases() {
        assert_eq!("regex".parse::<MatcherKind>(), Ok(MatcherKind::WordBoundary));
        assert_eq!(
            " Multi_Pattern ".parse::<MatcherKind>(),
            Ok(MatcherKind::MultiPattern)
        );
        assert!("fuzzy".parse::<MatcherKind>().is_err());
    }
}
