//! Per-state intent grammar.

use std::collections::HashMap;

use zavalinka_domain::PlayerState;

use crate::intent::{
    CommandExtractorBuilder, IntentError, IntentExtractor, MatcherKind, MultiPatternExtractor,
};

/// What a message asks the orchestrator to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    DontUnderstand,
    InitCreateGame,
    InitJoinGame,
    InitSetNickname,
    SetNickname,
    CreateGame,
    JoinGame,
    Cancel,
    TakeHost,
    LeaveGame,
    WaitForHost,
    EnterProlog,
    SubmitGameText,
    WaitForOthers,
    CastVote,
}

impl Intent {
    /// Intents whose handler only replies to the sender and writes nothing.
    pub fn is_reply_only(self) -> bool {
        matches!(
            self,
            Intent::DontUnderstand | Intent::WaitForHost | Intent::WaitForOthers
        )
    }
}

const CREATE_KEYWORDS: &[&str] = &["new", "create", "новая", "новую", "начать", "создать"];
const JOIN_KEYWORDS: &[&str] = &["join", "go", "присоединиться", "играть", "го"];
const NICKNAME_KEYWORDS: &[&str] = &["nick", "name", "ник", "имя"];
const CANCEL_KEYWORDS: &[&str] = &["/cancel", "/отмена"];
const HOST_KEYWORDS: &[&str] = &["host", "ведущий", "веду"];
const LEAVE_KEYWORDS: &[&str] = &["/leave", "выйти"];

/// Keyword rules for one state, in priority order, plus its fallback.
#[derive(Debug, Clone, Default)]
pub(crate) struct Grammar {
    rules: Vec<(Intent, &'static [&'static str])>,
    default: Option<Intent>,
}

impl Grammar {
    fn fallback(intent: Intent) -> Self {
        Self {
            rules: Vec::new(),
            default: Some(intent),
        }
    }

    fn rule(mut self, intent: Intent, keywords: &'static [&'static str]) -> Self {
        self.rules.push((intent, keywords));
        self
    }
}

/// The grammar the game is played with.
pub(crate) fn grammar(state: PlayerState) -> Grammar {
    match state {
        PlayerState::Default => Grammar::fallback(Intent::DontUnderstand)
            .rule(Intent::InitCreateGame, CREATE_KEYWORDS)
            .rule(Intent::InitJoinGame, JOIN_KEYWORDS)
            .rule(Intent::InitSetNickname, NICKNAME_KEYWORDS),
        PlayerState::TypingNickname => Grammar::fallback(Intent::SetNickname),
        PlayerState::TypingTagForGameToCreate => {
            Grammar::fallback(Intent::CreateGame).rule(Intent::Cancel, CANCEL_KEYWORDS)
        }
        PlayerState::TypingTagForGameToJoin => {
            Grammar::fallback(Intent::JoinGame).rule(Intent::Cancel, CANCEL_KEYWORDS)
        }
        PlayerState::WaitingForHostToAppear => Grammar::fallback(Intent::DontUnderstand)
            .rule(Intent::TakeHost, HOST_KEYWORDS)
            .rule(Intent::LeaveGame, LEAVE_KEYWORDS),
        PlayerState::WaitingForHostToTypeProlog => {
            Grammar::fallback(Intent::WaitForHost).rule(Intent::TakeHost, HOST_KEYWORDS)
        }
        PlayerState::TypingProlog => Grammar::fallback(Intent::EnterProlog),
        PlayerState::TypingGameText => Grammar::fallback(Intent::SubmitGameText),
        PlayerState::WaitingForVotingFinish => Grammar::fallback(Intent::WaitForOthers),
        PlayerState::Voting => Grammar::fallback(Intent::CastVote),
    }
}

/// Routes `(state, text)` to an [`Intent`].
///
/// Every state gets its own compiled extractor at construction, and
/// construction fails if any state lacks a fallback, so classification of a
/// built machine never reports `NoMatch`.
pub struct SessionStateMachine {
    matcher: MatcherKind,
    extractors: HashMap<PlayerState, Box<dyn IntentExtractor<Intent>>>,
}

impl SessionStateMachine {
    pub fn new(matcher: MatcherKind) -> Result<Self, IntentError> {
        Self::with_grammar(matcher, grammar)
    }

    pub(crate) fn with_grammar(
        matcher: MatcherKind,
        grammar: impl Fn(PlayerState) -> Grammar,
    ) -> Result<Self, IntentError> {
        let mut extractors = HashMap::with_capacity(PlayerState::ALL.len());
        for state in PlayerState::ALL {
            let extractor = compile(matcher, grammar(state))?;
            if !extractor.has_default() {
                return Err(IntentError::MissingDefault(state));
            }
            extractors.insert(state, extractor);
        }
        Ok(Self {
            matcher,
            extractors,
        })
    }

    pub fn matcher(&self) -> MatcherKind {
        self.matcher
    }

    pub fn classify(&self, state: PlayerState, text: &str) -> Result<Intent, IntentError> {
        let extractor = self
            .extractors
            .get(&state)
            .ok_or(IntentError::MissingDefault(state))?;
        let intent = *extractor.extract(&text.to_lowercase())?;
        tracing::debug!(state = %state, intent = ?intent, "Classified message");
        Ok(intent)
    }
}

fn compile(
    matcher: MatcherKind,
    grammar: Grammar,
) -> Result<Box<dyn IntentExtractor<Intent>>, IntentError> {
    match matcher {
        MatcherKind::MultiPattern => {
            let mut extractor = MultiPatternExtractor::new();
            for (intent, keywords) in grammar.rules {
                extractor.add(intent, keywords);
            }
            if let Some(default) = grammar.default {
                extractor.add(default, &[]);
            }
            extractor.finalize()?;
            Ok(Box::new(extractor))
        }
        MatcherKind::WordBoundary => {
            let mut builder = CommandExtractorBuilder::new();
            for (intent, keywords) in grammar.rules {
                builder = builder.add(intent, keywords);
            }
            if let Some(default) = grammar.default {
                builder = builder.add(default, &[]);
            }
            Ok(Box::new(builder.build()?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machines() -> Vec<SessionStateMachine> {
        vec![
            SessionStateMachine::new(MatcherKind::MultiPattern).expect("grammar"),
            SessionStateMachine::new(MatcherKind::WordBoundary).expect("grammar"),
        ]
    }

    #[test]
    fn only_waiting_and_confusion_are_reply_only() {
        assert!(Intent::DontUnderstand.is_reply_only());
        assert!(Intent::WaitForHost.is_reply_only());
        assert!(Intent::WaitForOthers.is_reply_only());
        assert!(!Intent::Cancel.is_reply_only());
        assert!(!Intent::TakeHost.is_reply_only());
        assert!(!Intent::InitCreateGame.is_reply_only());
    }

    #[test]
    fn every_state_classifies_arbitrary_text() {
        for machine in machines() {
            for state in PlayerState::ALL {
                assert!(
                    machine.classify(state, "something unrelated").is_ok(),
                    "{} has no fallback under {}",
                    state,
                    machine.matcher()
                );
            }
        }
    }

    #[test]
    fn default_state_keywords() {
        for machine in machines() {
            let classify = |text| machine.classify(PlayerState::Default, text);
            assert_eq!(classify("New"), Ok(Intent::InitCreateGame));
            assert_eq!(classify("Создать игру"), Ok(Intent::InitCreateGame));
            assert_eq!(classify("join"), Ok(Intent::InitJoinGame));
            assert_eq!(classify("го"), Ok(Intent::InitJoinGame));
            assert_eq!(classify("ник"), Ok(Intent::InitSetNickname));
            assert_eq!(classify("hello"), Ok(Intent::DontUnderstand));
        }
    }

    #[test]
    fn scan_order_decides_under_multi_pattern() {
        let machine = SessionStateMachine::new(MatcherKind::MultiPattern).expect("grammar");
        // "join" occurs before "new" in the text
        assert_eq!(
            machine.classify(PlayerState::Default, "join the new one"),
            Ok(Intent::InitJoinGame)
        );
        // Literals are not word-bounded
        assert_eq!(
            machine.classify(PlayerState::Default, "ago"),
            Ok(Intent::InitJoinGame)
        );
    }

    #[test]
    fn registration_order_decides_under_word_boundary() {
        let machine = SessionStateMachine::new(MatcherKind::WordBoundary).expect("grammar");
        assert_eq!(
            machine.classify(PlayerState::Default, "join the new one"),
            Ok(Intent::InitCreateGame)
        );
        assert_eq!(
            machine.classify(PlayerState::Default, "ago"),
            Ok(Intent::DontUnderstand)
        );
    }

    #[test]
    fn tag_states_route_free_text_to_the_handler() {
        for machine in machines() {
            assert_eq!(
                machine.classify(PlayerState::TypingTagForGameToCreate, "Evening Poets"),
                Ok(Intent::CreateGame)
            );
            assert_eq!(
                machine.classify(PlayerState::TypingTagForGameToJoin, "/cancel"),
                Ok(Intent::Cancel)
            );
        }
    }

    #[test]
    fn host_keywords_are_live_while_waiting() {
        for machine in machines() {
            assert_eq!(
                machine.classify(PlayerState::WaitingForHostToAppear, "I will host"),
                Ok(Intent::TakeHost)
            );
            assert_eq!(
                machine.classify(PlayerState::WaitingForHostToAppear, "/leave"),
                Ok(Intent::LeaveGame)
            );
            assert_eq!(
                machine.classify(PlayerState::WaitingForHostToTypeProlog, "Host"),
                Ok(Intent::TakeHost)
            );
            assert_eq!(
                machine.classify(PlayerState::WaitingForHostToTypeProlog, "are we there yet"),
                Ok(Intent::WaitForHost)
            );
        }
    }

    #[test]
    fn missing_fallback_is_rejected_at_construction() {
        let result = SessionStateMachine::with_grammar(MatcherKind::MultiPattern, |state| {
            if state == PlayerState::Voting {
                Grammar::default().rule(Intent::CastVote, &["1"])
            } else {
                grammar(state)
            }
        });
        assert!(matches!(
            result,
            Err(IntentError::MissingDefault(PlayerState::Voting))
        ));
    }
}
