use crate::util::Position;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
/// Severity of a build diagnostic.
pub enum Severity {
    Verbose,
    Debug,
    Information,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The closed set of structured messages a grammar build can produce.
pub enum BuildMessage {
    /// A nonterminal reachable from the start symbol has no productions.
    EmptyNonterminal(String),
    /// Two productions of the same head have identical handles.
    DuplicateProduction { head: String, handle: Vec<String> },
    /// A special symbol name (such as `NewLine`) was declared twice.
    DuplicateSpecialName(String),
    /// A tokenizer symbol's regex matches the empty string.
    NullableSymbol(String),
    /// The DFA cannot separate the named symbols.
    IndistinguishableSymbols(Vec<String>),
    /// A conflict the LALR builder could not resolve.
    LrConflict {
        kind: LrConflictKind,
        state: usize,
        /// The conflicting terminal name, or [None] for end of input.
        terminal: Option<String>,
        items: Vec<String>,
    },
    /// The tokenizer automaton exceeded the configured state cap.
    DfaStateLimitExceeded(usize),
    /// A regex contains a `Void` term which can never take part in a match.
    RegexContainsVoid(String),
    /// A regex as a whole cannot match any input.
    RegexUnmatchable(String),
    /// Free-form notices without a stable code.
    Notice(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LrConflictKind {
    ShiftReduce,
    ReduceReduce,
    AcceptReduce,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A diagnostic collected while building a grammar.
///
/// Builds never throw; every problem is collected and the whole list is
/// returned once the build finishes. Warnings are additionally forwarded to
/// the builder's log.
pub struct BuildDiagnostic {
    pub severity: Severity,
    pub message: BuildMessage,
}

impl BuildDiagnostic {
    pub fn error(message: BuildMessage) -> Self {
        Self {
            severity: Severity::Error,
            message,
        }
    }

    pub fn warning(message: BuildMessage) -> Self {
        Self {
            severity: Severity::Warning,
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity >= Severity::Error
    }

    /// Stable identifier of the message, if it carries one.
    pub fn code(&self) -> Option<&'static str> {
        match &self.message {
            BuildMessage::EmptyNonterminal(_) => Some("EmptyNonterminal"),
            BuildMessage::DuplicateProduction { .. } => Some("DuplicateProduction"),
            BuildMessage::DuplicateSpecialName(_) => Some("DuplicateSpecialName"),
            BuildMessage::NullableSymbol(_) => Some("NullableSymbol"),
            BuildMessage::IndistinguishableSymbols(_) => Some("IndistinguishableSymbols"),
            BuildMessage::LrConflict { .. } => Some("LrConflict"),
            BuildMessage::DfaStateLimitExceeded(_) => Some("DfaStateLimitExceeded"),
            BuildMessage::RegexContainsVoid(_) => Some("RegexContainsVoid"),
            BuildMessage::RegexUnmatchable(_) => Some("RegexUnmatchable"),
            BuildMessage::Notice(_) => None,
        }
    }
}

impl Display for LrConflictKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LrConflictKind::ShiftReduce => write!(f, "shift-reduce"),
            LrConflictKind::ReduceReduce => write!(f, "reduce-reduce"),
            LrConflictKind::AcceptReduce => write!(f, "accept-reduce"),
        }
    }
}

impl Display for BuildDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            BuildMessage::EmptyNonterminal(name) => {
                write!(f, "Nonterminal <{}> has no productions.", name)
            }
            BuildMessage::DuplicateProduction { head, handle } => {
                write!(f, "Duplicate production <{}> ::=", head)?;
                for member in handle {
                    write!(f, " {}", member)?;
                }
                Ok(())
            }
            BuildMessage::DuplicateSpecialName(name) => {
                write!(f, "The special name {} is declared more than once.", name)
            }
            BuildMessage::NullableSymbol(name) => {
                write!(f, "The regex of {} can match the empty string.", name)
            }
            BuildMessage::IndistinguishableSymbols(names) => {
                write!(f, "The tokenizer cannot distinguish ")?;
                for (index, name) in names.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", name)?;
                }
                write!(f, ".")
            }
            BuildMessage::LrConflict {
                kind,
                state,
                terminal,
                items,
            } => {
                write!(f, "LALR {} conflict in state {} on ", kind, state)?;
                match terminal {
                    Some(name) => write!(f, "{}", name)?,
                    None => write!(f, "end of input")?,
                }
                for item in items {
                    write!(f, "; {}", item)?;
                }
                Ok(())
            }
            BuildMessage::DfaStateLimitExceeded(max) => {
                write!(f, "The tokenizer needs more than {} DFA states.", max)
            }
            BuildMessage::RegexContainsVoid(name) => {
                write!(f, "The regex of {} contains a void term.", name)
            }
            BuildMessage::RegexUnmatchable(name) => {
                write!(f, "The regex of {} cannot match anything.", name)
            }
            BuildMessage::Notice(text) => write!(f, "{}", text),
        }
    }
}

#[derive(Debug)]
/// An error to indicate failure of a parse session.
///
/// Exactly one terminal diagnostic is observed per session; the position
/// carries 1-based line and column and the 0-based character index.
pub struct ParserDiagnostic {
    pub position: Position,
    pub kind: ParseErrorKind,
}

#[derive(Debug)]
pub enum ParseErrorKind {
    /// The tokenizer found no acceptable symbol; carries the offending
    /// lexeme (abbreviated), the DFA state it stalled in, and the tokens the
    /// parser would have accepted, filled in by the driver before the error
    /// surfaces.
    LexicalError {
        token_text: String,
        tokenizer_state: usize,
        expected_tokens: Vec<String>,
    },
    /// Input ended while a lexical group was still open.
    UnexpectedEndOfInputInGroup { group_name: String },
    /// The parser rejected a token; `actual` is [None] at end of input.
    SyntaxError {
        actual: Option<String>,
        expected: Vec<String>,
        parser_state: usize,
    },
    /// An error value raised by a user-supplied semantic callback.
    UserDiagnostic(Box<dyn std::error::Error>),
}

impl ParserDiagnostic {
    pub fn new(position: Position, kind: ParseErrorKind) -> Self {
        Self { position, kind }
    }

    pub fn is_syntax_error(&self) -> bool {
        matches!(self.kind, ParseErrorKind::SyntaxError { .. })
    }
}

impl Display for ParserDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ParseErrorKind::LexicalError { token_text, .. } => {
                write!(
                    f,
                    "LexicalError: unexpected '{}' at {}",
                    token_text, self.position
                )
            }
            ParseErrorKind::UnexpectedEndOfInputInGroup { group_name } => {
                write!(
                    f,
                    "GroupError: input ended inside {} at {}",
                    group_name, self.position
                )
            }
            ParseErrorKind::SyntaxError {
                actual, expected, ..
            } => {
                write!(f, "SyntaxError: found ")?;
                match actual {
                    Some(name) => write!(f, "{}", name)?,
                    None => write!(f, "end of input")?,
                }
                write!(f, " at {}; expected ", self.position)?;
                for (index, name) in expected.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", name)?;
                }
                Ok(())
            }
            ParseErrorKind::UserDiagnostic(err) => {
                write!(f, "SemanticError: {} at {}", err, self.position)
            }
        }
    }
}

impl std::error::Error for ParserDiagnostic {}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Errors raised while reading a packed grammar stream.
pub enum FormatError {
    InvalidMagic,
    UnsupportedVersion(u16),
    TruncatedRecord,
    UnknownEntryTag(u8),
    /// The stream decoded, but its contents are not a valid grammar.
    MalformedGrammar(String),
}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::InvalidMagic => write!(f, "The stream is not a packed grammar."),
            FormatError::UnsupportedVersion(version) => {
                write!(f, "Unsupported packed grammar version {}.", version)
            }
            FormatError::TruncatedRecord => write!(f, "The packed grammar ends mid-record."),
            FormatError::UnknownEntryTag(tag) => {
                write!(f, "Unknown entry tag {:#04x} in a packed grammar record.", tag)
            }
            FormatError::MalformedGrammar(what) => {
                write!(f, "Malformed packed grammar: {}", what)
            }
        }
    }
}

impl std::error::Error for FormatError {}
