//! The grammar builder: the walk from a declared symbol graph to the packed
//! tables.
//!
//! [GrammarBuilder] owns everything declared for one grammar: the start
//! symbol, noise symbols, comment groups, the operator scope and the build
//! options. [build](GrammarBuilder::build) resolves and numbers the reachable
//! symbols, validates the result, runs the DFA and LALR builders and packs
//! their output. Failures never panic and never throw: the build collects
//! every error and returns the list.

mod definition;
mod packed;
mod resolve;

pub use definition::{
    GrammarDefinition, GroupDef, GroupSymbolDef, NoiseDef, ProductionDef, SymbolKind, SymbolRef,
    TerminalDef,
};
pub use packed::{GrammarProperties, GrammarSource, PackedGrammar, PackedProduction, PackedTerminal};

#[cfg(test)]
mod __tests__;

use crate::dfa::build_dfa;
use crate::error::BuildDiagnostic;
use crate::lalr::build_lalr;
use crate::rex::Rex;
use crate::symbols::{Group, NonTerminal, OperatorScope};
use crate::util::{CancellationToken, Log};
use crate::{FuserFn, TransformerFn, ValueImpl};
use once_cell::unsync::OnceCell;
use std::rc::Rc;

#[derive(Debug, Clone)]
/// Options of a grammar build.
pub struct BuildOptions {
    /// Whether tokenization distinguishes letter case. Defaults to true.
    pub case_sensitive: bool,
    /// Upper bound on the number of tokenizer DFA states.
    pub max_tokenizer_states: usize,
    /// Prefer a unique loop-free symbol over looped ones when a DFA state
    /// accepts several; this is what lets keywords win over identifiers.
    pub prioritize_fixed_length_symbols: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            max_tokenizer_states: 4096,
            prioritize_fixed_length_symbols: true,
        }
    }
}

/// The per-symbol and per-production callback tables of a built grammar.
///
/// They ride alongside the [PackedGrammar] rather than inside it: the packed
/// tables are pure data and serialize; the callbacks do not.
pub struct SemanticTables<T> {
    /// Indexed by terminal.
    pub transformers: Vec<TransformerFn<T>>,
    /// Indexed by production.
    pub fusers: Vec<FuserFn<T>>,
}

impl<T> std::fmt::Debug for SemanticTables<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticTables")
            .field("transformers", &self.transformers.len())
            .field("fusers", &self.fusers.len())
            .finish()
    }
}

/// Declarative construction of one grammar.
pub struct GrammarBuilder<T: ValueImpl> {
    name: String,
    start: Rc<NonTerminal<T>>,
    noise: Vec<(String, Rex)>,
    groups: Vec<Rc<Group<T>>>,
    operators: Option<OperatorScope>,
    options: BuildOptions,
    cancellation: CancellationToken,
    log: OnceCell<Log<&'static str>>,
}

impl<T: ValueImpl> GrammarBuilder<T> {
    pub fn new<S: Into<String>>(name: S, start: &Rc<NonTerminal<T>>) -> Self {
        Self {
            name: name.into(),
            start: start.clone(),
            noise: Vec::new(),
            groups: Vec::new(),
            operators: None,
            options: BuildOptions::default(),
            cancellation: CancellationToken::new(),
            log: OnceCell::new(),
        }
    }

    /// A symbol matched by the tokenizer and dropped before the parser.
    pub fn add_noise<S: Into<String>>(&mut self, name: S, rex: Rex) -> &mut Self {
        self.noise.push((name.into(), rex));
        self
    }

    /// Register a group that does not occur inside any production handle,
    /// usually a comment.
    pub fn add_group(&mut self, group: &Rc<Group<T>>) -> &mut Self {
        self.groups.push(group.clone());
        self
    }

    /// A noise group from `start` to the end of the line.
    pub fn add_line_comment(&mut self, start: &str) -> &mut Self {
        let comment = Rc::new(Group::line(format!("Line Comment ({})", start), start).noise());
        self.add_group(&comment)
    }

    /// A noise group between the two delimiters.
    pub fn add_block_comment(&mut self, start: &str, end: &str) -> &mut Self {
        let comment = Rc::new(
            Group::block(format!("Block Comment ({} {})", start, end), start, end).noise(),
        );
        self.add_group(&comment)
    }

    /// Attach the operator scope used to resolve shift-reduce conflicts.
    pub fn operator_scope(&mut self, scope: OperatorScope) -> &mut Self {
        self.operators = Some(scope);
        self
    }

    pub fn case_sensitive(&mut self, flag: bool) -> &mut Self {
        self.options.case_sensitive = flag;
        self
    }

    pub fn max_tokenizer_states(&mut self, cap: usize) -> &mut Self {
        self.options.max_tokenizer_states = cap;
        self
    }

    pub fn prioritize_fixed_length_symbols(&mut self, flag: bool) -> &mut Self {
        self.options.prioritize_fixed_length_symbols = flag;
        self
    }

    /// Attach a cancellation token checked at the loop heads of the DFA and
    /// LALR builders.
    pub fn cancellation_token(&mut self, token: CancellationToken) -> &mut Self {
        self.cancellation = token;
        self
    }

    /// Set a log label to debug the build.
    pub fn set_log(&self, log: Log<&'static str>) -> Result<(), String> {
        self.log
            .set(log)
            .map_err(|err| format!("Log label {} is already assigned.", err))
    }

    /// Resolve, validate, and run the table builders.
    ///
    /// A cancelled build returns `Err` with an empty list; every other
    /// failure returns the collected diagnostics of error severity.
    /// Warnings are forwarded to the log and never fail the build.
    pub fn build(self) -> Result<(PackedGrammar, SemanticTables<T>), Vec<BuildDiagnostic>> {
        let log = self.log.get().copied().unwrap_or(Log::None);
        let (definition, tables, warnings) = resolve::resolve(
            &self.name,
            &self.start,
            &self.noise,
            &self.groups,
            self.operators.as_ref(),
            &self.options,
        )?;

        for warning in &warnings {
            forward_warning(&log, warning);
        }

        let mut errors: Vec<BuildDiagnostic> = Vec::new();

        let dfa = match build_dfa(&definition, &self.options, &self.cancellation) {
            Ok(dfa) => Some(dfa),
            Err(diagnostics) => {
                if diagnostics.is_empty() {
                    // Cancelled: return immediately with no diagnostics.
                    return Err(Vec::new());
                }
                errors.extend(diagnostics);
                None
            }
        };

        let lalr = match build_lalr(&definition, &self.cancellation) {
            Ok(table) => Some(table),
            Err(diagnostics) => {
                if diagnostics.is_empty() {
                    return Err(Vec::new());
                }
                errors.extend(diagnostics);
                None
            }
        };

        let (dfa, lalr) = match (dfa, lalr) {
            (Some(dfa), Some(lalr)) if errors.is_empty() => (dfa, lalr),
            _ => return Err(errors),
        };

        let packed = packed::pack(definition, dfa, lalr);

        #[cfg(debug_assertions)]
        if log.order() >= Log::Success(()).order() {
            println!(
                "[{}; GrammarBuild]: {} terminals, {} productions, {} DFA states, {} LALR states",
                log,
                packed.terminals.len(),
                packed.productions.len(),
                packed.dfa.len(),
                packed.lalr.len()
            );
        }

        Ok((packed, tables))
    }
}

fn forward_warning(log: &Log<&'static str>, warning: &BuildDiagnostic) {
    #[cfg(debug_assertions)]
    if log.order() >= Log::Default(()).order() {
        println!("[{}; GrammarWarning]: {}", log, warning);
    }
    #[cfg(not(debug_assertions))]
    {
        let _ = (log, warning);
    }
}
