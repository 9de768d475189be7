use super::definition::{
    GrammarDefinition, GroupDef, GroupSymbolDef, NoiseDef, ProductionDef, SymbolKind, SymbolRef,
    TerminalDef,
};
use super::{BuildOptions, SemanticTables};
use crate::error::{BuildDiagnostic, BuildMessage};
use crate::rex::{LowerContext, Rex};
use crate::symbols::{
    GrammarSymbol, Group, GroupEnd, NonTerminal, OperatorScope, Terminal, VirtualTerminal,
};
use crate::{TransformerFn, ValueImpl};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

/// The reserved name of the shared line-group end symbol.
const NEWLINE: &str = "NewLine";

/// Walk the symbol graph from the start nonterminal, number everything
/// reachable, resolve literals and validate the result.
///
/// Returns the lowered definition, the semantic tables and the collected
/// warnings, or the list of errors.
pub(super) fn resolve<T: ValueImpl>(
    name: &str,
    start: &Rc<NonTerminal<T>>,
    noise: &[(String, Rex)],
    registered_groups: &[Rc<Group<T>>],
    operators: Option<&OperatorScope>,
    options: &BuildOptions,
) -> Result<
    (GrammarDefinition, SemanticTables<T>, Vec<BuildDiagnostic>),
    Vec<BuildDiagnostic>,
> {
    let mut errors: Vec<BuildDiagnostic> = Vec::new();
    let mut warnings: Vec<BuildDiagnostic> = Vec::new();

    // Reachability walk. Registered groups (comments) take part even though
    // no production handle mentions them.
    let mut terminals: Vec<Rc<Terminal<T>>> = Vec::new();
    let mut virtuals: Vec<Rc<VirtualTerminal>> = Vec::new();
    let mut nonterminals: Vec<Rc<NonTerminal<T>>> = Vec::new();
    let mut groups: Vec<Rc<Group<T>>> = Vec::new();
    {
        let mut visited: HashSet<usize> = HashSet::new();
        let mut queue: VecDeque<GrammarSymbol<T>> = VecDeque::new();
        queue.push_back(GrammarSymbol::NonTerminal(start.clone()));
        for group in registered_groups {
            queue.push_back(GrammarSymbol::Group(group.clone()));
        }
        while let Some(symbol) = queue.pop_front() {
            if !visited.insert(symbol.identity()) {
                continue;
            }
            match symbol {
                GrammarSymbol::Terminal(t) => terminals.push(t),
                GrammarSymbol::Virtual(v) => virtuals.push(v),
                GrammarSymbol::Group(g) => groups.push(g),
                GrammarSymbol::NonTerminal(n) => {
                    if let Some(productions) = n.productions() {
                        for production in productions {
                            for member in production.members() {
                                queue.push_back(member.clone());
                            }
                        }
                    }
                    nonterminals.push(n);
                }
            }
        }
    }

    // Number terminals, resolving literals by text. Two literals with equal
    // text (compared under the grammar case flag) are the same symbol.
    let mut symbol_of: HashMap<usize, SymbolRef> = HashMap::new();
    let mut terminal_defs: Vec<TerminalDef> = Vec::new();
    let mut transformers: Vec<TransformerFn<T>> = Vec::new();
    {
        let mut literal_index: HashMap<String, u32> = HashMap::new();
        for terminal in &terminals {
            let identity = Rc::as_ptr(terminal) as usize;
            if let Some(text) = terminal.literal_text() {
                let key = if options.case_sensitive {
                    text.to_string()
                } else {
                    text.to_lowercase()
                };
                if let Some(existing) = literal_index.get(&key) {
                    symbol_of.insert(identity, SymbolRef::terminal(*existing));
                    continue;
                }
                literal_index.insert(key, terminal_defs.len() as u32);
            }
            let index = terminal_defs.len() as u32;
            symbol_of.insert(identity, SymbolRef::terminal(index));
            terminal_defs.push(TerminalDef {
                name: terminal.name().to_string(),
                rex: None, // lowered below
                hidden: terminal.options().hidden,
                precedence: None,
            });
            transformers.push(terminal.transformer().clone());
        }
    }

    let mut noise_defs: Vec<NoiseDef> = noise
        .iter()
        .map(|(name, _)| NoiseDef {
            name: name.clone(),
            rex: None,
        })
        .collect();

    let mut virtual_defs: Vec<String> = Vec::new();
    for v in &virtuals {
        symbol_of.insert(
            Rc::as_ptr(v) as usize,
            SymbolRef::new(SymbolKind::Virtual, virtual_defs.len() as u32),
        );
        virtual_defs.push(v.name().to_string());
    }

    let nonterminal_defs: Vec<String> = nonterminals
        .iter()
        .map(|n| n.name().to_string())
        .collect();
    for (index, n) in nonterminals.iter().enumerate() {
        symbol_of.insert(
            Rc::as_ptr(n) as usize,
            SymbolRef::nonterminal(index as u32),
        );
    }

    // Group numbering: container symbols, start symbols and end symbols.
    let mut group_start_defs: Vec<(Rex, String)> = Vec::new();
    let mut group_end_defs: Vec<(Rex, String)> = Vec::new();
    let mut group_defs: Vec<GroupDef> = Vec::new();
    let mut newline_noise: Option<u32> = None;
    {
        let mut start_rexes: HashSet<Rex> = HashSet::new();
        let mut group_index_of_name: HashMap<String, u32> = HashMap::new();
        for group in &groups {
            let group_index = group_defs.len() as u32;
            group_index_of_name.insert(group.name().to_string(), group_index);

            let container = if group.attributes().is_noise {
                let index = noise_defs.len() as u32;
                noise_defs.push(NoiseDef {
                    name: group.name().to_string(),
                    rex: None,
                });
                SymbolRef::new(SymbolKind::Noise, index)
            } else {
                let index = terminal_defs.len() as u32;
                terminal_defs.push(TerminalDef {
                    name: group.name().to_string(),
                    rex: None,
                    hidden: false,
                    precedence: None,
                });
                transformers.push(group.transformer().clone());
                SymbolRef::terminal(index)
            };
            symbol_of.insert(Rc::as_ptr(group) as usize, container);

            if !start_rexes.insert(group.start_rex().clone()) {
                errors.push(BuildDiagnostic::error(BuildMessage::DuplicateSpecialName(
                    format!("{} Start", group.name()),
                )));
            }
            let start = SymbolRef::new(SymbolKind::GroupStart, group_start_defs.len() as u32);
            group_start_defs.push((
                group.start_rex().clone(),
                format!("{} Start", group.name()),
            ));

            let end = match group.end() {
                GroupEnd::Rex(rex) => {
                    match group_end_defs.iter().position(|(existing, _)| existing == rex) {
                        // End symbols may be shared across groups.
                        Some(existing) => {
                            SymbolRef::new(SymbolKind::GroupEnd, existing as u32)
                        }
                        None => {
                            let index = group_end_defs.len() as u32;
                            group_end_defs
                                .push((rex.clone(), format!("{} End", group.name())));
                            SymbolRef::new(SymbolKind::GroupEnd, index)
                        }
                    }
                }
                GroupEnd::NewLine => {
                    let index = match newline_noise {
                        Some(index) => index,
                        None => {
                            let index = noise_defs.len() as u32;
                            noise_defs.push(NoiseDef {
                                name: NEWLINE.to_string(),
                                rex: None,
                            });
                            newline_noise = Some(index);
                            index
                        }
                    };
                    SymbolRef::new(SymbolKind::Noise, index)
                }
            };

            group_defs.push(GroupDef {
                name: group.name().to_string(),
                container,
                start,
                end,
                attributes: group.attributes(),
                nesting: Vec::new(), // resolved below, once all names exist
            });
        }

        for (index, group) in groups.iter().enumerate() {
            let mut nesting: Vec<u32> = Vec::new();
            for nested in group.nested_names() {
                match group_index_of_name.get(&nested) {
                    Some(target) => nesting.push(*target),
                    None => errors.push(BuildDiagnostic::error(BuildMessage::Notice(format!(
                        "Group {} allows unknown group {} to nest.",
                        group.name(),
                        nested
                    )))),
                }
            }
            nesting.sort();
            nesting.dedup();
            group_defs[index].nesting = nesting;
        }
    }

    // Name uniqueness within each kind.
    check_names(
        terminal_defs.iter().map(|t| t.name.as_str()),
        &mut errors,
    );
    check_names(noise_defs.iter().map(|n| n.name.as_str()), &mut errors);
    check_names(nonterminal_defs.iter().map(|n| n.as_str()), &mut errors);
    check_names(virtual_defs.iter().map(|v| v.as_str()), &mut errors);
    check_names(group_defs.iter().map(|g| g.name.as_str()), &mut errors);

    // Productions: numbering, duplicate detection, precedence, fusers.
    let mut production_defs: Vec<ProductionDef> = Vec::new();
    let mut fusers = Vec::new();
    {
        let mut seen: HashSet<(u32, Vec<SymbolRef>)> = HashSet::new();
        for (head_index, nonterminal) in nonterminals.iter().enumerate() {
            if nonterminal.ignored_assignments() > 0 {
                warnings.push(BuildDiagnostic::warning(BuildMessage::Notice(format!(
                    "Productions of <{}> were already assigned; the later assignment is ignored.",
                    nonterminal.name()
                ))));
            }
            let productions = match nonterminal.productions() {
                Some(productions) if !productions.is_empty() => productions,
                _ => {
                    errors.push(BuildDiagnostic::error(BuildMessage::EmptyNonterminal(
                        nonterminal.name().to_string(),
                    )));
                    continue;
                }
            };
            for production in productions {
                let mut handle: Vec<SymbolRef> = Vec::with_capacity(production.members().len());
                for member in production.members() {
                    match symbol_of.get(&member.identity()) {
                        Some(resolved) if resolved.kind == SymbolKind::Noise => {
                            errors.push(BuildDiagnostic::error(BuildMessage::Notice(format!(
                                "Noise group {} cannot occur inside a production handle.",
                                member.name()
                            ))));
                        }
                        Some(resolved) => handle.push(*resolved),
                        None => unreachable!("every reachable symbol is numbered"),
                    }
                }
                if !seen.insert((head_index as u32, handle.clone())) {
                    errors.push(BuildDiagnostic::error(BuildMessage::DuplicateProduction {
                        head: nonterminal.name().to_string(),
                        handle: production
                            .members()
                            .iter()
                            .map(|member| member.name().to_string())
                            .collect(),
                    }));
                    continue;
                }
                production_defs.push(ProductionDef {
                    head: head_index as u32,
                    handle,
                    precedence: production
                        .precedence_tag()
                        .and_then(|tag| operators.and_then(|scope| scope.find_tag(tag))),
                });
                fusers.push(production.fuser().clone());
            }
        }
    }

    // Lower the regexes, collect void warnings and nullability errors.
    let mut lower = LowerContext::new();
    let mut lower_symbol = |name: &str, rex: &Rex, errors: &mut Vec<BuildDiagnostic>, warnings: &mut Vec<BuildDiagnostic>| {
        let lowered = lower.lower(rex, options.case_sensitive);
        if lowered.is_void() {
            warnings.push(BuildDiagnostic::warning(BuildMessage::RegexUnmatchable(
                name.to_string(),
            )));
        } else if LowerContext::contains_void(rex) {
            warnings.push(BuildDiagnostic::warning(BuildMessage::RegexContainsVoid(
                name.to_string(),
            )));
        }
        if lowered.is_nullable() {
            errors.push(BuildDiagnostic::error(BuildMessage::NullableSymbol(
                name.to_string(),
            )));
        }
        lowered
    };

    {
        let mut assigned: HashSet<u32> = HashSet::new();
        for terminal in &terminals {
            let identity = Rc::as_ptr(terminal) as usize;
            let resolved = symbol_of[&identity];
            if !assigned.insert(resolved.index) {
                continue; // a literal merged into an earlier terminal
            }
            let def = &mut terminal_defs[resolved.index as usize];
            def.rex = Some(lower_symbol(
                &def.name,
                terminal.rex(),
                &mut errors,
                &mut warnings,
            ));
            if let (Some(scope), Some(text)) = (operators, terminal.literal_text()) {
                def.precedence = scope.find_literal(text);
            }
        }
    }

    for ((name, rex), def) in noise.iter().zip(noise_defs.iter_mut()) {
        def.rex = Some(lower_symbol(name, rex, &mut errors, &mut warnings));
    }
    if let Some(index) = newline_noise {
        let newline_rex = Rex::choice(vec![
            Rex::string("\r\n"),
            Rex::char('\r'),
            Rex::char('\n'),
        ]);
        noise_defs[index as usize].rex = Some(lower_symbol(
            NEWLINE,
            &newline_rex,
            &mut errors,
            &mut warnings,
        ));
    }

    let group_starts: Vec<GroupSymbolDef> = group_start_defs
        .iter()
        .map(|(rex, name)| GroupSymbolDef {
            name: name.clone(),
            rex: lower_symbol(name, rex, &mut errors, &mut warnings),
        })
        .collect();
    let group_ends: Vec<GroupSymbolDef> = group_end_defs
        .iter()
        .map(|(rex, name)| GroupSymbolDef {
            name: name.clone(),
            rex: lower_symbol(name, rex, &mut errors, &mut warnings),
        })
        .collect();

    // Handle precedence defaults: the last terminal of the handle that has
    // a precedence level decides, unless an explicit tag already did.
    for production in &mut production_defs {
        if production.precedence.is_some() {
            continue;
        }
        production.precedence = production
            .handle
            .iter()
            .rev()
            .find_map(|member| match member.kind {
                SymbolKind::Terminal => terminal_defs[member.index as usize].precedence,
                _ => None,
            });
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let definition = GrammarDefinition {
        name: name.to_string(),
        case_sensitive: options.case_sensitive,
        terminals: terminal_defs,
        noise: noise_defs,
        group_starts,
        group_ends,
        virtuals: virtual_defs,
        nonterminals: nonterminal_defs,
        productions: production_defs,
        groups: group_defs,
        start_symbol: 0,
    };

    Ok((
        definition,
        SemanticTables {
            transformers,
            fusers,
        },
        warnings,
    ))
}

fn check_names<'a, I: Iterator<Item = &'a str>>(names: I, errors: &mut Vec<BuildDiagnostic>) {
    let mut seen: HashSet<&'a str> = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            errors.push(BuildDiagnostic::error(BuildMessage::DuplicateSpecialName(
                name.to_string(),
            )));
        }
    }
}
