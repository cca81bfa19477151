//! Grammar file scanner and parser.
//!
//! The scanner walks the whole input once, producing tokens delimited by
//! whitespace and punctuation: identifiers, the `::=` arrow, quoted
//! strings, braced code blocks (with nested braces, both comment styles
//! and character/string literals tracked so a `}` inside them does not
//! close the block), and single-character operators. Comments outside
//! code blocks are stripped here. Each token is handed to an explicit
//! parser state machine that fills in the [`Grammar`].
//!
//! Errors never abort the parse; the machine reports them and skips
//! ahead to the next `.` or `%` so one run surfaces as many problems as
//! possible.

use crate::diag::{grammar_error, Reporter};
use crate::grammar::{Assoc, CodeBlock, Grammar, Precedence, RhsItem, Rule, SymbolId, MAX_RHS};
use std::rc::Rc;

/// Scan and parse grammar text into `g`. Diagnostics go through `diag`;
/// the caller decides what a non-zero error count means.
pub fn parse(src: &str, g: &mut Grammar, diag: &mut Reporter) {
    let bytes = src.as_bytes();
    let len = bytes.len();
    let mut ps = ParserState::new();
    let mut lineno: usize = 1;
    let mut cp = 0;

    while cp < len {
        let c = bytes[cp];
        if c == b'\n' {
            lineno += 1;
        }
        if c.is_ascii_whitespace() {
            cp += 1;
            continue;
        }
        if c == b'/' && bytes.get(cp + 1) == Some(&b'/') {
            cp += 2;
            while cp < len && bytes[cp] != b'\n' {
                cp += 1;
            }
            continue;
        }
        if c == b'/' && bytes.get(cp + 1) == Some(&b'*') {
            cp += 2;
            while cp < len && !(bytes[cp] == b'/' && bytes[cp - 1] == b'*') {
                if bytes[cp] == b'\n' {
                    lineno += 1;
                }
                cp += 1;
            }
            if cp < len {
                cp += 1;
            }
            continue;
        }

        let token_start = cp;
        let token_line = lineno;
        let token_end;
        let next;

        if c == b'"' {
            // String literal; the token keeps the opening quote so the
            // parser can recognize it, the closing quote is dropped.
            cp += 1;
            while cp < len && bytes[cp] != b'"' {
                if bytes[cp] == b'\n' {
                    lineno += 1;
                }
                cp += 1;
            }
            if cp >= len {
                grammar_error!(
                    diag,
                    token_line,
                    "String starting on this line is not terminated before the end of the file."
                );
                token_end = cp;
                next = cp;
            } else {
                token_end = cp;
                next = cp + 1;
            }
        } else if c == b'{' {
            cp += 1;
            let mut level = 1usize;
            loop {
                if cp >= len {
                    break;
                }
                let ch = bytes[cp];
                if level == 1 && ch == b'}' {
                    break;
                }
                if ch == b'\n' {
                    lineno += 1;
                } else if ch == b'{' {
                    level += 1;
                } else if ch == b'}' {
                    level -= 1;
                } else if ch == b'/' && bytes.get(cp + 1) == Some(&b'*') {
                    cp += 2;
                    let mut prevc = 0u8;
                    while cp < len && !(bytes[cp] == b'/' && prevc == b'*') {
                        if bytes[cp] == b'\n' {
                            lineno += 1;
                        }
                        prevc = bytes[cp];
                        cp += 1;
                    }
                    if cp >= len {
                        break;
                    }
                } else if ch == b'/' && bytes.get(cp + 1) == Some(&b'/') {
                    cp += 2;
                    while cp < len && bytes[cp] != b'\n' {
                        cp += 1;
                    }
                    if cp < len {
                        lineno += 1;
                    } else {
                        break;
                    }
                } else if ch == b'\'' || ch == b'"' {
                    let quote = ch;
                    let mut prevc = 0u8;
                    cp += 1;
                    while cp < len && !(bytes[cp] == quote && prevc != b'\\') {
                        if bytes[cp] == b'\n' {
                            lineno += 1;
                        }
                        prevc = if prevc == b'\\' { 0 } else { bytes[cp] };
                        cp += 1;
                    }
                    if cp >= len {
                        break;
                    }
                }
                cp += 1;
            }
            if cp >= len {
                grammar_error!(
                    diag,
                    token_line,
                    "Code starting on this line is not terminated before the end of the file."
                );
                token_end = cp;
                next = cp;
            } else {
                // Token keeps the opening brace, drops the closing one.
                token_end = cp;
                next = cp + 1;
            }
        } else if c.is_ascii_alphanumeric() {
            while cp < len && (bytes[cp].is_ascii_alphanumeric() || bytes[cp] == b'_') {
                cp += 1;
            }
            token_end = cp;
            next = cp;
        } else if c == b':' && bytes.get(cp + 1) == Some(&b':') && bytes.get(cp + 2) == Some(&b'=')
        {
            cp += 3;
            token_end = cp;
            next = cp;
        } else {
            cp += 1;
            token_end = cp;
            next = cp;
        }

        ps.token(&src[token_start..token_end], token_line, g, diag);
        cp = next;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum State {
    WaitingForDeclOrRule,
    WaitingForDeclKeyword,
    WaitingForDeclArg,
    WaitingForPrecedenceSymbol,
    WaitingForArrow,
    InRhs,
    LhsAlias1,
    LhsAlias2,
    LhsAlias3,
    RhsAlias1,
    RhsAlias2,
    PrecedenceMark1,
    PrecedenceMark2,
    ResyncAfterRuleError,
    ResyncAfterDeclError,
    WaitingForDestructorSymbol,
    WaitingForDatatypeSymbol,
}

/// Where the argument of the declaration being parsed will be stored.
#[derive(Debug, Copy, Clone)]
enum DeclSlot {
    Name,
    Include,
    ExtraCode,
    TokenDestructor,
    TokenPrefix,
    SyntaxError,
    ParseAccept,
    ParseFailure,
    StackOverflow,
    ExtraArgument,
    TokenType,
    StackSize,
    StartSymbol,
    Destructor(SymbolId),
    Datatype(SymbolId),
}

#[derive(Debug)]
struct ParserState {
    state: State,
    lhs: Option<SymbolId>,
    lhs_alias: Option<Rc<str>>,
    rhs: Vec<RhsItem>,
    rule_line: usize,
    prev_rule: Option<usize>,
    decl_keyword: String,
    decl_slot: Option<DeclSlot>,
    decl_assoc: Assoc,
    prec_counter: u32,
}

impl ParserState {
    fn new() -> Self {
        Self {
            state: State::WaitingForDeclOrRule,
            lhs: None,
            lhs_alias: None,
            rhs: Vec::new(),
            rule_line: 0,
            prev_rule: None,
            decl_keyword: String::new(),
            decl_slot: None,
            decl_assoc: Assoc::Left,
            prec_counter: 0,
        }
    }

    fn token(&mut self, tok: &str, line: usize, g: &mut Grammar, diag: &mut Reporter) {
        tracing::trace!(?tok, line, state = ?self.state, "parse token");
        let first = tok.as_bytes().first().copied().unwrap_or(0);
        match self.state {
            State::WaitingForDeclOrRule => {
                if first == b'%' {
                    self.state = State::WaitingForDeclKeyword;
                } else if first.is_ascii_lowercase() {
                    self.lhs = Some(g.symbol(tok));
                    self.lhs_alias = None;
                    self.rhs.clear();
                    self.rule_line = line;
                    self.state = State::WaitingForArrow;
                } else if first == b'{' {
                    match self.prev_rule {
                        None => {
                            grammar_error!(
                                diag,
                                line,
                                "There is no prior rule upon which to attach the code \
                                 fragment which begins on this line."
                            );
                        }
                        Some(prev) if g.rules[prev].code.is_some() => {
                            grammar_error!(
                                diag,
                                line,
                                "Code fragment beginning on this line is not the first \
                                 to follow the previous rule."
                            );
                        }
                        Some(prev) => {
                            g.rules[prev].code = Some(CodeBlock {
                                text: tok[1..].to_owned(),
                                line,
                            });
                        }
                    }
                } else if first == b'[' {
                    self.state = State::PrecedenceMark1;
                } else {
                    grammar_error!(
                        diag,
                        line,
                        "Token \"{tok}\" should be either \"%\" or a nonterminal name."
                    );
                }
            }
            State::PrecedenceMark1 => {
                if !first.is_ascii_uppercase() {
                    grammar_error!(diag, line, "The precedence symbol must be a terminal.");
                } else if self.prev_rule.is_none() {
                    grammar_error!(
                        diag,
                        line,
                        "There is no prior rule to assign precedence \"[{tok}]\"."
                    );
                } else if g.rules[self.prev_rule.unwrap()].prec_sym.is_some() {
                    grammar_error!(
                        diag,
                        line,
                        "Precedence mark on this line is not the first to follow \
                         the previous rule."
                    );
                } else {
                    let sym = g.symbol(tok);
                    g.rules[self.prev_rule.unwrap()].prec_sym = Some(sym);
                }
                self.state = State::PrecedenceMark2;
            }
            State::PrecedenceMark2 => {
                if tok != "]" {
                    grammar_error!(diag, line, "Missing \"]\" on precedence mark.");
                }
                self.state = State::WaitingForDeclOrRule;
            }
            State::WaitingForArrow => {
                if tok == "::=" {
                    self.state = State::InRhs;
                } else if first == b'(' {
                    self.state = State::LhsAlias1;
                } else {
                    let lhs = self.lhs_name(g);
                    grammar_error!(
                        diag,
                        line,
                        "Expected to see a \"::=\" following the LHS symbol \"{lhs}\"."
                    );
                    self.state = State::ResyncAfterRuleError;
                }
            }
            State::LhsAlias1 => {
                if first.is_ascii_alphabetic() {
                    self.lhs_alias = Some(g.intern(tok));
                    self.state = State::LhsAlias2;
                } else {
                    let lhs = self.lhs_name(g);
                    grammar_error!(
                        diag,
                        line,
                        "\"{tok}\" is not a valid alias for the LHS \"{lhs}\"."
                    );
                    self.state = State::ResyncAfterRuleError;
                }
            }
            State::LhsAlias2 => {
                if first == b')' {
                    self.state = State::LhsAlias3;
                } else {
                    let alias = self.lhs_alias.as_deref().unwrap_or_default().to_owned();
                    grammar_error!(
                        diag,
                        line,
                        "Missing \")\" following LHS alias name \"{alias}\"."
                    );
                    self.state = State::ResyncAfterRuleError;
                }
            }
            State::LhsAlias3 => {
                if tok == "::=" {
                    self.state = State::InRhs;
                } else {
                    let lhs = self.lhs_name(g);
                    let alias = self.lhs_alias.as_deref().unwrap_or_default().to_owned();
                    grammar_error!(
                        diag,
                        line,
                        "Missing \"::=\" following: \"{lhs}({alias})\"."
                    );
                    self.state = State::ResyncAfterRuleError;
                }
            }
            State::InRhs => {
                if first == b'.' {
                    let rule = Rule {
                        lhs: self.lhs.expect("LHS is set before entering the RHS"),
                        lhs_alias: self.lhs_alias.take(),
                        rhs: std::mem::take(&mut self.rhs),
                        line: self.rule_line,
                        code: None,
                        prec_sym: None,
                        can_reduce: false,
                    };
                    let id = g.add_rule(rule);
                    self.prev_rule = Some(id.index());
                    self.state = State::WaitingForDeclOrRule;
                } else if first.is_ascii_alphabetic() {
                    if self.rhs.len() >= MAX_RHS {
                        grammar_error!(
                            diag,
                            line,
                            "Too many symbols on RHS of rule beginning at \"{tok}\"."
                        );
                        self.state = State::ResyncAfterRuleError;
                    } else {
                        let symbol = g.symbol(tok);
                        self.rhs.push(RhsItem {
                            symbol,
                            alias: None,
                        });
                    }
                } else if first == b'(' && !self.rhs.is_empty() {
                    self.state = State::RhsAlias1;
                } else {
                    grammar_error!(diag, line, "Illegal character on RHS of rule: \"{tok}\".");
                    self.state = State::ResyncAfterRuleError;
                }
            }
            State::RhsAlias1 => {
                if first.is_ascii_alphabetic() {
                    let alias = g.intern(tok);
                    if let Some(item) = self.rhs.last_mut() {
                        item.alias = Some(alias);
                    }
                    self.state = State::RhsAlias2;
                } else {
                    let name = self
                        .rhs
                        .last()
                        .map(|item| g.sym(item.symbol).name.to_string())
                        .unwrap_or_default();
                    grammar_error!(
                        diag,
                        line,
                        "\"{tok}\" is not a valid alias for the RHS symbol \"{name}\"."
                    );
                    self.state = State::ResyncAfterRuleError;
                }
            }
            State::RhsAlias2 => {
                if first == b')' {
                    self.state = State::InRhs;
                } else {
                    let alias = self
                        .rhs
                        .last()
                        .and_then(|item| item.alias.as_deref())
                        .unwrap_or_default()
                        .to_owned();
                    grammar_error!(
                        diag,
                        line,
                        "Missing \")\" following RHS alias name \"{alias}\"."
                    );
                    self.state = State::ResyncAfterRuleError;
                }
            }
            State::WaitingForDeclKeyword => {
                if first.is_ascii_alphabetic() {
                    self.decl_keyword = tok.to_owned();
                    self.decl_slot = None;
                    self.state = State::WaitingForDeclArg;
                    match tok {
                        "name" => self.decl_slot = Some(DeclSlot::Name),
                        "include" => self.decl_slot = Some(DeclSlot::Include),
                        "code" => self.decl_slot = Some(DeclSlot::ExtraCode),
                        "token_destructor" => self.decl_slot = Some(DeclSlot::TokenDestructor),
                        "token_prefix" => self.decl_slot = Some(DeclSlot::TokenPrefix),
                        "syntax_error" => self.decl_slot = Some(DeclSlot::SyntaxError),
                        "parse_accept" => self.decl_slot = Some(DeclSlot::ParseAccept),
                        "parse_failure" => self.decl_slot = Some(DeclSlot::ParseFailure),
                        "stack_overflow" => self.decl_slot = Some(DeclSlot::StackOverflow),
                        "extra_argument" => self.decl_slot = Some(DeclSlot::ExtraArgument),
                        "token_type" => self.decl_slot = Some(DeclSlot::TokenType),
                        "stack_size" => self.decl_slot = Some(DeclSlot::StackSize),
                        "start_symbol" => self.decl_slot = Some(DeclSlot::StartSymbol),
                        "left" => {
                            self.prec_counter += 1;
                            self.decl_assoc = Assoc::Left;
                            self.state = State::WaitingForPrecedenceSymbol;
                        }
                        "right" => {
                            self.prec_counter += 1;
                            self.decl_assoc = Assoc::Right;
                            self.state = State::WaitingForPrecedenceSymbol;
                        }
                        "nonassoc" => {
                            self.prec_counter += 1;
                            self.decl_assoc = Assoc::Nonassoc;
                            self.state = State::WaitingForPrecedenceSymbol;
                        }
                        "destructor" => self.state = State::WaitingForDestructorSymbol,
                        "type" => self.state = State::WaitingForDatatypeSymbol,
                        _ => {
                            grammar_error!(diag, line, "Unknown declaration keyword: \"%{tok}\".");
                            self.state = State::ResyncAfterDeclError;
                        }
                    }
                } else {
                    grammar_error!(diag, line, "Illegal declaration keyword: \"{tok}\".");
                    self.state = State::ResyncAfterDeclError;
                }
            }
            State::WaitingForDestructorSymbol => {
                if first.is_ascii_alphabetic() {
                    let sym = g.symbol(tok);
                    self.decl_slot = Some(DeclSlot::Destructor(sym));
                    self.state = State::WaitingForDeclArg;
                } else {
                    grammar_error!(diag, line, "Symbol name missing after %destructor keyword.");
                    self.state = State::ResyncAfterDeclError;
                }
            }
            State::WaitingForDatatypeSymbol => {
                if first.is_ascii_alphabetic() {
                    let sym = g.symbol(tok);
                    self.decl_slot = Some(DeclSlot::Datatype(sym));
                    self.state = State::WaitingForDeclArg;
                } else {
                    grammar_error!(diag, line, "Symbol name missing after %type keyword.");
                    self.state = State::ResyncAfterDeclError;
                }
            }
            State::WaitingForPrecedenceSymbol => {
                if first == b'.' {
                    self.state = State::WaitingForDeclOrRule;
                } else if first.is_ascii_uppercase() {
                    let sym = g.symbol(tok);
                    if g.sym(sym).precedence.is_some() {
                        grammar_error!(
                            diag,
                            line,
                            "Symbol \"{tok}\" has already been given a precedence."
                        );
                    } else {
                        g.sym_mut(sym).precedence = Some(Precedence {
                            prec: self.prec_counter,
                            assoc: self.decl_assoc,
                        });
                    }
                } else {
                    grammar_error!(diag, line, "Can't assign a precedence to \"{tok}\".");
                }
            }
            State::WaitingForDeclArg => {
                if first == b'{' || first == b'"' || first.is_ascii_alphanumeric() {
                    let value = if first == b'{' || first == b'"' {
                        &tok[1..]
                    } else {
                        tok
                    };
                    if self.decl_arg_occupied(g) {
                        let kw = &self.decl_keyword;
                        grammar_error!(
                            diag,
                            line,
                            "The argument \"{value}\" to declaration \"%{kw}\" is not \
                             the first."
                        );
                        self.state = State::ResyncAfterDeclError;
                    } else {
                        self.store_decl_arg(g, value, line);
                        self.state = State::WaitingForDeclOrRule;
                    }
                } else {
                    let kw = &self.decl_keyword;
                    grammar_error!(diag, line, "Illegal argument to %{kw}: {tok}");
                    self.state = State::ResyncAfterDeclError;
                }
            }
            State::ResyncAfterRuleError | State::ResyncAfterDeclError => {
                if first == b'.' {
                    self.state = State::WaitingForDeclOrRule;
                } else if first == b'%' {
                    self.state = State::WaitingForDeclKeyword;
                }
            }
        }
    }

    fn lhs_name(&self, g: &Grammar) -> String {
        self.lhs
            .map(|id| g.sym(id).name.to_string())
            .unwrap_or_default()
    }

    fn decl_arg_occupied(&self, g: &Grammar) -> bool {
        match self.decl_slot {
            Some(DeclSlot::Name) => g.name.is_some(),
            Some(DeclSlot::Include) => g.include.is_some(),
            Some(DeclSlot::ExtraCode) => g.extra_code.is_some(),
            Some(DeclSlot::TokenDestructor) => g.token_dest.is_some(),
            Some(DeclSlot::TokenPrefix) => g.token_prefix.is_some(),
            Some(DeclSlot::SyntaxError) => g.syntax_error.is_some(),
            Some(DeclSlot::ParseAccept) => g.parse_accept.is_some(),
            Some(DeclSlot::ParseFailure) => g.parse_failure.is_some(),
            Some(DeclSlot::StackOverflow) => g.stack_overflow.is_some(),
            Some(DeclSlot::ExtraArgument) => g.extra_argument.is_some(),
            Some(DeclSlot::TokenType) => g.token_type.is_some(),
            Some(DeclSlot::StackSize) => g.stack_size.is_some(),
            Some(DeclSlot::StartSymbol) => g.start.is_some(),
            Some(DeclSlot::Destructor(sym)) => g.sym(sym).destructor.is_some(),
            Some(DeclSlot::Datatype(sym)) => g.sym(sym).datatype.is_some(),
            None => false,
        }
    }

    fn store_decl_arg(&mut self, g: &mut Grammar, value: &str, line: usize) {
        let block = || CodeBlock {
            text: value.to_owned(),
            line,
        };
        match self.decl_slot {
            Some(DeclSlot::Name) => g.name = Some(value.to_owned()),
            Some(DeclSlot::Include) => g.include = Some(block()),
            Some(DeclSlot::ExtraCode) => g.extra_code = Some(block()),
            Some(DeclSlot::TokenDestructor) => g.token_dest = Some(block()),
            Some(DeclSlot::TokenPrefix) => g.token_prefix = Some(value.to_owned()),
            Some(DeclSlot::SyntaxError) => g.syntax_error = Some(block()),
            Some(DeclSlot::ParseAccept) => g.parse_accept = Some(block()),
            Some(DeclSlot::ParseFailure) => g.parse_failure = Some(block()),
            Some(DeclSlot::StackOverflow) => g.stack_overflow = Some(block()),
            Some(DeclSlot::ExtraArgument) => g.extra_argument = Some(value.to_owned()),
            Some(DeclSlot::TokenType) => g.token_type = Some(value.to_owned()),
            Some(DeclSlot::StackSize) => g.stack_size = Some(value.to_owned()),
            Some(DeclSlot::StartSymbol) => g.start = Some(g.intern(value)),
            Some(DeclSlot::Destructor(sym)) => g.sym_mut(sym).destructor = Some(block()),
            Some(DeclSlot::Datatype(sym)) => g.sym_mut(sym).datatype = Some(value.to_owned()),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Assoc;

    fn parsed(src: &str) -> (Grammar, Reporter) {
        let mut g = Grammar::new("test.y");
        let mut diag = Reporter::new("test.y");
        parse(src, &mut g, &mut diag);
        (g, diag)
    }

    #[test]
    fn rules_and_aliases() {
        let (g, diag) = parsed(
            "expr(A) ::= expr(B) PLUS expr(C). { A = B + C; }\n\
             expr(A) ::= NUM(N). { A = N; }\n",
        );
        assert_eq!(diag.count(), 0);
        assert_eq!(g.rules.len(), 2);
        let r0 = &g.rules[0];
        assert_eq!(&*g.sym(r0.lhs).name, "expr");
        assert_eq!(r0.lhs_alias.as_deref(), Some("A"));
        assert_eq!(r0.rhs.len(), 3);
        assert_eq!(r0.rhs[0].alias.as_deref(), Some("B"));
        assert_eq!(r0.rhs[1].alias.as_deref(), None);
        assert_eq!(r0.code.as_ref().unwrap().text, " A = B + C; ");
    }

    #[test]
    fn comments_are_stripped_outside_code() {
        let (g, diag) = parsed(
            "// line comment\n\
             /* block /* not nested */ expr ::= NUM . // trailing\n",
        );
        assert_eq!(diag.count(), 0);
        assert_eq!(g.rules.len(), 1);
    }

    #[test]
    fn code_blocks_track_nesting_and_literals() {
        let (g, diag) = parsed(
            "expr ::= NUM. { if (x) { y = \"}\"; } /* } */ // }\n z = '}'; }\n",
        );
        assert_eq!(diag.count(), 0);
        let code = g.rules[0].code.as_ref().unwrap();
        assert!(code.text.contains("y = \"}\";"));
        assert!(code.text.contains("z = '}';"));
    }

    #[test]
    fn declarations_fill_slots() {
        let (g, diag) = parsed(
            "%name Calc\n\
             %token_prefix TK_\n\
             %token_type {int}\n\
             %stack_size 2000\n\
             %start_symbol expr\n\
             %left PLUS MINUS.\n\
             %right POW.\n\
             %type expr {double}\n\
             %destructor expr { free($$); }\n\
             expr ::= NUM.\n",
        );
        assert_eq!(diag.count(), 0);
        assert_eq!(g.name.as_deref(), Some("Calc"));
        assert_eq!(g.token_prefix.as_deref(), Some("TK_"));
        assert_eq!(g.token_type.as_deref(), Some("int"));
        assert_eq!(g.stack_size.as_deref(), Some("2000"));
        assert_eq!(g.start.as_deref(), Some("expr"));

        let plus = g.lookup("PLUS").unwrap();
        let minus = g.lookup("MINUS").unwrap();
        let pow = g.lookup("POW").unwrap();
        assert_eq!(g.sym(plus).precedence.unwrap().prec, 1);
        assert_eq!(g.sym(minus).precedence.unwrap().assoc, Assoc::Left);
        assert_eq!(g.sym(pow).precedence.unwrap().prec, 2);
        assert_eq!(g.sym(pow).precedence.unwrap().assoc, Assoc::Right);

        let expr = g.lookup("expr").unwrap();
        assert_eq!(g.sym(expr).datatype.as_deref(), Some("double"));
        assert!(g.sym(expr).destructor.is_some());
    }

    #[test]
    fn precedence_mark_overrides() {
        let (g, diag) = parsed("%left PLUS.\nexpr ::= MINUS expr. [PLUS]\n");
        assert_eq!(diag.count(), 0);
        let plus = g.lookup("PLUS").unwrap();
        assert_eq!(g.rules[0].prec_sym, Some(plus));
    }

    #[test]
    fn duplicate_precedence_is_an_error() {
        let (_g, diag) = parsed("%left PLUS.\n%right PLUS.\nexpr ::= NUM.\n");
        assert_eq!(diag.count(), 1);
        assert!(diag.messages()[0].contains("already been given a precedence"));
    }

    #[test]
    fn resync_skips_to_next_rule() {
        let (g, diag) = parsed("expr = NUM.\nterm ::= NUM.\n");
        assert_eq!(diag.count(), 1);
        assert!(diag.messages()[0].contains("Expected to see a \"::=\""));
        assert_eq!(g.rules.len(), 1);
        assert_eq!(&*g.sym(g.rules[0].lhs).name, "term");
    }

    #[test]
    fn second_code_fragment_is_rejected() {
        let (_g, diag) = parsed("expr ::= NUM. {a();} {b();}\n");
        assert_eq!(diag.count(), 1);
        assert!(diag.messages()[0].contains("not the first"));
    }

    #[test]
    fn unterminated_block_is_reported() {
        let (_g, diag) = parsed("expr ::= NUM. { whoops\n");
        assert_eq!(diag.count(), 1);
        assert!(diag.messages()[0].contains("not terminated"));
    }
}
