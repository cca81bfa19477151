//! Grammar types.
//!
//! Symbols and rules are stored in arenas owned by [`Grammar`] and are
//! referred to by index everywhere else, which keeps the later graph
//! structures (configurations, states, propagation links) free of
//! ownership cycles.

use crate::intern::StringPool;
use crate::types::Map;
use crate::util::display_fn;
use std::fmt;
use std::rc::Rc;

/// Upper bound on the number of right-hand-side symbols in one rule.
pub const MAX_RHS: usize = 1000;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    pub(crate) fn arena(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Y#{:03}", self.0)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(u32);

impl RuleId {
    /// Position of the rule in the global list, which doubles as the
    /// rule number seen in reports and in the generated tables.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R#{:03}", self.0)
    }
}

/// A set of terminal symbols, indexed by post-sort terminal index.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TerminalSet {
    inner: bit_set::BitSet,
}

impl TerminalSet {
    pub fn contains(&self, index: usize) -> bool {
        self.inner.contains(index)
    }

    pub fn insert(&mut self, index: usize) -> bool {
        self.inner.insert(index)
    }

    /// Union `other` into `self`, reporting whether anything was added.
    /// The follow-set fixed point relies on this signal to terminate.
    pub fn union_with(&mut self, other: &Self) -> bool {
        let before = self.inner.len();
        self.inner.union_with(&other.inner);
        self.inner.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.inner.iter()
    }
}

impl FromIterator<usize> for TerminalSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    Terminal,
    Nonterminal,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Precedence {
    pub prec: u32,
    pub assoc: Assoc,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    Nonassoc,
}

/// A code fragment taken verbatim from the grammar file, together with
/// the line its opening token appeared on.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub text: String,
    pub line: usize,
}

#[derive(Debug)]
pub struct Symbol {
    pub name: Rc<str>,
    /// Index assigned by [`Grammar::finalize`]; stable afterwards.
    pub index: usize,
    pub kind: SymbolKind,
    pub precedence: Option<Precedence>,
    pub first: TerminalSet,
    pub lambda: bool,
    pub destructor: Option<CodeBlock>,
    pub datatype: Option<String>,
    /// Rules with this symbol on the left-hand side, in source order.
    pub rules: Vec<RuleId>,
}

impl Symbol {
    pub fn is_terminal(&self) -> bool {
        self.kind == SymbolKind::Terminal
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RhsItem {
    pub symbol: SymbolId,
    pub alias: Option<Rc<str>>,
}

#[derive(Debug)]
pub struct Rule {
    pub lhs: SymbolId,
    pub lhs_alias: Option<Rc<str>>,
    pub rhs: Vec<RhsItem>,
    /// Line the rule header appeared on.
    pub line: usize,
    pub code: Option<CodeBlock>,
    /// Explicit `[SYMBOL]` override, or the inferred precedence symbol.
    pub prec_sym: Option<SymbolId>,
    pub can_reduce: bool,
}

impl Rule {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "{} ::=", g.sym(self.lhs).name)?;
            for item in &self.rhs {
                write!(f, " {}", g.sym(item.symbol).name)?;
            }
            Ok(())
        })
    }

    /// Render the rule with a `*` marking the dot position, the way the
    /// state report shows configurations.
    pub fn display_dotted<'g>(&'g self, g: &'g Grammar, dot: usize) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "{} ::=", g.sym(self.lhs).name)?;
            for (i, item) in self.rhs.iter().enumerate() {
                if i == dot {
                    f.write_str(" *")?;
                }
                write!(f, " {}", g.sym(item.symbol).name)?;
            }
            if dot == self.rhs.len() {
                f.write_str(" *")?;
            }
            Ok(())
        })
    }
}

/// The whole grammar: symbol and rule arenas plus every declaration
/// slot the grammar file can fill in.
#[derive(Debug)]
pub struct Grammar {
    pool: StringPool,
    symbols: Vec<Symbol>,
    by_name: Map<Rc<str>, SymbolId>,
    pub rules: Vec<Rule>,

    /// All symbols (including `{default}`) ordered by name; filled by
    /// [`Grammar::finalize`].
    pub sorted: Vec<SymbolId>,
    /// Number of symbols, excluding the `{default}` pseudo-symbol.
    pub nsymbol: usize,
    /// Symbols with sorted index below this are terminals.
    pub nterminal: usize,

    pub err_symbol: SymbolId,
    pub default_symbol: Option<SymbolId>,

    pub filename: String,
    pub name: Option<String>,
    pub include: Option<CodeBlock>,
    pub extra_code: Option<CodeBlock>,
    pub token_dest: Option<CodeBlock>,
    pub token_prefix: Option<String>,
    pub syntax_error: Option<CodeBlock>,
    pub parse_accept: Option<CodeBlock>,
    pub parse_failure: Option<CodeBlock>,
    pub stack_overflow: Option<CodeBlock>,
    pub extra_argument: Option<String>,
    pub token_type: Option<String>,
    pub stack_size: Option<String>,
    pub start: Option<Rc<str>>,
}

impl Grammar {
    pub fn new(filename: impl Into<String>) -> Self {
        let mut g = Self {
            pool: StringPool::new(),
            symbols: Vec::new(),
            by_name: Map::default(),
            rules: Vec::new(),
            sorted: Vec::new(),
            nsymbol: 0,
            nterminal: 0,
            err_symbol: SymbolId(0),
            default_symbol: None,
            filename: filename.into(),
            name: None,
            include: None,
            extra_code: None,
            token_dest: None,
            token_prefix: None,
            syntax_error: None,
            parse_accept: None,
            parse_failure: None,
            stack_overflow: None,
            extra_argument: None,
            token_type: None,
            stack_size: None,
            start: None,
        };
        // The end-of-input marker must exist before any user symbol so
        // follow sets can always refer to it. The error pseudo-symbol
        // is exempt from the "nonterminal has no rules" check.
        g.symbol("$");
        g.err_symbol = g.symbol("error");
        g
    }

    pub fn intern(&mut self, s: &str) -> Rc<str> {
        self.pool.intern(s)
    }

    /// Look up a symbol by name, creating it if necessary. The kind is
    /// decided by the case of the first byte: uppercase names are
    /// terminals, everything else is a nonterminal.
    pub fn symbol(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let name = self.pool.intern(name);
        let kind = if name.as_bytes()[0].is_ascii_uppercase() {
            SymbolKind::Terminal
        } else {
            SymbolKind::Nonterminal
        };
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            name: Rc::clone(&name),
            index: 0,
            kind,
            precedence: None,
            first: TerminalSet::default(),
            lambda: false,
            destructor: None,
            datatype: None,
            rules: Vec::new(),
        });
        self.by_name.insert(name, id);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.by_name.get(name).copied()
    }

    pub fn sym(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.arena()]
    }

    pub fn sym_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.arena()]
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.index()]
    }

    pub fn rule_ids(&self) -> impl Iterator<Item = RuleId> {
        (0..self.rules.len() as u32).map(RuleId)
    }

    pub fn add_rule(&mut self, rule: Rule) -> RuleId {
        let id = RuleId(self.rules.len() as u32);
        self.sym_mut(rule.lhs).rules.push(id);
        self.rules.push(rule);
        id
    }

    /// The symbol at the given post-sort index.
    pub fn nth(&self, index: usize) -> SymbolId {
        self.sorted[index]
    }

    /// Install the `{default}` pseudo-symbol, order every symbol by
    /// name, and assign the stable indices the rest of the pipeline
    /// keys its tables on. Plain byte ordering does all the work here:
    /// `$` sorts before the uppercase terminals, terminals before the
    /// lowercase nonterminals, and `{default}` after everything.
    pub fn finalize(&mut self) {
        self.nsymbol = self.symbols.len();
        let default_symbol = self.symbol("{default}");
        self.default_symbol = Some(default_symbol);

        let mut sorted: Vec<SymbolId> = (0..self.symbols.len() as u32).map(SymbolId).collect();
        sorted.sort_by(|&a, &b| {
            self.symbols[a.arena()]
                .name
                .as_bytes()
                .cmp(self.symbols[b.arena()].name.as_bytes())
        });
        for (index, &id) in sorted.iter().enumerate() {
            self.symbols[id.arena()].index = index;
        }
        self.sorted = sorted;

        let mut i = 1;
        while i < self.nsymbol && self.sym(self.sorted[i]).name.as_bytes()[0].is_ascii_uppercase()
        {
            i += 1;
        }
        self.nterminal = i;
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_kinds_follow_case() {
        let mut g = Grammar::new("test.y");
        let t = g.symbol("PLUS");
        let n = g.symbol("expr");
        assert!(g.sym(t).is_terminal());
        assert!(!g.sym(n).is_terminal());
    }

    #[test]
    fn finalize_orders_and_indexes() {
        let mut g = Grammar::new("test.y");
        g.symbol("expr");
        g.symbol("NUM");
        g.symbol("PLUS");
        g.finalize();

        let names: Vec<&str> = g.sorted.iter().map(|&id| &*g.sym(id).name).collect();
        assert_eq!(names, ["$", "NUM", "PLUS", "error", "expr", "{default}"]);
        assert_eq!(g.nsymbol, 5);
        assert_eq!(g.nterminal, 3);
        for (i, &id) in g.sorted.iter().enumerate() {
            assert_eq!(g.sym(id).index, i);
        }
    }

    #[test]
    fn terminal_set_union_reports_change() {
        let mut a: TerminalSet = [1, 3].into_iter().collect();
        let b: TerminalSet = [3, 5].into_iter().collect();
        assert!(a.union_with(&b));
        assert!(!a.union_with(&b));
        assert_eq!(a.iter().collect::<Vec<_>>(), [1, 3, 5]);
    }
}
