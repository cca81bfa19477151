//! Rule precedences and the λ / FIRST fixed points.

use crate::grammar::{Grammar, SymbolKind, TerminalSet};

/// Give every rule a precedence symbol. Rules carrying an explicit
/// `[SYMBOL]` mark keep it; every other rule adopts the leftmost RHS
/// symbol that has a defined precedence, if any.
pub fn find_rule_precedences(g: &mut Grammar) {
    for ri in 0..g.rules.len() {
        if g.rules[ri].prec_sym.is_some() {
            continue;
        }
        let found = g.rules[ri]
            .rhs
            .iter()
            .find(|item| g.sym(item.symbol).precedence.is_some())
            .map(|item| item.symbol);
        g.rules[ri].prec_sym = found;
    }
}

/// Compute which nonterminals derive the empty string, then the FIRST
/// set of every nonterminal. Both are straightforward iterate-until-
/// no-change loops over the rule list.
pub fn find_first_sets(g: &mut Grammar) {
    // λ first: a nonterminal is λ as soon as one of its rules has an
    // all-λ right-hand side (an empty RHS trivially qualifies).
    loop {
        let mut progress = false;
        for ri in 0..g.rules.len() {
            let lhs = g.rules[ri].lhs;
            if g.sym(lhs).lambda {
                continue;
            }
            let all_lambda = g.rules[ri]
                .rhs
                .iter()
                .all(|item| g.sym(item.symbol).lambda);
            if all_lambda {
                g.sym_mut(lhs).lambda = true;
                progress = true;
            }
        }
        if !progress {
            break;
        }
    }

    // Now the FIRST sets. Scanning a right-hand side stops at the
    // first non-λ symbol; a self-reference only continues the scan
    // when the LHS is already known to be λ, so left recursion cannot
    // cycle here.
    loop {
        let mut progress = false;
        for ri in 0..g.rules.len() {
            let lhs = g.rules[ri].lhs;
            for pos in 0..g.rules[ri].rhs.len() {
                let s2 = g.rules[ri].rhs[pos].symbol;
                if g.sym(s2).kind == SymbolKind::Terminal {
                    let index = g.sym(s2).index;
                    progress |= g.sym_mut(lhs).first.insert(index);
                    break;
                } else if lhs == s2 {
                    if !g.sym(lhs).lambda {
                        break;
                    }
                } else {
                    let mut first = std::mem::take(&mut g.sym_mut(lhs).first);
                    progress |= first.union_with(&g.sym(s2).first);
                    g.sym_mut(lhs).first = first;
                    if !g.sym(s2).lambda {
                        break;
                    }
                }
            }
        }
        if !progress {
            break;
        }
    }
}

/// FIRST of a sentential suffix: used while closing configurations to
/// seed follow sets. Terminals contribute themselves and stop the
/// scan; nonterminals contribute their FIRST set and stop unless λ.
/// Returns `true` when the scan ran off the end of the suffix.
pub fn first_of_suffix(g: &Grammar, rule: crate::grammar::RuleId, from: usize, out: &mut TerminalSet) -> bool {
    let rhs = &g.rule(rule).rhs;
    for item in &rhs[from.min(rhs.len())..] {
        let sym = g.sym(item.symbol);
        if sym.kind == SymbolKind::Terminal {
            out.insert(sym.index);
            return false;
        }
        out.union_with(&sym.first);
        if !sym.lambda {
            return false;
        }
    }
    true
}
