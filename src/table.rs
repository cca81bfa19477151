//! Action generation and conflict resolution.
//!
//! Every completed configuration contributes a REDUCE for each member
//! of its follow set, state 0 gets the ACCEPT on the start symbol, and
//! the per-state action lists are then sorted so that actions on the
//! same lookahead become adjacent with any SHIFT first. Adjacent pairs
//! are resolved by precedence and associativity; what cannot be
//! resolved is counted as a parsing conflict but left in the list so
//! the report can show it.

use crate::diag::{grammar_error, Reporter};
use crate::grammar::{Assoc, Grammar, Precedence, RuleId, SymbolId};
use crate::lr0::{Automaton, StateId};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Shift(StateId),
    Accept,
    Reduce(RuleId),
    Error,
    /// A reduce that lost no resolution: a genuine parsing conflict.
    Conflict(RuleId),
    /// A shift discarded in favor of a reduce by precedence.
    ShiftResolved(StateId),
    /// A reduce discarded by precedence.
    ReduceResolved(RuleId),
    /// Folded into the state's default action by compression.
    NotUsed(RuleId),
}

impl ActionKind {
    fn rank(self) -> u8 {
        match self {
            ActionKind::Shift(_) => 0,
            ActionKind::Accept => 1,
            ActionKind::Reduce(_) => 2,
            ActionKind::Error => 3,
            ActionKind::Conflict(_) => 4,
            ActionKind::ShiftResolved(_) => 5,
            ActionKind::ReduceResolved(_) => 6,
            ActionKind::NotUsed(_) => 7,
        }
    }

    pub fn rule(self) -> Option<RuleId> {
        match self {
            ActionKind::Reduce(r)
            | ActionKind::Conflict(r)
            | ActionKind::ReduceResolved(r)
            | ActionKind::NotUsed(r) => Some(r),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub lookahead: SymbolId,
    pub kind: ActionKind,
}

#[derive(Debug)]
pub struct ActionTable {
    /// Sorted action list per state, indexed by state number.
    pub states: Vec<Vec<Action>>,
    pub nconflict: usize,
}

pub fn find_actions(g: &mut Grammar, aut: &Automaton, diag: &mut Reporter) -> ActionTable {
    let mut states: Vec<Vec<Action>> = Vec::with_capacity(aut.nstate());

    for state in &aut.states {
        let mut actions: Vec<Action> = state
            .shifts
            .iter()
            .map(|&(sym, to)| Action {
                lookahead: sym,
                kind: ActionKind::Shift(to),
            })
            .collect();

        for &cid in &state.configs {
            let config = aut.config(cid);
            if config.dot != g.rule(config.rule).rhs.len() {
                continue;
            }
            for t in config.follow.iter() {
                if t < g.nterminal {
                    actions.push(Action {
                        lookahead: g.nth(t),
                        kind: ActionKind::Reduce(config.rule),
                    });
                }
            }
        }

        states.push(actions);
    }

    if let Some(first) = states.first_mut() {
        first.push(Action {
            lookahead: aut.start_symbol,
            kind: ActionKind::Accept,
        });
    }

    let mut nconflict = 0;
    for actions in &mut states {
        actions.sort_by(|a, b| action_cmp(g, a, b));
        let mut x = 0;
        while x < actions.len() {
            let mut y = x + 1;
            while y < actions.len() && actions[y].lookahead == actions[x].lookahead {
                nconflict += resolve_pair(g, actions, x, y);
                y += 1;
            }
            x = y;
        }
    }

    for rule in &mut g.rules {
        rule.can_reduce = false;
    }
    for actions in &states {
        for action in actions {
            if let ActionKind::Reduce(r) = action.kind {
                g.rules[r.index()].can_reduce = true;
            }
        }
    }
    for ri in 0..g.rules.len() {
        if !g.rules[ri].can_reduce {
            grammar_error!(diag, g.rules[ri].line, "This rule can not be reduced.");
        }
    }

    ActionTable { states, nconflict }
}

/// Ordering that makes same-lookahead actions adjacent, SHIFT before
/// REDUCE, and reduces deterministic by rule number.
fn action_cmp(g: &Grammar, a: &Action, b: &Action) -> Ordering {
    g.sym(a.lookahead)
        .index
        .cmp(&g.sym(b.lookahead).index)
        .then(a.kind.rank().cmp(&b.kind.rank()))
        .then_with(|| match (a.kind.rule(), b.kind.rule()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => Ordering::Equal,
        })
}

/// Resolve two actions on the same lookahead. `x` precedes `y` in sort
/// order, so a SHIFT can only appear on the `x` side. Returns the
/// number of conflicts charged to the grammar (0 or 1).
fn resolve_pair(g: &Grammar, actions: &mut [Action], x: usize, y: usize) -> usize {
    let rule_prec = |r: RuleId| -> Option<Precedence> {
        g.rule(r)
            .prec_sym
            .and_then(|sym| g.sym(sym).precedence)
    };

    match (actions[x].kind, actions[y].kind) {
        (ActionKind::Shift(to), ActionKind::Reduce(ry)) => {
            let shift_prec = g.sym(actions[x].lookahead).precedence;
            let reduce_prec = rule_prec(ry);
            match (shift_prec, reduce_prec) {
                (Some(ps), Some(pr)) => match ps.prec.cmp(&pr.prec) {
                    Ordering::Greater => {
                        actions[y].kind = ActionKind::ReduceResolved(ry);
                        0
                    }
                    Ordering::Less => {
                        actions[x].kind = ActionKind::ShiftResolved(to);
                        0
                    }
                    Ordering::Equal => match ps.assoc {
                        Assoc::Right => {
                            actions[y].kind = ActionKind::ReduceResolved(ry);
                            0
                        }
                        Assoc::Left => {
                            actions[x].kind = ActionKind::ShiftResolved(to);
                            0
                        }
                        Assoc::Nonassoc => {
                            actions[y].kind = ActionKind::Conflict(ry);
                            1
                        }
                    },
                },
                _ => {
                    // Not enough precedence information.
                    actions[y].kind = ActionKind::Conflict(ry);
                    1
                }
            }
        }
        (ActionKind::Reduce(rx), ActionKind::Reduce(ry)) => {
            match (rule_prec(rx), rule_prec(ry)) {
                (Some(px), Some(py)) if px.prec != py.prec => {
                    if px.prec > py.prec {
                        actions[y].kind = ActionKind::ReduceResolved(ry);
                    } else {
                        actions[x].kind = ActionKind::ReduceResolved(rx);
                    }
                    0
                }
                _ => {
                    actions[y].kind = ActionKind::Conflict(ry);
                    1
                }
            }
        }
        // Anything else (accepts, already-resolved actions) coexists.
        _ => 0,
    }
}

/// Fold the REDUCE actions of a state into a single `{default}` action
/// when they all reduce by the same rule and there are at least two of
/// them. The displaced actions stay in the list as NOT_USED so reports
/// and packing can skip them.
pub fn compress_tables(g: &Grammar, table: &mut ActionTable) {
    let Some(default_symbol) = g.default_symbol else {
        return;
    };

    for actions in &mut table.states {
        let Some(first) = actions
            .iter()
            .position(|a| matches!(a.kind, ActionKind::Reduce(_)))
        else {
            continue;
        };
        let ActionKind::Reduce(rule) = actions[first].kind else {
            unreachable!()
        };

        let mut count = 1;
        let mut uniform = true;
        for action in &actions[first + 1..] {
            if let ActionKind::Reduce(r) = action.kind {
                if r != rule {
                    uniform = false;
                    break;
                }
                count += 1;
            }
        }
        if !uniform || count == 1 {
            continue;
        }

        actions[first].lookahead = default_symbol;
        for action in &mut actions[first + 1..] {
            if let ActionKind::Reduce(r) = action.kind {
                action.kind = ActionKind::NotUsed(r);
            }
        }
        actions.sort_by(|a, b| action_cmp(g, a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Reporter;
    use crate::first_sets;
    use crate::lr0;
    use crate::syntax;

    fn pipeline(src: &str) -> (Grammar, Automaton, ActionTable, Reporter) {
        let mut g = Grammar::new("test.y");
        let mut diag = Reporter::new("test.y");
        syntax::parse(src, &mut g, &mut diag);
        g.finalize();
        first_sets::find_rule_precedences(&mut g);
        first_sets::find_first_sets(&mut g);
        let mut aut = lr0::build(&g, &mut diag);
        crate::lalr::find_links(&mut aut);
        crate::lalr::find_follow_sets(&mut aut);
        let table = find_actions(&mut g, &aut, &mut diag);
        (g, aut, table, diag)
    }

    #[test]
    fn shift_sorts_before_reduce_on_same_lookahead() {
        let (g, _aut, table, _diag) = pipeline("e ::= e PLUS e.\ne ::= NUM.\n");
        let plus = g.lookup("PLUS").unwrap();
        for actions in &table.states {
            let on_plus: Vec<_> = actions.iter().filter(|a| a.lookahead == plus).collect();
            if on_plus.len() == 2 {
                assert!(matches!(on_plus[0].kind, ActionKind::Shift(_)));
                return;
            }
        }
        panic!("no state with a shift/reduce pair on PLUS");
    }

    #[test]
    fn missing_precedence_is_a_conflict() {
        let (_g, _aut, table, _diag) = pipeline("e ::= e PLUS e.\ne ::= NUM.\n");
        assert_eq!(table.nconflict, 1);
        let conflicts: usize = table
            .states
            .iter()
            .flatten()
            .filter(|a| matches!(a.kind, ActionKind::Conflict(_)))
            .count();
        assert_eq!(conflicts, 1);
    }

    #[test]
    fn left_assoc_keeps_the_reduce() {
        let (g, _aut, table, _diag) =
            pipeline("%left PLUS.\ne ::= e PLUS e.\ne ::= NUM.\n");
        assert_eq!(table.nconflict, 0);
        let plus = g.lookup("PLUS").unwrap();
        let pair: Vec<_> = table
            .states
            .iter()
            .flatten()
            .filter(|a| a.lookahead == plus && a.kind.rank() != 0)
            .collect();
        assert!(pair
            .iter()
            .any(|a| matches!(a.kind, ActionKind::Reduce(_))));
        assert!(table
            .states
            .iter()
            .flatten()
            .any(|a| a.lookahead == plus && matches!(a.kind, ActionKind::ShiftResolved(_))));
    }

    #[test]
    fn right_assoc_keeps_the_shift() {
        let (g, _aut, table, _diag) =
            pipeline("%right POW.\ne ::= e POW e.\ne ::= NUM.\n");
        assert_eq!(table.nconflict, 0);
        let pow = g.lookup("POW").unwrap();
        assert!(table
            .states
            .iter()
            .flatten()
            .any(|a| a.lookahead == pow && matches!(a.kind, ActionKind::Shift(_))));
        assert!(table
            .states
            .iter()
            .flatten()
            .any(|a| a.lookahead == pow && matches!(a.kind, ActionKind::ReduceResolved(_))));
    }

    #[test]
    fn nonassoc_conflicts_on_equal_precedence() {
        let (_g, _aut, table, _diag) =
            pipeline("%nonassoc EQ.\ne ::= e EQ e.\ne ::= NUM.\n");
        assert_eq!(table.nconflict, 1);
    }

    #[test]
    fn unreducible_rule_is_reported() {
        let (_g, _aut, _table, diag) =
            pipeline("s ::= a.\na ::= B.\nc ::= D.\n");
        assert!(diag
            .messages()
            .iter()
            .any(|m| m.contains("This rule can not be reduced.")));
    }

    #[test]
    fn default_compression_folds_uniform_reduces() {
        let (g, _aut, mut table, _diag) =
            pipeline("%left PLUS.\ne ::= e PLUS e.\ne ::= NUM.\n");
        compress_tables(&g, &mut table);
        let default_symbol = g.default_symbol.unwrap();
        // e ::= NUM reduces on both end-of-input and PLUS, so that
        // state must fold into a single {default} action with the
        // displaced reduce left behind as NOT_USED.
        let folded: Vec<_> = table
            .states
            .iter()
            .flatten()
            .filter(|a| a.lookahead == default_symbol)
            .collect();
        assert!(!folded.is_empty(), "expected at least one {{default}} action");
        assert!(table
            .states
            .iter()
            .flatten()
            .any(|a| matches!(a.kind, ActionKind::NotUsed(_))));
    }

    #[test]
    fn single_reduce_states_are_not_folded() {
        let (g, _aut, mut table, _diag) = pipeline("s ::= e SEMI.\ne ::= NUM.\n");
        compress_tables(&g, &mut table);
        let default_symbol = g.default_symbol.unwrap();
        // Every reducing state here sees exactly one lookahead, and a
        // lone reduce is cheaper left where it is.
        assert!(table
            .states
            .iter()
            .flatten()
            .all(|a| a.lookahead != default_symbol));
    }

    #[test]
    fn compression_is_idempotent() {
        let (g, _aut, mut table, _diag) =
            pipeline("%left PLUS.\ne ::= e PLUS e.\ne ::= NUM.\n");
        compress_tables(&g, &mut table);
        let once = table.states.clone();
        compress_tables(&g, &mut table);
        assert_eq!(once, table.states);
    }
}
