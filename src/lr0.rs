//! LR(0) machine construction.
//!
//! States are discovered from the start state outward through a
//! worklist. Each state's closure is computed once; configurations are
//! interned by (rule, dot) only for the state under construction, and
//! two states are the same state exactly when their sorted basis lists
//! match. While shifts are wired up, every advanced configuration
//! records a backward propagation link to its predecessor so the LALR
//! follow sets can be pushed through the machine afterwards.

use crate::diag::{grammar_error, Reporter};
use crate::first_sets::first_of_suffix;
use crate::grammar::{Grammar, RuleId, SymbolId, SymbolKind, TerminalSet};
use crate::types::Map;
use std::collections::VecDeque;
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(u32);

impl StateId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl fmt::Debug for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ConfigId(u32);

impl ConfigId {
    pub(crate) fn arena(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_arena(index: usize) -> Self {
        Self(index as u32)
    }
}

impl fmt::Debug for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C#{:03}", self.0)
    }
}

/// A dotted rule plus the follow set and propagation links attached to
/// it. The `complete` flag is scratch state shared by the shift
/// construction and the follow fixed point.
#[derive(Debug)]
pub struct Config {
    pub rule: RuleId,
    pub dot: usize,
    pub follow: TerminalSet,
    pub fwd: Vec<ConfigId>,
    pub bwd: Vec<ConfigId>,
    pub state: StateId,
    pub complete: bool,
}

#[derive(Debug)]
pub struct State {
    /// Kernel configurations, sorted by (rule, dot).
    pub basis: Vec<ConfigId>,
    /// Full closure, sorted by (rule, dot); includes the basis.
    pub configs: Vec<ConfigId>,
    /// Shift transitions in discovery order, on terminals and
    /// nonterminals alike.
    pub shifts: Vec<(SymbolId, StateId)>,
}

#[derive(Debug)]
pub struct Automaton {
    pub configs: Vec<Config>,
    pub states: Vec<State>,
    pub start_symbol: SymbolId,
}

impl Automaton {
    pub fn config(&self, id: ConfigId) -> &Config {
        &self.configs[id.arena()]
    }

    pub fn nstate(&self) -> usize {
        self.states.len()
    }
}

/// A basis configuration for a state that may not exist yet, carrying
/// the backward links to wire into whichever state it lands in.
struct PendingConfig {
    rule: RuleId,
    dot: usize,
    bwd: Vec<ConfigId>,
}

pub fn build(g: &Grammar, diag: &mut Reporter) -> Automaton {
    let start = resolve_start(g, diag);

    for rule in &g.rules {
        for item in &rule.rhs {
            if item.symbol == start {
                grammar_error!(
                    diag,
                    0,
                    "The start symbol \"{}\" occurs on the right-hand side of a rule. \
                     This will result in a parser which does not work properly.",
                    g.sym(start).name
                );
            }
        }
    }

    let mut builder = Builder {
        g,
        diag,
        configs: Vec::new(),
        states: Vec::new(),
        by_basis: Map::default(),
        worklist: VecDeque::new(),
    };

    let pending = g
        .sym(start)
        .rules
        .iter()
        .map(|&rule| PendingConfig {
            rule,
            dot: 0,
            bwd: Vec::new(),
        })
        .collect();
    let start_state = builder.getstate(pending);

    // The start state's kernel follows on end-of-input; everything
    // else arrives by propagation.
    let seed: Vec<ConfigId> = builder.states[start_state.index()].basis.clone();
    for cid in seed {
        builder.configs[cid.arena()].follow.insert(0);
    }

    while let Some(state) = builder.worklist.pop_front() {
        builder.build_shifts(state);
    }

    tracing::debug!(
        nstate = builder.states.len(),
        nconfig = builder.configs.len(),
        "built LR(0) machine"
    );

    Automaton {
        configs: builder.configs,
        states: builder.states,
        start_symbol: start,
    }
}

fn resolve_start(g: &Grammar, diag: &mut Reporter) -> SymbolId {
    if let Some(start) = &g.start {
        match g.lookup(start) {
            Some(id) => return id,
            None => {
                let fallback = &g.sym(g.rules[0].lhs).name;
                grammar_error!(
                    diag,
                    0,
                    "The specified start symbol \"{start}\" is not a nonterminal of \
                     this grammar. \"{fallback}\" will be used as the start symbol \
                     instead."
                );
            }
        }
    }
    g.rules[0].lhs
}

struct Builder<'g, 'd> {
    g: &'g Grammar,
    diag: &'d mut Reporter,
    configs: Vec<Config>,
    states: Vec<State>,
    by_basis: Map<Vec<(RuleId, usize)>, StateId>,
    worklist: VecDeque<StateId>,
}

impl Builder<'_, '_> {
    /// Return the state whose basis is `pending`, creating it (and
    /// queueing it for shift construction) when it is new. For an
    /// already-known state only the pending backward links survive:
    /// they are merged pairwise into the existing basis, which is in
    /// the same (rule, dot) order.
    fn getstate(&mut self, mut pending: Vec<PendingConfig>) -> StateId {
        let g = self.g;
        pending.sort_by_key(|p| (p.rule, p.dot));
        let key: Vec<(RuleId, usize)> = pending.iter().map(|p| (p.rule, p.dot)).collect();

        if let Some(&existing) = self.by_basis.get(&key) {
            let basis = self.states[existing.index()].basis.clone();
            debug_assert_eq!(basis.len(), pending.len());
            for (p, cid) in pending.into_iter().zip(basis) {
                self.configs[cid.arena()].bwd.extend(p.bwd);
            }
            return existing;
        }

        let id = StateId(self.states.len() as u32);
        let mut intern: Map<(RuleId, usize), ConfigId> = Map::default();
        let mut closure: Vec<ConfigId> = Vec::new();
        let mut basis: Vec<ConfigId> = Vec::new();

        for p in pending {
            let cid = self.new_config(p.rule, p.dot, p.bwd, id);
            intern.insert((p.rule, p.dot), cid);
            closure.push(cid);
            basis.push(cid);
        }

        // Closure: newly added configurations are processed in turn,
        // so the loop naturally reaches a fixed point.
        let mut i = 0;
        while i < closure.len() {
            let cid = closure[i];
            i += 1;
            let rule = self.configs[cid.arena()].rule;
            let dot = self.configs[cid.arena()].dot;
            let rhs = &g.rule(rule).rhs;
            if dot >= rhs.len() {
                continue;
            }
            let sp = rhs[dot].symbol;
            if g.sym(sp).kind != SymbolKind::Nonterminal {
                continue;
            }
            if g.sym(sp).rules.is_empty() && sp != g.err_symbol {
                grammar_error!(
                    self.diag,
                    g.rule(rule).line,
                    "Nonterminal \"{}\" has no rules.",
                    g.sym(sp).name
                );
            }
            for &new_rule in &g.sym(sp).rules {
                let ncid = match intern.get(&(new_rule, 0)) {
                    Some(&c) => c,
                    None => {
                        let c = self.new_config(new_rule, 0, Vec::new(), id);
                        intern.insert((new_rule, 0), c);
                        closure.push(c);
                        c
                    }
                };
                // Seed the new configuration's follow set from what can
                // come after `sp` in the enclosing rule; if that suffix
                // can vanish, the enclosing follow set must flow in too.
                let mut fws = std::mem::take(&mut self.configs[ncid.arena()].follow);
                let fell_off = first_of_suffix(g, rule, dot + 1, &mut fws);
                self.configs[ncid.arena()].follow = fws;
                if fell_off {
                    self.configs[cid.arena()].fwd.push(ncid);
                }
            }
        }

        closure.sort_by_key(|&c| (self.configs[c.arena()].rule, self.configs[c.arena()].dot));
        self.states.push(State {
            basis,
            configs: closure,
            shifts: Vec::new(),
        });
        self.by_basis.insert(key, id);
        self.worklist.push_back(id);
        id
    }

    /// Compute all successor states of `st`. Configurations sharing
    /// the symbol after their dot contribute to one successor basis and
    /// are marked complete so each is consumed exactly once.
    fn build_shifts(&mut self, st: StateId) {
        let g = self.g;
        let configs = self.states[st.index()].configs.clone();
        for &cid in &configs {
            self.configs[cid.arena()].complete = false;
        }

        for i in 0..configs.len() {
            let cid = configs[i];
            if self.configs[cid.arena()].complete {
                continue;
            }
            let rule = self.configs[cid.arena()].rule;
            let dot = self.configs[cid.arena()].dot;
            if dot >= g.rule(rule).rhs.len() {
                continue;
            }
            let sp = g.rule(rule).rhs[dot].symbol;

            let mut pending = Vec::new();
            for &bcid in &configs[i..] {
                let bc = &self.configs[bcid.arena()];
                if bc.complete || bc.dot >= g.rule(bc.rule).rhs.len() {
                    continue;
                }
                if g.rule(bc.rule).rhs[bc.dot].symbol != sp {
                    continue;
                }
                let (brule, bdot) = (bc.rule, bc.dot);
                self.configs[bcid.arena()].complete = true;
                pending.push(PendingConfig {
                    rule: brule,
                    dot: bdot + 1,
                    bwd: vec![bcid],
                });
            }

            let next = self.getstate(pending);
            self.states[st.index()].shifts.push((sp, next));
        }
    }

    fn new_config(&mut self, rule: RuleId, dot: usize, bwd: Vec<ConfigId>, state: StateId) -> ConfigId {
        let cid = ConfigId(self.configs.len() as u32);
        self.configs.push(Config {
            rule,
            dot,
            follow: TerminalSet::default(),
            fwd: Vec::new(),
            bwd,
            state,
            complete: false,
        });
        cid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::first_sets;
    use crate::syntax;

    fn built(src: &str) -> (Grammar, Automaton, Reporter) {
        let mut g = Grammar::new("test.y");
        let mut diag = Reporter::new("test.y");
        syntax::parse(src, &mut g, &mut diag);
        g.finalize();
        first_sets::find_rule_precedences(&mut g);
        first_sets::find_first_sets(&mut g);
        let aut = build(&g, &mut diag);
        (g, aut, diag)
    }

    #[test]
    fn single_rule_grammar() {
        let (g, aut, diag) = built("prog ::= BEGIN END.\n");
        assert_eq!(diag.count(), 0);
        // prog ::= * BEGIN END, then one state per shifted symbol.
        assert_eq!(aut.nstate(), 3);
        let s0 = &aut.states[0];
        assert_eq!(s0.configs.len(), 1);
        assert_eq!(s0.shifts.len(), 1);
        assert_eq!(s0.shifts[0].0, g.lookup("BEGIN").unwrap());
    }

    #[test]
    fn states_with_equal_basis_are_merged() {
        // Both arms end in the same kernel {x ::= X *}, which must be
        // interned once no matter how it is reached.
        let (g, aut, diag) = built(
            "s ::= a.\ns ::= b.\na ::= X.\nb ::= X Y.\n",
        );
        assert_eq!(diag.count(), 0);
        let x = g.lookup("X").unwrap();
        let targets: Vec<StateId> = aut
            .states
            .iter()
            .flat_map(|st| st.shifts.iter())
            .filter(|(sym, _)| *sym == x)
            .map(|&(_, to)| to)
            .collect();
        assert_eq!(targets.len(), 1);
    }

    #[test]
    fn closure_seeds_follow_from_suffix() {
        let (g, aut, diag) = built("s ::= e SEMI.\ne ::= NUM.\n");
        assert_eq!(diag.count(), 0);
        let semi = g.sym(g.lookup("SEMI").unwrap()).index;
        // The closure config e ::= * NUM must carry SEMI in its follow
        // set already, before any propagation runs.
        let e_rule = g.sym(g.lookup("e").unwrap()).rules[0];
        let cfg = aut.states[0]
            .configs
            .iter()
            .map(|&c| aut.config(c))
            .find(|c| c.rule == e_rule && c.dot == 0)
            .unwrap();
        assert!(cfg.follow.contains(semi));
    }

    #[test]
    fn missing_rules_are_reported() {
        let (_g, _aut, diag) = built("s ::= t.\n");
        assert!(diag
            .messages()
            .iter()
            .any(|m| m.contains("\"t\" has no rules")));
    }

    #[test]
    fn start_on_rhs_is_reported() {
        let (_g, _aut, diag) = built("s ::= s X.\ns ::= X.\n");
        assert!(diag
            .messages()
            .iter()
            .any(|m| m.contains("occurs on the right-hand side")));
    }
}
