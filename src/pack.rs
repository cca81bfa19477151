//! Packed action-table construction.
//!
//! Each state's surviving actions are hashed into an open-addressed
//! table whose size is the smallest power of two that holds them;
//! lookup in the generated parser is `table[start + (symbol & mask)]`
//! followed by the collision chain. The per-state tables are
//! concatenated into one global array.

use crate::grammar::Grammar;
use crate::table::{Action, ActionKind, ActionTable};

/// The numeric code of an action in the generated tables, or `None`
/// for actions that are not emitted (resolved and not-used entries).
pub fn compute_action(nstate: usize, nrule: usize, action: &Action) -> Option<usize> {
    match action.kind {
        ActionKind::Shift(to) => Some(to.index()),
        ActionKind::Reduce(rule) => Some(nstate + rule.index()),
        ActionKind::Error => Some(nstate + nrule),
        ActionKind::Accept => Some(nstate + nrule + 1),
        _ => None,
    }
}

/// One filled slot of the global table. `next` is the global index of
/// the following entry on the same collision chain, when any.
#[derive(Debug, Clone)]
pub struct PackedEntry {
    pub lookahead: usize,
    pub code: usize,
    pub next: Option<usize>,
    /// The action the slot was packed from, kept for the commented
    /// table listing in the generated source.
    pub action: Action,
}

#[derive(Debug, Clone)]
pub struct PackedState {
    /// Offset of this state's sub-table in the global array.
    pub start: usize,
    /// `tablesize - 1`; the hash is `symbol_index & mask`.
    pub mask: usize,
    /// Action taken on any lookahead that is not in the table.
    pub default_code: usize,
}

#[derive(Debug)]
pub struct PackedTables {
    pub entries: Vec<Option<PackedEntry>>,
    pub states: Vec<PackedState>,
}

impl PackedTables {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn pack(g: &Grammar, table: &ActionTable) -> PackedTables {
    let nstate = table.states.len();
    let nrule = g.rules.len();
    let default_symbol = g.default_symbol;

    let mut entries: Vec<Option<PackedEntry>> = Vec::new();
    let mut packed_states: Vec<PackedState> = Vec::new();

    for actions in &table.states {
        let start = entries.len();

        // Split the state's actions into the hashed entries and the
        // default; the {default} pseudo-symbol is never hashed.
        let mut default_code = nstate + nrule;
        let mut hashed: Vec<(usize, usize, Action)> = Vec::new();
        for action in actions {
            let Some(code) = compute_action(nstate, nrule, action) else {
                continue;
            };
            if Some(action.lookahead) == default_symbol {
                default_code = code;
            } else {
                hashed.push((g.sym(action.lookahead).index, code, action.clone()));
            }
        }

        let naction = hashed.len();
        let mut tablesize = 1;
        while tablesize < naction {
            tablesize += tablesize;
        }

        // Initial bucketing: chains grow from the front, so the last
        // action hashed to a bucket sits in the slot itself.
        let mut slots: Vec<Option<usize>> = vec![None; tablesize];
        let mut chain: Vec<Option<usize>> = vec![None; naction];
        for (i, &(symbol_index, _, _)) in hashed.iter().enumerate() {
            let h = symbol_index & (tablesize - 1);
            chain[i] = slots[h];
            slots[h] = Some(i);
        }

        // Relocate collision victims into free slots, remembering for
        // each slot where its chain continues. Moving an entry can
        // free up a slot before the sweep position, in which case the
        // sweep backs up to fill it.
        let mut link: Vec<Option<usize>> = vec![None; tablesize];
        let mut j = 0;
        let mut k = 0;
        while j < tablesize {
            let displaced = match slots[j] {
                Some(a) => chain[a].take(),
                None => None,
            };
            if let Some(displaced) = displaced {
                while slots[k].is_some() {
                    k += 1;
                }
                slots[k] = Some(displaced);
                link[j] = Some(k);
                if k < j {
                    j = k;
                    continue;
                }
            }
            j += 1;
        }

        for j in 0..tablesize {
            entries.push(slots[j].map(|a| {
                let (lookahead, code, action) = &hashed[a];
                PackedEntry {
                    lookahead: *lookahead,
                    code: *code,
                    next: link[j].map(|k| start + k),
                    action: action.clone(),
                }
            }));
        }

        packed_states.push(PackedState {
            start,
            mask: tablesize - 1,
            default_code,
        });
    }

    PackedTables {
        entries,
        states: packed_states,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::SymbolId;
    use crate::lr0::StateId;
    use crate::table::Action;

    fn shift(g: &Grammar, name: &str, to: u32) -> Action {
        Action {
            lookahead: g.lookup(name).unwrap(),
            kind: ActionKind::Shift(StateId::from_index(to as usize)),
        }
    }

    fn grammar_with(names: &[&str]) -> (Grammar, Vec<SymbolId>) {
        let mut g = Grammar::new("test.y");
        let ids = names.iter().map(|&n| g.symbol(n)).collect();
        g.finalize();
        (g, ids)
    }

    #[test]
    fn table_size_is_a_power_of_two() {
        let (g, _) = grammar_with(&["AA", "BB", "CC"]);
        let table = ActionTable {
            states: vec![vec![
                shift(&g, "AA", 1),
                shift(&g, "BB", 2),
                shift(&g, "CC", 3),
            ]],
            nconflict: 0,
        };
        let packed = pack(&g, &table);
        assert_eq!(packed.len(), 4);
        assert_eq!(packed.states[0].mask, 3);
    }

    #[test]
    fn empty_state_still_occupies_one_slot() {
        let (g, _) = grammar_with(&[]);
        let table = ActionTable {
            states: vec![vec![]],
            nconflict: 0,
        };
        let packed = pack(&g, &table);
        assert_eq!(packed.len(), 1);
        assert!(packed.entries[0].is_none());
        // One state, no rules: the implicit default is the error
        // action, nstate + nrule.
        assert_eq!(packed.states[0].default_code, 1);
    }

    #[test]
    fn collisions_chain_to_relocated_slots() {
        // Two symbols whose indices share the low bit collide in a
        // size-2 table; the loser must be reachable through `next`.
        let (g, _) = grammar_with(&["AA", "CC", "EE"]);
        // Indices: $=0, AA=1, CC=2, EE=3. AA and EE both hash to 1.
        let table = ActionTable {
            states: vec![vec![shift(&g, "AA", 1), shift(&g, "EE", 2)]],
            nconflict: 0,
        };
        let packed = pack(&g, &table);
        assert_eq!(packed.len(), 2);
        let filled: Vec<_> = packed.entries.iter().flatten().collect();
        assert_eq!(filled.len(), 2);
        let head = packed.entries[1].as_ref().expect("bucket 1 is filled");
        let next = head.next.expect("chain continues");
        let tail = packed.entries[next].as_ref().unwrap();
        assert_ne!(head.lookahead, tail.lookahead);
        assert!(tail.next.is_none());
    }

    #[test]
    fn every_action_lands_in_some_slot() {
        let (g, _) = grammar_with(&["AA", "BB", "CC", "DD", "EE"]);
        let actions: Vec<Action> = ["AA", "BB", "CC", "DD", "EE"]
            .iter()
            .enumerate()
            .map(|(i, n)| shift(&g, n, i as u32 + 1))
            .collect();
        let lookaheads: Vec<usize> = actions
            .iter()
            .map(|a| g.sym(a.lookahead).index)
            .collect();
        let table = ActionTable {
            states: vec![actions],
            nconflict: 0,
        };
        let packed = pack(&g, &table);
        assert_eq!(packed.len(), 8);
        let mut seen: Vec<usize> = packed
            .entries
            .iter()
            .flatten()
            .map(|e| e.lookahead)
            .collect();
        seen.sort_unstable();
        let mut expected = lookaheads;
        expected.sort_unstable();
        assert_eq!(seen, expected);
    }
}
