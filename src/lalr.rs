//! LALR(1) follow-set propagation.
//!
//! Shift construction leaves backward links on every advanced
//! configuration. Inverting them gives the forward edges along which a
//! follow set must flow, and a plain union-to-fixpoint over those edges
//! yields the LALR(1) follow sets. Termination is guaranteed because
//! follow sets only grow and are bounded by the terminal alphabet.

use crate::lr0::{Automaton, ConfigId};

/// Turn every backward propagation link into a forward link on the
/// source configuration. Closure-time links are already forward links
/// and stay where they are.
pub fn find_links(aut: &mut Automaton) {
    for ci in 0..aut.configs.len() {
        let bwd = std::mem::take(&mut aut.configs[ci].bwd);
        for &src in &bwd {
            let target = ConfigId::from_arena(ci);
            aut.configs[src.arena()].fwd.push(target);
        }
        aut.configs[ci].bwd = bwd;
    }
}

/// Push follow sets along the forward links until nothing changes.
/// A configuration whose set grows is re-marked incomplete so it gets
/// another chance to push the new members onward.
pub fn find_follow_sets(aut: &mut Automaton) {
    for config in &mut aut.configs {
        config.complete = false;
    }

    loop {
        let mut progress = false;
        for ci in 0..aut.configs.len() {
            if aut.configs[ci].complete {
                continue;
            }
            let follow = aut.configs[ci].follow.clone();
            let fwd = aut.configs[ci].fwd.clone();
            for target in fwd {
                if aut.configs[target.arena()].follow.union_with(&follow) {
                    aut.configs[target.arena()].complete = false;
                    progress = true;
                }
            }
            aut.configs[ci].complete = true;
        }
        if !progress {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::diag::Reporter;
    use crate::first_sets;
    use crate::grammar::Grammar;
    use crate::lr0::{self, Automaton};
    use crate::syntax;

    fn propagated(src: &str) -> (Grammar, Automaton) {
        let mut g = Grammar::new("test.y");
        let mut diag = Reporter::new("test.y");
        syntax::parse(src, &mut g, &mut diag);
        assert_eq!(diag.count(), 0, "unexpected errors: {:?}", diag.messages());
        g.finalize();
        first_sets::find_rule_precedences(&mut g);
        first_sets::find_first_sets(&mut g);
        let mut aut = lr0::build(&g, &mut diag);
        super::find_links(&mut aut);
        super::find_follow_sets(&mut aut);
        (g, aut)
    }

    #[test]
    fn follow_reaches_completed_configs() {
        let (g, aut) = propagated("s ::= e SEMI.\ne ::= NUM.\n");
        let semi = g.sym(g.lookup("SEMI").unwrap()).index;
        let e_rule = g.sym(g.lookup("e").unwrap()).rules[0];
        // In the state reached by NUM, e ::= NUM * must be reducible
        // on SEMI but not on end-of-input.
        let cfg = aut
            .configs
            .iter()
            .find(|c| c.rule == e_rule && c.dot == 1)
            .unwrap();
        assert!(cfg.follow.contains(semi));
        assert!(!cfg.follow.contains(0));
    }

    #[test]
    fn end_of_input_reaches_final_reduction() {
        let (g, aut) = propagated("s ::= e SEMI.\ne ::= NUM.\n");
        let s_rule = g.sym(g.lookup("s").unwrap()).rules[0];
        let cfg = aut
            .configs
            .iter()
            .find(|c| c.rule == s_rule && c.dot == 2)
            .unwrap();
        assert!(cfg.follow.contains(0));
    }

    #[test]
    fn follow_flows_through_merged_states() {
        // The kernel e ::= e PLUS e * is reached both from the outer
        // expression and from a nested one; its follow set must carry
        // both end-of-input and PLUS.
        let (g, aut) = propagated("e ::= e PLUS e.\ne ::= NUM.\n");
        let plus = g.sym(g.lookup("PLUS").unwrap()).index;
        let top = g.sym(g.lookup("e").unwrap()).rules[0];
        let cfg = aut
            .configs
            .iter()
            .find(|c| c.rule == top && c.dot == 3)
            .unwrap();
        assert!(cfg.follow.contains(0));
        assert!(cfg.follow.contains(plus));
    }
}
