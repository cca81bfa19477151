//! Human-readable reports: the `.out` state listing, the grammar
//! reprint and the statistics summary.

use crate::grammar::Grammar;
use crate::lr0::Automaton;
use crate::pack::PackedTables;
use crate::table::{Action, ActionKind, ActionTable};
use crate::util::display_fn;
use std::fmt::{self, Write as _};
use std::fs;
use std::io;
use std::path::Path;

/// Render one action the way the report shows it, or `None` for the
/// resolved and not-used entries that are deliberately omitted.
pub(crate) fn display_action<'g>(
    g: &'g Grammar,
    action: &'g Action,
    indent: usize,
) -> Option<impl fmt::Display + 'g> {
    match action.kind {
        ActionKind::ShiftResolved(_) | ActionKind::ReduceResolved(_) | ActionKind::NotUsed(_) => {
            None
        }
        kind => Some(display_fn(move |f| {
            let name = &g.sym(action.lookahead).name;
            match kind {
                ActionKind::Shift(to) => {
                    write!(f, "{name:>indent$} shift  {}", to.index())
                }
                ActionKind::Reduce(rule) => {
                    write!(f, "{name:>indent$} reduce {}", rule.index())
                }
                ActionKind::Accept => write!(f, "{name:>indent$} accept"),
                ActionKind::Error => write!(f, "{name:>indent$} error"),
                ActionKind::Conflict(rule) => {
                    write!(
                        f,
                        "{name:>indent$} reduce {:<3} ** Parsing conflict **",
                        rule.index()
                    )
                }
                _ => Ok(()),
            }
        })),
    }
}

/// Build the text of the state-by-state report. With `basis_only`,
/// closure-added configurations are left out of each state.
pub fn render_output(
    g: &Grammar,
    aut: &Automaton,
    table: &ActionTable,
    basis_only: bool,
) -> String {
    let mut out = String::new();
    for (i, state) in aut.states.iter().enumerate() {
        let _ = writeln!(out, "State {i}:");
        let configs = if basis_only {
            &state.basis
        } else {
            &state.configs
        };
        for &cid in configs {
            let config = aut.config(cid);
            let rule = g.rule(config.rule);
            if config.dot == rule.rhs.len() {
                let tag = format!("({})", config.rule.index());
                let _ = write!(out, "    {tag:>5} ");
            } else {
                let _ = write!(out, "          ");
            }
            let _ = writeln!(out, "{}", rule.display_dotted(g, config.dot));
        }
        let _ = writeln!(out);
        for action in &table.states[i] {
            if let Some(line) = display_action(g, action, 30) {
                let _ = writeln!(out, "{line}");
            }
        }
        let _ = writeln!(out);
    }
    out
}

pub fn write_output(
    g: &Grammar,
    aut: &Automaton,
    table: &ActionTable,
    basis_only: bool,
    path: &Path,
) -> io::Result<()> {
    fs::write(path, render_output(g, aut, table, basis_only))
}

/// Reproduce the grammar on stdout without actions or comments: a
/// column-packed symbol cross-reference followed by one line per rule.
pub fn reprint(g: &Grammar) {
    print!("{}", render_reprint(g));
}

pub fn render_reprint(g: &Grammar) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "// Reprint of input file \"{}\".", g.filename);
    let _ = writeln!(out, "// Symbols:");

    let maxlen = (0..g.nsymbol)
        .map(|i| g.sym(g.nth(i)).name.len())
        .max()
        .unwrap_or(0)
        .max(10);
    let ncolumns = (76 / (maxlen + 5)).max(1);
    let skip = (g.nsymbol + ncolumns - 1) / ncolumns;
    for row in 0..skip {
        let _ = write!(out, "//");
        let mut j = row;
        while j < g.nsymbol {
            let name = &g.sym(g.nth(j)).name;
            let _ = write!(out, " {j:3} {name:<maxlen$}");
            j += skip;
        }
        let _ = writeln!(out);
    }

    for rule in &g.rules {
        let _ = write!(out, "{}", rule.display(g));
        let _ = write!(out, ".");
        if let Some(prec) = rule.prec_sym {
            let _ = write!(out, " [{}]", g.sym(prec).name);
        }
        let _ = writeln!(out);
    }
    out
}

/// The `-s` summary printed to stdout.
pub fn print_statistics(g: &Grammar, aut: &Automaton, table: &ActionTable, packed: &PackedTables) {
    println!(
        "Parser statistics: {} terminals, {} nonterminals, {} rules",
        g.nterminal,
        g.nsymbol - g.nterminal,
        g.rules.len()
    );
    println!(
        "                   {} states, {} parser table entries, {} conflicts",
        aut.nstate(),
        packed.len(),
        table.nconflict
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Reporter;
    use crate::first_sets;
    use crate::lr0;
    use crate::syntax;

    fn full(src: &str) -> (Grammar, Automaton, ActionTable) {
        let mut g = Grammar::new("test.y");
        let mut diag = Reporter::new("test.y");
        syntax::parse(src, &mut g, &mut diag);
        g.finalize();
        first_sets::find_rule_precedences(&mut g);
        first_sets::find_first_sets(&mut g);
        let mut aut = lr0::build(&g, &mut diag);
        crate::lalr::find_links(&mut aut);
        crate::lalr::find_follow_sets(&mut aut);
        let table = crate::table::find_actions(&mut g, &aut, &mut diag);
        (g, aut, table)
    }

    #[test]
    fn report_shows_dots_and_rule_tags() {
        let (g, aut, table) = full("prog ::= a.\na ::= A.\n");
        let out = render_output(&g, &aut, &table, false);
        assert!(out.contains("State 0:"));
        assert!(out.contains("prog ::= * a"));
        // Completed configurations carry their rule number.
        assert!(out.contains("(1) a ::= A *"));
        assert!(out.contains("accept"));
    }

    #[test]
    fn basis_only_drops_closure_configs() {
        let (g, aut, table) = full("prog ::= a.\na ::= A.\n");
        let out = render_output(&g, &aut, &table, true);
        assert!(out.contains("prog ::= * a"));
        assert!(!out.contains("a ::= * A"));
    }

    #[test]
    fn resolved_actions_are_not_listed() {
        let (g, aut, table) = full("%left PLUS.\ne ::= e PLUS e.\ne ::= NUM.\n");
        let out = render_output(&g, &aut, &table, false);
        assert!(!out.contains("** Parsing conflict **"));
        // The losing shift on PLUS is resolved away, so the state
        // that keeps the reduce must not also list a shift on PLUS.
        let reducing_state = out
            .split("State ")
            .find(|s| s.contains("e ::= e PLUS e *"))
            .unwrap();
        assert!(reducing_state.contains("reduce 0"));
    }

    #[test]
    fn conflicts_are_marked() {
        let (g, aut, table) = full("e ::= e PLUS e.\ne ::= NUM.\n");
        let out = render_output(&g, &aut, &table, false);
        assert!(out.contains("** Parsing conflict **"));
    }

    #[test]
    fn reprint_round_trips_rules() {
        let (g, _aut, _table) = full("%left PLUS.\ne ::= e PLUS e.\ne ::= NUM.\n");
        let text = render_reprint(&g);
        assert!(text.contains("e ::= e PLUS e. [PLUS]"));
        assert!(text.contains("e ::= NUM."));

        // Scanning the reprint again yields the same rule shapes.
        let mut g2 = Grammar::new("reprint.y");
        let mut diag = Reporter::new("reprint.y");
        syntax::parse(&text, &mut g2, &mut diag);
        assert_eq!(diag.count(), 0, "{:?}", diag.messages());
        assert_eq!(g2.rules.len(), g.rules.len());
        for (a, b) in g.rules.iter().zip(&g2.rules) {
            assert_eq!(g.sym(a.lhs).name, g2.sym(b.lhs).name);
            assert_eq!(a.rhs.len(), b.rhs.len());
        }
    }
}
