//! Parser source generation.
//!
//! The generated parser is ordinary C built around a driver template:
//! the driver text is copied through verbatim, and at each `%%` cut
//! point one generated fragment is spliced in. What gets generated
//! here, in order: the include block, token defines, framework
//! defines and the stack union, the packed action table, the state
//! table, symbol names, destructor dispatch, the user's handler
//! fragments, the rule info table and the per-rule reduce bodies with
//! `$$`/alias references rewritten into stack slots.

use crate::diag::{grammar_error, Reporter};
use crate::grammar::{CodeBlock, Grammar, RuleId, SymbolId, SymbolKind};
use crate::lr0::Automaton;
use crate::pack::PackedTables;
use crate::report::display_action;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the driver template looked up next to the executable (and
/// on `$PATH`) when the grammar directory has no `.lt` file and no
/// explicit template was given.
pub const DEFAULT_TEMPLATE: &str = "citpar.c";

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("can't find the parser driver template file \"{0}\"")]
    TemplateNotFound(String),
    #[error("can't open the template file \"{path}\"")]
    TemplateRead {
        path: PathBuf,
        source: io::Error,
    },
    #[error("can't write file \"{path}\"")]
    Write {
        path: PathBuf,
        source: io::Error,
    },
}

/// Locate the driver template: an explicit `-t` path wins, then a
/// `.lt` file next to the input, then the stock template next to the
/// executable or on `$PATH`.
pub fn find_template(input: &Path, explicit: Option<&Path>) -> Result<PathBuf, CodegenError> {
    if let Some(path) = explicit {
        return Ok(path.to_owned());
    }
    let sibling = input.with_extension("lt");
    if sibling.exists() {
        return Ok(sibling);
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let candidate = dir.join(DEFAULT_TEMPLATE);
            if candidate.exists() {
                return Ok(candidate);
            }
        }
    }
    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            let candidate = dir.join(DEFAULT_TEMPLATE);
            if candidate.exists() {
                return Ok(candidate);
            }
        }
    }
    Err(CodegenError::TemplateNotFound(DEFAULT_TEMPLATE.to_owned()))
}

struct Template {
    lines: Vec<String>,
    pos: usize,
}

impl Template {
    fn load(path: &Path) -> Result<Self, CodegenError> {
        let text = fs::read_to_string(path).map_err(|source| CodegenError::TemplateRead {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self {
            lines: text.lines().map(str::to_owned).collect(),
            pos: 0,
        })
    }

    /// Copy template lines to `out` until the next `%%` marker, which
    /// is consumed. When `name` is given, every word beginning with
    /// `Parse` is renamed to begin with it instead.
    fn xfer(&mut self, out: &mut Output, name: Option<&str>) {
        while self.pos < self.lines.len() {
            let line = &self.lines[self.pos];
            self.pos += 1;
            if line.starts_with("%%") {
                return;
            }
            match name {
                Some(name) => out.line(format_args!("{}", rename_parse(line, name))),
                None => out.line(format_args!("{line}")),
            }
        }
    }
}

/// Replace every `Parse`-prefixed word in a template line with the
/// configured parser name. Only a prefix match counts, and only when
/// the previous byte could not continue an identifier.
fn rename_parse(line: &str, name: &str) -> String {
    let bytes = line.as_bytes();
    let mut out = String::with_capacity(line.len());
    let mut i = 0;
    let mut copied = 0;
    while i < bytes.len() {
        if bytes[i] == b'P'
            && line[i..].starts_with("Parse")
            && (i == 0 || !(bytes[i - 1].is_ascii_alphanumeric() || bytes[i - 1] == b'_'))
        {
            out.push_str(&line[copied..i]);
            out.push_str(name);
            i += 5;
            copied = i;
        } else {
            i += 1;
        }
    }
    out.push_str(&line[copied..]);
    out
}

/// Output accumulator that tracks the current line number so `#line`
/// directives can point back into the generated file.
struct Output {
    buf: String,
    lineno: usize,
}

impl Output {
    fn new() -> Self {
        Self {
            buf: String::new(),
            lineno: 1,
        }
    }

    fn line(&mut self, args: std::fmt::Arguments<'_>) {
        let _ = writeln!(self.buf, "{args}");
        self.lineno += 1;
    }

    fn raw(&mut self, text: &str) {
        self.buf.push_str(text);
        self.lineno += text.bytes().filter(|&b| b == b'\n').count();
    }
}

/// Type-slot assignment for the value-stack union. Slot 0 is shared
/// by every symbol without a `%type` annotation, each distinct
/// datatype string gets one slot, and the error symbol always has its
/// own integer-typed slot.
pub(crate) struct TypeTable {
    dtnum: Vec<usize>,
    types: Vec<Option<String>>,
    pub error_dtnum: usize,
}

impl TypeTable {
    pub(crate) fn dtnum(&self, id: SymbolId) -> usize {
        self.dtnum[id.arena()]
    }
}

pub(crate) fn build_type_table(g: &Grammar) -> TypeTable {
    let arraysize = g.nsymbol * 2;
    let mut types: Vec<Option<String>> = vec![None; arraysize];
    let mut dtnum = vec![0usize; g.sorted.len()];

    for i in 0..g.nsymbol {
        let id = g.nth(i);
        if id == g.err_symbol {
            dtnum[id.arena()] = arraysize + 1;
            continue;
        }
        let sym = g.sym(id);
        let Some(datatype) = sym.datatype.as_deref().filter(|_| sym.kind == SymbolKind::Nonterminal)
        else {
            continue;
        };
        let datatype = datatype.trim();

        let mut hash: i32 = 0;
        for b in datatype.bytes() {
            hash = hash.wrapping_mul(53).wrapping_add(b as i32);
        }
        let mut h = (hash as i64).abs() as usize % arraysize;
        loop {
            match &types[h] {
                Some(existing) if existing == datatype => break,
                Some(_) => {
                    h += 1;
                    if h >= arraysize {
                        h = 0;
                    }
                }
                None => {
                    types[h] = Some(datatype.to_owned());
                    break;
                }
            }
        }
        dtnum[id.arena()] = h + 1;
    }

    TypeTable {
        dtnum,
        types,
        error_dtnum: arraysize + 1,
    }
}

/// Everything `write_parser` needs to know about where output goes.
pub struct EmitPaths<'a> {
    pub template: &'a Path,
    pub source: &'a Path,
    /// Basename of the token header, included from the source file
    /// under `-m`.
    pub header_name: &'a str,
}

pub fn write_parser(
    g: &Grammar,
    aut: &Automaton,
    packed: &PackedTables,
    paths: &EmitPaths<'_>,
    mh: bool,
    diag: &mut Reporter,
) -> Result<(), CodegenError> {
    let mut template = Template::load(paths.template)?;
    let mut out = Output::new();
    let name = g.name.as_deref();
    let parser_name = name.unwrap_or("Parse");
    let outname = paths.source.display().to_string();
    let nstate = aut.nstate();
    let nrule = g.rules.len();
    let types = build_type_table(g);

    template.xfer(&mut out, name);

    // Include block.
    if let Some(include) = &g.include {
        print_fragment(&mut out, g, include, &outname);
    }
    if mh {
        out.line(format_args!("#include \"{}\"", paths.header_name));
    }
    template.xfer(&mut out, name);

    // Token defines live in the header normally; under -m they are
    // emitted here for the header generator to collect.
    if mh {
        out.line(format_args!("#if INTERFACE"));
        let prefix = g.token_prefix.as_deref().unwrap_or("");
        for i in 1..g.nterminal {
            let sym = g.sym(g.nth(i));
            out.line(format_args!("#define {}{:<30} {:2}", prefix, sym.name, i));
        }
        out.line(format_args!("#endif"));
    }
    template.xfer(&mut out, name);

    // Framework defines and the value-stack union.
    out.line(format_args!(
        "#define YYCODETYPE {}",
        if g.nsymbol > 250 { "int" } else { "unsigned char" }
    ));
    out.line(format_args!("#define YYNOCODE {}", g.nsymbol + 1));
    out.line(format_args!(
        "#define YYACTIONTYPE {}",
        if nstate + nrule > 250 { "int" } else { "unsigned char" }
    ));
    print_stack_union(&mut out, g, &types, parser_name, mh);
    match &g.stack_size {
        Some(size) => {
            if size.parse::<i64>().map_or(true, |n| n <= 0) {
                grammar_error!(
                    diag,
                    0,
                    "Illegal stack size: [{size}].  The stack size should be an \
                     integer constant."
                );
                out.line(format_args!("#define YYSTACKDEPTH 100"));
            } else {
                out.line(format_args!("#define YYSTACKDEPTH {size}"));
            }
        }
        None => out.line(format_args!("#define YYSTACKDEPTH 100")),
    }
    if mh {
        out.line(format_args!("#if INTERFACE"));
    }
    match g.extra_argument.as_deref().filter(|arg| !arg.is_empty()) {
        Some(arg) => {
            // The bare argument name is the declaration minus its
            // trailing identifier, e.g. "void *ctx" -> "ctx".
            let trimmed = arg.trim_end();
            let split = trimmed
                .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .map(|p| p + 1)
                .unwrap_or(0);
            let arg_name = &trimmed[split..];
            out.line(format_args!("#define {parser_name}ARGDECL ,{arg_name}"));
            out.line(format_args!("#define {parser_name}XARGDECL {arg};"));
            out.line(format_args!("#define {parser_name}ANSIARGDECL ,{arg}"));
        }
        None => {
            out.line(format_args!("#define {parser_name}ARGDECL"));
            out.line(format_args!("#define {parser_name}XARGDECL"));
            out.line(format_args!("#define {parser_name}ANSIARGDECL"));
        }
    }
    if mh {
        out.line(format_args!("#endif"));
    }
    out.line(format_args!("#define YYNSTATE {nstate}"));
    out.line(format_args!("#define YYNRULE {nrule}"));
    out.line(format_args!(
        "#define YYERRORSYMBOL {}",
        g.sym(g.err_symbol).index
    ));
    out.line(format_args!("#define YYERRSYMDT yy{}", types.error_dtnum));
    template.xfer(&mut out, name);

    // The packed action table, one commented row per slot.
    for (i, state) in packed.states.iter().enumerate() {
        out.line(format_args!("/* State {i} */"));
        let size = state.mask + 1;
        for slot in &packed.entries[state.start..state.start + size] {
            match slot {
                None => out.line(format_args!("  {{YYNOCODE,0,0}}, /* Unused */")),
                Some(entry) => {
                    let chain = match entry.next {
                        Some(next) => format!("&yyActionTable[{next:4}] "),
                        None => "0                    ".to_owned(),
                    };
                    let comment = display_action(g, &entry.action, 22)
                        .map(|d| d.to_string())
                        .unwrap_or_default();
                    out.line(format_args!(
                        "  {{{:4},{:4}, {}}}, /* {} */",
                        entry.lookahead, entry.code, chain, comment
                    ));
                }
            }
        }
    }
    template.xfer(&mut out, name);

    // Per-state descriptors.
    for state in &packed.states {
        out.line(format_args!(
            "  {{ &yyActionTable[{}], {}, {}}},",
            state.start, state.mask, state.default_code
        ));
    }
    template.xfer(&mut out, name);

    // Symbol names.
    let mut column = 0;
    for i in 0..g.nsymbol {
        let quoted = format!("\"{}\",", g.sym(g.nth(i)).name);
        let _ = write!(out.buf, "  {quoted:<15}");
        column += 1;
        if column == 4 {
            out.raw("\n");
            column = 0;
        }
    }
    if column != 0 {
        out.raw("\n");
    }
    template.xfer(&mut out, name);

    // Destructor dispatch: one shared body for all tokens, then one
    // per nonterminal that declared a destructor.
    if g.token_dest.is_some() {
        let mut first_terminal = None;
        for i in 0..g.nsymbol {
            let id = g.nth(i);
            if g.sym(id).kind != SymbolKind::Terminal {
                continue;
            }
            first_terminal.get_or_insert(id);
            out.line(format_args!("    case {i}:"));
        }
        if let Some(id) = first_terminal {
            emit_destructor(&mut out, g, id, &types, &outname);
            out.line(format_args!("      break;"));
        }
    }
    for i in 0..g.nsymbol {
        let id = g.nth(i);
        if g.sym(id).kind == SymbolKind::Terminal || g.sym(id).destructor.is_none() {
            continue;
        }
        out.line(format_args!("    case {i}:"));
        emit_destructor(&mut out, g, id, &types, &outname);
        out.line(format_args!("      break;"));
    }
    template.xfer(&mut out, name);

    if let Some(overflow) = &g.stack_overflow {
        print_fragment(&mut out, g, overflow, &outname);
    }
    template.xfer(&mut out, name);

    // Rule information: LHS symbol number and RHS length.
    for rule in &g.rules {
        out.line(format_args!(
            "  {{ {}, {} }},",
            g.sym(rule.lhs).index,
            rule.rhs.len()
        ));
    }
    template.xfer(&mut out, name);

    // Reduce actions.
    for rid in g.rule_ids() {
        let rule = g.rule(rid);
        out.line(format_args!("      case {}:", rid.index()));
        let mut trace = format!("        YYTRACE(\"{} ::=", g.sym(rule.lhs).name);
        for item in &rule.rhs {
            let _ = write!(trace, " {}", g.sym(item.symbol).name);
        }
        out.line(format_args!("{trace}\")"));
        emit_rule_code(&mut out, g, rid, &types, &outname, diag);
        out.line(format_args!("        break;"));
    }
    template.xfer(&mut out, name);

    if let Some(failure) = &g.parse_failure {
        print_fragment(&mut out, g, failure, &outname);
    }
    template.xfer(&mut out, name);

    if let Some(error) = &g.syntax_error {
        print_fragment(&mut out, g, error, &outname);
    }
    template.xfer(&mut out, name);

    if let Some(accept) = &g.parse_accept {
        print_fragment(&mut out, g, accept, &outname);
    }
    template.xfer(&mut out, name);

    if let Some(extra) = &g.extra_code {
        print_fragment(&mut out, g, extra, &outname);
    }

    fs::write(paths.source, &out.buf).map_err(|source| CodegenError::Write {
        path: paths.source.to_owned(),
        source,
    })
}

/// Copy a user code fragment into the output bracketed by `#line`
/// directives, so C diagnostics point at the grammar file.
fn print_fragment(out: &mut Output, g: &Grammar, code: &CodeBlock, outname: &str) {
    out.line(format_args!("#line {} \"{}\"", code.line, g.filename));
    out.raw(&code.text);
    let next = out.lineno + 2;
    out.raw(&format!("\n#line {} \"{}\"\n", next, outname));
}

fn has_destructor(g: &Grammar, id: SymbolId) -> bool {
    if g.sym(id).kind == SymbolKind::Terminal {
        g.token_dest.is_some()
    } else {
        g.sym(id).destructor.is_some()
    }
}

/// Emit the destructor body for one symbol, expanding `$$` into the
/// slot of the value being destroyed.
fn emit_destructor(out: &mut Output, g: &Grammar, id: SymbolId, types: &TypeTable, outname: &str) {
    let code = if g.sym(id).kind == SymbolKind::Terminal {
        g.token_dest.as_ref()
    } else {
        g.sym(id).destructor.as_ref()
    };
    let Some(code) = code else { return };

    out.raw(&format!("#line {} \"{}\"\n{{", code.line, g.filename));
    let replaced = code
        .text
        .replace("$$", &format!("(yypminor->yy{})", types.dtnum(id)));
    out.raw(&replaced);
    let next = out.lineno + 2;
    out.raw(&format!("}}\n#line {} \"{}\"\n", next, outname));
}

/// Emit the body of a reduce case, rewriting alias references into
/// stack slots. An identifier equal to the LHS alias becomes the
/// reducer's output slot; one equal to an RHS alias becomes the
/// corresponding entry below the top of the stack. Aliases that are
/// declared but never mentioned are errors, and RHS values without an
/// alias get their destructor invoked instead of leaking.
fn emit_rule_code(
    out: &mut Output,
    g: &Grammar,
    rid: RuleId,
    types: &TypeTable,
    outname: &str,
    diag: &mut Reporter,
) {
    let rule = g.rule(rid);
    let nrhs = rule.rhs.len();
    let mut lhs_used = false;
    let mut used = vec![false; nrhs];

    if let Some(code) = &rule.code {
        out.raw(&format!("#line {} \"{}\"\n{{", code.line, g.filename));

        let text = code.text.as_bytes();
        let mut rewritten = String::new();
        let mut i = 0;
        let mut copied = 0;
        while i < text.len() {
            let b = text[i];
            let starts_ident = b.is_ascii_alphabetic()
                && (i == 0 || !(text[i - 1].is_ascii_alphanumeric() || text[i - 1] == b'_'));
            if !starts_ident {
                i += 1;
                continue;
            }
            let mut end = i + 1;
            while end < text.len() && (text[end].is_ascii_alphanumeric() || text[end] == b'_') {
                end += 1;
            }
            let word = &code.text[i..end];
            if rule.lhs_alias.as_deref() == Some(word) {
                rewritten.push_str(&code.text[copied..i]);
                let _ = write!(rewritten, "yygotominor.yy{}", types.dtnum(rule.lhs));
                lhs_used = true;
                copied = end;
            } else if let Some(pos) = rule
                .rhs
                .iter()
                .position(|item| item.alias.as_deref() == Some(word))
            {
                rewritten.push_str(&code.text[copied..i]);
                let offset = pos as isize - nrhs as isize + 1;
                let _ = write!(
                    rewritten,
                    "yymsp[{}].minor.yy{}",
                    offset,
                    types.dtnum(rule.rhs[pos].symbol)
                );
                used[pos] = true;
                copied = end;
            }
            i = end;
        }
        rewritten.push_str(&code.text[copied..]);
        out.raw(&rewritten);
        let next = out.lineno + 2;
        out.raw(&format!("}}\n#line {} \"{}\"\n", next, outname));
    }

    if let Some(alias) = rule.lhs_alias.as_deref() {
        if !lhs_used {
            grammar_error!(
                diag,
                rule.line,
                "Label \"{alias}\" for \"{}({alias})\" is never used.",
                g.sym(rule.lhs).name
            );
        }
    }

    for (pos, item) in rule.rhs.iter().enumerate() {
        match item.alias.as_deref() {
            Some(alias) if !used[pos] => {
                grammar_error!(
                    diag,
                    rule.line,
                    "Label \"{alias}\" for \"{}({alias})\" is never used.",
                    g.sym(item.symbol).name
                );
            }
            Some(_) => {}
            None => {
                let offset = pos as isize - nrhs as isize + 1;
                if has_destructor(g, item.symbol) {
                    out.line(format_args!(
                        "  yy_destructor({},&yymsp[{}].minor);",
                        g.sym(item.symbol).index,
                        offset
                    ));
                } else {
                    out.line(format_args!(
                        "        /* No destructor defined for {} */",
                        g.sym(item.symbol).name
                    ));
                }
            }
        }
    }
}

/// Print the value-stack union, one arm per distinct datatype.
fn print_stack_union(out: &mut Output, g: &Grammar, types: &TypeTable, parser_name: &str, mh: bool) {
    if mh {
        out.line(format_args!("#if INTERFACE"));
    }
    out.line(format_args!(
        "#define {}TOKENTYPE {}",
        parser_name,
        g.token_type.as_deref().unwrap_or("void*")
    ));
    if mh {
        out.line(format_args!("#endif"));
    }
    out.line(format_args!("typedef union {{"));
    out.line(format_args!("  {}TOKENTYPE yy0;", parser_name));
    for (i, datatype) in types.types.iter().enumerate() {
        if let Some(datatype) = datatype {
            out.line(format_args!("  {} yy{};", datatype, i + 1));
        }
    }
    out.line(format_args!("  int yy{};", types.error_dtnum));
    out.line(format_args!("}} YYMINORTYPE;"));
}

/// Write the token `#define` header, but only when its content would
/// actually change, so downstream builds keyed on the file's mtime
/// are not invalidated for nothing. Returns whether a write happened.
pub fn write_header(g: &Grammar, path: &Path) -> Result<bool, CodegenError> {
    let prefix = g.token_prefix.as_deref().unwrap_or("");
    let mut content = String::new();
    for i in 1..g.nterminal {
        let sym = g.sym(g.nth(i));
        let _ = writeln!(content, "#define {}{:<30} {:2}", prefix, sym.name, i);
    }

    if let Ok(existing) = fs::read_to_string(path) {
        if existing == content {
            return Ok(false);
        }
    }
    fs::write(path, content)
        .map(|()| true)
        .map_err(|source| CodegenError::Write {
            path: path.to_owned(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Reporter;
    use crate::syntax;

    fn grammar(src: &str) -> Grammar {
        let mut g = Grammar::new("test.y");
        let mut diag = Reporter::new("test.y");
        syntax::parse(src, &mut g, &mut diag);
        assert_eq!(diag.count(), 0, "{:?}", diag.messages());
        g.finalize();
        g
    }

    #[test]
    fn rename_parse_respects_word_boundaries() {
        assert_eq!(
            rename_parse("void Parse(void *p);", "Calc"),
            "void Calc(void *p);"
        );
        assert_eq!(
            rename_parse("ParseARGDECL and ReParse stay_Parse", "Calc"),
            "CalcARGDECL and ReParse stay_Parse"
        );
    }

    #[test]
    fn distinct_datatypes_get_distinct_slots() {
        let g = grammar(
            "%type a {int}\n%type b {double}\n%type c {int}\n\
             a ::= X.\nb ::= Y.\nc ::= Z.\n",
        );
        let types = build_type_table(&g);
        let a = types.dtnum(g.lookup("a").unwrap());
        let b = types.dtnum(g.lookup("b").unwrap());
        let c = types.dtnum(g.lookup("c").unwrap());
        assert_ne!(a, 0);
        assert_ne!(b, 0);
        assert_ne!(a, b);
        assert_eq!(a, c, "equal datatype text shares a slot");
    }

    #[test]
    fn untyped_symbols_share_slot_zero() {
        let g = grammar("a ::= X.\n");
        let types = build_type_table(&g);
        assert_eq!(types.dtnum(g.lookup("a").unwrap()), 0);
        assert_eq!(types.dtnum(g.lookup("X").unwrap()), 0);
        assert_eq!(types.dtnum(g.err_symbol), types.error_dtnum);
    }

    #[test]
    fn datatype_text_is_trimmed_before_hashing() {
        let g = grammar(
            "%type a { int }\n%type b {int}\na ::= X.\nb ::= Y.\n",
        );
        let types = build_type_table(&g);
        assert_eq!(
            types.dtnum(g.lookup("a").unwrap()),
            types.dtnum(g.lookup("b").unwrap())
        );
    }

    #[test]
    fn rule_code_rewrites_aliases() {
        let g = grammar("%type e {int}\ne(A) ::= e(B) PLUS e(C). { A = B + C; }\n e ::= NUM.\n");
        let types = build_type_table(&g);
        let mut out = Output::new();
        let mut diag = Reporter::new("test.y");
        emit_rule_code(
            &mut out,
            &g,
            g.rule_ids().next().unwrap(),
            &types,
            "out.c",
            &mut diag,
        );
        assert_eq!(diag.count(), 0, "{:?}", diag.messages());
        let dt = types.dtnum(g.lookup("e").unwrap());
        assert!(out.buf.contains(&format!("yygotominor.yy{dt} = yymsp[-2].minor.yy{dt} + yymsp[0].minor.yy{dt};")));
        // PLUS has no alias and no destructor.
        assert!(out.buf.contains("/* No destructor defined for PLUS */"));
    }

    #[test]
    fn unused_aliases_are_reported() {
        let g = grammar("e(A) ::= NUM(N). { A = 1; }\n");
        let types = build_type_table(&g);
        let mut out = Output::new();
        let mut diag = Reporter::new("test.y");
        emit_rule_code(
            &mut out,
            &g,
            g.rule_ids().next().unwrap(),
            &types,
            "out.c",
            &mut diag,
        );
        assert_eq!(diag.count(), 1);
        assert!(diag.messages()[0].contains("\"N\""));
    }

    #[test]
    fn unaliased_symbols_with_destructors_are_destroyed() {
        let g = grammar("%destructor e { free($$); }\ns ::= e SEMI.\ne ::= NUM.\n");
        let types = build_type_table(&g);
        let mut out = Output::new();
        let mut diag = Reporter::new("test.y");
        emit_rule_code(
            &mut out,
            &g,
            g.rule_ids().next().unwrap(),
            &types,
            "out.c",
            &mut diag,
        );
        let e_index = g.sym(g.lookup("e").unwrap()).index;
        assert!(out
            .buf
            .contains(&format!("yy_destructor({e_index},&yymsp[-1].minor);")));
    }
}
