use anyhow::Context as _;
use citron::codegen::{self, EmitPaths};
use citron::diag::Reporter;
use citron::grammar::Grammar;
use citron::{first_sets, lalr, lr0, pack, report, syntax, table};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "citron", about = "An LALR(1) parser generator", disable_version_flag = true)]
struct Args {
    /// Print only the basis in report.
    #[arg(short = 'b')]
    basis_only: bool,

    /// Don't compress the action table.
    #[arg(short = 'c')]
    no_compress: bool,

    /// Output directory name.
    #[arg(short = 'd', value_name = "DIR")]
    outdir: Option<PathBuf>,

    /// Print grammar without actions.
    #[arg(short = 'g')]
    reprint: bool,

    /// Output a makeheaders compatible file.
    #[arg(short = 'm')]
    makeheaders: bool,

    /// (Quiet) Don't print the report file.
    #[arg(short = 'q')]
    quiet: bool,

    /// Print parser stats to standard output.
    #[arg(short = 's')]
    statistics: bool,

    /// Template file to use.
    #[arg(short = 't', value_name = "FILE")]
    template: Option<PathBuf>,

    /// Print the version number.
    #[arg(short = 'x')]
    version: bool,

    /// The grammar definition file.
    input: Option<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::debug!("parsed CLI args = {:?}", args);

    if args.version {
        println!("citron version {}", env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    }

    let input = args
        .input
        .clone()
        .context("exactly one grammar file argument is required")?;

    process_file(&args, &input)
        .with_context(|| anyhow::anyhow!("errored during processing {}", input.display()))
}

fn process_file(args: &Args, input: &Path) -> anyhow::Result<ExitCode> {
    let filename = input.display().to_string();
    let mut diag = Reporter::new(&filename);
    let mut grammar = Grammar::new(&filename);

    let raw = fs::read(input)
        .with_context(|| anyhow::anyhow!("can't open \"{}\" for reading", input.display()))?;
    let src = String::from_utf8_lossy(&raw);

    let s = Instant::now();
    syntax::parse(&src, &mut grammar, &mut diag);
    tracing::info!(elapsed = ?s.elapsed(), nrule = grammar.rules.len(), "parsed grammar");

    if diag.count() > 0 {
        return Ok(exit_code(diag.count()));
    }
    if grammar.rules.is_empty() {
        anyhow::bail!("Empty grammar.");
    }

    grammar.finalize();

    if args.reprint {
        report::reprint(&grammar);
        return Ok(ExitCode::SUCCESS);
    }

    first_sets::find_rule_precedences(&mut grammar);
    first_sets::find_first_sets(&mut grammar);

    let s = Instant::now();
    let mut automaton = lr0::build(&grammar, &mut diag);
    lalr::find_links(&mut automaton);
    lalr::find_follow_sets(&mut automaton);
    tracing::info!(elapsed = ?s.elapsed(), nstate = automaton.nstate(), "computed LALR(1) machine");

    let mut actions = table::find_actions(&mut grammar, &automaton, &mut diag);
    if !args.no_compress {
        table::compress_tables(&grammar, &mut actions);
    }
    let packed = pack::pack(&grammar, &actions);

    if !args.quiet {
        let path = output_path(input, args.outdir.as_deref(), ".out");
        report::write_output(&grammar, &automaton, &actions, args.basis_only, &path)
            .with_context(|| anyhow::anyhow!("can't write report to \"{}\"", path.display()))?;
    }

    let template = codegen::find_template(input, args.template.as_deref())?;
    let source = output_path(input, args.outdir.as_deref(), ".c");
    let header = output_path(input, args.outdir.as_deref(), ".h");
    let header_name = header
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    codegen::write_parser(
        &grammar,
        &automaton,
        &packed,
        &EmitPaths {
            template: &template,
            source: &source,
            header_name: &header_name,
        },
        args.makeheaders,
        &mut diag,
    )?;

    if !args.makeheaders {
        codegen::write_header(&grammar, &header)?;
    }

    if args.statistics {
        report::print_statistics(&grammar, &automaton, &actions, &packed);
    }
    if actions.nconflict > 0 {
        eprintln!("{} parsing conflicts.", actions.nconflict);
    }

    Ok(exit_code(diag.count() + actions.nconflict))
}

/// Output files take the input's basename with the final extension
/// replaced, landing in `-d`'s directory or the working directory.
fn output_path(input: &Path, outdir: Option<&Path>, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let name = format!("{stem}{suffix}");
    match outdir {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

fn exit_code(count: usize) -> ExitCode {
    ExitCode::from(count.min(255) as u8)
}
