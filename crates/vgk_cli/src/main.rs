//! Command-line driver: wires the tokenizer, parser, elaborator, and
//! scheduler VM builder together and renders diagnostics for interactive use.
//!
//! Deliberately stays to a single `check` subcommand (parse, elaborate,
//! lower, report) — there's no separate emitter or waveform tooling here;
//! those live downstream of the `SchedulerVmLayout` this binary prints a
//! summary of.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use vgk_common::Interner;
use vgk_diagnostics::{Diagnostic, DiagnosticRenderer, DiagnosticSink, TerminalRenderer};
use vgk_source::SourceDb;
use vgk_verilog::ast::VerilogItem;
use vgk_verilog::lexer::lex;
use vgk_verilog::parser::VerilogParser;

#[derive(Parser, Debug)]
#[command(name = "vgk", version, about = "Verilog-1364-subset-to-scheduler-kernel compiler")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parses, elaborates, and lowers a design, reporting diagnostics.
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
struct CheckArgs {
    /// Verilog source file to compile.
    file: PathBuf,

    /// Explicit top-level module name. When omitted, the top is inferred as
    /// the one module nothing else instantiates.
    #[arg(long)]
    top: Option<String>,

    /// Disable ANSI color in diagnostic output.
    #[arg(long)]
    no_color: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Check(args) => run_check(args),
    }
}

fn run_check(args: CheckArgs) -> ExitCode {
    let mut source_db = SourceDb::new();
    let file = match source_db.load_file(&args.file) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("error: could not read `{}`: {e}", args.file.display());
            return ExitCode::FAILURE;
        }
    };
    let source = source_db.get_file(file).content.clone();

    let interner = Interner::new();
    let sink = DiagnosticSink::new();
    let renderer = TerminalRenderer::new(!args.no_color, 100);

    let tokens = lex(&source, file, &sink);
    if !flush(&sink, &source_db, &renderer) {
        return ExitCode::FAILURE;
    }

    let mut parser = VerilogParser::new(tokens, &source, file, &interner, &sink);
    let parsed = parser.parse_source_file();
    if !flush(&sink, &source_db, &renderer) {
        return ExitCode::FAILURE;
    }

    let modules: Vec<_> = parsed
        .items
        .into_iter()
        .filter_map(|item| match item {
            VerilogItem::Module(m) => Some(m),
            VerilogItem::Error(_) => None,
        })
        .collect();

    let design = vgk_elaborate::elaborate(&modules, args.top.as_deref(), &interner, &sink);
    if !flush(&sink, &source_db, &renderer) {
        return ExitCode::FAILURE;
    }
    let Some(design) = design else {
        return ExitCode::FAILURE;
    };

    let layout = vgk_vm::build(&design, &interner, &sink);
    if !flush(&sink, &source_db, &renderer) {
        return ExitCode::FAILURE;
    }

    println!(
        "ok: {} signals, {} processes, {} words of main bytecode",
        layout.signals.len(),
        layout.process_entry_points.len(),
        layout.main_words.len(),
    );
    ExitCode::SUCCESS
}

/// Renders and drains every diagnostic emitted so far. Returns `false` once
/// the sink has recorded an error, matching the phase-stops-at-first-fatal
/// propagation policy.
fn flush(sink: &DiagnosticSink, source_db: &SourceDb, renderer: &TerminalRenderer) -> bool {
    let had_errors = sink.has_errors();
    let diagnostics: Vec<Diagnostic> = sink.take_all();
    for diag in &diagnostics {
        eprint!("{}", renderer.render(diag, source_db));
    }
    !had_errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_check_with_top() {
        let cli = Cli::parse_from(["vgk", "check", "design.v", "--top", "cpu"]);
        match cli.command {
            Command::Check(args) => {
                assert_eq!(args.file, PathBuf::from("design.v"));
                assert_eq!(args.top.as_deref(), Some("cpu"));
                assert!(!args.no_color);
            }
        }
    }

    #[test]
    fn cli_parses_check_without_top() {
        let cli = Cli::parse_from(["vgk", "check", "design.v"]);
        match cli.command {
            Command::Check(args) => {
                assert_eq!(args.file, PathBuf::from("design.v"));
                assert!(args.top.is_none());
            }
        }
    }

    #[test]
    fn cli_command_is_well_formed() {
        Cli::command().debug_assert();
    }
}
