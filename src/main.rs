use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Once;

use clap::{Parser as ClapParser, ValueEnum};
use liteexpr::diagnostic::{Diagnostic, ansi::AnsiRenderer, json, registry};
use liteexpr::{CompiledProgram, Error, EvalOptions, Scope, lexer, parser};

#[derive(ClapParser, Debug)]
#[command(name = "liteexpr", version, about = "Evaluate liteexpr programs", long_about = None)]
struct Cli {
    /// Source files, evaluated in order against one shared scope. Reads
    /// stdin when neither files nor --expr are given.
    files: Vec<PathBuf>,

    /// Evaluate inline source instead of files. May be repeated.
    #[arg(short = 'e', long = "expr", value_name = "SOURCE", conflicts_with = "files")]
    expr: Vec<String>,

    /// What to print for each input.
    #[arg(long, value_enum, default_value_t = Emit::Value)]
    emit: Emit,

    /// Diagnostic format on stderr.
    #[arg(long, value_enum, default_value_t = ErrorFormat::Ansi)]
    errors: ErrorFormat,

    /// Disable ANSI colour in diagnostics.
    #[arg(long)]
    no_color: bool,

    /// Evaluation depth limit.
    #[arg(long, value_name = "N", default_value_t = EvalOptions::default().max_depth)]
    max_depth: usize,

    /// Print the long description of an error code and exit.
    #[arg(long, value_name = "CODE")]
    explain: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Native text of the result
    Value,
    /// Canonical encoding of the result
    Encoded,
    /// Syntax tree as JSON, without evaluating
    Ast,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ErrorFormat {
    Ansi,
    Json,
}

struct Input {
    name: Option<String>,
    source: String,
}

static TRACING_INIT: Once = Once::new();

/// Install a stderr subscriber when `LITEEXPR_LOG` or `RUST_LOG` is set,
/// e.g. `LITEEXPR_LOG=liteexpr=trace`.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let filter = match EnvFilter::try_from_env("LITEEXPR_LOG") {
            Ok(filter) => filter,
            Err(_) if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
            Err(_) => return,
        };
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter)
            .init();
    });
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    if let Some(code) = &cli.explain {
        return match registry::lookup(code) {
            Some(entry) => {
                print!("{}", entry.long);
                ExitCode::SUCCESS
            }
            None => {
                eprintln!("unknown error code `{code}`");
                ExitCode::FAILURE
            }
        };
    }

    let inputs = match read_inputs(&cli) {
        Ok(inputs) => inputs,
        Err(d) => {
            report(&cli, &d);
            return ExitCode::FAILURE;
        }
    };

    let scope = Scope::new();
    let options = EvalOptions { max_depth: cli.max_depth };
    let mut failed = false;
    for input in &inputs {
        if let Err(d) = run(&cli, input, &scope, options) {
            let mut d = d.with_source(input.source.clone());
            if let Some(name) = &input.name {
                d = d.with_note(format!("in `{name}`"));
            }
            report(&cli, &d);
            failed = true;
        }
    }

    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn read_inputs(cli: &Cli) -> Result<Vec<Input>, Diagnostic> {
    if !cli.expr.is_empty() {
        return Ok(cli.expr.iter().map(|source| Input { name: None, source: source.clone() }).collect());
    }

    if cli.files.is_empty() {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .map_err(|e| Diagnostic::error(format!("cannot read stdin: {e}")))?;
        return Ok(vec![Input { name: None, source }]);
    }

    cli.files
        .iter()
        .map(|path| {
            let source = std::fs::read_to_string(path)
                .map_err(|e| Diagnostic::error(format!("cannot read `{}`: {e}", path.display())))?;
            Ok(Input { name: Some(path.display().to_string()), source })
        })
        .collect()
}

fn run(cli: &Cli, input: &Input, scope: &Scope, options: EvalOptions) -> Result<(), Diagnostic> {
    let tokens = lexer::lex(&input.source).map_err(|e| Diagnostic::from(&e))?;
    let program = parser::parse(&input.source, tokens).map_err(|e| Diagnostic::from(&e))?;

    if cli.emit == Emit::Ast {
        let json = serde_json::to_string_pretty(&program)
            .map_err(|e| Diagnostic::error(format!("cannot serialize syntax tree: {e}")))?;
        println!("{json}");
        return Ok(());
    }

    let value = CompiledProgram::new(program)
        .eval_with(scope, options)
        .map_err(|e| Diagnostic::from(&e))?;

    let text = match cli.emit {
        Emit::Value => value.text(),
        Emit::Encoded => value.encoded(),
        Emit::Ast | Emit::None => return Ok(()),
    };
    let text = text.map_err(|e| Diagnostic::from(&Error::from(e)))?;
    println!("{text}");
    Ok(())
}

fn report(cli: &Cli, d: &Diagnostic) {
    match cli.errors {
        ErrorFormat::Ansi => {
            let use_color = !cli.no_color
                && std::env::var_os("NO_COLOR").is_none()
                && std::io::stderr().is_terminal();
            eprint!("{}", AnsiRenderer { use_color }.render(d));
        }
        ErrorFormat::Json => eprintln!("{}", json::render(d)),
    }
}
