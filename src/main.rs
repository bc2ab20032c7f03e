use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{arg, command, value_parser, Command};
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use weft_builtin::builtin_registry;
use weft_runtime::{adapt, Runtime};

fn main() -> ExitCode {
    let matches = command!()
        .subcommand_required(true)
        .arg(arg!(--debug "Enable debug logging").global(true))
        .subcommand(
            Command::new("run")
                .about("Run a compiled weft program")
                .arg(
                    arg!(<program> "The IR file to run")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Lower a compiled weft program without running it")
                .arg(
                    arg!(<program> "The IR file to check")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .get_matches();

    init_tracing(matches.get_flag("debug"));

    match matches.subcommand() {
        Some(("run", sub)) => {
            let path = sub.get_one::<PathBuf>("program").expect("required arg");
            run(path)
        }
        Some(("check", sub)) => {
            let path = sub.get_one::<PathBuf>("program").expect("required arg");
            check(path)
        }
        _ => unreachable!("subcommand is required"),
    }
}

fn init_tracing(debug: bool) {
    let fallback = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(path: &PathBuf) -> ExitCode {
    let ir_program = match load_program(path) {
        Ok(program) => program,
        Err(message) => return fail(&message),
    };
    let program = match adapt(&ir_program) {
        Ok(program) => program,
        Err(error) => return fail(&error.to_string()),
    };
    let tokio_runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(error) => return fail(&format!("starting the tokio runtime: {error}")),
    };

    let runtime = Runtime::new(builtin_registry());
    match tokio_runtime.block_on(runtime.run(CancellationToken::new(), program)) {
        // Truncation to the platform's exit-code range happens here;
        // the runtime passes the integer through unmodified.
        Ok(code) => ExitCode::from(code as u8),
        Err(error) => fail(&error.to_string()),
    }
}

fn check(path: &PathBuf) -> ExitCode {
    let ir_program = match load_program(path) {
        Ok(program) => program,
        Err(message) => return fail(&message),
    };
    match adapt(&ir_program) {
        Ok(program) => {
            println!(
                "{}: {} ports, {} connections, {} functions",
                path.display(),
                program.ports.len(),
                program.connections.len(),
                program.funcs.len()
            );
            ExitCode::SUCCESS
        }
        Err(error) => fail(&error.to_string()),
    }
}

fn load_program(path: &PathBuf) -> Result<weft_ir::Program, String> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("reading {}: {error}", path.display()))?;
    serde_json::from_str(&raw).map_err(|error| format!("parsing {}: {error}", path.display()))
}

fn fail(message: &str) -> ExitCode {
    eprintln!("{} {message}", "error:".red().bold());
    ExitCode::FAILURE
}
