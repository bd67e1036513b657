//! tv - check a C++ function against its Rust translation
//!
//! Usage:
//!   tv <cpp-file> <rust-file> [--cpp-function <name>] [--explain]
//!
//! Example:
//!   tv add.cpp add.rs --show-ir
//!   tv --example add_u32 --explain

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use tv::catalog;
use tv::orchestrator::{FailureKind, Notification, RunOutcome};
use tv::report::{render_report, RenderOptions};
use tv::{format_report, HttpRelay, Orchestrator, PipelineState, Submission, ValidatorConfig};

const DEFAULT_CONFIG: &str = "validator.toml";

fn print_usage() {
    eprintln!(
        r#"
{} - Validate a Rust translation of a C++ function

{}
    tv <CPP_FILE> <RUST_FILE> [OPTIONS]
    tv --example <NAME> [OPTIONS]
    tv --list-examples
    tv --format <REPORT_FILE> [--explain]

{}
    <CPP_FILE>     C++ source file
    <RUST_FILE>    Rust translation of the same function

{}
    -e, --example <NAME>        Use a built-in example pair instead of files
    --list-examples             List the built-in examples
    -f, --format <FILE>         Format a saved verifier report without contacting the relay
    -u, --relay-url <URL>       Relay server URL (default: http://localhost:3001, or RELAY_URL)
    -c, --config <FILE>         Config file (default: validator.toml)
    --cpp-function <NAME>       C++ function to compare (mangled name)
    --rust-function <NAME>      Rust function to compare (mangled name)
    --show-ir                   Print the generated LLVM IR
    --explain                   Add a glossary of the highlighted terms
    --raw                       Print the verifier output unformatted
    -v, --verbose               Show pipeline logs
    -vv                         Extra verbose (debug logs)
    --dry-run                   Show what would be done without contacting the relay
    -h, --help                  Print this help message

{}
    tv add.cpp add.rs
    tv --example nested_switch --show-ir
    tv struct.cpp struct.rs --cpp-function _Z12create_pointii -vv
    tv --format alive.log --explain

{}
    Both programs are compiled to LLVM IR by the relay server, then the
    two IR modules are checked for semantic equivalence. The verifier's
    report is split into sections and highlighted. The exit status is
    non-zero when the translation could not be verified.
"#,
        "tv".bold(),
        "USAGE:".bold(),
        "ARGS:".bold(),
        "OPTIONS:".bold(),
        "EXAMPLES:".bold(),
        "HOW IT WORKS:".bold(),
    );
}

#[derive(Debug, Default)]
struct CliArgs {
    cpp_file: Option<PathBuf>,
    rust_file: Option<PathBuf>,
    example: Option<String>,
    list_examples: bool,
    format_file: Option<PathBuf>,
    relay_url: Option<String>,
    config: Option<PathBuf>,
    cpp_function: Option<String>,
    rust_function: Option<String>,
    show_ir: bool,
    explain: bool,
    raw: bool,
    verbose: u8, // 0=off, 1=verbose, 2=extra verbose
    dry_run: bool,
}

fn parse_args() -> Result<CliArgs> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        std::process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let mut cli = CliArgs::default();
    let mut positional = Vec::new();

    let mut i = 1;
    while i < args.len() {
        let value = |i: &mut usize| -> Result<String> {
            *i += 1;
            match args.get(*i) {
                Some(v) => Ok(v.clone()),
                None => bail!("{} needs a value", args[*i - 1]),
            }
        };
        match args[i].as_str() {
            "--example" | "-e" => cli.example = Some(value(&mut i)?),
            "--list-examples" => cli.list_examples = true,
            "--format" | "-f" => cli.format_file = Some(PathBuf::from(value(&mut i)?)),
            "--relay-url" | "-u" => cli.relay_url = Some(value(&mut i)?),
            "--config" | "-c" => cli.config = Some(PathBuf::from(value(&mut i)?)),
            "--cpp-function" => cli.cpp_function = Some(value(&mut i)?),
            "--rust-function" => cli.rust_function = Some(value(&mut i)?),
            "--show-ir" => cli.show_ir = true,
            "--explain" => cli.explain = true,
            "--raw" => cli.raw = true,
            "--verbose" | "-v" => cli.verbose = cli.verbose.max(1),
            "-vv" => cli.verbose = 2,
            "--dry-run" => cli.dry_run = true,
            flag if flag.starts_with('-') => bail!("Unknown option: {}", flag),
            other => positional.push(PathBuf::from(other)),
        }
        i += 1;
    }

    let mut positional = positional.into_iter();
    cli.cpp_file = positional.next();
    cli.rust_file = positional.next();
    if let Some(extra) = positional.next() {
        bail!("Unexpected argument: {}", extra.display());
    }

    Ok(cli)
}

fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn load_config(args: &CliArgs) -> Result<ValidatorConfig> {
    let path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let mut config = ValidatorConfig::load(&path)
        .with_context(|| format!("Failed to load config: {}", path.display()))?
        .with_env_overrides();
    if let Some(url) = &args.relay_url {
        config.relay_url = url.clone();
    }
    Ok(config)
}

/// The submission plus labels for the two sides
fn load_submission(args: &CliArgs) -> Result<(Submission, String, String)> {
    let (submission, cpp_label, rust_label) = if let Some(name) = &args.example {
        let example = catalog::find(name).with_context(|| {
            format!(
                "Unknown example '{}'. Available: {}",
                name,
                catalog::names().join(", ")
            )
        })?;
        let label = format!("example {}", example.name);
        (example.to_submission(), label.clone(), label)
    } else {
        let (Some(cpp_file), Some(rust_file)) = (&args.cpp_file, &args.rust_file) else {
            bail!("Expected <CPP_FILE> <RUST_FILE>, --example, --format or --list-examples");
        };
        let cpp = std::fs::read_to_string(cpp_file)
            .with_context(|| format!("Failed to read file: {}", cpp_file.display()))?;
        let rust = std::fs::read_to_string(rust_file)
            .with_context(|| format!("Failed to read file: {}", rust_file.display()))?;
        (
            Submission::new(cpp, rust),
            cpp_file.display().to_string(),
            rust_file.display().to_string(),
        )
    };

    let mut submission = submission;
    if let Some(name) = &args.cpp_function {
        submission = submission.with_source_function(name.as_str());
    }
    if let Some(name) = &args.rust_function {
        submission = submission.with_target_function(name.as_str());
    }
    Ok((submission, cpp_label, rust_label))
}

fn print_examples() {
    eprintln!("{}", "Built-in examples:".bold());
    let width = catalog::names().iter().map(|n| n.len()).max().unwrap_or(0);
    for example in catalog::all() {
        println!(
            "  {:width$}  {}",
            example.name.yellow(),
            example.summary.dimmed(),
            width = width
        );
    }
}

fn print_header(cpp_label: &str, rust_label: &str, submission: &Submission, config: &ValidatorConfig) {
    let hint = |name: &Option<String>| name.clone().unwrap_or_else(|| "(auto)".to_string());

    eprintln!();
    eprintln!(
        "{}",
        "╭──────────────────────────────────────────────────────────────╮".blue()
    );
    eprintln!(
        "{}  {}                        {}",
        "│".blue(),
        "tv - C++ to Rust Translation Validator".bold(),
        "│".blue()
    );
    eprintln!(
        "{}",
        "├──────────────────────────────────────────────────────────────┤".blue()
    );
    eprintln!(
        "{}  {}    {} ({} chars, fn {})",
        "│".blue(),
        "C++:".dimmed(),
        cpp_label,
        submission.source_code.chars().count(),
        hint(&submission.source_function_name)
    );
    eprintln!(
        "{}  {}   {} ({} chars, fn {})",
        "│".blue(),
        "Rust:".dimmed(),
        rust_label,
        submission.translated_code.chars().count(),
        hint(&submission.target_function_name)
    );
    eprintln!("{}  {}  {}", "│".blue(), "Relay:".dimmed(), config.relay_url);
    eprintln!(
        "{}",
        "╰──────────────────────────────────────────────────────────────╯".blue()
    );
    eprintln!();
}

fn print_notification(notification: &Notification) {
    match notification {
        Notification::Generating { .. } => {
            eprintln!("{} {}", "⏳".yellow(), "Generating LLVM IR...".dimmed())
        }
        Notification::Validating { .. } => {
            eprintln!("{} {}", "⏳".yellow(), "Validating translation...".dimmed())
        }
        Notification::Succeeded { .. } => {
            eprintln!("{} {}", "✔".green(), "Validation finished".green())
        }
        Notification::Failed { message, .. } => {
            eprintln!("{} {}", "✘".red(), message.red())
        }
    }
    let _ = std::io::stderr().flush();
}

fn print_ir(title: &str, ir: &str) {
    eprintln!();
    eprintln!(
        "{}",
        format!("┌─ {title} ─────────────────────────────────────────────────").cyan()
    );
    for line in ir.lines() {
        eprintln!("{} {}", "│".cyan(), line);
    }
    eprintln!(
        "{}",
        "└────────────────────────────────────────────────────────────────".cyan()
    );
}

fn print_report(verifier_output: &str, args: &CliArgs) -> bool {
    let report = format_report(verifier_output);
    eprintln!();
    if args.raw {
        println!("{verifier_output}");
    } else {
        let options = RenderOptions {
            explain: args.explain,
        };
        print!("{}", render_report(&report, &options));
    }
    report.success
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;
    init_tracing(args.verbose)?;

    if args.list_examples {
        print_examples();
        return Ok(());
    }

    if let Some(path) = &args.format_file {
        let output = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        if !print_report(&output, &args) {
            std::process::exit(1);
        }
        return Ok(());
    }

    let config = load_config(&args)?;
    let (submission, cpp_label, rust_label) = load_submission(&args)?;

    print_header(&cpp_label, &rust_label, &submission, &config);

    // Dry run - just show what would happen
    if args.dry_run {
        eprintln!("{}", "DRY RUN MODE - The relay will not be contacted".yellow());
        eprintln!();
        eprintln!("{}", "Would perform the following:".dimmed());
        eprintln!("  1. POST both programs to {}/api/generate-ir", config.relay_url);
        eprintln!(
            "  2. Check each IR module against the {} character limit",
            config.max_ir_length
        );
        eprintln!("  3. POST the IR pair to {}/api/validate", config.relay_url);
        eprintln!("  4. Format the verifier report");
        return Ok(());
    }

    let relay = HttpRelay::from_config(&config).context("Failed to create relay client")?;
    let (orchestrator, mut notifications) =
        Orchestrator::new(config, Arc::new(relay)).with_notifications();

    let printer = tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            print_notification(&notification);
        }
    });

    let outcome = orchestrator.submit(submission).await;
    drop(orchestrator);
    let _ = printer.await;

    let snapshot = match outcome {
        Ok(RunOutcome::Completed(snapshot)) => snapshot,
        Ok(RunOutcome::Superseded { run_id }) => {
            bail!("Run {} was superseded", run_id);
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    if args.show_ir {
        if let Some(ir) = &snapshot.ir_pair {
            print_ir("C++ LLVM IR", &ir.source_ir);
            print_ir("Rust LLVM IR", &ir.target_ir);
        }
    }

    let verdict_available = snapshot
        .failure
        .as_ref()
        .map_or(true, |f| f.kind == FailureKind::Verification);
    if verdict_available {
        if let Some(result) = &snapshot.result {
            print_report(&result.verifier_output, &args);
        }
    }

    if !snapshot.state.is_terminal() {
        bail!("Run {} ended in state {:?}", snapshot.run_id, snapshot.state);
    }
    if snapshot.state == PipelineState::Failed {
        if !verdict_available {
            let message = snapshot.failure_message().unwrap_or("Validation failed");
            eprintln!("{} {}", "Error:".red().bold(), message);
        }
        std::process::exit(1);
    }

    Ok(())
}
