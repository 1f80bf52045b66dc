use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wix_converters::{
    Applicability, Converter, ConverterOptions, CustomTableSetting, Diagnostic, DiagnosticCode,
    FileOutcome, Severity,
};

mod utils;

use utils::glob_expand::expand_globs;

#[derive(Parser)]
#[command(name = "wix-convert")]
#[command(about = "Convert WiX v3 source files to v4 and format WiX source")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate files to the v4 schema
    Convert {
        #[command(flatten)]
        files: FileArgs,

        /// How to read CustomTable elements with inline data
        #[arg(long, value_enum)]
        custom_table: Option<CustomTableArg>,
    },

    /// Canonicalize indentation and remove the XML declaration
    Format {
        #[command(flatten)]
        files: FileArgs,
    },

    /// List every diagnostic code
    ListChecks,
}

#[derive(Args)]
struct FileArgs {
    /// Input files (can be multiple files or glob patterns like "src/**/*.wxs")
    #[arg(required = true)]
    files: Vec<String>,

    /// Write the changes back to the files
    #[arg(short, long)]
    fix: bool,

    /// Spaces per indentation level
    #[arg(short, long, default_value_t = 4)]
    indentation: usize,

    /// Report this code as a warning instead of an error (repeatable)
    #[arg(long = "warn", value_name = "CODE")]
    warn: Vec<DiagnosticCode>,

    /// Neither report nor fix this code (repeatable)
    #[arg(long = "ignore", value_name = "CODE")]
    ignore: Vec<DiagnosticCode>,

    /// Output diagnostics as JSONL
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CustomTableArg {
    Bundle,
    Msi,
}

impl From<CustomTableArg> for CustomTableSetting {
    fn from(arg: CustomTableArg) -> Self {
        match arg {
            CustomTableArg::Bundle => CustomTableSetting::Bundle,
            CustomTableArg::Msi => CustomTableSetting::Msi,
        }
    }
}

#[derive(Clone, Copy)]
enum Operation {
    Convert,
    Format,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let needs_attention = match cli.command {
        Commands::Convert {
            files,
            custom_table,
        } => {
            let options = options_from(&files)
                .with_custom_table(custom_table.map(Into::into).unwrap_or_default());
            process(Operation::Convert, &files, options)?
        }
        Commands::Format { files } => {
            let options = options_from(&files);
            process(Operation::Format, &files, options)?
        }
        Commands::ListChecks => {
            list_checks();
            false
        }
    };

    if needs_attention {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn options_from(args: &FileArgs) -> ConverterOptions {
    ConverterOptions::default()
        .with_indentation(args.indentation)
        .with_warnings(args.warn.iter().copied())
        .with_ignored(args.ignore.iter().copied())
}

/// Run the operation over every file. Returns whether any file reported
/// something.
fn process(operation: Operation, args: &FileArgs, options: ConverterOptions) -> Result<bool> {
    let file_paths = expand_globs(&args.files)?;
    let converter = Converter::new(options);

    let mut outcomes = Vec::new();
    for file_path in file_paths {
        let outcome = match operation {
            Operation::Convert => converter.convert_file(&file_path, args.fix),
            Operation::Format => converter.format_file(&file_path, args.fix),
        };

        for diagnostic in &outcome.diagnostics {
            if args.json {
                println!("{}", serde_json::to_string(diagnostic)?);
            } else {
                print_diagnostic(diagnostic);
            }
        }
        outcomes.push(outcome);
    }

    if !args.json && !outcomes.is_empty() {
        print_summary(&outcomes, args.fix);
    }

    Ok(outcomes.iter().any(|o| o.count > 0))
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    let location = match diagnostic.line {
        Some(line) => format!("{}({})", diagnostic.path, line),
        None => diagnostic.path.clone(),
    };
    let severity = match diagnostic.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
    };
    println!(
        "{} : {} {} : {}",
        location,
        severity,
        diagnostic.code.name().cyan(),
        diagnostic.message
    );
}

fn print_summary(outcomes: &[FileOutcome], fix: bool) {
    let total_files = outcomes.len();
    let files_with_issues = outcomes.iter().filter(|o| o.count > 0).count();
    let files_saved = outcomes.iter().filter(|o| o.saved).count();
    let total_issues: usize = outcomes.iter().map(|o| o.count).sum();

    println!("\n{}", "=== Summary ===".bold());
    println!("Total files:         {}", total_files);
    println!(
        "Files with issues:   {} {}",
        files_with_issues,
        if files_with_issues > 0 {
            "✗".red()
        } else {
            "✓".green()
        }
    );
    if fix {
        println!("Files updated:       {}", files_saved);
    }
    println!("Total issues found:  {}", total_issues);
}

fn list_checks() {
    println!("{}", "Available checks:".bold());
    for code in DiagnosticCode::ALL {
        let scope = match code.applicability() {
            Applicability::FormatOnly => "format",
            Applicability::Both => "both",
            Applicability::ConvertOnly => "convert",
        };
        println!("  {} [{}] - {}", code.name().cyan(), scope, code.summary());
    }
}
