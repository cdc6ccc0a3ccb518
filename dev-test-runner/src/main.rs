use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use regex::Regex;

use dev_test_runner::models::{CartEvent, Expr, Letters, Scalar};
use dev_test_runner::{ModelName, Outcome, case_id, load_fixtures, run_fixtures};
use tagged_json::{EnumSchema, TaggedEnum, ValueMode};

/// run tagged-json fixture cases and inspect model schemas
#[derive(Parser, Debug)]
struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// decode and re-encode every fixture case
    Run {
        /// fixture files; literal paths or quoted glob patterns
        #[arg(long, short, num_args = 1.., default_value = "fixtures/*.json")]
        input: Vec<String>,

        /// only run cases whose `file::name` matches this regex
        #[arg(long)]
        filter: Option<String>,

        /// print passing cases too
        #[arg(long, short)]
        verbose: bool,
    },
    /// print the derived schema of each model enum
    Schemas,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = CommandLineInterface::parse();
    match cli.cmd {
        Command::Run { input, filter, verbose } => {
            let filter = filter.as_deref().map(Regex::new).transpose()?;
            let fixtures = load_fixtures(&input)?;
            let reports = run_fixtures(&fixtures, filter.as_ref());

            let mut failed = 0;
            for report in &reports {
                let id = case_id(&report.file, &report.name);
                match &report.outcome {
                    Outcome::Passed if verbose => println!("{} {id}", "ok".green()),
                    Outcome::Passed => {}
                    Outcome::Failed(reason) => {
                        failed += 1;
                        println!("{} {id}\n     {}", "FAIL".red().bold(), reason.dimmed());
                    }
                }
            }

            let summary = format!("{} passed, {failed} failed", reports.len() - failed);
            if failed == 0 {
                println!("{}", summary.green());
                Ok(ExitCode::SUCCESS)
            } else {
                println!("{}", summary.red());
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Schemas => {
            print_schema::<CartEvent>(ModelName::CartEvent)?;
            print_schema::<Letters>(ModelName::Letters)?;
            print_schema::<Scalar>(ModelName::Scalar)?;
            print_schema::<Expr>(ModelName::Expr)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_schema<E: TaggedEnum>(model: ModelName) -> anyhow::Result<()> {
    tagged_json::validate::<E>()?;
    let schema: &EnumSchema<E> = tagged_json::schema::<E>()?;
    let layout = match schema.value_mode() {
        ValueMode::Nested(field) => format!("nested under {field:?}"),
        ValueMode::Embedded => "embedded".to_owned(),
    };
    println!(
        "{} {} (tag {:?}, {layout})",
        serde_json::to_string(&model)?.bold(),
        schema.enum_name().dimmed(),
        schema.tag_field()
    );
    for variant in schema.variants() {
        println!("  {:<16} {}", variant.tag().cyan(), variant.shape());
    }
    Ok(())
}
