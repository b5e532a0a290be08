use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing::error;
use tracing_subscriber::EnvFilter;

use critic_core::{CriticConfig, CriticError, ReviewMode};
use critic_review::pipeline::{self, RunOptions, RunReport};

#[derive(Parser)]
#[command(
    name = "critic",
    version,
    about = "LLM-powered pull request reviewer for CI",
    long_about = "Reviews every changed file of a pull request with an LLM and posts the\n\
                   result as an inline comment.\n\n\
                   Meant to run inside a pull_request workflow. Reads the event payload from\n\
                   GITHUB_EVENT_PATH, and GITHUB_REPOSITORY, GITHUB_TOKEN and OPENAI_API_KEY\n\
                   from the environment.\n\n\
                   Examples:\n  \
                     critic                          Review the triggering PR\n  \
                     critic review --mode summary    Post one comment for the whole PR\n  \
                     critic review --dry-run         Print reviews instead of posting\n  \
                     critic diff                     Print the whole-PR diff"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .critic.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Event payload file (default: $GITHUB_EVENT_PATH)
    #[arg(long, global = true)]
    event_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Exit non-zero when the event or credentials are missing
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Review the pull request and post comments (default)
    #[command(long_about = "Review the pull request and post comments.\n\n\
        Lists the changed files, sends each file's patch to the LLM, and posts the\n\
        review on line 1 of the file. Files without a patch are skipped. In summary\n\
        mode all patches are reviewed together and posted as one PR comment.\n\n\
        Examples:\n  critic review\n  critic review --mode summary --model gpt-4o")]
    Review {
        /// Inline per-file comments or one summary comment
        #[arg(long)]
        mode: Option<ReviewMode>,
        /// Override the LLM model
        #[arg(long)]
        model: Option<String>,
        /// Print reviews to stdout instead of posting them
        #[arg(long)]
        dry_run: bool,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the raw diff of the whole pull request
    Diff,
}

fn load_config(path: Option<&Path>) -> Result<CriticConfig> {
    let mut config = match path {
        Some(path) => CriticConfig::from_file(path)?,
        None => {
            let default_path = Path::new(".critic.toml");
            if default_path.exists() {
                CriticConfig::from_file(default_path)?
            } else {
                CriticConfig::default()
            }
        }
    };
    config.apply_env(|k| std::env::var(k).ok());
    Ok(config)
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "info,critic=debug,critic_review=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}

/// Configuration failures end the run cleanly unless `--strict` is set.
fn finish_with(err: CriticError, strict: bool) -> Result<()> {
    if err.is_configuration() && !strict {
        error!("{err}");
        return Ok(());
    }
    Err(err.into())
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report).into_diagnostic()?);
        return Ok(());
    }
    for review in &report.reviews {
        println!("## {}\n\n{}\n", review.file_path, review.comment_body);
    }
    if let Some(summary) = &report.summary {
        println!("{summary}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_deref())?;
    let env = |k: &str| std::env::var(k).ok();

    match cli.command.unwrap_or(Command::Review {
        mode: None,
        model: None,
        dry_run: false,
        json: false,
    }) {
        Command::Review {
            mode,
            model,
            dry_run,
            json,
        } => {
            if let Some(mode) = mode {
                config.review.mode = mode;
            }
            if let Some(model) = model {
                config.llm.model = model;
            }
            let options = RunOptions {
                event_path: cli.event_path,
                config,
                dry_run,
            };

            match pipeline::run(&options, env).await {
                Ok(report) => {
                    if dry_run || json {
                        print_report(&report, json)?;
                    }
                    Ok(())
                }
                Err(e) => finish_with(e, cli.strict),
            }
        }
        Command::Diff => {
            let options = RunOptions {
                event_path: cli.event_path,
                config,
                dry_run: true,
            };
            match pipeline::fetch_diff(&options, env).await {
                Ok(diff) => {
                    print!("{diff}");
                    Ok(())
                }
                Err(e) => finish_with(e, cli.strict),
            }
        }
    }
}
