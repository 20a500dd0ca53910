use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use dialoguer::{theme::ColorfulTheme, Confirm};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use tagnav::error::{Result, TagError};
use tagnav::search::{ScoredTag, SearchStrategy};
use tagnav::{App, Config, GenerationReport, SessionOutcome};

use super::terminal::{spawn_stdin_events, TerminalEditor, TerminalPresenter};

#[derive(Parser)]
#[command(name = "tagnav")]
#[command(about = "Jump to symbol definitions using a ctags index")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Generate the tag file configured in .tagnav.yml
    tagnav generate

    # Interactive search; type a query, `:3` picks the third row, `:q` quits
    tagnav jump

    # Jump straight to a symbol when its name is unique
    tagnav jump TagIndex

    # One-shot fuzzy search as JSON
    tagnav search parse --format json

    # Keep the index fresh and report reloads
    tagnav watch
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project root
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Tag file path (overrides .tagnav.yml)
    #[arg(long)]
    pub tag_path: Option<String>,

    /// Debounce interval in milliseconds (overrides .tagnav.yml)
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Maximum number of fuzzy matches (overrides .tagnav.yml)
    #[arg(long)]
    pub max_matches: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run ctags and reload the index
    Generate,

    /// Print the ctags command line
    Command,

    /// Add or update the ctags command in git hooks
    Hook,

    /// Search symbols without interaction
    Search {
        /// Symbol name or fuzzy query
        query: String,

        /// Match the name exactly
        #[arg(long)]
        exact: bool,

        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Pick a symbol interactively and jump to it
    Jump {
        /// Initial text, looked up by exact name first
        seed: Option<String>,

        /// Open the result in $EDITOR instead of printing it
        #[arg(long)]
        open: bool,
    },

    /// Watch the tag file and reload on change
    Watch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Loads `.tagnav.yml` and applies command-line overrides
pub fn load_config(cli: &Cli, root: &std::path::Path) -> Result<Config> {
    let mut config = Config::load(root)?;
    if let Some(tag_path) = &cli.tag_path {
        config.tag_path = Some(tag_path.clone());
    }
    if let Some(debounce_ms) = cli.debounce_ms {
        config.debounce_ms = debounce_ms;
    }
    if let Some(max_matches) = cli.max_matches {
        config.max_matches = max_matches;
    }
    Ok(config)
}

pub async fn generate(app: &App) -> Result<GenerationReport> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(app.generation_command()?.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = app.generate().await;
    match &result {
        Ok(report) => spinner.finish_with_message(format!(
            "Generated {} tags in {:.2}s",
            report.snapshot.len(),
            report.duration.as_secs_f64()
        )),
        Err(_) => spinner.abandon_with_message("Tag generation failed"),
    }
    result
}

pub fn show_command(app: &App) -> Result<()> {
    println!("{}", app.generation_command()?);
    Ok(())
}

pub fn install_hooks(app: &App) -> Result<()> {
    for path in app.install_git_hooks()? {
        println!("Updated {}", path.display());
    }
    Ok(())
}

pub async fn search(
    app: &App,
    query: &str,
    exact: bool,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let snapshot = app.snapshot(false).await?;
    let strategy = if exact {
        SearchStrategy::ExactMatch
    } else {
        SearchStrategy::FuzzyMatch {
            limit: limit.unwrap_or(app.config().max_matches),
        }
    };
    let mut results = strategy.search(&snapshot.records, query);
    if let Some(limit) = limit {
        results.truncate(limit);
    }

    println!("{}", render_results(&results, query, format)?);
    Ok(())
}

fn render_results(results: &[ScoredTag], query: &str, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(results)?);
    }

    if results.is_empty() {
        return Ok(format!("No symbols found for query: {}", query));
    }

    let mut lines = Vec::new();
    for result in results {
        let tag = &result.record;
        let location = format!("{}:{}", tag.display_path, tag.line_number);
        match result.score {
            Some(score) => lines.push(format!("{} ({}) - {} [score: {}]", tag.name, tag.kind.as_str(), location, score)),
            None => lines.push(format!("{} ({}) - {}", tag.name, tag.kind.as_str(), location)),
        }
        if let Some(scope) = &tag.scope {
            lines.push(format!("  Scope: {}", scope));
        }
    }
    Ok(lines.join("\n"))
}

/// Loads the index, offering to generate it when the tag file is missing
async fn ensure_index(app: &App) -> Result<()> {
    match app.startup().await {
        Ok(snapshot) => {
            tracing::debug!("{} tags ready", snapshot.len());
            Ok(())
        }
        Err(TagError::IndexUnavailable { path, .. }) => {
            let generate_now = Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(format!("No tag file at {}. Generate it now?", path.display()))
                .default(true)
                .interact()
                .unwrap_or(false);
            if !generate_now {
                return Err(TagError::Config(format!(
                    "tag file {} is missing",
                    path.display()
                )));
            }
            generate(app).await.map(|_| ())
        }
        Err(e) => Err(e),
    }
}

pub async fn jump(app: &App, seed: Option<String>, open: bool) -> Result<()> {
    ensure_index(app).await?;

    let mut presenter = TerminalPresenter::new();
    let (tx, rx) = mpsc::channel(32);
    spawn_stdin_events(tx, presenter.items());

    let outcome = app.search(seed.as_deref(), &mut presenter, rx).await?;
    match outcome {
        SessionOutcome::Selected(record) => {
            app.jump_to(&TerminalEditor { open }, &record)?;
        }
        SessionOutcome::Action(action) => {
            app.run_action(action, &mut presenter).await?;
        }
        SessionOutcome::Cancelled => {
            tracing::debug!("Search cancelled");
        }
    }
    Ok(())
}

pub async fn watch(app: &App) -> Result<()> {
    ensure_index(app).await?;
    let mut notices = app.subscribe_reindex();
    println!("Watching {} (Ctrl-C to stop)", app.tag_file()?.display());

    loop {
        tokio::select! {
            notice = notices.recv() => match notice {
                Ok(notice) => println!("Reloaded {} tags for {}", notice.tag_count, notice.root.display()),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {} reload notices", skipped);
                }
                Err(_) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    app.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tagnav::{TagKind, TagRecord};

    fn hit(score: Option<i64>) -> ScoredTag {
        ScoredTag {
            record: TagRecord {
                name: "parse".to_string(),
                file_path: PathBuf::from("/p/src/lib.rs"),
                display_path: "src/lib.rs".to_string(),
                line_number: 7,
                kind: TagKind::Function,
                scope: Some("impl:Parser".to_string()),
            },
            score,
        }
    }

    #[test]
    fn test_format_rejects_unknown_values() {
        let cli = Cli::try_parse_from(["tagnav", "search", "parse", "--format", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Search { format: OutputFormat::Json, .. }
        ));
        assert!(Cli::try_parse_from(["tagnav", "search", "parse", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_render_json() {
        let output = render_results(&[hit(Some(42))], "parse", OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["record"]["name"], "parse");
        assert_eq!(value[0]["score"], 42);
    }

    #[test]
    fn test_render_text() {
        let output = render_results(&[hit(None)], "parse", OutputFormat::Text).unwrap();
        assert_eq!(output, "parse (function) - src/lib.rs:7\n  Scope: impl:Parser");

        let empty = render_results(&[], "nope", OutputFormat::Text).unwrap();
        assert_eq!(empty, "No symbols found for query: nope");
    }
}
