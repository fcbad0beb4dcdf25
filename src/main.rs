use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use codevis_core::{CodevisConfig, OutputFormat};
use codevis_timeline::builder::{DateRange, TimelineArtifact};
use codevis_timeline::export::{export_csv, export_json, load_artifact};
use codevis_timeline::pipeline::{analyze_repository, AnalyzeOptions};
use indicatif::{ProgressBar, ProgressStyle};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const CONFIG_FILE: &str = ".codevis.toml";

#[derive(Parser)]
#[command(
    name = "codevis",
    version,
    about = "Turn a repository's git history into an explorable timeline",
    long_about = "Codevis mines a git repository's full history and produces a timeline document:\n\
                   every commit in chronological order with per-file line counts, running totals,\n\
                   and per-contributor and per-file statistics. A small HTTP endpoint serves the\n\
                   document to a visualization front end.\n\n\
                   Examples:\n  \
                     codevis analyze .                    Write timeline.json for this repository\n  \
                     codevis analyze ../app --csv c.csv   Also write a per-commit CSV summary\n  \
                     codevis serve --port 8080            Serve timeline.json over HTTP\n  \
                     codevis export timeline.json         Convert a timeline document to CSV\n  \
                     codevis doctor                       Check setup and environment"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .codevis.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command summaries.\n\n\
                       Formats:\n  \
                         text      Human-readable summary (default)\n  \
                         json      Machine-readable JSON\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a git repository and write its timeline
    #[command(long_about = "Analyze a git repository and write its timeline.\n\n\
        Walks every commit reachable from HEAD (or --branch), counts added and removed\n\
        lines per file, aggregates contributor and file statistics, and writes the\n\
        timeline document as JSON.\n\n\
        Examples:\n  codevis analyze .\n  codevis analyze ~/src/app -o out/app.json --csv out/app.csv\n  codevis analyze . --branch develop --require-commits")]
    Analyze {
        /// Repository root (the directory containing .git)
        repo_path: PathBuf,

        /// Timeline document destination (default: timeline.json)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Also write a per-commit CSV summary
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Walk this branch instead of HEAD
        #[arg(long)]
        branch: Option<String>,

        /// Fail instead of writing an empty timeline when there are no commits
        #[arg(long)]
        require_commits: bool,

        /// Report renames as a deletion plus an addition
        #[arg(long)]
        no_renames: bool,
    },
    /// Serve a timeline document over HTTP
    #[command(long_about = "Serve a timeline document over HTTP.\n\n\
        Endpoints:\n  GET /api/timeline  the document, verbatim\n  GET /api/health    liveness probe\n\n\
        The document is re-read on every request. Stop with Ctrl-C.\n\n\
        Examples:\n  codevis serve\n  codevis serve --port 8080 --data out/app.json")]
    Serve {
        /// Port to listen on (default: 3001)
        #[arg(long, short)]
        port: Option<u16>,

        /// Timeline document to serve (default: timeline.json)
        #[arg(long, short)]
        data: Option<PathBuf>,

        /// Address to bind (default: 127.0.0.1)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Convert a timeline document to a per-commit CSV summary
    Export {
        /// Timeline document produced by `codevis analyze`
        data_file: PathBuf,

        /// CSV destination (default: <stem>_commits.csv next to the document)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Create a default .codevis.toml in the current directory
    Init,
    /// Check your setup and environment
    Doctor,
    /// Generate shell completions
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1mcodevis\x1b[0m v{version}: your repository's history as a timeline\n");

        println!("Quick start:");
        println!("  \x1b[36mcodevis analyze .\x1b[0m     Write timeline.json for this repository");
        println!("  \x1b[36mcodevis serve\x1b[0m         Serve it at http://127.0.0.1:3001/api/timeline\n");

        println!("All commands:");
        println!("  \x1b[32manalyze\x1b[0m   Mine git history into a timeline document");
        println!("  \x1b[32mserve\x1b[0m     Serve a timeline document over HTTP");
        println!("  \x1b[32mexport\x1b[0m    Convert a timeline document to CSV");
        println!("  \x1b[32mdoctor\x1b[0m    Check your setup and environment");
        println!("  \x1b[32minit\x1b[0m      Create default configuration\n");
    } else {
        println!("codevis v{version}: your repository's history as a timeline\n");

        println!("Quick start:");
        println!("  codevis analyze .     Write timeline.json for this repository");
        println!("  codevis serve         Serve it at http://127.0.0.1:3001/api/timeline\n");

        println!("All commands:");
        println!("  analyze   Mine git history into a timeline document");
        println!("  serve     Serve a timeline document over HTTP");
        println!("  export    Convert a timeline document to CSV");
        println!("  doctor    Check your setup and environment");
        println!("  init      Create default configuration\n");
    }

    println!("Run 'codevis <command> --help' for details.");
}

fn init_tracing(verbose: bool, use_color: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(use_color)
                .with_target(false),
        )
        .with(filter)
        .init();
}

fn spinner(message: &str) -> Option<ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

#[derive(Serialize)]
struct TopContributor<'a> {
    name: &'a str,
    email: &'a str,
    commits: u64,
    lines_added: u64,
    lines_removed: u64,
}

#[derive(Serialize)]
struct AnalyzeSummary<'a> {
    repository: String,
    output: String,
    csv_output: Option<String>,
    total_commits: usize,
    total_contributors: usize,
    total_files: usize,
    date_range: &'a DateRange,
    top_contributors: Vec<TopContributor<'a>>,
    warnings: usize,
}

impl<'a> AnalyzeSummary<'a> {
    fn new(
        repo_path: &Path,
        output: &Path,
        csv_output: Option<&Path>,
        artifact: &'a TimelineArtifact,
        warnings: usize,
    ) -> Self {
        let mut top: Vec<TopContributor<'a>> = artifact
            .contributors
            .iter()
            .map(|(name, stats)| TopContributor {
                name,
                email: &stats.email,
                commits: stats.commits,
                lines_added: stats.lines_added,
                lines_removed: stats.lines_removed,
            })
            .collect();
        top.sort_by(|a, b| b.commits.cmp(&a.commits).then_with(|| a.name.cmp(b.name)));
        top.truncate(5);

        Self {
            repository: repo_path.display().to_string(),
            output: output.display().to_string(),
            csv_output: csv_output.map(|p| p.display().to_string()),
            total_commits: artifact.metadata.total_commits,
            total_contributors: artifact.metadata.total_contributors,
            total_files: artifact.metadata.total_files,
            date_range: &artifact.metadata.date_range,
            top_contributors: top,
            warnings,
        }
    }

    fn date_span(&self) -> String {
        match (&self.date_range.start, &self.date_range.end) {
            (Some(start), Some(end)) => format!("{start} to {end}"),
            _ => "no commits".into(),
        }
    }

    fn print_text(&self) {
        println!(
            "Repository analyzed successfully. Data saved to {}",
            self.output
        );
        if let Some(csv) = &self.csv_output {
            println!("Commit summary saved to {csv}");
        }
        println!();
        println!("  Commits:       {}", self.total_commits);
        println!("  Contributors:  {}", self.total_contributors);
        println!("  Files:         {}", self.total_files);
        println!("  Date range:    {}", self.date_span());
        if self.warnings > 0 {
            println!("  Warnings:      {} file(s) without line counts", self.warnings);
        }

        if !self.top_contributors.is_empty() {
            println!("\nTop contributors:");
            for (i, c) in self.top_contributors.iter().enumerate() {
                println!(
                    "  {}. {} <{}>  {} commits  +{} -{}",
                    i + 1,
                    c.name,
                    c.email,
                    c.commits,
                    c.lines_added,
                    c.lines_removed
                );
            }
        }
    }

    fn print_markdown(&self) {
        println!("# Timeline: {}\n", self.repository);
        println!("| Metric | Value |");
        println!("|--------|-------|");
        println!("| Commits | {} |", self.total_commits);
        println!("| Contributors | {} |", self.total_contributors);
        println!("| Files | {} |", self.total_files);
        println!("| Date range | {} |", self.date_span());
        println!("| Output | `{}` |", self.output);
        if let Some(csv) = &self.csv_output {
            println!("| CSV | `{csv}` |");
        }

        if !self.top_contributors.is_empty() {
            println!("\n## Top Contributors\n");
            println!("| # | Author | Commits | Added | Removed |");
            println!("|---|--------|---------|-------|---------|");
            for (i, c) in self.top_contributors.iter().enumerate() {
                println!(
                    "| {} | {} | {} | +{} | -{} |",
                    i + 1,
                    c.name,
                    c.commits,
                    c.lines_added,
                    c.lines_removed
                );
            }
        }
    }
}

#[derive(Serialize)]
struct CheckResult {
    name: &'static str,
    status: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "pass",
            detail: detail.into(),
            hint: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name,
            status: "fail",
            detail: detail.into(),
            hint: Some(hint.into()),
        }
    }

    fn info(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "info",
            detail: detail.into(),
            hint: None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self.status {
            "pass" => "\u{2713}",
            "fail" => "\u{2717}",
            _ => "~",
        }
    }

    fn colored_symbol(&self) -> String {
        match self.status {
            "pass" => "\x1b[32m\u{2713}\x1b[0m".into(),
            "fail" => "\x1b[31m\u{2717}\x1b[0m".into(),
            _ => "\x1b[33m~\x1b[0m".into(),
        }
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

fn count_commits(root: &Path) -> std::result::Result<Option<usize>, git2::Error> {
    let repo = git2::Repository::open(root)?;
    if repo.head().is_err() {
        return Ok(None);
    }
    let mut revwalk = repo.revwalk()?;
    revwalk.push_head()?;
    Ok(Some(revwalk.count()))
}

fn run_doctor(
    config: &CodevisConfig,
    config_path: &Path,
    format: OutputFormat,
    use_color: bool,
) -> Result<()> {
    let mut checks: Vec<CheckResult> = Vec::new();

    // 1. Git repository
    let cwd = std::env::current_dir().into_diagnostic()?;
    let git_root = find_git_root(&cwd);
    match &git_root {
        Some(root) => checks.push(CheckResult::pass(
            "git_repository",
            format!("detected at {}", root.display()),
        )),
        None => checks.push(CheckResult::fail(
            "git_repository",
            "not a git repository",
            "run codevis from inside a git repository, or pass its path to 'codevis analyze'",
        )),
    }

    // 2. Config file
    if config_path.exists() {
        checks.push(CheckResult::pass(
            "config_file",
            format!("{} found", config_path.display()),
        ));
    } else {
        checks.push(CheckResult::info(
            "config_file",
            format!("{} not found, using defaults", config_path.display()),
        ));
    }

    // 3. History readable
    if let Some(root) = &git_root {
        match count_commits(root) {
            Ok(Some(n)) => checks.push(CheckResult::pass("history", format!("{n} commits on HEAD"))),
            Ok(None) => checks.push(CheckResult::info(
                "history",
                "no commits yet; analysis will produce an empty timeline",
            )),
            Err(e) => checks.push(CheckResult::fail(
                "history",
                format!("cannot read history: {}", e.message()),
                "check that the repository is not corrupt ('git fsck')",
            )),
        }
    }

    // 4. Timeline document
    let data = &config.serve.data;
    match load_artifact(data) {
        Ok(artifact) => checks.push(CheckResult::pass(
            "timeline_data",
            format!(
                "{} ({} commits)",
                data.display(),
                artifact.metadata.total_commits
            ),
        )),
        Err(codevis_core::CodevisError::FileNotFound(_)) => checks.push(CheckResult::info(
            "timeline_data",
            format!("{} not found; run 'codevis analyze' first", data.display()),
        )),
        Err(e) => checks.push(CheckResult::fail(
            "timeline_data",
            format!("{} is unreadable: {e}", data.display()),
            "re-run 'codevis analyze' to regenerate it",
        )),
    }

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "checks": checks,
            });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        _ => {
            let version = env!("CARGO_PKG_VERSION");
            println!("codevis v{version}: environment check\n");

            for check in &checks {
                let sym = if use_color {
                    check.colored_symbol()
                } else {
                    check.symbol().to_string()
                };
                let label = check.name.replace('_', " ");
                println!("  {sym} {label:<16} {}", check.detail);
                if let Some(hint) = &check.hint {
                    println!("    hint: {hint}");
                }
            }

            let passed = checks.iter().filter(|c| c.status == "pass").count();
            let failed = checks.iter().filter(|c| c.status == "fail").count();
            let info = checks.iter().filter(|c| c.status == "info").count();
            println!("\n{passed} checks passed, {failed} failed, {info} info");
        }
    }

    Ok(())
}

fn default_csv_path(data_file: &Path) -> PathBuf {
    let stem = data_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "timeline".into());
    data_file.with_file_name(format!("{stem}_commits.csv"))
}

const DEFAULT_CONFIG: &str = r#"# codevis configuration

[analyze]
# Timeline document written by `codevis analyze`
# output = "timeline.json"
# Per-commit CSV summary (disabled when unset)
# csv_output = "commits.csv"
# Walk this branch instead of HEAD
# branch = "main"
# Fail instead of writing an empty timeline
# require_commits = false
# Pair deletions with additions as renames
# detect_renames = true

[serve]
# port = 3001
# bind = "127.0.0.1"
# data = "timeline.json"
"#;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let config = if cli.config.is_some() || config_path.exists() {
        CodevisConfig::from_file(&config_path)?
    } else {
        CodevisConfig::default()
    };

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    init_tracing(cli.verbose, use_color);
    tracing::debug!(format = %cli.format, config = %config_path.display(), "starting");

    match cli.command {
        None => {
            print_welcome(use_color);
        }
        Some(Command::Analyze {
            ref repo_path,
            ref output,
            ref csv,
            ref branch,
            require_commits,
            no_renames,
        }) => {
            let mut analyze = config.analyze.clone();
            if let Some(output) = output {
                analyze.output = output.clone();
            }
            if csv.is_some() {
                analyze.csv_output = csv.clone();
            }
            if branch.is_some() {
                analyze.branch = branch.clone();
            }
            analyze.require_commits |= require_commits;
            if no_renames {
                analyze.detect_renames = false;
            }

            eprintln!("Analyzing repository at {} ...", repo_path.display());
            let pb = spinner("Reading history...");
            let result = analyze_repository(repo_path, &AnalyzeOptions::from(&analyze));
            if let Some(pb) = &pb {
                pb.finish_and_clear();
            }
            let analysis = result?;
            let artifact = &analysis.artifact;
            eprintln!("Found {} commits", artifact.metadata.total_commits);

            export_json(artifact, &analyze.output)?;
            if let Some(csv_path) = &analyze.csv_output {
                export_csv(artifact.commits(), csv_path)?;
            }

            let summary = AnalyzeSummary::new(
                repo_path,
                &analyze.output,
                analyze.csv_output.as_deref(),
                artifact,
                analysis.warnings.len(),
            );
            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&summary).into_diagnostic()?
                    );
                }
                OutputFormat::Markdown => summary.print_markdown(),
                OutputFormat::Text => summary.print_text(),
            }
        }
        Some(Command::Serve {
            port,
            ref data,
            ref bind,
        }) => {
            let port = port.unwrap_or(config.serve.port);
            let data = data.clone().unwrap_or_else(|| config.serve.data.clone());
            let bind = bind.clone().unwrap_or_else(|| config.serve.bind.clone());

            eprintln!("Starting server on http://{bind}:{port}");
            eprintln!("Timeline data: {}", data.display());
            codevis_serve::server::run_server(&bind, port, data).await?;
        }
        Some(Command::Export {
            ref data_file,
            ref output,
        }) => {
            let output = output.clone().unwrap_or_else(|| default_csv_path(data_file));
            let artifact = load_artifact(data_file)?;
            export_csv(artifact.commits(), &output)?;

            let rows = artifact.metadata.total_commits;
            match cli.format {
                OutputFormat::Json => {
                    let json = serde_json::json!({
                        "input": data_file.display().to_string(),
                        "output": output.display().to_string(),
                        "rows": rows,
                    });
                    println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
                }
                _ => println!(
                    "Exported {rows} commits from {} to {}",
                    data_file.display(),
                    output.display()
                ),
            }
        }
        Some(Command::Init) => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!(miette::miette!(
                    help = "edit the existing file or remove it first",
                    "{CONFIG_FILE} already exists"
                ));
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
        }
        Some(Command::Doctor) => {
            run_doctor(&config, &config_path, cli.format, use_color)?;
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "codevis", &mut std::io::stdout());
        }
    }

    Ok(())
}
