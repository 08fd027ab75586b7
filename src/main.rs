use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};
use tidy_csharp::config::{resolve, RULES};
use tidy_csharp::{
    collect_sources, init_tracing, FileOutcome, HostContext, LexicalResolver, LoadedConfig, Mode,
    RuleSet, WorkspaceGuard,
};

#[derive(Parser)]
#[command(name = "tidy-csharp")]
#[command(about = "Trivia-preserving cleanup of C# sources", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite files in place
    Apply {
        /// Files or directories to process (defaults to the workspace)
        paths: Vec<PathBuf>,

        /// Rule configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Workspace root; nothing outside it is touched (defaults to the current directory)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Report what would change without modifying anything
    Check {
        /// Files or directories to process (defaults to the current directory)
        paths: Vec<PathBuf>,

        /// Rule configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print findings as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available rules and whether they are on by default
    Rules,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            paths,
            config,
            workspace,
            dry_run,
            diff,
        } => cmd_apply(paths, config, workspace, dry_run, diff),

        Commands::Check {
            paths,
            config,
            json,
        } => cmd_check(paths, config, json),

        Commands::Rules => cmd_rules(),
    }
}

/// Helper: Resolve options for a run started in the current directory
fn load_options(config: Option<PathBuf>) -> Result<LoadedConfig> {
    let cwd = env::current_dir().context("failed to read current directory")?;
    Ok(resolve(config.as_deref(), &cwd)?)
}

fn default_paths(paths: Vec<PathBuf>, fallback: &Path) -> Vec<PathBuf> {
    if paths.is_empty() {
        vec![fallback.to_path_buf()]
    } else {
        paths
    }
}

/// Helper: Show unified diff between original and rewritten content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (tidied)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn cmd_apply(
    paths: Vec<PathBuf>,
    config: Option<PathBuf>,
    workspace: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    // 1. Resolve workspace and rules
    let workspace = match workspace {
        Some(path) => path,
        None => env::current_dir().context("failed to read current directory")?,
    };
    let guard = WorkspaceGuard::new(&workspace)
        .with_context(|| format!("invalid workspace {}", workspace.display()))?;
    let LoadedConfig { options, source } = load_options(config)?;

    // 2. Find sources
    let sources = collect_sources(&default_paths(paths, guard.workspace_root()))?;
    println!("Workspace: {}", guard.workspace_root().display());
    println!("Config: {}", source);
    println!("Rules: {}", options.rules.keys().collect::<Vec<_>>().join(", "));
    if dry_run {
        println!("{}", "[DRY RUN - showing what would be rewritten]".cyan());
    }
    println!();

    // 3. Rewrite
    let resolver = LexicalResolver;
    let host = HostContext::new(&resolver, options)
        .with_guard(guard)
        .with_dry_run(dry_run);
    let results = host.process_files(&sources, Mode::Apply);

    // 4. Report results
    let mut total_rewritten = 0;
    let mut total_unchanged = 0;
    let mut total_cancelled = 0;
    let mut total_failed = 0;

    for (path, result) in results {
        match result {
            Ok(file) => {
                match file.outcome {
                    FileOutcome::Rewritten | FileOutcome::WouldRewrite => {
                        let verb = if dry_run { "Would rewrite" } else { "Rewrote" };
                        println!(
                            "{} {} {} ({} findings)",
                            "✓".green(),
                            verb,
                            path.display(),
                            file.report.len()
                        );
                        total_rewritten += 1;
                        if show_diff {
                            display_diff(&path, &file.original, &file.rewritten);
                        }
                    }
                    FileOutcome::Unchanged | FileOutcome::Checked => total_unchanged += 1,
                    FileOutcome::Cancelled => {
                        println!("{} {}: Cancelled", "⊘".cyan(), path.display());
                        total_cancelled += 1;
                    }
                }
            }
            Err(e) => {
                eprintln!("{} {}: Error - {}", "✗".red(), path.display(), e);
                total_failed += 1;
            }
        }
    }

    // 5. Summary
    println!();
    println!("{}", "Summary:".bold());
    let rewritten_label = if dry_run { "would be rewritten" } else { "rewritten" };
    println!("  {} {}", format!("{}", total_rewritten).green(), rewritten_label);
    println!("  {} unchanged", format!("{}", total_unchanged).yellow());
    if total_cancelled > 0 {
        println!("  {} cancelled", format!("{}", total_cancelled).cyan());
    }
    println!("  {} failed", format!("{}", total_failed).red());

    if total_failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_check(paths: Vec<PathBuf>, config: Option<PathBuf>, json: bool) -> Result<()> {
    let options = load_options(config)?.options;
    let cwd = env::current_dir().context("failed to read current directory")?;
    let sources = collect_sources(&default_paths(paths, &cwd))?;

    let resolver = LexicalResolver;
    let host = HostContext::new(&resolver, options);
    let results = host.process_files(&sources, Mode::ReportOnly);

    let mut total_findings = 0;
    let mut total_failed = 0;
    let mut files = Vec::new();

    for (path, result) in results {
        match result {
            Ok(file) => {
                total_findings += file.report.len();
                if json {
                    files.push(serde_json::json!({
                        "path": path,
                        "findings": file.report,
                    }));
                } else {
                    for finding in &file.report {
                        println!("{}:{}", path.display(), finding);
                    }
                }
            }
            Err(e) => {
                eprintln!("{} {}: Error - {}", "✗".red(), path.display(), e);
                total_failed += 1;
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&files)?);
    } else {
        println!();
        println!("{}", "Summary:".bold());
        println!("  {} files checked", sources.len());
        println!("  {} findings", format!("{}", total_findings).yellow());
        println!("  {} failed", format!("{}", total_failed).red());
    }

    if total_findings > 0 || total_failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_rules() -> Result<()> {
    let defaults = RuleSet::defaults();
    println!("{}", "Available rules:".bold());
    for (rule, key, description) in RULES {
        let mark = if defaults.contains(*rule) {
            "✓".green()
        } else {
            "·".dimmed()
        };
        println!("  {} {:<32} {}", mark, key, description);
    }
    println!();
    println!("{} = enabled by default", "✓".green());
    Ok(())
}
