//! Skiff - Git-hosted Package Runner
//!
//! Usage:
//!   skiff install <repo-url>[/<subdir>]   # Install a package from git
//!   skiff run <name> [args...]            # Execute an installed package
//!   skiff list                            # Show installed packages

use std::io::{IsTerminal, Read};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skiff_core::commands::{
    InitCommand, InitOptions, InstallCommand, InstallOptions, QueryCommand, RunCommand,
    RunOptions, RunOutcome, StatusReport, UninstallCommand, UninstallOptions, UpdateCommand,
    UpdateOptions,
};
use skiff_core::registry::InstalledPackageRecord;
use skiff_core::sandbox::ExecutionResult;

#[derive(Parser)]
#[command(name = "skiff")]
#[command(about = "Install and run versioned packages from git repositories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a package from a git repository
    Install {
        /// Package locator: <repo-url>[/<subdirectory>]
        locator: String,

        /// Branch or tag to fetch instead of the default branch
        #[arg(long)]
        branch: Option<String>,

        /// Replace an existing installation of the same package
        #[arg(long)]
        force: bool,
    },

    /// Update an installed package from its recorded source
    Update {
        /// Installed package name
        name: String,

        /// Branch or tag to fetch instead of the recorded one
        #[arg(long)]
        branch: Option<String>,
    },

    /// Remove an installed package
    Uninstall {
        /// Installed package name
        name: String,
    },

    /// List installed packages
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show full detail for one installed package
    Info {
        /// Installed package name
        name: String,
    },

    /// Search installed packages by name, description, and tags
    Search {
        /// Substring matched against package names and descriptions
        #[arg(short, long)]
        query: Option<String>,

        /// Tags to match (any overlap qualifies)
        #[arg(long, num_args = 1..)]
        tags: Vec<String>,
    },

    /// Show registry location and health
    Status,

    /// Scaffold a new package in the current directory
    Init {
        /// Package name (also used to derive the entry module name)
        name: String,

        /// Target directory (defaults to ./<name>)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Execute an installed package with its declared arguments
    #[command(disable_help_flag = true)]
    Run {
        /// Installed package name
        name: String,

        /// Arguments forwarded to the package (see `skiff run <name> --help`)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() {
    // Initialize tracing; logs go to stderr so run output stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("SKIFF_LOG")
                .unwrap_or_else(|_| "skiff=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(err) = run_cli(cli.command) {
        eprintln!("{} {err:#}", style("error:").red().bold());
        std::process::exit(1);
    }
}

fn run_cli(command: Commands) -> Result<()> {
    match command {
        Commands::Install {
            locator,
            branch,
            force,
        } => run_install(locator, branch, force),
        Commands::Update { name, branch } => run_update(name, branch),
        Commands::Uninstall { name } => run_uninstall(name),
        Commands::List { format } => run_list(format),
        Commands::Info { name } => run_info(name),
        Commands::Search { query, tags } => run_search(query, tags),
        Commands::Status => run_status(),
        Commands::Init { name, dir } => run_init(name, dir),
        Commands::Run { name, args } => run_run(name, args),
    }
}

fn run_install(locator: String, branch: Option<String>, force: bool) -> Result<()> {
    let mut options = InstallOptions::new(locator);
    if let Some(branch) = branch {
        options = options.with_branch(branch);
    }
    if force {
        options = options.with_force();
    }

    let cmd = InstallCommand::with_defaults()?;
    let report = cmd.execute(&options)?;

    if report.replaced {
        println!(
            "✓ Replaced '{}' with {} ({})",
            report.name,
            report.version,
            short_commit(&report.commit)
        );
    } else {
        println!(
            "✓ Installed '{}' {} ({})",
            report.name,
            report.version,
            short_commit(&report.commit)
        );
    }
    println!("  Location: {}", report.install_dir.display());

    Ok(())
}

fn run_update(name: String, branch: Option<String>) -> Result<()> {
    let mut options = UpdateOptions::new(name);
    if let Some(branch) = branch {
        options = options.with_branch(branch);
    }

    let cmd = UpdateCommand::with_defaults()?;
    let report = cmd.execute(&options)?;

    let old_commit = report.old_commit.as_deref().unwrap_or("unknown");
    println!(
        "✓ Updated '{}' {} → {}",
        report.name, report.old_version, report.new_version
    );
    println!(
        "  Commit: {} → {}",
        short_commit(old_commit),
        short_commit(&report.new_commit)
    );

    Ok(())
}

fn run_uninstall(name: String) -> Result<()> {
    let cmd = UninstallCommand::with_defaults()?;
    let report = cmd.execute(&UninstallOptions::new(name))?;

    println!("✓ Uninstalled '{}' {}", report.name, report.version);

    Ok(())
}

fn run_list(format: OutputFormat) -> Result<()> {
    let cmd = QueryCommand::with_defaults()?;
    let records = cmd.list()?;

    match format {
        OutputFormat::Table => print_package_table(&records),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
    }

    Ok(())
}

fn run_info(name: String) -> Result<()> {
    let cmd = QueryCommand::with_defaults()?;
    let record = cmd.info(&name)?;

    print_package_detail(&record);

    Ok(())
}

fn run_search(query: Option<String>, tags: Vec<String>) -> Result<()> {
    let cmd = QueryCommand::with_defaults()?;
    let records = cmd.search(query.as_deref(), &tags)?;

    if records.is_empty() {
        println!("No packages matched.");
        return Ok(());
    }
    print_package_table(&records);

    Ok(())
}

fn run_status() -> Result<()> {
    let cmd = QueryCommand::with_defaults()?;
    let report = cmd.status()?;

    print_status(&report);

    Ok(())
}

fn run_init(name: String, dir: Option<PathBuf>) -> Result<()> {
    let mut options = InitOptions::new(&name);
    if let Some(dir) = dir {
        options = options.with_dir(dir);
    }

    let report = InitCommand::new().execute(&options)?;

    println!("✓ Created package '{}'", name);
    println!("  Config: {}", report.config_path.display());
    println!("  Module: {}", report.module_path.display());
    println!();
    println!("Push to a git repository, then install with: skiff install <repo-url>");

    Ok(())
}

fn run_run(name: String, args: Vec<String>) -> Result<()> {
    let mut options = RunOptions::new(name).with_args(args);
    if let Some(piped) = capture_piped_stdin() {
        options = options.with_piped(piped);
    }

    let cmd = RunCommand::with_defaults()?;
    match cmd.execute(&options)? {
        RunOutcome::Help(text) => println!("{text}"),
        RunOutcome::Completed(ExecutionResult::Success { result }) => print_run_result(&result),
        RunOutcome::Completed(ExecutionResult::Failure { error }) => {
            eprintln!(
                "{} {}: {}",
                style("✗ execution failed").red().bold(),
                error.kind,
                error.message
            );
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Reads the whole of stdin when content is piped in, before any child runs.
fn capture_piped_stdin() -> Option<String> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return None;
    }

    let mut buffer = String::new();
    match stdin.read_to_string(&mut buffer) {
        Ok(_) if !buffer.is_empty() => Some(buffer),
        _ => None,
    }
}

/// String results print verbatim; structured results pretty-print as JSON.
fn print_run_result(result: &serde_json::Value) {
    match result {
        serde_json::Value::String(text) => println!("{text}"),
        serde_json::Value::Null => {}
        other => match serde_json::to_string_pretty(other) {
            Ok(rendered) => println!("{rendered}"),
            Err(_) => println!("{other}"),
        },
    }
}

fn print_package_table(records: &[InstalledPackageRecord]) {
    if records.is_empty() {
        println!("No packages installed.");
        println!("Install one with: skiff install <repo-url>[/<subdirectory>]");
        return;
    }

    println!(
        "{:<24} {:<12} {:<12} Description",
        "Name", "Version", "Installed"
    );
    println!("{}", "-".repeat(76));

    for record in records {
        let description = truncate(&record.manifest.description, 40);
        println!(
            "{:<24} {:<12} {:<12} {}",
            record.manifest.name,
            record.manifest.version,
            record.installed_at.format("%Y-%m-%d"),
            description
        );
    }
}

fn print_package_detail(record: &InstalledPackageRecord) {
    let manifest = &record.manifest;

    println!("{}", style(&manifest.name).bold());
    println!("  Version:     {}", manifest.version);
    if !manifest.description.is_empty() {
        println!("  Description: {}", manifest.description);
    }
    if !manifest.author.is_empty() {
        println!("  Author:      {}", manifest.author);
    }
    println!("  Source:      {}", record.source.url);
    if let Some(subdir) = &record.source.subdir {
        println!("  Subdir:      {subdir}");
    }
    if let Some(branch) = &record.source.branch {
        println!("  Branch:      {branch}");
    }
    if let Some(commit) = &record.commit {
        println!("  Commit:      {}", short_commit(commit));
    }
    println!("  Entry point: {}", manifest.entry_point);
    println!("  Installed:   {}", record.installed_at.format("%Y-%m-%d %H:%M UTC"));
    println!("  Location:    {}", record.install_dir.display());
    if !manifest.tags.is_empty() {
        println!("  Tags:        {}", manifest.tags.join(", "));
    }

    if !manifest.arguments.is_empty() {
        println!();
        println!("  Arguments:");
        for arg in &manifest.arguments {
            let requirement = if arg.required { " (required)" } else { "" };
            println!(
                "    --{:<18} {}{}  {}",
                arg.name, arg.kind, requirement, arg.help
            );
        }
    }
}

fn print_status(report: &StatusReport) {
    println!("State root: {}", report.state_dir.display());
    println!("Registry:   {}", report.registry_path.display());
    println!("Packages:   {}", report.package_count);

    if !report.orphaned.is_empty() {
        println!();
        println!("Orphaned records (install directory missing):");
        for name in &report.orphaned {
            println!("  ⚠ {}", name);
        }
        println!("Reinstall or uninstall these packages to repair the registry.");
    }
}

fn short_commit(commit: &str) -> &str {
    if commit.len() > 12 {
        &commit[..12]
    } else {
        commit
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        match Cli::try_parse_from(args) {
            Ok(cli) => cli,
            Err(err) => panic!("expected {:?} to parse: {err}", args),
        }
    }

    #[test]
    fn install_accepts_branch_and_force() {
        let cli = parse(&[
            "skiff",
            "install",
            "https://example.com/repo/pkg",
            "--branch",
            "dev",
            "--force",
        ]);

        match cli.command {
            Commands::Install {
                locator,
                branch,
                force,
            } => {
                assert_eq!(locator, "https://example.com/repo/pkg");
                assert_eq!(branch.as_deref(), Some("dev"));
                assert!(force);
            }
            _ => panic!("expected install command"),
        }
    }

    #[test]
    fn run_keeps_hyphenated_flags_for_the_package() {
        let cli = parse(&["skiff", "run", "demo", "--shout", "--count", "3", "--help"]);

        match cli.command {
            Commands::Run { name, args } => {
                assert_eq!(name, "demo");
                assert_eq!(args, ["--shout", "--count", "3", "--help"]);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn run_without_trailing_args_parses() {
        let cli = parse(&["skiff", "run", "demo"]);

        match cli.command {
            Commands::Run { name, args } => {
                assert_eq!(name, "demo");
                assert!(args.is_empty());
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn list_format_defaults_to_table() {
        let cli = parse(&["skiff", "list"]);

        match cli.command {
            Commands::List { format } => assert!(matches!(format, OutputFormat::Table)),
            _ => panic!("expected list command"),
        }

        let cli = parse(&["skiff", "list", "--format", "json"]);
        match cli.command {
            Commands::List { format } => assert!(matches!(format, OutputFormat::Json)),
            _ => panic!("expected list command"),
        }
    }

    #[test]
    fn search_collects_multiple_tags() {
        let cli = parse(&["skiff", "search", "--query", "demo", "--tags", "cli", "text"]);

        match cli.command {
            Commands::Search { query, tags } => {
                assert_eq!(query.as_deref(), Some("demo"));
                assert_eq!(tags, ["cli", "text"]);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["skiff"]).is_err());
    }

    #[test]
    fn truncate_keeps_short_text_intact() {
        assert_eq!(truncate("short", 40), "short");
        let long = "x".repeat(60);
        let cut = truncate(&long, 40);
        assert_eq!(cut.chars().count(), 40);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn short_commit_trims_full_shas() {
        assert_eq!(short_commit("0123456789abcdef0123"), "0123456789ab");
        assert_eq!(short_commit("abc123"), "abc123");
    }
}
