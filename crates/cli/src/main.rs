//! gitdeploy command-line tool.
//!
//! Publishes build output into a branch of a remote git repository.
//! Subcommands: `deploy` (run the pipeline), `plan` (dry-run the tree
//! reconciliation), `init` (write a default config), `validate` (check a
//! config file).

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use gitdeploy_core::config::DeployConfig;
use gitdeploy_core::deploy::{DeployOptions, GIT_METADATA_PATTERN};
use gitdeploy_core::sync::plan;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Publish build output into a remote git repository.
#[derive(Parser, Debug)]
#[command(
    name = "gitdeploy",
    version,
    about = "Publish build output into a branch of a remote git repository"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = "gitdeploy.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full deploy pipeline: clone, synchronize, commit, push.
    Deploy(DeployArgs),

    /// Dry-run: show what synchronization would delete and copy.
    Plan(DeployArgs),

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./gitdeploy.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
}

/// Flags overriding (or standing in for) the config file.
#[derive(Args, Debug, Default)]
struct DeployArgs {
    /// Source directory holding the build output.
    #[arg(long)]
    src: Option<PathBuf>,

    /// Remote git repository URL.
    #[arg(long)]
    url: Option<String>,

    /// Target branch name.
    #[arg(long)]
    branch: Option<String>,

    /// Scratch working-tree directory.
    #[arg(long)]
    tmp: Option<PathBuf>,

    /// Commit message.
    #[arg(long)]
    message: Option<String>,

    /// Annotated tag to create after the commit.
    #[arg(long)]
    tag: Option<String>,

    /// Tag annotation message.
    #[arg(long)]
    tag_message: Option<String>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Deploy(args) => cmd_deploy(&cli.config, args).await,
        Commands::Plan(args) => cmd_plan(&cli.config, args),
        Commands::Init { output } => cmd_init(&output),
        Commands::Validate => cmd_validate(&cli.config),
    }
}

// ---------------------------------------------------------------------------
// Option assembly
// ---------------------------------------------------------------------------

/// Build deploy options from the config file (when present) with CLI flags
/// layered on top.
fn load_options(config_path: &Path, args: DeployArgs) -> Result<DeployOptions> {
    let mut options = if config_path.exists() {
        DeployConfig::load_from_file(config_path)
            .context("failed to load configuration file")?
            .deploy
    } else {
        let Some(src) = args.src.clone() else {
            bail!(
                "no config file at '{}' and no --src given",
                config_path.display()
            );
        };
        DeployOptions::new(src, args.url.clone().unwrap_or_default())
    };

    if let Some(src) = args.src {
        options.src = src;
    }
    if let Some(url) = args.url {
        options.url = url;
    }
    if let Some(branch) = args.branch {
        options.branch = branch;
    }
    if let Some(tmp) = args.tmp {
        options.tmp = tmp;
    }
    if let Some(message) = args.message {
        options.message = message;
    }
    if let Some(tag) = args.tag {
        options.tag = Some(tag);
    }
    if let Some(tag_message) = args.tag_message {
        options.tag_message = tag_message;
    }
    Ok(options)
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

async fn cmd_deploy(config_path: &Path, args: DeployArgs) -> Result<()> {
    let options = load_options(config_path, args)?;
    let branch = options.branch.clone();
    let url = options.url.clone();

    gitdeploy_core::deploy(options)
        .await
        .context("deploy failed")?;

    println!(
        "{} pushed to {} ({})",
        style("Deployed:").green().bold(),
        url,
        branch
    );
    Ok(())
}

fn cmd_plan(config_path: &Path, args: DeployArgs) -> Result<()> {
    let options = load_options(config_path, args)?;
    options.validate().context("invalid deploy options")?;

    // Same protection the deploy itself applies.
    let src_ignore = options.src_ignore_patterns.with_appended(GIT_METADATA_PATTERN);
    let repo_ignore = options
        .repo_ignore_patterns
        .with_appended(GIT_METADATA_PATTERN);
    let plan = plan(&options.src, &src_ignore, &options.tmp, &repo_ignore);

    println!(
        "{} (against working tree '{}')",
        style("Would delete:").yellow().bold(),
        options.tmp.display()
    );
    if plan.to_delete.is_empty() {
        println!("  (nothing)");
    }
    for path in &plan.to_delete {
        println!("  {}", path);
    }

    println!(
        "{} (from '{}')",
        style("Would copy:").yellow().bold(),
        options.src.display()
    );
    if plan.to_copy.is_empty() {
        println!("  (nothing)");
    }
    for path in &plan.to_copy {
        println!("  {}", path);
    }

    println!(
        "{} delete, {} copy",
        plan.to_delete.len(),
        plan.to_copy.len()
    );
    Ok(())
}

fn cmd_init(output: &Path) -> Result<()> {
    if output.exists() {
        bail!("refusing to overwrite existing file '{}'", output.display());
    }
    std::fs::write(output, DeployConfig::default_template())
        .with_context(|| format!("failed to write '{}'", output.display()))?;
    println!("Wrote default configuration to {}", output.display());
    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    let config = DeployConfig::load_from_file(config_path)
        .context("failed to load configuration file")?;
    config.validate().context("configuration is invalid")?;
    println!(
        "{} {} is valid",
        style("OK:").green().bold(),
        config_path.display()
    );
    Ok(())
}
