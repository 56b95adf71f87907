use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use federated_bootstrap::extensions::manifest;
use federated_bootstrap::plugins::builtin;
use federated_bootstrap::{App, Bootstrap, BootstrapReport, Config, ConfigOverrides, HttpFetcher};

/// fedboot - load federated extensions and start the application
#[derive(Parser)]
#[command(name = "fedboot", version, about)]
struct Cli {
    /// Config file (defaults to ~/.config/fedboot/config.toml)
    #[arg(short, long, env = "FEDBOOT_CONFIG")]
    config: Option<PathBuf>,

    /// Application server base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Base URL federated extensions are served under
    #[arg(long)]
    labextensions_url: Option<String>,

    /// JSON file listing federated extensions
    #[arg(long)]
    extensions: Option<PathBuf>,

    /// Disable a plugin id or extension package (repeatable)
    #[arg(long = "disable", value_name = "ID")]
    disabled: Vec<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Load extensions and start the application (default)
    Run,
    /// Print the federated extensions and their resolved entry URLs
    Manifest,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,federated_bootstrap=info",
        1 => "info,federated_bootstrap=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = ConfigOverrides {
        config_path: cli.config,
        base_url: cli.base_url,
        labextensions_url: cli.labextensions_url,
        extensions_file: cli.extensions,
        disabled: cli.disabled,
    };

    let config = Config::load(&overrides)?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => cmd_run(config).await,
        Command::Manifest => cmd_manifest(&config),
    }
}

async fn cmd_run(config: Config) -> anyhow::Result<()> {
    let mut app = App::new(config.public_path()?);
    let bootstrap = Bootstrap::new(config, Arc::new(HttpFetcher::new()));

    let report = bootstrap.run(&mut app, builtin::modules()).await?;
    print_report(&app, &report);

    Ok(())
}

fn cmd_manifest(config: &Config) -> anyhow::Result<()> {
    let descriptors = manifest::parse(&config.federated_extensions)?;

    if descriptors.is_empty() {
        println!("No federated extensions configured.");
        return Ok(());
    }

    for descriptor in &descriptors {
        let entry = descriptor
            .entry_url(&config.labextensions_url)
            .map_or_else(|e| format!("<invalid: {e}>"), |url| url.to_string());
        let disabled = if config.disabled.is_disabled(&descriptor.name) {
            " (disabled)"
        } else {
            ""
        };

        println!("{}{disabled}", descriptor.name);
        println!("  entry:     {entry}");
        if let Some(module) = &descriptor.extension_module {
            println!("  extension: {module}");
        }
        if let Some(module) = &descriptor.mime_extension_module {
            println!("  mime:      {module} (not loaded)");
        }
        if let Some(module) = &descriptor.style_module {
            println!("  style:     {module}");
        }
    }

    Ok(())
}

fn print_report(app: &App, report: &BootstrapReport) {
    for line in report_lines(app, report) {
        println!("{line}");
    }
}

/// Lines describing what the application ended up with
fn report_lines(app: &App, report: &BootstrapReport) -> Vec<String> {
    let mut lines = Vec::new();

    let registered = app.plugins();
    lines.push(format!("Registered {} plugins:", registered.len()));
    for plugin in registered {
        let active = if app.activated().contains(&plugin.id) {
            " (active)"
        } else {
            ""
        };
        lines.push(format!("  {} [{}]{active}", plugin.id, plugin.source));
    }

    let duplicates = report.plugins.len().saturating_sub(registered.len());
    if duplicates > 0 {
        lines.push(format!("Skipped {duplicates} plugins with duplicate ids"));
    }

    if !report.disabled.is_empty() {
        lines.push("Disabled:".to_string());
        for id in report.disabled.ids() {
            lines.push(format!("  {id}"));
        }
    }

    if !report.styles.is_empty() {
        lines.push("Styles:".to_string());
        for style in &report.styles {
            lines.push(format!("  {} ({})", style.url, style.extension));
        }
    }

    if !report.failures.is_empty() {
        lines.push("Failures:".to_string());
        for failure in &report.failures {
            let module = failure.module.as_deref().unwrap_or("-");
            lines.push(format!(
                "  [{}] {} {module}: {}",
                failure.stage, failure.extension, failure.reason
            ));
        }
    }

    lines
}
