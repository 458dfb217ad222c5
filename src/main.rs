use anyhow::Result;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use rehearse::app::{run_extract_command, run_session_command};
use rehearse::cli::{Cli, Commands, ConfigAction};
use rehearse::config::Config;
use rehearse::diagnostics::check_dependencies;
use rehearse::session::SessionState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_filter());

    match cli.command {
        Commands::Run { document, options } => {
            #[cfg(feature = "cpal-audio")]
            rehearse::audio::output::suppress_audio_warnings();

            let config = load_config(cli.config.as_deref())?;
            let report =
                run_session_command(config, &document, options, cli.quiet, cli.verbose).await?;
            if report.state == SessionState::Cancelled {
                // Conventional exit status for SIGINT
                std::process::exit(130);
            }
        }
        Commands::Extract { document, json } => {
            run_extract_command(&document, json)?;
        }
        Commands::Devices => {
            list_output_devices()?;
        }
        Commands::Check => {
            let config = load_config(cli.config.as_deref())?;
            check_dependencies(&config);
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "rehearse", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` overrides the flag-derived filter.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/rehearse/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        // Load from custom path
        Config::load(path)?
    } else {
        // Try default path, fall back to defaults
        Config::load_or_default(&Config::default_path())?
    };

    // Apply environment variable overrides
    Ok(config.with_env_overrides())
}

/// List available audio output devices.
#[cfg(feature = "cpal-audio")]
fn list_output_devices() -> Result<()> {
    let devices = rehearse::audio::output::list_output_devices()?;

    if devices.is_empty() {
        eprintln!("No audio output devices found");
        std::process::exit(1);
    }

    println!("Available audio output devices:");
    for (idx, device) in devices.iter().enumerate() {
        println!("  [{}] {}", idx, device);
    }

    Ok(())
}

#[cfg(not(feature = "cpal-audio"))]
fn list_output_devices() -> Result<()> {
    eprintln!(
        "{}",
        "Built without cpal-audio; audio is delivered as files only.".yellow()
    );
    Ok(())
}

fn handle_config_command(action: ConfigAction, custom_path: Option<&std::path::Path>) -> Result<()> {
    let config_path = custom_path
        .map(std::path::PathBuf::from)
        .unwrap_or_else(Config::default_path);

    match action {
        ConfigAction::Show => {
            let config = Config::load_or_default(&config_path)?.with_env_overrides();
            print!("{}", config.to_display_toml()?);
        }
        ConfigAction::Path => {
            let exists = config_path.exists();
            println!("{}", config_path.display());
            if !exists {
                eprintln!("{}", "(not created yet, defaults in use)".dimmed());
            }
        }
    }
    Ok(())
}
