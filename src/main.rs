use clap::{Parser, Subcommand};
use humantime_serde::re::humantime;
use std::net::IpAddr;
use std::path::PathBuf;

use pingboard::app::{handle_fatal_error, init_logging, AppConfig};
use pingboard::config::PingboardConfig;

/// Callback ping service with rolling activity charts
#[derive(Parser)]
#[command(name = "pingboard", version)]
#[command(about = "Record callback pings and chart recent activity", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service (default command)
    Serve {
        /// Address to bind, overrides config and PINGBOARD_BIND
        #[arg(long)]
        bind: Option<IpAddr>,

        /// Port to listen on, overrides config and PINGBOARD_PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Validate the configuration and print the effective settings
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let app_config = AppConfig::new(cli.verbose).with_config_path(cli.config);
    init_logging(&app_config);

    let result = match cli.command {
        Some(Commands::Serve { bind, port }) => run_serve(&app_config, bind, port).await,
        Some(Commands::CheckConfig) => run_check_config(&app_config),
        None => run_serve(&app_config, None, None).await,
    };

    if let Err(e) = result {
        handle_fatal_error(e, app_config.verbose);
    }
}

async fn run_serve(
    app_config: &AppConfig,
    bind: Option<IpAddr>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let mut config = PingboardConfig::load(app_config.config_path.as_deref())?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    pingboard::server::serve(&config).await
}

fn run_check_config(app_config: &AppConfig) -> anyhow::Result<()> {
    let config = PingboardConfig::load(app_config.config_path.as_deref())?;
    let window = config.window_spec()?;

    println!("listen:        {}", config.server.socket_addr());
    println!(
        "window:        {} ({} buckets of {})",
        humantime::format_duration(window.window()),
        window.bucket_count() + 1,
        humantime::format_duration(window.bucket_width())
    );
    println!(
        "query timeout: {}",
        humantime::format_duration(config.activity.query_timeout)
    );
    println!("\n[storage]\n{}", toml::to_string(&config.storage)?);
    Ok(())
}
