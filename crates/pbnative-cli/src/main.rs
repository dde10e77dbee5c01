mod locate;
mod relay;
mod scenario;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::scenario::{BridgeMode, GeoMode, GpsMode, TokenMode};

#[derive(Debug, Parser)]
#[command(name = "pbnative")]
#[command(about = "Replay picklebay WebView location and bridge-relay flows against scripted collaborators")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the "use current location" sequence.
    Locate {
        #[command(flatten)]
        bridge: BridgeArgs,
        #[arg(long, value_enum, default_value_t = GpsMode::Enabled)]
        gps: GpsMode,
        #[arg(long, default_value_t = 200)]
        gps_delay_ms: u64,
        #[arg(long, value_enum, default_value_t = GeoMode::Fix)]
        geo: GeoMode,
        #[arg(long, default_value_t = 0)]
        geo_delay_ms: u64,
        #[arg(long, default_value_t = 12.9, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, default_value_t = 77.6, allow_negative_numbers = true)]
        lng: f64,
        #[arg(long, default_value_t = 10.0)]
        accuracy: f64,
        /// Fire this many triggers at once on the same surface.
        #[arg(long, default_value_t = 1)]
        triggers: usize,
    },
    /// Initialize analytics, log the app-open events, and fetch the push token.
    Relay {
        #[command(flatten)]
        bridge: BridgeArgs,
        #[arg(long, value_enum, default_value_t = TokenMode::Token)]
        token: TokenMode,
        #[arg(long)]
        user_id: Option<String>,
        /// Title of a page-triggered notification to record.
        #[arg(long)]
        notification_title: Option<String>,
        /// Raw JSON options for that notification.
        #[arg(long, default_value = "")]
        notification_options: String,
    },
    /// Print the effective configuration.
    Config,
}

#[derive(Debug, Clone, clap::Args)]
struct BridgeArgs {
    #[arg(long, value_enum, default_value_t = BridgeMode::Present)]
    bridge: BridgeMode,
    /// Delay before the injected bridge script settles.
    #[arg(long, default_value_t = 100)]
    script_delay_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = pbnative_core::load_app_config_from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Locate {
            bridge,
            gps,
            gps_delay_ms,
            geo,
            geo_delay_ms,
            lat,
            lng,
            accuracy,
            triggers,
        }) => {
            let scenario = scenario::LocateScenario {
                bridge: bridge.bridge,
                script_delay_ms: bridge.script_delay_ms,
                gps,
                gps_delay_ms,
                geo,
                geo_delay_ms,
                fix: (lat, lng, accuracy),
            };
            locate::run_locate(&config, &scenario, triggers).await?;
        }
        Some(Commands::Relay {
            bridge,
            token,
            user_id,
            notification_title,
            notification_options,
        }) => {
            let page = relay::PageOpen {
                user_id: user_id.as_deref(),
                notification: notification_title
                    .as_deref()
                    .map(|title| (title, notification_options.as_str())),
            };
            relay::run_relay(&config, bridge.bridge, bridge.script_delay_ms, token, &page).await?;
        }
        Some(Commands::Config) => println!("{config:#?}"),
        None => println!("pbnative ready; see --help for commands"),
    }

    Ok(())
}
