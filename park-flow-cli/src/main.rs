mod commands;
mod interactive;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use park_flow::views::LocationForm;
use park_flow::{ClientConfig, HttpParkingApi, ParkingApi, SessionFilter, StepContext, geo};

#[derive(Parser, Debug)]
#[command(name = "park", author, version, about = "Start and track parking sessions")]
struct Cli {
    /// Backend base URL
    #[arg(long, env = "PARKING_API_URL", global = true)]
    api_url: Option<String>,

    /// Raw Cookie header sent with every request
    #[arg(long, env = "PARKING_SESSION_COOKIE", global = true, hide_env_values = true)]
    session_cookie: Option<String>,

    /// Device latitude; without it and --lng the position is unavailable
    #[arg(long, env = "PARKING_LAT", global = true, allow_negative_numbers = true)]
    lat: Option<f64>,

    #[arg(long, env = "PARKING_LNG", global = true, allow_negative_numbers = true)]
    lng: Option<f64>,

    #[arg(long, env = "PARKING_HTTP_TIMEOUT_SECS", global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Registered vehicles
    #[command(subcommand)]
    Cars(CarsCommand),
    /// Saved parking locations
    #[command(subcommand)]
    Locations(LocationsCommand),
    /// Parking sessions
    #[command(subcommand)]
    Sessions(SessionsCommand),
}

#[derive(Subcommand, Debug)]
enum CarsCommand {
    List,
    Add {
        #[arg(long)]
        plate: String,
        #[arg(long)]
        photo: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum LocationsCommand {
    List,
    /// Save a location at --lat/--lng, the device position, or the map default
    Add(AddLocationArgs),
}

#[derive(Args, Debug)]
struct AddLocationArgs {
    #[arg(long)]
    name: String,
    /// Use the map default when no position is known
    #[arg(long)]
    use_default_position: bool,
    /// Maximum stay in minutes
    #[arg(long)]
    max_stay: Option<String>,
    /// Minutes before the car may return
    #[arg(long)]
    no_return: Option<String>,
    #[arg(long)]
    public: bool,
}

#[derive(Subcommand, Debug)]
enum SessionsCommand {
    List {
        /// active, completed or all
        #[arg(long, default_value = "active")]
        status: SessionFilter,
    },
    Show {
        id: String,
    },
    Complete {
        id: String,
    },
    /// Live countdown until Ctrl-C
    Watch {
        id: String,
    },
    /// Walk through photo, vehicle, location and details
    Start {
        #[arg(long)]
        photo: Option<PathBuf>,
    },
}

impl Cli {
    fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let base_url = self
            .api_url
            .clone()
            .context("backend URL missing: pass --api-url or set PARKING_API_URL")?;

        let mut config = ClientConfig::new(base_url);
        if let Some(cookie) = &self.session_cookie {
            config = config.with_session_cookie(cookie);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    fn step_context(&self) -> anyhow::Result<StepContext> {
        let config = self.client_config()?;
        let api: Arc<dyn ParkingApi> =
            Arc::new(HttpParkingApi::new(&config).context("failed to build HTTP client")?);
        Ok(StepContext::new(api, geo::from_optional(self.lat, self.lng)))
    }
}

/// Warnings only unless RUST_LOG says otherwise; info lines would interleave with the prompts.
const DEFAULT_LOG_FILTER: &str = "park_flow=warn,park_flow_cli=warn";

/// Initialize tracing on stderr; stdout is reserved for command output
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let ctx = cli.step_context()?;

    match cli.command {
        Command::Cars(CarsCommand::List) => commands::list_cars(&ctx).await,
        Command::Cars(CarsCommand::Add { plate, photo }) => {
            commands::add_car(&ctx, plate, &photo).await
        }
        Command::Locations(LocationsCommand::List) => commands::list_locations(&ctx).await,
        Command::Locations(LocationsCommand::Add(args)) => {
            let form = LocationForm {
                name: args.name,
                coords: None,
                max_stay: args.max_stay,
                no_return_time: args.no_return,
                is_public: args.public,
                use_default_position: args.use_default_position,
            };
            commands::add_location(&ctx, form).await
        }
        Command::Sessions(SessionsCommand::List { status }) => {
            commands::list_sessions(&ctx, status).await
        }
        Command::Sessions(SessionsCommand::Show { id }) => commands::show_session(&ctx, &id).await,
        Command::Sessions(SessionsCommand::Complete { id }) => {
            commands::complete_session(&ctx, &id).await
        }
        Command::Sessions(SessionsCommand::Watch { id }) => commands::watch_session(&ctx, &id).await,
        Command::Sessions(SessionsCommand::Start { photo }) => {
            interactive::start_session(ctx, photo).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn default_logging_stays_below_info() {
        assert!(tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
        assert!(!DEFAULT_LOG_FILTER.contains("info"));
        assert!(!DEFAULT_LOG_FILTER.contains("debug"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_negative_coordinates_and_filters() {
        let cli = Cli::try_parse_from([
            "park",
            "--api-url",
            "http://localhost:8000",
            "--lat",
            "51.5",
            "--lng",
            "-0.09",
            "sessions",
            "list",
            "--status",
            "all",
        ])
        .unwrap();

        assert_eq!(cli.lng, Some(-0.09));
        assert!(matches!(
            cli.command,
            Command::Sessions(SessionsCommand::List {
                status: SessionFilter::All
            })
        ));
        assert_eq!(cli.client_config().unwrap().base_url, "http://localhost:8000");
    }
}
