//! New Relic CLI — query applications, metrics, error rate, and Apdex from the terminal.

mod output;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use newrelic_lib::{
    parse_time, ApplicationParams, Client, ClientConfig, ListApplicationsParams, MetricsParams,
};
use output::OutputFormat;
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "newrelic")]
#[command(about = "New Relic CLI — query applications, metrics, error rate, and Apdex", long_about = None)]
struct Cli {
    /// REST API key.
    #[arg(long, env = "NEW_RELIC_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Default application id for commands that need one.
    #[arg(long, env = "NEW_RELIC_APP_ID", global = true)]
    app: Option<String>,

    /// Default host id for metric commands. Conflicts with --instance.
    #[arg(long, env = "NEW_RELIC_HOST_ID", global = true)]
    host: Option<String>,

    /// Default instance id for metric commands. Conflicts with --host.
    #[arg(long, env = "NEW_RELIC_INSTANCE_ID", global = true)]
    instance: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, default_value = "30", global = true)]
    timeout: u64,

    /// Output format: plain (human-readable), json (structured).
    #[arg(short, long, default_value = "plain", value_enum, global = true)]
    output: OutputFormatArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List applications
    Apps {
        /// Filter by application name (partial match)
        #[arg(long)]
        name: Option<String>,
        /// Filter by host name
        #[arg(long)]
        host_filter: Option<String>,
        /// Filter by application ids
        #[arg(long, value_delimiter = ',')]
        ids: Vec<u64>,
        /// Filter by agent language
        #[arg(long)]
        language: Option<String>,
    },
    /// Show one application
    App { app_id: Option<String> },
    /// Get metric timeslice data
    Metrics {
        /// Metric names, e.g. HttpDispatcher,Errors/all
        #[arg(long, value_delimiter = ',', required = true)]
        names: Vec<String>,
        /// Value names to return, e.g. call_count
        #[arg(long, value_delimiter = ',')]
        values: Vec<String>,
        /// Return one timeslice covering the whole window
        #[arg(long)]
        summarize: bool,
        /// Timeslice length in seconds
        #[arg(long)]
        period: Option<u32>,
        #[command(flatten)]
        window: Window,
    },
    /// Error percentage over web and background transactions
    ErrorRate {
        #[command(flatten)]
        window: Window,
    },
    /// Server-side and end-user Apdex
    Apdex {
        #[command(flatten)]
        window: Window,
    },
    /// Show version
    Version,
}

#[derive(Args)]
struct Window {
    /// Window start (ISO 8601). Defaults to 15 minutes ago.
    #[arg(long, value_parser = parse_time)]
    from: Option<DateTime<Utc>>,
    /// Window end (ISO 8601).
    #[arg(long, value_parser = parse_time)]
    to: Option<DateTime<Utc>>,
}

impl Window {
    fn apply(&self, mut params: MetricsParams) -> MetricsParams {
        params.from = self.from;
        params.to = self.to;
        params
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    if matches!(cli.command, Commands::Version) {
        println!("newrelic {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let client = match build_client(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let token = client.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, cancelling request");
            token.cancel();
        }
    });

    let format = match cli.output {
        OutputFormatArg::Plain => OutputFormat::Plain,
        OutputFormatArg::Json => OutputFormat::Json,
    };

    match run(&client, cli.command, format).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_client(cli: &Cli) -> Result<Client, newrelic_lib::Error> {
    let mut builder = ClientConfig::builder(cli.api_key.clone().unwrap_or_default())
        .timeout(Duration::from_secs(cli.timeout))
        .user_agent(format!("newrelic-cli/{}", env!("CARGO_PKG_VERSION")));
    if let Some(app) = &cli.app {
        builder = builder.default_application_id(app);
    }
    if let Some(host) = &cli.host {
        builder = builder.default_host_id(host);
    }
    if let Some(instance) = &cli.instance {
        builder = builder.default_instance_id(instance);
    }
    Client::new(builder.build()?)
}

async fn run(client: &Client, cmd: Commands, format: OutputFormat) -> Result<(), String> {
    let text = match cmd {
        Commands::Apps {
            name,
            host_filter,
            ids,
            language,
        } => {
            let params = ListApplicationsParams {
                name,
                host: host_filter,
                ids,
                language,
                ..ListApplicationsParams::new()
            };
            let apps = client
                .list_applications(&params)
                .await
                .map_err(|e| e.to_string())?;
            output::render(&apps, format, |a| output::format_applications(a))
        }
        Commands::App { app_id } => {
            let params = ApplicationParams {
                app_id,
                ..ApplicationParams::default()
            };
            let app = client
                .get_application(&params)
                .await
                .map_err(|e| e.to_string())?;
            output::render(&app, format, output::format_object)
        }
        Commands::Metrics {
            names,
            values,
            summarize,
            period,
            window,
        } => {
            let mut params = window.apply(
                MetricsParams::new()
                    .names(names)
                    .values(values)
                    .summarize(summarize),
            );
            params.period = period;
            let data = client
                .get_metrics(&params)
                .await
                .map_err(|e| e.to_string())?;
            output::render(&data, format, output::format_metric_data)
        }
        Commands::ErrorRate { window } => {
            let rate = client
                .get_error_rate(&window.apply(MetricsParams::new()))
                .await
                .map_err(|e| e.to_string())?;
            output::render(&rate, format, output::format_error_rate)
        }
        Commands::Apdex { window } => {
            let score = client
                .get_apdex_score(&window.apply(MetricsParams::new()))
                .await
                .map_err(|e| e.to_string())?;
            output::render(&score, format, output::format_apdex)
        }
        Commands::Version => return Ok(()),
    }
    .map_err(|e| e.to_string())?;
    print!("{}", text);
    if format == OutputFormat::Json {
        println!();
    }
    Ok(())
}
