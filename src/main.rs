use clap::{Parser, Subcommand};
use restmcp::app::{App, AppConfig, AppError};
use restmcp::services::logger::LogLevel;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "restmcp", version, about = "Config-driven REST service dispatcher")]
struct Cli {
    /// Service catalog XML (default: $RESTMCP_SERVICES_XML, then my_services.xml).
    #[arg(long, global = true)]
    services: Option<PathBuf>,
    #[arg(long, global = true)]
    connect_timeout_ms: Option<u64>,
    #[arg(long, global = true)]
    request_timeout_ms: Option<u64>,
    /// error, warn, info or debug.
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the MCP tools over stdio (default).
    Serve,
    /// Print the service catalog.
    List {
        #[arg(long)]
        pretty: bool,
    },
    /// Invoke one service and print the result.
    Call {
        service: String,
        /// Arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    App(#[from] AppError),
    #[error("unknown log level: {0}")]
    LogLevel(String),
    #[error("--args must be a JSON object: {0}")]
    Args(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Cli {
    fn config(&self) -> Result<AppConfig, CliError> {
        let mut config = AppConfig::from_env();
        if let Some(path) = &self.services {
            config.services_path = path.clone();
        }
        if let Some(ms) = self.connect_timeout_ms.filter(|ms| *ms > 0) {
            config.http.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.request_timeout_ms.filter(|ms| *ms > 0) {
            config.http.request_timeout = Duration::from_millis(ms);
        }
        if let Some(raw) = &self.log_level {
            let level = LogLevel::parse(raw).ok_or_else(|| CliError::LogLevel(raw.clone()))?;
            config.log_level = Some(level);
        }
        Ok(config)
    }
}

fn render(value: &Value, pretty: bool) -> Result<String, CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

fn parse_args(raw: &str) -> Result<Map<String, Value>, CliError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(CliError::Args(format!("got {}", other))),
        Err(err) => Err(CliError::Args(err.to_string())),
    }
}

async fn run(cli: Cli) -> Result<bool, CliError> {
    let config = cli.config()?;
    let app = App::initialize(&config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            restmcp::mcp::server::run_stdio(&app).await?;
            Ok(true)
        }
        Command::List { pretty } => {
            let services = app.dispatcher.list_services();
            println!("{}", render(&serde_json::json!({ "services": services }), pretty)?);
            Ok(true)
        }
        Command::Call {
            service,
            args,
            pretty,
        } => {
            let arguments = parse_args(&args)?;
            let result = app.dispatcher.invoke(&service, &arguments).await;
            println!("{}", render(&result.to_value(), pretty)?);
            Ok(result.ok)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("restmcp: {}", err);
            ExitCode::FAILURE
        }
    }
}
