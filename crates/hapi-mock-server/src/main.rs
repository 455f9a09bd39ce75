use clap::Parser;
use hapi_mock_server::{AppState, Config, MockServer};
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hapi-mock-server")]
#[command(author, version, about = "Programmable HTTP mock server with request recording")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "HAPI_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "HAPI_HOST")]
    host: Option<IpAddr>,

    /// Port to listen on
    #[arg(short, long, env = "HAPI_PORT")]
    port: Option<u16>,

    /// Directory for rules.json
    #[arg(long, env = "HAPI_RULES_DIR")]
    rules_dir: Option<PathBuf>,

    /// Directory for requests.json and per-request files
    #[arg(long, env = "HAPI_REQUESTS_DIR")]
    requests_dir: Option<PathBuf>,

    /// Path prefix of the mock endpoint
    #[arg(long, env = "HAPI_MOCK_PREFIX")]
    mock_prefix: Option<String>,

    /// Emit logs as JSON
    #[arg(long, env = "HAPI_LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(host) = self.host {
            config.listen.host = host;
        }
        if let Some(port) = self.port {
            config.listen.port = port;
        }
        if let Some(dir) = self.rules_dir {
            config.rules.directory = dir;
        }
        if let Some(dir) = self.requests_dir {
            config.recording.directory = dir;
        }
        if let Some(prefix) = self.mock_prefix {
            config.mock_prefix = prefix;
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let config = args.into_config()?;
    info!(
        "Starting mock server (rules: {}, requests: {}, mock prefix: {})",
        config.rules.directory.display(),
        config.recording.directory.display(),
        config.mock_prefix
    );

    let state = Arc::new(AppState::from_config(&config));
    let server = MockServer::bind(config.listen.socket_addr(), state).await?;
    server.run().await
}
