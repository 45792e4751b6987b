use clap::Parser;
use pkg_api::server::{ServerConfig, start_server};
use pkg_constants::network::DEFAULT_WEBHOOK_PORT;
use pkg_constants::paths::{DEFAULT_SERVER_CONFIG, DEFAULT_SERVER_DATA_DIR};
use pkg_types::config::{LogFormat, ServerConfigFile, load_config_file};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "k3rs-quota", about = "k3rs project quota admission webhook")]
struct Cli {
    /// Path to YAML config file
    #[arg(long, short, default_value = DEFAULT_SERVER_CONFIG)]
    config: String,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Directory for SlateDB state storage
    #[arg(long)]
    data_dir: Option<String>,

    /// Cache the ProjectQuota listing used for owner resolution
    #[arg(long)]
    resolver_cache: Option<bool>,

    /// Reject objects in namespaces claimed by more than one ProjectQuota
    #[arg(long)]
    strict_namespace_ownership: Option<bool>,

    /// Log output format: text or json
    #[arg(long)]
    log_format: Option<LogFormat>,
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config file (returns defaults if file not found)
    let file_cfg: ServerConfigFile = load_config_file(&cli.config)?;

    // Merge: CLI args > config file > defaults
    let log_format = cli.log_format.or(file_cfg.log_format).unwrap_or_default();
    init_logging(log_format);
    info!("Config file: {}", cli.config);

    let port = cli.port.or(file_cfg.port).unwrap_or(DEFAULT_WEBHOOK_PORT);
    let data_dir = cli
        .data_dir
        .or(file_cfg.data_dir)
        .unwrap_or_else(|| DEFAULT_SERVER_DATA_DIR.to_string());
    let resolver_cache = cli
        .resolver_cache
        .or(file_cfg.resolver_cache)
        .unwrap_or(false);
    let strict_namespace_ownership = cli
        .strict_namespace_ownership
        .or(file_cfg.strict_namespace_ownership)
        .unwrap_or(false);

    info!("Starting k3rs-quota");
    info!("  Port:             {}", port);
    info!("  Data dir:         {}", data_dir);
    info!("  Resolver cache:   {}", resolver_cache);
    info!("  Strict ownership: {}", strict_namespace_ownership);

    let config = ServerConfig {
        addr: SocketAddr::from(([0, 0, 0, 0], port)),
        data_dir,
        resolver_cache,
        strict_namespace_ownership,
    };

    start_server(config).await?;

    Ok(())
}
