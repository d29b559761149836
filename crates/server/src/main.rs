use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Local companion server for the city map and stats panels.
#[derive(Debug, Parser)]
#[command(name = "cityscope-server", version)]
struct Args {
    #[arg(long, env = "CITYSCOPE_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    host: IpAddr,

    #[arg(long, env = "CITYSCOPE_PORT", default_value_t = 39333)]
    port: u16,

    /// SQLite database; defaults to ~/.cityscope/cityscope.db.
    #[arg(long, env = "CITYSCOPE_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Extension id allowed to call the API from its pages. Repeat or
    /// comma-separate for several.
    #[arg(long = "extension-id", env = "CITYSCOPE_EXTENSION_IDS", value_delimiter = ',')]
    extension_ids: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cityscope=info")),
        )
        .init();

    let args = Args::parse();
    let addr = SocketAddr::new(args.host, args.port);
    let db_path = args.db_path.unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cityscope")
            .join("cityscope.db")
    });

    tracing::info!(db = %db_path.display(), "opening stats database");
    cityscope_server::serve(addr, db_path, args.extension_ids).await
}
