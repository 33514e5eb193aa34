use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use clap::{Parser, Subcommand};
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sharebox::config::Config;
use sharebox::server::{AppState, create_router};
use sharebox::store::{SqliteStore, Store};

#[cfg(unix)]
fn set_restrictive_permissions(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

#[derive(Parser)]
#[command(name = "sharebox")]
#[command(about = "A file-sharing server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter configuration file with a generated bypass token
    Init {
        /// Where to write the configuration
        #[arg(long, default_value = "sharebox.toml")]
        config: PathBuf,
    },

    /// Start the server
    Serve {
        /// Path to the configuration file
        #[arg(long, default_value = "sharebox.toml")]
        config: PathBuf,

        /// Override the configured host
        #[arg(long)]
        host: Option<String>,

        /// Override the configured port
        #[arg(long, short)]
        port: Option<u16>,

        /// Override the configured data directory
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

fn run_init(config_path: PathBuf) -> anyhow::Result<()> {
    if config_path.exists() {
        bail!(
            "Refusing to overwrite existing configuration at {}",
            config_path.display()
        );
    }

    let mut bytes = [0u8; 24];
    OsRng.fill_bytes(&mut bytes);
    let bypass_token = URL_SAFE_NO_PAD.encode(bytes);

    let template = format!(
        r#"[server]
host = "127.0.0.1"
port = 8080
data_dir = "./data"

[auth]
# The single administrator credential. Change it before going live.
admin_password = "change-me"
# Recovery credential that skips the login throttle. Keep it offline.
bypass_token = "{bypass_token}"
max_attempts = 5
window_minutes = 15
"#
    );

    fs::write(&config_path, template)?;

    #[cfg(unix)]
    set_restrictive_permissions(&config_path);

    println!();
    println!("========================================");
    println!("Wrote starter configuration to: {}", config_path.display());
    println!();
    println!("Bypass token (save this somewhere safe):");
    println!();
    println!("  {bypass_token}");
    println!();
    println!("Edit admin_password before starting the server.");
    println!("========================================");
    println!();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sharebox=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { config } => {
            run_init(config)?;
        }
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
        } => {
            if !config.exists() {
                bail!(
                    "Configuration not found at {}. Run 'sharebox init' first.",
                    config.display()
                );
            }

            let mut config = Config::load(&config)?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(data_dir) = data_dir {
                config.server.data_dir = data_dir;
            }

            if config.auth.admin_password == "change-me" {
                tracing::warn!("admin_password still has the starter value; change it");
            }

            fs::create_dir_all(&config.server.data_dir)?;

            let store = SqliteStore::new(config.server.db_path())?;
            store.initialize()?;

            let state = Arc::new(AppState::new(Arc::new(store), &config.auth));
            let app = create_router(state);
            let addr = config.server.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await?;
        }
    }

    Ok(())
}
