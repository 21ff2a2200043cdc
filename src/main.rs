//! Gmail Send Server
//!
//! HTTP and MCP front ends for sending email through the Gmail API.

use std::sync::Arc;

use clap::{Parser, Subcommand};

use gmail_send_server::config::Config;
use gmail_send_server::error::{AuthError, GmailMcpError, Result};
use gmail_send_server::gmail::auth::{CredentialStore, TokenSource};
use gmail_send_server::gmail::authorize::authorize_interactive;
use gmail_send_server::gmail::client::GmailClient;
use gmail_send_server::http::{self, AppState};
use gmail_send_server::mcp::server::McpServer;
use gmail_send_server::service::EmailService;

/// Gmail Send Server
#[derive(Parser)]
#[command(name = "gmail-send-server")]
#[command(author, version, about = "Send email through Gmail over HTTP or MCP")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize Gmail access (run this first)
    Auth,

    /// Run the HTTP server with the MCP mount (default)
    Serve {
        /// Bind host (overrides GMAIL_HTTP_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides GMAIL_HTTP_PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run the MCP server on stdio
    Stdio,

    /// Print the authorization status as JSON
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::new()?;
    config.find_and_copy_credentials()?;

    match cli.command {
        Some(Commands::Auth) => {
            let store = CredentialStore::new(config)?;
            authorize_interactive(&store).await?;
            eprintln!("Authentication completed successfully!");
        }
        Some(Commands::Status) => {
            let store = CredentialStore::new(config)?;
            let status = store.status().await;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Some(Commands::Stdio) => {
            let (service, _) = build_service(config).await?;
            McpServer::new(service).run_stdio().await?;
        }
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                config.http_host = host;
            }
            if let Some(port) = port {
                config.http_port = port;
            }
            run_http(config).await?;
        }
        None => run_http(config).await?,
    }

    Ok(())
}

/// Wire the credential store, Gmail client and email service together.
///
/// A missing token is not fatal: the server still starts so the status
/// endpoint can explain what to do, and sends report `missing_token`.
async fn build_service(config: Config) -> Result<(Arc<EmailService>, Arc<CredentialStore>)> {
    let store = Arc::new(CredentialStore::new(config.clone())?);

    if !config.credentials_exist() {
        tracing::warn!(
            "credentials.json not found at {}",
            config.credentials_path.display()
        );
    }

    match store.load().await {
        Ok(_) => tracing::info!("Loaded token from {}", config.token_path.display()),
        Err(GmailMcpError::Auth(AuthError::MissingToken { .. })) => {
            tracing::warn!("Not authenticated. Run 'gmail-send-server auth' first.");
        }
        Err(e) => tracing::warn!("Token could not be loaded: {}", e),
    }

    let client = GmailClient::new(store.clone(), &config)?;
    Ok((Arc::new(EmailService::new(client)), store))
}

async fn run_http(config: Config) -> Result<()> {
    let addr = config.http_addr();
    let (service, store) = build_service(config).await?;
    http::serve(&addr, AppState::new(service, store)).await
}
