use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use storefront_auth::{AccessGuard, CallbackOutcome, inspector};
use storefront_client::StorefrontClient;
use storefront_config::Config;
use storefront_store::{CookieJar, SqliteKeyValueStore, TokenStore};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "storefront", about = "storefront: token-aware API client")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    /// SQLite database path (default: ~/.storefront/credentials.db).
    #[arg(long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,
    /// `Cookie` header to consult when no access token is stored.
    #[arg(long, value_name = "HEADER", global = true)]
    cookie: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a token and show its claims, validity and roles.
    Inspect {
        token: String,
    },
    /// Show whether tokens are stored and valid.
    Status,
    /// Sign in through a third-party provider (e.g. google).
    Login {
        provider: String,
        /// Local port that receives the sign-in redirect.
        #[arg(long, default_value_t = 8765)]
        port: u16,
    },
    /// Remove stored tokens.
    Logout {
        /// Also sign out on the server before clearing.
        #[arg(long)]
        remote: bool,
    },
    /// Authenticated GET of a path under the API base; prints the JSON body.
    Get {
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("config error")?;
    init_tracing(&config);

    match cli.command {
        Commands::Inspect { token } => cmd_inspect(&token),
        Commands::Status => cmd_status(&open_tokens(cli.db, cli.cookie).await?).await,
        Commands::Login { provider, port } => {
            let client = StorefrontClient::from_config(&config, open_tokens(cli.db, cli.cookie).await?)?;
            cmd_login(&client, &provider, port).await
        }
        Commands::Logout { remote } => {
            let client = StorefrontClient::from_config(&config, open_tokens(cli.db, cli.cookie).await?)?;
            cmd_logout(&client, remote).await
        }
        Commands::Get { path } => {
            let client = StorefrontClient::from_config(&config, open_tokens(cli.db, cli.cookie).await?)?;
            let body = client.api().get(&path).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if config.log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn cmd_inspect(token: &str) -> Result<()> {
    let claims = inspector::decode_payload(token).context("not a decodable token")?;
    println!("{}", serde_json::to_string_pretty(claims.as_map())?);
    println!("valid: {}", inspector::is_valid(token));
    println!("roles: {}", claims.roles().join(", "));
    Ok(())
}

async fn cmd_status(store: &TokenStore) -> Result<()> {
    let guard = AccessGuard::new(store.clone());
    let access = match store.get_access_token().await {
        None => "absent",
        Some(_) if guard.is_authenticated().await => "valid",
        Some(_) => "expired or malformed",
    };
    let refresh = if store.get_refresh_token().await.is_some() {
        "present"
    } else {
        "absent"
    };
    println!("access token: {access}");
    println!("refresh token: {refresh}");
    let roles = guard.current_roles().await;
    if !roles.is_empty() {
        println!("roles: {}", roles.join(", "));
    }
    Ok(())
}

async fn cmd_login(client: &StorefrontClient, provider: &str, port: u16) -> Result<()> {
    let listener = storefront_auth::bind_callback(port).await?;
    let callback_url = format!("http://127.0.0.1:{port}/");
    let url = client.api().authorize_url(provider, &callback_url).await?;
    eprintln!("Open this URL to sign in:\n\n  {url}\n");

    let callback = storefront_auth::accept_callback(listener).await?;
    match callback.handle(client.store()).await {
        CallbackOutcome::SignedIn {
            access_set,
            refresh_set,
            ..
        } => {
            eprintln!("{provider} sign-in complete (access stored: {access_set}, refresh stored: {refresh_set})");
            Ok(())
        }
        CallbackOutcome::Failed { reason } => anyhow::bail!("sign-in failed: {reason}"),
        CallbackOutcome::NotACallback => anyhow::bail!("redirect carried no sign-in parameters"),
    }
}

async fn cmd_logout(client: &StorefrontClient, remote: bool) -> Result<()> {
    match client.logout(remote).await {
        Some(Ok(result)) => eprintln!("{}", result.display_message()),
        Some(Err(e)) => eprintln!("remote sign-out failed: {e}"),
        None => {}
    }
    eprintln!("tokens cleared");
    Ok(())
}

async fn open_tokens(db: Option<PathBuf>, cookie: Option<String>) -> Result<TokenStore> {
    let path = db.unwrap_or_else(default_db_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let url = format!("sqlite://{}", path.display());
    let kv = SqliteKeyValueStore::new(&url)
        .await
        .map_err(|e| anyhow::anyhow!("database error: {e}"))?;
    let store = TokenStore::new(Arc::new(kv));
    Ok(match cookie {
        Some(header) => store.with_cookies(Arc::new(CookieJar::parse(&header))),
        None => store,
    })
}

fn default_db_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".storefront").join("credentials.db")
}
