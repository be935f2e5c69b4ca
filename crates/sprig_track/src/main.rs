//! Sprig Track CLI
//!
//! Render the tracking console's components as declarative shadow-root
//! markup, or run a login against the configured backend.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use sprig_core::{load_requested_styles, ElementRegistry, Mountable};
use sprig_style::StyleLoader;
use sprig_track::{dashboard, define_elements, login, TrackConfig};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sprig-track")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Parcel-tracking console built on Sprig components", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file
    #[arg(short, long, global = true, default_value = "sprig-track.toml")]
    config: PathBuf,

    /// Skip stylesheet loading
    #[arg(long, global = true)]
    no_styles: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the order dashboard
    Dashboard {
        /// Page query string carrying `order` or `orders`
        #[arg(short, long, default_value = "")]
        query: String,
    },

    /// Render the login form, or log in when credentials are given
    Login {
        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long)]
        password: Option<String>,

        /// Tracking ID of the order to open
        #[arg(short, long)]
        track_id: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = TrackConfig::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    let loader = if cli.no_styles {
        None
    } else {
        Some(config.style_loader()?)
    };

    match cli.command {
        Commands::Dashboard { query } => cmd_render(&config, loader.as_ref(), dashboard::TAG, &query).await,

        Commands::Login {
            username: Some(username),
            password,
            track_id,
        } => {
            let request = login::LoginRequest::new(
                &username,
                password.as_deref().unwrap_or_default(),
                track_id.as_deref().unwrap_or_default(),
            );
            cmd_login(&config, request).await
        }

        Commands::Login { username: None, .. } => cmd_render(&config, loader.as_ref(), login::TAG, "").await,
    }
}

/// Create, mount and style one element, then print its markup
async fn cmd_render(config: &TrackConfig, loader: Option<&StyleLoader>, tag: &str, query: &str) -> Result<()> {
    let mut registry = ElementRegistry::with_config(config.render.clone());
    define_elements(&mut registry, config, query)?;

    let mut element = registry.create(tag)?;
    element.mount()?;
    apply_styles(element.as_mut(), loader).await;

    info!(
        tag,
        renders = element.stats().renders,
        styled = element.root().adopted_stylesheet().is_some(),
        "rendered"
    );
    println!("<{tag}>\n{}\n</{tag}>", element.root().to_template());
    Ok(())
}

/// Load requested styles; a failed load leaves the element unstyled
async fn apply_styles(element: &mut dyn Mountable, loader: Option<&StyleLoader>) {
    let Some(loader) = loader else {
        element.take_style_requests();
        return;
    };
    if let Err(e) = load_requested_styles(element, loader).await {
        warn!(error = %e, "Rendering without styles");
    }
}

#[cfg(feature = "network")]
async fn cmd_login(config: &TrackConfig, request: login::LoginRequest) -> Result<()> {
    use sprig_core::{BaseElement, Lifecycle};

    let mut form = Lifecycle::with_config(BaseElement::new(), login::TrackLogin::new(), config.render.clone());
    form.mount()?;

    let handler = login::LoginHandler::new(login::HttpLoginClient::new(config.api.login_url.clone()));
    match handler.submit(&mut form, request).await? {
        login::LoginOutcome::Redirect(url) => {
            println!("{url}");
            Ok(())
        }
        login::LoginOutcome::Rejected(message) => anyhow::bail!("Login rejected: {message}"),
    }
}

#[cfg(not(feature = "network"))]
async fn cmd_login(_config: &TrackConfig, _request: login::LoginRequest) -> Result<()> {
    anyhow::bail!("sprig-track was built without the `network` feature")
}
