//! Sprig Track
//!
//! A parcel-tracking console built on the Sprig component runtime:
//!
//! - [`login::TrackLogin`]: the login form and its [`login::LoginHandler`]
//!   flow (validation, backend call, store and bus publication)
//! - [`dashboard::TrackDashboard`]: order summary, delivery timeline and order
//!   table, fed from the page's query string
//! - [`config::TrackConfig`]: TOML configuration for styles, API and rendering

pub mod config;
pub mod dashboard;
pub mod error;
pub mod login;
pub mod markup;
pub mod order;

pub use config::TrackConfig;
pub use dashboard::TrackDashboard;
pub use error::{Result, TrackError};
pub use login::{LoginClient, LoginHandler, LoginOutcome, LoginRequest, LoginResponse, TrackLogin};
#[cfg(feature = "network")]
pub use login::HttpLoginClient;
pub use order::{dashboard_url, parse_order_query, OrderStatus};

use sprig_core::{BaseElement, ElementRegistry, Lifecycle, Mountable, RenderConfig};

/// Define `<track-login>` and `<track-dashboard>` on `registry`
///
/// Instances request the stylesheets named in `config`; the dashboard reads
/// its order from `query`.
pub fn define_elements(registry: &mut ElementRegistry, config: &TrackConfig, query: &str) -> Result<()> {
    let login_styles = config.styles.login.clone();
    registry.define(login::TAG, move |render: &RenderConfig| -> Box<dyn Mountable> {
        Box::new(Lifecycle::with_config(
            BaseElement::new(),
            TrackLogin::new().with_styles(login_styles.clone()),
            render.clone(),
        ))
    })?;

    let dashboard_styles = config.styles.dashboard.clone();
    let query = query.to_string();
    registry.define(dashboard::TAG, move |render: &RenderConfig| -> Box<dyn Mountable> {
        Box::new(Lifecycle::with_config(
            BaseElement::new(),
            TrackDashboard::new(query.clone()).with_styles(dashboard_styles.clone()),
            render.clone(),
        ))
    })?;
    Ok(())
}
