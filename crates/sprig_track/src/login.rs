//! Login component (`<track-login>`) and the login flow
//!
//! Only `loading` and `error` are reactive, so typing into the form never
//! re-renders it. Submitting validates locally, asks a [`LoginClient`], and
//! on success publishes the user and order to the track store and the event
//! bus before handing back the dashboard URL.

use std::fmt::Write as _;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sprig_core::bus::{event_bus, EventBus};
use sprig_core::{create_store, Component, Context, Element, HookResult, Lifecycle, Rendered, Store};
use tracing::{debug, info, warn};

use crate::error::{Result, TrackError};
use crate::markup::{self, escape};
use crate::order::dashboard_url;

pub const TAG: &str = "track-login";

/// Bus event emitted after a successful login
pub const LOGIN_EVENT: &str = "track:login";

pub const EMPTY_CREDENTIALS: &str = "Username or password cannot be empty";
pub const EMPTY_TRACK_ID: &str = "Tracking ID cannot be empty";
pub const LOGIN_FAILED: &str = "Login failed, please check your details";
pub const NETWORK_ERROR: &str = "Network error, please try again later";

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Body posted to the login endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub track_id: String,
}

impl LoginRequest {
    /// Build a request from form input, trimming every field
    pub fn new(username: &str, password: &str, track_id: &str) -> Self {
        Self {
            username: username.trim().to_string(),
            password: password.trim().to_string(),
            track_id: track_id.trim().to_string(),
        }
    }

    /// Check the fields the backend requires, in the backend's order
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(EMPTY_CREDENTIALS);
        }
        if self.track_id.is_empty() {
            return Err(EMPTY_TRACK_ID);
        }
        Ok(())
    }
}

/// Login endpoint reply
///
/// Every field is optional on the wire; an unreadable body decodes as a
/// failed login without a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub order: Option<Value>,
}

/// Backend that checks credentials and looks up the order
#[async_trait]
pub trait LoginClient: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;
}

/// JSON-over-HTTP login client
#[cfg(feature = "network")]
#[derive(Debug, Clone)]
pub struct HttpLoginClient {
    client: reqwest::Client,
    endpoint: String,
}

#[cfg(feature = "network")]
impl HttpLoginClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(feature = "network")]
#[async_trait]
impl LoginClient for HttpLoginClient {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        debug!(endpoint = %self.endpoint, username = %request.username, "posting login");
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| TrackError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TrackError::Network(e.to_string()))?;

        let mut reply: LoginResponse = serde_json::from_str(&body).unwrap_or_default();
        if !status.is_success() {
            debug!(status = status.as_u16(), msg = ?reply.msg, "login rejected");
            reply.success = false;
        }
        Ok(reply)
    }
}

// =============================================================================
// TRACK STORE
// =============================================================================

static TRACK_STORE: LazyLock<Store> =
    LazyLock::new(|| create_store([("user", Value::Null), ("order", Value::Null)]));

/// Process-wide store holding the logged-in `user` and their `order`
pub fn track_store() -> Store {
    TRACK_STORE.clone()
}

// =============================================================================
// COMPONENT
// =============================================================================

/// Login form consumer
#[derive(Debug, Clone, Default)]
pub struct TrackLogin {
    styles: Option<String>,
}

impl TrackLogin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stylesheet to request on connect
    pub fn with_styles(mut self, locator: impl Into<String>) -> Self {
        self.styles = Some(locator.into());
        self
    }

    fn left_panel(out: &mut String) {
        let _ = write!(
            out,
            r#"<div class="left-panel">
  <div>
    <div class="brand">
      <div class="brand-logo">📦</div>
      <div><div class="brand-text-title">{title}</div><div class="brand-text-sub">{sub}</div></div>
    </div>
    <div class="hero-title">Track every parcel in one place</div>
    <div class="hero-desc">Sign in with your tracking ID to follow an order from creation to delivery.</div>
    <div class="timeline">
      <div class="timeline-line"></div>
      <div class="timeline-steps">
"#,
            title = markup::BRAND_TITLE,
            sub = markup::BRAND_SUB,
        );
        for (label, sub) in [
            (markup::TIMELINE_ORDER_CREATED, markup::TIMELINE_ORDER_CREATED_SUB),
            (markup::TIMELINE_IN_TRANSIT, markup::TIMELINE_IN_TRANSIT_SUB),
            (markup::TIMELINE_DELIVERED, markup::TIMELINE_DELIVERED_SUB),
        ] {
            let _ = writeln!(
                out,
                "        <div><div class=\"timeline-step-label\">{label}</div><div class=\"timeline-step-sub\">{sub}</div></div>"
            );
        }
        out.push_str(
            "      </div>\n    </div>\n  </div>\n  <div class=\"foot-note\">For internal use only</div>\n</div>\n",
        );
    }

    fn right_panel(out: &mut String, loading: bool, error: &str) {
        let disabled = if loading { " disabled" } else { "" };
        let button = if loading { "Verifying..." } else { "Log in to Dashboard" };
        let _ = write!(
            out,
            r#"<div class="right-panel">
  <div class="panel-title">Welcome back</div>
  <div class="panel-sub">Enter your account and tracking ID</div>
  <form>
    <label>Username <input name="username" type="text" placeholder="Your username" /></label>
    <label>Password <input name="password" type="password" placeholder="Your password" /></label>
    <label>{track_id} <input name="track_id" type="text" placeholder="e.g. TE-1001" /></label>
    <button class="btn-submit" type="submit"{disabled}>{button}</button>
    <div class="error">{error}</div>
  </form>
</div>
"#,
            track_id = markup::TRACK_ID,
            error = escape(error),
        );
    }
}

impl Component for TrackLogin {
    fn connect(&self, cx: &mut Context<'_, Self>) -> HookResult {
        cx.declare_properties([("loading", json!(false)), ("error", json!(""))]);
        if let Some(locator) = &self.styles {
            cx.apply_styles(locator.clone());
        }
        Ok(())
    }

    fn render(&self, cx: &Context<'_, Self>) -> Rendered {
        let loading: bool = cx.get("loading").unwrap_or_default();
        let error: String = cx.get("error").unwrap_or_default();

        let mut out = String::with_capacity(4096);
        out.push_str("<div class=\"container\">\n");
        Self::left_panel(&mut out);
        Self::right_panel(&mut out, loading, &error);
        out.push_str("</div>");
        out.into()
    }
}

// =============================================================================
// LOGIN FLOW
// =============================================================================

/// Result of a submitted login
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Logged in; navigate to this URL
    Redirect(String),
    /// Shown to the user in the form's error slot
    Rejected(String),
}

/// Drives a submitted login form against a [`LoginClient`]
pub struct LoginHandler<C> {
    client: C,
    store: Store,
    bus: Arc<EventBus>,
}

impl<C: LoginClient> LoginHandler<C> {
    /// Handler publishing to the process-wide track store and event bus
    pub fn new(client: C) -> Self {
        Self {
            client,
            store: track_store(),
            bus: event_bus(),
        }
    }

    pub fn with_store(mut self, store: Store) -> Self {
        self.store = store;
        self
    }

    pub fn with_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = bus;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Submit `request` on behalf of a mounted login form
    ///
    /// `loading` is raised for the duration of the attempt. Rejections and
    /// network failures end up in the form's `error` property.
    pub async fn submit<E: Element + 'static>(
        &self,
        form: &mut Lifecycle<E, TrackLogin>,
        request: LoginRequest,
    ) -> Result<LoginOutcome> {
        form.set_property("loading", true)?;
        form.set_property("error", "")?;

        let outcome = match self.attempt(&request).await {
            Ok(outcome) => outcome,
            Err(TrackError::Network(reason)) => {
                warn!(%reason, "login request failed");
                LoginOutcome::Rejected(NETWORK_ERROR.to_string())
            }
            Err(e) => {
                form.set_property("loading", false)?;
                return Err(e);
            }
        };

        if let LoginOutcome::Rejected(message) = &outcome {
            form.set_property("error", message.as_str())?;
        }
        form.set_property("loading", false)?;
        Ok(outcome)
    }

    async fn attempt(&self, request: &LoginRequest) -> Result<LoginOutcome> {
        if let Err(message) = request.validate() {
            debug!(reason = message, "login rejected locally");
            return Ok(LoginOutcome::Rejected(message.to_string()));
        }

        let response = self.client.login(request).await?;
        if !response.success {
            let message = response.msg.unwrap_or_else(|| LOGIN_FAILED.to_string());
            return Ok(LoginOutcome::Rejected(message));
        }

        let user = response
            .user
            .unwrap_or_else(|| json!({ "name": request.username }));
        let order = response.order.unwrap_or(Value::Null);

        self.store
            .set_state([("user", user.clone()), ("order", order.clone())]);
        self.bus
            .emit(LOGIN_EVENT, json!({ "user": user, "order": order }))?;

        info!(username = %request.username, track_id = %request.track_id, "login succeeded");
        Ok(LoginOutcome::Redirect(dashboard_url(&order)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_core::{BaseElement, Store};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replies with a canned response and counts calls
    struct CannedClient {
        reply: Result<LoginResponse>,
        calls: AtomicUsize,
    }

    impl CannedClient {
        fn ok(reply: LoginResponse) -> Self {
            Self {
                reply: Ok(reply),
                calls: AtomicUsize::new(0),
            }
        }

        fn offline() -> Self {
            Self {
                reply: Err(TrackError::Network("connection refused".into())),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LoginClient for CannedClient {
        async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(TrackError::Network(reason)) => Err(TrackError::Network(reason.clone())),
                Err(other) => Err(TrackError::Network(other.to_string())),
            }
        }
    }

    fn mounted_form() -> Lifecycle<BaseElement, TrackLogin> {
        let mut form = Lifecycle::new(BaseElement::new(), TrackLogin::new());
        form.mount().unwrap();
        form
    }

    fn handler(client: CannedClient) -> LoginHandler<CannedClient> {
        LoginHandler::new(client)
            .with_store(create_store([("user", Value::Null), ("order", Value::Null)]))
            .with_bus(Arc::new(EventBus::new()))
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(LoginRequest::new(" ", "pw", "TE-1").validate(), Err(EMPTY_CREDENTIALS));
        assert_eq!(LoginRequest::new("ada", "", "").validate(), Err(EMPTY_CREDENTIALS));
        assert_eq!(LoginRequest::new("ada", "pw", "  ").validate(), Err(EMPTY_TRACK_ID));
        assert_eq!(LoginRequest::new(" ada ", "pw", "TE-1").username, "ada");
    }

    #[test]
    fn test_initial_render() {
        let form = mounted_form();
        let html = form.root().inner_html();
        assert!(html.contains("Log in to Dashboard"));
        assert!(!html.contains("disabled"));
        assert!(html.contains(r#"<div class="error"></div>"#));
        assert_eq!(form.stats().renders, 1);
    }

    #[tokio::test]
    async fn test_successful_login_publishes_and_redirects() {
        let order = json!({ "orderId": "TE-1001", "status": "delivered" });
        let handler = handler(CannedClient::ok(LoginResponse {
            success: true,
            msg: Some("Login successful".into()),
            user: Some(json!({ "name": "ada" })),
            order: Some(order.clone()),
        }));

        let events = Arc::new(Mutex::new(Vec::new()));
        let seen = events.clone();
        handler.bus.on(LOGIN_EVENT, move |envelope| {
            seen.lock().unwrap().push(envelope.detail.clone());
            Ok(())
        });

        let mut form = mounted_form();
        let outcome = handler
            .submit(&mut form, LoginRequest::new("ada", "secret", "TE-1001"))
            .await
            .unwrap();

        assert_eq!(outcome, LoginOutcome::Redirect(dashboard_url(&order)));
        assert_eq!(handler.store.get("order"), Some(order.clone()));
        assert_eq!(handler.store.get("user"), Some(json!({ "name": "ada" })));
        assert_eq!(
            *events.lock().unwrap(),
            vec![json!({ "user": { "name": "ada" }, "order": order })]
        );

        // loading on, loading off; the empty error write is a no-op
        assert_eq!(form.stats().renders, 3);
        assert_eq!(form.get::<bool>("loading"), Some(false));
    }

    #[tokio::test]
    async fn test_missing_user_defaults_to_username() {
        let handler = handler(CannedClient::ok(LoginResponse {
            success: true,
            order: Some(json!({ "orderId": "TE-2" })),
            ..Default::default()
        }));
        let mut form = mounted_form();
        handler
            .submit(&mut form, LoginRequest::new("grace", "pw", "TE-2"))
            .await
            .unwrap();
        assert_eq!(handler.store.get("user"), Some(json!({ "name": "grace" })));
    }

    #[tokio::test]
    async fn test_rejection_shows_message() {
        let handler = handler(CannedClient::ok(LoginResponse {
            success: false,
            msg: Some("Incorrect username or password".into()),
            ..Default::default()
        }));
        let mut form = mounted_form();
        let outcome = handler
            .submit(&mut form, LoginRequest::new("ada", "wrong", "TE-1"))
            .await
            .unwrap();

        assert_eq!(outcome, LoginOutcome::Rejected("Incorrect username or password".into()));
        assert_eq!(form.get::<String>("error").as_deref(), Some("Incorrect username or password"));
        assert!(form.root().inner_html().contains("Incorrect username or password"));
        assert_eq!(handler.store.get("user"), Some(Value::Null));
    }

    #[tokio::test]
    async fn test_local_validation_skips_client() {
        let handler = handler(CannedClient::ok(LoginResponse::default()));
        let mut form = mounted_form();
        let outcome = handler
            .submit(&mut form, LoginRequest::new("ada", "pw", ""))
            .await
            .unwrap();

        assert_eq!(outcome, LoginOutcome::Rejected(EMPTY_TRACK_ID.into()));
        assert_eq!(handler.client().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_network_failure_is_reported_in_form() {
        let handler = handler(CannedClient::offline());
        let mut form = mounted_form();
        let outcome = handler
            .submit(&mut form, LoginRequest::new("ada", "pw", "TE-1"))
            .await
            .unwrap();

        assert_eq!(outcome, LoginOutcome::Rejected(NETWORK_ERROR.into()));
        assert_eq!(form.get::<bool>("loading"), Some(false));
    }

    #[tokio::test]
    async fn test_failing_listener_propagates() {
        let handler = handler(CannedClient::ok(LoginResponse {
            success: true,
            ..Default::default()
        }));
        handler.bus.on(LOGIN_EVENT, |_| Err("listener down".into()));

        let mut form = mounted_form();
        let err = handler
            .submit(&mut form, LoginRequest::new("ada", "pw", "TE-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, TrackError::Bus(_)));
        assert_eq!(form.get::<bool>("loading"), Some(false));
    }

    #[test]
    fn test_track_store_shape() {
        let store: Store = track_store();
        assert!(store.get_state().contains_key("user"));
        assert!(store.get_state().contains_key("order"));
    }

    #[cfg(feature = "network")]
    mod http {
        use super::*;
        use wiremock::matchers::{body_json, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        #[tokio::test]
        async fn test_http_client_success() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/api/login"))
                .and(body_json(json!({ "username": "ada", "password": "pw", "track_id": "TE-1" })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "success": true,
                    "msg": "Login successful",
                    "user": { "name": "ada" },
                    "order": { "orderId": "TE-1" }
                })))
                .mount(&server)
                .await;

            let client = HttpLoginClient::new(format!("{}/api/login", server.uri()));
            let reply = client.login(&LoginRequest::new("ada", "pw", "TE-1")).await.unwrap();
            assert!(reply.success);
            assert_eq!(reply.order, Some(json!({ "orderId": "TE-1" })));
        }

        #[tokio::test]
        async fn test_http_client_error_status() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/api/login"))
                .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                    "success": false,
                    "msg": "No order found for Tracking ID TE-9"
                })))
                .mount(&server)
                .await;

            let client = HttpLoginClient::new(format!("{}/api/login", server.uri()));
            let reply = client.login(&LoginRequest::new("ada", "pw", "TE-9")).await.unwrap();
            assert!(!reply.success);
            assert_eq!(reply.msg.as_deref(), Some("No order found for Tracking ID TE-9"));
        }

        #[tokio::test]
        async fn test_http_client_unreadable_body() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
                .mount(&server)
                .await;

            let client = HttpLoginClient::new(format!("{}/api/login", server.uri()));
            let reply = client.login(&LoginRequest::new("ada", "pw", "TE-1")).await.unwrap();
            assert_eq!(reply, LoginResponse::default());
        }
    }
}
