//! Web form portal
//!
//! Serves a single page with masked credential fields, a prompt box, the
//! available tools, and static help tabs. Each browser session gets its
//! own gate state, credentials and agent cache.

use axum::extract::{Form, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use zaprelay_agent::{relay_prompt, should_relay, AgentFactory, PromptRunner, RelayFailure};
use zaprelay_config::PortalConfig;
use zaprelay_session::{PasswordGate, SessionHandle, SessionLimits, SessionManager};

pub mod page;

pub use page::PageView;

/// Cookie carrying the session id
pub const SESSION_COOKIE: &str = "zaprelay_session";

/// Portal errors
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PortalError>;

type Session = SessionHandle<dyn PromptRunner>;

/// Shared state behind every handler
pub struct AppState {
    sessions: Mutex<SessionManager<dyn PromptRunner>>,
    factory: Arc<dyn AgentFactory>,
    gate: PasswordGate,
}

impl AppState {
    pub fn new(factory: Arc<dyn AgentFactory>, gate: PasswordGate) -> Self {
        Self::with_limits(factory, gate, SessionLimits::default())
    }

    pub fn with_limits(
        factory: Arc<dyn AgentFactory>,
        gate: PasswordGate,
        limits: SessionLimits,
    ) -> Self {
        Self {
            sessions: Mutex::new(SessionManager::with_limits(limits)),
            factory,
            gate,
        }
    }

    async fn session_for(&self, headers: &HeaderMap) -> (String, Session, bool) {
        let id = session_cookie(headers);
        self.sessions.lock().await.get_or_create(id.as_deref())
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PromptForm {
    #[serde(default)]
    pub llm_key: String,
    #[serde(default)]
    pub toolkit_key: String,
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UnlockForm {
    #[serde(default)]
    pub password: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(show_page).post(submit_prompt))
        .route("/unlock", post(unlock))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process stops
pub async fn serve(config: &PortalConfig, factory: Arc<dyn AgentFactory>) -> Result<()> {
    let gate = PasswordGate::new(config.gate_password());
    if gate.is_enabled() {
        info!("Password gate enabled");
    }
    let limits = SessionLimits::new(config.session_idle_minutes, config.max_sessions);
    let state = Arc::new(AppState::with_limits(factory, gate, limits));

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("Portal listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Session id from the request's cookies
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn with_session_cookie(mut response: Response, id: &str, created: bool) -> Response {
    if created {
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Strict", SESSION_COOKIE, id);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
            Err(e) => warn!("Could not set session cookie: {}", e),
        }
    }
    response
}

fn render(view: &PageView, status: StatusCode, id: &str, created: bool) -> Response {
    with_session_cookie((status, Html(page::render(view))).into_response(), id, created)
}

async fn health() -> &'static str {
    "ok"
}

async fn show_page(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (id, session, created) = state.session_for(&headers).await;
    let session = session.lock().await;

    let mut view = PageView {
        gate_locked: !state.gate.admits(&session.gate),
        ..Default::default()
    };
    if !view.gate_locked {
        if let Some(credentials) = session.credentials() {
            view.has_credentials = true;
            if let Some(agent) = session.agents.get(credentials) {
                view.tools = agent.tools();
            }
        }
    }

    render(&view, StatusCode::OK, &id, created)
}

async fn submit_prompt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<PromptForm>,
) -> Response {
    let (id, session, created) = state.session_for(&headers).await;
    let mut view = PageView {
        prompt: form.prompt.clone(),
        ..Default::default()
    };

    let agent = {
        let mut session = session.lock().await;
        session.touch();

        if !state.gate.admits(&session.gate) {
            view.gate_locked = true;
            return render(&view, StatusCode::UNAUTHORIZED, &id, created);
        }

        // Blank key fields keep the pair already stored for this session
        let keys_blank = form.llm_key.is_empty() && form.toolkit_key.is_empty();
        if !keys_blank || session.credentials().is_none() {
            session.set_credentials(&form.llm_key, &form.toolkit_key);
        }
        let Some(credentials) = session.credentials().cloned() else {
            debug!("Submission without both keys");
            return render(&view, StatusCode::OK, &id, created);
        };
        view.has_credentials = true;

        let factory = state.factory.clone();
        let built = session
            .agents
            .get_or_try_build(&credentials, |credentials| async move {
                factory.build(&credentials).await
            })
            .await;
        match built {
            Ok(agent) => agent,
            Err(e) => {
                warn!("Agent build failed: {}", e);
                view.failure = Some(RelayFailure::from(&e).user_message());
                return render(&view, StatusCode::OK, &id, created);
            }
        }
    };

    view.tools = agent.tools();
    if should_relay(&form.prompt) {
        let reply = relay_prompt(agent.as_ref(), &form.prompt).await;
        view.transcript = Some(reply.transcript);
        if let Err(failure) = reply.result {
            view.failure = Some(failure.user_message());
        }
    }

    render(&view, StatusCode::OK, &id, created)
}

async fn unlock(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<UnlockForm>,
) -> Response {
    let (id, session, created) = state.session_for(&headers).await;
    let mut session = session.lock().await;

    match state.gate.submit(&mut session.gate, form.password) {
        Ok(()) => with_session_cookie(Redirect::to("/").into_response(), &id, created),
        Err(e) => {
            let view = PageView {
                gate_locked: true,
                gate_error: Some(e.to_string()),
                ..Default::default()
            };
            render(&view, StatusCode::UNAUTHORIZED, &id, created)
        }
    }
}
