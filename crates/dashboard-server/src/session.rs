use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use maven_core::ChatTurn;
use session_watchlist::Watchlist;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::AppState;

pub const SESSION_HEADER: &str = "x-session-id";

/// Upper bound on the time between idle-session sweeps
const SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// Everything one browser session owns. Nothing here is shared between sessions.
#[derive(Debug)]
pub struct SessionContext {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub watchlist: Watchlist,
    pub chat_history: Vec<ChatTurn>,
}

impl SessionContext {
    fn new(id: String) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            watchlist: Watchlist::new(),
            chat_history: Vec::new(),
        }
    }
}

/// Request extension handed to every handler
#[derive(Clone, Debug)]
pub struct Session {
    pub id: String,
    pub context: Arc<Mutex<SessionContext>>,
}

struct SessionSlot {
    context: Arc<Mutex<SessionContext>>,
    last_seen: Instant,
}

#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, SessionSlot>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `requested`, or open a fresh session when it is absent or unknown.
    /// A known session is marked as seen.
    pub fn resolve(&self, requested: Option<&str>) -> Session {
        if let Some(id) = requested {
            if let Some(mut slot) = self.sessions.get_mut(id) {
                slot.last_seen = Instant::now();
                return Session {
                    id: id.to_string(),
                    context: slot.context.clone(),
                };
            }
            tracing::debug!("Unknown session {}, starting a new one", id);
        }

        let id = Uuid::new_v4().to_string();
        let context = Arc::new(Mutex::new(SessionContext::new(id.clone())));
        self.sessions.insert(
            id.clone(),
            SessionSlot {
                context: context.clone(),
                last_seen: Instant::now(),
            },
        );
        tracing::info!("Session {} started", id);
        Session { id, context }
    }

    /// Drop sessions not seen for `max_idle`. Returns how many were dropped.
    ///
    /// A session still held by an in-flight request is kept regardless of age.
    pub fn cleanup(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.sessions.retain(|id, slot| {
            if Arc::strong_count(&slot.context) > 1 {
                return true;
            }
            let keep = now.duration_since(slot.last_seen) < max_idle;
            if !keep {
                tracing::info!("Session {} expired", id);
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn end(&self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            tracing::info!("Session {} ended", id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Run `cleanup` on a timer for as long as the server is up.
pub fn spawn_sweeper(sessions: Arc<SessionStore>, max_idle: Duration) -> JoinHandle<()> {
    let period = max_idle.clamp(Duration::from_secs(1), SWEEP_PERIOD);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let removed = sessions.cleanup(max_idle);
            if removed > 0 {
                tracing::info!("Expired {} idle sessions, {} active", removed, sessions.len());
            }
        }
    })
}

/// Attach the caller's session to the request, creating one if needed.
///
/// - Reads `x-session-id`; a missing or unknown id gets a new UUID v4 session
/// - Inserts `Session` into request extensions for handler access
/// - Echoes the id on the response so the client can send it back
pub async fn session_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let requested = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let session = state.sessions.resolve(requested);
    let id = session.id.clone();

    tracing::Span::current().record("session_id", id.as_str());
    request.extensions_mut().insert(session);

    let mut response = next.run(request).await;
    if let Ok(val) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(SESSION_HEADER, val);
    }

    response
}
