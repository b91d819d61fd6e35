//! Server-Sent Events announcer.
//!
//! Each connection gets the tool catalog once, then a `ping` every
//! interval. The ticker lives inside the response stream, so dropping the
//! stream (client gone, server shutting down) stops it.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue, header},
    response::{
        IntoResponse,
        sse::{Event, Sse},
    },
};
use futures::stream::{Stream, StreamExt};
use serde_json::Value;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::transport::HttpState;

/// One frame on the announcement stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Announcement {
    /// The tool catalog, `{"tools": [...]}`.
    Tools(Value),
    /// Liveness ping with an empty object as data.
    Ping,
}

impl Announcement {
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Tools(_) => "tools",
            Self::Ping => "ping",
        }
    }

    #[must_use]
    pub fn data(&self) -> String {
        match self {
            Self::Tools(catalog) => catalog.to_string(),
            Self::Ping => "{}".to_string(),
        }
    }

    #[must_use]
    pub fn into_event(self) -> Event {
        Event::default().event(self.event_name()).data(self.data())
    }
}

/// Counts open SSE streams.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
}

impl ConnectionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection; the count drops again when the guard does.
    #[must_use]
    pub fn open(&self) -> ConnectionGuard {
        let id = uuid::Uuid::new_v4();
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(connection = %id, active, "SSE connection opened");
        ConnectionGuard { id, active: Arc::clone(&self.active) }
    }

    #[must_use]
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Keeps one connection counted while alive.
#[derive(Debug)]
pub struct ConnectionGuard {
    id: uuid::Uuid,
    active: Arc<AtomicUsize>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let active = self.active.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        tracing::info!(connection = %self.id, active, "SSE connection closed");
    }
}

/// The announcement sequence for one connection: the catalog, then a ping
/// every `period`.
pub fn announcements(
    catalog: Value,
    period: Duration,
    guard: ConnectionGuard,
) -> impl Stream<Item = Announcement> {
    async_stream::stream! {
        let _guard = guard;

        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        yield Announcement::Tools(catalog);

        loop {
            ticker.tick().await;
            yield Announcement::Ping;
        }
    }
}

/// `GET|POST /sse` — open an announcement stream.
///
/// Request bodies are ignored.
pub async fn handle_sse(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let stream = announcements(state.tools.catalog(), state.ping_interval, state.sse.open())
        .map(|announcement| Ok::<_, Infallible>(announcement.into_event()));

    (
        [
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (header::CONNECTION, HeaderValue::from_static("keep-alive")),
            (HeaderName::from_static("x-accel-buffering"), HeaderValue::from_static("no")),
        ],
        Sse::new(stream),
    )
}
