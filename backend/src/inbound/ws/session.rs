//! Per-connection history feed.
//!
//! Each connection owns a [`HistoryHandle`] watching the session identity.
//! Snapshots are forwarded as text frames; the first feed failure is sent as
//! an error frame and the connection closes. The server pings every 5s and
//! drops clients silent for 10s (shorter in tests).

use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, warn};

use crate::domain::{HistoryHandle, HistorySynchronizer, Identity};
use crate::inbound::ws::messages::HistoryMessage;

#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

/// A live subscription plus the frames it produces.
pub(super) struct HistoryFeed {
    handle: HistoryHandle,
    frames: mpsc::UnboundedReceiver<HistoryMessage>,
}

impl HistoryFeed {
    /// Start watching `identity`. Must run inside the tokio runtime.
    pub(super) fn open(synchronizer: &HistorySynchronizer, identity: &Identity) -> Self {
        let (snapshots, frames) = mpsc::unbounded_channel();
        let failures = snapshots.clone();
        let handle = synchronizer.watch(
            Some(identity),
            move |records| {
                let _ = snapshots.send(HistoryMessage::snapshot(records));
            },
            move |error| {
                let _ = failures.send(HistoryMessage::from(error));
            },
        );
        Self { handle, frames }
    }
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    FeedFailed,
    Network(Closed),
}

pub(super) async fn run_history_session(
    feed: HistoryFeed,
    mut session: Session,
    mut stream: MessageStream,
) {
    let HistoryFeed { handle, mut frames } = feed;
    let mut last_heartbeat = Instant::now();
    let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

    let error = loop {
        let result = tokio::select! {
            _ = heartbeat.tick() => handle_heartbeat_tick(&mut session, last_heartbeat).await,
            message = stream.recv() => {
                handle_stream_message(&mut session, &mut last_heartbeat, message).await
            }
            Some(frame) = frames.recv() => push_frame(&mut session, &frame).await,
        };
        if let Err(error) = result {
            break error;
        }
    };

    handle.cancel();
    log_shutdown_reason(&error);
    if let Some(reason) = close_reason_for(error) {
        if let Err(error) = session.close(reason).await {
            warn!(error = %error, "failed to close history feed connection");
        }
    }
}

async fn handle_heartbeat_tick(
    session: &mut Session,
    last_heartbeat: Instant,
) -> Result<(), SessionError> {
    if last_heartbeat.elapsed() > CLIENT_TIMEOUT {
        return Err(SessionError::HeartbeatTimeout);
    }
    session.ping(b"").await.map_err(SessionError::Network)
}

async fn handle_stream_message(
    session: &mut Session,
    last_heartbeat: &mut Instant,
    message: Option<Result<Message, ProtocolError>>,
) -> Result<(), SessionError> {
    let message = match message {
        Some(Ok(message)) => message,
        Some(Err(error)) => return Err(SessionError::Protocol(error)),
        None => return Err(SessionError::StreamClosed),
    };

    match message {
        Message::Ping(payload) => {
            *last_heartbeat = Instant::now();
            session.pong(&payload).await.map_err(SessionError::Network)
        }
        Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        Message::Text(_) | Message::Binary(_) => {
            // The feed is push-only.
            *last_heartbeat = Instant::now();
            debug!("ignoring client payload on history feed");
            Ok(())
        }
        Message::Pong(_) | Message::Continuation(_) | Message::Nop => {
            *last_heartbeat = Instant::now();
            Ok(())
        }
    }
}

async fn push_frame(session: &mut Session, frame: &HistoryMessage) -> Result<(), SessionError> {
    match serde_json::to_string(frame) {
        Ok(body) => session.text(body).await.map_err(SessionError::Network)?,
        Err(error) => warn!(error = %error, "failed to serialise history frame"),
    }
    if matches!(frame, HistoryMessage::Error { .. }) {
        return Err(SessionError::FeedFailed);
    }
    Ok(())
}

fn log_shutdown_reason(error: &SessionError) {
    match error {
        SessionError::HeartbeatTimeout => warn!("history feed heartbeat timeout"),
        SessionError::Protocol(error) => warn!(error = %error, "history feed protocol error"),
        SessionError::Network(error) => warn!(error = %error, "history feed send failed"),
        SessionError::FeedFailed => warn!("history feed failed; closing connection"),
        SessionError::ClientClosed(_) | SessionError::StreamClosed => {
            debug!("history feed client disconnected");
        }
    }
}

fn close_reason_for(error: SessionError) -> Option<Option<CloseReason>> {
    let reason = |code, description: &str| {
        Some(CloseReason {
            code,
            description: Some(description.to_owned()),
        })
    };
    match error {
        SessionError::HeartbeatTimeout => Some(reason(CloseCode::Normal, "heartbeat timeout")),
        SessionError::Protocol(_) => Some(reason(CloseCode::Protocol, "protocol error")),
        SessionError::FeedFailed => Some(reason(CloseCode::Error, "history feed failed")),
        SessionError::ClientClosed(reason) => Some(reason),
        SessionError::StreamClosed | SessionError::Network(_) => None,
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
