//! Live notification stream (Server-Sent Events)

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;

use crate::AppState;

pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.events.subscribe();

    let stream = BroadcastStream::new(receiver).filter_map(|message| async move {
        match message {
            Ok(notification) => match Event::default().event(notification.name()).json_data(&notification) {
                Ok(event) => Some(Ok(event)),
                Err(e) => {
                    tracing::warn!("Failed to encode notification: {}", e);
                    None
                }
            },
            Err(lagged) => {
                tracing::warn!("Event subscriber fell behind: {}", lagged);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
