//! HTTP transport
//!
//! Every path is a delivery: the request path goes to the dispatcher and the
//! body is streamed into it without buffering.

use std::io;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::Router;
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tracing::{error, instrument, warn};

use dispatcher::{DispatchOutcome, Dispatcher, DispatcherError};
use ingestion::JsonRecordDecoder;
use staging::MemoryStore;

/// Dispatcher shared by every request
pub type SharedDispatcher = Arc<Dispatcher<MemoryStore, MemoryStore, JsonRecordDecoder>>;

/// Router sending every method and path to the delivery handler
pub fn router(dispatcher: SharedDispatcher) -> Router {
    Router::new()
        .fallback(handle_delivery)
        .with_state(dispatcher)
}

#[instrument(name = "http_delivery", skip(dispatcher, body), fields(path = %uri.path()))]
async fn handle_delivery(
    State(dispatcher): State<SharedDispatcher>,
    uri: Uri,
    body: Body,
) -> (StatusCode, String) {
    let stream = body.into_data_stream().map_err(io::Error::other);
    let reader = StreamReader::new(stream);

    // Query strings are not part of either grammar
    let result = dispatcher.dispatch(uri.path(), reader).await;
    into_response(result)
}

/// Map a dispatch result onto a status code and plain-text body
pub fn into_response(result: Result<DispatchOutcome, DispatcherError>) -> (StatusCode, String) {
    match result {
        Ok(DispatchOutcome::Batch { report, .. }) if report.is_clean() => {
            (StatusCode::OK, String::new())
        }
        Ok(DispatchOutcome::Batch { topic, report }) => {
            warn!(
                topic = %topic,
                written = report.written,
                failed = report.failed(),
                "Batch staged with failures"
            );
            let mut body: String = report
                .failures
                .iter()
                .map(|f| format!("line {}: {}\n", f.line, f.error))
                .collect();
            if let Some(e) = &report.read_error {
                body.push_str(&format!("body read error: {e}\n"));
            }
            (StatusCode::BAD_REQUEST, body)
        }
        Ok(DispatchOutcome::Resolved(outcome)) => {
            (StatusCode::OK, format!("applied {}\n", outcome.applied))
        }
        Err(e) => {
            error!(error = %e, "Delivery rejected");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{e}\n"))
        }
    }
}
