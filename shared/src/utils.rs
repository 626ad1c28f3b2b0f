use futures_util::TryStreamExt;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::io::StreamReader;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("watch request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("watch request rejected: HTTP {0}")]
    Status(StatusCode),
    #[error("watch stream broke: {0}")]
    Io(#[from] std::io::Error),
}

/// Follows a newline-delimited JSON watch endpoint, handing every decoded
/// event to `handle_event`. Lines that do not decode are logged and skipped.
///
/// Returns `Ok(())` when the server closes the stream.
pub async fn watch_stream<T, F>(client: &Client, url: &str, mut handle_event: F) -> Result<(), WatchError>
where
    T: DeserializeOwned,
    F: FnMut(T) + Send + 'static,
{
    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(WatchError::Status(resp.status()));
    }

    let byte_stream = resp.bytes_stream().map_err(std::io::Error::other);
    let mut lines = BufReader::new(StreamReader::new(byte_stream)).lines();
    tracing::debug!(%url, "Started watching stream");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(&line) {
            Ok(event) => handle_event(event),
            Err(err) => tracing::warn!(%line, error=%err, "Failed to deserialize watch event"),
        }
    }

    tracing::warn!(%url, "Watch stream ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::api::{EventType, NodeEvent};
    use crate::models::Node;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_watch_stream_skips_garbage_lines() {
        let server = MockServer::start().await;
        let event = NodeEvent {
            event_type: EventType::Added,
            node: Node::default(),
        };
        let body = format!("{}\nnot json\n\n", serde_json::to_string(&event).unwrap());
        Mock::given(method("GET"))
            .and(path("/nodes"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let url = format!("{}/nodes", server.uri());
        watch_stream::<NodeEvent, _>(&Client::new(), &url, move |event| {
            sink.lock().unwrap().push(event.node.name);
        })
        .await
        .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![event.node.name]);
    }

    #[tokio::test]
    async fn test_watch_stream_reports_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let url = format!("{}/pods?watch=true", server.uri());
        let res = watch_stream::<NodeEvent, _>(&Client::new(), &url, |_| {}).await;
        assert!(matches!(res, Err(WatchError::Status(code)) if code.as_u16() == 503));
    }
}
