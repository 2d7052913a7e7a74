//! HTTP implementation of the remote store adapter.
//!
//! Talks to a document-store REST API: `GET /ledgers/{id}` fetches the
//! per-identity document, `PATCH` writes with merge semantics, `PUT`
//! replaces. The subscription is a polling task that re-fetches the document
//! and emits a snapshot whenever it changes; poll failures surface as
//! [`SnapshotEvent::Error`] without tearing the stream down.

use crate::remote::{RemoteError, RemoteStore, SnapshotEvent, Subscription};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tally_engine::LedgerDocument;
use tokio::sync::mpsc;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Remote store backed by an HTTP document API.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
}

impl HttpRemoteStore {
    /// Create a client for the given API base URL (e.g.
    /// `https://api.tally.app`).
    pub fn new(base_url: &str, poll_interval: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|err| RemoteError::Request(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            poll_interval,
        })
    }

    fn document_url(&self, identity_id: &str) -> String {
        format!("{}/ledgers/{}", self.base_url, identity_id)
    }
}

/// Map an HTTP failure status (plus response body) onto the adapter error
/// taxonomy. Quota exhaustion is the one terminal class.
fn classify_status(status: StatusCode, body: &str) -> RemoteError {
    if status == StatusCode::TOO_MANY_REQUESTS || body.contains("resource-exhausted") {
        return RemoteError::ResourceExhausted(format!("{status}: {body}"));
    }
    if status == StatusCode::REQUEST_TIMEOUT || status.is_server_error() {
        return RemoteError::Unavailable(format!("{status}: {body}"));
    }
    RemoteError::Request(format!("{status}: {body}"))
}

/// Map a transport-level failure. Timeouts and connect failures are the
/// retryable kind.
fn classify_transport(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() || err.is_connect() {
        RemoteError::Unavailable(err.to_string())
    } else {
        RemoteError::Request(err.to_string())
    }
}

async fn fetch_document(
    client: &reqwest::Client,
    url: &str,
) -> Result<Option<LedgerDocument>, RemoteError> {
    let response = client.get(url).send().await.map_err(classify_transport)?;
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(classify_status(status, &body));
    }

    let document = response
        .json::<LedgerDocument>()
        .await
        .map_err(|err| RemoteError::Request(format!("failed to parse document: {err}")))?;
    Ok(Some(document))
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn get_document(
        &self,
        identity_id: &str,
    ) -> Result<Option<LedgerDocument>, RemoteError> {
        fetch_document(&self.client, &self.document_url(identity_id)).await
    }

    async fn set_document(
        &self,
        identity_id: &str,
        document: &LedgerDocument,
        merge: bool,
    ) -> Result<(), RemoteError> {
        let url = self.document_url(identity_id);
        let request = if merge {
            self.client.patch(&url)
        } else {
            self.client.put(&url)
        };

        let response = request
            .json(document)
            .send()
            .await
            .map_err(classify_transport)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        tracing::debug!(identity = identity_id, merge, "document written");
        Ok(())
    }

    fn subscribe(&self, identity_id: &str) -> Subscription {
        let (sender, events) = mpsc::unbounded_channel();
        let client = self.client.clone();
        let url = self.document_url(identity_id);
        let poll_interval = self.poll_interval;

        let task = tokio::spawn(async move {
            let mut last: Option<Option<LedgerDocument>> = None;

            loop {
                match fetch_document(&client, &url).await {
                    Ok(current) => {
                        if last.as_ref() != Some(&current) {
                            let event = match &current {
                                Some(doc) => SnapshotEvent::Document(doc.clone()),
                                None => SnapshotEvent::Missing,
                            };
                            if sender.send(event).is_err() {
                                break;
                            }
                            last = Some(current);
                        }
                    }
                    Err(err) => {
                        // Surface the failure and keep polling.
                        if sender.send(SnapshotEvent::Error(err.to_string())).is_err() {
                            break;
                        }
                    }
                }

                tokio::time::sleep(poll_interval).await;
            }
        });

        Subscription::new(events, move || task.abort())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_url_joins_cleanly() {
        let store = HttpRemoteStore::new("https://api.tally.app/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            store.document_url("uid-1"),
            "https://api.tally.app/ledgers/uid-1"
        );
    }

    #[test]
    fn quota_status_is_terminal() {
        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(err.is_terminal());
    }

    #[test]
    fn quota_code_in_body_is_terminal() {
        let err = classify_status(
            StatusCode::BAD_REQUEST,
            r#"{"code":"resource-exhausted","message":"quota exceeded"}"#,
        );
        assert!(err.is_terminal());
    }

    #[test]
    fn server_errors_are_transient() {
        let err = classify_status(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(err, RemoteError::Unavailable(_)));
        assert!(!err.is_terminal());

        let err = classify_status(StatusCode::REQUEST_TIMEOUT, "");
        assert!(matches!(err, RemoteError::Unavailable(_)));
    }

    #[test]
    fn client_errors_are_plain_request_failures() {
        let err = classify_status(StatusCode::FORBIDDEN, "no");
        assert!(matches!(err, RemoteError::Request(_)));
        assert!(!err.is_terminal());
    }
}
