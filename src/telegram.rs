//! Minimal Telegram Bot API client.
//!
//! Only the calls the relay needs are wrapped: long polling for updates,
//! file download, plain replies, document upload and message deletion.

use crate::error::{Error, Result};
use crate::relay::ChatTransport;
use crate::types::Actor;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

pub const API_URL: &str = "https://api.telegram.org";

/// Long polling timeout passed to `getUpdates`.
pub const POLL_TIMEOUT_SECS: u64 = 60;

/// Pause after a failed `getUpdates` call.
pub const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Envelope of every Bot API reply.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<T> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(Error::Telegram(
                self.description
                    .unwrap_or_else(|| "request failed without description".into()),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Document {
    pub file_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub document: Option<Document>,
}

impl Message {
    /// Sender of the message, if the platform disclosed one.
    pub fn sender(&self) -> Option<Actor> {
        self.from
            .as_ref()
            .map(|u| Actor::new(u.username.clone().unwrap_or_default(), u.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

/// Result of `getFile`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct File {
    pub file_id: String,
    pub file_path: Option<String>,
}

/// Source of inbound updates, polled from a given offset.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>>;
}

/// Lazy, unbounded sequence of updates.
pub type UpdateStream = BoxStream<'static, Update>;

/// Turn an [`UpdateSource`] into a stream, one update at a time.
///
/// The offset moves past every update received, so each one is yielded
/// once. Failed polls are logged and retried after `retry_delay`.
pub fn update_stream<S>(source: S, retry_delay: Duration) -> UpdateStream
where
    S: UpdateSource + 'static,
{
    stream::unfold(
        (source, 0i64, VecDeque::new()),
        move |(source, mut offset, mut pending)| async move {
            loop {
                if let Some(update) = pending.pop_front() {
                    return Some((update, (source, offset, pending)));
                }

                match source.get_updates(offset).await {
                    Ok(updates) => {
                        if let Some(last) = updates.last() {
                            offset = last.update_id + 1;
                        }
                        pending.extend(updates);
                    }
                    Err(err) => {
                        warn!(error = %err, offset, "failed to get updates, retrying");
                        tokio::time::sleep(retry_delay).await;
                    }
                }
            }
        },
    )
    .boxed()
}

#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: Client,
    token: String,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, API_URL)
    }

    /// Point the client at another Bot API server.
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Download link for a `file_path` returned by `getFile`.
    pub fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.base_url, self.token, file_path)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: serde_json::Value) -> Result<T> {
        debug!(method, "bot api call");
        let response: ApiResponse<T> = self
            .http
            .post(self.method_url(method))
            .json(&params)
            .send()
            .await?
            .json()
            .await?;
        response.into_result()
    }

    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", json!({})).await
    }

    pub async fn poll_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({ "offset": offset, "timeout": timeout_secs, "allowed_updates": ["message"] }),
        )
        .await
    }

    pub async fn get_file(&self, file_id: &str) -> Result<File> {
        self.call("getFile", json!({ "file_id": file_id })).await
    }

    /// Resolve and download a file in one go.
    pub async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        let file = self.get_file(file_id).await?;
        let file_path = file
            .file_path
            .ok_or_else(|| Error::Fetch(format!("no download path for file {}", file_id)))?;

        let response = self.http.get(self.file_url(&file_path)).send().await?;
        if response.status() != StatusCode::OK {
            return Err(Error::Fetch(format!(
                "download of {} returned {}",
                file_path,
                response.status()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn send_text(&self, chat_id: i64, text: &str) -> Result<Message> {
        self.call("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await
    }

    pub async fn upload_document(&self, chat_id: i64, path: &Path, caption: &str) -> Result<Message> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "converted.csv".into());

        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("document", Part::bytes(bytes).file_name(name).mime_str("text/csv")?);

        let response: ApiResponse<Message> = self
            .http
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await?
            .json()
            .await?;
        response.into_result()
    }

    pub async fn remove_message(&self, chat_id: i64, message_id: i64) -> Result<bool> {
        self.call(
            "deleteMessage",
            json!({ "chat_id": chat_id, "message_id": message_id }),
        )
        .await
    }
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        self.poll_updates(offset, POLL_TIMEOUT_SECS).await
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn fetch_file(&self, file_id: &str) -> Result<Vec<u8>> {
        self.download(file_id).await.map_err(|e| match e {
            e @ Error::Fetch(_) => e,
            other => Error::Fetch(other.to_string()),
        })
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send_text(chat_id, text)
            .await
            .map(|_| ())
            .map_err(|e| Error::Delivery(e.to_string()))
    }

    async fn send_document(&self, chat_id: i64, path: &Path, caption: &str) -> Result<()> {
        self.upload_document(chat_id, path, caption)
            .await
            .map(|_| ())
            .map_err(|e| Error::Delivery(e.to_string()))
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        self.remove_message(chat_id, message_id)
            .await
            .map(|_| ())
            .map_err(|e| Error::Delivery(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const DOCUMENT_UPDATE: &str = r#"{
        "ok": true,
        "result": [{
            "update_id": 1001,
            "message": {
                "message_id": 55,
                "from": {"id": 42, "is_bot": false, "first_name": "Mario", "username": "mario"},
                "chat": {"id": 42, "type": "private"},
                "date": 1700000000,
                "document": {
                    "file_name": "export.csv",
                    "mime_type": "text/csv",
                    "file_id": "BQACAgQ",
                    "file_unique_id": "AgAD",
                    "file_size": 512
                }
            }
        }]
    }"#;

    #[test]
    fn test_parse_document_update() {
        let response: ApiResponse<Vec<Update>> = serde_json::from_str(DOCUMENT_UPDATE).unwrap();
        let updates = response.into_result().unwrap();
        let message = updates[0].message.as_ref().unwrap();

        assert_eq!(updates[0].update_id, 1001);
        assert_eq!(message.sender(), Some(Actor::new("mario", 42)));
        let document = message.document.as_ref().unwrap();
        assert_eq!(document.mime_type.as_deref(), Some("text/csv"));
        assert_eq!(document.file_name.as_deref(), Some("export.csv"));
    }

    #[test]
    fn test_sender_without_username() {
        let message: Message = serde_json::from_str(
            r#"{"message_id": 1, "from": {"id": 9, "first_name": "X"}, "chat": {"id": 9}}"#,
        )
        .unwrap();
        assert_eq!(message.sender(), Some(Actor::new("", 9)));
        assert!(message.document.is_none());
    }

    #[test]
    fn test_error_response() {
        let response: ApiResponse<Vec<Update>> =
            serde_json::from_str(r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#)
                .unwrap();
        let err = response.into_result().unwrap_err();
        assert_eq!(err.to_string(), "Telegram API error: Unauthorized");
    }

    #[test]
    fn test_urls() {
        let client = TelegramClient::with_base_url("123:abc", "http://localhost:8081/");
        assert_eq!(
            client.method_url("getMe"),
            "http://localhost:8081/bot123:abc/getMe"
        );
        assert_eq!(
            client.file_url("documents/file_1.csv"),
            "http://localhost:8081/file/bot123:abc/documents/file_1.csv"
        );
    }

    fn update(id: i64) -> Update {
        Update {
            update_id: id,
            message: None,
        }
    }

    struct ScriptedSource {
        replies: Mutex<VecDeque<Result<Vec<Update>>>>,
        offsets: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl UpdateSource for std::sync::Arc<ScriptedSource> {
        async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
            self.offsets.lock().unwrap().push(offset);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    #[tokio::test]
    async fn test_stream_advances_offset_and_retries() {
        let source = std::sync::Arc::new(ScriptedSource {
            replies: Mutex::new(VecDeque::from(vec![
                Ok(vec![update(10), update(11)]),
                Err(Error::Telegram("timeout".into())),
                Ok(vec![]),
                Ok(vec![update(12)]),
            ])),
            offsets: Mutex::new(Vec::new()),
        });

        let ids: Vec<i64> = update_stream(source.clone(), Duration::ZERO)
            .take(3)
            .map(|u| u.update_id)
            .collect()
            .await;

        assert_eq!(ids, vec![10, 11, 12]);
        assert_eq!(*source.offsets.lock().unwrap(), vec![0, 12, 12, 12]);
    }
}
