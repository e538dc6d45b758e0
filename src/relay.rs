//! Relay between the chat and the converter.
//!
//! Each inbound message is checked against the allow-list, its attachment
//! fetched and converted, and the converted file sent back to the same chat.
//! Failures are reported to the sender as plain text.

use crate::auth::AllowList;
use crate::config::Config;
use crate::conversion::convert_to_file;
use crate::error::{Error, Result};
use crate::telegram::{Message, Update};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// The only content type accepted for conversion.
pub const CSV_MIME: &str = "text/csv";

/// Outbound side of the chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Download an uploaded file. Failures are [`Error::Fetch`].
    async fn fetch_file(&self, file_id: &str) -> Result<Vec<u8>>;

    /// Failures are [`Error::Delivery`], as for every send below.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;

    async fn send_document(&self, chat_id: i64, path: &Path, caption: &str) -> Result<()>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()>;
}

pub struct Relay<T> {
    transport: T,
    allow_list: AllowList,
    output_dir: PathBuf,
}

impl<T: ChatTransport> Relay<T> {
    pub fn new(transport: T, allow_list: AllowList, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            allow_list,
            output_dir: output_dir.into(),
        }
    }

    pub fn from_config(transport: T, config: &Config) -> Self {
        Self::new(transport, AllowList::from_config(config), config.output_dir())
    }

    /// Handle one update to completion.
    ///
    /// Returns the path the converted file was sent from (removed once
    /// sent), `None` for updates that carry no message. Errors have already
    /// been reported to the chat when possible.
    pub async fn handle_update(&self, update: &Update) -> Result<Option<PathBuf>> {
        let Some(message) = update.message.as_ref() else {
            debug!(update_id = update.update_id, "ignoring update without message");
            return Ok(None);
        };

        match self.process(message).await {
            Ok(path) => Ok(Some(path)),
            Err(err) => {
                self.report(message, &err).await;
                Err(err)
            }
        }
    }

    async fn process(&self, message: &Message) -> Result<PathBuf> {
        let chat_id = message.chat.id;
        let sender = message.sender().unwrap_or_default();

        if !self.allow_list.is_allowed(&sender) {
            warn!(username = %sender.username, id = sender.id, "unauthenticated");
            return Err(Error::AuthorizationDenied(sender.username));
        }

        let document = match &message.document {
            Some(doc) if doc.mime_type.as_deref() == Some(CSV_MIME) => doc,
            Some(doc) => {
                return Err(Error::UnsupportedContentType(
                    doc.mime_type.clone().unwrap_or_else(|| "file of unknown type".into()),
                ))
            }
            None => return Err(Error::UnsupportedContentType("message without file".into())),
        };

        let name = upload_name(document.file_name.as_deref());
        info!(chat_id, file = %name, size = ?document.file_size, "received csv");

        let raw = self.transport.fetch_file(&document.file_id).await?;
        let path = self.output_dir.join(format!("{}_converted.csv", name));
        convert_to_file(&raw, &path)?;
        info!(chat_id, path = %path.display(), "converted");

        let sent = self
            .transport
            .send_document(chat_id, &path, "convertion: true")
            .await;
        if let Err(err) = tokio::fs::remove_file(&path).await {
            warn!(path = %path.display(), error = %err, "cannot remove converted file");
        }
        sent?;

        if let Err(err) = self
            .transport
            .delete_message(chat_id, message.message_id)
            .await
        {
            error!(chat_id, message_id = message.message_id, error = %err, "cannot delete upload");
        }

        Ok(path)
    }

    async fn report(&self, message: &Message, err: &Error) {
        let text = match err {
            Error::Delivery(_) => {
                error!(chat_id = message.chat.id, error = %err, "delivery failed");
                return;
            }
            Error::AuthorizationDenied(_) | Error::UnsupportedContentType(_) => err.to_string(),
            Error::Fetch(msg) => format!("Cannot parse uploaded file. Error: {}", msg),
            other => {
                let name = message
                    .document
                    .as_ref()
                    .and_then(|d| d.file_name.as_deref())
                    .unwrap_or("file");
                format!("Cannot convert {}: {}", name, other)
            }
        };

        if let Err(err) = self.transport.send_message(message.chat.id, &text).await {
            error!(chat_id = message.chat.id, error = %err, "cannot send reply");
        }
    }

    /// Consume updates one at a time until the stream ends or `shutdown`
    /// resolves. An update being handled is always finished first.
    ///
    /// Returns the number of updates handled.
    pub async fn run<S, F>(&self, mut updates: S, shutdown: F) -> usize
    where
        S: Stream<Item = Update> + Unpin,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut handled = 0;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(handled, "shutdown requested");
                    break;
                }
                next = updates.next() => {
                    let Some(update) = next else {
                        info!(handled, "update stream ended");
                        break;
                    };
                    if let Err(err) = self.handle_update(&update).await {
                        warn!(update_id = update.update_id, error = %err, "update failed");
                    }
                    handled += 1;
                }
            }
        }

        handled
    }
}

/// Bare file name of an upload, without any directory part.
fn upload_name(file_name: Option<&str>) -> String {
    file_name
        .and_then(|n| Path::new(n).file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "upload.csv".into())
}
