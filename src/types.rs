//! Common types shared by the converter and the bot.

use serde::{Deserialize, Serialize};

/// Position of the transaction date in a data row.
pub const DATE_FIELD: usize = 4;

/// Position of the amount in a data row.
pub const AMOUNT_FIELD: usize = 5;

/// Position of the free-text description in a data row.
pub const DESCRIPTION_FIELD: usize = 7;

/// Minimum number of fields a data row must carry.
pub const MIN_FIELDS: usize = DESCRIPTION_FIELD + 1;

/// Parsed delimited text: ordered rows of ordered fields.
///
/// The first row is the header. Columns are identified by position only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularRecordSet {
    /// All rows, header included.
    pub rows: Vec<Vec<String>>,
}

impl TabularRecordSet {
    /// Create a record set from already split rows.
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Data rows, i.e. everything after the header.
    pub fn data_rows_mut(&mut self) -> impl Iterator<Item = (usize, &mut Vec<String>)> {
        self.rows.iter_mut().enumerate().skip(1)
    }

    /// Number of data rows.
    pub fn data_len(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The sender of an inbound chat event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor {
    /// Chat username, empty when the account has none.
    pub username: String,
    /// Numeric account identifier.
    pub id: i64,
}

impl Actor {
    pub fn new(username: impl Into<String>, id: i64) -> Self {
        Self {
            username: username.into(),
            id,
        }
    }
}

/// One entry of the allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedActor {
    #[serde(rename = "Username", alias = "username")]
    pub username: String,

    #[serde(rename = "ChatID", alias = "chatid", alias = "chat_id")]
    pub chat_id: i64,
}
