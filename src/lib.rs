//! Satispay CSV bot library
//!
//! Converts Satispay transaction exports into a CSV layout that budgeting
//! tools can import, and relays files to and from a Telegram chat.
//!
//! # Conversion
//!
//! Every data row of an export is rewritten in place:
//!
//! - **date** (column 5): `15 Mar 2023 at 10:00` becomes `15/3/2023`
//! - **amount** (column 6): decimal comma becomes a period, whitespace trimmed
//! - **description** (column 8): commas become periods
//!
//! The header row is passed through untouched.
//!
//! # Examples
//!
//! ## Converting an export in memory
//!
//! ```
//! use satispay_csv_bot::conversion::transform_bytes;
//!
//! let input = "id,type,name,status,date,amount,currency,description\n\
//!              1,pay,Bar,ok,15 Mar 2023 at 10:00,\"1,50 \",EUR,\"rent,utilities\"\n";
//! let output = transform_bytes(input.as_bytes())?;
//! assert!(String::from_utf8_lossy(&output).ends_with("15/3/2023,1.50,EUR,rent.utilities\n"));
//! # Ok::<(), satispay_csv_bot::Error>(())
//! ```
//!
//! ## Converting a file
//!
//! ```no_run
//! use std::fs::File;
//! use satispay_csv_bot::conversion::transform;
//!
//! let input = File::open("export.csv")?;
//! let output = File::create("export_converted.csv")?;
//! transform(input, output)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod auth;
pub mod config;
pub mod conversion;
pub mod csv_format;
pub mod error;
pub mod relay;
pub mod telegram;
pub mod types;

// Re-export commonly used types
pub use auth::AllowList;
pub use config::Config;
pub use error::{Error, Result};
pub use relay::{ChatTransport, Relay};
pub use telegram::TelegramClient;
pub use types::{Actor, AllowedActor, TabularRecordSet};
