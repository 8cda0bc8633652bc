// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for opening scans
pub type Result<T> = std::result::Result<T, Error>;

/// Session-level failures
///
/// Per-element geometry problems never show up here; they are logged and
/// the element is skipped.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Host document unavailable: {0}")]
    DocumentUnavailable(String),

    #[error("Scan cancelled before any opening was found")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }
}
