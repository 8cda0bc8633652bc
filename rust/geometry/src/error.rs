// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur inside the geometry kernel
#[derive(Error, Debug)]
pub enum Error {
    #[error("Triangulation failed: {0}")]
    TriangulationError(String),

    #[error("Boolean operation failed: {0}")]
    BooleanFailed(String),

    #[error("Invalid transform: {0}")]
    InvalidTransform(String),
}

impl Error {
    /// Shorthand for a boolean failure
    pub fn boolean(msg: impl Into<String>) -> Self {
        Error::BooleanFailed(msg.into())
    }
}
