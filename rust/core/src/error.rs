// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for depth map decoding
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decoding a depth payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid base64 alphabet/padding or a corrupt compressed stream
    #[error("Decode error: {0}")]
    Decode(String),

    /// Header declares dimensions or plane records the buffer cannot hold
    #[error("Malformed header: {0}")]
    MalformedHeader(String),
}

impl Error {
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::MalformedHeader(msg.into())
    }
}
