// ABOUTME: Protocol error types for malformed device and observer transport messages
// ABOUTME: These are logged and the frame dropped; the connection always stays open
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

/// Errors raised while decoding an inbound transport frame
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Frame was not valid JSON, or did not match the envelope shape
    #[error("Malformed message: {source}")]
    MalformedJson {
        /// Underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// A field the envelope requires is absent or empty
    #[error("Missing required field '{field}'")]
    MissingField {
        /// Name of the missing field
        field: &'static str,
    },

    /// `data_type` named a kind this hub does not handle
    #[error("Unknown data type '{data_type}'")]
    UnknownDataType {
        /// The value received
        data_type: String,
    },

    /// `status` named a transition this hub does not handle
    #[error("Unknown device status '{status}'")]
    UnknownStatus {
        /// The value received
        status: String,
    },

    /// Frame kind that carries no JSON (binary)
    #[error("Unsupported frame: {kind}")]
    UnsupportedFrame {
        /// Frame kind description
        kind: &'static str,
    },
}
