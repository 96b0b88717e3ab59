//! Error types for the Assets client.
//!
//! # Design
//! Every variant names the [`Operation`] that failed so a message alone is
//! enough to tell which call broke and on which ids/queries/paths. Transport
//! failures keep the gateway's original code and message as the error
//! source; the other variants are raised by the client itself, either before
//! any transport call (`Validation`, `Serialization`) or after inspecting a
//! successful response (`NotFound`, `Integrity`).

use std::fmt;

use thiserror::Error;

/// The client operation an error or log record belongs to.
///
/// `Display` renders the name callers see in messages and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Search,
    Browse,
    Create,
    Update,
    UpdateBulk,
    Checkout,
    CheckoutAndDownload,
    CopyAsset,
    Move,
    Remove,
    CreateRelation,
    RemoveRelation,
    GetFolder,
    CreateFolder,
    UpdateFolder,
    RemoveFolder,
    Login,
    DownloadFile,
    SearchAsset,
    SearchAssetId,
    RemoveFromContainer,
    DownloadOriginalFile,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Search => "search",
            Operation::Browse => "browse",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::UpdateBulk => "updateBulk",
            Operation::Checkout => "checkout",
            Operation::CheckoutAndDownload => "checkoutAndDownload",
            Operation::CopyAsset => "copyAsset",
            Operation::Move => "move",
            Operation::Remove => "remove",
            Operation::CreateRelation => "createRelation",
            Operation::RemoveRelation => "removeRelation",
            Operation::GetFolder => "getFolder",
            Operation::CreateFolder => "createFolder",
            Operation::UpdateFolder => "updateFolder",
            Operation::RemoveFolder => "removeFolder",
            Operation::Login => "login",
            Operation::DownloadFile => "downloadFile",
            Operation::SearchAsset => "searchAsset",
            Operation::SearchAssetId => "searchAssetId",
            Operation::RemoveFromContainer => "removeFromContainer",
            Operation::DownloadOriginalFile => "downloadOriginalFile",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure reported by an [`HttpGateway`](crate::http::HttpGateway).
///
/// `code` is the HTTP status or server error code when the gateway has one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}{}", code_suffix(.code))]
pub struct TransportError {
    pub code: Option<u16>,
    pub message: String,
}

fn code_suffix(code: &Option<u16>) -> String {
    code.map(|c| format!(" (code {c})")).unwrap_or_default()
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: u16, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }
}

/// Errors returned by `AssetsClient` operations.
#[derive(Debug, Error)]
pub enum AssetsError {
    /// The gateway failed; `context` lists the identifiers of the call.
    #[error("{operation} failed [{context}]: {source}")]
    Transport {
        operation: Operation,
        context: String,
        #[source]
        source: TransportError,
    },

    /// A required identifier was missing; nothing was sent.
    #[error("{operation}: {message}")]
    Validation { operation: Operation, message: String },

    /// An expected-unique lookup returned no hits.
    #[error("{operation}: {message}")]
    NotFound { operation: Operation, message: String },

    /// The server returned data that breaks a domain invariant, e.g. two
    /// assets sharing an id or a relation hit without relation data.
    #[error("{operation}: {message}")]
    Integrity { operation: Operation, message: String },

    /// Request metadata could not be encoded as JSON.
    #[error("{operation}: metadata serialization failed: {source}")]
    Serialization {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },
}

impl AssetsError {
    /// The operation the error belongs to.
    pub fn operation(&self) -> Operation {
        match self {
            AssetsError::Transport { operation, .. }
            | AssetsError::Validation { operation, .. }
            | AssetsError::NotFound { operation, .. }
            | AssetsError::Integrity { operation, .. }
            | AssetsError::Serialization { operation, .. } => *operation,
        }
    }

    /// The original transport code, for `Transport` errors that carried one.
    pub fn code(&self) -> Option<u16> {
        match self {
            AssetsError::Transport { source, .. } => source.code,
            _ => None,
        }
    }

    pub(crate) fn transport(operation: Operation, context: String, source: TransportError) -> Self {
        AssetsError::Transport {
            operation,
            context,
            source,
        }
    }

    pub(crate) fn validation(operation: Operation, message: impl Into<String>) -> Self {
        AssetsError::Validation {
            operation,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(operation: Operation, message: impl Into<String>) -> Self {
        AssetsError::NotFound {
            operation,
            message: message.into(),
        }
    }

    pub(crate) fn integrity(operation: Operation, message: impl Into<String>) -> Self {
        AssetsError::Integrity {
            operation,
            message: message.into(),
        }
    }

    pub(crate) fn serialization(operation: Operation, source: serde_json::Error) -> Self {
        AssetsError::Serialization { operation, source }
    }
}
