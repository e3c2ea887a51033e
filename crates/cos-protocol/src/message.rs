use std::fmt;

use cos_types::{ContentHash, PermissionDecision};
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// The five request kinds that cross the isolation boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    RequestFileHandles,
    GetFileData,
    StoreFileData,
    GetPermission,
    StorePermission,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequestFileHandles => "requestFileHandles",
            Self::GetFileData => "getFileData",
            Self::StoreFileData => "storeFileData",
            Self::GetPermission => "getPermission",
            Self::StorePermission => "storePermission",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every payload that travels inside an [`Envelope`].
///
/// Requests and their responses share an [`Action`]; a response must echo
/// the request's envelope id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CosMessage {
    RequestFileHandles { hashes: Vec<ContentHash>, create: bool },
    FileHandles { success: Vec<ContentHash>, hashes: Vec<ContentHash> },
    GetFileData { hash: ContentHash },
    FileData { bytes: Vec<u8> },
    StoreFileData { hash: ContentHash, bytes: Vec<u8> },
    StoreAck { hash: ContentHash, size: u64 },
    GetPermission { host: String },
    StorePermission { host: String, permission: PermissionDecision },
    Permission { host: String, permission: Option<PermissionDecision> },
    Error { action: Action, code: u32, message: String },
}

impl CosMessage {
    pub fn action(&self) -> Action {
        match self {
            Self::RequestFileHandles { .. } | Self::FileHandles { .. } => Action::RequestFileHandles,
            Self::GetFileData { .. } | Self::FileData { .. } => Action::GetFileData,
            Self::StoreFileData { .. } | Self::StoreAck { .. } => Action::StoreFileData,
            Self::GetPermission { .. } => Action::GetPermission,
            Self::StorePermission { .. } => Action::StorePermission,
            // A permission answer serves both permission actions; the
            // transport pairs it by id.
            Self::Permission { .. } => Action::GetPermission,
            Self::Error { action, .. } => *action,
        }
    }

    /// Whether this message is sent by the requesting side.
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            Self::RequestFileHandles { .. }
                | Self::GetFileData { .. }
                | Self::StoreFileData { .. }
                | Self::GetPermission { .. }
                | Self::StorePermission { .. }
        )
    }

    /// Whether `self` is an acceptable reply to a request of `action`.
    pub fn answers(&self, action: Action) -> bool {
        match self {
            Self::FileHandles { .. } => action == Action::RequestFileHandles,
            Self::FileData { .. } => action == Action::GetFileData,
            Self::StoreAck { .. } => action == Action::StoreFileData,
            Self::Permission { .. } => {
                matches!(action, Action::GetPermission | Action::StorePermission)
            }
            Self::Error { action: echoed, .. } => *echoed == action,
            _ => false,
        }
    }

    pub fn type_tag(&self) -> u8 {
        match self {
            Self::RequestFileHandles { .. } => 1,
            Self::FileHandles { .. } => 2,
            Self::GetFileData { .. } => 3,
            Self::FileData { .. } => 4,
            Self::StoreFileData { .. } => 5,
            Self::StoreAck { .. } => 6,
            Self::GetPermission { .. } => 7,
            Self::StorePermission { .. } => 8,
            Self::Permission { .. } => 9,
            Self::Error { .. } => 255,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RequestFileHandles { .. } => "RequestFileHandles",
            Self::FileHandles { .. } => "FileHandles",
            Self::GetFileData { .. } => "GetFileData",
            Self::FileData { .. } => "FileData",
            Self::StoreFileData { .. } => "StoreFileData",
            Self::StoreAck { .. } => "StoreAck",
            Self::GetPermission { .. } => "GetPermission",
            Self::StorePermission { .. } => "StorePermission",
            Self::Permission { .. } => "Permission",
            Self::Error { .. } => "Error",
        }
    }
}

/// A message plus its routing metadata.
///
/// `id` correlates a response with its request; ids are assigned by the
/// requesting side, start at 1, and increase monotonically.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: u64,
    pub origin: String,
    pub message: CosMessage,
}

impl Envelope {
    pub fn new(id: u64, origin: impl Into<String>, message: CosMessage) -> Self {
        Self {
            id,
            origin: origin.into(),
            message,
        }
    }

    pub fn action(&self) -> Action {
        self.message.action()
    }

    /// Build the response envelope for this request.
    pub fn reply(&self, message: CosMessage) -> Self {
        Self {
            id: self.id,
            origin: self.origin.clone(),
            message,
        }
    }
}

/// Status codes carried by [`CosMessage::Error`].
pub mod codes {
    pub const BAD_REQUEST: u32 = 400;
    pub const FORBIDDEN: u32 = 403;
    pub const NOT_FOUND: u32 = 404;
    pub const HASH_MISMATCH: u32 = 409;
    pub const TOO_LARGE: u32 = 413;
    pub const INTERNAL: u32 = 500;
}
