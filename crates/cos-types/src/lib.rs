//! Foundation types for cross-origin storage.
//!
//! Every other `cos-*` crate depends on `cos-types`.
//!
//! # Key Types
//!
//! - [`ContentHash`]: normalized `{algorithm, value}` digest; the only storage key
//! - [`HashAlgorithm`]: digest schemes computed locally
//! - [`Origin`]: the requesting host that permission decisions are keyed by
//! - [`HandleRequest`]: a batch of hashes plus the create flag
//! - [`PermissionDecision`]: `allow-once`, `allow-session`, or `never-allow`

pub mod error;
pub mod hash;
pub mod origin;
pub mod permission;
pub mod request;

pub use error::TypeError;
pub use hash::{ContentHash, HashAlgorithm};
pub use origin::Origin;
pub use permission::PermissionDecision;
pub use request::HandleRequest;
