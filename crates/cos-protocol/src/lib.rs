//! Wire protocol for cross-origin storage.
//!
//! Defines the action-tagged messages, the length-prefixed framing, and the
//! correlated transport used between a requesting origin and the storage
//! host. Every request carries an id that its response must echo.

pub mod codec;
pub mod endpoint;
pub mod error;
pub mod message;
pub mod transport;

pub use codec::CosCodec;
pub use endpoint::{endpoints, HealthResponse};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{codes, Action, CosMessage, Envelope, MAX_MESSAGE_SIZE, PROTOCOL_VERSION};
pub use transport::{
    handle_frame, in_process_pair, serve, ChannelTransport, EnvelopeHandler, HostEndpoint,
    Transport, TransportMetrics,
};
