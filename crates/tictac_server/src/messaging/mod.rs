//! Message handling and routing for client-server communication.
//!
//! This module provides the wire message types, line framing and the routing
//! of inbound client lines into rooms.

pub mod codec;
pub mod router;
pub mod types;

pub use codec::{read_line, read_server_message, write_message};
pub use router::{route_client_message, RouteOutcome};
pub use types::{ClientMessage, MoveRequest, ServerMessage, ERROR_PREFIX, EXIT_TOKEN};
