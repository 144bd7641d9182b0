//! Connection management for client connections.
//!
//! This module handles the lifecycle of client connections: id assignment,
//! the connection limit, and the outbound handle rooms use to reach a client.

pub mod client;
pub mod manager;

pub use client::{ClientConnection, Participant};
pub use manager::ConnectionManager;

/// Type alias for participant identifiers.
///
/// Every accepted connection gets a fresh id that doubles as its participant
/// id inside a room.
pub type ParticipantId = usize;
