//! # Tic-tac-toe Room Server
//!
//! A multi-room, two-player tic-tac-toe server over TCP. Each arriving
//! connection is paired into a room with at most one other connection; the
//! room owns a 3x3 board, decides whose move is legal, and pushes the updated
//! board to both participants after every accepted move.
//!
//! ## Architecture Overview
//!
//! ### Core Components
//!
//! * **Board** ([`game::Board`]) - the 3x3 grid, placement validation and
//!   win/draw detection
//! * **Room** ([`game::Room`]) - seats, turn order and the broadcast after
//!   each accepted move
//! * **Session Registry** ([`game::SessionRegistry`]) - room ids, seating of
//!   new connections and teardown of empty rooms
//! * **Connection Handler** ([`server::handlers`]) - one task per socket with
//!   separate read and write halves
//!
//! ### Message Flow
//!
//! 1. A client connects and is seated; it receives its room id
//! 2. When the room fills, each client receives its symbol (`O` or `X`)
//! 3. A client sends `X,1,2`; the room validates and applies it
//! 4. The new board is queued to both clients, three lines of `a,b,c`
//! 5. `exit` from either side ends the session
//!
//! ## Configuration
//!
//! The server is configured through the [`ServerConfig`] struct:
//!
//! * **Network settings** - bind address, connection limit, acceptor count
//! * **Framing** - maximum inbound line length, outbound queue depth
//! * **Game policy** - rejection notices and room closing on leave
//!
//! ## Error Handling
//!
//! * [`error::RoomError`] - rejected moves and seating failures
//! * [`error::ConnectionError`] - malformed input and transport failures,
//!   both fatal to one connection only
//! * [`ServerError`] - binding and other server-wide failures
//!
//! ## Thread Safety
//!
//! * Each room sits behind its own `tokio::sync::Mutex`; the lock covers
//!   validation, mutation and queuing the broadcast, never a socket write
//! * The registry map has its own lock, always taken before a room lock
//! * Connection bookkeeping uses `Arc<RwLock<HashMap>>`

// Re-export core types and functions for easy access
pub use config::{RejectionMode, ServerConfig};
pub use error::ServerError;
pub use server::GameServer;
pub use shutdown::ShutdownState;
pub use utils::{create_server, create_server_with_config};

// Public module declarations
pub mod config;
pub mod connection;
pub mod error;
pub mod game;
pub mod messaging;
pub mod server;
pub mod shutdown;
pub mod utils;
