//! Session registry: allocates room ids, seats arriving connections and tears
//! rooms down when they empty.
//!
//! The registry map is locked only for room-level bookkeeping and is never
//! held across network I/O. When both locks are needed, the registry lock is
//! taken before a room lock, never the other way round.

use super::room::{Room, RoomId, RoomPolicy, RoomState};
use crate::connection::{Participant, ParticipantId};
use crate::error::RoomError;
use crate::game::board::Symbol;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A room shared between its connection handlers and the registry.
pub type SharedRoom = Arc<Mutex<Room>>;

/// Where a newly connected participant was placed.
#[derive(Debug, Clone)]
pub struct Seating {
    pub room_id: RoomId,
    pub symbol: Symbol,
    pub room: SharedRoom,
}

/// Point-in-time counters describing the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Rooms currently registered
    pub active_rooms: usize,
    /// Registered rooms still waiting for a second participant
    pub open_rooms: usize,
    /// Participants seated across all rooms
    pub participants: usize,
    /// Rooms created since the registry was built
    pub rooms_created: u64,
}

/// Rooms keyed by id, plus whether the registry still seats newcomers.
#[derive(Debug, Default)]
struct Rooms {
    by_id: BTreeMap<RoomId, SharedRoom>,
    closed: bool,
}

/// Registry of every live room.
///
/// Rooms are keyed by id in a `BTreeMap`, so the most recently created room is
/// always the last entry. A new connection joins that room if it is still
/// open; otherwise a fresh room is created for it. After [`shutdown`] no one
/// is seated again.
///
/// [`shutdown`]: SessionRegistry::shutdown
#[derive(Debug)]
pub struct SessionRegistry {
    rooms: Mutex<Rooms>,
    next_room_id: AtomicU64,
    policy: RoomPolicy,
}

impl SessionRegistry {
    /// Creates an empty registry whose rooms follow `policy`.
    pub fn new(policy: RoomPolicy) -> Self {
        Self {
            rooms: Mutex::new(Rooms::default()),
            next_room_id: AtomicU64::new(1),
            policy,
        }
    }

    /// Seats a new participant.
    ///
    /// Joins the most recently created room if it has a free seat, otherwise
    /// creates a room with the next id. The participant is sent its room id
    /// before this returns.
    ///
    /// # Arguments
    ///
    /// * `participant` - Outbound handle for the connection being seated
    ///
    /// # Returns
    ///
    /// The room and symbol the participant was given, or
    /// [`RoomError::ShuttingDown`] once the registry has been shut down.
    pub async fn connect(&self, participant: Participant) -> Result<Seating, RoomError> {
        let mut rooms = self.rooms.lock().await;
        if rooms.closed {
            debug!(participant = participant.id(), "Registry closed, not seating");
            return Err(RoomError::ShuttingDown);
        }

        if let Some(room) = rooms.by_id.values().next_back() {
            let mut guard = room.lock().await;
            if guard.is_open() {
                let symbol = guard.join(participant)?;
                return Ok(Seating {
                    room_id: guard.id(),
                    symbol,
                    room: Arc::clone(room),
                });
            }
        }

        let room_id = self.next_room_id.fetch_add(1, Ordering::Relaxed);
        let mut room = Room::new(room_id, self.policy);
        let symbol = room.join(participant)?;
        let room = Arc::new(Mutex::new(room));
        rooms.by_id.insert(room_id, Arc::clone(&room));
        info!(room = room_id, "🏠 Created room");

        Ok(Seating {
            room_id,
            symbol,
            room,
        })
    }

    /// Removes a participant from its room and drops the room once empty.
    ///
    /// # Returns
    ///
    /// `true` if the room was removed from the registry.
    pub async fn disconnect(&self, room_id: RoomId, participant: ParticipantId) -> bool {
        let mut rooms = self.rooms.lock().await;
        let Some(room) = rooms.by_id.get(&room_id).cloned() else {
            return false;
        };

        let mut guard = room.lock().await;
        let remaining = guard.leave(participant);
        // A closed room is gone even if its other participant has not
        // disconnected yet.
        let closed = guard.state() != RoomState::Open && self.policy.close_room_on_leave;
        if remaining == 0 || closed {
            drop(guard);
            rooms.by_id.remove(&room_id);
            info!(room = room_id, "🧹 Room removed");
            true
        } else {
            debug!(room = room_id, remaining, "Room kept after leave");
            false
        }
    }

    /// Looks up a live room.
    pub async fn room(&self, room_id: RoomId) -> Option<SharedRoom> {
        self.rooms.lock().await.by_id.get(&room_id).cloned()
    }

    /// Collects counters across all rooms.
    pub async fn stats(&self) -> RegistryStats {
        let rooms = self.rooms.lock().await;
        let mut stats = RegistryStats {
            active_rooms: rooms.by_id.len(),
            rooms_created: self.next_room_id.load(Ordering::Relaxed) - 1,
            ..Default::default()
        };
        for room in rooms.by_id.values() {
            let room = room.lock().await;
            stats.participants += room.participant_count();
            if room.is_open() {
                stats.open_rooms += 1;
            }
        }
        stats
    }

    /// Sends `exit` to every participant, forgets every room and refuses
    /// all later [`connect`](SessionRegistry::connect) calls.
    ///
    /// # Returns
    ///
    /// The number of participants notified.
    pub async fn shutdown(&self) -> usize {
        let mut rooms = self.rooms.lock().await;
        rooms.closed = true;
        let mut notified = 0;
        for room in rooms.by_id.values() {
            notified += room.lock().await.close();
        }
        let closed = rooms.by_id.len();
        rooms.by_id.clear();
        info!(rooms = closed, participants = notified, "🚪 All rooms closed");
        notified
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(RoomPolicy::default())
    }
}
