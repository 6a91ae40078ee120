//! # cardroom-sync: Shared Room State
//!
//! Keeps every participant of a room on one versioned document. Clients
//! validate actions locally with `cardroom-engine`, write them with a
//! conditional commit and learn about every committed change, including
//! their own, from the room's change stream.
//!
//! ```rust
//! use std::sync::Arc;
//! use cardroom_engine::action::{Action, GameKind};
//! use cardroom_sync::{InMemoryRoomStore, SyncClient, SyncSettings};
//!
//! let store = Arc::new(InMemoryRoomStore::new());
//! let code = store.create_room("ana").unwrap().room_code;
//! store.join_room(&code, "ben").unwrap();
//! store.set_ready(&code, "ana", true).unwrap();
//! store.set_ready(&code, "ben", true).unwrap();
//! store.start_game(&code, GameKind::ColorClash, 7).unwrap();
//!
//! let mut ana = SyncClient::connect(store.clone(), &code, "ana", SyncSettings::default()).unwrap();
//! let receipt = ana.submit(&Action::Draw).unwrap();
//! assert_eq!(receipt.attempts, 1);
//! ```

pub mod errors;
pub mod events;
pub mod logging;
pub mod protocol;
pub mod room;
pub mod settings;
pub mod store;
pub mod timer;

pub use errors::{ErrorSeverity, SyncError};
pub use events::{EventBus, RoomSubscription};
pub use logging::{init_logging, LogEntry, TestLogSubscriber};
pub use protocol::{commit_with_retry, ActionPhase, CommitReceipt, SyncClient};
pub use room::{RoomCode, RoomState, RoomStatus, RosterEntry, Version};
pub use settings::{SettingsError, SyncSettings};
pub use store::{CommitOutcome, InMemoryRoomStore, RoomStore};
pub use timer::{enforce_turn_deadline, run_turn_timer, DeadlineOutcome};
