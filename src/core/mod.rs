//! Shared building blocks and the session that ties a run together.

#![allow(unused_imports)]

pub mod constants;
pub mod log;
pub mod session;
pub mod snapshot;
pub mod weighted;

pub use constants::*;
pub use log::{KeyEcho, LogLine, Translator};
pub use session::{GameSession, NoopObserver, SessionObserver, TileReport};
pub use snapshot::SessionSnapshot;
pub use weighted::{weighted_pick, Weighted};
