//! Plain-data session snapshot.
//!
//! A snapshot holds only data. Observers and other callbacks are session-local
//! and the host hands them back to [`GameSession::resume`] when loading.
//!
//! [`GameSession::resume`]: crate::core::session::GameSession::resume

use super::constants::SNAPSHOT_VERSION;
use crate::character::wanderer::Wanderer;
use crate::combat::types::CombatState;
use crate::dungeon::types::DungeonRunState;
use crate::items::inventory::Satchel;
use crate::utils::persistence::SaveError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub wanderer: Wanderer,
    pub run: DungeonRunState,
    #[serde(default)]
    pub combat: Option<CombatState>,
    #[serde(default)]
    pub satchel: Satchel,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a snapshot. Missing required fields or an unknown version are
    /// reported as [`SaveError::Corrupt`].
    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        let snapshot: SessionSnapshot =
            serde_json::from_str(json).map_err(|e| SaveError::Corrupt(e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SaveError::Corrupt(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }
}
