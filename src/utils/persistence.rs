//! Checksummed on-disk storage for session snapshots.

use crate::core::constants::SAVE_VERSION_MAGIC;
use crate::core::snapshot::SessionSnapshot;
use directories::ProjectDirs;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save file i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid save version: expected 0x{expected:016X}, got 0x{found:016X}")]
    BadMagic { expected: u64, found: u64 },
    #[error("checksum verification failed")]
    ChecksumMismatch,
    #[error("corrupted snapshot: {0}")]
    Corrupt(String),
}

/// Saves and loads one session snapshot.
pub struct SaveManager {
    save_path: PathBuf,
}

impl SaveManager {
    /// Save file in the platform data directory, created if missing.
    pub fn new() -> Result<Self, SaveError> {
        let project_dirs = ProjectDirs::from("", "", "wander").ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine data directory",
            )
        })?;
        let data_dir = project_dirs.data_dir();
        fs::create_dir_all(data_dir)?;
        Ok(Self {
            save_path: data_dir.join("run.dat"),
        })
    }

    /// Save file at an explicit path. The parent directory must exist.
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            save_path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.save_path
    }

    /// Writes the snapshot.
    ///
    /// File format:
    /// - Version magic (8 bytes)
    /// - Data length (4 bytes)
    /// - JSON snapshot (variable length)
    /// - SHA256 checksum over everything before it (32 bytes)
    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<(), SaveError> {
        let data = serde_json::to_vec(snapshot)?;
        let data_len = data.len() as u32;

        let mut hasher = Sha256::new();
        hasher.update(SAVE_VERSION_MAGIC.to_le_bytes());
        hasher.update(data_len.to_le_bytes());
        hasher.update(&data);
        let checksum = hasher.finalize();

        let mut file = fs::File::create(&self.save_path)?;
        file.write_all(&SAVE_VERSION_MAGIC.to_le_bytes())?;
        file.write_all(&data_len.to_le_bytes())?;
        file.write_all(&data)?;
        file.write_all(&checksum)?;
        tracing::debug!(path = %self.save_path.display(), bytes = data_len, "snapshot saved");
        Ok(())
    }

    /// Reads the snapshot back, verifying the magic and checksum first.
    pub fn load(&self) -> Result<SessionSnapshot, SaveError> {
        let mut file = fs::File::open(&self.save_path)?;

        let mut version_bytes = [0u8; 8];
        file.read_exact(&mut version_bytes)?;
        let version = u64::from_le_bytes(version_bytes);
        if version != SAVE_VERSION_MAGIC {
            return Err(SaveError::BadMagic {
                expected: SAVE_VERSION_MAGIC,
                found: version,
            });
        }

        let mut length_bytes = [0u8; 4];
        file.read_exact(&mut length_bytes)?;
        let data_len = u32::from_le_bytes(length_bytes);

        let mut data = vec![0u8; data_len as usize];
        file.read_exact(&mut data)?;

        let mut stored_checksum = [0u8; 32];
        file.read_exact(&mut stored_checksum)?;

        let mut hasher = Sha256::new();
        hasher.update(version_bytes);
        hasher.update(length_bytes);
        hasher.update(&data);
        if stored_checksum != hasher.finalize().as_slice() {
            return Err(SaveError::ChecksumMismatch);
        }

        let json = String::from_utf8(data).map_err(|e| SaveError::Corrupt(e.to_string()))?;
        SessionSnapshot::from_json(&json)
    }

    pub fn save_exists(&self) -> bool {
        self.save_path.exists()
    }

    /// Removes the save, e.g. after the run ends. Missing files are fine.
    pub fn delete(&self) -> Result<(), SaveError> {
        match fs::remove_file(&self.save_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::attributes::Stats;
    use crate::character::wanderer::Wanderer;
    use crate::core::session::{GameSession, NoopObserver};
    use crate::items::inventory::Satchel;
    use crate::items::types::Weapon;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// SaveManager in a unique temporary directory
    fn temp_manager() -> SaveManager {
        static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);
        let test_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir = std::env::temp_dir().join(format!(
            "wander-test-{}-{}",
            std::process::id(),
            test_id
        ));
        fs::create_dir_all(&temp_dir).expect("temp dir");
        SaveManager::with_path(temp_dir.join("run.dat"))
    }

    fn snapshot() -> SessionSnapshot {
        let wanderer = Wanderer::new("Ash", Stats::new(6));
        let satchel = Satchel::default().with_weapon(Weapon::new("rusty_sword", 3, 6, 12));
        GameSession::start(wanderer, "rotting_fen", satchel, Box::new(NoopObserver))
            .expect("known map")
            .snapshot()
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let manager = temp_manager();
        assert!(!manager.save_exists());

        let original = snapshot();
        manager.save(&original).expect("save");
        assert!(manager.save_exists());
        let loaded = manager.load().expect("load");
        assert_eq!(loaded, original);

        manager.delete().expect("delete");
        assert!(!manager.save_exists());
        // Deleting twice is fine
        manager.delete().expect("delete again");
    }

    #[test]
    fn test_tampered_payload_fails_checksum() {
        let manager = temp_manager();
        manager.save(&snapshot()).expect("save");

        let mut bytes = fs::read(manager.path()).expect("read");
        // Flip a byte inside the JSON payload
        bytes[20] ^= 0x01;
        fs::write(manager.path(), bytes).expect("write");

        assert!(matches!(manager.load(), Err(SaveError::ChecksumMismatch)));
    }

    #[test]
    fn test_wrong_magic_is_rejected() {
        let manager = temp_manager();
        manager.save(&snapshot()).expect("save");

        let mut bytes = fs::read(manager.path()).expect("read");
        bytes[..8].copy_from_slice(&0xDEAD_BEEF_u64.to_le_bytes());
        fs::write(manager.path(), bytes).expect("write");

        match manager.load() {
            Err(SaveError::BadMagic { expected, found }) => {
                assert_eq!(expected, SAVE_VERSION_MAGIC);
                assert_eq!(found, 0xDEAD_BEEF);
            }
            other => panic!("expected bad magic, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_truncated_file_is_io_error() {
        let manager = temp_manager();
        manager.save(&snapshot()).expect("save");
        let bytes = fs::read(manager.path()).expect("read");
        fs::write(manager.path(), &bytes[..bytes.len() - 10]).expect("write");

        assert!(matches!(manager.load(), Err(SaveError::Io(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let manager = temp_manager();
        assert!(matches!(manager.load(), Err(SaveError::Io(_))));
    }

    #[test]
    fn test_valid_envelope_with_bad_json_is_corrupt() {
        let manager = temp_manager();
        let data = br#"{"version":1,"wanderer":{}}"#;
        let data_len = data.len() as u32;
        let mut hasher = Sha256::new();
        hasher.update(SAVE_VERSION_MAGIC.to_le_bytes());
        hasher.update(data_len.to_le_bytes());
        hasher.update(data);

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&SAVE_VERSION_MAGIC.to_le_bytes());
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.extend_from_slice(data);
        bytes.extend_from_slice(&hasher.finalize());
        fs::write(manager.path(), bytes).expect("write");

        assert!(matches!(manager.load(), Err(SaveError::Corrupt(_))));
    }
}
