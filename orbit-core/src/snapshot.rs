//! Session persistence as pretty-printed JSON.

use std::path::Path;

use orbit_types::SessionSnapshot;

use crate::error::Result;

pub fn save(path: &Path, snapshot: &SessionSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json)?;
    log::info!(target: "engine", "saved session to {}", path.display());
    Ok(())
}

pub fn load(path: &Path) -> Result<SessionSnapshot> {
    let contents = std::fs::read_to_string(path)?;
    let snapshot = serde_json::from_str(&contents)?;
    log::info!(target: "engine", "loaded session from {}", path.display());
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use orbit_types::{SequencerId, SequencerState};

    #[test]
    fn save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let snapshot = SessionSnapshot {
            bpm: 99.0,
            sequencers: vec![SequencerState::new(SequencerId::new(0))],
            ..SessionSnapshot::default()
        };
        save(&path, &snapshot).unwrap();
        assert_eq!(load(&path).unwrap(), snapshot);
    }

    #[test]
    fn load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(load(&missing), Err(EngineError::Io(_))));

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "{ not json").unwrap();
        assert!(matches!(load(&garbage), Err(EngineError::Json(_))));
    }
}
