//! Incident checkpoint store.
//!
//! One JSON file per incident under the configured state directory. The
//! orchestrator saves after every phase transition, so a process restart
//! can resume each non-terminal incident at its last completed phase.
//! Writes go to a temp file first and are renamed into place, keeping a
//! checkpoint readable even if the process dies mid-save.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use super::Incident;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("no snapshot for incident {0}")]
    NotFound(Uuid),
}

/// Filesystem-backed incident snapshot store.
pub struct IncidentStore {
    dir: PathBuf,
}

impl IncidentStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Checkpoint an incident. Overwrites any previous snapshot; safe to
    /// call twice with the same state.
    pub fn save(&self, incident: &Incident) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(incident)?;
        let target = self.path_for(incident.id);
        let tmp = target.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }

    pub fn load(&self, id: Uuid) -> Result<Incident, StoreError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id));
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load every snapshot in the store. Unreadable files are skipped with
    /// a warning rather than failing the whole scan.
    pub fn load_all(&self) -> Result<Vec<Incident>, StoreError> {
        let mut incidents = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            match fs::read_to_string(&path).map_err(StoreError::from).and_then(|content| {
                serde_json::from_str::<Incident>(&content).map_err(StoreError::from)
            }) {
                Ok(incident) => incidents.push(incident),
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Skipping unreadable incident snapshot");
                }
            }
        }
        Ok(incidents)
    }

    /// Remove a snapshot. Idempotent.
    pub fn remove(&self, id: Uuid) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete all terminal snapshots, returning how many were removed.
    pub fn purge_terminal(&self) -> Result<usize, StoreError> {
        let mut removed = 0;
        for incident in self.load_all()? {
            if incident.phase.is_terminal() {
                self.remove(incident.id)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
