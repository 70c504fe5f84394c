use crate::engines::generation::engine::PopulationSnapshot;
use crate::error::{Result, SweetspotError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointFile {
    saved_at: DateTime<Utc>,
    snapshot: PopulationSnapshot,
}

/// Durable, atomically replaced store for the latest population snapshot of a run.
///
/// The snapshot before the latest one is kept next to it as `<file>.prev`; a corrupt
/// latest checkpoint is resumed from there instead.
pub struct CheckpointManager {
    path: PathBuf,
}

impl CheckpointManager {
    pub const FILE_NAME: &'static str = "population.json";

    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn in_run_dir<P: AsRef<Path>>(run_dir: P) -> Self {
        Self::new(run_dir.as_ref().join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn previous_path(&self) -> PathBuf {
        with_suffix(&self.path, ".prev")
    }

    fn temp_path(&self) -> PathBuf {
        with_suffix(&self.path, ".tmp")
    }

    /// Write to a temp file, copy the current file to `.prev`, then rename into place.
    pub fn save(&self, snapshot: &PopulationSnapshot) -> Result<()> {
        let fail = |what: &str, e: &dyn std::fmt::Display| {
            SweetspotError::Checkpoint(format!(
                "Failed to {} checkpoint {}: {}",
                what,
                self.path.display(),
                e
            ))
        };

        let file = CheckpointFile {
            saved_at: Utc::now(),
            snapshot: snapshot.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&file).map_err(|e| fail("serialize", &e))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| fail("create directory for", &e))?;
        }

        let temp = self.temp_path();
        {
            let mut out = File::create(&temp).map_err(|e| fail("create", &e))?;
            out.write_all(&bytes).map_err(|e| fail("write", &e))?;
            out.sync_all().map_err(|e| fail("sync", &e))?;
        }

        // The live file stays in place until the rename below replaces it.
        if self.path.is_file() {
            match read_snapshot(&self.path) {
                Ok(_) => {
                    let staged = with_suffix(&self.previous_path(), ".tmp");
                    std::fs::copy(&self.path, &staged).map_err(|e| fail("copy previous", &e))?;
                    std::fs::rename(&staged, self.previous_path()).map_err(|e| fail("rotate", &e))?;
                }
                Err(e) => log::warn!(
                    "Not keeping unusable checkpoint {} as previous: {}",
                    self.path.display(),
                    e
                ),
            }
        }
        std::fs::rename(&temp, &self.path).map_err(|e| fail("replace", &e))?;

        log::info!(
            "Checkpointed epoch {} generation {} ({} individuals) to {}",
            snapshot.epoch,
            snapshot.generation,
            snapshot.individuals.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Restore the latest valid snapshot, falling back to `.prev` if the latest is missing
    /// or unusable.
    pub fn load(&self) -> Result<PopulationSnapshot> {
        let previous = self.previous_path();
        if !self.path.is_file() {
            if !previous.is_file() {
                return Err(SweetspotError::Configuration(format!(
                    "Checkpoint not found: {}",
                    self.path.display()
                )));
            }
            log::warn!(
                "Checkpoint {} is missing, trying the previous generation",
                self.path.display()
            );
            return self.load_previous("missing".to_string());
        }

        let latest_err = match read_snapshot(&self.path) {
            Ok(snapshot) => return Ok(snapshot),
            Err(e) => e,
        };
        log::warn!(
            "Checkpoint {} is unusable ({}), trying the previous generation",
            self.path.display(),
            latest_err
        );

        if !previous.is_file() {
            return Err(SweetspotError::Checkpoint(format!(
                "{} is unusable ({}) and no previous checkpoint exists",
                self.path.display(),
                latest_err
            )));
        }
        self.load_previous(latest_err)
    }

    fn load_previous(&self, latest_err: String) -> Result<PopulationSnapshot> {
        let previous = self.previous_path();
        match read_snapshot(&previous) {
            Ok(snapshot) => {
                log::warn!(
                    "Resuming from previous checkpoint {} (epoch {}, generation {})",
                    previous.display(),
                    snapshot.epoch,
                    snapshot.generation
                );
                Ok(snapshot)
            }
            Err(e) => Err(SweetspotError::Checkpoint(format!(
                "{} is unusable ({}) and so is {} ({})",
                self.path.display(),
                latest_err,
                previous.display(),
                e
            ))),
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn read_snapshot(path: &Path) -> std::result::Result<PopulationSnapshot, String> {
    let contents = std::fs::read(path).map_err(|e| e.to_string())?;
    let file: CheckpointFile = serde_json::from_slice(&contents).map_err(|e| e.to_string())?;
    check_snapshot(&file.snapshot)?;
    log::debug!("Read checkpoint saved at {}", file.saved_at);
    Ok(file.snapshot)
}

fn check_snapshot(snapshot: &PopulationSnapshot) -> std::result::Result<(), String> {
    let first = snapshot
        .individuals
        .first()
        .ok_or_else(|| "snapshot has no individuals".to_string())?;

    let dimensions = first.x.len();
    for (i, ind) in snapshot.individuals.iter().enumerate() {
        if ind.x.len() != dimensions {
            return Err(format!(
                "individual {} has {} genes, expected {}",
                i,
                ind.x.len(),
                dimensions
            ));
        }
        if !ind.x.iter().all(|v| v.is_finite()) || !ind.f.as_array().iter().all(|v| v.is_finite()) {
            return Err(format!("individual {} has non-finite values", i));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::generation::engine::EngineState;
    use crate::types::{Individual, ObjectiveVector};

    fn snapshot(generation: usize) -> PopulationSnapshot {
        let individuals = (0..8)
            .map(|i| Individual {
                x: vec![0.1 + 0.2 * i as f64, 1.0 / 3.0, i as f64],
                f: ObjectiveVector::from_measures(0.7 + 1e-13 * i as f64, 25.0 / 7.0),
            })
            .collect();
        PopulationSnapshot {
            encoder_id: "libx264".to_string(),
            algorithm_id: "nsga2".to_string(),
            epoch: 1,
            generation,
            individuals,
            engine_state: EngineState {
                seed: 4,
                generations_evolved: generation,
            },
        }
    }

    #[test]
    fn test_round_trip_is_bit_exact() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::in_run_dir(dir.path());
        let written = snapshot(2);

        manager.save(&written).unwrap();
        let restored = manager.load().unwrap();

        assert_eq!(restored, written);
        for (a, b) in restored.individuals.iter().zip(&written.individuals) {
            let bits = |v: &[f64]| v.iter().map(|f| f.to_bits()).collect::<Vec<_>>();
            assert_eq!(bits(&a.x), bits(&b.x));
            assert_eq!(bits(&a.f.as_array()), bits(&b.f.as_array()));
        }
        assert!(!manager.temp_path().exists());
    }

    #[test]
    fn test_missing_checkpoint_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::in_run_dir(dir.path());
        assert!(matches!(manager.load(), Err(SweetspotError::Configuration(_))));
    }

    #[test]
    fn test_corrupt_checkpoint_falls_back_to_previous() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::in_run_dir(dir.path());
        manager.save(&snapshot(1)).unwrap();
        manager.save(&snapshot(2)).unwrap();

        let contents = std::fs::read_to_string(manager.path()).unwrap();
        std::fs::write(manager.path(), &contents[..contents.len() / 2]).unwrap();

        let restored = manager.load().unwrap();
        assert_eq!(restored.generation, 1);
    }

    #[test]
    fn test_save_keeps_latest_in_place_and_previous_copy() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::in_run_dir(dir.path());
        manager.save(&snapshot(1)).unwrap();
        manager.save(&snapshot(2)).unwrap();

        assert_eq!(read_snapshot(manager.path()).unwrap().generation, 2);
        assert_eq!(read_snapshot(&manager.previous_path()).unwrap().generation, 1);
        assert!(!with_suffix(&manager.previous_path(), ".tmp").exists());
    }

    #[test]
    fn test_unusable_latest_does_not_replace_previous() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::in_run_dir(dir.path());
        manager.save(&snapshot(1)).unwrap();
        manager.save(&snapshot(2)).unwrap();
        std::fs::write(manager.path(), "{").unwrap();

        manager.save(&snapshot(3)).unwrap();

        assert_eq!(read_snapshot(manager.path()).unwrap().generation, 3);
        assert_eq!(read_snapshot(&manager.previous_path()).unwrap().generation, 1);
    }

    #[test]
    fn test_interrupted_rotation_recovers_previous() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::in_run_dir(dir.path());
        manager.save(&snapshot(1)).unwrap();

        // Latest moved aside and the replacement only half written.
        std::fs::rename(manager.path(), manager.previous_path()).unwrap();
        std::fs::write(manager.temp_path(), "{\"saved_at\":").unwrap();

        let restored = manager.load().unwrap();
        assert_eq!(restored, snapshot(1));
    }

    #[test]
    fn test_both_corrupt_is_checkpoint_error() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::in_run_dir(dir.path());
        std::fs::write(manager.path(), "{").unwrap();
        std::fs::write(manager.previous_path(), "not json").unwrap();

        assert!(matches!(manager.load(), Err(SweetspotError::Checkpoint(_))));
    }
}
