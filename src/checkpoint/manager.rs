use std::fs;
use std::path::{Path, PathBuf};

use crate::ai::{QAgent, QNetwork};
use crate::error::CheckpointError;

const STAGE_PREFIX: &str = "model_checkpoint_";
const FINAL_NAME: &str = "model_final.json";

/// Names and manages the per-stage and final model files in one directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CheckpointManager { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn stage_path(&self, stage: usize) -> PathBuf {
        self.dir.join(format!("{STAGE_PREFIX}{stage}.json"))
    }

    pub fn final_path(&self) -> PathBuf {
        self.dir.join(FINAL_NAME)
    }

    pub fn save_stage(
        &self,
        agent: &QAgent<QNetwork>,
        stage: usize,
    ) -> Result<PathBuf, CheckpointError> {
        self.save_to(agent, self.stage_path(stage))
    }

    pub fn save_final(&self, agent: &QAgent<QNetwork>) -> Result<PathBuf, CheckpointError> {
        self.save_to(agent, self.final_path())
    }

    fn save_to(
        &self,
        agent: &QAgent<QNetwork>,
        path: PathBuf,
    ) -> Result<PathBuf, CheckpointError> {
        fs::create_dir_all(&self.dir)?;
        agent.save(&path)?;
        log::info!("saved model to {}", path.display());
        Ok(path)
    }

    /// Load the final model into `agent`. Falling back to a fresh network on
    /// error is left to the caller.
    pub fn load_final(&self, agent: &mut QAgent<QNetwork>) -> Result<PathBuf, CheckpointError> {
        let path = self.final_path();
        agent.load(&path)?;
        log::info!(
            "loaded model from {} ({} games, epsilon {:.4})",
            path.display(),
            agent.episode_count(),
            agent.epsilon()
        );
        Ok(path)
    }

    /// Stage checkpoints on disk, sorted by stage index.
    pub fn list_stage_checkpoints(&self) -> Result<Vec<(usize, PathBuf)>, CheckpointError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut stages = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let stage = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(STAGE_PREFIX))
                .and_then(|n| n.strip_suffix(".json"))
                .and_then(|n| n.parse::<usize>().ok());
            if let Some(stage) = stage {
                stages.push((stage, path));
            }
        }
        stages.sort_by_key(|(stage, _)| *stage);
        Ok(stages)
    }

    /// Delete stage checkpoints left over from an earlier run.
    pub fn remove_stage_checkpoints(&self) -> Result<usize, CheckpointError> {
        let stages = self.list_stage_checkpoints()?;
        for (_, path) in &stages {
            fs::remove_file(path)?;
        }
        Ok(stages.len())
    }
}
