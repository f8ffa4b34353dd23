use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ai::{QAgent, QNetwork};
use crate::error::CheckpointError;

/// On-disk model: network parameters plus training counters.
///
/// Every key is optional on read so older or partial files still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDocument {
    /// `[layer][output][input]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<Vec<Vec<f64>>>>,
    /// `[layer][index]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biases: Option<Vec<Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epsilon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_games: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_win_rates: Option<Vec<f64>>,
}

impl ModelDocument {
    /// Snapshot everything that gets persisted.
    pub fn capture(agent: &QAgent<QNetwork>) -> Self {
        let params = agent.network().params();
        ModelDocument {
            weights: Some(params.weights()),
            biases: Some(params.biases()),
            epsilon: Some(agent.epsilon()),
            total_games: Some(agent.stats().total_games()),
            recent_win_rates: Some(agent.stats().recent_win_rates().to_vec()),
        }
    }

    /// Merge into a live agent. Array entries outside the network's shape are
    /// ignored and entries the document lacks keep their current values.
    pub fn apply_to(self, agent: &mut QAgent<QNetwork>) {
        let params = agent.network_mut().params_mut();
        if let Some(weights) = &self.weights {
            params.merge_weights(weights);
        }
        if let Some(biases) = &self.biases {
            params.merge_biases(biases);
        }
        if let Some(epsilon) = self.epsilon {
            agent.set_epsilon(epsilon);
        }
        agent
            .stats_mut()
            .restore(self.total_games, self.recent_win_rates);
    }

    pub fn read(path: &Path) -> Result<Self, CheckpointError> {
        let json = fs::read_to_string(path).map_err(|e| CheckpointError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| CheckpointError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Write pretty-printed JSON via a temporary file and rename.
    pub fn write(&self, path: &Path) -> Result<(), CheckpointError> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = tmp_path(path);
        fs::write(&tmp, json).map_err(|e| CheckpointError::Write {
            path: tmp.clone(),
            source: e,
        })?;
        fs::rename(&tmp, path).map_err(|e| CheckpointError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::QLearningConfig;
    use crate::game::{GameOutcome, Player};

    fn agent(seed: u64) -> QAgent<QNetwork> {
        QAgent::new(QLearningConfig {
            seed: Some(seed),
            win_rate_window: 2,
            ..Default::default()
        })
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let mut saved = agent(1);
        for outcome in [
            GameOutcome::Winner(Player::X),
            GameOutcome::Draw,
            GameOutcome::Winner(Player::X),
            GameOutcome::Winner(Player::X),
            GameOutcome::Winner(Player::O),
        ] {
            saved.finish_episode(outcome);
        }
        saved.save(&path).unwrap();

        let mut restored = agent(2);
        assert_ne!(restored.network().params(), saved.network().params());
        restored.load(&path).unwrap();

        assert_eq!(restored.network().params(), saved.network().params());
        assert_eq!(restored.epsilon(), saved.epsilon());
        assert_eq!(restored.episode_count(), 5);
        assert_eq!(restored.stats().recent_win_rates(), &[0.5, 1.0]);
        assert!(!dir.path().join("model.json.tmp").exists());
    }

    #[test]
    fn test_document_uses_expected_keys() {
        let doc = ModelDocument::capture(&agent(3));
        let value = serde_json::to_value(&doc).unwrap();
        for key in ["weights", "biases", "epsilon", "totalGames", "recentWinRates"] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(value["weights"][0].as_array().unwrap().len(), 18);
        assert_eq!(value["weights"][0][0].as_array().unwrap().len(), 9);
        assert_eq!(value["biases"][1].as_array().unwrap().len(), 9);
    }

    #[test]
    fn test_missing_keys_keep_current_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{ "epsilon": 0.25 }"#).unwrap();

        let mut live = agent(4);
        let params_before = live.network().params().clone();
        live.finish_episode(GameOutcome::Draw);
        live.load(&path).unwrap();

        assert_eq!(live.epsilon(), 0.25);
        assert_eq!(live.network().params(), &params_before);
        assert_eq!(live.episode_count(), 1);
    }

    #[test]
    fn test_smaller_arrays_merge_overlap_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.json");
        fs::write(
            &path,
            r#"{ "weights": [[[0.5, 0.25]]], "biases": [[], [0.75]], "totalGames": 42 }"#,
        )
        .unwrap();

        let mut live = agent(5);
        let before = live.network().params().clone();
        live.load(&path).unwrap();
        let after = live.network().params();

        assert_eq!(after.w1[0][0], 0.5);
        assert_eq!(after.w1[0][1], 0.25);
        assert_eq!(after.w1[0][2], before.w1[0][2]);
        assert_eq!(after.w1[5], before.w1[5]);
        assert_eq!(after.w2, before.w2);
        assert_eq!(after.b1, before.b1);
        assert_eq!(after.b2[0], 0.75);
        assert_eq!(after.b2[1], before.b2[1]);
        assert_eq!(live.episode_count(), 42);
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut live = agent(6);
        let before = live.network().params().clone();
        let err = live.load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, CheckpointError::Open { .. }), "got {err}");
        assert_eq!(live.network().params(), &before);
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let err = agent(7).load(&path).unwrap_err();
        assert!(matches!(err, CheckpointError::Parse { .. }), "got {err}");
    }
}
