//! In-memory cassette that is flushed to YAML once the run is over.

use std::path::PathBuf;

use chrono::Utc;

use super::format::{Cassette, Interaction};

/// Accumulates interactions in memory and writes them as one YAML cassette.
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    cassette: Cassette,
}

impl CassetteRecorder {
    /// Start an empty recording destined for `path`.
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        commit: impl Into<String>,
    ) -> Self {
        let cassette = Cassette {
            name: name.into(),
            recorded_at: Utc::now(),
            commit: commit.into(),
            interactions: Vec::new(),
        };
        Self { path: path.into(), cassette }
    }

    /// Append an interaction; its `seq` is its position in the recording.
    pub fn record(
        &mut self,
        port: impl Into<String>,
        method: impl Into<String>,
        input: serde_json::Value,
        output: serde_json::Value,
    ) {
        let interactions = &mut self.cassette.interactions;
        interactions.push(Interaction {
            seq: interactions.len() as u64,
            port: port.into(),
            method: method.into(),
            input,
            output,
        });
    }

    /// Stamp the finish time and write the cassette, creating parent
    /// directories. Returns the path written.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette cannot be serialized or written.
    pub fn finish(mut self) -> Result<PathBuf, std::io::Error> {
        self.cassette.recorded_at = Utc::now();
        let yaml = serde_yaml::to_string(&self.cassette).map_err(std::io::Error::other)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, yaml)?;
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn finish_writes_nested_path_with_ordered_seqs() {
        let dir = std::env::temp_dir().join("snapedit_cassette_test");
        let path = dir.join("2026-10-16T09-12-44").join("image_editor.cassette.yaml");

        let mut recorder = CassetteRecorder::new(&path, "shoe-edits", "deadbeef");
        recorder.record(
            "image_editor",
            "edit",
            json!({"instruction": "remove background"}),
            json!({"Ok": {"data": "AQID", "mime_type": "image/png"}}),
        );
        recorder.record(
            "image_editor",
            "edit",
            json!({"instruction": "retro style"}),
            json!({"Err": {"category": "Upstream", "message": "API error (429): quota"}}),
        );

        assert_eq!(recorder.finish().unwrap(), path);

        let cassette: Cassette =
            serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(cassette.name, "shoe-edits");
        assert_eq!(cassette.commit, "deadbeef");
        let seqs: Vec<u64> = cassette.interactions.iter().map(|i| i.seq).collect();
        assert_eq!(seqs, vec![0, 1]);
        assert_eq!(cassette.interactions[1].input["instruction"], "retro style");
        assert_eq!(cassette.interactions[1].output["Err"]["category"], "Upstream");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_recording_still_writes_a_cassette() {
        let dir = std::env::temp_dir().join("snapedit_cassette_empty_test");
        let path = dir.join("empty.cassette.yaml");

        CassetteRecorder::new(&path, "empty", "unknown").finish().unwrap();

        let cassette: Cassette =
            serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(cassette.interactions.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
