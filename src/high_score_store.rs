use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Best-effort persistence of the all-time high score. Failures never reach
/// the caller.
pub trait HighScoreStore: Send {
    fn load(&mut self) -> i32;
    fn save(&mut self, high_score: i32);
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct HighScoreFile {
    version: u8,
    #[serde(rename = "highScore", alias = "high_score")]
    high_score: i32,
    #[serde(rename = "updatedAtIso", alias = "updated_at_iso", default)]
    updated_at_iso: String,
}

pub struct JsonHighScoreStore {
    file_path: PathBuf,
}

impl JsonHighScoreStore {
    pub fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

impl HighScoreStore for JsonHighScoreStore {
    fn load(&mut self) -> i32 {
        load_high_score(&self.file_path)
    }

    fn save(&mut self, high_score: i32) {
        if let Some(parent) = self.file_path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                eprintln!(
                    "[high-score-store] failed to create parent dir {}: {error}",
                    parent.display()
                );
                return;
            }
        }

        let payload = HighScoreFile {
            version: 1,
            high_score: high_score.max(0),
            updated_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(text) => {
                if let Err(error) = fs::write(&self.file_path, text) {
                    eprintln!(
                        "[high-score-store] failed to write {}: {error}",
                        self.file_path.display()
                    );
                }
            }
            Err(error) => {
                eprintln!(
                    "[high-score-store] failed to serialize payload for {}: {error}",
                    self.file_path.display()
                );
            }
        }
    }
}

fn load_high_score(path: &Path) -> i32 {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                eprintln!("[high-score-store] failed to read {}: {error}", path.display());
            }
            return 0;
        }
    };
    match serde_json::from_str::<HighScoreFile>(&text) {
        Ok(file) if file.version == 1 => file.high_score.max(0),
        Ok(file) => {
            eprintln!(
                "[high-score-store] unsupported version {} at {}",
                file.version,
                path.display()
            );
            0
        }
        Err(error) => {
            eprintln!(
                "[high-score-store] failed to parse {}: {error}",
                path.display()
            );
            0
        }
    }
}

/// Process-local store for tests and headless runs.
#[derive(Clone, Debug, Default)]
pub struct MemoryHighScoreStore {
    pub value: i32,
    pub saves: u32,
}

impl MemoryHighScoreStore {
    pub fn with_value(value: i32) -> Self {
        Self { value, saves: 0 }
    }
}

impl HighScoreStore for MemoryHighScoreStore {
    fn load(&mut self) -> i32 {
        self.value
    }

    fn save(&mut self, high_score: i32) {
        self.value = high_score;
        self.saves += 1;
    }
}
