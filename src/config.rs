use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_QUESTIONS_FILE: &str = "questions.json";
pub const DEFAULT_SCORES_FILE: &str = "scores.json";
pub const DEFAULT_ANSWER_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_QUESTIONS_PER_SESSION: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub questions_path: PathBuf,
    pub scores_path: PathBuf,
    pub answer_timeout_secs: u64,
    pub questions_per_session: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            questions_path: PathBuf::from(DEFAULT_QUESTIONS_FILE),
            scores_path: PathBuf::from(DEFAULT_SCORES_FILE),
            answer_timeout_secs: DEFAULT_ANSWER_TIMEOUT_SECS,
            questions_per_session: DEFAULT_QUESTIONS_PER_SESSION,
        }
    }
}

impl Config {
    pub fn answer_timeout(&self) -> Duration {
        Duration::from_secs(self.answer_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.answer_timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "answer timeout must be at least one second".to_string(),
            ));
        }
        if self.questions_per_session == 0 {
            return Err(Error::InvalidConfig(
                "a session needs at least one question".to_string(),
            ));
        }
        Ok(())
    }
}
