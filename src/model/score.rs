use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{GameError, Result};

/// Last and best score read back from the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreSummary {
    pub last: u32,
    pub highest: u32,
}

/// Append-only log of winning scores, one unsigned integer per entry
#[derive(Debug, Clone)]
pub struct ScoreLog {
    path: PathBuf,
}

impl ScoreLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every score in the log.
    ///
    /// Returns `Ok(None)` when the file is missing or holds no valid entry.
    /// Tokens that are not unsigned integers are skipped.
    pub fn load(&self) -> Result<Option<ScoreSummary>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("score log {} not found", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(GameError::io(&self.path, e)),
        };

        let scores = parse_scores(&text);
        let (Some(&last), Some(&highest)) = (scores.last(), scores.iter().max()) else {
            return Ok(None);
        };

        Ok(Some(ScoreSummary { last, highest }))
    }

    /// Append one score as a new line
    pub fn append(&self, score: u32) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| GameError::io(dir, e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| GameError::io(&self.path, e))?;
        write!(file, "\n{score}").map_err(|e| GameError::io(&self.path, e))?;
        Ok(())
    }
}

fn parse_scores(text: &str) -> Vec<u32> {
    text.split_whitespace()
        .filter_map(|token| match token.parse::<u32>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("skipping malformed score entry {token:?}");
                None
            }
        })
        .collect()
}
