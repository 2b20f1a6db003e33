use crate::error::{Error, Result};
use crate::util::mean;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Player name to chronological session scores, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreBoard {
    entries: Vec<(String, Vec<u32>)>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, player: &str) -> Option<&[u32]> {
        self.entries
            .iter()
            .find(|(name, _)| name == player)
            .map(|(_, scores)| scores.as_slice())
    }

    pub fn push(&mut self, player: &str, score: u32) {
        match self.entries.iter_mut().find(|(name, _)| name == player) {
            Some((_, scores)) => scores.push(score),
            None => self.entries.push((player.to_string(), vec![score])),
        }
    }

    /// Replace a player's history in place, or append a new player.
    pub fn insert(&mut self, player: String, scores: Vec<u32>) {
        match self.entries.iter_mut().find(|(name, _)| *name == player) {
            Some((_, existing)) => *existing = scores,
            None => self.entries.push((player, scores)),
        }
    }

    pub fn remove(&mut self, player: &str) -> Option<Vec<u32>> {
        let idx = self.entries.iter().position(|(name, _)| name == player)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.entries
            .iter()
            .map(|(name, scores)| (name.as_str(), scores.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ScoreBoard {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, scores) in &self.entries {
            map.serialize_entry(name, scores)?;
        }
        map.end()
    }
}

struct ScoreBoardVisitor;

impl<'de> Visitor<'de> for ScoreBoardVisitor {
    type Value = ScoreBoard;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping player names to arrays of scores")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<ScoreBoard, A::Error> {
        let mut board = ScoreBoard::new();
        while let Some((name, scores)) = access.next_entry::<String, Vec<u32>>()? {
            board.insert(name, scores);
        }
        Ok(board)
    }
}

impl<'de> Deserialize<'de> for ScoreBoard {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(ScoreBoardVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub player: String,
    pub best: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStats {
    pub games: usize,
    pub average: f64,
    pub best: u32,
    pub worst: u32,
}

impl fmt::Display for PlayerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Games played: {}", self.games)?;
        writeln!(f, "Average score: {:.2}", self.average)?;
        writeln!(f, "Best score: {}", self.best)?;
        write!(f, "Worst score: {}", self.worst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    Cleared,
    NothingToClear,
}

/// Score history persisted as a single JSON file, rewritten on every change
#[derive(Debug, Clone)]
pub struct ScoreStore {
    path: PathBuf,
    board: ScoreBoard,
}

impl ScoreStore {
    pub fn empty<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            board: ScoreBoard::new(),
        }
    }

    /// Load the store at `path`. A missing file is an empty store.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no score file yet, starting empty");
                return Ok(Self::empty(path));
            }
            Err(e) => return Err(Error::from_read(path.to_path_buf(), e)),
        };

        let board: ScoreBoard = serde_json::from_slice(&bytes).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), players = board.len(), "scores loaded");

        Ok(Self {
            path: path.to_path_buf(),
            board,
        })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_vec_pretty(&self.board).map_err(write_failure)?;
        fs::write(&self.path, data)?;
        info!(path = %self.path.display(), players = self.board.len(), "scores saved");
        Ok(())
    }

    /// Append `score` to the player's history and persist.
    ///
    /// The in-memory history keeps the score even when the save fails.
    pub fn record_score(&mut self, player: &str, score: u32) -> Result<()> {
        self.board.push(player, score);
        self.save()
    }

    /// Drop every score for `player`, persisting only when something was removed.
    pub fn clear_player(&mut self, player: &str) -> Result<ClearOutcome> {
        match self.board.remove(player) {
            Some(_) => {
                self.save()?;
                Ok(ClearOutcome::Cleared)
            }
            None => Ok(ClearOutcome::NothingToClear),
        }
    }

    /// Best score per player, highest first. Equal bests keep store order.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .board
            .iter()
            .filter_map(|(player, scores)| {
                scores.iter().max().map(|best| LeaderboardEntry {
                    player: player.to_string(),
                    best: *best,
                })
            })
            .collect();
        // sort_by is stable
        entries.sort_by(|a, b| b.best.cmp(&a.best));
        entries
    }

    pub fn player_stats(&self, player: &str) -> Option<PlayerStats> {
        let scores = self.board.get(player)?;
        let as_f64: Vec<f64> = scores.iter().map(|s| f64::from(*s)).collect();
        Some(PlayerStats {
            games: scores.len(),
            average: mean(&as_f64)?,
            best: *scores.iter().max()?,
            worst: *scores.iter().min()?,
        })
    }

    pub fn history(&self, player: &str) -> Option<&[u32]> {
        self.board.get(player)
    }

    pub fn board(&self) -> &ScoreBoard {
        &self.board
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_failure(source: serde_json::Error) -> Error {
    Error::Io(std::io::Error::other(source))
}
