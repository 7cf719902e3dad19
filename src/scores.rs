use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim, WriterBuilder};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CAPACITY: usize = 10;
pub const NAME_LEN: usize = 3;
const SCORES_DIR: &str = "pathsnake";
const SCORES_FILE: &str = "scores.csv";
const HEADER: [&str; 2] = ["Name", " Points"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Points")]
    pub score: u32,
}

impl ScoreEntry {
    pub fn new(name: &str, score: u32) -> Self {
        ScoreEntry { name: name.chars().take(NAME_LEN).collect(), score }
    }
}

/// Top-N high score list, saved to a delimited text file on every change.
#[derive(Debug)]
pub struct ScoreTable {
    entries: Vec<ScoreEntry>,
    capacity: usize,
    path: Option<PathBuf>,
}

impl ScoreTable {
    /// Loads `path` if it can. A missing or unreadable file is an empty table.
    pub fn load<P: Into<PathBuf>>(path: P, capacity: usize) -> Self {
        let path = path.into();
        let entries = match read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not load scores from {}: {}", path.display(), e);
                vec![]
            }
        };

        let mut table = ScoreTable { entries, capacity, path: Some(path) };
        table.arrange();
        table
    }

    /// A table that is never written anywhere.
    pub fn in_memory(capacity: usize) -> Self {
        ScoreTable { entries: vec![], capacity, path: None }
    }

    /// `<user config dir>/pathsnake/scores.csv`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(SCORES_DIR).join(SCORES_FILE))
    }

    pub fn add_score(&mut self, score: u32, name: &str) {
        self.entries.push(ScoreEntry::new(name, score));
        self.arrange();
        self.save();
    }

    /// `(rank, name, score)` for the best `n` entries, ranks starting at 1.
    pub fn top_scores(&self, n: usize) -> Vec<(usize, &str, u32)> {
        self.entries
            .iter()
            .take(n)
            .enumerate()
            .map(|(i, e)| (i + 1, e.name.as_str(), e.score))
            .collect()
    }

    /// Lowest score still on the table, or 0 while there is room for more.
    pub fn bottom_score(&self) -> u32 {
        if self.entries.len() < self.capacity {
            return 0;
        }

        self.entries.last().map_or(0, |e| e.score)
    }

    pub fn qualifies(&self, score: u32) -> bool {
        score > self.bottom_score()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    ///////////////////////////////////////////////////////////////////////////

    fn arrange(&mut self) {
        // Stable, so equal scores keep their arrival order
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(self.capacity);
    }

    fn save(&self) {
        if let Some(path) = &self.path {
            match write_entries(path, &self.entries) {
                Ok(()) => debug!("Saved {} scores to {}", self.entries.len(), path.display()),
                Err(e) => warn!("Could not save scores to {}: {}", path.display(), e),
            }
        }
    }
}

fn read_entries(path: &Path) -> csv::Result<Vec<ScoreEntry>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_path(path)?;

    reader
        .deserialize()
        .map(|record: csv::Result<ScoreEntry>| record.map(|e| ScoreEntry::new(&e.name, e.score)))
        .collect()
}

fn write_entries(path: &Path, entries: &[ScoreEntry]) -> csv::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    // The header keeps its space, so it is written by hand
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(&HEADER)?;
    for e in entries {
        writer.serialize(e)?;
    }

    writer.flush()?;
    Ok(())
}
