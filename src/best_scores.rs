//! Best score per difficulty tier
//!
//! Stored as a plain integer string under `bestScore_<tier>`.

use crate::error::StorageError;
use crate::persistence::Storage;
use crate::sim::Difficulty;

/// Best-score records backed by a `Storage`
#[derive(Debug, Clone)]
pub struct BestScores<S: Storage> {
    storage: S,
}

impl<S: Storage> BestScores<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn key(difficulty: Difficulty) -> String {
        format!("bestScore_{}", difficulty.as_str())
    }

    /// Stored best, if any
    pub fn get(&self, difficulty: Difficulty) -> Option<u32> {
        let raw = self.storage.get(&Self::key(difficulty))?;
        match raw.trim().parse() {
            Ok(best) => Some(best),
            Err(_) => {
                log::warn!("Ignoring malformed best score '{}' for {}", raw, difficulty);
                None
            }
        }
    }

    /// Keep `score` if it beats the record; returns whether it did
    pub fn record(&mut self, difficulty: Difficulty, score: u32) -> Result<bool, StorageError> {
        let is_record = self.get(difficulty).is_none_or(|best| score > best);
        if is_record {
            self.storage
                .set(&Self::key(difficulty), &score.to_string())?;
            log::info!("New best for {}: {}", difficulty, score);
        }
        Ok(is_record)
    }

    pub fn clear(&mut self, difficulty: Difficulty) {
        self.storage.remove(&Self::key(difficulty));
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_first_score_is_record() {
        let mut best = BestScores::new(MemoryStorage::new());
        assert_eq!(best.get(Difficulty::Easy), None);
        assert!(best.record(Difficulty::Easy, 120).unwrap());
        assert_eq!(best.get(Difficulty::Easy), Some(120));
        assert_eq!(best.storage().get("bestScore_easy").as_deref(), Some("120"));
    }

    #[test]
    fn test_only_higher_replaces() {
        let mut best = BestScores::new(MemoryStorage::new());
        best.record(Difficulty::Hard, 800).unwrap();
        assert!(!best.record(Difficulty::Hard, 800).unwrap());
        assert!(!best.record(Difficulty::Hard, 500).unwrap());
        assert!(best.record(Difficulty::Hard, 801).unwrap());
        assert_eq!(best.get(Difficulty::Hard), Some(801));
    }

    #[test]
    fn test_tiers_are_independent() {
        let mut best = BestScores::new(MemoryStorage::new());
        best.record(Difficulty::Normal, 600).unwrap();
        assert_eq!(best.get(Difficulty::Easy), None);
        best.clear(Difficulty::Normal);
        assert_eq!(best.get(Difficulty::Normal), None);
    }

    #[test]
    fn test_malformed_value_is_replaced() {
        let mut storage = MemoryStorage::new();
        storage.set("bestScore_easy", "lots").unwrap();
        let mut best = BestScores::new(storage);
        assert_eq!(best.get(Difficulty::Easy), None);
        assert!(best.record(Difficulty::Easy, 10).unwrap());
    }
}
