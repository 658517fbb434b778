use uuid::Uuid;

use super::repo_types::{MealEntry, MealSource, MealStats};

/// Append-only meal history for the session; insertion order is chronological.
#[derive(Debug, Clone, Default)]
pub struct MealLog {
    entries: Vec<MealEntry>,
}

impl MealLog {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: MealEntry) {
        self.entries.push(entry);
    }

    /// Last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> &[MealEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn get(&self, id: Uuid) -> Option<&MealEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn entries(&self) -> &[MealEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn aggregate(&self) -> MealStats {
        let count = self.entries.len();
        let photo_count = self
            .entries
            .iter()
            .filter(|e| e.source() == MealSource::Photo)
            .count();
        if self.is_empty() {
            return MealStats {
                count,
                average_carbs: 0.0,
                average_estimate: 0.0,
                photo_count,
            };
        }

        let (carbs, units) = self
            .entries
            .iter()
            .fold((0.0, 0.0), |(c, u), e| (c + e.carbs(), u + e.estimate().total()));
        MealStats {
            count,
            average_carbs: carbs / count as f64,
            average_estimate: units / count as f64,
            photo_count,
        }
    }
}
