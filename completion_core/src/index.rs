//! Completion index.
//!
//! Built once per request from normalized events and never mutated after
//! construction. All membership queries are O(1).

use crate::{CompletionEvent, MetconId, ProgramId};
use std::collections::{HashMap, HashSet};

/// Block bucket for exercise logs recorded without a block name
pub const UNKNOWN_BLOCK: &str = "unknown";

/// Key identifying a completed metcon: `{program}-{week}-{day}-{metcon}`
pub fn metcon_key(program_id: ProgramId, week: u32, day: u32, metcon_id: MetconId) -> String {
    format!("{}-{}-{}-{}", program_id, week, day, metcon_id)
}

/// Lookup structures over every completion for one program
#[derive(Clone, Debug, Default)]
pub struct CompletionIndex {
    /// (week, day) -> block -> unique exercise keys
    exercises: HashMap<(u32, u32), HashMap<String, HashSet<String>>>,
    metcons: HashSet<String>,
    engine: HashSet<(ProgramId, u32)>,
}

impl CompletionIndex {
    /// Group events by kind into key sets
    pub fn build<I>(events: I) -> Self
    where
        I: IntoIterator<Item = CompletionEvent>,
    {
        let mut index = Self::default();

        for event in events {
            match event {
                CompletionEvent::Exercise {
                    week,
                    day,
                    block,
                    exercise_name,
                    set_number,
                } => {
                    let key = crate::exercise_key(block.as_deref(), &exercise_name, set_number);
                    let bucket = block.unwrap_or_else(|| UNKNOWN_BLOCK.to_string());
                    index
                        .exercises
                        .entry((week, day))
                        .or_default()
                        .entry(bucket)
                        .or_default()
                        .insert(key);
                }
                CompletionEvent::Metcon {
                    program_id,
                    week,
                    day,
                    metcon_id,
                } => {
                    index
                        .metcons
                        .insert(metcon_key(program_id, week, day, metcon_id));
                }
                CompletionEvent::Engine {
                    program_id,
                    day_number,
                } => {
                    index.engine.insert((program_id, day_number));
                }
            }
        }

        tracing::debug!(
            "Built completion index: {} exercise keys, {} metcons, {} engine sessions",
            index.exercise_key_count(),
            index.metcons.len(),
            index.engine.len()
        );

        index
    }

    /// Unique exercise keys logged against a block on a day
    pub fn completed_in_block(&self, week: u32, day: u32, block: &str) -> usize {
        self.block_keys(week, day, block).map_or(0, HashSet::len)
    }

    /// Unique exercise keys logged against a block on a day
    pub fn keys_in_block(&self, week: u32, day: u32, block: &str) -> impl Iterator<Item = &str> + '_ {
        self.block_keys(week, day, block)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn is_exercise_complete(&self, week: u32, day: u32, block: &str, key: &str) -> bool {
        self.block_keys(week, day, block)
            .is_some_and(|keys| keys.contains(key))
    }

    pub fn is_metcon_complete(
        &self,
        program_id: ProgramId,
        week: u32,
        day: u32,
        metcon_id: MetconId,
    ) -> bool {
        self.metcons
            .contains(&metcon_key(program_id, week, day, metcon_id))
    }

    pub fn is_engine_complete(&self, program_id: ProgramId, day_number: u32) -> bool {
        self.engine.contains(&(program_id, day_number))
    }

    pub fn exercise_key_count(&self) -> usize {
        self.exercises
            .values()
            .flat_map(HashMap::values)
            .map(HashSet::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty() && self.metcons.is_empty() && self.engine.is_empty()
    }

    fn block_keys(&self, week: u32, day: u32, block: &str) -> Option<&HashSet<String>> {
        self.exercises.get(&(week, day)).and_then(|blocks| blocks.get(block))
    }
}
