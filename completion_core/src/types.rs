//! Core domain types for program completion tracking.
//!
//! This module defines:
//! - The program definition tree (weeks, days, blocks, exercises)
//! - Raw completion rows as exported from the three completion sources
//! - The normalized `CompletionEvent` every adapter produces

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a generated program
pub type ProgramId = i64;

/// Identifier of a metcon workout referenced from a program day
pub type MetconId = i64;

// ============================================================================
// Program Definition
// ============================================================================

/// How a block's completion is tracked
///
/// Resolved once from the block name when the program is loaded.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Per-exercise, per-set logs
    Regular,
    /// Single completion per day via the day's metcon ref
    Metcon,
    /// Single completion per day via the day's engine ref
    Engine,
}

impl BlockKind {
    /// Classify a block by name (case-insensitive, surrounding whitespace ignored)
    pub fn from_block_name(name: &str) -> Self {
        match name.trim().to_uppercase().as_str() {
            "METCONS" => BlockKind::Metcon,
            "ENGINE" => BlockKind::Engine,
            _ => BlockKind::Regular,
        }
    }
}

/// A single prescribed exercise (one row per set for multi-set lifts)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseDefinition {
    pub name: String,
    pub sets: Option<u32>,
    pub reps: Option<String>,
    pub weight_time: Option<String>,
    pub notes: Option<String>,
}

impl ExerciseDefinition {
    /// Set index embedded in the notes as `Set N`, defaulting to 1
    pub fn set_number(&self) -> u32 {
        self.notes
            .as_deref()
            .and_then(parse_set_marker)
            .unwrap_or(1)
    }

    /// Completion key this exercise is logged under within `block`
    pub fn completion_key(&self, block: &str) -> String {
        exercise_key(Some(block), &self.name, self.set_number())
    }
}

/// Find the first `Set <digits>` marker in free text
fn parse_set_marker(notes: &str) -> Option<u32> {
    notes.match_indices("Set ").find_map(|(idx, marker)| {
        let rest = &notes[idx + marker.len()..];
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    })
}

/// Build the de-duplication key for a logged exercise set
///
/// `{block}:{exercise}` for the first set, `{block}:{exercise} - Set {n}` for
/// later sets. Without a block the exercise name alone is the base.
pub fn exercise_key(block: Option<&str>, exercise_name: &str, set_number: u32) -> String {
    let base = match block {
        Some(block) => format!("{}:{}", block, exercise_name),
        None => exercise_name.to_string(),
    };

    if set_number > 1 {
        format!("{} - Set {}", base, set_number)
    } else {
        base
    }
}

/// A named group of exercises within a day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockDefinition {
    pub block_name: String,
    pub kind: BlockKind,
    pub exercises: Vec<ExerciseDefinition>,
}

/// Reference to the metcon assigned to a day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetconRef {
    pub id: Option<MetconId>,
    pub workout_id: Option<String>,
}

/// Reference to the engine session assigned to a day
///
/// `day_number` is a program-wide sequence number, unrelated to week/day.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EngineRef {
    pub day_number: Option<u32>,
}

/// A training day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayDefinition {
    pub day: u32,
    pub day_name: String,
    pub is_deload: bool,
    pub is_test_week: bool,
    pub blocks: Vec<BlockDefinition>,
    pub metcon: Option<MetconRef>,
    pub engine: Option<EngineRef>,
}

impl DayDefinition {
    /// Blocks tracked through per-exercise logs
    pub fn regular_blocks(&self) -> impl Iterator<Item = &BlockDefinition> {
        self.blocks.iter().filter(|b| b.kind == BlockKind::Regular)
    }
}

/// A training week
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeekDefinition {
    pub week: u32,
    pub days: Vec<DayDefinition>,
}

impl WeekDefinition {
    pub fn day(&self, day: u32) -> Option<&DayDefinition> {
        self.days.iter().find(|d| d.day == day)
    }
}

/// The generated program tree
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgramDefinition {
    pub weeks: Vec<WeekDefinition>,
}

impl ProgramDefinition {
    /// True when there is nothing to aggregate (render zero-state)
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn week(&self, week: u32) -> Option<&WeekDefinition> {
        self.weeks.iter().find(|w| w.week == week)
    }

    pub fn day(&self, week: u32, day: u32) -> Option<&DayDefinition> {
        self.week(week).and_then(|w| w.day(day))
    }

    /// Number of days across every week in the definition
    pub fn total_days(&self) -> u32 {
        self.weeks.iter().map(|w| w.days.len() as u32).sum()
    }

    /// Week numbers in ascending order
    pub fn week_numbers(&self) -> Vec<u32> {
        let mut weeks: Vec<u32> = self.weeks.iter().map(|w| w.week).collect();
        weeks.sort_unstable();
        weeks.dedup();
        weeks
    }
}

// ============================================================================
// Raw Completion Rows
// ============================================================================

// Every field is optional so a row with holes still deserializes and can be
// dropped by its adapter instead of failing the whole batch.

/// One logged exercise set
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ExerciseLogRow {
    pub program_id: Option<ProgramId>,
    pub week: Option<u32>,
    pub day: Option<u32>,
    pub block: Option<String>,
    pub exercise_name: Option<String>,
    pub set_number: Option<u32>,
}

/// One metcon result for a program day
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MetconCompletionRow {
    pub program_id: Option<ProgramId>,
    pub week: Option<u32>,
    pub day: Option<u32>,
    pub metcon_id: Option<MetconId>,
    /// Kept as text: any non-empty value marks the metcon done
    pub completed_at: Option<String>,
}

impl MetconCompletionRow {
    pub fn is_completed(&self) -> bool {
        self.completed_at
            .as_deref()
            .is_some_and(|at| !at.trim().is_empty())
    }

    /// Completion time in RFC 3339 or Postgres text form (`2024-03-04 18:30:00+00`)
    pub fn completed_time(&self) -> Option<DateTime<Utc>> {
        let at = self.completed_at.as_deref()?.trim();
        DateTime::parse_from_rfc3339(at)
            .or_else(|_| DateTime::parse_from_str(at, "%Y-%m-%d %H:%M:%S%.f%#z"))
            .map(|t| t.with_timezone(&Utc))
            .ok()
    }
}

/// One engine (conditioning) session
///
/// `program_id` is null for sessions logged before sessions were
/// program-scoped.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineSessionRow {
    pub program_id: Option<ProgramId>,
    pub program_day_number: Option<u32>,
    pub completed: Option<bool>,
}

// ============================================================================
// Normalized Completion Events
// ============================================================================

/// Source kind of a completion event
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CompletionKind {
    Exercise,
    Metcon,
    Engine,
}

/// A completion normalized from any of the three sources
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompletionEvent {
    Exercise {
        week: u32,
        day: u32,
        block: Option<String>,
        exercise_name: String,
        set_number: u32,
    },
    Metcon {
        program_id: ProgramId,
        week: u32,
        day: u32,
        metcon_id: MetconId,
    },
    Engine {
        program_id: ProgramId,
        day_number: u32,
    },
}

impl CompletionEvent {
    pub fn kind(&self) -> CompletionKind {
        match self {
            CompletionEvent::Exercise { .. } => CompletionKind::Exercise,
            CompletionEvent::Metcon { .. } => CompletionKind::Metcon,
            CompletionEvent::Engine { .. } => CompletionKind::Engine,
        }
    }

    /// Exercise de-duplication key (exercise events only)
    pub fn exercise_key(&self) -> Option<String> {
        match self {
            CompletionEvent::Exercise {
                block,
                exercise_name,
                set_number,
                ..
            } => Some(exercise_key(block.as_deref(), exercise_name, *set_number)),
            _ => None,
        }
    }
}
