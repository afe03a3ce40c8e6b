//! Completion aggregation over a program tree.
//!
//! Walks weeks → days → blocks and scores each against a `CompletionIndex`:
//! - Regular blocks: unique logged exercise keys vs prescribed exercises
//! - Metcon ref: one task per day
//! - Engine ref: one task per day, keyed by (program, day sequence number)
//!
//! Days with nothing assigned are left out of program totals and the
//! current-day search. Missing weeks or days are skipped, never an error.

use crate::config::ScheduleConfig;
use crate::{BlockKind, CompletionIndex, DayDefinition, ProgramDefinition, ProgramId};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Which weeks of a program to aggregate
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WeekScope {
    /// Every week in the definition
    All,
    /// The weeks generated so far for the user
    Generated(Vec<u32>),
    /// A single week (week screen)
    Single(u32),
}

/// Program and week slice an aggregation covers
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregationScope {
    pub program_id: ProgramId,
    pub weeks: WeekScope,
}

impl AggregationScope {
    pub fn program(program_id: ProgramId) -> Self {
        Self {
            program_id,
            weeks: WeekScope::All,
        }
    }

    pub fn generated(program_id: ProgramId, weeks: Vec<u32>) -> Self {
        Self {
            program_id,
            weeks: WeekScope::Generated(weeks),
        }
    }

    pub fn week(program_id: ProgramId, week: u32) -> Self {
        Self {
            program_id,
            weeks: WeekScope::Single(week),
        }
    }

    /// Week numbers to walk, ascending and de-duplicated
    fn week_numbers(&self, tree: &ProgramDefinition) -> Vec<u32> {
        let mut weeks = match &self.weeks {
            WeekScope::All => return tree.week_numbers(),
            WeekScope::Generated(weeks) => weeks.clone(),
            WeekScope::Single(week) => vec![*week],
        };
        weeks.sort_unstable();
        weeks.dedup();
        weeks
    }
}

/// Completion state of one prescribed exercise set
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseStatus {
    pub name: String,
    pub set_number: u32,
    pub key: String,
    pub completed: bool,
}

/// Completion of one block on one day
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlockProgress {
    pub block_name: String,
    pub kind: BlockKind,
    /// Unique completions; may exceed `total_count` when extra sets are logged
    pub completed_count: u32,
    pub total_count: u32,
    pub exercises: Vec<ExerciseStatus>,
}

impl BlockProgress {
    pub fn is_complete(&self) -> bool {
        self.total_count > 0 && self.completed_count >= self.total_count
    }
}

/// Completion of one program day
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayCompletion {
    pub week: u32,
    pub day: u32,
    pub day_name: String,
    pub is_deload: bool,
    pub is_test_week: bool,
    pub blocks: Vec<BlockProgress>,
    pub total_exercises: u32,
    pub completed_exercises: u32,
    pub completion_percent: u8,
}

impl DayCompletion {
    /// Nothing assigned on this day
    pub fn is_empty(&self) -> bool {
        self.total_exercises == 0
    }

    pub fn is_complete(&self) -> bool {
        !self.is_empty() && self.completion_percent >= 100
    }
}

/// Completion of one week
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeekCompletion {
    pub week: u32,
    pub days: Vec<DayCompletion>,
}

/// Pointer to the day the user should train next
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentDay {
    /// 1-based position among non-empty days in scope
    pub ordinal: u32,
    pub week: Option<u32>,
    pub day: Option<u32>,
}

/// Aggregated completion for a program scope
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgramCompletion {
    pub program_id: ProgramId,
    pub weeks: Vec<WeekCompletion>,
    pub current_day: CurrentDay,
    /// Days in the whole definition, regardless of scope
    pub total_program_days: u32,
    pub total_tasks_assigned: u32,
    pub total_tasks_completed: u32,
    pub total_blocks: u32,
    pub completed_blocks: u32,
}

impl ProgramCompletion {
    pub fn week(&self, week: u32) -> Option<&WeekCompletion> {
        self.weeks.iter().find(|w| w.week == week)
    }

    pub fn day(&self, week: u32, day: u32) -> Option<&DayCompletion> {
        self.week(week)
            .and_then(|w| w.days.iter().find(|d| d.day == day))
    }

    /// All days in walk order
    pub fn days(&self) -> impl Iterator<Item = &DayCompletion> {
        self.weeks.iter().flat_map(|w| w.days.iter())
    }
}

/// Percentage of `completed` over `total`, rounded half up and capped at 100
pub fn completion_percent(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let (completed, total) = (u64::from(completed), u64::from(total));
    let rounded = (completed * 200 + total) / (total * 2);
    rounded.min(100) as u8
}

/// Aggregate with the default schedule (5 training days per week)
pub fn aggregate(
    tree: &ProgramDefinition,
    index: &CompletionIndex,
    scope: &AggregationScope,
) -> ProgramCompletion {
    aggregate_with(tree, index, scope, &ScheduleConfig::default())
}

/// Aggregate completion for every day in scope
pub fn aggregate_with(
    tree: &ProgramDefinition,
    index: &CompletionIndex,
    scope: &AggregationScope,
    schedule: &ScheduleConfig,
) -> ProgramCompletion {
    let mut weeks = Vec::new();

    for week in scope.week_numbers(tree) {
        let Some(week_def) = tree.week(week) else {
            tracing::debug!("Week {} not in program definition, skipping", week);
            continue;
        };

        let days = (1..=schedule.days_per_week)
            .filter_map(|day| week_def.day(day))
            .map(|day_def| score_day(scope.program_id, week, day_def, index))
            .collect();

        weeks.push(WeekCompletion { week, days });
    }

    let mut total_tasks_assigned = 0;
    let mut total_tasks_completed = 0;
    let mut total_blocks = 0;
    let mut completed_blocks = 0;

    for day in weeks.iter().flat_map(|w| w.days.iter()).filter(|d| !d.is_empty()) {
        total_tasks_assigned += day.total_exercises;
        total_tasks_completed += day.completed_exercises;

        for block in day.blocks.iter().filter(|b| b.total_count > 0) {
            total_blocks += 1;
            if block.is_complete() {
                completed_blocks += 1;
            }
        }
    }

    let current_day = find_current_day(&weeks);

    tracing::debug!(
        "Program {}: {}/{} tasks, {}/{} blocks, current day {}",
        scope.program_id,
        total_tasks_completed,
        total_tasks_assigned,
        completed_blocks,
        total_blocks,
        current_day.ordinal
    );

    ProgramCompletion {
        program_id: scope.program_id,
        weeks,
        current_day,
        total_program_days: tree.total_days(),
        total_tasks_assigned,
        total_tasks_completed,
        total_blocks,
        completed_blocks,
    }
}

/// Completion of a single day, or None when the day is not in the program
pub fn day_progress(
    tree: &ProgramDefinition,
    index: &CompletionIndex,
    program_id: ProgramId,
    week: u32,
    day: u32,
) -> Option<DayCompletion> {
    tree.day(week, day)
        .map(|day_def| score_day(program_id, week, day_def, index))
}

fn score_day(
    program_id: ProgramId,
    week: u32,
    day_def: &DayDefinition,
    index: &CompletionIndex,
) -> DayCompletion {
    let day = day_def.day;

    let metcon_done = day_def.metcon.as_ref().map(|metcon| {
        metcon
            .id
            .is_some_and(|id| index.is_metcon_complete(program_id, week, day, id))
    });
    let engine_done = day_def.engine.as_ref().map(|engine| {
        engine
            .day_number
            .is_some_and(|n| index.is_engine_complete(program_id, n))
    });

    // Prescribed keys per block name, so same-named blocks share one key set
    let mut prescribed: HashMap<&str, HashSet<String>> = HashMap::new();
    for block in day_def.regular_blocks() {
        let keys = prescribed.entry(block.block_name.as_str()).or_default();
        keys.extend(block.exercises.iter().map(|ex| ex.completion_key(&block.block_name)));
    }
    let mut claimed: HashSet<String> = HashSet::new();
    let mut seen_names: HashSet<&str> = HashSet::new();

    let blocks: Vec<BlockProgress> = day_def
        .blocks
        .iter()
        .map(|block| match block.kind {
            BlockKind::Regular => {
                let exercises: Vec<ExerciseStatus> = block
                    .exercises
                    .iter()
                    .map(|ex| {
                        let key = ex.completion_key(&block.block_name);
                        ExerciseStatus {
                            name: ex.name.clone(),
                            set_number: ex.set_number(),
                            completed: index.is_exercise_complete(
                                week,
                                day,
                                &block.block_name,
                                &key,
                            ),
                            key,
                        }
                    })
                    .collect();

                // Each logged key counts once per day
                let matched = exercises
                    .iter()
                    .filter(|ex| ex.completed && claimed.insert(ex.key.clone()))
                    .count();

                // Extra logged sets go to the first block with this name
                let extra = if seen_names.insert(block.block_name.as_str()) {
                    let own = prescribed.get(block.block_name.as_str());
                    index
                        .keys_in_block(week, day, &block.block_name)
                        .filter(|key| !own.is_some_and(|keys| keys.contains(*key)))
                        .count()
                } else {
                    0
                };

                BlockProgress {
                    block_name: block.block_name.clone(),
                    kind: block.kind,
                    completed_count: (matched + extra) as u32,
                    total_count: block.exercises.len() as u32,
                    exercises,
                }
            }
            BlockKind::Metcon => single_task_block(&block.block_name, block.kind, metcon_done),
            BlockKind::Engine => single_task_block(&block.block_name, block.kind, engine_done),
        })
        .collect();

    let mut total_exercises: u32 = blocks
        .iter()
        .filter(|b| b.kind == BlockKind::Regular)
        .map(|b| b.total_count)
        .sum();
    let mut completed_exercises: u32 = blocks
        .iter()
        .filter(|b| b.kind == BlockKind::Regular)
        .map(|b| b.completed_count)
        .sum();

    for done in [metcon_done, engine_done].into_iter().flatten() {
        total_exercises += 1;
        if done {
            completed_exercises += 1;
        }
    }

    DayCompletion {
        week,
        day,
        day_name: day_def.day_name.clone(),
        is_deload: day_def.is_deload,
        is_test_week: day_def.is_test_week,
        blocks,
        total_exercises,
        completed_exercises,
        completion_percent: completion_percent(completed_exercises, total_exercises),
    }
}

/// Metcon/engine blocks count as one task when the day carries the matching ref
fn single_task_block(block_name: &str, kind: BlockKind, done: Option<bool>) -> BlockProgress {
    BlockProgress {
        block_name: block_name.to_string(),
        kind,
        completed_count: u32::from(done == Some(true)),
        total_count: u32::from(done.is_some()),
        exercises: Vec::new(),
    }
}

/// First non-empty day below 100%, walking weeks then days in order
fn find_current_day(weeks: &[WeekCompletion]) -> CurrentDay {
    let mut completed_days = 0;
    let mut last_complete = None;

    for day in weeks.iter().flat_map(|w| w.days.iter()).filter(|d| !d.is_empty()) {
        if day.is_complete() {
            completed_days += 1;
            last_complete = Some(day);
        } else {
            return CurrentDay {
                ordinal: completed_days + 1,
                week: Some(day.week),
                day: Some(day.day),
            };
        }
    }

    CurrentDay {
        ordinal: completed_days.max(1),
        week: last_complete.map(|d| d.week),
        day: last_complete.map(|d| d.day),
    }
}
