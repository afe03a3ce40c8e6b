//! Progress read models.
//!
//! The dashboard, program summary, analytics and workout-day views all read
//! completion through `ProgressReporter`; none of them walk completion rows
//! themselves.

use crate::aggregate::{aggregate_with, AggregationScope, ProgramCompletion};
use crate::config::ScheduleConfig;
use crate::{BlockKind, CompletionIndex, ProgramDefinition};
use serde::Serialize;

/// Completion percentage of one day
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayProgress {
    pub week: u32,
    pub day: u32,
    pub completion_percentage: u8,
}

/// Completed vs prescribed count for one block
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlockCompletion {
    pub block_name: String,
    pub kind: BlockKind,
    pub completed_count: u32,
    pub total_count: u32,
    pub is_complete: bool,
}

/// Assigned vs completed tasks across the whole scope
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskTotals {
    pub total_tasks_assigned: u32,
    pub total_tasks_completed: u32,
}

impl TaskTotals {
    /// Fill level of the top-level progress bar
    pub fn percent(&self) -> u8 {
        crate::aggregate::completion_percent(self.total_tasks_completed, self.total_tasks_assigned)
    }
}

/// Current-day pointer with its month window
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentDayReport {
    pub current_day: u32,
    pub week: Option<u32>,
    pub day: Option<u32>,
    pub total_program_days: u32,
    pub month_progress_percent: u8,
}

/// Program summary consumed by the dashboard header
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgramProgress {
    pub current_day: u32,
    pub total_program_days: u32,
    pub month_progress_percent: u8,
    pub total_tasks_assigned: u32,
    pub total_tasks_completed: u32,
    pub total_blocks: u32,
    pub completed_blocks: u32,
}

/// One day row of the week screen
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeekDay {
    pub day: u32,
    pub day_name: String,
    pub is_deload: bool,
    pub is_test_week: bool,
    pub completion_percentage: u8,
}

/// Week screen: every day plus the day to suggest next
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeekReport {
    pub week: u32,
    pub days: Vec<WeekDay>,
    pub upcoming_day: Option<u32>,
}

/// Month-window progress for the current day
///
/// Months are fixed windows of `days_per_month` days; the current day itself
/// counts as progress within its window.
pub fn month_progress_percent(current_day: u32, total_days: u32, days_per_month: u32) -> u8 {
    if days_per_month == 0 {
        return 0;
    }

    let (current, total, per_month) = (
        i64::from(current_day),
        i64::from(total_days),
        i64::from(days_per_month),
    );

    let month = (current + per_month - 1) / per_month;
    let start = (month - 1) * per_month + 1;
    let end = (month * per_month).min(total);
    let span = end - start + 1;
    if span <= 0 {
        return 0;
    }

    let done = (current - start + 1).clamp(0, span);
    ((done * 200 + span) / (span * 2)).min(100) as u8
}

/// Aggregate and wrap in a reporter in one step
pub fn report(
    tree: &ProgramDefinition,
    index: &CompletionIndex,
    scope: &AggregationScope,
    schedule: &ScheduleConfig,
) -> ProgressReporter {
    ProgressReporter::new(aggregate_with(tree, index, scope, schedule), schedule.clone())
}

/// Formats aggregated completion into the read models consumers need
#[derive(Clone, Debug)]
pub struct ProgressReporter {
    progress: ProgramCompletion,
    schedule: ScheduleConfig,
}

impl ProgressReporter {
    pub fn new(progress: ProgramCompletion, schedule: ScheduleConfig) -> Self {
        Self { progress, schedule }
    }

    /// Underlying aggregation
    pub fn completion(&self) -> &ProgramCompletion {
        &self.progress
    }

    /// Per-day percentages for non-empty days, in walk order
    pub fn day_percentages(&self) -> Vec<DayProgress> {
        self.progress
            .days()
            .filter(|d| !d.is_empty())
            .map(|d| DayProgress {
                week: d.week,
                day: d.day,
                completion_percentage: d.completion_percent,
            })
            .collect()
    }

    pub fn day_percentage(&self, week: u32, day: u32) -> Option<DayProgress> {
        self.progress.day(week, day).map(|d| DayProgress {
            week: d.week,
            day: d.day,
            completion_percentage: d.completion_percent,
        })
    }

    pub fn current_day_report(&self) -> CurrentDayReport {
        let current = &self.progress.current_day;
        CurrentDayReport {
            current_day: current.ordinal,
            week: current.week,
            day: current.day,
            total_program_days: self.progress.total_program_days,
            month_progress_percent: month_progress_percent(
                current.ordinal,
                self.progress.total_program_days,
                self.schedule.days_per_month,
            ),
        }
    }

    pub fn task_totals(&self) -> TaskTotals {
        TaskTotals {
            total_tasks_assigned: self.progress.total_tasks_assigned,
            total_tasks_completed: self.progress.total_tasks_completed,
        }
    }

    /// Block counts for one day; empty when the day is not in scope
    pub fn block_completions(&self, week: u32, day: u32) -> Vec<BlockCompletion> {
        self.progress
            .day(week, day)
            .map(|d| {
                d.blocks
                    .iter()
                    .map(|b| BlockCompletion {
                        block_name: b.block_name.clone(),
                        kind: b.kind,
                        completed_count: b.completed_count,
                        total_count: b.total_count,
                        is_complete: b.is_complete(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn program_progress(&self) -> ProgramProgress {
        let current = self.current_day_report();
        let totals = self.task_totals();
        ProgramProgress {
            current_day: current.current_day,
            total_program_days: current.total_program_days,
            month_progress_percent: current.month_progress_percent,
            total_tasks_assigned: totals.total_tasks_assigned,
            total_tasks_completed: totals.total_tasks_completed,
            total_blocks: self.progress.total_blocks,
            completed_blocks: self.progress.completed_blocks,
        }
    }

    /// Week screen model; None when the week is not in scope
    pub fn week_report(&self, week: u32) -> Option<WeekReport> {
        let week_completion = self.progress.week(week)?;

        let days = week_completion
            .days
            .iter()
            .map(|d| WeekDay {
                day: d.day,
                day_name: d.day_name.clone(),
                is_deload: d.is_deload,
                is_test_week: d.is_test_week,
                completion_percentage: d.completion_percent,
            })
            .collect();

        // Prefer a day not yet started, then one in progress, then the first
        let workouts: Vec<_> = week_completion.days.iter().filter(|d| !d.is_empty()).collect();
        let upcoming_day = workouts
            .iter()
            .find(|d| d.completion_percent == 0)
            .or_else(|| workouts.iter().find(|d| d.completion_percent < 100))
            .or_else(|| workouts.first())
            .map(|d| d.day);

        Some(WeekReport {
            week,
            days,
            upcoming_day,
        })
    }
}
