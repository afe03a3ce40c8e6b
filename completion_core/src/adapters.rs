//! Completion source adapters.
//!
//! Each adapter turns one raw row shape into `CompletionEvent`s for a single
//! program. Rows that are incomplete or belong to another program are
//! dropped; nothing here fails on bad data.

use crate::{
    CompletionEvent, EngineSessionRow, ExerciseLogRow, MetconCompletionRow, ProgramId,
};

/// Normalizes one completion source into completion events
pub trait CompletionAdapter {
    type Row;

    fn normalize(&self, rows: &[Self::Row]) -> Vec<CompletionEvent>;
}

/// Per-set exercise logs
#[derive(Clone, Copy, Debug)]
pub struct ExerciseLogAdapter {
    program_id: ProgramId,
}

impl ExerciseLogAdapter {
    pub fn new(program_id: ProgramId) -> Self {
        Self { program_id }
    }

    fn event_for(&self, row: &ExerciseLogRow) -> Option<CompletionEvent> {
        // Only engine sessions have a null-program legacy form
        if row.program_id != Some(self.program_id) {
            return None;
        }

        let (Some(week), Some(day), Some(exercise_name)) =
            (row.week, row.day, row.exercise_name.as_deref().filter(|n| !n.is_empty()))
        else {
            tracing::warn!("Dropping exercise log missing week/day/exercise: {:?}", row);
            return None;
        };

        Some(CompletionEvent::Exercise {
            week,
            day,
            block: row.block.clone().filter(|b| !b.is_empty()),
            exercise_name: exercise_name.to_string(),
            set_number: row.set_number.filter(|n| *n > 0).unwrap_or(1),
        })
    }
}

impl CompletionAdapter for ExerciseLogAdapter {
    type Row = ExerciseLogRow;

    fn normalize(&self, rows: &[ExerciseLogRow]) -> Vec<CompletionEvent> {
        let events: Vec<_> = rows.iter().filter_map(|row| self.event_for(row)).collect();
        tracing::debug!(
            "Normalized {} of {} exercise log rows for program {}",
            events.len(),
            rows.len(),
            self.program_id
        );
        events
    }
}

/// Per-day metcon completions
#[derive(Clone, Copy, Debug)]
pub struct MetconAdapter {
    program_id: ProgramId,
}

impl MetconAdapter {
    pub fn new(program_id: ProgramId) -> Self {
        Self { program_id }
    }

    fn event_for(&self, row: &MetconCompletionRow) -> Option<CompletionEvent> {
        if !row.is_completed() {
            return None;
        }
        if row.completed_time().is_none() {
            tracing::debug!("Unrecognized completed_at {:?}, counting as done", row.completed_at);
        }

        let (Some(program_id), Some(week), Some(day), Some(metcon_id)) =
            (row.program_id, row.week, row.day, row.metcon_id)
        else {
            tracing::warn!("Dropping metcon completion missing key fields: {:?}", row);
            return None;
        };

        if program_id != self.program_id {
            return None;
        }

        Some(CompletionEvent::Metcon {
            program_id,
            week,
            day,
            metcon_id,
        })
    }
}

impl CompletionAdapter for MetconAdapter {
    type Row = MetconCompletionRow;

    fn normalize(&self, rows: &[MetconCompletionRow]) -> Vec<CompletionEvent> {
        let events: Vec<_> = rows.iter().filter_map(|row| self.event_for(row)).collect();
        tracing::debug!(
            "Normalized {} of {} metcon rows for program {}",
            events.len(),
            rows.len(),
            self.program_id
        );
        events
    }
}

/// Engine sessions, keyed by program day sequence number
///
/// Sessions with no program id predate program scoping and are attributed
/// to the program being aggregated.
#[derive(Clone, Copy, Debug)]
pub struct EngineAdapter {
    program_id: ProgramId,
}

impl EngineAdapter {
    pub fn new(program_id: ProgramId) -> Self {
        Self { program_id }
    }

    fn event_for(&self, row: &EngineSessionRow) -> Option<CompletionEvent> {
        if row.completed != Some(true) {
            return None;
        }

        match row.program_id {
            Some(id) if id != self.program_id => return None,
            None => tracing::trace!("Counting legacy engine session without program id"),
            Some(_) => {}
        }

        let Some(day_number) = row.program_day_number.filter(|n| *n > 0) else {
            tracing::warn!("Dropping engine session without day number: {:?}", row);
            return None;
        };

        Some(CompletionEvent::Engine {
            program_id: self.program_id,
            day_number,
        })
    }
}

impl CompletionAdapter for EngineAdapter {
    type Row = EngineSessionRow;

    fn normalize(&self, rows: &[EngineSessionRow]) -> Vec<CompletionEvent> {
        let events: Vec<_> = rows.iter().filter_map(|row| self.event_for(row)).collect();
        tracing::debug!(
            "Normalized {} of {} engine sessions for program {}",
            events.len(),
            rows.len(),
            self.program_id
        );
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(week: u32, day: u32, block: &str, name: &str, set: Option<u32>) -> ExerciseLogRow {
        ExerciseLogRow {
            program_id: Some(1),
            week: Some(week),
            day: Some(day),
            block: Some(block.into()),
            exercise_name: Some(name.into()),
            set_number: set,
        }
    }

    #[test]
    fn test_exercise_adapter_keys() {
        let rows = vec![
            log(1, 1, "STRENGTH", "Deadlift", None),
            log(1, 1, "STRENGTH", "Deadlift", Some(2)),
        ];

        let events = ExerciseLogAdapter::new(1).normalize(&rows);
        let keys: Vec<_> = events.iter().filter_map(|e| e.exercise_key()).collect();

        assert_eq!(keys, vec!["STRENGTH:Deadlift", "STRENGTH:Deadlift - Set 2"]);
    }

    #[test]
    fn test_exercise_adapter_drops_malformed_and_foreign_rows() {
        crate::logging::init_test();

        let mut missing_day = log(1, 1, "SKILLS", "Muscle Up", None);
        missing_day.day = None;
        let mut other_program = log(1, 1, "SKILLS", "Muscle Up", None);
        other_program.program_id = Some(2);
        let mut nameless = log(1, 1, "SKILLS", "Muscle Up", None);
        nameless.exercise_name = None;
        let mut no_program = log(1, 1, "SKILLS", "Muscle Up", None);
        no_program.program_id = None;

        let rows = vec![
            missing_day,
            other_program,
            nameless,
            no_program,
            log(1, 2, "SKILLS", "Muscle Up", None),
        ];
        let events = ExerciseLogAdapter::new(1).normalize(&rows);

        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_exercise_adapter_defaults_set_number() {
        let rows = vec![log(1, 1, "STRENGTH", "Press", Some(0))];
        let events = ExerciseLogAdapter::new(1).normalize(&rows);
        assert!(matches!(
            events[0],
            CompletionEvent::Exercise { set_number: 1, .. }
        ));
    }

    #[test]
    fn test_metcon_adapter_requires_completed_at() {
        let done = MetconCompletionRow {
            program_id: Some(1),
            week: Some(1),
            day: Some(3),
            metcon_id: Some(55),
            completed_at: Some("2024-03-04 18:30:00+00".into()),
        };
        let pending = MetconCompletionRow {
            completed_at: None,
            ..done.clone()
        };
        let foreign = MetconCompletionRow {
            program_id: Some(4),
            ..done.clone()
        };

        let events = MetconAdapter::new(1).normalize(&[done, pending, foreign]);
        assert_eq!(
            events,
            vec![CompletionEvent::Metcon {
                program_id: 1,
                week: 1,
                day: 3,
                metcon_id: 55
            }]
        );
    }

    #[test]
    fn test_engine_adapter_accepts_legacy_rows() {
        let rows = vec![
            EngineSessionRow {
                program_id: None,
                program_day_number: Some(4),
                completed: Some(true),
            },
            EngineSessionRow {
                program_id: Some(1),
                program_day_number: Some(5),
                completed: Some(true),
            },
            EngineSessionRow {
                program_id: Some(2),
                program_day_number: Some(6),
                completed: Some(true),
            },
            EngineSessionRow {
                program_id: Some(1),
                program_day_number: Some(7),
                completed: Some(false),
            },
            EngineSessionRow {
                program_id: Some(1),
                program_day_number: None,
                completed: Some(true),
            },
        ];

        let events = EngineAdapter::new(1).normalize(&rows);
        assert_eq!(
            events,
            vec![
                CompletionEvent::Engine {
                    program_id: 1,
                    day_number: 4
                },
                CompletionEvent::Engine {
                    program_id: 1,
                    day_number: 5
                },
            ]
        );
    }
}
