//! Program definition loading.
//!
//! Turns the stored program blob into a typed `ProgramDefinition`. Loading is
//! lenient: a missing `weeks` array is an empty program, and individual
//! weeks, days, blocks or exercises that fail to parse are skipped with a
//! warning. Only a `weeks` value of the wrong type is reported as an error.

use crate::{
    BlockDefinition, BlockKind, DayDefinition, EngineRef, Error, ExerciseDefinition, MetconRef,
    ProgramDefinition, Result, WeekDefinition,
};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWeek {
    week: Value,
    days: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDay {
    day: Value,
    day_name: Option<String>,
    is_deload: Option<bool>,
    is_test_week: Option<bool>,
    blocks: Option<Vec<Value>>,
    metcon_data: Option<RawMetcon>,
    engine_data: Option<RawEngine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlock {
    block_name: Option<String>,
    exercises: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExercise {
    name: Option<String>,
    sets: Option<Value>,
    reps: Option<Value>,
    weight_time: Option<Value>,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMetcon {
    id: Option<Value>,
    workout_id: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEngine {
    day_number: Option<Value>,
}

/// Load a program definition from its stored JSON form
pub fn load(raw: &Value) -> Result<ProgramDefinition> {
    let weeks = match raw.get("weeks") {
        None | Some(Value::Null) => {
            tracing::debug!("Program data has no weeks, treating as empty");
            return Ok(ProgramDefinition::default());
        }
        Some(Value::Array(weeks)) => weeks,
        Some(other) => {
            return Err(Error::MalformedProgram(format!(
                "`weeks` must be an array, found {}",
                value_type(other)
            )));
        }
    };

    let weeks: Vec<WeekDefinition> = weeks
        .iter()
        .enumerate()
        .filter_map(|(idx, value)| {
            let week = parse_week(value);
            if week.is_none() {
                tracing::warn!("Skipping malformed week at index {}", idx);
            }
            week
        })
        .collect();

    tracing::debug!(
        "Loaded program with {} weeks, {} days",
        weeks.len(),
        weeks.iter().map(|w| w.days.len()).sum::<usize>()
    );

    Ok(ProgramDefinition { weeks })
}

/// Load a program definition from a JSON string
pub fn load_str(json: &str) -> Result<ProgramDefinition> {
    let raw: Value = serde_json::from_str(json)?;
    load(&raw)
}

/// Load a program definition from a JSON file
///
/// Accepts either the bare `program_data` object or a program row that wraps
/// it as `{ "program_data": { ... } }`.
pub fn load_file(path: &Path) -> Result<ProgramDefinition> {
    let contents = std::fs::read_to_string(path)?;
    let raw: Value = serde_json::from_str(&contents)?;
    let program = match raw.get("program_data") {
        Some(inner) => load(inner)?,
        None => load(&raw)?,
    };
    tracing::info!("Loaded program definition from {:?}", path);
    Ok(program)
}

fn parse_week(value: &Value) -> Option<WeekDefinition> {
    let raw = RawWeek::deserialize(value).ok()?;
    let week = as_u32(&raw.week)?;

    let days = raw
        .days
        .unwrap_or_default()
        .iter()
        .filter_map(|value| {
            let day = parse_day(value);
            if day.is_none() {
                tracing::warn!("Skipping malformed day in week {}", week);
            }
            day
        })
        .collect();

    Some(WeekDefinition { week, days })
}

fn parse_day(value: &Value) -> Option<DayDefinition> {
    let raw = RawDay::deserialize(value).ok()?;
    let day = as_u32(&raw.day)?;

    let blocks = raw
        .blocks
        .unwrap_or_default()
        .iter()
        .filter_map(|value| {
            let block = parse_block(value);
            if block.is_none() {
                tracing::warn!("Skipping malformed block on day {}", day);
            }
            block
        })
        .collect();

    let metcon = raw.metcon_data.map(|m| MetconRef {
        id: m.id.as_ref().and_then(as_i64),
        workout_id: m.workout_id.as_ref().and_then(as_text),
    });

    let engine = raw.engine_data.map(|e| EngineRef {
        day_number: e.day_number.as_ref().and_then(as_u32).filter(|n| *n > 0),
    });

    Some(DayDefinition {
        day,
        day_name: raw.day_name.unwrap_or_else(|| format!("Day {}", day)),
        is_deload: raw.is_deload.unwrap_or(false),
        is_test_week: raw.is_test_week.unwrap_or(false),
        blocks,
        metcon,
        engine,
    })
}

fn parse_block(value: &Value) -> Option<BlockDefinition> {
    let raw = RawBlock::deserialize(value).ok()?;
    let block_name = raw.block_name.unwrap_or_default();
    let kind = BlockKind::from_block_name(&block_name);

    // Metcon and engine blocks are tracked through the day's refs
    let exercises = match kind {
        BlockKind::Regular => raw
            .exercises
            .unwrap_or_default()
            .iter()
            .filter_map(|value| {
                let exercise = parse_exercise(value);
                if exercise.is_none() {
                    tracing::warn!("Skipping malformed exercise in block {}", block_name);
                }
                exercise
            })
            .collect(),
        BlockKind::Metcon | BlockKind::Engine => Vec::new(),
    };

    Some(BlockDefinition {
        block_name,
        kind,
        exercises,
    })
}

fn parse_exercise(value: &Value) -> Option<ExerciseDefinition> {
    let raw = RawExercise::deserialize(value).ok()?;
    Some(ExerciseDefinition {
        name: raw.name.unwrap_or_default(),
        sets: raw.sets.as_ref().and_then(as_u32),
        reps: raw.reps.as_ref().and_then(as_text),
        weight_time: raw.weight_time.as_ref().and_then(as_text),
        notes: raw.notes,
    })
}

/// Numbers arrive as JSON numbers or numeric strings
fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_full_day() {
        let raw = json!({
            "weeks": [{
                "week": 1,
                "days": [{
                    "day": 1,
                    "dayName": "Heavy Day",
                    "isDeload": false,
                    "blocks": [
                        {
                            "blockName": "STRENGTH AND POWER",
                            "exercises": [
                                { "name": "Back Squat", "sets": 1, "reps": 5, "weightTime": "225", "notes": "Advanced - Set 1" },
                                { "name": "Back Squat", "sets": "1", "reps": "5", "weightTime": "235", "notes": "Advanced - Set 2" }
                            ]
                        },
                        { "blockName": "METCONS", "exercises": [] },
                        { "blockName": "ENGINE" }
                    ],
                    "metconData": { "id": 42, "workoutId": "BTN-001" },
                    "engineData": { "dayNumber": 3 }
                }]
            }]
        });

        let program = load(&raw).unwrap();
        let day = program.day(1, 1).unwrap();

        assert_eq!(day.day_name, "Heavy Day");
        assert_eq!(day.blocks.len(), 3);
        assert_eq!(day.blocks[0].kind, BlockKind::Regular);
        assert_eq!(day.blocks[0].exercises.len(), 2);
        assert_eq!(day.blocks[0].exercises[1].sets, Some(1));
        assert_eq!(day.blocks[0].exercises[1].reps.as_deref(), Some("5"));
        assert_eq!(day.blocks[0].exercises[1].set_number(), 2);
        assert_eq!(day.blocks[1].kind, BlockKind::Metcon);
        assert_eq!(day.blocks[2].kind, BlockKind::Engine);
        assert_eq!(day.metcon.as_ref().unwrap().id, Some(42));
        assert_eq!(day.metcon.as_ref().unwrap().workout_id.as_deref(), Some("BTN-001"));
        assert_eq!(day.engine.as_ref().unwrap().day_number, Some(3));
    }

    #[test]
    fn test_missing_weeks_is_empty() {
        let program = load(&json!({})).unwrap();
        assert!(program.is_empty());

        let program = load(&json!({ "weeks": null })).unwrap();
        assert!(program.is_empty());

        let program = load(&Value::Null).unwrap();
        assert!(program.is_empty());
    }

    #[test]
    fn test_non_array_weeks_is_error() {
        let result = load(&json!({ "weeks": { "1": [] } }));
        assert!(matches!(result, Err(Error::MalformedProgram(_))));
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let raw = json!({
            "weeks": [
                "not a week",
                { "days": [] },
                {
                    "week": 2,
                    "days": [
                        { "dayName": "missing number" },
                        { "day": 1, "blocks": [ 7, { "blockName": "SKILLS", "exercises": [ { "name": "Handstand" }, "junk" ] } ] }
                    ]
                }
            ]
        });

        let program = load(&raw).unwrap();
        assert_eq!(program.weeks.len(), 1);
        assert_eq!(program.weeks[0].week, 2);
        assert_eq!(program.weeks[0].days.len(), 1);

        let day = &program.weeks[0].days[0];
        assert_eq!(day.day_name, "Day 1");
        assert_eq!(day.blocks.len(), 1);
        assert_eq!(day.blocks[0].exercises.len(), 1);
    }

    #[test]
    fn test_engine_day_number_zero_is_unset() {
        let raw = json!({
            "weeks": [{ "week": 1, "days": [{ "day": 1, "engineData": { "dayNumber": 0 } }] }]
        });
        let program = load(&raw).unwrap();
        let engine = program.day(1, 1).unwrap().engine.as_ref().unwrap();
        assert_eq!(engine.day_number, None);
    }

    #[test]
    fn test_load_file_accepts_program_row() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("program.json");
        std::fs::write(
            &path,
            r#"{ "id": 9, "program_data": { "weeks": [ { "week": 1, "days": [ { "day": 1 } ] } ] } }"#,
        )
        .unwrap();

        let program = load_file(&path).unwrap();
        assert_eq!(program.total_days(), 1);
    }
}
