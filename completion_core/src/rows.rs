//! Completion row loading.
//!
//! Rows are read once per source kind for a whole program, from JSON Lines
//! or CSV exports, under a shared file lock. Lines that fail to parse are
//! logged and skipped so one bad row never hides the rest.

use crate::adapters::{CompletionAdapter, EngineAdapter, ExerciseLogAdapter, MetconAdapter};
use crate::{
    CompletionIndex, EngineSessionRow, ExerciseLogRow, MetconCompletionRow, ProgramId, Result,
};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// File stem of the exercise log export
pub const EXERCISE_LOGS: &str = "exercise_logs";
/// File stem of the metcon completion export
pub const METCON_COMPLETIONS: &str = "metcon_completions";
/// File stem of the engine session export
pub const ENGINE_SESSIONS: &str = "engine_sessions";

/// Read every row from a `.jsonl` or `.csv` file
///
/// A missing file yields no rows.
pub fn load_rows<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let file = File::open(path)?;
    // Acquire shared lock for reading
    file.lock_shared()?;

    let rows = if is_csv {
        read_csv(&file, path)
    } else {
        read_jsonl(&file, path)
    };

    file.unlock()?;
    rows
}

fn read_jsonl<R: DeserializeOwned>(file: &File, path: &Path) -> Result<Vec<R>> {
    let mut reader = BufReader::new(file);
    let mut rows = Vec::new();
    let mut line = Vec::new();
    let mut line_num = 0;

    // Raw bytes so a line with invalid UTF-8 is skipped like any other bad row
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        line_num += 1;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match serde_json::from_slice::<R>(&line) {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::warn!("Skipping row at {:?}:{}: {}", path, line_num, e);
            }
        }
    }

    tracing::debug!("Read {} rows from {:?}", rows.len(), path);
    Ok(rows)
}

fn read_csv<R: DeserializeOwned>(file: &File, path: &Path) -> Result<Vec<R>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows = Vec::new();
    for (record_num, result) in reader.deserialize::<R>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::warn!("Skipping CSV record {} in {:?}: {}", record_num + 1, path, e);
            }
        }
    }

    tracing::debug!("Read {} rows from {:?}", rows.len(), path);
    Ok(rows)
}

/// Prefer `<stem>.jsonl`, fall back to `<stem>.csv`
fn source_path(dir: &Path, stem: &str) -> PathBuf {
    let jsonl = dir.join(format!("{}.jsonl", stem));
    if jsonl.exists() {
        return jsonl;
    }
    dir.join(format!("{}.csv", stem))
}

/// All completion rows for a program, one batch per source
#[derive(Clone, Debug, Default)]
pub struct CompletionRows {
    pub exercises: Vec<ExerciseLogRow>,
    pub metcons: Vec<MetconCompletionRow>,
    pub engine_sessions: Vec<EngineSessionRow>,
}

impl CompletionRows {
    /// Load the three exports from a directory
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let rows = Self {
            exercises: load_rows(&source_path(dir, EXERCISE_LOGS))?,
            metcons: load_rows(&source_path(dir, METCON_COMPLETIONS))?,
            engine_sessions: load_rows(&source_path(dir, ENGINE_SESSIONS))?,
        };

        tracing::info!(
            "Loaded {} exercise logs, {} metcon completions, {} engine sessions from {:?}",
            rows.exercises.len(),
            rows.metcons.len(),
            rows.engine_sessions.len(),
            dir
        );

        Ok(rows)
    }

    /// Normalize every source for `program_id` and index the result
    pub fn index_for(&self, program_id: ProgramId) -> CompletionIndex {
        let events = ExerciseLogAdapter::new(program_id)
            .normalize(&self.exercises)
            .into_iter()
            .chain(MetconAdapter::new(program_id).normalize(&self.metcons))
            .chain(EngineAdapter::new(program_id).normalize(&self.engine_sessions));

        CompletionIndex::build(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_jsonl_skips_bad_lines() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("exercise_logs.jsonl");
        std::fs::write(
            &path,
            concat!(
                r#"{"program_id":1,"week":1,"day":1,"block":"SKILLS","exercise_name":"Kip","set_number":1}"#,
                "\n\n{ not json }\n",
                r#"{"program_id":1,"week":1,"day":2,"exercise_name":"Row"}"#,
                "\n"
            ),
        )
        .unwrap();

        let rows: Vec<ExerciseLogRow> = load_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].block, None);
        assert_eq!(rows[1].set_number, None);
    }

    #[test]
    fn test_load_jsonl_skips_invalid_utf8() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("exercise_logs.jsonl");

        let mut contents =
            br#"{"program_id":1,"week":1,"day":1,"block":"SKILLS","exercise_name":"Kip","set_number":1}"#
                .to_vec();
        contents.extend_from_slice(b"\n{\"exercise_name\":\"\xff\xfe\"}\n");
        std::fs::write(&path, contents).unwrap();

        let rows: Vec<ExerciseLogRow> = load_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].exercise_name.as_deref(), Some("Kip"));
    }

    #[test]
    fn test_load_csv_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("engine_sessions.csv");
        std::fs::write(
            &path,
            "program_id,program_day_number,completed\n1,4,true\n,5,true\n1,6,false\n",
        )
        .unwrap();

        let rows: Vec<EngineSessionRow> = load_rows(&path).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].program_id, None);
        assert_eq!(rows[1].program_day_number, Some(5));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let rows: Vec<MetconCompletionRow> =
            load_rows(&temp_dir.path().join("nope.jsonl")).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_load_dir_builds_index() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path();

        std::fs::write(
            dir.join("exercise_logs.jsonl"),
            r#"{"program_id":3,"week":1,"day":1,"block":"STRENGTH","exercise_name":"Squat","set_number":2}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("metcon_completions.csv"),
            "program_id,week,day,metcon_id,completed_at\n3,1,1,77,2024-03-01T10:00:00Z\n3,1,2,78,\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("engine_sessions.jsonl"),
            r#"{"program_id":null,"program_day_number":1,"completed":true}"#,
        )
        .unwrap();

        let rows = CompletionRows::load_dir(dir).unwrap();
        assert_eq!(rows.metcons.len(), 2);

        let index = rows.index_for(3);
        assert!(index.is_exercise_complete(1, 1, "STRENGTH", "STRENGTH:Squat - Set 2"));
        assert!(index.is_metcon_complete(3, 1, 1, 77));
        assert!(!index.is_metcon_complete(3, 1, 2, 78));
        assert!(index.is_engine_complete(3, 1));
    }

    #[test]
    fn test_metcon_postgres_timestamp_counts() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path();

        std::fs::write(
            dir.join("metcon_completions.jsonl"),
            r#"{"program_id":1,"week":2,"day":3,"metcon_id":5,"completed_at":"2024-03-04 18:30:00+00"}"#,
        )
        .unwrap();

        let rows = CompletionRows::load_dir(dir).unwrap();
        assert_eq!(rows.metcons.len(), 1);
        assert!(rows.index_for(1).is_metcon_complete(1, 2, 3, 5));
    }

    #[test]
    fn test_same_set_with_different_notes_counts_once() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path();

        std::fs::write(
            dir.join("exercise_logs.jsonl"),
            concat!(
                r#"{"program_id":1,"week":1,"day":1,"block":"STRENGTH","exercise_name":"Squat","set_number":2,"notes":"felt heavy"}"#,
                "\n",
                r#"{"program_id":1,"week":1,"day":1,"block":"STRENGTH","exercise_name":"Squat","set_number":2,"notes":"re-logged"}"#,
                "\n"
            ),
        )
        .unwrap();

        let rows = CompletionRows::load_dir(dir).unwrap();
        assert_eq!(rows.exercises.len(), 2);

        let index = rows.index_for(1);
        assert_eq!(index.exercise_key_count(), 1);
        assert_eq!(index.completed_in_block(1, 1, "STRENGTH"), 1);
    }
}
