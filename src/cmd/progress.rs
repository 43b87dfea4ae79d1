// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::io::Write;

use leasecraft_core::progress::store::BlobStore;
use leasecraft_core::progress::store::ProgressStore;
use leasecraft_core::types::lesson::LessonId;

use crate::db::Database;
use crate::error::Fallible;
use crate::types::timestamp::Timestamp;

fn open_store(data_dir: Option<String>) -> Fallible<BlobStore<Database>> {
    Ok(BlobStore::new(Database::in_directory(data_dir)?))
}

pub fn show_progress(data_dir: Option<String>) -> Fallible<()> {
    let store = open_store(data_dir)?;
    write_progress(&store, &mut std::io::stdout().lock())
}

pub fn complete_lesson(number: u8, data_dir: Option<String>) -> Fallible<()> {
    let lesson = LessonId::new(number)?;
    let mut store = open_store(data_dir)?;
    store.set_lesson_complete(lesson, Timestamp::now())?;
    println!("{lesson} marked complete.");
    Ok(())
}

pub fn reset_progress(data_dir: Option<String>) -> Fallible<()> {
    let mut store = open_store(data_dir)?;
    store.reset()?;
    println!("Progress reset.");
    Ok(())
}

fn write_progress<S: ProgressStore + ?Sized>(store: &S, out: &mut impl Write) -> Fallible<()> {
    for lesson in LessonId::all() {
        let mark = if store.lesson_complete(lesson)? { "x" } else { " " };
        writeln!(out, "[{mark}] {lesson}")?;
    }
    match store.best_quiz_attempt()? {
        Some(best) => {
            write!(out, "Best quiz score: {}/{}", best.score, best.total)?;
            match best.date {
                Some(date) => writeln!(out, " ({})", date.date())?,
                None => writeln!(out)?,
            }
        }
        None => writeln!(out, "Quiz not taken yet.")?,
    }
    writeln!(out, "Overall progress: {}%", store.overall_progress_percent()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use leasecraft_core::progress::store::MemoryStore;
    use leasecraft_core::progress::store::PROGRESS_KEY;

    use super::*;

    #[test]
    fn test_write_progress() -> Fallible<()> {
        let mut store = MemoryStore::in_memory();
        let at = Timestamp::try_from("2024-02-10T09:00:00.000".to_string())?;
        store.set_lesson_complete(LessonId::new(1)?, at)?;
        store.set_lesson_complete(LessonId::new(2)?, at)?;
        store.append_quiz_attempt(12, 20, at)?;
        store.append_quiz_attempt(17, 20, at)?;

        let mut out = Vec::new();
        write_progress(&store, &mut out)?;
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[x] Lesson 1"));
        assert!(text.contains("[x] Lesson 2"));
        assert!(text.contains("[ ] Lesson 3"));
        assert!(text.contains("Best quiz score: 17/20 (2024-02-10)"));
        assert!(text.contains("Overall progress: 60%"));
        Ok(())
    }

    #[test]
    fn test_fresh_store() -> Fallible<()> {
        let store = MemoryStore::in_memory();
        let mut out = Vec::new();
        write_progress(&store, &mut out)?;
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Quiz not taken yet."));
        assert!(text.contains("Overall progress: 0%"));
        Ok(())
    }

    #[test]
    fn test_undated_best_attempt() -> Fallible<()> {
        let mut backend = HashMap::new();
        backend.insert(
            PROGRESS_KEY.to_string(),
            r#"{"quizScores":[{"score":4,"total":5}]}"#.to_string(),
        );
        let store = BlobStore::new(backend);
        let mut out = Vec::new();
        write_progress(&store, &mut out)?;
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Best quiz score: 4/5\n"));
        assert!(text.contains("Overall progress: 20%"));
        Ok(())
    }
}
