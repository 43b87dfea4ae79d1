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

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Value;

use crate::error::Fallible;
use crate::types::lesson::LESSON_COUNT;
use crate::types::lesson::LessonId;
use crate::types::timestamp::Timestamp;

/// Items that count towards overall progress: every lesson, plus the quiz.
pub const TOTAL_ITEMS: usize = LESSON_COUNT as usize + 1;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LessonCompletion {
    pub completed: bool,
    /// Absent if the stored date was missing or unreadable.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<Timestamp>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub score: usize,
    pub total: usize,
    /// Absent if the stored date was missing or unreadable.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<Timestamp>,
}

impl QuizAttempt {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.score as f64 / self.total as f64
        }
    }
}

/// A date that doesn't parse is dropped rather than failing the entry.
fn lenient_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Timestamp>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(match raw {
        Some(Value::String(text)) => match Timestamp::try_from(text) {
            Ok(ts) => Some(ts),
            Err(e) => {
                log::warn!("Ignoring unreadable progress date: {e}");
                None
            }
        },
        _ => None,
    })
}

/// Everything the learner has done so far. Persisted as a single JSON blob.
///
/// Lessons are keyed by slug (`lesson-1`, ...). Unknown keys are kept but
/// don't count towards progress.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub lessons: BTreeMap<String, LessonCompletion>,
    pub quiz_scores: Vec<QuizAttempt>,
}

impl ProgressRecord {
    /// Parse a stored blob. A blob that isn't a JSON object is treated as no
    /// progress at all; inside one, only the entries that don't fit are
    /// skipped.
    pub fn from_blob(blob: &str) -> Self {
        let value: Value = match serde_json::from_str(blob) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Discarding malformed progress data: {e}");
                return Self::default();
            }
        };
        let Value::Object(fields) = value else {
            log::warn!("Discarding progress data that is not an object");
            return Self::default();
        };
        let mut record = Self::default();
        if let Some(Value::Object(lessons)) = fields.get("lessons") {
            for (slug, entry) in lessons {
                match LessonCompletion::deserialize(entry) {
                    Ok(completion) => {
                        record.lessons.insert(slug.clone(), completion);
                    }
                    Err(e) => log::warn!("Skipping progress entry for '{slug}': {e}"),
                }
            }
        }
        if let Some(Value::Array(attempts)) = fields.get("quizScores") {
            for entry in attempts {
                match QuizAttempt::deserialize(entry) {
                    Ok(attempt) => record.quiz_scores.push(attempt),
                    Err(e) => log::warn!("Skipping quiz attempt: {e}"),
                }
            }
        }
        record
    }

    pub fn to_blob(&self) -> Fallible<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn is_lesson_complete(&self, lesson: LessonId) -> bool {
        self.lessons
            .get(&lesson.slug())
            .is_some_and(|entry| entry.completed)
    }

    /// Mark a lesson as completed. Marking it again keeps the original
    /// completion time.
    pub fn mark_lesson(&mut self, lesson: LessonId, at: Timestamp) {
        if self.is_lesson_complete(lesson) {
            return;
        }
        self.lessons.insert(
            lesson.slug(),
            LessonCompletion {
                completed: true,
                date: Some(at),
            },
        );
    }

    pub fn append_attempt(&mut self, score: usize, total: usize, at: Timestamp) {
        self.quiz_scores.push(QuizAttempt {
            score,
            total,
            date: Some(at),
        });
    }

    /// The attempt with the best score ratio. On a tie the earliest wins.
    pub fn best_attempt(&self) -> Option<&QuizAttempt> {
        self.quiz_scores.iter().fold(None, |best, cur| match best {
            Some(best) if cur.ratio() <= best.ratio() => Some(best),
            _ => Some(cur),
        })
    }

    pub fn completed_lessons(&self) -> usize {
        self.lessons
            .iter()
            .filter(|(slug, entry)| entry.completed && LessonId::from_slug(slug).is_ok())
            .count()
    }

    /// Completed items out of [`TOTAL_ITEMS`], as a rounded percentage.
    pub fn progress_percent(&self) -> u8 {
        let quiz_taken = usize::from(!self.quiz_scores.is_empty());
        let completed = self.completed_lessons() + quiz_taken;
        let pct = (completed as f64 / TOTAL_ITEMS as f64 * 100.0).round();
        pct.min(100.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::try_from(s.to_string()).unwrap()
    }

    fn lesson(n: u8) -> LessonId {
        LessonId::new(n).unwrap()
    }

    #[test]
    fn test_empty() {
        let record = ProgressRecord::default();
        assert_eq!(record.progress_percent(), 0);
        assert!(record.best_attempt().is_none());
        assert!(!record.is_lesson_complete(lesson(1)));
    }

    #[test]
    fn test_progress_percent() {
        let mut record = ProgressRecord::default();
        record.mark_lesson(lesson(1), ts("2024-01-01T10:00:00.000"));
        record.mark_lesson(lesson(2), ts("2024-01-02T10:00:00.000"));
        record.append_attempt(15, 20, ts("2024-01-03T10:00:00.000"));
        assert_eq!(record.progress_percent(), 60);
        record.mark_lesson(lesson(3), ts("2024-01-04T10:00:00.000"));
        record.mark_lesson(lesson(4), ts("2024-01-04T11:00:00.000"));
        assert_eq!(record.progress_percent(), 100);
    }

    #[test]
    fn test_mark_lesson_is_idempotent() {
        let mut record = ProgressRecord::default();
        record.mark_lesson(lesson(2), ts("2024-01-01T10:00:00.000"));
        let before = record.clone();
        record.mark_lesson(lesson(2), ts("2024-02-01T10:00:00.000"));
        assert_eq!(record, before);
        assert_eq!(record.completed_lessons(), 1);
    }

    #[test]
    fn test_best_attempt() {
        let mut record = ProgressRecord::default();
        record.append_attempt(12, 20, ts("2024-01-01T10:00:00.000"));
        record.append_attempt(9, 10, ts("2024-01-02T10:00:00.000"));
        record.append_attempt(18, 20, ts("2024-01-03T10:00:00.000"));
        record.append_attempt(5, 10, ts("2024-01-04T10:00:00.000"));
        let best = record.best_attempt().unwrap();
        assert_eq!((best.score, best.total), (9, 10));
        assert_eq!(best.date, Some(ts("2024-01-02T10:00:00.000")));
    }

    #[test]
    fn test_malformed_blob_degrades_to_default() {
        assert_eq!(ProgressRecord::from_blob("{not json"), ProgressRecord::default());
        assert_eq!(
            ProgressRecord::from_blob(r#"{"lessons": 3}"#),
            ProgressRecord::default()
        );
        assert_eq!(ProgressRecord::from_blob(""), ProgressRecord::default());
    }

    #[test]
    fn test_blob_format() -> Fallible<()> {
        let blob = r#"{
            "lessons": {
                "lesson-1": {"completed": true, "date": "2024-05-01T09:30:00.000Z"},
                "lesson-9": {"completed": true, "date": "2024-05-01T09:30:00.000Z"}
            },
            "quizScores": [{"score": 17, "total": 20, "date": "2024-05-02T12:00:00.000Z"}]
        }"#;
        let record = ProgressRecord::from_blob(blob);
        assert!(record.is_lesson_complete(lesson(1)));
        assert_eq!(record.completed_lessons(), 1);
        assert_eq!(record.progress_percent(), 40);

        let reparsed = ProgressRecord::from_blob(&record.to_blob()?);
        assert_eq!(reparsed, record);
        assert!(record.to_blob()?.contains("\"quizScores\""));
        Ok(())
    }

    #[test]
    fn test_bad_entries_are_skipped_individually() {
        let blob = r#"{
            "lessons": {
                "lesson-1": {"completed": true, "date": "2024-05-01T09:30:00Z"},
                "lesson-2": {"completed": true},
                "lesson-3": {"completed": "yes"},
                "lesson-4": {"completed": true, "date": 17}
            },
            "quizScores": [
                {"score": 3, "total": 5},
                {"score": "three", "total": 5},
                {"score": 4, "total": 5, "date": "last tuesday"}
            ]
        }"#;
        let record = ProgressRecord::from_blob(blob);
        assert!(record.is_lesson_complete(lesson(1)));
        assert!(record.is_lesson_complete(lesson(2)));
        assert!(!record.is_lesson_complete(lesson(3)));
        assert!(record.is_lesson_complete(lesson(4)));
        assert_eq!(
            record.lessons["lesson-1"].date,
            Some(ts("2024-05-01T09:30:00.000"))
        );
        assert_eq!(record.lessons["lesson-2"].date, None);
        assert_eq!(record.quiz_scores.len(), 2);
        assert_eq!(record.quiz_scores[1].date, None);
        assert_eq!(record.progress_percent(), 80);
    }

    #[test]
    fn test_missing_sections() {
        let record = ProgressRecord::from_blob(r#"{"quizScores": [{"score": 1, "total": 2}]}"#);
        assert!(record.lessons.is_empty());
        assert_eq!(record.progress_percent(), 20);
        assert_eq!(ProgressRecord::from_blob("[]"), ProgressRecord::default());
    }
}
