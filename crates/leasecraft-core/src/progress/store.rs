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

use std::collections::HashMap;

use crate::error::Fallible;
use crate::progress::record::ProgressRecord;
use crate::progress::record::QuizAttempt;
use crate::types::lesson::LessonId;
use crate::types::timestamp::Timestamp;

/// The key the progress blob is stored under.
pub const PROGRESS_KEY: &str = "leasecraft_progress";

/// Where the learner's progress lives.
pub trait ProgressStore {
    fn lesson_complete(&self, lesson: LessonId) -> Fallible<bool>;

    /// Idempotent.
    fn set_lesson_complete(&mut self, lesson: LessonId, at: Timestamp) -> Fallible<()>;

    fn append_quiz_attempt(&mut self, score: usize, total: usize, at: Timestamp) -> Fallible<()>;

    fn best_quiz_attempt(&self) -> Fallible<Option<QuizAttempt>>;

    /// 0 to 100.
    fn overall_progress_percent(&self) -> Fallible<u8>;

    fn reset(&mut self) -> Fallible<()>;
}

/// A string key-value store, e.g. browser `localStorage`.
pub trait KeyValue {
    fn get(&self, key: &str) -> Fallible<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Fallible<()>;

    fn remove(&mut self, key: &str) -> Fallible<()>;
}

impl KeyValue for HashMap<String, String> {
    fn get(&self, key: &str) -> Fallible<Option<String>> {
        Ok(HashMap::get(self, key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Fallible<()> {
        self.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Fallible<()> {
        HashMap::remove(self, key);
        Ok(())
    }
}

/// A [`ProgressStore`] that keeps the whole [`ProgressRecord`] as one JSON
/// blob in a [`KeyValue`] backend. Every operation reads the blob fresh.
pub struct BlobStore<B: KeyValue> {
    backend: B,
    key: String,
}

/// In-memory store.
pub type MemoryStore = BlobStore<HashMap<String, String>>;

impl<B: KeyValue> BlobStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_key(backend, PROGRESS_KEY)
    }

    pub fn with_key(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn load(&self) -> Fallible<ProgressRecord> {
        Ok(match self.backend.get(&self.key)? {
            Some(blob) => ProgressRecord::from_blob(&blob),
            None => ProgressRecord::default(),
        })
    }

    pub fn save(&mut self, record: &ProgressRecord) -> Fallible<()> {
        let blob = record.to_blob()?;
        self.backend.set(&self.key, &blob)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_inner(self) -> B {
        self.backend
    }
}

impl MemoryStore {
    pub fn in_memory() -> Self {
        Self::new(HashMap::new())
    }
}

impl<B: KeyValue> ProgressStore for BlobStore<B> {
    fn lesson_complete(&self, lesson: LessonId) -> Fallible<bool> {
        Ok(self.load()?.is_lesson_complete(lesson))
    }

    fn set_lesson_complete(&mut self, lesson: LessonId, at: Timestamp) -> Fallible<()> {
        let mut record = self.load()?;
        record.mark_lesson(lesson, at);
        log::debug!("Marked {} complete", lesson.slug());
        self.save(&record)
    }

    fn append_quiz_attempt(&mut self, score: usize, total: usize, at: Timestamp) -> Fallible<()> {
        let mut record = self.load()?;
        record.append_attempt(score, total, at);
        log::debug!("Recorded quiz attempt {score}/{total}");
        self.save(&record)
    }

    fn best_quiz_attempt(&self) -> Fallible<Option<QuizAttempt>> {
        Ok(self.load()?.best_attempt().copied())
    }

    fn overall_progress_percent(&self) -> Fallible<u8> {
        Ok(self.load()?.progress_percent())
    }

    fn reset(&mut self) -> Fallible<()> {
        self.backend.remove(&self.key)
    }
}
