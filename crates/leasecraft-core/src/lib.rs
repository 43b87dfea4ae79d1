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

//! leasecraft-core: the engine behind the operating lease course.
//!
//! This library is WASM-compatible and provides:
//! - The straight-line amortization schedule for an operating lease
//! - The quiz question bank, scoring and progression state machine
//! - Learner progress tracking over a pluggable key-value backend
//! - Markdown rendering for quiz text

pub mod daycount;
pub mod error;
pub mod markdown;
pub mod progress;
pub mod quiz;
pub mod schedule;
pub mod types;

// Re-exports for convenience
pub use error::{ErrorReport, Fallible, fail};
pub use progress::record::{ProgressRecord, QuizAttempt};
pub use progress::store::{BlobStore, KeyValue, MemoryStore, PROGRESS_KEY, ProgressStore};
pub use quiz::bank::{Lesson, Question, QuestionBank, QuestionKind};
pub use quiz::session::{QuizError, QuizSession, QuizState, Response, Transition};
pub use quiz::view::View;
pub use schedule::{LeaseForm, LeaseInput, Schedule, ValidationError, compute_schedule};
pub use types::date::Date;
pub use types::lesson::LessonId;
pub use types::timestamp::Timestamp;
