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

//! WASM bindings for leasecraft - runs the lease calculator, the quiz and
//! progress tracking in the browser.

use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::console;

use leasecraft_core::error::Fallible;
use leasecraft_core::progress::store::BlobStore;
use leasecraft_core::progress::store::ProgressStore;
use leasecraft_core::quiz::bank::QuestionBank;
use leasecraft_core::quiz::session::QuizSession;
use leasecraft_core::quiz::session::Response;
use leasecraft_core::schedule::LeaseForm;
use leasecraft_core::schedule::compute_schedule as compute;
use leasecraft_core::types::lesson::LessonId;
use leasecraft_core::types::timestamp::Timestamp;

mod storage;

use storage::LocalStorage;

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    console::log_1(&"leasecraft WASM initialized".into());
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Fallible<String> {
    Ok(serde_json::to_string(value)?)
}

fn parse_timestamp(now_str: &str) -> Result<Timestamp, JsValue> {
    Timestamp::try_from(now_str.to_string())
        .map_err(|e| JsValue::from_str(&format!("Invalid timestamp: {}", e)))
}

/// Parse the calculator form and compute its schedule as JSON.
fn schedule_json(form_json: &str) -> Fallible<String> {
    let form: LeaseForm = serde_json::from_str(form_json)?;
    let input = form.into_input()?;
    to_json(&compute(&input)?)
}

/// Compute the amortization schedule for the calculator form.
///
/// Takes the form fields as a JSON object of strings, returns the schedule
/// (periods and summary) as JSON. Validation failures come back as an error
/// whose message is meant for the learner.
#[wasm_bindgen]
pub fn compute_schedule(form_json: &str) -> Result<String, JsValue> {
    schedule_json(form_json).map_err(js_err)
}

/// The quiz, with progress saved to localStorage when it ends.
#[wasm_bindgen]
pub struct QuizApp {
    session: QuizSession,
    store: BlobStore<LocalStorage>,
}

#[wasm_bindgen]
impl QuizApp {
    /// Create a quiz over the built-in question bank.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<QuizApp, JsValue> {
        let bank = QuestionBank::builtin().map_err(js_err)?;
        Ok(Self {
            session: QuizSession::new(bank),
            store: BlobStore::new(LocalStorage::new()),
        })
    }

    /// Leave the welcome screen.
    #[wasm_bindgen]
    pub fn start(&mut self) -> Result<(), JsValue> {
        self.session.start().map_err(js_err)
    }

    /// Answer a choice question. Returns the feedback as JSON.
    #[wasm_bindgen]
    pub fn choose(&mut self, index: usize, option: usize) -> Result<String, JsValue> {
        let feedback = self
            .session
            .submit_answer(index, Response::Choice(option))
            .map_err(js_err)?;
        to_json(&feedback).map_err(js_err)
    }

    /// Answer a calculation question with the raw input text. Returns the
    /// feedback as JSON.
    #[wasm_bindgen]
    pub fn answer_value(&mut self, index: usize, raw: &str) -> Result<String, JsValue> {
        let feedback = self
            .session
            .submit_answer(index, Response::Value(raw.to_string()))
            .map_err(js_err)?;
        to_json(&feedback).map_err(js_err)
    }

    /// Move past the current question. Returns the transition as JSON.
    #[wasm_bindgen]
    pub fn advance(&mut self, now_str: &str) -> Result<String, JsValue> {
        let now = parse_timestamp(now_str)?;
        let transition = self
            .session
            .advance(&mut self.store, now)
            .map_err(js_err)?;
        to_json(&transition).map_err(js_err)
    }

    /// Leave a lesson summary. Returns the index of the next question.
    #[wasm_bindgen]
    pub fn continue_quiz(&mut self) -> Result<usize, JsValue> {
        self.session.continue_quiz().map_err(js_err)
    }

    /// Start over from the welcome screen.
    #[wasm_bindgen]
    pub fn retake(&mut self) {
        self.session.reset();
    }

    #[wasm_bindgen]
    pub fn score(&self) -> usize {
        self.session.score()
    }

    #[wasm_bindgen]
    pub fn total(&self) -> usize {
        self.session.len()
    }

    /// What to draw right now, as JSON.
    #[wasm_bindgen]
    pub fn view_json(&self) -> Result<String, JsValue> {
        to_json(&self.session.view()).map_err(js_err)
    }

    /// The overall and per-lesson scores, as JSON.
    #[wasm_bindgen]
    pub fn results_json(&self) -> Result<String, JsValue> {
        to_json(&self.session.results()).map_err(js_err)
    }
}

/// Lesson completion and overall progress, kept in localStorage.
#[wasm_bindgen]
pub struct ProgressTracker {
    store: BlobStore<LocalStorage>,
}

#[wasm_bindgen]
impl ProgressTracker {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            store: BlobStore::new(LocalStorage::new()),
        }
    }

    /// Mark lesson `number` (1 to 4) as completed.
    #[wasm_bindgen]
    pub fn mark_lesson(&mut self, number: u8, now_str: &str) -> Result<(), JsValue> {
        let lesson = LessonId::new(number).map_err(js_err)?;
        let now = parse_timestamp(now_str)?;
        self.store.set_lesson_complete(lesson, now).map_err(js_err)
    }

    #[wasm_bindgen]
    pub fn is_lesson_complete(&self, number: u8) -> Result<bool, JsValue> {
        let lesson = LessonId::new(number).map_err(js_err)?;
        self.store.lesson_complete(lesson).map_err(js_err)
    }

    /// The best quiz attempt as JSON, or `null` if the quiz was never taken.
    #[wasm_bindgen]
    pub fn best_attempt_json(&self) -> Result<String, JsValue> {
        let best = self.store.best_quiz_attempt().map_err(js_err)?;
        to_json(&best).map_err(js_err)
    }

    /// Overall course progress, 0 to 100.
    #[wasm_bindgen]
    pub fn progress_percent(&self) -> Result<u8, JsValue> {
        self.store.overall_progress_percent().map_err(js_err)
    }

    /// Forget all progress.
    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<(), JsValue> {
        self.store.reset().map_err(js_err)
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the current timestamp as an ISO string.
#[wasm_bindgen]
pub fn now_timestamp() -> String {
    let date = js_sys::Date::new_0();
    let year = date.get_full_year();
    let month = date.get_month() + 1;
    let day = date.get_date();
    let hours = date.get_hours();
    let minutes = date.get_minutes();
    let seconds = date.get_seconds();
    let millis = date.get_milliseconds();
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}",
        year, month, day, hours, minutes, seconds, millis
    )
}

/// Get today's date as a string (YYYY-MM-DD), the default lease start date.
#[wasm_bindgen]
pub fn today_date() -> String {
    let date = js_sys::Date::new_0();
    let year = date.get_full_year();
    let month = date.get_month() + 1;
    let day = date.get_date();
    format!("{:04}-{:02}-{:02}", year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_json() -> Fallible<()> {
        let form = r#"{
            "asset_cost": "80000",
            "residual_value": "20000",
            "term": "48",
            "rental_amount": "1500",
            "initial_direct_costs": "",
            "start_date": "2024-01-01"
        }"#;
        let json: serde_json::Value = serde_json::from_str(&schedule_json(form)?)?;
        assert_eq!(json["periods"].as_array().map(Vec::len), Some(48));
        assert_eq!(json["summary"]["monthly_depreciation"], 1250.0);
        assert_eq!(json["periods"][0]["start_date"], "2024-01-01");
        Ok(())
    }

    #[test]
    fn test_schedule_json_reports_validation_errors() {
        let form = r#"{"asset_cost": "1000", "residual_value": "2000", "term": "12",
                       "rental_amount": "10", "start_date": "2024-01-01"}"#;
        let err = schedule_json(form).unwrap_err();
        assert!(err.to_string().contains("Invalid lease input"));
    }
}
