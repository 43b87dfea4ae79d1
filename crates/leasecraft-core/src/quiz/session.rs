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

//! The quiz as a state machine:
//!
//! ```text
//! Welcome -> InQuestion -> Interstitial -> InQuestion -> ... -> Results
//! ```
//!
//! Each question may be answered once. Advancing past the last question of a
//! lesson shows that lesson's score before moving on; advancing past the last
//! question of the bank records the attempt in the progress store.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

use serde::Serialize;

use crate::error::ErrorReport;
use crate::progress::store::ProgressStore;
use crate::quiz::bank::Question;
use crate::quiz::bank::QuestionBank;
use crate::quiz::bank::QuestionKind;
use crate::quiz::scoring::BreakdownTier;
use crate::quiz::scoring::FinalTier;
use crate::quiz::scoring::LessonTally;
use crate::quiz::scoring::LessonTier;
use crate::quiz::scoring::lesson_message;
use crate::quiz::scoring::percent;
use crate::types::lesson::LessonId;
use crate::types::timestamp::Timestamp;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QuizState {
    /// Not started yet.
    Welcome,
    /// Showing the question at `index`, answered or not.
    InQuestion { index: usize },
    /// Showing the score for `lesson`; the quiz resumes at `next_index`.
    Interstitial { lesson: LessonId, next_index: usize },
    /// All questions done.
    Results,
}

impl Display for QuizState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            QuizState::Welcome => write!(f, "welcome"),
            QuizState::InQuestion { index } => write!(f, "question {}", index + 1),
            QuizState::Interstitial { lesson, .. } => write!(f, "{lesson} summary"),
            QuizState::Results => write!(f, "results"),
        }
    }
}

/// What the learner submitted.
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    /// The index of the chosen option.
    Choice(usize),
    /// The text typed into a calculation answer box.
    Value(String),
}

/// A parsed, scored answer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Submission {
    pub given: Given,
    pub correct: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Given {
    Choice(usize),
    Value(f64),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorrectAnswer {
    Choice { option: usize },
    Value { answer: f64, tolerance: f64, unit: String },
}

impl CorrectAnswer {
    fn of(question: &Question) -> Self {
        match &question.kind {
            QuestionKind::Choice { answer, .. } => CorrectAnswer::Choice { option: *answer },
            QuestionKind::Calculation {
                answer,
                tolerance,
                unit,
            } => CorrectAnswer::Value {
                answer: *answer,
                tolerance: *tolerance,
                unit: unit.clone(),
            },
        }
    }
}

/// Returned after an answer is accepted.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnswerFeedback {
    pub index: usize,
    pub correct: bool,
    pub given: Given,
    pub correct_answer: CorrectAnswer,
    /// Markdown.
    pub explanation: String,
}

/// Score for one lesson, shown between lessons.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LessonSummary {
    pub lesson: LessonId,
    pub name: String,
    pub tally: LessonTally,
    pub percent: u8,
    pub tier: LessonTier,
    pub message: &'static str,
    /// The lesson the quiz continues with, if any.
    pub next_lesson: Option<LessonId>,
    pub next_lesson_name: Option<String>,
}

/// One row of the final per-lesson breakdown.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LessonBreakdown {
    pub lesson: LessonId,
    pub name: String,
    pub url: String,
    pub tally: LessonTally,
    pub percent: u8,
    pub tier: BreakdownTier,
    pub status: &'static str,
    /// Whether to offer a link back to the lesson.
    pub review_suggested: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuizResults {
    pub score: usize,
    pub total: usize,
    pub percent: u8,
    pub tier: FinalTier,
    pub message: &'static str,
    pub breakdown: Vec<LessonBreakdown>,
}

/// Where [`QuizSession::advance`] landed.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    Question { index: usize },
    LessonComplete(LessonSummary),
    Finished(QuizResults),
}

/// Label of the button that advances past the current question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextLabel {
    Next,
    LessonResults,
    FinalResults,
}

impl NextLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            NextLabel::Next => "Next",
            NextLabel::LessonResults => "See Lesson Results",
            NextLabel::FinalResults => "See Final Results",
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum QuizError {
    QuestionOutOfRange {
        index: usize,
        len: usize,
    },
    AlreadyAnswered {
        index: usize,
    },
    NotAnswered {
        index: usize,
    },
    InvalidState {
        operation: &'static str,
        state: QuizState,
    },
    OptionOutOfRange {
        index: usize,
        option: usize,
        options: usize,
    },
    /// A number was given for a choice question, or vice versa.
    ResponseMismatch {
        index: usize,
    },
    /// The calculation answer was empty or not a number. The question stays
    /// open.
    InputParse {
        index: usize,
        input: String,
    },
    Storage(ErrorReport),
}

impl Display for QuizError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            QuizError::QuestionOutOfRange { index, len } => {
                write!(f, "question index {index} is out of range (bank has {len}).")
            }
            QuizError::AlreadyAnswered { index } => {
                write!(f, "question {} has already been answered.", index + 1)
            }
            QuizError::NotAnswered { index } => {
                write!(f, "question {} has not been answered yet.", index + 1)
            }
            QuizError::InvalidState { operation, state } => {
                write!(f, "cannot {operation} while showing {state}.")
            }
            QuizError::OptionOutOfRange {
                index,
                option,
                options,
            } => write!(
                f,
                "question {} has {options} options, option {option} does not exist.",
                index + 1
            ),
            QuizError::ResponseMismatch { index } => {
                write!(f, "wrong kind of answer for question {}.", index + 1)
            }
            QuizError::InputParse { input, .. } => {
                if input.trim().is_empty() {
                    write!(f, "please enter a number.")
                } else {
                    write!(f, "'{input}' is not a number.")
                }
            }
            QuizError::Storage(report) => write!(f, "could not save progress: {report}"),
        }
    }
}

impl Error for QuizError {}

/// A single run through the question bank.
pub struct QuizSession {
    bank: QuestionBank,
    state: QuizState,
    score: usize,
    tallies: BTreeMap<LessonId, LessonTally>,
    /// One slot per question, filled at most once.
    answers: Vec<Option<Submission>>,
}

impl QuizSession {
    pub fn new(bank: QuestionBank) -> Self {
        let mut session = Self {
            bank,
            state: QuizState::Welcome,
            score: 0,
            tallies: BTreeMap::new(),
            answers: Vec::new(),
        };
        session.reset();
        session
    }

    /// Throw away all answers and go back to the welcome screen.
    pub fn reset(&mut self) {
        self.state = QuizState::Welcome;
        self.score = 0;
        self.tallies = self
            .bank
            .lessons()
            .iter()
            .map(|lesson| {
                let tally = LessonTally {
                    correct: 0,
                    total: self.bank.count_in_lesson(lesson.id),
                };
                (lesson.id, tally)
            })
            .collect();
        self.answers = vec![None; self.bank.len()];
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn len(&self) -> usize {
        self.bank.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bank.is_empty()
    }

    /// Index of the question being shown, or about to be shown.
    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            QuizState::Welcome => Some(0),
            QuizState::InQuestion { index } => Some(index),
            QuizState::Interstitial { next_index, .. } => Some(next_index),
            QuizState::Results => None,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            QuizState::InQuestion { index } => self.bank.get(index),
            _ => None,
        }
    }

    pub fn tally(&self, lesson: LessonId) -> LessonTally {
        self.tallies.get(&lesson).copied().unwrap_or_default()
    }

    pub fn is_answered(&self, index: usize) -> bool {
        self.submission(index).is_some()
    }

    pub fn submission(&self, index: usize) -> Option<Submission> {
        self.answers.get(index).copied().flatten()
    }

    /// Fraction of the quiz behind the learner, as a percentage.
    pub fn progress_percent(&self) -> u8 {
        match self.current_index() {
            Some(index) => percent(index, self.len()),
            None => 100,
        }
    }

    pub fn start(&mut self) -> Result<(), QuizError> {
        match self.state {
            QuizState::Welcome => {
                self.state = QuizState::InQuestion { index: 0 };
                log::debug!("Quiz started with {} questions", self.len());
                Ok(())
            }
            state => Err(QuizError::InvalidState {
                operation: "start",
                state,
            }),
        }
    }

    pub fn submit_answer(
        &mut self,
        index: usize,
        response: Response,
    ) -> Result<AnswerFeedback, QuizError> {
        let question = self.bank.get(index).ok_or(QuizError::QuestionOutOfRange {
            index,
            len: self.bank.len(),
        })?;
        if self.is_answered(index) {
            return Err(QuizError::AlreadyAnswered { index });
        }
        match self.state {
            QuizState::InQuestion { index: current } if current == index => {}
            state => {
                return Err(QuizError::InvalidState {
                    operation: "answer",
                    state,
                });
            }
        }
        let given = match (&question.kind, response) {
            (QuestionKind::Choice { options, .. }, Response::Choice(option)) => {
                if option >= options.len() {
                    return Err(QuizError::OptionOutOfRange {
                        index,
                        option,
                        options: options.len(),
                    });
                }
                Given::Choice(option)
            }
            (QuestionKind::Calculation { unit, .. }, Response::Value(input)) => {
                match parse_value(&input, unit) {
                    Some(value) => Given::Value(value),
                    None => return Err(QuizError::InputParse { index, input }),
                }
            }
            _ => return Err(QuizError::ResponseMismatch { index }),
        };
        let correct = is_correct(&question.kind, given);
        let lesson = question.lesson;
        let feedback = AnswerFeedback {
            index,
            correct,
            given,
            correct_answer: CorrectAnswer::of(question),
            explanation: question.explanation.clone(),
        };

        if correct {
            self.score += 1;
            self.tallies.entry(lesson).or_default().correct += 1;
        }
        self.answers[index] = Some(Submission { given, correct });
        log::debug!(
            "Question {} answered {}",
            index + 1,
            if correct { "correctly" } else { "incorrectly" }
        );
        Ok(feedback)
    }

    /// Move past the current, answered question. Finishing the quiz appends
    /// the attempt to `store`; if that fails the session does not move.
    pub fn advance<S: ProgressStore + ?Sized>(
        &mut self,
        store: &mut S,
        now: Timestamp,
    ) -> Result<Transition, QuizError> {
        let index = match self.state {
            QuizState::InQuestion { index } => index,
            state => {
                return Err(QuizError::InvalidState {
                    operation: "advance",
                    state,
                });
            }
        };
        if !self.is_answered(index) {
            return Err(QuizError::NotAnswered { index });
        }
        let len = self.bank.len();
        let finished_lesson = self
            .bank
            .get(index)
            .map(|q| q.lesson)
            .ok_or(QuizError::QuestionOutOfRange { index, len })?;
        let next = index + 1;

        let Some(next_question) = self.bank.get(next) else {
            store
                .append_quiz_attempt(self.score, len, now)
                .map_err(QuizError::Storage)?;
            self.state = QuizState::Results;
            log::debug!("Quiz finished: {}/{len}", self.score);
            return Ok(Transition::Finished(self.results()));
        };

        if next_question.lesson != finished_lesson {
            self.state = QuizState::Interstitial {
                lesson: finished_lesson,
                next_index: next,
            };
            Ok(Transition::LessonComplete(
                self.lesson_summary(finished_lesson),
            ))
        } else {
            self.state = QuizState::InQuestion { index: next };
            Ok(Transition::Question { index: next })
        }
    }

    /// Leave the lesson summary for the next lesson's first question.
    pub fn continue_quiz(&mut self) -> Result<usize, QuizError> {
        match self.state {
            QuizState::Interstitial { next_index, .. } => {
                self.state = QuizState::InQuestion { index: next_index };
                Ok(next_index)
            }
            state => Err(QuizError::InvalidState {
                operation: "continue",
                state,
            }),
        }
    }

    /// The label for the button under the current question.
    pub fn next_label(&self) -> Option<NextLabel> {
        let QuizState::InQuestion { index } = self.state else {
            return None;
        };
        Some(if index + 1 >= self.len() {
            NextLabel::FinalResults
        } else if self.bank.is_last_in_lesson(index) {
            NextLabel::LessonResults
        } else {
            NextLabel::Next
        })
    }

    pub fn lesson_summary(&self, lesson: LessonId) -> LessonSummary {
        let tally = self.tally(lesson);
        let pct = tally.percent();
        let tier = LessonTier::from_percent(pct);
        let next_lesson = match self.state {
            QuizState::Interstitial { next_index, .. } => {
                self.bank.get(next_index).map(|q| q.lesson)
            }
            _ => None,
        };
        LessonSummary {
            lesson,
            name: self.lesson_name(lesson),
            tally,
            percent: pct,
            tier,
            message: lesson_message(pct),
            next_lesson,
            next_lesson_name: next_lesson.map(|id| self.lesson_name(id)),
        }
    }

    /// Overall and per-lesson scores so far.
    pub fn results(&self) -> QuizResults {
        let total = self.len();
        let pct = percent(self.score, total);
        let tier = FinalTier::from_percent(pct);
        let breakdown = self
            .bank
            .lessons()
            .iter()
            .map(|lesson| {
                let tally = self.tally(lesson.id);
                let lesson_pct = tally.percent();
                let lesson_tier = BreakdownTier::from_percent(lesson_pct);
                LessonBreakdown {
                    lesson: lesson.id,
                    name: lesson.name.clone(),
                    url: lesson.url.clone(),
                    tally,
                    percent: lesson_pct,
                    tier: lesson_tier,
                    status: lesson_tier.label(),
                    review_suggested: lesson_pct < 80,
                }
            })
            .collect();
        QuizResults {
            score: self.score,
            total,
            percent: pct,
            tier,
            message: tier.message(),
            breakdown,
        }
    }

    fn lesson_name(&self, lesson: LessonId) -> String {
        self.bank
            .lesson(lesson)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| lesson.to_string())
    }
}

/// Parse a typed calculation answer. Surrounding whitespace, the question's
/// unit and thousands separators are ignored.
fn parse_value(input: &str, unit: &str) -> Option<f64> {
    let mut text = input.trim();
    if !unit.is_empty() {
        text = text.strip_prefix(unit).unwrap_or(text);
        text = text.strip_suffix(unit).unwrap_or(text);
    }
    let text: String = text.trim().chars().filter(|c| *c != ',').collect();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_correct(kind: &QuestionKind, given: Given) -> bool {
    match (kind, given) {
        (QuestionKind::Choice { answer, .. }, Given::Choice(option)) => option == *answer,
        (
            QuestionKind::Calculation {
                answer, tolerance, ..
            },
            Given::Value(value),
        ) => (value - answer).abs() <= *tolerance,
        _ => false,
    }
}
