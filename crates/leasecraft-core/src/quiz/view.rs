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

//! What a front-end should draw for the current quiz state. Markdown fields
//! are carried both raw (for terminals) and rendered (for the browser).

use serde::Serialize;

use crate::markdown::markdown_to_html;
use crate::markdown::markdown_to_html_inline;
use crate::quiz::bank::Question;
use crate::quiz::bank::QuestionKind;
use crate::quiz::scoring::percent;
use crate::quiz::session::Given;
use crate::quiz::session::LessonSummary;
use crate::quiz::session::QuizResults;
use crate::quiz::session::QuizSession;
use crate::quiz::session::QuizState;
use crate::types::lesson::LessonId;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum View {
    Welcome {
        question_count: usize,
        lessons: Vec<LessonHeading>,
    },
    Question(QuestionView),
    Interstitial(LessonSummary),
    Results(QuizResults),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LessonHeading {
    pub lesson: LessonId,
    pub name: String,
    pub questions: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub total: usize,
    /// "Question 3 of 20".
    pub progress_label: String,
    pub progress_percent: u8,
    pub lesson: LessonId,
    pub lesson_name: String,
    pub prompt: String,
    pub prompt_html: String,
    pub body: QuestionBody,
    /// Present once the question has been answered.
    pub feedback: Option<FeedbackView>,
    /// Present once the question has been answered.
    pub next_label: Option<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionBody {
    Choice {
        options: Vec<OptionView>,
    },
    Calculation {
        unit: String,
        /// The submitted value, once answered.
        value: Option<f64>,
        state: InputState,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptionView {
    pub text: String,
    pub text_html: String,
    pub state: OptionState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionState {
    /// Selectable.
    Open,
    /// Answered; neither the right answer nor the learner's pick.
    Disabled,
    Correct,
    /// The learner's wrong pick.
    Incorrect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputState {
    Open,
    Correct,
    Incorrect,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedbackView {
    pub correct: bool,
    pub heading: &'static str,
    /// Only for wrong calculation answers, e.g. "The correct answer is £1,250."
    pub correct_answer: Option<String>,
    pub explanation: String,
    pub explanation_html: String,
}

impl QuizSession {
    pub fn view(&self) -> View {
        match self.state() {
            QuizState::Welcome => View::Welcome {
                question_count: self.len(),
                lessons: self
                    .bank()
                    .lessons()
                    .iter()
                    .map(|lesson| LessonHeading {
                        lesson: lesson.id,
                        name: lesson.name.clone(),
                        questions: self.bank().count_in_lesson(lesson.id),
                    })
                    .collect(),
            },
            QuizState::InQuestion { index } => match self.bank().get(index) {
                Some(question) => View::Question(self.question_view(index, question)),
                None => View::Results(self.results()),
            },
            QuizState::Interstitial { lesson, .. } => {
                View::Interstitial(self.lesson_summary(lesson))
            }
            QuizState::Results => View::Results(self.results()),
        }
    }

    fn question_view(&self, index: usize, question: &Question) -> QuestionView {
        let total = self.len();
        let submission = self.submission(index);
        let body = match &question.kind {
            QuestionKind::Choice { options, answer } => QuestionBody::Choice {
                options: options
                    .iter()
                    .enumerate()
                    .map(|(i, text)| {
                        let state = match submission.map(|s| s.given) {
                            None => OptionState::Open,
                            Some(_) if i == *answer => OptionState::Correct,
                            Some(Given::Choice(picked)) if picked == i => OptionState::Incorrect,
                            Some(_) => OptionState::Disabled,
                        };
                        OptionView {
                            text: text.clone(),
                            text_html: markdown_to_html_inline(text),
                            state,
                        }
                    })
                    .collect(),
            },
            QuestionKind::Calculation { unit, .. } => QuestionBody::Calculation {
                unit: unit.clone(),
                value: match submission.map(|s| s.given) {
                    Some(Given::Value(v)) => Some(v),
                    _ => None,
                },
                state: match submission {
                    None => InputState::Open,
                    Some(s) if s.correct => InputState::Correct,
                    Some(_) => InputState::Incorrect,
                },
            },
        };
        let feedback = submission.map(|s| FeedbackView {
            correct: s.correct,
            heading: if s.correct { "Correct!" } else { "Incorrect." },
            correct_answer: match &question.kind {
                QuestionKind::Calculation { answer, unit, .. } if !s.correct => Some(format!(
                    "The correct answer is {unit}{}.",
                    format_amount(*answer)
                )),
                _ => None,
            },
            explanation: question.explanation.clone(),
            explanation_html: markdown_to_html(&question.explanation),
        });
        QuestionView {
            index,
            total,
            progress_label: format!("Question {} of {total}", index + 1),
            progress_percent: percent(index, total),
            lesson: question.lesson,
            lesson_name: self
                .bank()
                .lesson(question.lesson)
                .map(|l| l.name.clone())
                .unwrap_or_else(|| question.lesson.to_string()),
            prompt: question.prompt.clone(),
            prompt_html: markdown_to_html(&question.prompt),
            body,
            feedback,
            next_label: submission
                .and(self.next_label())
                .map(|label| label.as_str()),
        }
    }
}

/// Format a number with thousands separators, keeping up to two decimals.
pub fn format_amount(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;
    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if negative && cents > 0 { "-" } else { "" };
    if frac == 0 {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac:02}")
    }
}
