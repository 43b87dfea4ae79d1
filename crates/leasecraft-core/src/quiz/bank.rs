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

use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::lesson::LessonId;

/// The question bank that ships with the course.
const BUILTIN_BANK: &str = include_str!("bank.toml");

/// Tolerance used by calculation questions that don't specify one.
pub const DEFAULT_TOLERANCE: f64 = 1.0;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Lesson {
    pub id: LessonId,
    pub name: String,
    /// Where to review the lesson.
    pub url: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum QuestionKind {
    Choice {
        options: Vec<String>,
        /// Index into `options`.
        answer: usize,
    },
    Calculation {
        answer: f64,
        tolerance: f64,
        unit: String,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Question {
    pub lesson: LessonId,
    /// Markdown.
    pub prompt: String,
    pub kind: QuestionKind,
    /// Markdown.
    pub explanation: String,
}

impl Question {
    pub fn is_calculation(&self) -> bool {
        matches!(self.kind, QuestionKind::Calculation { .. })
    }
}

/// An ordered list of questions, grouped by lesson.
#[derive(Clone, Debug, PartialEq)]
pub struct QuestionBank {
    lessons: Vec<Lesson>,
    questions: Vec<Question>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBank {
    lessons: Vec<RawLesson>,
    questions: Vec<RawQuestion>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLesson {
    number: u8,
    name: String,
    url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawKind {
    Choice,
    Calculation,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawQuestion {
    lesson: u8,
    kind: RawKind,
    prompt: String,
    options: Option<Vec<String>>,
    answer: f64,
    tolerance: Option<f64>,
    unit: Option<String>,
    explanation: String,
}

impl QuestionBank {
    pub fn new(lessons: Vec<Lesson>, questions: Vec<Question>) -> Fallible<Self> {
        if questions.is_empty() {
            return fail("question bank has no questions");
        }
        let mut declared: HashSet<LessonId> = HashSet::new();
        for lesson in &lessons {
            if !declared.insert(lesson.id) {
                return fail(format!("{} is declared twice", lesson.id));
            }
        }
        for (idx, question) in questions.iter().enumerate() {
            let number = idx + 1;
            if !declared.contains(&question.lesson) {
                return fail(format!(
                    "question {number} belongs to {}, which is not declared",
                    question.lesson
                ));
            }
            match &question.kind {
                QuestionKind::Choice { options, answer } => {
                    if options.len() < 2 {
                        return fail(format!("question {number} needs at least two options"));
                    }
                    if *answer >= options.len() {
                        return fail(format!(
                            "question {number} has answer {answer} but only {} options",
                            options.len()
                        ));
                    }
                }
                QuestionKind::Calculation {
                    answer, tolerance, ..
                } => {
                    if !answer.is_finite() {
                        return fail(format!("question {number} has a non-numeric answer"));
                    }
                    if !tolerance.is_finite() || *tolerance < 0.0 {
                        return fail(format!("question {number} has an invalid tolerance"));
                    }
                }
            }
        }
        Ok(Self { lessons, questions })
    }

    /// Parse a question bank from TOML.
    pub fn from_toml(text: &str) -> Fallible<Self> {
        let raw: RawBank = toml::from_str(text)?;
        let lessons = raw
            .lessons
            .into_iter()
            .map(|lesson| {
                Ok(Lesson {
                    id: LessonId::new(lesson.number)?,
                    name: lesson.name,
                    url: lesson.url,
                })
            })
            .collect::<Fallible<Vec<_>>>()?;
        let questions = raw
            .questions
            .into_iter()
            .enumerate()
            .map(|(idx, q)| q.into_question(idx + 1))
            .collect::<Fallible<Vec<_>>>()?;
        Self::new(lessons, questions)
    }

    pub fn builtin() -> Fallible<Self> {
        Self::from_toml(BUILTIN_BANK)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn lesson(&self, id: LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|lesson| lesson.id == id)
    }

    /// How many questions belong to the given lesson.
    pub fn count_in_lesson(&self, id: LessonId) -> usize {
        self.questions.iter().filter(|q| q.lesson == id).count()
    }

    /// Whether the question at `index` is the last one before the lesson
    /// changes. The final question counts as the last of its lesson.
    pub fn is_last_in_lesson(&self, index: usize) -> bool {
        match (self.questions.get(index), self.questions.get(index + 1)) {
            (Some(current), Some(next)) => current.lesson != next.lesson,
            _ => true,
        }
    }
}

impl RawQuestion {
    fn into_question(self, number: usize) -> Fallible<Question> {
        let lesson = LessonId::new(self.lesson)?;
        let kind = match self.kind {
            RawKind::Choice => {
                if self.tolerance.is_some() || self.unit.is_some() {
                    return fail(format!(
                        "question {number} is a choice question but has a tolerance or unit"
                    ));
                }
                let options = self.options.ok_or_else(|| {
                    ErrorReport::new(format!("question {number} is missing its options"))
                })?;
                if self.answer < 0.0 || self.answer.fract() != 0.0 {
                    return fail(format!(
                        "question {number} must name its answer by option index"
                    ));
                }
                QuestionKind::Choice {
                    options,
                    answer: self.answer as usize,
                }
            }
            RawKind::Calculation => {
                if self.options.is_some() {
                    return fail(format!(
                        "question {number} is a calculation question but has options"
                    ));
                }
                QuestionKind::Calculation {
                    answer: self.answer,
                    tolerance: self.tolerance.unwrap_or(DEFAULT_TOLERANCE),
                    unit: self.unit.unwrap_or_default(),
                }
            }
        };
        Ok(Question {
            lesson,
            prompt: self.prompt,
            kind,
            explanation: self.explanation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daycount::daily_rate;
    use crate::schedule::LeaseInput;
    use crate::schedule::compute_schedule;
    use crate::types::date::Date;

    const SMALL_BANK: &str = r#"
[[lessons]]
number = 1
name = "One"
url = "one.html"

[[lessons]]
number = 2
name = "Two"
url = "two.html"

[[questions]]
lesson = 1
kind = "choice"
prompt = "Pick B."
options = ["A", "B"]
answer = 1
explanation = "B it is."

[[questions]]
lesson = 2
kind = "calculation"
prompt = "2 + 2?"
answer = 4
explanation = "Four."
"#;

    #[test]
    fn test_parse_small_bank() -> Fallible<()> {
        let bank = QuestionBank::from_toml(SMALL_BANK)?;
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.lessons().len(), 2);
        assert_eq!(
            bank.get(0).map(|q| &q.kind),
            Some(&QuestionKind::Choice {
                options: vec!["A".to_string(), "B".to_string()],
                answer: 1,
            })
        );
        assert_eq!(
            bank.get(1).map(|q| &q.kind),
            Some(&QuestionKind::Calculation {
                answer: 4.0,
                tolerance: DEFAULT_TOLERANCE,
                unit: String::new(),
            })
        );
        assert!(bank.get(1).is_some_and(Question::is_calculation));
        assert!(bank.is_last_in_lesson(0));
        assert!(bank.is_last_in_lesson(1));
        Ok(())
    }

    #[test]
    fn test_builtin_bank() -> Fallible<()> {
        let bank = QuestionBank::builtin()?;
        assert_eq!(bank.len(), 20);
        let counts: Vec<usize> = LessonId::all().map(|id| bank.count_in_lesson(id)).collect();
        assert_eq!(counts, vec![5, 4, 6, 5]);
        assert_eq!(
            bank.lesson(LessonId::new(3)?).map(|l| l.name.as_str()),
            Some("Depreciation & IDCs")
        );
        assert!(!bank.is_last_in_lesson(0));
        assert!(bank.is_last_in_lesson(4));
        Ok(())
    }

    #[test]
    fn test_builtin_calculations_agree_with_engine() -> Fallible<()> {
        let bank = QuestionBank::builtin()?;
        let answers: Vec<f64> = bank
            .questions()
            .iter()
            .filter_map(|q| match q.kind {
                QuestionKind::Calculation { answer, .. } => Some(answer),
                _ => None,
            })
            .collect();
        assert_eq!(answers, vec![1250.0, 50.0, 100.0]);

        let schedule = compute_schedule(&LeaseInput {
            asset_cost: 80000.0,
            residual_value: 20000.0,
            term: 48,
            rental_amount: 1500.0,
            initial_direct_costs: 0.0,
            start_date: Date::from_ymd(2024, 1, 1)?,
        })?;
        assert_eq!(schedule.summary.monthly_depreciation, answers[0]);
        assert_eq!(daily_rate(36000.0, 24)?, answers[1]);
        let schedule = compute_schedule(&LeaseInput {
            asset_cost: 10000.0,
            residual_value: 1000.0,
            term: 36,
            rental_amount: 500.0,
            initial_direct_costs: 3600.0,
            start_date: Date::from_ymd(2024, 1, 1)?,
        })?;
        assert_eq!(schedule.summary.monthly_idc, answers[2]);
        Ok(())
    }

    #[test]
    fn test_rejects_bad_answer_index() {
        let text = SMALL_BANK.replace("answer = 1", "answer = 2");
        assert!(QuestionBank::from_toml(&text).is_err());
    }

    #[test]
    fn test_rejects_undeclared_lesson() {
        let text = SMALL_BANK.replace("lesson = 2", "lesson = 3");
        assert!(QuestionBank::from_toml(&text).is_err());
    }

    #[test]
    fn test_rejects_choice_without_options() {
        let text = SMALL_BANK.replace("options = [\"A\", \"B\"]\n", "");
        assert!(QuestionBank::from_toml(&text).is_err());
    }

    #[test]
    fn test_rejects_negative_tolerance() {
        let text = SMALL_BANK.replace("answer = 4", "answer = 4\ntolerance = -1");
        assert!(QuestionBank::from_toml(&text).is_err());
    }

    #[test]
    fn test_rejects_empty_bank() {
        assert!(QuestionBank::new(Vec::new(), Vec::new()).is_err());
    }
}
