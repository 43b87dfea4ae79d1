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

use serde::Serialize;

/// `correct / total` as a whole percentage, rounded half up. Zero when there
/// is nothing to score.
pub fn percent(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (correct as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Correct answers out of the questions in one lesson.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LessonTally {
    pub correct: usize,
    pub total: usize,
}

impl LessonTally {
    pub fn percent(&self) -> u8 {
        percent(self.correct, self.total)
    }
}

/// How well a lesson went, shown between lessons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonTier {
    Strong,
    Moderate,
    Weak,
}

impl LessonTier {
    pub fn from_percent(pct: u8) -> Self {
        match pct {
            80.. => LessonTier::Strong,
            50..=79 => LessonTier::Moderate,
            _ => LessonTier::Weak,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            LessonTier::Strong => "Impressive! You really know your stuff!",
            LessonTier::Moderate => "Not bad! Room to grow though.",
            LessonTier::Weak => "Keep learning, you'll get there!",
        }
    }
}

/// The message shown after a lesson. A perfect lesson gets its own message
/// on top of the [`LessonTier::Strong`] one.
pub fn lesson_message(pct: u8) -> &'static str {
    if pct >= 100 {
        "Perfect! You're a lease legend!"
    } else {
        LessonTier::from_percent(pct).message()
    }
}

/// The verdict on the whole quiz.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalTier {
    Perfect,
    Excellent,
    Great,
    Good,
    NeedsReview,
}

impl FinalTier {
    pub fn from_percent(pct: u8) -> Self {
        match pct {
            100.. => FinalTier::Perfect,
            90..=99 => FinalTier::Excellent,
            80..=89 => FinalTier::Great,
            60..=79 => FinalTier::Good,
            _ => FinalTier::NeedsReview,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            FinalTier::Perfect => "Perfect score! You've mastered operating lease accounting!",
            FinalTier::Excellent => {
                "Excellent! Nearly flawless. Are you sure you're not an accountant?"
            }
            FinalTier::Great => "Great work! Just a few gaps to fill. You're almost there!",
            FinalTier::Good => {
                "Good effort! A quick review of the highlighted lessons will get you to the top."
            }
            FinalTier::NeedsReview => {
                "Don't worry, even the best accountants had to start somewhere. Review and try again!"
            }
        }
    }
}

/// The verdict on one lesson in the final breakdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownTier {
    Excellent,
    ReviewRecommended,
    NeedsMoreStudy,
}

impl BreakdownTier {
    pub fn from_percent(pct: u8) -> Self {
        match pct {
            80.. => BreakdownTier::Excellent,
            50..=79 => BreakdownTier::ReviewRecommended,
            _ => BreakdownTier::NeedsMoreStudy,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BreakdownTier::Excellent => "Excellent!",
            BreakdownTier::ReviewRecommended => "Review recommended",
            BreakdownTier::NeedsMoreStudy => "Needs more study",
        }
    }
}
