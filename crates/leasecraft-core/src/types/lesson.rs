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

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;

/// The number of lessons in the course.
pub const LESSON_COUNT: u8 = 4;

const PREFIX: &str = "lesson-";

/// Identifies one of the course's lessons, numbered from 1.
///
/// In the progress record a lesson is keyed by its slug, e.g. `lesson-3`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LessonId(u8);

impl LessonId {
    pub fn new(number: u8) -> Fallible<Self> {
        if (1..=LESSON_COUNT).contains(&number) {
            Ok(Self(number))
        } else {
            fail(format!(
                "lesson number must be between 1 and {LESSON_COUNT}, got {number}"
            ))
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = LessonId> {
        (1..=LESSON_COUNT).map(LessonId)
    }

    pub fn slug(self) -> String {
        format!("{PREFIX}{}", self.0)
    }

    /// Parse a slug such as `lesson-2`. A bare number is accepted too.
    pub fn from_slug(slug: &str) -> Fallible<Self> {
        let digits = slug.strip_prefix(PREFIX).unwrap_or(slug);
        let number: u8 = digits
            .parse()
            .map_err(|_| ErrorReport::new(format!("invalid lesson id: '{slug}'")))?;
        Self::new(number)
    }
}

impl Display for LessonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lesson {}", self.0)
    }
}

impl TryFrom<u8> for LessonId {
    type Error = ErrorReport;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LessonId> for u8 {
    fn from(lesson: LessonId) -> u8 {
        lesson.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range() {
        assert!(LessonId::new(0).is_err());
        assert!(LessonId::new(1).is_ok());
        assert!(LessonId::new(4).is_ok());
        assert!(LessonId::new(5).is_err());
    }

    #[test]
    fn test_slug() -> Fallible<()> {
        let lesson = LessonId::new(3)?;
        assert_eq!(lesson.slug(), "lesson-3");
        assert_eq!(LessonId::from_slug("lesson-3")?, lesson);
        assert_eq!(LessonId::from_slug("3")?, lesson);
        assert!(LessonId::from_slug("lesson-x").is_err());
        assert!(LessonId::from_slug("lesson-9").is_err());
        Ok(())
    }

    #[test]
    fn test_all() {
        let numbers: Vec<u8> = LessonId::all().map(LessonId::number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }
}
