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

//! The quiz in a terminal: one screen per [`View`], one line of input per
//! prompt.

use std::fs::read_to_string;
use std::io::BufRead;
use std::io::Write;

use leasecraft_core::markdown::markdown_to_text;
use leasecraft_core::progress::store::BlobStore;
use leasecraft_core::progress::store::ProgressStore;
use leasecraft_core::quiz::bank::QuestionBank;
use leasecraft_core::quiz::session::LessonSummary;
use leasecraft_core::quiz::session::QuizError;
use leasecraft_core::quiz::session::QuizResults;
use leasecraft_core::quiz::session::QuizSession;
use leasecraft_core::quiz::session::Response;
use leasecraft_core::quiz::view::OptionState;
use leasecraft_core::quiz::view::QuestionBody;
use leasecraft_core::quiz::view::QuestionView;
use leasecraft_core::quiz::view::View;

use crate::db::Database;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::types::timestamp::Timestamp;

pub struct QuizConfig {
    pub bank: Option<String>,
    pub data_dir: Option<String>,
}

/// Load the bank at `path`, or the built-in one.
pub fn load_bank(path: Option<String>) -> Fallible<QuestionBank> {
    match path {
        Some(path) => {
            let text = read_to_string(&path)
                .map_err(|e| ErrorReport::new(format!("failed to read '{path}': {e}")))?;
            QuestionBank::from_toml(&text)
        }
        None => QuestionBank::builtin(),
    }
}

pub fn start_quiz(config: QuizConfig) -> Fallible<()> {
    let bank = load_bank(config.bank)?;
    let mut store = BlobStore::new(Database::in_directory(config.data_dir)?);
    let mut input = std::io::stdin().lock();
    let mut output = std::io::stdout().lock();
    run_quiz(bank, &mut store, &mut input, &mut output, Timestamp::now)
}

/// Drive a quiz session from `input` until the learner declines a retake or
/// the input ends.
pub fn run_quiz<S, R, W>(
    bank: QuestionBank,
    store: &mut S,
    input: &mut R,
    out: &mut W,
    clock: impl Fn() -> Timestamp,
) -> Fallible<()>
where
    S: ProgressStore + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut session = QuizSession::new(bank);
    loop {
        match session.view() {
            View::Welcome {
                question_count,
                lessons,
            } => {
                writeln!(out, "Operating lease quiz: {question_count} questions.")?;
                for lesson in &lessons {
                    writeln!(
                        out,
                        "  {}: {} ({} questions)",
                        lesson.lesson, lesson.name, lesson.questions
                    )?;
                }
                if prompt(input, out, "Press Enter to start.")?.is_none() {
                    return Ok(());
                }
                session.start()?;
            }
            View::Question(question) => {
                write_question(&question, out)?;
                if question.feedback.is_none() {
                    let Some(line) = prompt(input, out, "Your answer:")? else {
                        return Ok(());
                    };
                    let Some(response) = read_response(&question, &line, out)? else {
                        continue;
                    };
                    match session.submit_answer(question.index, response) {
                        Ok(_) => {}
                        Err(
                            e @ (QuizError::InputParse { .. }
                            | QuizError::OptionOutOfRange { .. }
                            | QuizError::ResponseMismatch { .. }),
                        ) => writeln!(out, "{}", capitalize(&e.to_string()))?,
                        Err(e) => return Err(e.into()),
                    }
                } else {
                    let label = question.next_label.unwrap_or("Next");
                    if prompt(input, out, &format!("[Enter] {label}"))?.is_none() {
                        return Ok(());
                    }
                    session.advance(store, clock())?;
                }
            }
            View::Interstitial(summary) => {
                write_summary(&summary, out)?;
                let next = match (summary.next_lesson, &summary.next_lesson_name) {
                    (Some(lesson), Some(name)) => format!("[Enter] Continue to {lesson}: {name}"),
                    _ => "[Enter] Continue".to_string(),
                };
                if prompt(input, out, &next)?.is_none() {
                    return Ok(());
                }
                session.continue_quiz()?;
            }
            View::Results(results) => {
                write_results(&results, out)?;
                match prompt(input, out, "Retake the quiz? [y/N]")? {
                    Some(answer) if answer.trim().eq_ignore_ascii_case("y") => session.reset(),
                    _ => return Ok(()),
                }
            }
        }
    }
}

/// Print `text` and read one line. `None` at end of input.
fn prompt(input: &mut impl BufRead, out: &mut impl Write, text: &str) -> Fallible<Option<String>> {
    write!(out, "{text} ")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        writeln!(out)?;
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Turn a typed line into a response. Options are numbered from 1 on screen.
fn read_response(
    question: &QuestionView,
    line: &str,
    out: &mut impl Write,
) -> Fallible<Option<Response>> {
    match &question.body {
        QuestionBody::Choice { options } => match line.trim().parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => Ok(Some(Response::Choice(n - 1))),
            _ => {
                writeln!(
                    out,
                    "Please enter a number between 1 and {}.",
                    options.len()
                )?;
                Ok(None)
            }
        },
        QuestionBody::Calculation { .. } => Ok(Some(Response::Value(line.to_string()))),
    }
}

fn write_question(question: &QuestionView, out: &mut impl Write) -> Fallible<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{} ({}%), {}: {}",
        question.progress_label, question.progress_percent, question.lesson, question.lesson_name
    )?;
    writeln!(out, "{}", markdown_to_text(&question.prompt))?;
    match &question.body {
        QuestionBody::Choice { options } => {
            for (i, option) in options.iter().enumerate() {
                let marker = match option.state {
                    OptionState::Open | OptionState::Disabled => " ",
                    OptionState::Correct => "+",
                    OptionState::Incorrect => "x",
                };
                writeln!(out, " {marker} {}. {}", i + 1, markdown_to_text(&option.text))?;
            }
        }
        QuestionBody::Calculation { unit, value, .. } => {
            if let Some(value) = value {
                writeln!(out, "   You answered {unit}{value}")?;
            } else if !unit.is_empty() {
                writeln!(out, "   (answer in {unit})")?;
            }
        }
    }
    if let Some(feedback) = &question.feedback {
        writeln!(out)?;
        writeln!(out, "{}", feedback.heading)?;
        if let Some(correct) = &feedback.correct_answer {
            writeln!(out, "{correct}")?;
        }
        writeln!(out, "{}", markdown_to_text(&feedback.explanation))?;
    }
    Ok(())
}

fn write_summary(summary: &LessonSummary, out: &mut impl Write) -> Fallible<()> {
    writeln!(out)?;
    writeln!(out, "{} complete: {}", summary.lesson, summary.name)?;
    writeln!(
        out,
        "You scored {}/{} ({}%).",
        summary.tally.correct, summary.tally.total, summary.percent
    )?;
    writeln!(out, "{}", summary.message)?;
    Ok(())
}

fn write_results(results: &QuizResults, out: &mut impl Write) -> Fallible<()> {
    writeln!(out)?;
    writeln!(
        out,
        "Final score: {}/{} ({}%)",
        results.score, results.total, results.percent
    )?;
    writeln!(out, "{}", results.message)?;
    writeln!(out)?;
    for row in &results.breakdown {
        writeln!(
            out,
            "  {}: {:<32} {}/{} ({}%) {}",
            row.lesson, row.name, row.tally.correct, row.tally.total, row.percent, row.status
        )?;
        if row.review_suggested {
            writeln!(out, "      Review: {}", row.url)?;
        }
    }
    Ok(())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use leasecraft_core::progress::store::MemoryStore;
    use leasecraft_core::quiz::bank::QuestionKind;

    use super::*;

    fn clock() -> Timestamp {
        Timestamp::try_from("2024-06-01T12:00:00.000".to_string()).unwrap()
    }

    /// Keystrokes that answer every question, right or wrong.
    fn script(bank: &QuestionBank, right: impl Fn(usize) -> bool) -> String {
        let mut lines = vec![String::new()];
        for (index, question) in bank.questions().iter().enumerate() {
            let answer = match &question.kind {
                QuestionKind::Choice { options, answer } => {
                    let pick = if right(index) {
                        *answer
                    } else {
                        (answer + 1) % options.len()
                    };
                    (pick + 1).to_string()
                }
                QuestionKind::Calculation { answer, .. } => {
                    if right(index) {
                        answer.to_string()
                    } else {
                        (answer + 100.0).to_string()
                    }
                }
            };
            lines.push(answer);
            lines.push(String::new());
            if index + 1 < bank.len() && bank.is_last_in_lesson(index) {
                lines.push(String::new());
            }
        }
        lines.join("\n") + "\n"
    }

    fn run(bank: QuestionBank, keys: &str, store: &mut MemoryStore) -> Fallible<String> {
        let mut input = Cursor::new(keys.as_bytes().to_vec());
        let mut out = Vec::new();
        run_quiz(bank, store, &mut input, &mut out, clock)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_perfect_run() -> Fallible<()> {
        let bank = QuestionBank::builtin()?;
        let keys = script(&bank, |_| true) + "n\n";
        let mut store = MemoryStore::in_memory();
        let text = run(bank, &keys, &mut store)?;
        assert!(text.contains("Question 1 of 20 (0%)"));
        assert!(text.contains("Lesson 1 complete"));
        assert!(text.contains("Final score: 20/20 (100%)"));
        assert!(!text.contains("Review:"));
        let best = store.best_quiz_attempt()?.unwrap();
        assert_eq!((best.score, best.total), (20, 20));
        Ok(())
    }

    #[test]
    fn test_wrong_answers_suggest_review() -> Fallible<()> {
        let bank = QuestionBank::builtin()?;
        let keys = script(&bank, |index| index >= 5) + "\n";
        let mut store = MemoryStore::in_memory();
        let text = run(bank, &keys, &mut store)?;
        assert!(text.contains("Incorrect."));
        assert!(text.contains("Final score: 15/20 (75%)"));
        assert!(text.contains("Review: lessons/01-what-is-operating-lease.html"));
        assert_eq!(store.overall_progress_percent()?, 20);
        Ok(())
    }

    #[test]
    fn test_bad_input_is_retried() -> Fallible<()> {
        let bank = QuestionBank::builtin()?;
        let keys = script(&bank, |_| true);
        let keys = keys.replacen("\n", "\nseven\n9\n", 1) + "n\n";
        let mut store = MemoryStore::in_memory();
        let text = run(bank, &keys, &mut store)?;
        assert_eq!(text.matches("Please enter a number between 1 and 4.").count(), 2);
        assert!(text.contains("Final score: 20/20 (100%)"));
        Ok(())
    }

    #[test]
    fn test_unparseable_calculation_is_retried() -> Fallible<()> {
        let bank = QuestionBank::builtin()?;
        let keys = script(&bank, |_| true);
        let mut lines: Vec<&str> = keys.lines().collect();
        let answer_line = lines
            .iter()
            .position(|line| *line == "1250")
            .unwrap();
        lines.insert(answer_line, "lots");
        let keys = lines.join("\n") + "\nn\n";
        let mut store = MemoryStore::in_memory();
        let text = run(bank, &keys, &mut store)?;
        assert!(text.contains("'lots' is not a number."));
        assert!(text.contains("Final score: 20/20 (100%)"));
        Ok(())
    }

    #[test]
    fn test_end_of_input_records_nothing() -> Fallible<()> {
        let bank = QuestionBank::builtin()?;
        let mut store = MemoryStore::in_memory();
        let text = run(bank, "\n2\n\n", &mut store)?;
        assert!(text.contains("Question 2 of 20"));
        assert_eq!(store.best_quiz_attempt()?, None);
        Ok(())
    }

    #[test]
    fn test_retake() -> Fallible<()> {
        let bank = QuestionBank::builtin()?;
        let keys = script(&bank, |_| true) + "y\n" + &script(&bank, |_| false) + "n\n";
        let mut store = MemoryStore::in_memory();
        let text = run(bank, &keys, &mut store)?;
        assert!(text.contains("Final score: 20/20 (100%)"));
        assert!(text.contains("Final score: 0/20 (0%)"));
        assert_eq!(store.load()?.quiz_scores.len(), 2);
        let best = store.best_quiz_attempt()?.unwrap();
        assert_eq!(best.score, 20);
        Ok(())
    }

    #[test]
    fn test_load_bank_from_file() -> Fallible<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bank.toml");
        std::fs::write(
            &path,
            r#"
[[lessons]]
number = 1
name = "Only"
url = "only.html"

[[questions]]
lesson = 1
kind = "choice"
prompt = "Yes?"
options = ["No", "Yes"]
answer = 1
explanation = "Yes."
"#,
        )?;
        let bank = load_bank(Some(path.display().to_string()))?;
        assert_eq!(bank.len(), 1);
        assert!(load_bank(Some(dir.path().join("missing.toml").display().to_string())).is_err());
        Ok(())
    }
}
