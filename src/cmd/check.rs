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

use std::io::Write;

use crate::cmd::quiz::load_bank;
use crate::error::Fallible;

pub fn check_bank(file: String) -> Fallible<()> {
    let mut stdout = std::io::stdout().lock();
    write_bank_check(file, &mut stdout)
}

fn write_bank_check(file: String, out: &mut impl Write) -> Fallible<()> {
    let bank = load_bank(Some(file))?;
    for lesson in bank.lessons() {
        log::debug!(
            "{}: {} questions",
            lesson.id,
            bank.count_in_lesson(lesson.id)
        );
    }
    writeln!(
        out,
        "ok: {} questions in {} lessons.",
        bank.len(),
        bank.lessons().len()
    )?;
    Ok(())
}
