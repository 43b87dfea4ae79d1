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

use clap::Parser;
use clap::Subcommand;
use leasecraft_core::schedule::LeaseForm;

use crate::cmd::check::check_bank;
use crate::cmd::progress::complete_lesson;
use crate::cmd::progress::reset_progress;
use crate::cmd::progress::show_progress;
use crate::cmd::quiz::QuizConfig;
use crate::cmd::quiz::start_quiz;
use crate::cmd::schedule::ScheduleFormat;
use crate::cmd::schedule::print_schedule;
use crate::error::Fallible;
use crate::types::date::Date;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Print the amortization schedule of an operating lease.
    Schedule {
        /// Cost of the leased asset.
        #[arg(long)]
        cost: String,
        /// Value of the asset at the end of the lease.
        #[arg(long)]
        residual: String,
        /// Lease term in months.
        #[arg(long)]
        term: String,
        /// Monthly rental.
        #[arg(long)]
        rental: String,
        /// Initial direct costs. Default is zero.
        #[arg(long)]
        idc: Option<String>,
        /// Start date (YYYY-MM-DD). By default, today.
        #[arg(long)]
        start: Option<String>,
        /// Which output format to use.
        #[arg(long, default_value_t = ScheduleFormat::Table)]
        format: ScheduleFormat,
    },
    /// Take the quiz in the terminal.
    Quiz {
        /// Path to a question bank in TOML. By default, the built-in bank is used.
        #[arg(long)]
        bank: Option<String>,
        /// Directory holding the progress database. By default, the current working directory is used.
        #[arg(long)]
        data_dir: Option<String>,
    },
    /// Commands relating to course progress.
    Progress {
        #[command(subcommand)]
        command: ProgressCommand,
    },
    /// Check that a question bank file is valid.
    CheckBank {
        /// Path to the question bank.
        file: String,
    },
}

#[derive(Subcommand)]
enum ProgressCommand {
    /// Show completed lessons, the best quiz score and overall progress.
    Show {
        /// Directory holding the progress database. By default, the current working directory is used.
        #[arg(long)]
        data_dir: Option<String>,
    },
    /// Mark a lesson as completed.
    Complete {
        /// The lesson number, 1 to 4.
        lesson: u8,
        /// Directory holding the progress database. By default, the current working directory is used.
        #[arg(long)]
        data_dir: Option<String>,
    },
    /// Forget all progress.
    Reset {
        /// Directory holding the progress database. By default, the current working directory is used.
        #[arg(long)]
        data_dir: Option<String>,
    },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Schedule {
            cost,
            residual,
            term,
            rental,
            idc,
            start,
            format,
        } => {
            let form = LeaseForm {
                asset_cost: Some(cost),
                residual_value: Some(residual),
                term: Some(term),
                rental_amount: Some(rental),
                initial_direct_costs: idc,
                start_date: Some(start.unwrap_or_else(|| Date::today().to_string())),
            };
            print_schedule(form, format, &mut std::io::stdout().lock())
        }
        Command::Quiz { bank, data_dir } => start_quiz(QuizConfig { bank, data_dir }),
        Command::Progress { command } => match command {
            ProgressCommand::Show { data_dir } => show_progress(data_dir),
            ProgressCommand::Complete { lesson, data_dir } => complete_lesson(lesson, data_dir),
            ProgressCommand::Reset { data_dir } => reset_progress(data_dir),
        },
        Command::CheckBank { file } => check_bank(file),
    }
}
