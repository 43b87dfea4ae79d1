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
use std::io::Write;

use clap::ValueEnum;
use leasecraft_core::schedule::LeaseForm;
use leasecraft_core::schedule::Schedule;
use leasecraft_core::schedule::compute_schedule;

use crate::error::Fallible;

#[derive(ValueEnum, Clone, Copy, PartialEq, Debug)]
pub enum ScheduleFormat {
    /// A fixed-width table.
    Table,
    /// The schedule and its summary as JSON.
    Json,
}

impl Display for ScheduleFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleFormat::Table => write!(f, "table"),
            ScheduleFormat::Json => write!(f, "json"),
        }
    }
}

pub fn print_schedule(form: LeaseForm, format: ScheduleFormat, out: &mut impl Write) -> Fallible<()> {
    let input = form.into_input()?;
    let schedule = compute_schedule(&input)?;
    log::debug!("Computed {} periods", schedule.periods.len());
    match format {
        ScheduleFormat::Table => write_table(&schedule, out)?,
        ScheduleFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &schedule)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn write_table(schedule: &Schedule, out: &mut impl Write) -> Fallible<()> {
    let s = &schedule.summary;
    writeln!(out, "Depreciable amount:   {:>14.2}", s.depreciable_amount)?;
    writeln!(out, "Monthly rental:       {:>14.2}", s.monthly_rental_income)?;
    writeln!(out, "Monthly depreciation: {:>14.2}", s.monthly_depreciation)?;
    writeln!(out, "Monthly IDC expense:  {:>14.2}", s.monthly_idc)?;
    writeln!(out, "Net monthly income:   {:>14.2}", s.net_monthly_income)?;
    writeln!(out)?;
    writeln!(
        out,
        "{:>6}  {:<10}  {:<10}  {:>4}  {:>12}  {:>12}  {:>10}  {:>14}  {:>12}",
        "Period", "Start", "End", "Days", "Rental", "Depreciation", "IDC", "Net Book Value", "IDC Balance"
    )?;
    for p in &schedule.periods {
        writeln!(
            out,
            "{:>6}  {:<10}  {:<10}  {:>4}  {:>12.2}  {:>12.2}  {:>10.2}  {:>14.2}  {:>12.2}",
            p.period,
            p.start_date.to_string(),
            p.end_date.to_string(),
            p.days,
            p.rental_income,
            p.depreciation,
            p.idc_expense,
            p.net_book_value,
            p.idc_balance
        )?;
    }
    writeln!(
        out,
        "{:>6}  {:<10}  {:<10}  {:>4}  {:>12.2}  {:>12.2}  {:>10.2}",
        "Total", "", "", "", s.total_rental_income, s.total_depreciation, s.total_idc_expense
    )?;
    Ok(())
}
