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

//! The 30/360 day count convention: every month has 30 days and every year
//! has 360.

use crate::error::Fallible;
use crate::error::fail;
use crate::types::date::Date;

pub const DAYS_PER_MONTH: u32 = 30;

pub const DAYS_PER_YEAR: u32 = 360;

/// Days in a term of the given number of months.
pub fn days_in_term(months: u32) -> Fallible<u32> {
    match months.checked_mul(DAYS_PER_MONTH) {
        Some(days) => Ok(days),
        None => fail(format!("a term of {months} months is too long")),
    }
}

/// The amount allocated to each day when `total` is spread evenly over a
/// term of `months` months.
pub fn daily_rate(total: f64, months: u32) -> Fallible<f64> {
    if months == 0 {
        return fail("cannot compute a daily rate over a zero-month term");
    }
    Ok(total / days_in_term(months)? as f64)
}

/// Days from `start` to `end` under the 30/360 US rule:
///
/// - a start on the last day of February counts as the 30th, and so does
///   the end when it is also the last day of February;
/// - a 31st start counts as the 30th;
/// - a 31st end counts as the 30th when the start is on the 30th or 31st.
pub fn days_between(start: Date, end: Date) -> i64 {
    let start_feb_end = start.month() == 2 && start.is_month_end();
    let end_feb_end = end.month() == 2 && end.is_month_end();
    let mut d1 = start.day();
    let mut d2 = end.day();
    if start_feb_end && end_feb_end {
        d2 = 30;
    }
    if start_feb_end {
        d1 = 30;
    }
    if d2 == 31 && d1 >= 30 {
        d2 = 30;
    }
    if d1 == 31 {
        d1 = 30;
    }
    let years = (end.year() - start.year()) as i64;
    let months = end.month() as i64 - start.month() as i64;
    years * DAYS_PER_YEAR as i64 + months * DAYS_PER_MONTH as i64 + (d2 as i64 - d1 as i64)
}
