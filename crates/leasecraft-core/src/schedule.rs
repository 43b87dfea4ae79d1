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

//! Straight-line operating lease schedule: depreciation from cost down to
//! residual value, flat rental income, and initial direct costs amortized
//! evenly over the term.

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::daycount::days_between;
use crate::types::date::Date;

/// Longest term accepted, in monthly periods.
pub const MAX_TERM: i64 = 1200;

/// The fields of the lease input form.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Field {
    AssetCost,
    ResidualValue,
    Term,
    RentalAmount,
    InitialDirectCosts,
    StartDate,
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Field::AssetCost => "asset cost",
            Field::ResidualValue => "residual value",
            Field::Term => "lease term",
            Field::RentalAmount => "rental amount",
            Field::InitialDirectCosts => "initial direct costs",
            Field::StartDate => "start date",
        };
        write!(f, "{label}")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValidationError {
    /// A required field was absent or blank.
    Missing(Field),
    /// A numeric field was unparseable, NaN or infinite.
    NotANumber(Field),
    /// A required numeric field was zero.
    Zero(Field),
    Negative(Field),
    ResidualNotBelowCost { residual: f64, cost: f64 },
    NonPositiveTerm(i64),
    TermTooLong(i64),
    InvalidStartDate(String),
    DateOutOfRange,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Missing(field) => write!(f, "{field} is required."),
            ValidationError::NotANumber(field) => write!(f, "{field} must be a number."),
            ValidationError::Zero(field) => write!(f, "{field} must not be zero."),
            ValidationError::Negative(field) => write!(f, "{field} must not be negative."),
            ValidationError::ResidualNotBelowCost { residual, cost } => write!(
                f,
                "residual value ({residual}) must be less than asset cost ({cost})."
            ),
            ValidationError::NonPositiveTerm(term) => {
                write!(f, "lease term must be greater than zero, got {term}.")
            }
            ValidationError::TermTooLong(term) => {
                write!(f, "lease term must be at most {MAX_TERM} periods, got {term}.")
            }
            ValidationError::InvalidStartDate(value) => {
                write!(f, "start date '{value}' is not a valid YYYY-MM-DD date.")
            }
            ValidationError::DateOutOfRange => {
                write!(f, "the lease term runs past the supported date range.")
            }
        }
    }
}

impl Error for ValidationError {}

/// Parameters of a single operating lease.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaseInput {
    pub asset_cost: f64,
    pub residual_value: f64,
    /// Number of monthly periods.
    pub term: i64,
    /// Rental income recognised in each period.
    pub rental_amount: f64,
    #[serde(default)]
    pub initial_direct_costs: f64,
    pub start_date: Date,
}

impl LeaseInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        required(self.asset_cost, Field::AssetCost)?;
        required(self.residual_value, Field::ResidualValue)?;
        if self.term == 0 {
            return Err(ValidationError::Zero(Field::Term));
        }
        required(self.rental_amount, Field::RentalAmount)?;
        if self.asset_cost < 0.0 {
            return Err(ValidationError::Negative(Field::AssetCost));
        }
        if !self.initial_direct_costs.is_finite() {
            return Err(ValidationError::NotANumber(Field::InitialDirectCosts));
        }
        if self.initial_direct_costs < 0.0 {
            return Err(ValidationError::Negative(Field::InitialDirectCosts));
        }
        if self.residual_value >= self.asset_cost {
            return Err(ValidationError::ResidualNotBelowCost {
                residual: self.residual_value,
                cost: self.asset_cost,
            });
        }
        if self.term < 0 {
            return Err(ValidationError::NonPositiveTerm(self.term));
        }
        if self.term > MAX_TERM {
            return Err(ValidationError::TermTooLong(self.term));
        }
        Ok(())
    }
}

fn required(value: f64, field: Field) -> Result<(), ValidationError> {
    if !value.is_finite() {
        Err(ValidationError::NotANumber(field))
    } else if value == 0.0 {
        Err(ValidationError::Zero(field))
    } else {
        Ok(())
    }
}

/// The lease form exactly as the user filled it in.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LeaseForm {
    pub asset_cost: Option<String>,
    pub residual_value: Option<String>,
    pub term: Option<String>,
    pub rental_amount: Option<String>,
    pub initial_direct_costs: Option<String>,
    pub start_date: Option<String>,
}

impl LeaseForm {
    /// Parse the form. Only parsing happens here; the business rules are
    /// checked by [`compute_schedule`].
    pub fn into_input(self) -> Result<LeaseInput, ValidationError> {
        let asset_cost = parse_amount(self.asset_cost, Field::AssetCost)?;
        let residual_value = parse_amount(self.residual_value, Field::ResidualValue)?;
        let term_text = present(self.term).ok_or(ValidationError::Missing(Field::Term))?;
        let term: i64 = term_text
            .parse()
            .map_err(|_| ValidationError::NotANumber(Field::Term))?;
        let rental_amount = parse_amount(self.rental_amount, Field::RentalAmount)?;
        let initial_direct_costs = match present(self.initial_direct_costs) {
            Some(text) => text
                .parse::<f64>()
                .map_err(|_| ValidationError::NotANumber(Field::InitialDirectCosts))?,
            None => 0.0,
        };
        let start_text =
            present(self.start_date).ok_or(ValidationError::Missing(Field::StartDate))?;
        let start_date = Date::try_from(start_text.clone())
            .map_err(|_| ValidationError::InvalidStartDate(start_text))?;
        Ok(LeaseInput {
            asset_cost,
            residual_value,
            term,
            rental_amount,
            initial_direct_costs,
            start_date,
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_amount(value: Option<String>, field: Field) -> Result<f64, ValidationError> {
    let text = present(value).ok_or(ValidationError::Missing(field))?;
    text.parse::<f64>()
        .map_err(|_| ValidationError::NotANumber(field))
}

/// One period of the schedule.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SchedulePeriod {
    /// 1-based.
    pub period: u32,
    pub start_date: Date,
    /// Inclusive.
    pub end_date: Date,
    /// Length of the period under the 30/360 convention.
    pub days: i64,
    pub rental_income: f64,
    pub depreciation: f64,
    pub idc_expense: f64,
    pub net_book_value: f64,
    pub idc_balance: f64,
}

/// Per-period rates and whole-term totals.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScheduleSummary {
    pub depreciable_amount: f64,
    pub monthly_depreciation: f64,
    pub monthly_idc: f64,
    pub monthly_rental_income: f64,
    pub net_monthly_income: f64,
    pub total_rental_income: f64,
    pub total_depreciation: f64,
    pub total_idc_expense: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Schedule {
    pub periods: Vec<SchedulePeriod>,
    pub summary: ScheduleSummary,
}

impl Schedule {
    pub fn final_period(&self) -> Option<&SchedulePeriod> {
        self.periods.last()
    }
}

/// Net income recognised each period.
pub fn net_monthly_income(rental_income: f64, depreciation: f64, idc_expense: f64) -> f64 {
    rental_income - depreciation - idc_expense
}

/// Compute the full straight-line schedule for a lease. Fails without any
/// partial output if the input is invalid.
pub fn compute_schedule(input: &LeaseInput) -> Result<Schedule, ValidationError> {
    input.validate()?;
    let term = u32::try_from(input.term).map_err(|_| ValidationError::TermTooLong(input.term))?;

    let depreciable_amount = input.asset_cost - input.residual_value;
    let monthly_depreciation = depreciable_amount / term as f64;
    let monthly_idc = if input.initial_direct_costs == 0.0 {
        0.0
    } else {
        input.initial_direct_costs / term as f64
    };
    let monthly_rental_income = input.rental_amount;

    let mut periods = Vec::with_capacity(term as usize);
    let mut nbv = input.asset_cost;
    let mut idc_balance = input.initial_direct_costs;
    for i in 0..term {
        let start_date = input
            .start_date
            .add_months(i)
            .map_err(|_| ValidationError::DateOutOfRange)?;
        let next_start = input
            .start_date
            .add_months(i + 1)
            .map_err(|_| ValidationError::DateOutOfRange)?;
        let end_date = next_start
            .previous_day()
            .map_err(|_| ValidationError::DateOutOfRange)?;
        nbv = (nbv - monthly_depreciation).max(input.residual_value);
        idc_balance = (idc_balance - monthly_idc).max(0.0);
        periods.push(SchedulePeriod {
            period: i + 1,
            start_date,
            end_date,
            days: days_between(start_date, next_start),
            rental_income: monthly_rental_income,
            depreciation: monthly_depreciation,
            idc_expense: monthly_idc,
            net_book_value: nbv,
            idc_balance,
        });
    }

    let summary = ScheduleSummary {
        depreciable_amount,
        monthly_depreciation,
        monthly_idc,
        monthly_rental_income,
        net_monthly_income: net_monthly_income(
            monthly_rental_income,
            monthly_depreciation,
            monthly_idc,
        ),
        total_rental_income: monthly_rental_income * term as f64,
        total_depreciation: monthly_depreciation * term as f64,
        total_idc_expense: monthly_idc * term as f64,
    };
    log::debug!(
        "Computed {term}-period schedule starting {}",
        input.start_date
    );
    Ok(Schedule { periods, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fallible;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn make_input(cost: f64, residual: f64, term: i64) -> Fallible<LeaseInput> {
        Ok(LeaseInput {
            asset_cost: cost,
            residual_value: residual,
            term,
            rental_amount: 1500.0,
            initial_direct_costs: 0.0,
            start_date: Date::from_ymd(2024, 1, 15)?,
        })
    }

    #[test]
    fn test_even_depreciation() -> Fallible<()> {
        let schedule = compute_schedule(&make_input(80000.0, 20000.0, 48)?)?;
        assert_eq!(schedule.periods.len(), 48);
        for period in &schedule.periods {
            assert_eq!(period.depreciation, 1250.0);
        }
        let last = schedule.final_period().unwrap();
        assert_eq!(last.period, 48);
        assert_eq!(last.net_book_value, 20000.0);
        assert_eq!(schedule.summary.depreciable_amount, 60000.0);
        assert_eq!(schedule.summary.total_depreciation, 60000.0);
        Ok(())
    }

    #[test]
    fn test_nbv_monotone_and_floored() -> Fallible<()> {
        let input = make_input(10000.0, 1000.0, 7)?;
        let schedule = compute_schedule(&input)?;
        assert_eq!(schedule.periods.len(), 7);
        let mut previous = input.asset_cost;
        for period in &schedule.periods {
            assert!(period.net_book_value <= previous);
            assert!(period.net_book_value >= input.residual_value);
            previous = period.net_book_value;
        }
        assert!(approx_eq(previous, 1000.0));
        Ok(())
    }

    #[test]
    fn test_idc_amortization() -> Fallible<()> {
        let mut input = make_input(50000.0, 5000.0, 36)?;
        input.initial_direct_costs = 3600.0;
        let schedule = compute_schedule(&input)?;
        assert_eq!(schedule.summary.monthly_idc, 100.0);
        assert_eq!(schedule.periods[0].idc_expense, 100.0);
        assert_eq!(schedule.periods[0].idc_balance, 3500.0);
        assert_eq!(schedule.final_period().unwrap().idc_balance, 0.0);
        for period in &schedule.periods {
            assert!(period.idc_balance >= 0.0);
        }
        Ok(())
    }

    #[test]
    fn test_no_idc() -> Fallible<()> {
        let schedule = compute_schedule(&make_input(12000.0, 2000.0, 10)?)?;
        assert_eq!(schedule.summary.monthly_idc, 0.0);
        assert!(schedule.periods.iter().all(|p| p.idc_balance == 0.0));
        Ok(())
    }

    #[test]
    fn test_summary() -> Fallible<()> {
        let mut input = make_input(80000.0, 20000.0, 48)?;
        input.initial_direct_costs = 4800.0;
        let schedule = compute_schedule(&input)?;
        let summary = &schedule.summary;
        assert_eq!(summary.monthly_rental_income, 1500.0);
        assert_eq!(summary.monthly_depreciation, 1250.0);
        assert_eq!(summary.monthly_idc, 100.0);
        assert_eq!(summary.net_monthly_income, 150.0);
        assert_eq!(summary.total_rental_income, 72000.0);
        assert_eq!(summary.total_idc_expense, 4800.0);
        assert_eq!(net_monthly_income(1000.0, 600.0, 50.0), 350.0);
        Ok(())
    }

    #[test]
    fn test_period_dates() -> Fallible<()> {
        let schedule = compute_schedule(&make_input(80000.0, 20000.0, 12)?)?;
        let first = &schedule.periods[0];
        assert_eq!(first.start_date, Date::from_ymd(2024, 1, 15)?);
        assert_eq!(first.end_date, Date::from_ymd(2024, 2, 14)?);
        let last = schedule.final_period().unwrap();
        assert_eq!(last.start_date, Date::from_ymd(2024, 12, 15)?);
        assert_eq!(last.end_date, Date::from_ymd(2025, 1, 14)?);
        assert!(schedule.periods.iter().all(|p| p.days == 30));
        Ok(())
    }

    #[test]
    fn test_periods_are_contiguous_from_month_end() -> Fallible<()> {
        let mut input = make_input(80000.0, 20000.0, 14)?;
        input.start_date = Date::from_ymd(2023, 1, 31)?;
        let schedule = compute_schedule(&input)?;
        assert_eq!(schedule.periods[0].end_date, Date::from_ymd(2023, 2, 27)?);
        assert_eq!(schedule.periods[1].start_date, Date::from_ymd(2023, 2, 28)?);
        for pair in schedule.periods.windows(2) {
            assert_eq!(pair[1].start_date.previous_day()?, pair[0].end_date);
        }
        // Jan 31 to Feb 28, then Feb 28 to Mar 31.
        assert_eq!(schedule.periods[0].days, 28);
        assert_eq!(schedule.periods[1].days, 30);
        assert_eq!(schedule.periods[2].days, 30);
        Ok(())
    }

    #[test]
    fn test_validation() -> Fallible<()> {
        let check = |input: LeaseInput, expected: ValidationError| {
            assert_eq!(compute_schedule(&input), Err(expected));
        };
        check(
            make_input(0.0, 100.0, 12)?,
            ValidationError::Zero(Field::AssetCost),
        );
        check(
            make_input(1000.0, 0.0, 12)?,
            ValidationError::Zero(Field::ResidualValue),
        );
        check(
            make_input(1000.0, 100.0, 0)?,
            ValidationError::Zero(Field::Term),
        );
        check(
            make_input(f64::NAN, 100.0, 12)?,
            ValidationError::NotANumber(Field::AssetCost),
        );
        check(
            make_input(1000.0, 1000.0, 12)?,
            ValidationError::ResidualNotBelowCost {
                residual: 1000.0,
                cost: 1000.0,
            },
        );
        check(
            make_input(1000.0, 100.0, -6)?,
            ValidationError::NonPositiveTerm(-6),
        );
        check(
            make_input(1000.0, 100.0, MAX_TERM + 1)?,
            ValidationError::TermTooLong(MAX_TERM + 1),
        );
        let mut input = make_input(1000.0, 100.0, 12)?;
        input.rental_amount = 0.0;
        check(input, ValidationError::Zero(Field::RentalAmount));
        let mut input = make_input(1000.0, 100.0, 12)?;
        input.initial_direct_costs = -1.0;
        check(input, ValidationError::Negative(Field::InitialDirectCosts));
        Ok(())
    }

    #[test]
    fn test_form_parsing() -> Result<(), ValidationError> {
        let form = LeaseForm {
            asset_cost: Some("80000".to_string()),
            residual_value: Some(" 20000 ".to_string()),
            term: Some("48".to_string()),
            rental_amount: Some("1500.50".to_string()),
            initial_direct_costs: Some("".to_string()),
            start_date: Some("2024-01-01".to_string()),
        };
        let input = form.into_input()?;
        assert_eq!(input.residual_value, 20000.0);
        assert_eq!(input.term, 48);
        assert_eq!(input.rental_amount, 1500.5);
        assert_eq!(input.initial_direct_costs, 0.0);
        Ok(())
    }

    #[test]
    fn test_form_errors() {
        let form = LeaseForm {
            asset_cost: Some("80000".to_string()),
            residual_value: Some("20000".to_string()),
            term: Some("48".to_string()),
            rental_amount: Some("1500".to_string()),
            initial_direct_costs: None,
            start_date: None,
        };
        assert_eq!(
            form.clone().into_input(),
            Err(ValidationError::Missing(Field::StartDate))
        );
        let bad_date = LeaseForm {
            start_date: Some("01/02/2024".to_string()),
            ..form.clone()
        };
        assert_eq!(
            bad_date.into_input(),
            Err(ValidationError::InvalidStartDate("01/02/2024".to_string()))
        );
        let bad_term = LeaseForm {
            term: Some("four".to_string()),
            ..form.clone()
        };
        assert_eq!(
            bad_term.into_input(),
            Err(ValidationError::NotANumber(Field::Term))
        );
        let no_cost = LeaseForm {
            asset_cost: None,
            ..form
        };
        assert_eq!(
            no_cost.into_input(),
            Err(ValidationError::Missing(Field::AssetCost))
        );
    }

    #[test]
    fn test_form_from_json() -> Fallible<()> {
        let form: LeaseForm = serde_json::from_str(
            r#"{"asset_cost": "1000", "residual_value": "100", "term": "3",
                "rental_amount": "50", "start_date": "2024-05-01"}"#,
        )?;
        let schedule = compute_schedule(&form.into_input()?)?;
        assert_eq!(schedule.periods.len(), 3);
        assert_eq!(schedule.periods[0].depreciation, 300.0);
        Ok(())
    }
}
