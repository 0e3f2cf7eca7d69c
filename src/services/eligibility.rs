//! Which months an employee may still edit and submit.
//!
//! The current month is always open. The previous month stays open until the
//! cutoff day (the 10th by default) unless it has already been submitted or
//! approved. Anything older is read-only history.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::{Entry, MonthlyTimesheet, Period, TimesheetStatus};
use crate::error::{AppError, EligibilityError};
use crate::ports::TimesheetStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityRules {
    pub previous_month_cutoff_day: u32,
    pub completeness_threshold_percent: u32,
    pub holidays: BTreeSet<NaiveDate>,
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self {
            previous_month_cutoff_day: 10,
            completeness_threshold_percent: 80,
            holidays: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AvailablePeriod {
    pub year: i32,
    pub month: u32,
    pub is_current_month: bool,
    pub is_submitted: bool,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Completeness {
    pub filled: usize,
    pub working_days: usize,
    pub required: usize,
}

impl Completeness {
    pub fn is_met(&self) -> bool {
        self.filled >= self.required
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubmissionEligibility {
    rules: EligibilityRules,
}

impl SubmissionEligibility {
    pub fn new(rules: EligibilityRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &EligibilityRules {
        &self.rules
    }

    /// Whether `period` may be edited or submitted on `today`, given the
    /// status of its timesheet if one exists.
    pub fn check_period(
        &self,
        period: Period,
        today: NaiveDate,
        status: Option<TimesheetStatus>,
    ) -> Result<(), EligibilityError> {
        let current = Period::containing(today);
        if period == current {
            return Ok(());
        }

        if period == current.previous() && today.day() <= self.rules.previous_month_cutoff_day {
            return match status {
                Some(status) if status.is_locked() => {
                    Err(EligibilityError::AlreadySubmitted(period))
                }
                _ => Ok(()),
            };
        }

        Err(EligibilityError::PeriodClosed(period))
    }

    pub fn is_period_open(
        &self,
        period: Period,
        today: NaiveDate,
        status: Option<TimesheetStatus>,
    ) -> bool {
        self.check_period(period, today, status).is_ok()
    }

    /// Open periods, current month first.
    pub fn available_periods(
        &self,
        today: NaiveDate,
        statuses: &HashMap<Period, TimesheetStatus>,
    ) -> Vec<AvailablePeriod> {
        let current = Period::containing(today);
        [current, current.previous()]
            .into_iter()
            .filter(|period| self.is_period_open(*period, today, statuses.get(period).copied()))
            .map(|period| AvailablePeriod {
                year: period.year,
                month: period.month,
                is_current_month: period == current,
                is_submitted: statuses
                    .get(&period)
                    .is_some_and(|status| status.is_locked()),
            })
            .collect()
    }

    pub async fn available_periods_for(
        &self,
        store: &dyn TimesheetStore,
        employee_id: Uuid,
        today: NaiveDate,
    ) -> Result<Vec<AvailablePeriod>, AppError> {
        let current = Period::containing(today);
        let statuses = store
            .statuses(employee_id, &[current, current.previous()])
            .await?;
        Ok(self.available_periods(today, &statuses))
    }

    /// Monday to Friday, minus configured holidays.
    pub fn working_days(&self, period: Period) -> Vec<NaiveDate> {
        period
            .days()
            .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
            .filter(|day| !self.rules.holidays.contains(day))
            .collect()
    }

    pub fn completeness(
        &self,
        period: Period,
        entries: &BTreeMap<NaiveDate, Entry>,
    ) -> Completeness {
        let working_days = self.working_days(period);
        let filled = working_days
            .iter()
            .filter(|day| entries.contains_key(day))
            .count();
        let threshold = self.rules.completeness_threshold_percent as usize;
        let required = (working_days.len() * threshold).div_ceil(100);

        Completeness {
            filled,
            working_days: working_days.len(),
            required,
        }
    }

    /// The full submission gate: state, window and completeness, reported in
    /// that order.
    pub fn check_submit(
        &self,
        timesheet: &MonthlyTimesheet,
        today: NaiveDate,
    ) -> Result<(), AppError> {
        if !timesheet.status.is_editable() {
            return Err(AppError::state_conflict("submit", timesheet.status));
        }

        self.check_period(timesheet.period(), today, Some(timesheet.status))?;

        let completeness = self.completeness(timesheet.period(), &timesheet.entries);
        if !completeness.is_met() {
            return Err(EligibilityError::BelowCompleteness {
                filled: completeness.filled,
                working_days: completeness.working_days,
                required: completeness.required,
            }
            .into());
        }

        Ok(())
    }

    pub fn can_submit(&self, timesheet: &MonthlyTimesheet, today: NaiveDate) -> bool {
        self.check_submit(timesheet, today).is_ok()
    }

    /// Same gate as `can_submit`, limited to rejected timesheets.
    pub fn can_resubmit(&self, timesheet: &MonthlyTimesheet, today: NaiveDate) -> bool {
        timesheet.status == TimesheetStatus::Rejected && self.can_submit(timesheet, today)
    }
}
