//! Conversion of raw worked minutes into payroll minutes.
//!
//! Everything here is pure: same inputs, same outputs, no clock and no
//! storage.

use crate::config::LunchPolicy;
use crate::errors::{AppError, AppResult};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WorkTime {
    pub lunch_deducted: bool,
    /// Raw minutes after the lunch deduction (and hour rounding on
    /// sub-full-day schedules).
    pub adjusted_minutes: i64,
    /// Whole hours, capped at the contracted time.
    pub processed_minutes: i64,
    pub overtime_minutes: i64,
    pub final_minutes: i64,
}

/// Round down to whole hours.
pub fn floor_to_hours(minutes: i64) -> i64 {
    minutes.div_euclid(60) * 60
}

/// Lunch flag for the given schedule.
///
/// Shorter schedules always report lunch (nothing is subtracted), longer
/// ones always deduct, and the canonical full day deducts only inside the
/// configured band.
pub fn lunch_applies(raw: i64, schedule_hours: u32, policy: &LunchPolicy) -> bool {
    match schedule_hours.cmp(&policy.full_day_hours) {
        Ordering::Less | Ordering::Greater => true,
        Ordering::Equal => {
            raw > policy.band_lower_minutes
                && raw <= policy.band_upper_minutes
                && raw >= policy.min_raw_minutes
        }
    }
}

pub fn compute_work_time(
    raw: i64,
    schedule_hours: u32,
    policy: &LunchPolicy,
) -> AppResult<WorkTime> {
    if raw < 0 {
        return Err(AppError::Validation(format!(
            "raw worked minutes must not be negative (got {})",
            raw
        )));
    }

    let lunch_deducted = lunch_applies(raw, schedule_hours, policy);
    let full_day = schedule_hours == policy.full_day_hours;

    let mut adjusted = if full_day && lunch_deducted {
        (raw - policy.deduction_minutes).max(0)
    } else {
        raw
    };
    if schedule_hours < policy.full_day_hours {
        adjusted = floor_to_hours(adjusted);
    }

    let contracted = i64::from(schedule_hours) * 60;
    let processed = floor_to_hours(adjusted).min(contracted);
    let overtime = floor_to_hours((adjusted - contracted).max(0));

    Ok(WorkTime {
        lunch_deducted,
        adjusted_minutes: adjusted,
        processed_minutes: processed,
        overtime_minutes: overtime,
        final_minutes: processed + overtime,
    })
}

impl WorkTime {
    /// Regular-day overtime against the per-date scheduled minutes.
    ///
    /// Only fills an overtime figure the engine left at zero. Regular
    /// minutes are capped at the scheduled figure so the day is never
    /// counted twice.
    pub fn with_scheduled_overtime(self, scheduled_minutes: i64) -> WorkTime {
        if self.overtime_minutes != 0 || scheduled_minutes <= 0 {
            return self;
        }

        let overtime = floor_to_hours((self.adjusted_minutes - scheduled_minutes).max(0));
        if overtime == 0 {
            return self;
        }

        let processed = self.processed_minutes.min(floor_to_hours(scheduled_minutes));
        WorkTime {
            processed_minutes: processed,
            overtime_minutes: overtime,
            final_minutes: processed + overtime,
            ..self
        }
    }

    /// Minutes supplied by the caller instead of measured ones: all of
    /// them count, split at the contracted time.
    pub fn from_override(minutes: i64, schedule_hours: u32) -> AppResult<WorkTime> {
        if minutes < 0 {
            return Err(AppError::Validation(format!(
                "worked minutes override must not be negative (got {})",
                minutes
            )));
        }

        let contracted = i64::from(schedule_hours) * 60;
        let processed = minutes.min(contracted);
        let overtime = minutes - processed;
        Ok(WorkTime {
            lunch_deducted: false,
            adjusted_minutes: minutes,
            processed_minutes: processed,
            overtime_minutes: overtime,
            final_minutes: minutes,
        })
    }
}
