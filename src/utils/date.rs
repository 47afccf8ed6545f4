use crate::errors::{AppError, AppResult};
use chrono::{Datelike, NaiveDate};

pub fn parse_date(s: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidDate(s.to_string()))
}

pub fn month_last_day(year: i32, month: u32) -> Option<NaiveDate> {
    let (ny, nm) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(ny, nm, 1)?.pred_opt()
}

/// First and last day of a single period: `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
fn period_bounds(p: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let p = p.trim();
    let invalid = || AppError::InvalidDate(format!("invalid period '{}'", p));

    match p.len() {
        4 => {
            let year: i32 = p.parse().map_err(|_| invalid())?;
            let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
            let last = NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?;
            Ok((first, last))
        }
        7 => {
            let first = NaiveDate::parse_from_str(&format!("{}-01", p), "%Y-%m-%d")
                .map_err(|_| invalid())?;
            let last = month_last_day(first.year(), first.month()).ok_or_else(invalid)?;
            Ok((first, last))
        }
        10 => {
            let d = parse_date(p)?;
            Ok((d, d))
        }
        _ => Err(invalid()),
    }
}

/// Inclusive date range from `--period`.
///
/// Accepts `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, or two of them joined by `:`.
/// Without a period the month of `today` is used.
pub fn parse_period(period: Option<&str>, today: NaiveDate) -> AppResult<(NaiveDate, NaiveDate)> {
    let Some(p) = period else {
        let first = today.with_day(1).unwrap_or(today);
        let last = month_last_day(today.year(), today.month()).unwrap_or(today);
        return Ok((first, last));
    };

    let (from, to) = match p.split_once(':') {
        Some((a, b)) => (period_bounds(a)?.0, period_bounds(b)?.1),
        None => period_bounds(p)?,
    };

    if from > to {
        return Err(AppError::InvalidDate(format!(
            "period start {} is after its end {}",
            from, to
        )));
    }
    Ok((from, to))
}
