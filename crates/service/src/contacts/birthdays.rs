//! Birthday arithmetic on calendar dates.
//!
//! A 29 February birthday falls on 28 February in non-leap years.

use chrono::{Datelike, NaiveDate};

fn in_year(birthday: NaiveDate, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, birthday.month(), birthday.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 2, 28))
}

/// Next date (today included) on which the birthday is celebrated.
pub fn next_occurrence(birthday: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
    let this_year = in_year(birthday, today.year())?;
    if this_year >= today {
        Some(this_year)
    } else {
        in_year(birthday, today.year() + 1)
    }
}

/// Whole days from `today` until the next occurrence.
pub fn days_until(birthday: NaiveDate, today: NaiveDate) -> Option<i64> {
    next_occurrence(birthday, today).map(|d| (d - today).num_days())
}

/// True when the next occurrence is within `days` days from today, inclusive.
pub fn is_upcoming(birthday: NaiveDate, today: NaiveDate, days: i64) -> bool {
    matches!(days_until(birthday, today), Some(n) if n <= days)
}
