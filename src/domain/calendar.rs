//! Business-day arithmetic
//!
//! Weekends are the only non-business days; exchange holidays show up as
//! missing rows in the price panel instead.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// True for Monday through Friday
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Shift `date` by `offset` business days.
///
/// A positive offset steps forward counting only weekdays, a negative one
/// steps backward. An offset of zero rolls a weekend date forward to the
/// following Monday and leaves weekdays untouched.
pub fn add_business_days(date: NaiveDate, offset: i64) -> NaiveDate {
    if offset == 0 {
        let mut rolled = date;
        while !is_business_day(rolled) {
            rolled += Duration::days(1);
        }
        return rolled;
    }

    let step = if offset > 0 { 1 } else { -1 };
    let mut remaining = offset.abs();
    let mut current = date;
    while remaining > 0 {
        current += Duration::days(step);
        if is_business_day(current) {
            remaining -= 1;
        }
    }
    current
}

/// Shift `date` back by `count` business days
pub fn sub_business_days(date: NaiveDate, count: usize) -> NaiveDate {
    add_business_days(date, -(count as i64))
}
