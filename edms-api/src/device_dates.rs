//! Display-only dates derived from the stored device dates.
//!
//! Neither value is persisted. Both are recomputed every time a device is
//! read, so the listing and the single-device fetch always agree.

use chrono::{Datelike, Days, NaiveDate};

/// Years a device stays in service after manufacture.
pub const SERVICE_LIFE_YEARS: u32 = 5;

/// Months between routine inspections.
pub const INSPECTION_INTERVAL_MONTHS: u32 = 3;

/// Expiry date of a device: manufacture date plus five years.
pub fn expiry_date(manufacture_date: Option<NaiveDate>) -> Option<NaiveDate> {
    manufacture_date.and_then(|date| add_months(date, SERVICE_LIFE_YEARS * 12))
}

/// Date the next inspection falls due: last inspection plus three months.
pub fn next_inspection_due(last_inspection_date: Option<NaiveDate>) -> Option<NaiveDate> {
    last_inspection_date.and_then(|date| add_months(date, INSPECTION_INTERVAL_MONTHS))
}

/// Adds calendar months, carrying a day that does not exist in the target
/// month into the following month (Nov 30 + 3 months = Mar 2, not Feb 28).
///
/// Returns `None` only when the result falls outside chrono's date range.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let zero_based = date.month0() + months;
    let year = date.year() + (zero_based / 12) as i32;
    let month = zero_based % 12 + 1;

    let first_of_month = NaiveDate::from_ymd_opt(year, month, 1)?;
    first_of_month.checked_add_days(Days::new(u64::from(date.day() - 1)))
}
