//! Date helper functions

use chrono::NaiveDate;

/// Format a date in long US form, like "June 28, 2025"
pub fn long_date(date: &NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}
