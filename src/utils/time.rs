use chrono::NaiveDate;

/// This is the standard way of naming a day log file in afkwatch.
pub fn date_to_log_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
