use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Duration, Local, NaiveDate};
use now::DateTimeNow;

use crate::daemon::{
    day_log_dir,
    storage::{ActivityLog, DayLogStorage},
};

/// Prints hours active today and hours active this week, one decimal each,
/// space separated. A pure query over the day logs.
pub async fn run_report(dir: &Path) -> Result<()> {
    let storage = DayLogStorage::new(day_log_dir(dir))?;
    let now = Local::now();

    let today_minutes = storage.count_active_minutes(now.date_naive()).await;
    let mut week_minutes = 0;
    for date in week_dates(now) {
        week_minutes += storage.count_active_minutes(date).await;
    }

    println!(
        "{} {}",
        render_hours(today_minutes),
        render_hours(week_minutes)
    );
    Ok(())
}

/// The Monday-aligned 7-day window containing `now`.
fn week_dates(now: DateTime<Local>) -> impl Iterator<Item = NaiveDate> {
    let monday = now.beginning_of_week().date_naive();
    (0..7).map(move |offset| monday + Duration::days(offset))
}

fn render_hours(minutes: u32) -> String {
    format!("{:.1}", f64::from(minutes) / 60.0)
}
