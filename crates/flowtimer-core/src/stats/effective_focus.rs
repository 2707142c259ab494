//! Capped daily focus capacity.
//!
//! Reporting normalizes "how much focus was realistically possible" between
//! two instants against a 12-hour-per-day cap -- nobody focuses for 24
//! continuous hours. Day boundaries are civil UTC days.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};

const DAILY_CAP_SECONDS: i64 = 12 * 3600;

/// Available focus capacity in seconds between `start` and `end`.
///
/// Same-day spans are simply capped. Spans across midnights decompose into
/// three independently-capped terms: the remainder of the start day, the
/// prefix of the end day, and 12 hours per whole day in between.
pub fn baseline_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    if end <= start {
        return 0;
    }

    let start_day = start.date_naive();
    let end_day = end.date_naive();

    if start_day == end_day {
        return DAILY_CAP_SECONDS.min((end - start).num_seconds());
    }

    let next_day_start = day_start(start_day + Days::new(1));
    let start_contribution = DAILY_CAP_SECONDS.min((next_day_start - start).num_seconds().max(0));
    let end_contribution = DAILY_CAP_SECONDS.min((end - day_start(end_day)).num_seconds().max(0));

    let middle_days = ((end_day - start_day).num_days() - 1).max(0);
    start_contribution + end_contribution + middle_days * DAILY_CAP_SECONDS
}

fn day_start(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}
