use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc,
    Weekday,
};

/// Timestamp format arXiv expects in `submittedDate` range queries.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M";

/// Window used when no notification schedule is configured.
pub const DEFAULT_LOOKBACK_DAYS: f64 = 7.0;

// arXiv announces new papers at 20:00 Eastern on these weekdays. The offset
// is treated as permanently UTC-5: the announcement math is not DST-aware,
// matching the provider's published schedule closely enough for a daily
// digest. Known limitation.
const REFERENCE_OFFSET_SECS: i32 = 5 * 3600;
const UPDATE_DAYS: [Weekday; 5] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
];

/// The [start, end] range bounding "new since last check", in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SubmissionWindow {
    pub fn start_stamp(&self) -> String {
        self.start.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn end_stamp(&self) -> String {
        self.end.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Which boundary of the window a cutoff is computed for. An update event
/// reflects submissions received through an earlier cutoff; the start
/// boundary reaches one announcement further back than the end boundary so
/// that consecutive runs neither skip nor repeat a batch.
#[derive(Debug, Clone, Copy)]
enum Boundary {
    Start,
    End,
}

/// Compute the submission window for a lookback period ending at `now`.
///
/// Pure function of its two inputs plus the fixed announcement schedule, so
/// callers inject `now` and tests need no clock mocking. Fractional lookback
/// days are allowed; the caller is responsible for mapping a missing or
/// non-positive schedule onto [`DEFAULT_LOOKBACK_DAYS`].
pub fn submission_window(now: DateTime<Utc>, lookback_days: f64) -> SubmissionWindow {
    let lookback = Duration::milliseconds((lookback_days * 86_400_000.0).round() as i64);

    let end_target = now.with_timezone(&reference_offset()).naive_local();
    let start_target = end_target - lookback;

    let start = submission_cutoff(latest_update_event(start_target), Boundary::Start);
    let end = submission_cutoff(latest_update_event(end_target), Boundary::End);

    SubmissionWindow {
        start: to_utc(start),
        end: to_utc(end),
    }
}

/// Whether enough time has passed since the last run for a new query.
/// A missing or unparseable `last_update`, or a schedule that is absent or
/// non-positive, always means "due".
pub fn due_for_update(
    last_update: Option<&str>,
    schedule_days: Option<f64>,
    now: DateTime<Utc>,
) -> bool {
    let (Some(stamp), Some(days)) = (last_update, schedule_days) else {
        return true;
    };
    if days <= 0.0 {
        return true;
    }
    let Ok(last) = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT) else {
        return true;
    };
    now - last.and_utc() >= Duration::milliseconds((days * 86_400_000.0).round() as i64)
}

fn reference_offset() -> FixedOffset {
    FixedOffset::west_opt(REFERENCE_OFFSET_SECS).unwrap()
}

fn to_utc(reference_local: NaiveDateTime) -> DateTime<Utc> {
    (reference_local + Duration::seconds(REFERENCE_OFFSET_SECS as i64)).and_utc()
}

fn is_update_day(day: Weekday) -> bool {
    UPDATE_DAYS.contains(&day)
}

fn announce_time() -> NaiveTime {
    NaiveTime::from_hms_opt(20, 0, 0).unwrap()
}

fn cutoff_time() -> NaiveTime {
    NaiveTime::from_hms_opt(14, 0, 0).unwrap()
}

/// Date of the most recent announcement at or before the given instant
/// (reference-offset local time). Same-day only when the instant is an
/// update day strictly after 20:00; otherwise walk back to the previous
/// update day.
fn latest_update_event(instant: NaiveDateTime) -> NaiveDate {
    let mut date = instant.date();
    if is_update_day(date.weekday()) && instant.time() > announce_time() {
        return date;
    }
    loop {
        date = date - Days::new(1);
        if is_update_day(date.weekday()) {
            return date;
        }
    }
}

/// Map an announcement date to the submission receipt cutoff it reflects,
/// at 14:00 reference-local. Sunday and Monday announcements cover the
/// weekend backlog, so they reach further back than the weekday ones.
fn submission_cutoff(event: NaiveDate, boundary: Boundary) -> NaiveDateTime {
    let days_back = match (event.weekday(), boundary) {
        (Weekday::Sun, Boundary::Start) => 3, // Thursday
        (Weekday::Sun, Boundary::End) => 2,   // Friday
        (Weekday::Mon, Boundary::Start) => 3, // Friday
        (Weekday::Mon, Boundary::End) => 0,
        (_, Boundary::Start) => 1,
        (_, Boundary::End) => 0,
    };
    (event - Days::new(days_back)).and_time(cutoff_time())
}
