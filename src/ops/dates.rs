use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone, Utc, Weekday};

/// Parse a loose due-date expression relative to `now`.
///
/// Accepts `today`, `tomorrow`/`tom`, weekday names or their three-letter
/// abbreviations (the next such day, never today), `next week`/`nextweek`,
/// and the explicit forms `2025-01-31`, `01/31/2025`, `01-31-2025`, `Jan 31`
/// and `Jan 31, 2025`. The result is 23:59:59 local time on that day.
pub fn parse_natural_date(input: &str, now: DateTime<Local>) -> Option<DateTime<Utc>> {
    let s = input.trim().to_lowercase();
    if s.is_empty() {
        return None;
    }
    let today = now.date_naive();

    let date = match s.as_str() {
        "today" => Some(today),
        "tomorrow" | "tom" => Some(today + Duration::days(1)),
        "next week" | "nextweek" => Some(today + Duration::days(7)),
        _ => match parse_weekday(&s) {
            Some(wd) => Some(next_weekday(today, wd)),
            None => parse_explicit(&s, today.year()),
        },
    }?;

    end_of_day(date)
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    let wd = match s {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(wd)
}

/// The next `wd` strictly after `today`.
fn next_weekday(today: NaiveDate, wd: Weekday) -> NaiveDate {
    let from = today.weekday().num_days_from_monday() as i64;
    let to = wd.num_days_from_monday() as i64;
    let mut ahead = (to - from + 7) % 7;
    if ahead == 0 {
        ahead = 7;
    }
    today + Duration::days(ahead)
}

fn parse_explicit(s: &str, year: i32) -> Option<NaiveDate> {
    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%b %d, %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    // "Jan 2" has no year; assume the current one
    NaiveDate::parse_from_str(&format!("{} {}", s, year), "%b %d %Y").ok()
}

/// 23:59:59 local time on `date`, as UTC.
pub fn end_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(23, 59, 59)?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a duration into minutes: `30m`, `2h`, `1h30m`, or a bare number of
/// minutes. Zero, overflowing and malformed input give `None`.
pub fn parse_duration_minutes(input: &str) -> Option<i64> {
    let s = input.trim().to_lowercase();
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<i64>() {
        return (n > 0).then_some(n);
    }

    let mut total = 0i64;
    let mut digits = String::new();
    let mut saw_unit = false;
    for c in s.chars() {
        match c {
            '0'..='9' => digits.push(c),
            'h' | 'm' => {
                let n: i64 = digits.parse().ok()?;
                digits.clear();
                let minutes = if c == 'h' { n.checked_mul(60)? } else { n };
                total = total.checked_add(minutes)?;
                saw_unit = true;
            }
            ' ' => {}
            _ => return None,
        }
    }
    if !digits.is_empty() || !saw_unit || total <= 0 {
        return None;
    }
    Some(total)
}

/// `90` → `1h30m`, `45` → `45m`
pub fn format_minutes(minutes: i64) -> String {
    let (h, m) = (minutes / 60, minutes % 60);
    match (h, m) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h{}m", h, m),
    }
}
