use chrono::{Datelike, NaiveTime, Timelike};

/// Formats a time as "7:52am". 12-hour, no leading zero, lowercase suffix.
/// The dashboard never shows 24-hour times.
pub fn format_12h(time: NaiveTime) -> String {
    let (is_pm, hour) = time.hour12();
    let suffix = if is_pm { "pm" } else { "am" };
    format!("{}:{:02}{}", hour, time.minute(), suffix)
}

/// The big header clock: hour and minute only, suffix rendered separately.
pub fn format_12h_parts(time: NaiveTime) -> (String, String) {
    let (is_pm, hour) = time.hour12();
    let suffix = if is_pm { "PM" } else { "AM" };
    (format!("{}:{:02}", hour, time.minute()), suffix.to_owned())
}

/// "TUE 3 FEB" for the header day/date zone.
pub fn format_day_date<D: Datelike>(date: &D) -> String {
    const DAYS: [&str; 7] = ["MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"];
    const MONTHS: [&str; 12] = [
        "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT",
        "NOV", "DEC",
    ];
    format!(
        "{} {} {}",
        DAYS[date.weekday().num_days_from_monday() as usize],
        date.day(),
        MONTHS[date.month0() as usize],
    )
}
