//! Human-facing date formatting.

use time::{Date, Month, OffsetDateTime, format_description::well_known::Rfc3339};

use crate::domain::locale::DateStyle;

/// "March 1, 2025" or "2025年3月1日".
pub fn long_date(date: Date, style: DateStyle) -> String {
    match style {
        DateStyle::English => format!(
            "{} {}, {}",
            english_month(date.month()),
            date.day(),
            date.year()
        ),
        DateStyle::Chinese => format!(
            "{}年{}月{}日",
            date.year(),
            u8::from(date.month()),
            date.day()
        ),
    }
}

/// Long date with a relative suffix, e.g. "March 1, 2025 (2w ago)".
///
/// Anything less than a day away reads as "Today" on its own.
pub fn format_date(date: Date, today: Date, style: DateStyle) -> String {
    let days = (today - date).whole_days().unsigned_abs();
    if days < 1 {
        return match style {
            DateStyle::English => "Today".to_string(),
            DateStyle::Chinese => "今天".to_string(),
        };
    }

    let (amount, unit) = if days < 7 {
        (days, Unit::Days)
    } else if days < 30 {
        (days / 7, Unit::Weeks)
    } else if days < 365 {
        (days / 30, Unit::Months)
    } else {
        (days / 365, Unit::Years)
    };

    let full = long_date(date, style);
    match style {
        DateStyle::English => format!("{full} ({amount}{})", unit.english()),
        DateStyle::Chinese => format!("{full}（{amount}{}）", unit.chinese()),
    }
}

/// Today's date in UTC.
pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Midnight UTC on `date` as RFC 3339.
pub fn rfc3339_date(date: Date) -> String {
    date.midnight()
        .assume_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| date.to_string())
}

pub fn rfc3339_now() -> String {
    OffsetDateTime::now_utc()
        .replace_nanosecond(0)
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .format(&Rfc3339)
        .unwrap_or_default()
}

#[derive(Clone, Copy)]
enum Unit {
    Days,
    Weeks,
    Months,
    Years,
}

impl Unit {
    fn english(self) -> &'static str {
        match self {
            Unit::Days => "d ago",
            Unit::Weeks => "w ago",
            Unit::Months => "mo ago",
            Unit::Years => "y ago",
        }
    }

    fn chinese(self) -> &'static str {
        match self {
            Unit::Days => "天前",
            Unit::Weeks => "周前",
            Unit::Months => "个月前",
            Unit::Years => "年前",
        }
    }
}

fn english_month(month: Month) -> &'static str {
    match month {
        Month::January => "January",
        Month::February => "February",
        Month::March => "March",
        Month::April => "April",
        Month::May => "May",
        Month::June => "June",
        Month::July => "July",
        Month::August => "August",
        Month::September => "September",
        Month::October => "October",
        Month::November => "November",
        Month::December => "December",
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    const TODAY: Date = date!(2025 - 06 - 15);

    #[test]
    fn same_day_reads_today() {
        assert_eq!(format_date(TODAY, TODAY, DateStyle::English), "Today");
        assert_eq!(format_date(TODAY, TODAY, DateStyle::Chinese), "今天");
    }

    #[test]
    fn relative_buckets() {
        let english = |d| format_date(d, TODAY, DateStyle::English);
        assert_eq!(english(date!(2025 - 06 - 12)), "June 12, 2025 (3d ago)");
        assert_eq!(english(date!(2025 - 06 - 01)), "June 1, 2025 (2w ago)");
        assert_eq!(english(date!(2025 - 03 - 01)), "March 1, 2025 (3mo ago)");
        assert_eq!(english(date!(2023 - 06 - 01)), "June 1, 2023 (2y ago)");
    }

    #[test]
    fn chinese_style() {
        assert_eq!(
            format_date(date!(2025 - 06 - 12), TODAY, DateStyle::Chinese),
            "2025年6月12日（3天前）"
        );
        assert_eq!(long_date(date!(2024 - 01 - 05), DateStyle::Chinese), "2024年1月5日");
    }

    #[test]
    fn rfc3339_dates_are_midnight_utc() {
        assert_eq!(rfc3339_date(date!(2025 - 01 - 02)), "2025-01-02T00:00:00Z");
    }
}
