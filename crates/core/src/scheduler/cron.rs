//! Five-field cron expressions evaluated in UTC.
//!
//! Supports `*`, `n`, `a-b`, `*/s`, `a-b/s`, `n/s` and comma lists,
//! three-letter month and weekday names, and the `@hourly`, `@daily`,
//! `@midnight`, `@weekly`, `@monthly`, `@yearly` and `@annually` macros.
//! Day-of-week accepts 0-7 with both 0 and 7 meaning Sunday.
//!
//! When day-of-month and day-of-week are both restricted, a day matches
//! if either field matches.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use thiserror::Error;

/// Years searched ahead before an expression is declared unsatisfiable.
const SEARCH_YEARS: i32 = 5;

const MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];
const DAY_NAMES: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CronError {
    #[error("Expected 5 fields in cron expression '{0}'")]
    FieldCount(String),

    #[error("Unknown cron macro '{0}'")]
    UnknownMacro(String),

    #[error("Invalid {field} field '{value}': {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy)]
struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    names: Option<&'static [&'static str]>,
    /// Offset added to a name's index to obtain its value.
    name_base: u32,
}

const MINUTE: FieldSpec = FieldSpec {
    name: "minute",
    min: 0,
    max: 59,
    names: None,
    name_base: 0,
};
const HOUR: FieldSpec = FieldSpec {
    name: "hour",
    min: 0,
    max: 23,
    names: None,
    name_base: 0,
};
const DAY_OF_MONTH: FieldSpec = FieldSpec {
    name: "day-of-month",
    min: 1,
    max: 31,
    names: None,
    name_base: 0,
};
const MONTH: FieldSpec = FieldSpec {
    name: "month",
    min: 1,
    max: 12,
    names: Some(&MONTH_NAMES),
    name_base: 1,
};
const DAY_OF_WEEK: FieldSpec = FieldSpec {
    name: "day-of-week",
    min: 0,
    max: 7,
    names: Some(&DAY_NAMES),
    name_base: 0,
};

/// A parsed cron expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    expression: String,
    minutes: u64,
    hours: u64,
    days_of_month: u64,
    months: u64,
    days_of_week: u64,
    dom_restricted: bool,
    dow_restricted: bool,
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self, CronError> {
        let trimmed = expression.trim();
        let expanded = if trimmed.starts_with('@') {
            expand_macro(trimmed)?
        } else {
            trimmed
        };

        let fields: Vec<&str> = expanded.split_whitespace().collect();
        let [minute, hour, dom, month, dow] = fields.as_slice() else {
            return Err(CronError::FieldCount(trimmed.to_string()));
        };

        let mut days_of_week = parse_field(dow, DAY_OF_WEEK)?;
        if days_of_week & (1 << 7) != 0 {
            days_of_week = (days_of_week & !(1 << 7)) | 1;
        }

        Ok(Self {
            expression: trimmed.to_string(),
            minutes: parse_field(minute, MINUTE)?,
            hours: parse_field(hour, HOUR)?,
            days_of_month: parse_field(dom, DAY_OF_MONTH)?,
            months: parse_field(month, MONTH)?,
            days_of_week,
            dom_restricted: !dom.starts_with('*'),
            dow_restricted: !dow.starts_with('*'),
        })
    }

    /// The expression as written.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First matching minute strictly after `now`.
    ///
    /// Returns `None` for expressions that never fire (e.g. `0 0 30 2 *`).
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start = now.naive_utc().with_second(0)?.with_nanosecond(0)? + Duration::minutes(1);
        let limit_year = start.year() + SEARCH_YEARS;
        let mut t = start;

        while t.year() <= limit_year {
            if !bit(self.months, t.month()) {
                t = first_of_next_month(t.date())?;
                continue;
            }
            if !self.day_matches(t.date()) {
                t = t.date().succ_opt()?.and_hms_opt(0, 0, 0)?;
                continue;
            }
            if !bit(self.hours, t.hour()) {
                t = t.with_minute(0)? + Duration::hours(1);
                continue;
            }
            if !bit(self.minutes, t.minute()) {
                t += Duration::minutes(1);
                continue;
            }
            return Some(t.and_utc());
        }
        None
    }

    fn day_matches(&self, date: NaiveDate) -> bool {
        let dom = bit(self.days_of_month, date.day());
        let dow = bit(self.days_of_week, date.weekday().num_days_from_sunday());
        if self.dom_restricted && self.dow_restricted {
            dom || dow
        } else {
            dom && dow
        }
    }
}

impl FromStr for CronSchedule {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

fn expand_macro(expression: &str) -> Result<&'static str, CronError> {
    match expression.to_ascii_lowercase().as_str() {
        "@hourly" => Ok("0 * * * *"),
        "@daily" | "@midnight" => Ok("0 0 * * *"),
        "@weekly" => Ok("0 0 * * 0"),
        "@monthly" => Ok("0 0 1 * *"),
        "@yearly" | "@annually" => Ok("0 0 1 1 *"),
        _ => Err(CronError::UnknownMacro(expression.to_string())),
    }
}

fn bit(mask: u64, value: u32) -> bool {
    mask & (1u64 << value) != 0
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDateTime> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
}

fn parse_field(raw: &str, spec: FieldSpec) -> Result<u64, CronError> {
    let invalid = |reason: &str| CronError::InvalidField {
        field: spec.name,
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let mut mask = 0u64;
    for item in raw.split(',') {
        if item.is_empty() {
            return Err(invalid("empty list item"));
        }

        let (range, step) = match item.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step.parse().map_err(|_| invalid("step is not a number"))?;
                if step == 0 {
                    return Err(invalid("step must be positive"));
                }
                (range, Some(step))
            }
            None => (item, None),
        };

        let (start, end) = if range == "*" {
            (spec.min, spec.max)
        } else if let Some((a, b)) = range.split_once('-') {
            (parse_value(a, spec)?, parse_value(b, spec)?)
        } else {
            let value = parse_value(range, spec)?;
            // `n/s` runs from n to the end of the range
            (value, if step.is_some() { spec.max } else { value })
        };

        if start > end {
            return Err(invalid("range start is after range end"));
        }

        let step = step.unwrap_or(1);
        let mut value = start;
        while value <= end {
            mask |= 1u64 << value;
            value += step;
        }
    }
    Ok(mask)
}

fn parse_value(raw: &str, spec: FieldSpec) -> Result<u32, CronError> {
    let invalid = |reason: String| CronError::InvalidField {
        field: spec.name,
        value: raw.to_string(),
        reason,
    };

    let value = match raw.parse::<u32>() {
        Ok(v) => v,
        Err(_) => {
            let lower = raw.to_ascii_lowercase();
            spec.names
                .and_then(|names| names.iter().position(|n| *n == lower))
                .map(|idx| idx as u32 + spec.name_base)
                .ok_or_else(|| invalid("not a number".to_string()))?
        }
    };

    if value < spec.min || value > spec.max {
        return Err(invalid(format!(
            "must be between {} and {}",
            spec.min, spec.max
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn next(expr: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        CronSchedule::parse(expr).unwrap().next_after(now)
    }

    #[test]
    fn test_every_five_minutes() {
        assert_eq!(
            next("*/5 * * * *", at(2024, 5, 1, 10, 2)),
            Some(at(2024, 5, 1, 10, 5))
        );
        assert_eq!(
            next("*/5 * * * *", at(2024, 5, 1, 10, 5)),
            Some(at(2024, 5, 1, 10, 10))
        );
    }

    #[test]
    fn test_daily_is_strictly_after() {
        assert_eq!(
            next("0 3 * * *", at(2024, 5, 1, 3, 0)),
            Some(at(2024, 5, 2, 3, 0))
        );
        assert_eq!(
            next("0 3 * * *", at(2024, 5, 1, 2, 59)),
            Some(at(2024, 5, 1, 3, 0))
        );
    }

    #[test]
    fn test_seconds_are_truncated() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 4, 59).unwrap();
        assert_eq!(next("*/5 * * * *", now), Some(at(2024, 5, 1, 10, 5)));
    }

    #[test]
    fn test_rollover_year() {
        assert_eq!(
            next("0 0 1 1 *", at(2024, 12, 31, 23, 59)),
            Some(at(2025, 1, 1, 0, 0))
        );
    }

    #[test]
    fn test_macros() {
        assert_eq!(
            next("@hourly", at(2024, 5, 1, 10, 2)),
            Some(at(2024, 5, 1, 11, 0))
        );
        assert_eq!(next("@daily", at(2024, 5, 1, 10, 2)), Some(at(2024, 5, 2, 0, 0)));
        assert_eq!(next("@midnight", at(2024, 5, 1, 10, 2)), Some(at(2024, 5, 2, 0, 0)));
        // 2024-05-01 is a Wednesday
        assert_eq!(next("@weekly", at(2024, 5, 1, 10, 2)), Some(at(2024, 5, 5, 0, 0)));
        assert_eq!(next("@monthly", at(2024, 5, 1, 10, 2)), Some(at(2024, 6, 1, 0, 0)));
        assert_eq!(next("@annually", at(2024, 5, 1, 10, 2)), Some(at(2025, 1, 1, 0, 0)));
        assert!(matches!(
            CronSchedule::parse("@reboot"),
            Err(CronError::UnknownMacro(_))
        ));
    }

    #[test]
    fn test_ranges_lists_and_steps() {
        let expr = "15,45 9-17/4 * * *";
        assert_eq!(next(expr, at(2024, 5, 1, 8, 0)), Some(at(2024, 5, 1, 9, 15)));
        assert_eq!(next(expr, at(2024, 5, 1, 9, 45)), Some(at(2024, 5, 1, 13, 15)));
        assert_eq!(next(expr, at(2024, 5, 1, 17, 45)), Some(at(2024, 5, 2, 9, 15)));
        assert_eq!(next("50/5 * * * *", at(2024, 5, 1, 8, 56)), Some(at(2024, 5, 1, 9, 50)));
    }

    #[test]
    fn test_sunday_as_zero_or_seven() {
        // 2024-05-05 is a Sunday
        let expected = Some(at(2024, 5, 5, 12, 0));
        assert_eq!(next("0 12 * * 0", at(2024, 5, 1, 0, 0)), expected);
        assert_eq!(next("0 12 * * 7", at(2024, 5, 1, 0, 0)), expected);
        assert_eq!(next("0 12 * * sun", at(2024, 5, 1, 0, 0)), expected);
    }

    #[test]
    fn test_dom_dow_or_semantics() {
        // 15th of the month OR any Friday; 2024-05-03 is a Friday
        assert_eq!(
            next("0 0 15 * 5", at(2024, 5, 1, 0, 0)),
            Some(at(2024, 5, 3, 0, 0))
        );
        assert_eq!(
            next("0 0 15 * 5", at(2024, 5, 10, 0, 0)),
            Some(at(2024, 5, 15, 0, 0))
        );
        // unrestricted day-of-week keeps day-of-month alone
        assert_eq!(
            next("0 0 15 * *", at(2024, 5, 1, 0, 0)),
            Some(at(2024, 5, 15, 0, 0))
        );
    }

    #[test]
    fn test_month_names_and_leap_day() {
        assert_eq!(
            next("0 0 29 feb *", at(2025, 1, 1, 0, 0)),
            Some(at(2028, 2, 29, 0, 0))
        );
        assert_eq!(next("0 0 30 2 *", at(2024, 1, 1, 0, 0)), None);
    }

    #[test]
    fn test_invalid_expressions() {
        for expr in [
            "",
            "* * * *",
            "* * * * * *",
            "60 * * * *",
            "* 24 * * *",
            "* * 0 * *",
            "* * * 13 *",
            "* * * * 8",
            "*/0 * * * *",
            "5-1 * * * *",
            "a * * * *",
            "1,,2 * * * *",
        ] {
            assert!(CronSchedule::parse(expr).is_err(), "{}", expr);
        }
    }

    #[test]
    fn test_display_keeps_expression() {
        let schedule: CronSchedule = " 0 3 * * * ".parse().unwrap();
        assert_eq!(schedule.to_string(), "0 3 * * *");
        assert_eq!(schedule.expression(), "0 3 * * *");
    }
}
