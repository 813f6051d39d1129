//! Period frequencies for projecting future timestamps.
//!
//! Aliases follow the pandas offset names commonly found in pipeline configs
//! (`D`, `W`, `MS`, `M`, ...). Anchored frequencies (month/quarter/year
//! start or end) always step to the next anchor strictly after the given
//! timestamp; the time of day is carried over unchanged.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Hourly,
    Daily,
    /// Weekly, anchored on Sundays (`W` / `W-SUN`).
    Weekly,
    MonthStart,
    MonthEnd,
    QuarterStart,
    QuarterEnd,
    YearStart,
    YearEnd,
}

impl Frequency {
    /// The first timestamp on this frequency strictly after `ts`, or `None`
    /// when it falls outside chrono's calendar range.
    pub fn next_after(self, ts: NaiveDateTime) -> Option<NaiveDateTime> {
        let date = ts.date();
        let next = match self {
            Frequency::Hourly => return ts.checked_add_signed(Duration::hours(1)),
            Frequency::Daily => return ts.checked_add_signed(Duration::days(1)),
            Frequency::Weekly => {
                let from_sunday = i64::from(date.weekday().num_days_from_sunday());
                let ahead = if from_sunday == 0 { 7 } else { 7 - from_sunday };
                date.checked_add_signed(Duration::days(ahead))?
            }
            Frequency::MonthStart => add_months(first_of_month(date.year(), date.month())?, 1)?,
            Frequency::MonthEnd => {
                let end = last_of_month(date.year(), date.month())?;
                if date < end {
                    end
                } else {
                    let next = add_months(first_of_month(date.year(), date.month())?, 1)?;
                    last_of_month(next.year(), next.month())?
                }
            }
            Frequency::QuarterStart => {
                add_months(first_of_month(date.year(), quarter_first_month(date.month()))?, 3)?
            }
            Frequency::QuarterEnd => {
                let end_month = quarter_first_month(date.month()) + 2;
                let end = last_of_month(date.year(), end_month)?;
                if date < end {
                    end
                } else {
                    let next = add_months(first_of_month(date.year(), end_month)?, 3)?;
                    last_of_month(next.year(), next.month())?
                }
            }
            Frequency::YearStart => first_of_month(date.year().checked_add(1)?, 1)?,
            Frequency::YearEnd => {
                let end = last_of_month(date.year(), 12)?;
                if date < end {
                    end
                } else {
                    last_of_month(date.year().checked_add(1)?, 12)?
                }
            }
        };
        Some(next.and_time(ts.time()))
    }

    /// `n` consecutive timestamps after `last`; `None` if any step leaves the
    /// calendar range.
    pub fn steps_after(self, last: NaiveDateTime, n: usize) -> Option<Vec<NaiveDateTime>> {
        let mut out = Vec::new();
        let mut cursor = last;
        for _ in 0..n {
            cursor = self.next_after(cursor)?;
            out.push(cursor);
        }
        Some(out)
    }

    pub fn alias(self) -> &'static str {
        match self {
            Frequency::Hourly => "H",
            Frequency::Daily => "D",
            Frequency::Weekly => "W",
            Frequency::MonthStart => "MS",
            Frequency::MonthEnd => "M",
            Frequency::QuarterStart => "QS",
            Frequency::QuarterEnd => "Q",
            Frequency::YearStart => "YS",
            Frequency::YearEnd => "Y",
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "H" | "h" => Ok(Frequency::Hourly),
            "D" => Ok(Frequency::Daily),
            "W" | "W-SUN" => Ok(Frequency::Weekly),
            "MS" => Ok(Frequency::MonthStart),
            "M" | "ME" => Ok(Frequency::MonthEnd),
            "QS" | "QS-JAN" => Ok(Frequency::QuarterStart),
            "Q" | "QE" | "Q-DEC" => Ok(Frequency::QuarterEnd),
            "YS" | "AS" => Ok(Frequency::YearStart),
            "Y" | "A" | "YE" => Ok(Frequency::YearEnd),
            other => Err(format!(
                "Unknown period frequency '{other}'. Expected one of: H, D, W, MS, M, QS, Q, YS, Y."
            )),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alias())
    }
}

fn quarter_first_month(month: u32) -> u32 {
    ((month - 1) / 3) * 3 + 1
}

fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn add_months(first: NaiveDate, months: u32) -> Option<NaiveDate> {
    first.checked_add_months(Months::new(months))
}

fn last_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    if month == 12 {
        return NaiveDate::from_ymd_opt(year, 12, 31);
    }
    first_of_month(year, month + 1)?.pred_opt()
}
