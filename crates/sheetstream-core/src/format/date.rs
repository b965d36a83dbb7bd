//! Date serials and date/time section rendering

use chrono::{Datelike, Days, NaiveDate};

use super::{DatePart, Token};

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// The epoch a workbook counts date serials from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DateSystem {
    /// Serial 1 is 1900-01-01, and 1900 is treated as a leap year
    #[default]
    Excel1900,
    /// Serial 0 is 1904-01-01 (`<workbookPr date1904="1"/>`)
    Excel1904,
}

/// Calendar date of a whole serial day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExcelDate {
    pub year: i32,
    pub month: u32,
    /// Day of month; 0 for the 1900 system's serial 0 (`1900-01-00`)
    pub day: u32,
    /// 0 = Sunday
    pub weekday: u32,
}

impl DateSystem {
    /// Pick the system from a workbook's `date1904` flag
    pub fn from_date1904(date1904: bool) -> Self {
        if date1904 {
            DateSystem::Excel1904
        } else {
            DateSystem::Excel1900
        }
    }

    /// Convert a whole-day serial to a calendar date.
    ///
    /// The 1900 system reproduces the spreadsheet leap-year bug: serial 60 is
    /// the fictitious 1900-02-29 and serials before it are one day off from
    /// the proleptic calendar. Returns `None` for negative serials and years
    /// past 9999.
    pub fn date(self, serial: i64) -> Option<ExcelDate> {
        if serial < 0 {
            return None;
        }

        let date = match self {
            DateSystem::Excel1900 => {
                let weekday = ((serial + 6) % 7) as u32;
                let epoch = match serial {
                    0 => {
                        return Some(ExcelDate {
                            year: 1900,
                            month: 1,
                            day: 0,
                            weekday,
                        })
                    }
                    60 => {
                        return Some(ExcelDate {
                            year: 1900,
                            month: 2,
                            day: 29,
                            weekday,
                        })
                    }
                    1..=59 => NaiveDate::from_ymd_opt(1899, 12, 31)?,
                    _ => NaiveDate::from_ymd_opt(1899, 12, 30)?,
                };
                epoch.checked_add_days(Days::new(serial as u64))?
            }
            DateSystem::Excel1904 => {
                NaiveDate::from_ymd_opt(1904, 1, 1)?.checked_add_days(Days::new(serial as u64))?
            }
        };

        if date.year() > 9999 {
            return None;
        }

        Some(ExcelDate {
            year: date.year(),
            month: date.month(),
            day: date.day(),
            weekday: date.weekday().num_days_from_sunday(),
        })
    }
}

/// `m` means minutes right after an hour or right before a second token;
/// a `.0` run after seconds is a sub-second field.
fn resolve(tokens: &[Token]) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            Token::Point if matches!(tokens.get(i + 1), Some(Token::Digit(_))) => {
                let width = tokens[i + 1..]
                    .iter()
                    .take_while(|t| matches!(t, Token::Digit(_)))
                    .count();
                out.push(Token::Date(DatePart::SubSecond(width)));
                i += 1 + width;
                continue;
            }
            Token::Date(DatePart::Month(n)) => {
                let after_hour = out.iter().rev().find_map(date_part).is_some_and(|p| {
                    matches!(
                        p,
                        DatePart::Hour(_) | DatePart::Elapsed { unit: 'h', .. }
                    )
                });
                let before_second = tokens[i + 1..].iter().find_map(date_part).is_some_and(|p| {
                    matches!(
                        p,
                        DatePart::Second(_) | DatePart::Elapsed { unit: 's', .. }
                    )
                });
                if after_hour || before_second {
                    out.push(Token::Date(DatePart::Minute(*n)));
                } else {
                    out.push(tokens[i].clone());
                }
            }
            other => out.push(other.clone()),
        }
        i += 1;
    }
    out
}

fn date_part(token: &Token) -> Option<DatePart> {
    match token {
        Token::Date(part) if !matches!(part, DatePart::AmPm { .. } | DatePart::SubSecond(_)) => {
            Some(*part)
        }
        _ => None,
    }
}

/// Render a date/time section. `None` for negative or out-of-range serials.
pub(super) fn format_datetime(value: f64, tokens: &[Token], system: DateSystem) -> Option<String> {
    if value < 0.0 || !value.is_finite() {
        return None;
    }

    let tokens = resolve(tokens);
    let sub_digits = tokens
        .iter()
        .filter_map(|t| match t {
            Token::Date(DatePart::SubSecond(n)) => Some((*n).min(3)),
            _ => None,
        })
        .max()
        .unwrap_or(0);
    let twelve_hour = tokens
        .iter()
        .any(|t| matches!(t, Token::Date(DatePart::AmPm { .. })));

    // whole days plus the time of day in 1/scale second ticks
    let scale = 10i64.pow(sub_digits as u32);
    let ticks_per_day = 86_400 * scale;
    let mut days = value.floor() as i64;
    let mut ticks = ((value - value.floor()) * ticks_per_day as f64).round() as i64;
    if ticks >= ticks_per_day {
        days += 1;
        ticks -= ticks_per_day;
    }

    let date = system.date(days)?;
    let seconds = ticks / scale;
    let fraction = ticks % scale;
    let hour = seconds / 3600;
    let minute = (seconds / 60) % 60;
    let second = seconds % 60;

    let mut out = String::new();
    for token in &tokens {
        match token {
            Token::Date(part) => match *part {
                DatePart::Year(n) if n <= 2 => {
                    out.push_str(&format!("{:02}", date.year.rem_euclid(100)))
                }
                DatePart::Year(_) => out.push_str(&format!("{:04}", date.year)),
                DatePart::Month(n) => {
                    let name = MONTHS[(date.month as usize).saturating_sub(1) % 12];
                    match n {
                        1 => out.push_str(&date.month.to_string()),
                        2 => out.push_str(&format!("{:02}", date.month)),
                        3 => out.push_str(&name[..3]),
                        4 => out.push_str(name),
                        _ => out.push_str(&name[..1]),
                    }
                }
                DatePart::Day(n) => {
                    let name = WEEKDAYS[date.weekday as usize % 7];
                    match n {
                        1 => out.push_str(&date.day.to_string()),
                        2 => out.push_str(&format!("{:02}", date.day)),
                        3 => out.push_str(&name[..3]),
                        _ => out.push_str(name),
                    }
                }
                DatePart::Hour(n) => {
                    let h = if twelve_hour {
                        match hour % 12 {
                            0 => 12,
                            h => h,
                        }
                    } else {
                        hour
                    };
                    pad(&mut out, h, n);
                }
                DatePart::Minute(n) => pad(&mut out, minute, n),
                DatePart::Second(n) => pad(&mut out, second, n),
                DatePart::SubSecond(n) => {
                    let digits = format!("{:0width$}", fraction, width = sub_digits);
                    out.push('.');
                    out.push_str(&digits[..n.min(digits.len())]);
                }
                DatePart::AmPm { short, lower } => {
                    let text = match (hour < 12, short) {
                        (true, false) => "AM",
                        (false, false) => "PM",
                        (true, true) => "A",
                        (false, true) => "P",
                    };
                    if lower {
                        out.push_str(&text.to_ascii_lowercase());
                    } else {
                        out.push_str(text);
                    }
                }
                DatePart::Elapsed { unit, width } => {
                    let total = match unit {
                        'h' => days * 24 + hour,
                        'm' => (days * 24 + hour) * 60 + minute,
                        _ => days * 86_400 + seconds,
                    };
                    out.push_str(&format!("{:0width$}", total, width = width));
                }
            },
            Token::Literal(s) => out.push_str(s),
            Token::Point => out.push('.'),
            Token::Comma => out.push(','),
            Token::Slash => out.push('/'),
            Token::Percent => out.push('%'),
            Token::Denominator(d) => out.push_str(&d.to_string()),
            Token::Digit(_) => out.push('0'),
            _ => {}
        }
    }
    Some(out)
}

fn pad(out: &mut String, value: i64, width: usize) {
    if width >= 2 {
        out.push_str(&format!("{:02}", value));
    } else {
        out.push_str(&value.to_string());
    }
}
