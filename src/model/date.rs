//! PDF date strings.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use regex::Regex;

use crate::error::{Error, Result};

/// A date string (`D:YYYYMMDDHHMMSS...`).
///
/// Dates are held in UTC. They are written as `D:YYYYMMDDHHMMSSZ00` and
/// read from `D:YYYYMMDDHHMMSS+HH'mm'`; the `-HH'mm'`, `Z` and `Z00`
/// suffixes are accepted as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PdfDate(DateTime<Utc>);

fn date_regex() -> &'static Regex {
    static DATE_RE: OnceLock<Regex> = OnceLock::new();
    DATE_RE.get_or_init(|| {
        Regex::new(
            r"^D:(\d{4})(\d{2})(\d{2})(\d{2})(\d{2})(\d{2})(?:Z(?:00(?:'00'?)?)?|([+-])(\d{2})'(\d{2})'?)$",
        )
        .expect("date grammar is a valid regex")
    })
}

impl PdfDate {
    /// Wrap a UTC timestamp. Sub-second precision is dropped.
    pub fn new(datetime: DateTime<Utc>) -> Self {
        let truncated = Utc
            .timestamp_opt(datetime.timestamp(), 0)
            .single()
            .unwrap_or(datetime);
        Self(truncated)
    }

    /// Parse a date string.
    ///
    /// Fails with [`Error::InvalidFormat`] when `text` does not follow the
    /// date grammar or names a calendar date that does not exist.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || Error::InvalidFormat(format!("not a PDF date string: {:?}", text));
        let caps = date_regex().captures(text).ok_or_else(invalid)?;

        let field = |i: usize| -> Result<u32> {
            caps.get(i)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .ok_or_else(invalid)
        };
        let year = field(1)? as i32;
        let (month, day) = (field(2)?, field(3)?);
        let (hour, minute, second) = (field(4)?, field(5)?, field(6)?);
        let naive = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, second))
            .ok_or_else(invalid)?;

        let offset_seconds = match caps.get(7) {
            Some(sign) => {
                let hours = field(8)? as i32;
                let minutes = field(9)? as i32;
                if hours > 23 || minutes > 59 {
                    return Err(invalid());
                }
                let magnitude = hours * 3600 + minutes * 60;
                if sign.as_str() == "-" {
                    -magnitude
                } else {
                    magnitude
                }
            }
            None => 0,
        };
        let offset = FixedOffset::east_opt(offset_seconds).ok_or_else(invalid)?;
        let local = offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(invalid)?;

        Ok(Self(local.with_timezone(&Utc)))
    }

    /// The timestamp in UTC.
    pub fn datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Render the write form, `D:YYYYMMDDHHMMSSZ00`.
    pub fn to_pdf_string(&self) -> String {
        self.0.format("D:%Y%m%d%H%M%SZ00").to_string()
    }
}

impl From<DateTime<Utc>> for PdfDate {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::new(datetime)
    }
}

impl std::str::FromStr for PdfDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PdfDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pdf_string())
    }
}
