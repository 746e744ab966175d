use derive_more::{Display, Error};
use lazy_regex::regex_captures;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use time::{Date, Duration, Month, PrimitiveDateTime};

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
#[display("Invalid date {input:?}, expected MM-YYYY")]
pub struct InvalidDateFormat {
    pub input: String,
}

/// Month precision date. Always stored as the first day of the month,
/// rendered on the wire as `MM-YYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthYear(Date);

impl MonthYear {
    pub fn new(year: i32, month: Month) -> Result<Self, time::error::ComponentRange> {
        Date::from_calendar_date(year, month, 1).map(Self)
    }

    pub fn parse(s: &str) -> Result<Self, InvalidDateFormat> {
        s.parse()
    }

    pub fn date(&self) -> Date {
        self.0
    }

    pub fn midnight(&self) -> PrimitiveDateTime {
        self.0.midnight()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> Month {
        self.0.month()
    }
}

impl From<Date> for MonthYear {
    fn from(d: Date) -> Self {
        Self(d.saturating_sub(Duration::days(i64::from(d.day()) - 1)))
    }
}

impl From<MonthYear> for Date {
    fn from(m: MonthYear) -> Self {
        m.0
    }
}

impl FromStr for MonthYear {
    type Err = InvalidDateFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || InvalidDateFormat {
            input: s.to_string(),
        };
        let (_, month, year) = regex_captures!(r"^([0-9]{2})-([0-9]{4})$", s).ok_or_else(err)?;
        let month = month
            .parse::<u8>()
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .ok_or_else(err)?;
        let year = year.parse::<i32>().map_err(|_| err())?;
        Self::new(year, month).map_err(|_| err())
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", u8::from(self.0.month()), self.0.year())
    }
}

impl Serialize for MonthYear {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthYear {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        String::deserialize(de)?
            .parse()
            .map_err(de::Error::custom)
    }
}

/// `null`, `""` and a missing field all mean "no date".
pub fn optional_month_year<'de, D>(de: D) -> Result<Option<MonthYear>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(de)?.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(de::Error::custom),
    }
}
