//! Date columns backed by integer chunks.
//!
//! `Date32` holds days since 1970-01-01 and `Date64` holds milliseconds since
//! 1970-01-01T00:00:00. Scalars read from these columns are their physical
//! integer values.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use tabula_error::{DbError, Result};

use super::Series;
use crate::arrays::chunked_array::{Int32Chunked, Int64Chunked, Utf8ChunkedBuilder};
use crate::arrays::datatype::DataType;

/// Days from 0001-01-01 (day 1 of the common era) to the unix epoch.
pub const EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub const MILLISECONDS_IN_DAY: i64 = 86_400_000;

pub fn date32_to_naive_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(EPOCH_DAYS_FROM_CE)?)
}

pub fn naive_date_to_date32(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

pub fn date64_to_naive_datetime(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

pub fn naive_datetime_to_date64(datetime: NaiveDateTime) -> i64 {
    datetime.and_utc().timestamp_millis()
}

/// Parse a date such as `2020-08-21`.
fn parse_date32(s: &str) -> Option<i32> {
    NaiveDate::from_str(s).ok().map(naive_date_to_date32)
}

/// Parse a date time such as `2015-09-05 23:56:04`. A plain date is read as
/// midnight.
fn parse_date64(s: &str) -> Option<i64> {
    let datetime = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::from_str(s))
        .ok()
        .or_else(|| {
            NaiveDate::from_str(s)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    Some(naive_datetime_to_date64(datetime))
}

impl Series {
    fn not_temporal(&self) -> DbError {
        DbError::type_mismatch("Expected a temporal series").with_field("datatype", self.dtype())
    }

    /// Create a `Date32` series by parsing strings with a chrono format
    /// string. Strings that don't parse become null.
    pub fn parse_date32(name: &str, values: &[&str], fmt: &str) -> Series {
        let days = values.iter().map(|s| {
            NaiveDate::parse_from_str(s, fmt)
                .ok()
                .map(naive_date_to_date32)
        });
        Int32Chunked::from_options_iter(name, DataType::Date32, days).into()
    }

    /// Create a `Date64` series by parsing strings with a chrono format
    /// string. Strings that don't parse become null.
    pub fn parse_date64(name: &str, values: &[&str], fmt: &str) -> Series {
        let millis = values.iter().map(|s| {
            NaiveDateTime::parse_from_str(s, fmt)
                .ok()
                .map(naive_datetime_to_date64)
        });
        Int64Chunked::from_options_iter(name, DataType::Date64, millis).into()
    }

    /// Date time of each value of a temporal series. `Date32` values are at
    /// midnight.
    pub fn as_naive_datetimes(&self) -> Result<Vec<Option<NaiveDateTime>>> {
        match self {
            Series::Int32(ca) if ca.dtype() == &DataType::Date32 => Ok(ca
                .iter()
                .map(|v| {
                    v.and_then(date32_to_naive_date)
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
                .collect()),
            Series::Int64(ca) if ca.dtype() == &DataType::Date64 => {
                Ok(ca.iter().map(|v| v.and_then(date64_to_naive_datetime)).collect())
            }
            _ => Err(self.not_temporal()),
        }
    }

    /// Date of each value of a temporal series, dropping any time of day.
    pub fn as_naive_dates(&self) -> Result<Vec<Option<NaiveDate>>> {
        let datetimes = self.as_naive_datetimes()?;
        Ok(datetimes.into_iter().map(|dt| dt.map(|dt| dt.date())).collect())
    }

    pub fn year(&self) -> Result<Series> {
        self.date_part(|dt| dt.year())
    }

    /// Month from 1 to 12.
    pub fn month(&self) -> Result<Series> {
        self.date_part(|dt| dt.month() as i32)
    }

    /// Day of the month from 1 to 31.
    pub fn day(&self) -> Result<Series> {
        self.date_part(|dt| dt.day() as i32)
    }

    fn date_part(&self, part: impl Fn(NaiveDateTime) -> i32) -> Result<Series> {
        let datetimes = self.as_naive_datetimes()?;
        let values = datetimes.into_iter().map(|dt| dt.map(&part));
        Ok(Int32Chunked::from_options_iter(self.name(), DataType::Int32, values).into())
    }

    /// Reinterpret between a temporal type and its physical integer type
    /// without touching the values.
    pub(crate) fn with_logical_dtype(self, dtype: &DataType) -> Result<Series> {
        match (self, dtype) {
            (Series::Int32(ca), DataType::Int32 | DataType::Date32) => {
                Ok(ca.with_logical_dtype(dtype.clone()).into())
            }
            (Series::Int64(ca), DataType::Int64 | DataType::Date64) => {
                Ok(ca.with_logical_dtype(dtype.clone()).into())
            }
            (other, dtype) => Err(DbError::type_mismatch("Cannot reinterpret series")
                .with_field("from", other.dtype())
                .with_field("to", dtype)),
        }
    }

    /// Get the series as its physical type.
    pub fn to_physical(&self) -> Series {
        let physical = self.dtype().physical();
        match self.clone().with_logical_dtype(&physical) {
            Ok(series) => series,
            // Only temporal types differ from their physical type.
            Err(_) => self.clone(),
        }
    }

    /// Casts where either side is temporal.
    ///
    /// Dates cast between each other, to and from integers, and to and from
    /// strings. Values that don't fit or don't parse become null.
    pub(crate) fn cast_temporal(&self, dtype: &DataType) -> Result<Series> {
        let series: Series = match (self, dtype) {
            (Series::Int32(ca), DataType::Date64) if ca.dtype() == &DataType::Date32 => {
                let millis = ca.iter().map(|v| v.map(|days| days as i64 * MILLISECONDS_IN_DAY));
                Int64Chunked::from_options_iter(ca.name(), DataType::Date64, millis).into()
            }
            (Series::Int64(ca), DataType::Date32) if ca.dtype() == &DataType::Date64 => {
                let days = ca.iter().map(|v| {
                    v.and_then(|ms| i32::try_from(ms.div_euclid(MILLISECONDS_IN_DAY)).ok())
                });
                Int32Chunked::from_options_iter(ca.name(), DataType::Date32, days).into()
            }
            (Series::Utf8(ca), DataType::Date32) => {
                let days = ca.iter().map(|v| v.and_then(parse_date32));
                Int32Chunked::from_options_iter(ca.name(), DataType::Date32, days).into()
            }
            (Series::Utf8(ca), DataType::Date64) => {
                let millis = ca.iter().map(|v| v.and_then(parse_date64));
                Int64Chunked::from_options_iter(ca.name(), DataType::Date64, millis).into()
            }
            (_, DataType::Utf8) if self.dtype().is_temporal() => self.temporal_to_utf8()?,
            (_, DataType::Date32 | DataType::Date64) if self.dtype().is_numeric() => {
                self.cast(&dtype.physical())?.with_logical_dtype(dtype)?
            }
            (_, dtype) if self.dtype().is_temporal() && dtype.is_numeric() => {
                self.to_physical().cast(dtype)?
            }
            _ => {
                return Err(DbError::type_mismatch("Unsupported cast")
                    .with_field("from", self.dtype())
                    .with_field("to", dtype));
            }
        };
        Ok(series)
    }

    /// Format dates as `2020-08-21` and date times as `2015-09-05 23:56:04`.
    fn temporal_to_utf8(&self) -> Result<Series> {
        let datetimes = self.as_naive_datetimes()?;
        let date_only = self.dtype() == &DataType::Date32;

        let mut builder = Utf8ChunkedBuilder::with_capacity(self.name(), datetimes.len());
        let mut buf = String::new();
        for dt in datetimes {
            match dt {
                Some(dt) => {
                    buf.clear();
                    if date_only {
                        write!(buf, "{}", dt.date())?;
                    } else {
                        write!(buf, "{dt}")?;
                    }
                    builder.append_value(buf.as_str());
                }
                None => builder.append_null(),
            }
        }
        Ok(builder.finish().into())
    }
}

#[cfg(test)]
mod tests {
    use tabula_error::ErrorKind;

    use super::*;
    use crate::arrays::scalar::ScalarValue;
    use crate::arrays::series::NamedFrom;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_dates() {
        let s = Series::parse_date32(
            "dates",
            &["2020-08-21", "2020-08-22", "not a date", "1969-12-31"],
            "%Y-%m-%d",
        );
        assert_eq!(&DataType::Date32, s.dtype());
        assert_eq!(
            Series::new("", &[Some(18495i32), Some(18496), None, Some(-1)]),
            s.to_physical()
        );
        let expected = vec![
            Some(date(2020, 8, 21)),
            Some(date(2020, 8, 22)),
            None,
            Some(date(1969, 12, 31)),
        ];
        assert_eq!(expected, s.as_naive_dates().unwrap());
    }

    #[test]
    fn parse_date_times() {
        let s = Series::parse_date64(
            "dt",
            &["1988-08-25 00:00:16", "2015-09-05 23:56:04", "2012-12-21 00:00:00"],
            "%Y-%m-%d %H:%M:%S",
        );
        assert_eq!(&DataType::Date64, s.dtype());
        assert_eq!(
            Series::new("", &[588470416000i64, 1441497364000, 1356048000000]),
            s.to_physical()
        );
    }

    #[test]
    fn from_naive_values() {
        let s = Series::new("d", &[date(1970, 1, 1), date(2000, 2, 29)]);
        assert_eq!(&DataType::Date32, s.dtype());
        assert_eq!(ScalarValue::Int32(0), s.get(0).unwrap());
        assert_eq!(Series::new("", &[1970i32, 2000]), s.year().unwrap());
        assert_eq!(Series::new("", &[1i32, 2]), s.month().unwrap());
        assert_eq!(Series::new("", &[1i32, 29]), s.day().unwrap());

        let dt = date(2015, 9, 5).and_hms_opt(23, 56, 4).unwrap();
        let s = Series::new("dt", &[Some(dt), None]);
        assert_eq!(&DataType::Date64, s.dtype());
        assert_eq!(vec![Some(dt), None], s.as_naive_datetimes().unwrap());
    }

    #[test]
    fn casts() {
        let s = Series::new("d", &[Some(date(2020, 8, 21)), None]);

        let ms = s.cast(&DataType::Date64).unwrap();
        assert_eq!(
            Series::new("", &[Some(18495i64 * MILLISECONDS_IN_DAY), None]),
            ms.to_physical()
        );
        assert_eq!(s, ms.cast(&DataType::Date32).unwrap());

        let strings = s.cast(&DataType::Utf8).unwrap();
        assert_eq!(Series::new("", &[Some("2020-08-21"), None]), strings);
        assert_eq!(s, strings.cast(&DataType::Date32).unwrap());

        let strings = ms.cast(&DataType::Utf8).unwrap();
        assert_eq!(Series::new("", &[Some("2020-08-21 00:00:00"), None]), strings);
        assert_eq!(ms, strings.cast(&DataType::Date64).unwrap());

        let days = s.cast(&DataType::Int64).unwrap();
        assert_eq!(Series::new("", &[Some(18495i64), None]), days);
        assert_eq!(s, days.cast(&DataType::Date32).unwrap());

        let err = s.cast(&DataType::Boolean).unwrap_err();
        assert_eq!(ErrorKind::Type, err.kind());
    }

    #[test]
    fn date_parts_need_temporal() {
        let s = Series::new("a", &[1i32]);
        assert_eq!(ErrorKind::Type, s.year().unwrap_err().kind());
        assert_eq!(s, s.to_physical());
    }
}
