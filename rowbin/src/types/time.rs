use time::{Date, OffsetDateTime, UtcDateTime};

use crate::{
    Decode, DecodeError, Mapper, Value,
    row::{Column, mismatch},
};

/// Julian day of unix epoch, `1970-01-01`.
const UNIX_EPOCH_JULIAN_DAY: i32 = 2_440_588;

/// [`Mapper`] which maps temporal columns into [`time`][::time] types.
///
/// `Date` and `Date32` map into [`Value::TimeDate`], `DateTime` and
/// `DateTime64` map into [`Value::TimeDateTime`] at UTC offset, column
/// timezone is not applied.
///
/// Value outside of the range supported by [`time`][::time] keeps its raw
/// representation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeMapper;

impl Mapper for TimeMapper {
    fn date(&self, days: i32) -> Value {
        match date(days) {
            Some(date) => Value::TimeDate(date),
            None => Value::Date(days),
        }
    }

    fn date_time(&self, seconds: u32, _: Option<&str>) -> Value {
        match OffsetDateTime::from_unix_timestamp(seconds.into()) {
            Ok(datetime) => Value::TimeDateTime(datetime),
            Err(_) => Value::DateTime(seconds),
        }
    }

    fn date_time64(&self, ticks: i64, precision: u8, _: Option<&str>) -> Value {
        match date_time64(ticks, precision) {
            Some(datetime) => Value::TimeDateTime(datetime),
            None => Value::DateTime64 { ticks, precision },
        }
    }
}

fn date(days: i32) -> Option<Date> {
    Date::from_julian_day(UNIX_EPOCH_JULIAN_DAY.checked_add(days)?).ok()
}

fn date_time64(ticks: i64, precision: u8) -> Option<OffsetDateTime> {
    let scale = 10i128.checked_pow(9u32.checked_sub(precision.into())?)?;
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ticks) * scale).ok()
}

impl Decode for Date {
    fn decode(column: Column) -> Result<Self, DecodeError> {
        match column.try_into_value()? {
            Value::TimeDate(date) => Ok(date),
            Value::Date(days) => date(days).ok_or(DecodeError::OutOfRange("Date")),
            value => Err(mismatch("Date", &value)),
        }
    }
}

impl Decode for OffsetDateTime {
    fn decode(column: Column) -> Result<Self, DecodeError> {
        match column.try_into_value()? {
            Value::TimeDateTime(datetime) => Ok(datetime),
            Value::DateTime(seconds) => OffsetDateTime::from_unix_timestamp(seconds.into())
                .map_err(|_| DecodeError::OutOfRange("OffsetDateTime")),
            Value::DateTime64 { ticks, precision } => {
                date_time64(ticks, precision).ok_or(DecodeError::OutOfRange("OffsetDateTime"))
            }
            value => Err(mismatch("OffsetDateTime", &value)),
        }
    }
}

impl Decode for UtcDateTime {
    fn decode(column: Column) -> Result<Self, DecodeError> {
        OffsetDateTime::decode(column).map(OffsetDateTime::to_utc)
    }
}
