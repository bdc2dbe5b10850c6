//! Type integration with external types
//!
//! Implementation [`Decode`][d] and [`Mapper`][m] for external types.
//!
//! Available for:
//!
//! - [`serde`]'s [`Serialize`][ss] for [`Value`][v] and [`Row`][r], requires `serde` feature
//! - [`serde`]'s [`Deserialize`][sd] via [`Json`], requires `json` feature
//! - [`time`][::time]'s [`Date`][td], [`OffsetDateTime`][to], [`UtcDateTime`][tu]
//!   and [`TimeMapper`], requires `time` feature
//!
//! [d]: crate::Decode
//! [m]: crate::Mapper
//! [v]: crate::Value
//! [r]: crate::Row
//! [sd]: serde::Deserialize
//! [ss]: serde::Serialize
//! [td]: ::time::Date
//! [to]: ::time::OffsetDateTime
//! [tu]: ::time::UtcDateTime

#[cfg(feature = "serde")]
mod ser;

#[cfg(feature = "json")]
mod json;
#[cfg(feature = "json")]
pub use json::Json;

#[cfg(feature = "time")]
mod time;
#[cfg(feature = "time")]
pub use time::TimeMapper;
