use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    Decode, DecodeError, Row, Value,
    row::{Column, mismatch},
};

/// Decode json text column.
///
/// ```no_run
/// use std::collections::HashMap;
/// use rowbin::{Row, types::Json};
///
/// # fn app(row: Row) -> Result<(), rowbin::DecodeError> {
/// let Json(payload) = row.try_get::<_, Json<HashMap<String, String>>>("payload")?;
/// println!("{:?}", payload.get("kind"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Json<T>(pub T);

impl<T> Decode for Json<T>
where
    T: DeserializeOwned,
{
    fn decode(column: Column) -> Result<Self, DecodeError> {
        match column.try_into_value()? {
            Value::String(v) => Ok(Self(serde_json::from_str(&v)?)),
            Value::FixedString(v) => Ok(Self(serde_json::from_slice(&v)?)),
            value => Err(mismatch("Json", &value)),
        }
    }
}

impl<T: Serialize> Serialize for Json<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Json<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self(T::deserialize(deserializer)?))
    }
}

impl Value {
    /// Render value as json.
    ///
    /// # Errors
    ///
    /// Returns error if a `Map` key renders as neither string nor integer.
    pub fn to_json(&self) -> Result<serde_json::Value, DecodeError> {
        serde_json::to_value(self).map_err(Into::into)
    }
}

impl Row {
    /// Render row as json object keyed by column names.
    ///
    /// # Errors
    ///
    /// Returns error if a `Map` key renders as neither string nor integer.
    pub fn to_json(&self) -> Result<serde_json::Value, DecodeError> {
        serde_json::to_value(self).map_err(Into::into)
    }
}
