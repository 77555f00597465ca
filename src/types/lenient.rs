//! Field decoders for model-written detail below the day level.
//!
//! The structural gate only checks cost shapes inside a day, so these accept
//! whatever else passed it rather than failing the whole document.

use serde::{de::DeserializeOwned, de::Error, Deserialize, Deserializer};
use serde_json::Value;

/// Null, or anything that does not decode as `T`, becomes `T::default()`.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Strings pass through, numbers and booleans are rendered, anything else is empty.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    })
}

/// Day position written as `1` or `1.0`.
pub fn day_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|number| number.fract() == 0.0 && *number >= 0.0)
                .map(|number| number as u64)
        })
        .and_then(|number| u32::try_from(number).ok())
        .ok_or_else(|| D::Error::custom(format!("invalid day number {value}")))
}
