//! Lenient field decoders shared by the wire models.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Text(String),
    Int(i64),
    Float(f64),
    Null(()),
}

/// Decode a field the backend sometimes sends as a number (`"floor": 2`).
pub(crate) fn string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Text(value) => value,
        Loose::Int(value) => value.to_string(),
        Loose::Float(value) => value.to_string(),
        Loose::Null(()) => String::new(),
    })
}

/// Optional variant of [`string_or_number`].
pub(crate) fn opt_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Text(value) => Some(value),
        Loose::Int(value) => Some(value.to_string()),
        Loose::Float(value) => Some(value.to_string()),
        Loose::Null(()) => None,
    })
}
