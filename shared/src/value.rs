//! Structured values produced by the CBOR decode primitive.

pub use ciborium::Value;

/// Convenience accessors over decoded [`Value`]s, used by delegates reading
/// their attributes and by message reconstruction.
pub trait ValueExt {
    /// Non-negative integer that fits in a `u64`
    fn as_u64(&self) -> Option<u64>;

    /// Signed integer that fits in an `i64`
    fn as_i64(&self) -> Option<i64>;

    /// Looks up a text key in a CBOR map
    fn get_field(&self, key: &str) -> Option<&Value>;
}

impl ValueExt for Value {
    fn as_u64(&self) -> Option<u64> {
        self.as_integer().and_then(|integer| u64::try_from(integer).ok())
    }

    fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(|integer| i64::try_from(integer).ok())
    }

    fn get_field(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(entry_key, _)| entry_key.as_text() == Some(key))
            .map(|(_, value)| value)
    }
}

/// Builds a CBOR map with text keys, in the given order
pub fn text_map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Value {
    Value::Map(
        entries
            .into_iter()
            .map(|(key, value)| (Value::Text(key.into()), value))
            .collect(),
    )
}
