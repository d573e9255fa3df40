//! Serde helpers for loosely typed JSON input.

use serde::{Deserialize, Deserializer};

/// Deserialize a field, treating an explicit JSON `null` like a missing one.
///
/// Use together with `#[serde(default)]` so both absent and `null` fields
/// fall back to `T::default()`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
