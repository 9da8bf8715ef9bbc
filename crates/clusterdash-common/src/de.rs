use serde::{Deserialize, Deserializer};

/// Decode an explicit JSON `null` as the type's default.
///
/// Pair with `#[serde(default)]` so that both a missing field and a `null`
/// field end up as an empty collection.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
