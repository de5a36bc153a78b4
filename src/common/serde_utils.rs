use serde::{Deserialize, Deserializer};

/// Distingue campo ausente (`None`) de campo enviado como `null` (`Some(None)`).
/// Usar junto com `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
