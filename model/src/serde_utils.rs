use serde::{Deserialize, Deserializer};

/// Instead of making struct fields `Option`s, we can use this function when deserializing to
/// assign the default value to an explicit `null`. Image payloads written by older settings pages
/// carry `null` for fields the operator never filled in.
pub(crate) fn null_to_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let opt = Option::deserialize(d)?;
    let val = opt.unwrap_or_default();
    Ok(val)
}
