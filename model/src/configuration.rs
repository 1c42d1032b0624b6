use crate::error::{self, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use snafu::ResultExt;
use std::fmt::Debug;

/// The `Configuration` trait is for "plain old data" structs that travel as JSON: image templates
/// inside the `images_data` profile parameter and the instance records that a cloud client
/// persists in its state directory.
///
/// The traits aggregated by `Configuration` provide a way to strongly type data that is otherwise
/// an unconstrained JSON object.
pub trait Configuration:
    Serialize + DeserializeOwned + Clone + Debug + Default + Send + Sync + Sized + 'static
{
    /// Convert the `Configuration` object to a serde `Value`.
    fn into_value(self) -> Result<Value> {
        Ok(serde_json::to_value(self).context(error::ConfigSerializationSnafu)?)
    }

    /// Deserialize the `Configuration` object from a serde `Value`.
    fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value).context(error::ConfigDeserializationSnafu)?)
    }
}
