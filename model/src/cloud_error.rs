use serde::{Deserialize, Serialize};
use serde_plain::{derive_display_from_serialize, derive_fromstr_from_deserialize};
use std::fmt::{Display, Formatter};

/// The category of a [`TypedCloudErrorInfo`].
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone, Copy, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// The profile's parameters are unusable (certificate, subscription id).
    Configuration,
    /// A call to the cloud provider failed.
    Provider,
    /// The image or password payload could not be decoded.
    Parse,
    /// A single instance failed to start, stop or be destroyed.
    Instance,
}

derive_display_from_serialize!(ErrorKind);
derive_fromstr_from_deserialize!(ErrorKind);

/// An error record that is attached to a cloud client or instance and shown to operators. The
/// `details` never carry secret material.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TypedCloudErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<String>,
}

impl TypedCloudErrorInfo {
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details<S: Into<String>>(mut self, details: S) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn provider<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::Provider, message)
    }

    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn instance<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::Instance, message)
    }
}

impl Display for TypedCloudErrorInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_includes_kind_and_details() {
        let e = TypedCloudErrorInfo::configuration("Invalid certificate").with_details("not base64");
        assert_eq!(
            e.to_string(),
            "configuration error: Invalid certificate (not base64)"
        );
    }
}
