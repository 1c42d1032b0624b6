use crate::bootstrap::BootstrapError;
use crate::clients::ClientError;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// The error type returned by a [`ClientFactory`] when it cannot be set up or cannot reach the
/// fleet manager.
///
/// [`ClientFactory`]: crate::ClientFactory
#[derive(Debug)]
pub enum FactoryError {
    Bootstrap(BootstrapError),
    Fleet(ClientError),
}

pub type FactoryResult<T> = std::result::Result<T, FactoryError>;

impl ErrorEnum for FactoryError {
    fn variant_name(&self) -> &'static str {
        match self {
            FactoryError::Bootstrap(_) => "Bootstrap error",
            FactoryError::Fleet(_) => "Fleet manager error",
        }
    }

    fn inner(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        match self {
            FactoryError::Bootstrap(e) => Some(e as &(dyn Error + Send + Sync + 'static)),
            FactoryError::Fleet(e) => Some(e as &(dyn Error + Send + Sync + 'static)),
        }
    }
}

impl Display for FactoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.display(f)
    }
}

impl Error for FactoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner_as_source()
    }
}

impl From<BootstrapError> for FactoryError {
    fn from(e: BootstrapError) -> Self {
        Self::Bootstrap(e)
    }
}

impl From<ClientError> for FactoryError {
    fn from(e: ClientError) -> Self {
        Self::Fleet(e)
    }
}

/// This struct can serve as an `Error` type when you want to provide an error message, but have no
/// underlying error type. It is handy in [`FleetManager`] and [`ManagementApi`] implementations.
///
/// # Example
///
/// ```
/// # use cloud_client::error::ErrorMessage;
/// let _error: ErrorMessage = "Profile 'arm-1' is gone".into();
/// ```
///
/// [`FleetManager`]: crate::clients::FleetManager
/// [`ManagementApi`]: crate::provider::ManagementApi
#[derive(Debug)]
pub struct ErrorMessage {
    message: String,
}

impl Display for ErrorMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.message, f)
    }
}

impl<S: Into<String>> From<S> for ErrorMessage {
    fn from(s: S) -> Self {
        Self { message: s.into() }
    }
}

impl std::error::Error for ErrorMessage {}

/// Shared `Display` and `source` plumbing for the error enums of this crate.
pub(crate) trait ErrorEnum {
    fn variant_name(&self) -> &'static str;
    fn inner(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)>;

    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.inner() {
            None => Display::fmt(self.variant_name(), f),
            Some(inner) => write!(f, "{}: {}", self.variant_name(), inner),
        }
    }

    fn inner_as_source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner().map(|some| some as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fleet_error_display() {
        let e: FactoryError = ClientError::MissingData(Some("no profiles".into())).into();
        assert_eq!(e.to_string(), "Fleet manager error: Missing data: no profiles");
    }
}
