use crate::error::{ErrorEnum, ErrorMessage};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// The result type returned by [`FleetManager`] implementations.
///
/// [`FleetManager`]: crate::clients::FleetManager
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// The error type returned by [`FleetManager`] implementations.
///
/// [`FleetManager`]: crate::clients::FleetManager
#[derive(Debug)]
pub enum ClientError {
    /// Some data that was expected to be present was not found, e.g. an unknown agent id.
    MissingData(Option<ErrorMessage>),

    /// A call into the fleet manager failed.
    RequestFailed(Option<Box<dyn std::error::Error + Send + Sync + 'static>>),
}

impl ErrorEnum for ClientError {
    fn variant_name(&self) -> &'static str {
        match self {
            ClientError::MissingData(_) => "Missing data",
            ClientError::RequestFailed(_) => "Request failed",
        }
    }

    fn inner(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            ClientError::MissingData(s) => s
                .as_ref()
                .map(|some| some as &(dyn std::error::Error + Send + Sync + 'static)),
            ClientError::RequestFailed(e) => e.as_ref().map(|some| some.as_ref()),
        }
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner_as_source()
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.display(f)
    }
}
