use std::error::Error;
use std::fmt::{Display, Formatter};

type BoxedError = Box<dyn Error + Send + Sync + 'static>;

/// What a failed [`ManagementApi`] call may have left behind at the provider. The cloud client
/// reads this to decide whether the instance of a failed call still has to be destroyed.
///
/// [`ManagementApi`]: crate::provider::ManagementApi
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Resources {
    /// Nothing was left behind.
    Clear,

    /// A VM may exist and must be destroyed later.
    Remaining,

    /// The call did not complete, e.g. it timed out, so a VM may or may not exist.
    Unknown,
}

impl Resources {
    /// False only when the provider guarantees that no VM was left behind.
    pub fn may_remain(self) -> bool {
        self != Resources::Clear
    }
}

impl Display for Resources {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Resources::Clear => "no VM left behind",
            Resources::Remaining => "a VM may remain",
            Resources::Unknown => "unknown whether a VM remains",
        })
    }
}

/// The error returned by [`ManagementApi`] implementations and by the [`ApiConnector`] calls that
/// wrap them.
///
/// [`ManagementApi`]: crate::provider::ManagementApi
/// [`ApiConnector`]: crate::ApiConnector
#[derive(Debug)]
pub struct ProviderError {
    resources: Resources,
    message: String,
    source: Option<BoxedError>,
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

impl ProviderError {
    pub fn new<S: Into<String>>(resources: Resources, message: S) -> Self {
        Self {
            resources,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<E: Into<BoxedError>>(mut self, source: E) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn resources(&self) -> Resources {
        self.resources
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.resources)?;
        if let Some(source) = &self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl Error for ProviderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|some| some.as_ref() as &(dyn Error + 'static))
    }
}

/// Turns the failure of a provider SDK call into a [`ProviderError`].
pub trait IntoProviderError<T> {
    fn context<S: Into<String>>(self, resources: Resources, message: S) -> ProviderResult<T>;
}

impl<T, E> IntoProviderError<T> for std::result::Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn context<S: Into<String>>(self, resources: Resources, message: S) -> ProviderResult<T> {
        self.map_err(|e| ProviderError::new(resources, message).with_source(e))
    }
}
