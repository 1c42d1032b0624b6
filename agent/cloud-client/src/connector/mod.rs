/*!

The `connector` module validates a profile's credentials and wraps the [`ManagementApi`] calls that
use them in a bounded timeout.

!*/

mod credentials;
mod error;

pub use self::credentials::{Certificate, Credentials, SubscriptionId};
pub use self::error::{CertificateError, ConnectorError, ConnectorResult};
use crate::provider::{
    InstanceDescription, IntoProviderError, LaunchRequest, ManagementApi, ProviderResult,
    Resources,
};
use log::{debug, trace};
use std::fmt::Formatter;
use std::sync::Arc;
use std::time::Duration;

/// How long a single management API call may take before we give up on it.
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(60);

/// An authenticated handle to the provider's management API for one subscription. The connector
/// holds nothing beyond the validated credentials, the API it talks through and the call timeout.
#[derive(Clone)]
pub struct ApiConnector {
    credentials: Credentials,
    api: Arc<dyn ManagementApi>,
    timeout: Duration,
}

impl ApiConnector {
    /// Validate `subscription_id` and `certificate` and create a connector that uses `api`.
    pub fn connect(
        subscription_id: &str,
        certificate: &str,
        api: Arc<dyn ManagementApi>,
    ) -> ConnectorResult<Self> {
        let credentials = Credentials::new(subscription_id, certificate)?;
        debug!(
            "Created API connector for subscription '{}'",
            credentials.subscription_id()
        );
        Ok(Self {
            credentials,
            api,
            timeout: DEFAULT_API_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn subscription_id(&self) -> &SubscriptionId {
        self.credentials.subscription_id()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn list_instances(&self) -> ProviderResult<Vec<InstanceDescription>> {
        trace!("Listing instances of subscription '{}'", self.subscription_id());
        tokio::time::timeout(self.timeout, self.api.list_instances(&self.credentials))
            .await
            .context(Resources::Clear, "Listing instances timed out")?
    }

    pub async fn create_instance(
        &self,
        request: &LaunchRequest,
    ) -> ProviderResult<InstanceDescription> {
        trace!("Requesting instance '{}'", request.name);
        tokio::time::timeout(
            self.timeout,
            self.api.create_instance(&self.credentials, request),
        )
        .await
        .context(
            Resources::Unknown,
            format!("Creating instance '{}' timed out", request.name),
        )?
    }

    pub async fn destroy_instance(&self, name: &str) -> ProviderResult<()> {
        trace!("Destroying instance '{}'", name);
        tokio::time::timeout(self.timeout, self.api.destroy_instance(&self.credentials, name))
            .await
            .context(
                Resources::Remaining,
                format!("Destroying instance '{}' timed out", name),
            )?
    }
}

impl std::fmt::Debug for ApiConnector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConnector")
            .field("credentials", &self.credentials)
            .field("timeout", &self.timeout)
            .finish()
    }
}
