/*!

The `provider` module defines the seam between the cloud client and the cloud provider's
management API. The wire protocol lives behind the [`ManagementApi`] trait so that the rest of the
crate can be driven by a mock in tests.

!*/

mod error;

pub use self::error::{IntoProviderError, ProviderError, ProviderResult, Resources};
use crate::connector::Credentials;
use cloud_model::{CloudImageTemplate, Password};
use serde::Serialize;

/// Everything the provider needs to launch one VM from an image template.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    /// The unique VM name. Agents report it back through the instance-name marker.
    pub name: String,
    pub source_name: String,
    pub service_name: String,
    pub deployment_name: String,
    pub vm_size: String,
    pub os_type: String,
    pub username: String,
    #[serde(skip)]
    pub password: Option<Password>,
}

impl LaunchRequest {
    pub fn from_template<S: Into<String>>(name: S, template: &CloudImageTemplate) -> Self {
        Self {
            name: name.into(),
            source_name: template.source_name().to_string(),
            service_name: template.service_name().to_string(),
            deployment_name: template.deployment_name().to_string(),
            vm_size: template.vm_size().to_string(),
            os_type: template.os_type().to_string(),
            username: template.username().to_string(),
            password: template.password().cloned(),
        }
    }
}

/// A VM as reported by the provider.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InstanceDescription {
    pub name: String,
    /// The provider's power state string, e.g. `ReadyRole` or `StoppedDeallocated`.
    pub state: String,
}

/// The operations that the cloud provider's management API offers us. Every call is remote, slow
/// and fallible. Implementations authenticate with the `credentials` they are given and must not
/// cache them across subscriptions.
///
/// Callers wrap each call in a timeout (see [`ApiConnector`]), so implementations do not need to.
///
/// [`ApiConnector`]: crate::ApiConnector
#[async_trait::async_trait]
pub trait ManagementApi: Send + Sync {
    /// List the VMs that exist in the subscription.
    async fn list_instances(
        &self,
        credentials: &Credentials,
    ) -> ProviderResult<Vec<InstanceDescription>>;

    /// Request a new VM. Returns once the provider has accepted the request.
    async fn create_instance(
        &self,
        credentials: &Credentials,
        request: &LaunchRequest,
    ) -> ProviderResult<InstanceDescription>;

    /// Delete a VM and its disks.
    async fn destroy_instance(&self, credentials: &Credentials, name: &str) -> ProviderResult<()>;
}
