/*!

The `factory` module contains [`ClientFactory`], the entry point the build server uses to create
cloud clients for profiles and to feed agent lifecycle events into instance matching.

!*/

use crate::bootstrap::FactorySettings;
use crate::client::CloudClient;
use crate::clients::FleetManager;
use crate::connector::ApiConnector;
use crate::credential_bundle::{self, CredentialResult};
use crate::error::FactoryResult;
use crate::events::{EventSource, ListenerId};
use crate::index::InstanceIndex;
use crate::matching::AgentMatcher;
use crate::provider::ManagementApi;
use crate::validation::{self, ProfilePropertiesProcessor, PropertiesProcessor};
use cloud_model::constants::{
    CLOUD_CODE, DISPLAY_NAME, PARAM_MANAGEMENT_CERTIFICATE, PARAM_MAX_INSTANCES_COUNT,
    PARAM_SUBSCRIPTION_ID,
};
use cloud_model::{
    AgentDescription, ClientParameters, CloudImageTemplate, CloudProfile, CloudState, ErrorKind,
    TypedCloudErrorInfo,
};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// The name our listener is registered under.
const LISTENER_NAME: &str = "azure-agent-matcher";

/// Builds cloud clients from profile parameters and reconciles authorized agents with the
/// instances of those clients.
pub struct ClientFactory {
    settings: FactorySettings,
    state_directory: PathBuf,
    api: Arc<dyn ManagementApi>,
    fleet: Arc<dyn FleetManager>,
    index: Arc<InstanceIndex>,
    subscription: Mutex<Option<(Arc<dyn EventSource>, ListenerId)>>,
}

impl ClientFactory {
    /// Create the factory and its state directory. An existing directory is reused.
    pub fn new(
        settings: FactorySettings,
        api: Arc<dyn ManagementApi>,
        fleet: Arc<dyn FleetManager>,
    ) -> FactoryResult<Self> {
        let state_directory = settings.ensure_state_directory()?;
        Ok(Self {
            settings,
            state_directory,
            api,
            fleet,
            index: Arc::new(InstanceIndex::new()),
            subscription: Mutex::new(None),
        })
    }

    pub fn cloud_code(&self) -> &'static str {
        CLOUD_CODE
    }

    pub fn display_name(&self) -> &'static str {
        DISPLAY_NAME
    }

    pub fn edit_profile_url(&self) -> Option<&str> {
        self.settings.edit_profile_url.as_deref()
    }

    /// Profiles start out with no parameters.
    pub fn initial_parameter_values(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    pub fn properties_processor(&self) -> Box<dyn PropertiesProcessor> {
        Box::new(ProfilePropertiesProcessor)
    }

    pub fn state_directory(&self) -> &Path {
        &self.state_directory
    }

    pub fn index(&self) -> &Arc<InstanceIndex> {
        &self.index
    }

    pub fn check_client_params(&self, params: &ClientParameters) -> Vec<TypedCloudErrorInfo> {
        validation::check_client_params(params)
    }

    /// Parse the image templates of a profile, with passwords attached.
    pub fn parse_image_data(
        &self,
        params: &ClientParameters,
    ) -> CredentialResult<Vec<CloudImageTemplate>> {
        credential_bundle::parse_profile_images(params)
    }

    /// Build the client of a profile from already parsed templates. If the connector cannot be
    /// built, the client is degraded: it has no templates and its errors explain why.
    pub fn create_new_client(
        &self,
        state: &CloudState,
        images: Vec<CloudImageTemplate>,
        params: &ClientParameters,
    ) -> Arc<CloudClient> {
        let max_instance_count = max_instance_count(params);
        let (images, connector, errors) = match self.connect(params) {
            Ok(connector) => (images, Some(connector), Vec::new()),
            Err(errors) => {
                warn!(
                    "Profile '{}' cannot connect to the provider, creating a degraded client",
                    state.profile_id
                );
                (Vec::new(), None, errors)
            }
        };
        info!(
            "Creating client of profile '{}' with {} image(s) and at most {} instance(s)",
            state.profile_id,
            images.len(),
            max_instance_count
        );
        let client = self.build(state, params, images, connector, max_instance_count);
        if !errors.is_empty() {
            client.update_errors(errors);
        }
        Arc::new(client)
    }

    /// Build a client without templates that carries `errors`. Used when a profile is known to
    /// be broken. The client still connects if it can, so that instances adopted from an earlier
    /// run stay visible and can be terminated. A connection failure is only added to `errors` if
    /// they do not already report a configuration problem.
    pub fn create_degraded_client(
        &self,
        state: &CloudState,
        params: &ClientParameters,
        mut errors: Vec<TypedCloudErrorInfo>,
    ) -> Arc<CloudClient> {
        let max_instance_count = max_instance_count(params);
        let connector = match self.connect(params) {
            Ok(connector) => Some(connector),
            Err(connect_errors) => {
                if !errors.iter().any(|e| e.kind == ErrorKind::Configuration) {
                    errors.extend(connect_errors);
                }
                None
            }
        };
        debug!(
            "Creating degraded client of profile '{}' with {} error(s)",
            state.profile_id,
            errors.len()
        );
        let client = self.build(state, params, Vec::new(), connector, max_instance_count);
        client.update_errors(errors);
        Arc::new(client)
    }

    /// What the build server does with a profile: check its parameters, parse its images, and
    /// build a full client or a degraded one.
    pub fn create_client_for_profile(&self, profile: &CloudProfile) -> Arc<CloudClient> {
        let state = profile.state();
        let params = &profile.parameters;
        let errors = self.check_client_params(params);
        if !errors.is_empty() {
            return self.create_degraded_client(&state, params, errors);
        }
        match self.parse_image_data(params) {
            Ok(images) => self.create_new_client(&state, images, params),
            Err(e) => {
                warn!(
                    "Unable to parse images of profile '{}': {}",
                    profile.profile_id, e
                );
                let error = TypedCloudErrorInfo::parse("Unable to parse image data")
                    .with_details(e.to_string());
                self.create_degraded_client(&state, params, vec![error])
            }
        }
    }

    /// True if the agent reports the cloud instance it runs on.
    pub fn can_be_agent_of_type(&self, agent: &AgentDescription) -> bool {
        agent.instance_name().is_some()
    }

    /// Subscribe agent matching to `source`. Any earlier subscription is dropped first.
    pub fn subscribe(&self, source: Arc<dyn EventSource>) -> ListenerId {
        self.shutdown();
        let matcher = AgentMatcher::new(Arc::clone(&self.fleet), Arc::clone(&self.index));
        let id = source.subscribe(LISTENER_NAME, Arc::new(matcher));
        *self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some((source, id));
        info!("Agent matching subscribed as listener {}", id);
        id
    }

    /// Unsubscribe agent matching. Does nothing if it is not subscribed.
    pub fn shutdown(&self) {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some((source, id)) = subscription {
            if source.unsubscribe(id) {
                info!("Agent matching unsubscribed");
            }
        }
    }

    /// Sync every live client of the fleet with the provider. Clients record their own failures.
    pub async fn sync_clients(&self) -> FactoryResult<usize> {
        let profiles = self.fleet.list_profiles().await?;
        let mut synced = 0;
        for profile in profiles {
            if let Some(client) = self.fleet.client_if_exists(&profile.profile_id).await {
                client.sync_with_provider().await;
                synced += 1;
            }
        }
        debug!("Synced {} client(s)", synced);
        Ok(synced)
    }

    fn connect(
        &self,
        params: &ClientParameters,
    ) -> Result<ApiConnector, Vec<TypedCloudErrorInfo>> {
        ApiConnector::connect(
            params.get(PARAM_SUBSCRIPTION_ID).unwrap_or_default(),
            params.get(PARAM_MANAGEMENT_CERTIFICATE).unwrap_or_default(),
            Arc::clone(&self.api),
        )
        .map(|connector| connector.with_timeout(self.settings.api_timeout))
        .map_err(|e| vec![validation::configuration_error(&e)])
    }

    fn build(
        &self,
        state: &CloudState,
        params: &ClientParameters,
        images: Vec<CloudImageTemplate>,
        connector: Option<ApiConnector>,
        max_instance_count: u32,
    ) -> CloudClient {
        CloudClient::new(
            &state.profile_id,
            params.clone(),
            images,
            connector,
            max_instance_count,
            &self.state_directory,
            Arc::clone(&self.index),
        )
    }
}

impl Drop for ClientFactory {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientFactory")
            .field("settings", &self.settings)
            .field("index", &self.index)
            .finish()
    }
}

/// The profile's instance ceiling. Absent or unparsable values mean no instances may start.
fn max_instance_count(params: &ClientParameters) -> u32 {
    match params.get_non_empty(PARAM_MAX_INSTANCES_COUNT) {
        None => 0,
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!(
                "Ignoring invalid {} '{}', no instances will be started",
                PARAM_MAX_INSTANCES_COUNT, value
            );
            0
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use maplit::btreemap;

    fn params(max: &str) -> ClientParameters {
        ClientParameters::from(btreemap! {
            PARAM_MAX_INSTANCES_COUNT.to_string() => max.to_string(),
        })
    }

    #[test]
    fn max_instance_count_defaults_to_zero() {
        assert_eq!(max_instance_count(&ClientParameters::new()), 0);
        assert_eq!(max_instance_count(&params("")), 0);
        assert_eq!(max_instance_count(&params("abc")), 0);
        assert_eq!(max_instance_count(&params("-3")), 0);
        assert_eq!(max_instance_count(&params(" 7 ")), 7);
    }
}
