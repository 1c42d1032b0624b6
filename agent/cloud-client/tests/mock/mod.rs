/*!

Mock implementations of the [`ManagementApi`] and the [`FleetManager`] so that the engine can be
tested without a cloud provider or a build server, plus helpers to build profiles and agents.

!*/

#![allow(dead_code)]

pub(crate) mod api;
pub(crate) mod fleet;

use cloud_client::{ClientFactory, FactorySettings};
use cloud_model::constants::{
    AGENT_INSTANCE_NAME, AGENT_PROFILE_ID, PARAM_IMAGES_DATA, PARAM_MANAGEMENT_CERTIFICATE,
    PARAM_MAX_INSTANCES_COUNT, PARAM_PASSWORDS_DATA, PARAM_SUBSCRIPTION_ID,
};
use cloud_model::{AgentDescription, ClientParameters, CloudProfile};
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) use api::MockApi;
pub(crate) use fleet::MockFleet;

pub(crate) const SUBSCRIPTION: &str = "3f2504e0-4f89-11d3-9a0c-0305e82c3301";

pub(crate) const IMAGES: &str = r#"[
    {"sourceName":"webA","vmNamePrefix":"web","vmSize":"Small","username":"builder"},
    {"sourceName":"webB","maxInstances":1}
]"#;

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A well formed DER SEQUENCE, base64 encoded the way publish-settings files carry it.
pub(crate) fn certificate() -> String {
    base64::encode([0x30, 0x06, 0x02, 0x01, 0x05, 0x02, 0x01, 0x07])
}

pub(crate) fn params(max_instances: &str) -> ClientParameters {
    let mut params = ClientParameters::new();
    params.insert(PARAM_SUBSCRIPTION_ID, SUBSCRIPTION);
    params.insert(PARAM_MANAGEMENT_CERTIFICATE, certificate());
    params.insert(PARAM_MAX_INSTANCES_COUNT, max_instances);
    params.insert(PARAM_IMAGES_DATA, IMAGES);
    params.insert(PARAM_PASSWORDS_DATA, r#"{"webA":"secret1"}"#);
    params
}

pub(crate) fn profile(profile_id: &str, params: ClientParameters) -> CloudProfile {
    CloudProfile {
        profile_id: profile_id.to_string(),
        name: format!("{} profile", profile_id),
        parameters: params,
    }
}

/// An authorized agent that reports `instance_name`.
pub(crate) fn agent(id: u64, instance_name: &str) -> AgentDescription {
    let mut agent = AgentDescription {
        id,
        name: format!("agent-{}", id),
        authorized: true,
        ..Default::default()
    };
    agent
        .configuration_parameters
        .insert(AGENT_INSTANCE_NAME.to_string(), instance_name.to_string());
    agent
}

pub(crate) fn with_profile_marker(
    mut agent: AgentDescription,
    profile_id: &str,
) -> AgentDescription {
    agent
        .configuration_parameters
        .insert(AGENT_PROFILE_ID.to_string(), profile_id.to_string());
    agent
}

/// A factory whose state directory lives in a fresh temporary directory.
pub(crate) fn factory(api: Arc<MockApi>, fleet: Arc<MockFleet>) -> (TempDir, ClientFactory) {
    init_logger();
    let dir = TempDir::new().unwrap();
    let factory = ClientFactory::new(FactorySettings::new(dir.path()), api, fleet).unwrap();
    (dir, factory)
}
