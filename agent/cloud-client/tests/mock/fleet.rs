use cloud_client::clients::{ClientError, ClientResult, FleetManager};
use cloud_client::CloudClient;
use cloud_model::{AgentId, CloudProfile};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Holds profiles in listing order and the live client of each.
#[derive(Default)]
pub(crate) struct MockFleet {
    profiles: Mutex<Vec<CloudProfile>>,
    clients: Mutex<HashMap<String, Arc<CloudClient>>>,
    pub(crate) links: Mutex<Vec<(AgentId, String, String)>>,
    pub(crate) fail_link: AtomicBool,
}

impl MockFleet {
    pub(crate) fn add(&self, profile: CloudProfile, client: Arc<CloudClient>) {
        self.clients
            .lock()
            .unwrap()
            .insert(profile.profile_id.clone(), client);
        self.profiles.lock().unwrap().push(profile);
    }

    /// A profile without a live client.
    pub(crate) fn add_profile(&self, profile: CloudProfile) {
        self.profiles.lock().unwrap().push(profile);
    }

    pub(crate) fn links(&self) -> Vec<(AgentId, String, String)> {
        self.links.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FleetManager for MockFleet {
    async fn list_profiles(&self) -> ClientResult<Vec<CloudProfile>> {
        Ok(self.profiles.lock().unwrap().clone())
    }

    async fn client_if_exists(&self, profile_id: &str) -> Option<Arc<CloudClient>> {
        self.clients.lock().unwrap().get(profile_id).cloned()
    }

    async fn link_agent(
        &self,
        agent_id: AgentId,
        profile_id: &str,
        instance_name: &str,
    ) -> ClientResult<()> {
        if self.fail_link.load(Ordering::SeqCst) {
            return Err(ClientError::RequestFailed(Some(
                format!("agent {} is gone", agent_id).into(),
            )));
        }
        self.links.lock().unwrap().push((
            agent_id,
            profile_id.to_string(),
            instance_name.to_string(),
        ));
        Ok(())
    }
}
