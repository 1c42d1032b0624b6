use super::error::ClientResult;
use crate::CloudClient;
use cloud_model::{AgentId, CloudProfile};
use std::sync::Arc;

/// `FleetManager` is the build server's side of the engine. It owns the profile registry, the
/// live cloud clients of those profiles and the agent registry. The engine never owns any of
/// these: it reads them and asks for narrow updates.
///
/// This is provided as a trait so that mock implementations can be injected for testing purposes.
///
#[async_trait::async_trait]
pub trait FleetManager: Send + Sync {
    /// All known profiles, in the fleet manager's listing order. Agent matching walks candidates
    /// in this order.
    async fn list_profiles(&self) -> ClientResult<Vec<CloudProfile>>;

    /// The live client of a profile, if one has been created.
    async fn client_if_exists(&self, profile_id: &str) -> Option<Arc<CloudClient>>;

    /// Record on the agent's side that `agent_id` runs on `instance_name` of `profile_id`.
    async fn link_agent(
        &self,
        agent_id: AgentId,
        profile_id: &str,
        instance_name: &str,
    ) -> ClientResult<()>;
}
