/*!

Agent-to-instance matching. When an agent is authorized for the first time and reports the name of
the VM it runs on, we look for the client that launched that VM and link the two.

!*/

use crate::clients::FleetManager;
use crate::events::AgentListener;
use crate::index::InstanceIndex;
use cloud_model::{AgentDescription, ProfileId};
use log::{debug, info, trace, warn};
use std::sync::Arc;

/// The client/instance pair an agent was matched to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AgentMatch {
    pub profile_id: ProfileId,
    pub instance_name: String,
}

/// Only agents that were just authorized, report an instance name and were not started for an
/// explicit profile are matched. Agents that were already authorized are never scanned again.
pub fn should_attempt_match(agent: &AgentDescription, was_authorized: bool) -> bool {
    agent.authorized
        && !was_authorized
        && agent.instance_name().is_some()
        && agent.profile_id().is_none()
}

/// Matches newly authorized agents to the instances of the fleet manager's live clients.
pub struct AgentMatcher {
    fleet: Arc<dyn FleetManager>,
    index: Arc<InstanceIndex>,
}

impl AgentMatcher {
    pub fn new(fleet: Arc<dyn FleetManager>, index: Arc<InstanceIndex>) -> Self {
        Self { fleet, index }
    }

    /// Find the instance `agent` runs on and link the two. When more than one profile tracks an
    /// instance of that name, the first one in the fleet manager's profile order wins.
    ///
    /// The fleet manager records the agent first. The instance is only linked once that
    /// succeeded, so both sides agree. Reads in-memory state only; the provider is never called.
    pub async fn match_agent(&self, agent: &AgentDescription) -> Option<AgentMatch> {
        let instance_name = agent.instance_name()?;
        let mut candidates = self.index.lookup(instance_name);
        if candidates.is_empty() {
            trace!(
                "No client tracks instance '{}' of agent {}",
                instance_name,
                agent.id
            );
            return None;
        }
        if candidates.len() > 1 {
            candidates = self.in_profile_order(candidates).await;
            warn!(
                "Instance name '{}' of agent {} is tracked by profiles {:?}, using the first",
                instance_name, agent.id, candidates
            );
        }

        for profile_id in candidates {
            let client = match self.fleet.client_if_exists(&profile_id).await {
                Some(some) => some,
                None => continue,
            };
            if client.is_disposed() || client.find_instance_by_agent(agent).is_none() {
                continue;
            }
            if let Err(e) = self
                .fleet
                .link_agent(agent.id, &profile_id, instance_name)
                .await
            {
                warn!(
                    "Unable to record agent {} on instance '{}': {}",
                    agent.id, instance_name, e
                );
                return None;
            }
            return match client.link_agent(instance_name, agent.id) {
                Ok(()) => {
                    info!(
                        "Agent {} runs on instance '{}' of profile '{}'",
                        agent.id, instance_name, profile_id
                    );
                    Some(AgentMatch {
                        profile_id,
                        instance_name: instance_name.to_string(),
                    })
                }
                // Terminated while the fleet manager was being updated.
                Err(e) => {
                    debug!("{}", e);
                    None
                }
            };
        }
        None
    }

    /// Sort candidate profiles by the fleet manager's listing order. If the listing fails, the
    /// index order is kept.
    async fn in_profile_order(&self, candidates: Vec<ProfileId>) -> Vec<ProfileId> {
        match self.fleet.list_profiles().await {
            Ok(profiles) => {
                let mut ordered: Vec<ProfileId> = profiles
                    .into_iter()
                    .map(|p| p.profile_id)
                    .filter(|id| candidates.contains(id))
                    .collect();
                ordered.dedup();
                ordered
            }
            Err(e) => {
                warn!("Unable to list profiles: {}", e);
                candidates
            }
        }
    }
}

#[async_trait::async_trait]
impl AgentListener for AgentMatcher {
    async fn agent_authorized(
        &self,
        agent: &AgentDescription,
        _was_enabled: bool,
        was_authorized: bool,
    ) {
        if should_attempt_match(agent, was_authorized) {
            self.match_agent(agent).await;
        }
    }
}

impl std::fmt::Debug for AgentMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentMatcher")
            .field("indexed_instances", &self.index.len())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use cloud_model::constants::{AGENT_INSTANCE_NAME, AGENT_PROFILE_ID};
    use maplit::btreemap;
    use std::collections::BTreeMap;

    fn agent(authorized: bool, params: BTreeMap<String, String>) -> AgentDescription {
        AgentDescription {
            id: 1,
            name: "agent-1".into(),
            authorized,
            configuration_parameters: params,
        }
    }

    #[test]
    fn match_conditions() {
        let marked = btreemap! { AGENT_INSTANCE_NAME.to_string() => "webA-0a1b2c3d".to_string() };
        assert!(should_attempt_match(&agent(true, marked.clone()), false));
        assert!(!should_attempt_match(&agent(true, marked.clone()), true));
        assert!(!should_attempt_match(&agent(false, marked), false));
        assert!(!should_attempt_match(&agent(true, btreemap! {}), false));

        let explicit = btreemap! {
            AGENT_INSTANCE_NAME.to_string() => "webA-0a1b2c3d".to_string(),
            AGENT_PROFILE_ID.to_string() => "p1".to_string(),
        };
        assert!(!should_attempt_match(&agent(true, explicit), false));
    }
}
