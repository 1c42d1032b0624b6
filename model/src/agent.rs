use crate::constants::{AGENT_INSTANCE_NAME, AGENT_PROFILE_ID};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The fleet manager's numeric identifier of a registered agent.
pub type AgentId = u64;

/// What the fleet manager knows about a connected build agent. This is consumed, not owned: the
/// fleet manager creates these and passes them to us with each lifecycle event.
#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AgentDescription {
    pub id: AgentId,
    pub name: String,
    /// Whether the agent is authorized right now.
    pub authorized: bool,
    /// Free-form configuration parameters reported by the agent.
    pub configuration_parameters: BTreeMap<String, String>,
}

impl AgentDescription {
    /// The name of the cloud instance the agent believes it runs on, if it reported one.
    pub fn instance_name(&self) -> Option<&str> {
        self.configuration_parameters
            .get(AGENT_INSTANCE_NAME)
            .map(String::as_str)
    }

    /// The profile the agent was explicitly started for, if any.
    pub fn profile_id(&self) -> Option<&str> {
        self.configuration_parameters
            .get(AGENT_PROFILE_ID)
            .map(String::as_str)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn markers() {
        let mut agent = AgentDescription {
            id: 7,
            name: "agent-7".into(),
            ..Default::default()
        };
        assert_eq!(agent.instance_name(), None);
        agent
            .configuration_parameters
            .insert(AGENT_INSTANCE_NAME.into(), "webA-1f2e3d4c".into());
        agent
            .configuration_parameters
            .insert(AGENT_PROFILE_ID.into(), "arm-1".into());
        assert_eq!(agent.instance_name(), Some("webA-1f2e3d4c"));
        assert_eq!(agent.profile_id(), Some("arm-1"));
    }
}
