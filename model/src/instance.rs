use crate::Configuration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_plain::{derive_display_from_serialize, derive_fromstr_from_deserialize};

/// The lifecycle state of a cloud instance.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone, Copy, Hash)]
#[serde(rename_all = "camelCase")]
pub enum InstanceStatus {
    /// Requested from the provider but not yet confirmed.
    Scheduled,
    Starting,
    Running,
    Stopping,
    Stopped,
    /// The last operation on the instance failed.
    Error,
    Unknown,
}

impl Default for InstanceStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

impl InstanceStatus {
    /// Whether the instance counts against the instance ceilings.
    pub fn is_live(&self) -> bool {
        !matches!(self, InstanceStatus::Stopped | InstanceStatus::Error)
    }

    /// Maps a provider power state string onto an `InstanceStatus`. The provider reports states
    /// like `ReadyRole`, `StartingVM`, `StoppedDeallocated`, so we match on fragments.
    pub fn from_provider_state(state: &str) -> Self {
        let state = state.to_ascii_lowercase();
        if state.contains("ready") || state.contains("running") {
            InstanceStatus::Running
        } else if state.contains("starting") || state.contains("provisioning") {
            InstanceStatus::Starting
        } else if state.contains("stopping") || state.contains("deleting") {
            InstanceStatus::Stopping
        } else if state.contains("stopped") || state.contains("deallocated") {
            InstanceStatus::Stopped
        } else if state.contains("fail") || state.contains("error") {
            InstanceStatus::Error
        } else {
            InstanceStatus::Unknown
        }
    }
}

derive_display_from_serialize!(InstanceStatus);
derive_fromstr_from_deserialize!(InstanceStatus);

/// The durable record of an instance that a cloud client writes to its state directory, so that a
/// restarted server can adopt the instances it launched before.
#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRecord {
    pub name: String,
    pub source_name: String,
    pub status: InstanceStatus,
    pub started_at: Option<DateTime<Utc>>,
    /// Whether a VM may exist at the provider. Records without the flag count as unconfirmed.
    #[serde(default)]
    pub confirmed: bool,
}

impl Configuration for InstanceRecord {}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn provider_states() {
        assert_eq!(
            InstanceStatus::from_provider_state("ReadyRole"),
            InstanceStatus::Running
        );
        assert_eq!(
            InstanceStatus::from_provider_state("StoppedDeallocated"),
            InstanceStatus::Stopped
        );
        assert_eq!(
            InstanceStatus::from_provider_state("Provisioning"),
            InstanceStatus::Starting
        );
        assert_eq!(
            InstanceStatus::from_provider_state("RoleStateUnknown"),
            InstanceStatus::Unknown
        );
    }

    #[test]
    fn status_strings() {
        assert_eq!(InstanceStatus::Running.to_string(), "running");
        assert_eq!(
            InstanceStatus::from_str("stopping").unwrap(),
            InstanceStatus::Stopping
        );
        assert!(!InstanceStatus::Error.is_live());
        assert!(InstanceStatus::Scheduled.is_live());
    }
}
