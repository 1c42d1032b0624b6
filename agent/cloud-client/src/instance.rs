use chrono::{DateTime, Utc};
use cloud_model::{
    AgentDescription, AgentId, InstanceRecord, InstanceStatus, ProfileId, TypedCloudErrorInfo,
};

/// A VM that a cloud client launched or adopted. The VM name is its identity: agents that run on
/// the VM report the same name through the instance-name marker.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CloudInstance {
    name: String,
    source_name: String,
    profile_id: ProfileId,
    status: InstanceStatus,
    started_at: Option<DateTime<Utc>>,
    error: Option<TypedCloudErrorInfo>,
    agent_id: Option<AgentId>,
    /// Whether a VM may exist at the provider: it was acknowledged, or a failed call could not rule
    /// it out. Only confirmed instances are destroyed through the provider, and only they are
    /// dropped when the provider stops reporting them.
    confirmed: bool,
}

impl CloudInstance {
    pub(crate) fn scheduled<S1, S2>(name: S1, source_name: S2, profile_id: &str) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            name: name.into(),
            source_name: source_name.into(),
            profile_id: profile_id.to_string(),
            status: InstanceStatus::Scheduled,
            started_at: Some(Utc::now()),
            error: None,
            agent_id: None,
            confirmed: false,
        }
    }

    /// Rebuild an instance from its persisted record. The record keeps whether the VM was
    /// confirmed when it was written; an unconfirmed record is confirmed by the next sync that
    /// finds the VM.
    pub(crate) fn from_record(record: InstanceRecord, profile_id: &str) -> Self {
        Self {
            name: record.name,
            source_name: record.source_name,
            profile_id: profile_id.to_string(),
            status: record.status,
            started_at: record.started_at,
            error: None,
            agent_id: None,
            confirmed: record.confirmed,
        }
    }

    pub fn record(&self) -> InstanceRecord {
        InstanceRecord {
            name: self.name.clone(),
            source_name: self.source_name.clone(),
            status: self.status,
            started_at: self.started_at,
            confirmed: self.confirmed,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn status(&self) -> InstanceStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn error(&self) -> Option<&TypedCloudErrorInfo> {
        self.error.as_ref()
    }

    pub fn agent_id(&self) -> Option<AgentId> {
        self.agent_id
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// True if `agent` reports that it runs on this instance.
    pub fn contains_agent(&self, agent: &AgentDescription) -> bool {
        agent.instance_name() == Some(self.name.as_str())
    }

    pub(crate) fn set_status(&mut self, status: InstanceStatus) {
        self.status = status;
        if status != InstanceStatus::Error {
            self.error = None;
        }
    }

    pub(crate) fn confirm(&mut self, status: InstanceStatus) {
        self.confirmed = true;
        self.set_status(status);
    }

    /// Record a failed create. Unless the provider ruled it out, the VM may exist and stays
    /// destroyable.
    pub(crate) fn fail_create(&mut self, error: TypedCloudErrorInfo, may_remain: bool) {
        self.confirmed |= may_remain;
        self.fail(error);
    }

    pub(crate) fn fail(&mut self, error: TypedCloudErrorInfo) {
        self.status = InstanceStatus::Error;
        self.error = Some(error);
    }

    pub(crate) fn link_agent(&mut self, agent_id: AgentId) {
        self.agent_id = Some(agent_id);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use cloud_model::constants::AGENT_INSTANCE_NAME;

    #[test]
    fn record_round_trip_keeps_identity() {
        let mut instance = CloudInstance::scheduled("webA-0a1b2c3d", "webA", "p1");
        instance.confirm(InstanceStatus::Running);
        let adopted = CloudInstance::from_record(instance.record(), "p1");
        assert_eq!(adopted.name(), "webA-0a1b2c3d");
        assert_eq!(adopted.status(), InstanceStatus::Running);
        assert!(adopted.is_confirmed());
        assert_eq!(adopted.agent_id(), None);
    }

    #[test]
    fn unconfirmed_record_stays_unconfirmed() {
        let mut instance = CloudInstance::scheduled("webA-0a1b2c3d", "webA", "p1");
        instance.fail_create(TypedCloudErrorInfo::instance("quota exceeded"), false);
        let record = instance.record();
        assert!(!record.confirmed);
        let adopted = CloudInstance::from_record(record, "p1");
        assert_eq!(adopted.status(), InstanceStatus::Error);
        assert!(!adopted.is_confirmed());

        let mut timed_out = CloudInstance::scheduled("webA-4e5f6a7b", "webA", "p1");
        timed_out.fail_create(TypedCloudErrorInfo::instance("timed out"), true);
        assert!(CloudInstance::from_record(timed_out.record(), "p1").is_confirmed());
    }

    #[test]
    fn failure_is_cleared_by_new_status() {
        let mut instance = CloudInstance::scheduled("webA-0a1b2c3d", "webA", "p1");
        instance.fail(TypedCloudErrorInfo::instance("quota exceeded"));
        assert_eq!(instance.status(), InstanceStatus::Error);
        assert!(instance.error().is_some());
        instance.confirm(InstanceStatus::Starting);
        assert!(instance.error().is_none());
    }

    #[test]
    fn contains_agent() {
        let instance = CloudInstance::scheduled("webA-0a1b2c3d", "webA", "p1");
        let mut agent = AgentDescription::default();
        assert!(!instance.contains_agent(&agent));
        agent
            .configuration_parameters
            .insert(AGENT_INSTANCE_NAME.into(), "webA-0a1b2c3d".into());
        assert!(instance.contains_agent(&agent));
    }
}
