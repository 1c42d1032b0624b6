use crate::ClientParameters;
use serde::{Deserialize, Serialize};

/// The fleet manager's identifier of a cloud profile.
pub type ProfileId = String;

/// An operator-configured unit of cloud provisioning policy. The image templates of a profile are
/// not stored separately: they are parsed from its parameters when a client is created.
#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CloudProfile {
    pub profile_id: ProfileId,
    pub name: String,
    pub parameters: ClientParameters,
}

impl CloudProfile {
    pub fn state(&self) -> CloudState {
        CloudState {
            profile_id: self.profile_id.clone(),
        }
    }
}

/// Identifies the profile a client is being built for.
#[derive(Debug, Default, Eq, PartialEq, Clone)]
pub struct CloudState {
    pub profile_id: ProfileId,
}

impl CloudState {
    pub fn new<S: Into<String>>(profile_id: S) -> Self {
        Self {
            profile_id: profile_id.into(),
        }
    }
}
