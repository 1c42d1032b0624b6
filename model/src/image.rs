use crate::{Configuration, Password};
use serde::{Deserialize, Serialize};

/// A declarative description of a VM image that a cloud client can launch instances from. Image
/// templates arrive as a JSON array in the `images_data` profile parameter.
///
/// The password is never part of the JSON representation. It arrives through the separate
/// `secure:passwords_data` parameter and is attached with [`CloudImageTemplate::with_password`]
/// while the profile is parsed. After that a template does not change.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudImageTemplate {
    /// The name of the source image or VM. Unique within a profile and used as the key of the
    /// password map.
    source_name: String,

    /// Prefix for the names of the VMs launched from this template. Falls back to the source name.
    #[serde(default, deserialize_with = "crate::serde_utils::null_to_default")]
    vm_name_prefix: String,

    /// The cloud service that hosts launched VMs.
    #[serde(default, deserialize_with = "crate::serde_utils::null_to_default")]
    service_name: String,

    #[serde(default, deserialize_with = "crate::serde_utils::null_to_default")]
    deployment_name: String,

    /// Role size, e.g. `Small` or `Standard_D2`.
    #[serde(default, deserialize_with = "crate::serde_utils::null_to_default")]
    vm_size: String,

    /// `Linux` or `Windows`.
    #[serde(default, deserialize_with = "crate::serde_utils::null_to_default")]
    os_type: String,

    /// The administrator account that the password belongs to.
    #[serde(default, deserialize_with = "crate::serde_utils::null_to_default")]
    username: String,

    /// How instances are recycled between builds, e.g. `START_STOP` or `FRESH_CLONE`.
    #[serde(default, deserialize_with = "crate::serde_utils::null_to_default")]
    behaviour: String,

    /// A per-image ceiling on running instances, on top of the profile ceiling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_instances: Option<u32>,

    #[serde(skip)]
    password: Option<Password>,
}

impl Configuration for CloudImageTemplate {}

impl CloudImageTemplate {
    pub fn new<S: Into<String>>(source_name: S) -> Self {
        Self {
            source_name: source_name.into(),
            ..Self::default()
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn vm_name_prefix(&self) -> &str {
        if self.vm_name_prefix.trim().is_empty() {
            &self.source_name
        } else {
            &self.vm_name_prefix
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn deployment_name(&self) -> &str {
        &self.deployment_name
    }

    pub fn vm_size(&self) -> &str {
        &self.vm_size
    }

    pub fn os_type(&self) -> &str {
        &self.os_type
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn behaviour(&self) -> &str {
        &self.behaviour
    }

    pub fn max_instances(&self) -> Option<u32> {
        self.max_instances
    }

    pub fn password(&self) -> Option<&Password> {
        self.password.as_ref()
    }

    /// Attach the launch password. Used while a profile's parameters are parsed.
    pub fn with_password(mut self, password: Password) -> Self {
        self.password = Some(password);
        self
    }

    pub fn with_max_instances(mut self, max_instances: u32) -> Self {
        self.max_instances = Some(max_instances);
        self
    }
}
