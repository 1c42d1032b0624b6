/// Helper macro to avoid retyping the cloud code when building agent parameter names from it.
/// When given no parameters, this returns the cloud code. When given a string literal parameter it
/// adds `.parameter` to the end.
macro_rules! azure {
    () => {
        "azure"
    };
    ($s:literal) => {
        concat!(azure!(), ".", $s)
    };
}

// System identifiers
pub const CLOUD_CODE: &str = azure!();
pub const DISPLAY_NAME: &str = "Azure";

// Profile parameter keys
pub const PARAM_MANAGEMENT_CERTIFICATE: &str = "managementCertificate";
pub const PARAM_SUBSCRIPTION_ID: &str = "subscriptionId";
pub const PARAM_MAX_INSTANCES_COUNT: &str = "profileInstancesCount";
pub const PARAM_IMAGES_DATA: &str = "images_data";
pub const PARAM_PASSWORDS_DATA: &str = "secure:passwords_data";

/// Parameters whose key starts with this prefix hold secrets and are never logged or displayed.
pub const SECURE_PREFIX: &str = "secure:";

// Agent configuration parameter keys
pub const AGENT_INSTANCE_NAME: &str = azure!("instance.name");
pub const AGENT_PROFILE_ID: &str = "system.cloud.profile_id";

// Paths
pub const STATE_DIRECTORY_NAME: &str = "azureIdx";

// Environment variables
pub const ENV_PLUGIN_DATA_DIR: &str = "CLOUD_PLUGIN_DATA_DIR";
pub const ENV_EDIT_PROFILE_URL: &str = "CLOUD_EDIT_PROFILE_URL";
pub const ENV_API_TIMEOUT_SECS: &str = "CLOUD_API_TIMEOUT_SECS";

/// Printed in place of any secret value.
pub const REDACTED: &str = "********";
