/*!

Validation of a profile's parameters, shared by the client factory and the properties processor
of the profile settings form.

!*/

use crate::connector::{ConnectorError, Credentials};
use cloud_model::constants::{PARAM_MANAGEMENT_CERTIFICATE, PARAM_SUBSCRIPTION_ID};
use cloud_model::{ClientParameters, TypedCloudErrorInfo};

/// A form field that failed validation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvalidProperty {
    pub name: String,
    pub reason: String,
}

/// Validates the parameters of a profile before they are saved.
pub trait PropertiesProcessor: Send + Sync {
    fn process(&self, properties: &ClientParameters) -> Vec<InvalidProperty>;
}

/// The [`PropertiesProcessor`] of cloud profiles. It reports the same problems as
/// [`check_client_params`], keyed by the offending parameter.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProfilePropertiesProcessor;

impl PropertiesProcessor for ProfilePropertiesProcessor {
    fn process(&self, properties: &ClientParameters) -> Vec<InvalidProperty> {
        credential_problems(properties)
            .into_iter()
            .map(|e| InvalidProperty {
                name: parameter_of(&e).to_string(),
                reason: e.to_string(),
            })
            .collect()
    }
}

/// Checks that the subscription id is a GUID and the management certificate can be decoded. Each
/// problem becomes a `Configuration` error; the certificate problem, if any, comes first.
pub fn check_client_params(params: &ClientParameters) -> Vec<TypedCloudErrorInfo> {
    credential_problems(params)
        .into_iter()
        .map(|e| configuration_error(&e))
        .collect()
}

/// The record that a failed connector turns into. The certificate itself is never included.
pub(crate) fn configuration_error(e: &ConnectorError) -> TypedCloudErrorInfo {
    let message = if e.is_invalid_certificate() {
        "Invalid management certificate"
    } else {
        "Invalid subscription id"
    };
    TypedCloudErrorInfo::configuration(message).with_details(e.to_string())
}

fn credential_problems(params: &ClientParameters) -> Vec<ConnectorError> {
    Credentials::validate(
        params.get(PARAM_SUBSCRIPTION_ID).unwrap_or_default(),
        params.get(PARAM_MANAGEMENT_CERTIFICATE).unwrap_or_default(),
    )
}

fn parameter_of(e: &ConnectorError) -> &'static str {
    match e {
        ConnectorError::InvalidCertificate { .. } => PARAM_MANAGEMENT_CERTIFICATE,
        ConnectorError::InvalidSubscription { .. } => PARAM_SUBSCRIPTION_ID,
    }
}
