/*!

This library provides the plain data types that describe cloud profiles, image templates,
instances, agents and the error records shown to operators.

!*/

#![deny(
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::panicking_unwrap,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]

pub use agent::{AgentDescription, AgentId};
pub use cloud_error::{ErrorKind, TypedCloudErrorInfo};
pub use configuration::Configuration;
pub use error::{Error, Result};
pub use image::CloudImageTemplate;
pub use instance::{InstanceRecord, InstanceStatus};
pub use parameters::ClientParameters;
pub use profile::{CloudProfile, CloudState, ProfileId};
pub use secret::Password;

mod agent;
mod cloud_error;
mod configuration;
pub mod constants;
mod error;
mod image;
mod instance;
mod parameters;
mod profile;
mod secret;
mod serde_utils;
