/*!

The `cloud-client` library is the engine behind the Azure cloud profiles of a build server. A
[`ClientFactory`] turns the parameters of a profile into a [`CloudClient`], which manages the VMs
of that profile through a [`ManagementApi`](provider::ManagementApi) implementation. The factory
also listens for agent authorization events and links each new agent to the instance it runs on.

The build server itself is reached through the [`FleetManager`](clients::FleetManager) trait.

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

mod bootstrap;
mod client;
pub mod clients;
pub mod connector;
pub mod credential_bundle;
pub mod error;
pub mod events;
mod factory;
pub mod index;
mod instance;
pub mod matching;
pub mod provider;
pub mod store;
pub mod validation;

pub use bootstrap::{BootstrapError, FactorySettings};
pub use client::{CloudClient, CloudClientError, CloudClientResult};
pub use cloud_model::{
    AgentDescription, ClientParameters, CloudImageTemplate, CloudProfile, CloudState,
    Configuration, TypedCloudErrorInfo,
};
pub use connector::ApiConnector;
pub use factory::ClientFactory;
pub use instance::CloudInstance;
