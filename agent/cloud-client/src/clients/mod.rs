/*!

This module defines how the engine talks to the build server's fleet manager, which owns the
profile and agent registries.

!*/

mod error;
mod fleet_client;

pub use error::{ClientError, ClientResult};
pub use fleet_client::FleetManager;
