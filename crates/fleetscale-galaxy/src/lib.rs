//! fleetscale-galaxy — Galaxy hosting API client.
//!
//! Implements [`fleetscale_core::FleetApi`] over the Galaxy GraphQL
//! endpoint:
//!
//! ```text
//! fetch_application  -> query app(hostname) { metrics, containers { metrics } }
//! set_container_count -> mutation setContainerCountForApp(appId, containerCount)
//! kill_container      -> mutation killContainer(appId, containerId)
//! ```
//!
//! Requests carry the `galaxy-api-key` header and time out after 30s.

pub mod client;
pub mod error;
pub mod query;
pub mod wire;

pub use client::GalaxyClient;
pub use error::{GalaxyError, GalaxyResult};
pub use wire::parse_app;
