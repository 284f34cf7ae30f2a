//! Hemmer provider for Hetzner Robot
//!
//! Manages dedicated-server firewalls, rescue-system boots and vSwitches
//! through the [Robot webservice](https://robot.hetzner.com/doc/webservice/en.html).
//! The binary is spawned by Hemmer and speaks the Hemmer provider protocol
//! over gRPC.
//!
//! # Resources
//!
//! - `hetznerrobot_firewall`: input rules of a server's stateless firewall
//! - `hetznerrobot_os_rescue`: boot a server into the rescue system
//! - `hetznerrobot_vswitch`: a vSwitch with optional server members
//! - `hetznerrobot_vswitch_servers`: server membership of an existing vSwitch
//!
//! # Data sources
//!
//! - `hetznerrobot_server`: servers on the account
//! - `hetznerrobot_vswitch`: vSwitches on the account
//!
//! # Handshake
//!
//! [`serve`] binds a local port and prints one line to stdout before serving:
//!
//! ```text
//! HEMMER_PROVIDER|1|127.0.0.1:50051
//! ```
//!
//! Logs go to stderr so they never mix with the handshake.
//!
//! # Configuration
//!
//! ```text
//! provider "hetznerrobot" {
//!   username = "#ws+abcdef"      # or HETZNERROBOT_USERNAME
//!   password = "..."             # or HETZNERROBOT_PASSWORD
//!   url      = "https://robot-ws.your-server.de"  # or HETZNERROBOT_URL
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod reconcile;
pub mod resources;
pub mod schema;
pub mod server;
pub mod testing;
pub mod types;
pub mod validation;

#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod protocol;

pub use client::{RobotClient, RobotConfig, RobotError};
pub use config::{ProviderConfig, Timeouts};
pub use error::ProviderError;
pub use logging::{init_logging, try_init_logging};
pub use provider::HetznerRobotProvider;
pub use reconcile::{PortWait, WaitPolicy};
pub use schema::ProviderSchema;
pub use server::{serve, serve_on, serve_with_options, ProviderService, ServeOptions};
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities,
    HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};
