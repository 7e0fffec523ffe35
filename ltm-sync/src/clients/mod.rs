//! Clients for the remote load-balancer appliance.
//!
//! Resource managers only see the [`RemoteClient`] trait:
//! - `icontrol`: iControl REST over HTTPS
//! - `memory`: in-process appliance with pool/node referential integrity

pub mod icontrol;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use icontrol::IControlClient;
pub use memory::MemoryAppliance;

/// Errors returned by a remote client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The appliance answered with an error body. `message` is kept verbatim.
    #[error("{message}")]
    Api { code: u16, message: String },

    /// The request never produced an appliance answer.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The appliance answered with something we could not decode.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn api(code: u16, message: impl Into<String>) -> Self {
        ClientError::Api {
            code,
            message: message.into(),
        }
    }

    /// True if the appliance reported that the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { code: 404, .. })
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// How the appliance registers a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum NodeAddress {
    /// Registered by IP literal.
    Address(String),
    /// Registered by hostname, resolved by the appliance.
    Fqdn(String),
}

impl NodeAddress {
    /// Projection onto the single declared `address` field.
    pub fn declared(&self) -> &str {
        match self {
            NodeAddress::Address(ip) => ip,
            NodeAddress::Fqdn(hostname) => hostname,
        }
    }
}

/// Node as seen on the appliance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub address: NodeAddress,
}

/// Member of a pool, referencing a node by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMember {
    pub name: String,
}

/// FastL4 profile. Used both as the declared record and the remote payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fastl4 {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_flow_migration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_syn_cookie: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_tos_to_client: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_tos_to_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive_interval: Option<String>,
}

/// Object CRUD calls offered by the appliance.
///
/// Implementations are shared across concurrent operations on distinct
/// records and must not keep per-operation state.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Register a node by IP address.
    async fn create_node(&self, name: &str, address: &str) -> Result<()>;

    /// Register a node by hostname.
    async fn create_fqdn_node(&self, name: &str, hostname: &str) -> Result<()>;

    /// Fetch a node. `Ok(None)` means the node does not exist.
    async fn get_node(&self, name: &str) -> Result<Option<Node>>;

    /// Replace a node's mutable settings.
    async fn modify_node(&self, name: &str, node: &Node) -> Result<()>;

    /// Delete a node. Fails while any pool member references it.
    async fn delete_node(&self, name: &str) -> Result<()>;

    /// List the members of a pool. A missing pool has no members.
    async fn pool_members(&self, pool: &str) -> Result<Vec<PoolMember>>;

    /// Remove one member from a pool.
    async fn delete_pool_member(&self, pool: &str, member: &str) -> Result<()>;

    async fn create_fastl4(&self, profile: &Fastl4) -> Result<()>;

    /// Fetch a FastL4 profile. `Ok(None)` means the profile does not exist.
    async fn get_fastl4(&self, name: &str) -> Result<Option<Fastl4>>;

    async fn modify_fastl4(&self, name: &str, profile: &Fastl4) -> Result<()>;

    async fn delete_fastl4(&self, name: &str) -> Result<()>;
}
