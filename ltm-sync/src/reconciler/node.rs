//! Node manager - registers LTM nodes by address or hostname and removes them,
//! clearing blocking pool memberships first.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{Record, Resource};
use crate::clients::RemoteClient;
use crate::config::{ReconcileConfig, DEFAULT_MAX_DELETE_ATTEMPTS};
use crate::error::{Error, Result};
use crate::validation::{validate_f5_name, validate_required};

const KIND: &str = "node";

/// Lenient "looks like an IP" test: four dot-ish separated digit runs at the
/// start (any character counts as a separator), or a colon anywhere.
/// `10.0.0.5.6` and `1a2b3c4` both pass.
static IP_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:[0-9]{1,3}.){3}[0-9]{1,3})|(.*:.*)$").expect("IP pattern is valid")
});

static BLOCKING_POOL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"referenced by a member of pool '/[A-Za-z0-9_]+/([A-Za-z0-9_.\-]+)")
        .expect("pool reference pattern is valid")
});

/// Declared node fields. Both are immutable once created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Full path, e.g. `/Common/web-01`.
    pub name: String,
    /// IP literal or hostname.
    pub address: String,
}

/// Which creation call a declared address maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Address,
    Fqdn,
}

/// Pick the registration mode for a declared address.
pub fn classify_address(address: &str) -> AddressKind {
    if IP_LIKE.is_match(address) {
        AddressKind::Address
    } else {
        AddressKind::Fqdn
    }
}

/// Pool name from a "referenced by a member of pool '/Partition/pool'" error.
pub fn extract_blocking_pool(error_text: &str) -> Option<String> {
    BLOCKING_POOL
        .captures(error_text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Manages LTM nodes.
#[derive(Debug, Clone)]
pub struct NodeManager {
    max_delete_attempts: u32,
}

impl Default for NodeManager {
    fn default() -> Self {
        Self::with_max_delete_attempts(DEFAULT_MAX_DELETE_ATTEMPTS)
    }
}

impl NodeManager {
    pub fn new(config: &ReconcileConfig) -> Self {
        Self::with_max_delete_attempts(config.max_delete_attempts)
    }

    /// `attempts` counts delete calls, including the first; at least one is made.
    pub fn with_max_delete_attempts(attempts: u32) -> Self {
        Self {
            max_delete_attempts: attempts.max(1),
        }
    }

    pub fn max_delete_attempts(&self) -> u32 {
        self.max_delete_attempts
    }

    /// Remove every member of `pool`. Stops at the first failure.
    async fn clear_pool(&self, client: &dyn RemoteClient, pool: &str) -> Result<()> {
        let members = client.pool_members(pool).await?;
        info!("Removing {} members from pool {}", members.len(), pool);
        for member in &members {
            client.delete_pool_member(pool, &member.name).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Resource for NodeManager {
    type Spec = NodeSpec;

    fn kind(&self) -> &'static str {
        KIND
    }

    async fn create(&self, client: &dyn RemoteClient, record: &mut Record<NodeSpec>) -> Result<()> {
        let NodeSpec { name, address } = record.spec.clone();
        validate_f5_name("name", &name)?;
        validate_required("address", &address)?;

        info!("Creating node {}::{}", name, address);
        match classify_address(&address) {
            AddressKind::Address => client.create_node(&name, &address).await?,
            AddressKind::Fqdn => client.create_fqdn_node(&name, &address).await?,
        }

        record.set_id(name);
        self.read(client, record).await
    }

    async fn read(&self, client: &dyn RemoteClient, record: &mut Record<NodeSpec>) -> Result<()> {
        let name = record.require_id(KIND)?;
        info!("Fetching node {}", name);

        let Some(node) = client.get_node(&name).await? else {
            warn!("Node ({}) not found, removing from state", name);
            record.clear_id();
            return Ok(());
        };

        record.spec.address = node.address.declared().to_string();
        record.spec.name = name;
        Ok(())
    }

    async fn exists(
        &self,
        client: &dyn RemoteClient,
        record: &mut Record<NodeSpec>,
    ) -> Result<bool> {
        let name = record.require_id(KIND)?;
        info!("Fetching node {}", name);

        let found = client.get_node(&name).await?.is_some();
        if !found {
            warn!("Node ({}) not found, removing from state", name);
            record.clear_id();
        }
        Ok(found)
    }

    async fn delete(&self, client: &dyn RemoteClient, record: &mut Record<NodeSpec>) -> Result<()> {
        let name = record.require_id(KIND)?;
        info!("Deleting node {}", name);

        let mut attempts = 0;
        loop {
            attempts += 1;
            let err = match client.delete_node(&name).await {
                Ok(()) => {
                    record.clear_id();
                    return Ok(());
                }
                Err(e) if e.is_not_found() => {
                    warn!("Node ({}) not found, removing from state", name);
                    record.clear_id();
                    return Ok(());
                }
                Err(e) => e,
            };

            let Some(pool) = extract_blocking_pool(&err.to_string()) else {
                return Err(err.into());
            };
            if attempts >= self.max_delete_attempts {
                return Err(Error::DependencyResolutionExhausted {
                    kind: KIND,
                    name,
                    pool,
                    attempts,
                });
            }

            info!("Deleting {} from pool {} (attempt {})", name, pool, attempts);
            self.clear_pool(client, &pool).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_address() {
        assert_eq!(classify_address("10.0.0.5"), AddressKind::Address);
        assert_eq!(classify_address("192.168.100.254"), AddressKind::Address);
        assert_eq!(classify_address("2001:db8::1"), AddressKind::Address);
        assert_eq!(classify_address("::1"), AddressKind::Address);

        assert_eq!(classify_address("svc.internal.example"), AddressKind::Fqdn);
        assert_eq!(classify_address("web01.example.com"), AddressKind::Fqdn);
        assert_eq!(classify_address("localhost"), AddressKind::Fqdn);
    }

    #[test]
    fn test_classify_address_is_lenient() {
        // Not strict IPv4 validation: extra octets, out-of-range octets and
        // non-dot separators all take the address path.
        assert_eq!(classify_address("10.0.0.5.6"), AddressKind::Address);
        assert_eq!(classify_address("999.999.999.999"), AddressKind::Address);
        assert_eq!(classify_address("1a2b3c4"), AddressKind::Address);
        assert_eq!(classify_address("1.2.3.4.example.com"), AddressKind::Address);
        assert_eq!(classify_address("host:8080"), AddressKind::Address);
    }

    #[test]
    fn test_extract_blocking_pool() {
        assert_eq!(
            extract_blocking_pool(
                "01070110:3: Node address '/Common/n1' is referenced by a member of pool '/Common/pool1'."
            ),
            Some("pool1".to_string())
        );
        assert_eq!(
            extract_blocking_pool("referenced by a member of pool '/Tenant_A/web-pool.v2'"),
            Some("web-pool.v2".to_string())
        );
    }

    #[test]
    fn test_extract_blocking_pool_no_match() {
        assert_eq!(
            extract_blocking_pool("01020036:3: The requested Node (/Common/n1) was not found."),
            None
        );
        assert_eq!(extract_blocking_pool("connection reset by peer"), None);
        assert_eq!(extract_blocking_pool(""), None);
        // Word characters are ASCII only.
        assert_eq!(
            extract_blocking_pool("referenced by a member of pool '/Cömmon/pool1'"),
            None
        );
        // Pool reference without a partition is not recognised.
        assert_eq!(
            extract_blocking_pool("referenced by a member of pool 'pool1'"),
            None
        );
    }

    #[test]
    fn test_max_delete_attempts_floor() {
        assert_eq!(NodeManager::with_max_delete_attempts(0).max_delete_attempts(), 1);
        assert_eq!(
            NodeManager::default().max_delete_attempts(),
            DEFAULT_MAX_DELETE_ATTEMPTS
        );
        let config = ReconcileConfig {
            max_delete_attempts: 3,
        };
        assert_eq!(NodeManager::new(&config).max_delete_attempts(), 3);
    }
}
