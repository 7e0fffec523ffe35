//! In-process appliance.
//!
//! Keeps nodes, pools and FastL4 profiles in memory and enforces the one
//! integrity rule the resource managers care about: a node cannot be deleted
//! while a pool member references it. Error codes and messages follow the
//! appliance's wording so callers can parse them the same way.

use std::collections::{BTreeMap, HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{ClientError, Fastl4, Node, NodeAddress, PoolMember, RemoteClient, Result};

#[derive(Debug, Clone)]
struct MemberEntry {
    name: String,
    node: String,
}

#[derive(Default)]
struct State {
    nodes: BTreeMap<String, Node>,
    /// Keyed by full path, e.g. `/Common/web-pool`.
    pools: BTreeMap<String, Vec<MemberEntry>>,
    profiles: BTreeMap<String, Fastl4>,
    calls: Vec<String>,
    failures: HashMap<String, VecDeque<ClientError>>,
}

impl State {
    fn record(&mut self, operation: &str, args: &[&str]) -> Result<()> {
        debug!("memory appliance: {} {:?}", operation, args);
        let mut call = operation.to_string();
        for arg in args {
            call.push(' ');
            call.push_str(arg);
        }
        self.calls.push(call);

        match self
            .failures
            .get_mut(operation)
            .and_then(|queue| queue.pop_front())
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Accepts a full path. A bare pool name lives in `/Common`, as on the
    /// appliance.
    fn resolve_pool(&self, pool: &str) -> Option<String> {
        if self.pools.contains_key(pool) {
            return Some(pool.to_string());
        }
        if pool.starts_with('/') {
            return None;
        }
        let common = format!("/Common/{}", pool);
        self.pools.contains_key(&common).then_some(common)
    }

    fn referencing_pool(&self, node: &str) -> Option<&str> {
        self.pools
            .iter()
            .find(|(_, members)| members.iter().any(|m| m.node == node))
            .map(|(pool, _)| pool.as_str())
    }

    fn insert_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains_key(&node.name) {
            return Err(ClientError::api(
                409,
                format!(
                    "01020066:3: The requested Node ({}) already exists in partition {}.",
                    node.name,
                    partition_of(&node.name)
                ),
            ));
        }
        self.nodes.insert(node.name.clone(), node);
        Ok(())
    }
}

fn partition_of(name: &str) -> &str {
    name.trim_start_matches('/')
        .split('/')
        .next()
        .filter(|_| name.starts_with('/'))
        .unwrap_or("Common")
}

fn node_not_found(name: &str) -> ClientError {
    ClientError::api(
        404,
        format!("01020036:3: The requested Node ({}) was not found.", name),
    )
}

fn profile_not_found(name: &str) -> ClientError {
    ClientError::api(
        404,
        format!(
            "01020036:3: The requested FastL4 Profile ({}) was not found.",
            name
        ),
    )
}

/// Appliance stand-in backed by in-memory maps.
#[derive(Default)]
pub struct MemoryAppliance {
    state: Mutex<State>,
}

impl MemoryAppliance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty pool. `pool` is a full path such as `/Common/web-pool`.
    pub async fn add_pool(&self, pool: &str) {
        let mut state = self.state.lock().await;
        state.pools.entry(pool.to_string()).or_default();
    }

    /// Add a member referencing `node`. The pool is created on demand.
    pub async fn add_pool_member(&self, pool: &str, member: &str, node: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.nodes.contains_key(node) {
            return Err(node_not_found(node));
        }
        let key = state.resolve_pool(pool).unwrap_or_else(|| pool.to_string());
        state.pools.entry(key).or_default().push(MemberEntry {
            name: member.to_string(),
            node: node.to_string(),
        });
        Ok(())
    }

    /// Seed a node directly, bypassing the call log.
    pub async fn seed_node(&self, node: Node) {
        let mut state = self.state.lock().await;
        state.nodes.insert(node.name.clone(), node);
    }

    /// Seed a FastL4 profile directly, bypassing the call log.
    pub async fn seed_fastl4(&self, profile: Fastl4) {
        let mut state = self.state.lock().await;
        state.profiles.insert(profile.name.clone(), profile);
    }

    pub async fn node(&self, name: &str) -> Option<Node> {
        self.state.lock().await.nodes.get(name).cloned()
    }

    pub async fn fastl4(&self, name: &str) -> Option<Fastl4> {
        self.state.lock().await.profiles.get(name).cloned()
    }

    /// Member names of a pool, empty if the pool does not exist.
    pub async fn member_names(&self, pool: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .resolve_pool(pool)
            .and_then(|key| state.pools.get(&key))
            .map(|members| members.iter().map(|m| m.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Fail the next call to `operation` (a [`RemoteClient`] method name) with `err`.
    /// Queued failures are consumed in order, one per call.
    pub async fn fail_next(&self, operation: &str, err: ClientError) {
        let mut state = self.state.lock().await;
        state
            .failures
            .entry(operation.to_string())
            .or_default()
            .push_back(err);
    }

    /// Every client call so far, formatted as `operation arg...`.
    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }

    /// Number of calls made to `operation`.
    pub async fn calls_to(&self, operation: &str) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| call.split(' ').next() == Some(operation))
            .count()
    }
}

#[async_trait]
impl RemoteClient for MemoryAppliance {
    async fn create_node(&self, name: &str, address: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.record("create_node", &[name, address])?;
        state.insert_node(Node {
            name: name.to_string(),
            address: NodeAddress::Address(address.to_string()),
        })
    }

    async fn create_fqdn_node(&self, name: &str, hostname: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.record("create_fqdn_node", &[name, hostname])?;
        state.insert_node(Node {
            name: name.to_string(),
            address: NodeAddress::Fqdn(hostname.to_string()),
        })
    }

    async fn get_node(&self, name: &str) -> Result<Option<Node>> {
        let mut state = self.state.lock().await;
        state.record("get_node", &[name])?;
        Ok(state.nodes.get(name).cloned())
    }

    async fn modify_node(&self, name: &str, node: &Node) -> Result<()> {
        let mut state = self.state.lock().await;
        state.record("modify_node", &[name])?;
        let existing = state.nodes.get_mut(name).ok_or_else(|| node_not_found(name))?;
        existing.address = node.address.clone();
        Ok(())
    }

    async fn delete_node(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.record("delete_node", &[name])?;
        if !state.nodes.contains_key(name) {
            return Err(node_not_found(name));
        }
        if let Some(pool) = state.referencing_pool(name) {
            return Err(ClientError::api(
                400,
                format!(
                    "01070110:3: Node address '{}' is referenced by a member of pool '{}'.",
                    name, pool
                ),
            ));
        }
        state.nodes.remove(name);
        Ok(())
    }

    async fn pool_members(&self, pool: &str) -> Result<Vec<PoolMember>> {
        let mut state = self.state.lock().await;
        state.record("pool_members", &[pool])?;
        let members = state
            .resolve_pool(pool)
            .and_then(|key| state.pools.get(&key))
            .map(|members| {
                members
                    .iter()
                    .map(|m| PoolMember {
                        name: m.name.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(members)
    }

    async fn delete_pool_member(&self, pool: &str, member: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.record("delete_pool_member", &[pool, member])?;
        let key = state.resolve_pool(pool).ok_or_else(|| {
            ClientError::api(
                404,
                format!("01020036:3: The requested Pool ({}) was not found.", pool),
            )
        })?;
        let members = state.pools.entry(key).or_default();
        let before = members.len();
        members.retain(|m| m.name != member);
        if members.len() == before {
            return Err(ClientError::api(
                404,
                format!(
                    "01020036:3: The requested Pool Member ({} {}) was not found.",
                    pool, member
                ),
            ));
        }
        Ok(())
    }

    async fn create_fastl4(&self, profile: &Fastl4) -> Result<()> {
        let mut state = self.state.lock().await;
        state.record("create_fastl4", &[profile.name.as_str()])?;
        if state.profiles.contains_key(&profile.name) {
            return Err(ClientError::api(
                409,
                format!(
                    "01020066:3: The requested FastL4 Profile ({}) already exists.",
                    profile.name
                ),
            ));
        }
        state.profiles.insert(profile.name.clone(), profile.clone());
        Ok(())
    }

    async fn get_fastl4(&self, name: &str) -> Result<Option<Fastl4>> {
        let mut state = self.state.lock().await;
        state.record("get_fastl4", &[name])?;
        Ok(state.profiles.get(name).cloned())
    }

    async fn modify_fastl4(&self, name: &str, profile: &Fastl4) -> Result<()> {
        let mut state = self.state.lock().await;
        state.record("modify_fastl4", &[name])?;
        let existing = state
            .profiles
            .get_mut(name)
            .ok_or_else(|| profile_not_found(name))?;
        // Full replacement: fields missing from the payload are dropped.
        *existing = Fastl4 {
            name: name.to_string(),
            ..profile.clone()
        };
        Ok(())
    }

    async fn delete_fastl4(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.record("delete_fastl4", &[name])?;
        state
            .profiles
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| profile_not_found(name))
    }
}
