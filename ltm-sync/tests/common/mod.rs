//! Shared fixtures for ltm-sync integration tests.

#![allow(dead_code)]

use ltm_sync::clients::{ClientError, Fastl4, MemoryAppliance, RemoteClient};
use ltm_sync::reconciler::{NodeSpec, Record};

/// Error the appliance returns when a pool member still references a node.
pub fn blocked_by(node: &str, pool: &str) -> ClientError {
    ClientError::api(
        400,
        format!(
            "01070110:3: Node address '{}' is referenced by a member of pool '{}'.",
            node, pool
        ),
    )
}

pub fn node_record(name: &str, address: &str) -> Record<NodeSpec> {
    Record::new(NodeSpec {
        name: name.to_string(),
        address: address.to_string(),
    })
}

/// Appliance with `node` registered by address and referenced from `pool`
/// by every listed member.
pub async fn appliance_with_referenced_node(
    node: &str,
    pool: &str,
    members: &[&str],
) -> MemoryAppliance {
    let appliance = MemoryAppliance::new();
    appliance
        .create_node(node, "10.0.0.5")
        .await
        .expect("Failed to seed node");
    for member in members {
        appliance
            .add_pool_member(pool, member, node)
            .await
            .expect("Failed to seed pool member");
    }
    appliance
}

/// FastL4 profile with every tunable set.
pub fn full_profile(name: &str) -> Fastl4 {
    Fastl4 {
        name: name.to_string(),
        partition: Some("Common".to_string()),
        defaults_from: Some("/Common/fastL4".to_string()),
        client_timeout: Some(30),
        explicit_flow_migration: Some("enabled".to_string()),
        hardware_syn_cookie: Some("enabled".to_string()),
        idle_timeout: Some("200".to_string()),
        ip_tos_to_client: Some("pass-through".to_string()),
        ip_tos_to_server: Some("pass-through".to_string()),
        keep_alive_interval: Some("disabled".to_string()),
    }
}
