//! ltm-sync: command-line driver for the LTM resource managers.
//!
//! Each invocation runs one lifecycle operation against the appliance and
//! prints the resulting record as JSON:
//! - `node create|read|exists|delete|import`
//! - `profile create|read|update|delete|import`

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ltm_sync::clients::{Fastl4, IControlClient, RemoteClient};
use ltm_sync::config::{ConnectionConfig, ReconcileConfig, DEFAULT_MAX_DELETE_ATTEMPTS};
use ltm_sync::reconciler::{Fastl4Manager, NodeManager, NodeSpec, Record, Resource};

/// BIG-IP LTM reconciler
#[derive(Parser, Debug)]
#[command(name = "ltm-sync", version, about)]
struct Args {
    /// Appliance host, host:port or base URL
    #[arg(long, env = "BIGIP_HOST")]
    host: String,

    /// API user
    #[arg(long, env = "BIGIP_USER", default_value = "admin")]
    username: String,

    /// API password
    #[arg(long, env = "BIGIP_PASSWORD", hide_env_values = true)]
    password: String,

    /// Accept self-signed certificates
    #[arg(long, env = "BIGIP_INSECURE")]
    insecure: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Delete attempts for a node still referenced by pool members
    #[arg(long, default_value_t = DEFAULT_MAX_DELETE_ATTEMPTS)]
    max_delete_attempts: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage LTM nodes
    #[command(subcommand)]
    Node(NodeCommand),

    /// Manage FastL4 profiles
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Subcommand, Debug)]
enum NodeCommand {
    /// Create a node (IP literal or hostname)
    Create {
        /// Full path, e.g. /Common/web-01
        #[arg(long)]
        name: String,

        /// IP address or FQDN
        #[arg(long)]
        address: String,
    },

    /// Read a node
    Read { name: String },

    /// Check whether a node exists
    Exists { name: String },

    /// Delete a node, removing blocking pool members first
    Delete { name: String },

    /// Adopt an existing node
    Import { name: String },
}

#[derive(clap::Args, Debug)]
struct Fastl4Args {
    /// Profile name
    #[arg(long)]
    name: String,

    #[arg(long)]
    partition: Option<String>,

    /// Parent profile
    #[arg(long)]
    defaults_from: Option<String>,

    #[arg(long)]
    client_timeout: Option<i64>,

    #[arg(long)]
    explicit_flow_migration: Option<String>,

    #[arg(long)]
    hardware_syn_cookie: Option<String>,

    #[arg(long)]
    idle_timeout: Option<String>,

    #[arg(long)]
    ip_tos_to_client: Option<String>,

    #[arg(long)]
    ip_tos_to_server: Option<String>,

    #[arg(long)]
    keep_alive_interval: Option<String>,
}

impl Fastl4Args {
    /// Overlay the given flags onto `base`, keeping base values for the rest.
    fn apply_to(self, base: Fastl4) -> Fastl4 {
        Fastl4 {
            name: self.name,
            partition: self.partition.or(base.partition),
            defaults_from: self.defaults_from.or(base.defaults_from),
            client_timeout: self.client_timeout.or(base.client_timeout),
            explicit_flow_migration: self
                .explicit_flow_migration
                .or(base.explicit_flow_migration),
            hardware_syn_cookie: self.hardware_syn_cookie.or(base.hardware_syn_cookie),
            idle_timeout: self.idle_timeout.or(base.idle_timeout),
            ip_tos_to_client: self.ip_tos_to_client.or(base.ip_tos_to_client),
            ip_tos_to_server: self.ip_tos_to_server.or(base.ip_tos_to_server),
            keep_alive_interval: self.keep_alive_interval.or(base.keep_alive_interval),
        }
    }
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    /// Create a FastL4 profile
    Create(Fastl4Args),

    /// Read a FastL4 profile
    Read { name: String },

    /// Update a FastL4 profile; unspecified fields keep their current values
    Update(Fastl4Args),

    /// Delete a FastL4 profile
    Delete { name: String },

    /// Adopt an existing FastL4 profile
    Import { name: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_node(
    client: &dyn RemoteClient,
    manager: &NodeManager,
    command: NodeCommand,
) -> Result<()> {
    match command {
        NodeCommand::Create { name, address } => {
            let mut record = Record::new(NodeSpec { name, address });
            manager
                .create(client, &mut record)
                .await
                .context("Failed to create node")?;
            print_json(&record)
        }
        NodeCommand::Read { name } => {
            let mut record = Record::with_id(name, NodeSpec::default());
            manager
                .read(client, &mut record)
                .await
                .context("Failed to read node")?;
            print_json(&record)
        }
        NodeCommand::Exists { name } => {
            let mut record = Record::with_id(name, NodeSpec::default());
            let exists = manager
                .exists(client, &mut record)
                .await
                .context("Failed to check node")?;
            print_json(&serde_json::json!({ "exists": exists, "id": record.id() }))
        }
        NodeCommand::Delete { name } => {
            let mut record = Record::with_id(name, NodeSpec::default());
            manager
                .delete(client, &mut record)
                .await
                .context("Failed to delete node")?;
            print_json(&record)
        }
        NodeCommand::Import { name } => print_json(&manager.import(&name)),
    }
}

async fn run_profile(
    client: &dyn RemoteClient,
    manager: &Fastl4Manager,
    command: ProfileCommand,
) -> Result<()> {
    match command {
        ProfileCommand::Create(args) => {
            let mut record = Record::new(args.apply_to(Fastl4::default()));
            manager
                .create(client, &mut record)
                .await
                .context("Failed to create FastL4 profile")?;
            print_json(&record)
        }
        ProfileCommand::Read { name } => {
            let mut record = Record::with_id(name, Fastl4::default());
            manager
                .read(client, &mut record)
                .await
                .context("Failed to read FastL4 profile")?;
            print_json(&record)
        }
        ProfileCommand::Update(args) => {
            let mut record = Record::with_id(args.name.clone(), Fastl4::default());
            manager
                .read(client, &mut record)
                .await
                .context("Failed to read FastL4 profile")?;
            if record.is_gone() {
                bail!("FastL4 profile {} does not exist", args.name);
            }
            record.spec = args.apply_to(record.spec);
            manager
                .update(client, &mut record)
                .await
                .context("Failed to update FastL4 profile")?;
            print_json(&record)
        }
        ProfileCommand::Delete { name } => {
            let mut record = Record::with_id(name, Fastl4::default());
            manager
                .delete(client, &mut record)
                .await
                .context("Failed to delete FastL4 profile")?;
            print_json(&record)
        }
        ProfileCommand::Import { name } => print_json(&manager.import(&name)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ltm_sync=info,reqwest=warn,hyper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let connection = ConnectionConfig {
        host: args.host,
        username: args.username,
        password: args.password,
        insecure: args.insecure,
        timeout: Duration::from_secs(args.timeout_secs),
    };
    let reconcile = ReconcileConfig {
        max_delete_attempts: args.max_delete_attempts,
    };

    info!("Connecting to appliance: {}", connection.host);
    let client = IControlClient::new(&connection).context("Failed to build iControl client")?;

    match args.command {
        Command::Node(command) => run_node(&client, &NodeManager::new(&reconcile), command).await,
        Command::Profile(command) => run_profile(&client, &Fastl4Manager, command).await,
    }
}
