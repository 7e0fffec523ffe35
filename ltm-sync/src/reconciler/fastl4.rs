//! FastL4 profile manager - plain create/read/update/delete, no dependency
//! handling.

use async_trait::async_trait;
use tracing::{info, warn};

use super::{Record, Resource};
use crate::clients::{Fastl4, RemoteClient};
use crate::error::Result;
use crate::validation::validate_required;

const KIND: &str = "fastl4 profile";

/// Manages FastL4 profiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fastl4Manager;

#[async_trait]
impl Resource for Fastl4Manager {
    type Spec = Fastl4;

    fn kind(&self) -> &'static str {
        KIND
    }

    async fn create(&self, client: &dyn RemoteClient, record: &mut Record<Fastl4>) -> Result<()> {
        validate_required("name", &record.spec.name)?;
        info!("Creating FastL4 profile {}", record.spec.name);

        client.create_fastl4(&record.spec).await?;

        record.set_id(record.spec.name.clone());
        self.read(client, record).await
    }

    async fn read(&self, client: &dyn RemoteClient, record: &mut Record<Fastl4>) -> Result<()> {
        let name = record.require_id(KIND)?;
        info!("Fetching FastL4 profile {}", name);

        match client.get_fastl4(&name).await? {
            Some(observed) => {
                record.spec = Fastl4 { name, ..observed };
                Ok(())
            }
            None => {
                warn!("FastL4 profile ({}) not found, removing from state", name);
                record.clear_id();
                Ok(())
            }
        }
    }

    async fn update(&self, client: &dyn RemoteClient, record: &mut Record<Fastl4>) -> Result<()> {
        let name = record.require_id(KIND)?;
        info!("Updating FastL4 profile {}", name);

        // Always the full field set; the appliance replaces the object.
        let profile = Fastl4 {
            name: name.clone(),
            ..record.spec.clone()
        };
        client.modify_fastl4(&name, &profile).await?;
        Ok(())
    }

    async fn delete(&self, client: &dyn RemoteClient, record: &mut Record<Fastl4>) -> Result<()> {
        let name = record.require_id(KIND)?;
        info!("Deleting FastL4 profile {}", name);

        match client.delete_fastl4(&name).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                warn!("FastL4 profile ({}) not found, removing from state", name);
            }
            Err(e) => return Err(e.into()),
        }
        record.clear_id();
        Ok(())
    }
}
