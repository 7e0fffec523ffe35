//! Resource managers for different object kinds.
//!
//! Each manager maps a declared [`Record`] onto appliance calls and reports
//! the observed state back into the record. The driver owns the record and
//! persists its identifier; managers clear the identifier when the object is
//! gone on the appliance.

pub mod fastl4;
pub mod node;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::clients::RemoteClient;
use crate::error::{Error, Result};

pub use fastl4::Fastl4Manager;
pub use node::{NodeManager, NodeSpec};

/// Declared record plus the identifier of its remote object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record<S> {
    id: Option<String>,
    pub spec: S,
}

impl<S> Record<S> {
    /// A record not yet backed by a remote object.
    pub fn new(spec: S) -> Self {
        Self { id: None, spec }
    }

    pub fn with_id(id: impl Into<String>, spec: S) -> Self {
        Self {
            id: Some(id.into()),
            spec,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Drop the identifier. The driver treats the object as absent.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn is_gone(&self) -> bool {
        self.id.is_none()
    }

    /// The stored identifier, or `MissingId` for `kind`.
    pub fn require_id(&self, kind: &'static str) -> Result<String> {
        self.id.clone().ok_or(Error::MissingId { kind })
    }
}

/// Lifecycle contract for a managed object kind.
#[async_trait]
pub trait Resource: Send + Sync {
    /// The declared field set.
    type Spec: Default + Send + Sync;

    /// Human-readable kind, used in logs and errors.
    fn kind(&self) -> &'static str;

    /// Create the remote object, set the identifier, then read it back.
    async fn create(&self, client: &dyn RemoteClient, record: &mut Record<Self::Spec>)
        -> Result<()>;

    /// Refresh observed fields. Clears the identifier if the object is gone.
    async fn read(&self, client: &dyn RemoteClient, record: &mut Record<Self::Spec>) -> Result<()>;

    /// Check whether the remote object still exists.
    async fn exists(
        &self,
        _client: &dyn RemoteClient,
        _record: &mut Record<Self::Spec>,
    ) -> Result<bool> {
        Err(Error::Unsupported {
            kind: self.kind(),
            operation: "exists",
        })
    }

    /// Push the declared fields to the remote object in place.
    async fn update(
        &self,
        _client: &dyn RemoteClient,
        _record: &mut Record<Self::Spec>,
    ) -> Result<()> {
        Err(Error::Unsupported {
            kind: self.kind(),
            operation: "update",
        })
    }

    /// Remove the remote object and clear the identifier.
    async fn delete(&self, client: &dyn RemoteClient, record: &mut Record<Self::Spec>)
        -> Result<()>;

    /// Adopt an existing remote object. No remote call is made; the next
    /// read validates the identifier.
    fn import(&self, id: &str) -> Vec<Record<Self::Spec>> {
        vec![Record::with_id(id, Self::Spec::default())]
    }
}
