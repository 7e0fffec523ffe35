//! ltm-sync: reconciles declared BIG-IP LTM objects with a live appliance.
//!
//! - `reconciler`: per-kind lifecycle managers (nodes, FastL4 profiles)
//! - `clients`: the appliance client trait and its implementations
//! - `validation`: identity field checks run before any remote call

pub mod clients;
pub mod config;
pub mod error;
pub mod reconciler;
pub mod validation;

pub use error::{Error, Result};
