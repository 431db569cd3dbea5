//! The commands users can address, and the registry that wires them up.
//!
//! Everything a command depends on — configuration and service handles — is
//! threaded in here, once, at startup. The registry is read-only afterwards.

pub mod create_project;
pub mod create_team;
pub mod link_repository;
pub mod provision_prod;

pub use create_project::CreateProject;
pub use create_team::CreateTeam;
pub use link_repository::LinkRepository;
pub use provision_prod::ProvisionProd;

use crate::directory::OpsServices;
use opsdeck_core::command::Registry;
use opsdeck_core::config::OpsConfig;
use opsdeck_core::Result;
use std::sync::Arc;

pub fn registry(config: &OpsConfig, services: &OpsServices) -> Result<Registry> {
    let mut registry = Registry::new();
    registry.register(Arc::new(CreateTeam::new(config, services.clone())?))?;
    registry.register(Arc::new(CreateProject::new(config, services.clone())?))?;
    registry.register(Arc::new(ProvisionProd::new(config, services.clone())))?;
    registry.register(Arc::new(LinkRepository::new(config, services.clone())))?;
    Ok(registry)
}
