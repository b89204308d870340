use std::sync::Arc;

use crate::api::config_dto::{ControllerConfig, TopologyConfigDto};
use crate::domain::admission::admission_controller::AdmissionController;
use crate::domain::admission::controller_handle::ControllerHandle;
use crate::domain::collaborator::endpoint_resolver::StaticEndpointResolver;
use crate::domain::collaborator::flow_installer::{FlowInstaller, LoggingFlowInstaller};
use crate::domain::collaborator::rest_flow_installer::RestFlowInstaller;
use crate::domain::collaborator::topology_source::{RestTopologySource, StaticTopologySource, TopologySource};
use crate::error::Result;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Wires the admission controller and its collaborators as described by `config`.
pub fn build_controller(config: &ControllerConfig) -> AdmissionController {
    let topology_source: Arc<dyn TopologySource> = match &config.topology {
        TopologyConfigDto::Rest { rest_url } => {
            log::info!("Topology is discovered through {}.", rest_url);
            Arc::new(RestTopologySource::new(rest_url.clone()))
        }
        TopologyConfigDto::Static(snapshot) => {
            log::info!("Static topology with {} links.", snapshot.links.len());
            Arc::new(StaticTopologySource::new(snapshot.clone()))
        }
    };

    let installer: Arc<dyn FlowInstaller> = match &config.installer.rest_url {
        Some(rest_url) => {
            log::info!("Flow rules are pushed to {}.", rest_url);
            Arc::new(RestFlowInstaller::new(rest_url.clone()))
        }
        None => {
            log::warn!("No installer configured, flow rules are only logged.");
            Arc::new(LoggingFlowInstaller::new())
        }
    };

    let resolver = StaticEndpointResolver::new(config.endpoints.clone());
    log::info!("{} endpoints known.", resolver.len());

    AdmissionController::new(config.analysis.clone(), config.dispatch.clone(), topology_source, installer, Arc::new(resolver))
}

/// Loads the configuration at `file_path` and starts the controller task.
/// Must be called inside a tokio runtime.
pub fn start_controller(file_path: &str) -> Result<(ControllerConfig, ControllerHandle)> {
    let config = ControllerConfig::load(file_path)?;
    log::info!("Configuration loaded from '{}'.", file_path);

    let handle = ControllerHandle::spawn(build_controller(&config));
    Ok((config, handle))
}
