use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;

use crate::domain::analysis::analysis_config::AnalysisConfig;
use crate::domain::collaborator::dispatch_config::DispatchConfig;
use crate::domain::topology::topology_graph::TopologySnapshot;
use crate::domain::utils::id::{EndpointId, NodeId};
use crate::error::{Error, Result};
use crate::loader::parser::parse_json_file;

/// Where the controller learns the network from.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum TopologyConfigDto {
    Rest {
        #[serde(rename = "restUrl")]
        rest_url: String,
    },
    Static(TopologySnapshot),
}

impl Default for TopologyConfigDto {
    fn default() -> Self {
        TopologyConfigDto::Static(TopologySnapshot::default())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct InstallerConfigDto {
    /// Base URL of the switch controller's REST interface. Without it,
    /// instructions are only logged.
    pub rest_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerConfig {
    pub listen_addr: String,
    pub analysis: AnalysisConfig,
    pub dispatch: DispatchConfig,
    pub topology: TopologyConfigDto,
    pub installer: InstallerConfigDto,
    /// Switch every known endpoint is attached to.
    pub endpoints: BTreeMap<EndpointId, NodeId>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            analysis: AnalysisConfig::default(),
            dispatch: DispatchConfig::default(),
            topology: TopologyConfigDto::default(),
            installer: InstallerConfigDto::default(),
            endpoints: BTreeMap::new(),
        }
    }
}

impl ControllerConfig {
    /// Reads and validates the configuration file at `file_path`.
    pub fn load(file_path: &str) -> Result<Self> {
        let config: ControllerConfig = parse_json_file(file_path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.listen_addr
            .parse::<SocketAddr>()
            .map_err(|e| Error::InvalidConfig(format!("listenAddr '{}' is not a socket address: {}", self.listen_addr, e)))?;

        self.analysis.validate()?;
        self.dispatch.validate()?;

        if let TopologyConfigDto::Static(snapshot) = &self.topology {
            if let Some(link) = snapshot.links.iter().find(|link| !link.weight.is_finite() || link.weight < 0.0) {
                return Err(Error::InvalidConfig(format!("link {} -> {} has invalid weight {}", link.src, link.dst, link.weight)));
            }
        }

        Ok(())
    }
}
