pub mod dispatch_config;
pub mod endpoint_resolver;
pub mod flow_installer;
pub mod rest_flow_installer;
pub mod retry;
pub mod topology_source;
