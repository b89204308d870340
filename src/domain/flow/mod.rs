pub mod flow_entry;
pub mod flow_registry;
pub mod rt_properties;
