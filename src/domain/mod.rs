pub mod admission;
pub mod analysis;
pub mod collaborator;
pub mod flow;
pub mod topology;
pub mod utils;
