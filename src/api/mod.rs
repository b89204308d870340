pub mod admission_dto;
pub mod config_dto;
pub mod http;
