pub mod admission_controller;
pub mod controller_handle;
pub mod controller_message;
pub mod multicast_groups;
pub mod outcome;
pub mod request;
