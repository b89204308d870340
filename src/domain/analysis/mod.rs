pub mod analysis_config;
pub mod busy_period;
pub mod schedule_analyzer;
pub mod trajectory;
