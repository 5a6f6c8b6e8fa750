pub mod action_log;
pub mod campaign;
pub mod map;
