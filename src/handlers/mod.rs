pub mod compile;
pub mod config_handler;
pub mod inspect;
pub mod record;
