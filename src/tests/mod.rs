pub mod common;

mod config_validation;
