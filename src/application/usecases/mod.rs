//! 쉘 유스케이스 모음.

pub mod demo_node;
pub mod inspect_config;
pub mod reconnect;
pub mod run_statement;
