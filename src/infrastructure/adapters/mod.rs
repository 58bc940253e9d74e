//! 애플리케이션 포트를 실제 인프라 구현체로 연결하는 어댑터 계층.

mod config_repository;
mod demo_cluster;
mod http_executor;
mod reporter;

pub use config_repository::JsonConfigRepository;
pub use demo_cluster::LocalDemoCluster;
pub use http_executor::HttpSqlExecutor;
pub use reporter::{ConsoleReporter, format_help, format_outcome, render_table};
