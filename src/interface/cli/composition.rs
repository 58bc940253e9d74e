//! 애플리케이션 조립(composition root) 모듈.

use anyhow::Result;

use crate::application::ports::{DemoSupervisor, SqlExecutor};
use crate::application::usecases::inspect_config::InspectConfigUseCase;
use crate::infrastructure::adapters::{
    ConsoleReporter, HttpSqlExecutor, JsonConfigRepository, LocalDemoCluster,
};
use crate::infrastructure::config::Config;
use crate::interface::cli::repl::ShellPorts;

/// 실행 시점 의존성을 한 곳에서 조립하는 컨테이너.
pub struct AppComposition {
    config_repo: JsonConfigRepository,
    executor: HttpSqlExecutor,
    demo_cluster: Option<LocalDemoCluster>,
    reporter: ConsoleReporter,
}

impl AppComposition {
    /// 데모 노드 수가 주어지면 로컬 데모 클러스터를 함께 띄운다.
    pub fn new(config: &Config, demo_nodes: Option<u32>) -> Result<Self> {
        let executor = HttpSqlExecutor::new(
            &config.url(),
            config.database(),
            config.resolve_token(),
            config.timeout_ms(),
        )?;

        Ok(Self {
            config_repo: JsonConfigRepository,
            executor,
            demo_cluster: demo_nodes.map(LocalDemoCluster::new),
            reporter: ConsoleReporter::new(),
        })
    }

    /// 설정 점검 유스케이스를 생성한다.
    pub fn inspect_config_usecase(&self) -> InspectConfigUseCase<'_> {
        InspectConfigUseCase {
            config_repo: &self.config_repo,
        }
    }

    /// 바깥 루프에 넘길 포트 묶음을 만든다.
    pub fn shell_ports(&self) -> ShellPorts<'_> {
        ShellPorts {
            executor: &self.executor,
            reporter: &self.reporter,
            supervisor: self
                .demo_cluster
                .as_ref()
                .map(|cluster| cluster as &dyn DemoSupervisor),
        }
    }

    pub fn target_description(&self) -> String {
        self.executor.describe()
    }
}
