//! 애플리케이션 계층이 의존하는 포트(추상 인터페이스) 모음.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::demo::NodeSelector;
use crate::domain::query::QueryOutcome;
use crate::domain::session::SessionOptions;
use crate::infrastructure::config::Config;

/// 설정 로딩/점검을 담당하는 저장소 포트.
pub trait ConfigRepository: Send + Sync {
    fn load(&self) -> Result<Config>;
    fn inspect_pretty_json(&self) -> Result<String>;
}

/// 입력 프롬프트 종류. 이어지는 줄에는 연속 프롬프트를 쓴다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Start,
    Continue,
}

/// 한 번의 줄 읽기 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRead {
    Line(String),
    /// 사용자가 입력을 중단했다(Ctrl-C)
    Interrupted,
    Eof,
}

/// 한 줄씩 입력을 공급하는 포트. 대화형 입력에서는 무기한 대기할 수 있다.
pub trait LineSource {
    fn read_line(&mut self, prompt: PromptKind) -> Result<LineRead>;
}

/// 완성된 SQL 문장을 서버에 전달하는 실행 싱크 포트.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<QueryOutcome>;
    /// 연결 대상을 다시 설정한다. 데이터베이스를 주면 전환한다.
    async fn reconnect(&self, database: Option<&str>) -> Result<String>;
    fn describe(&self) -> String;
}

/// 데모 클러스터 노드 수명주기 관리자 포트(동기 호출).
pub trait DemoSupervisor: Send + Sync {
    fn shutdown(&self, node: NodeSelector) -> Result<String>;
    fn restart(&self, node: NodeSelector) -> Result<String>;
    fn decommission(&self, node: NodeSelector) -> Result<String>;
    fn recommission(&self, node: NodeSelector) -> Result<String>;
    fn list(&self) -> Result<String>;
}

/// 콘솔 출력 추상화 포트.
pub trait Reporter: Send + Sync {
    fn outcome(&self, outcome: &QueryOutcome);
    fn echo(&self, sql: &str);
    fn notice(&self, message: &str);
    fn error(&self, message: &str);
    fn timing(&self, elapsed: Duration);
    fn help(&self, escape: char);
    fn options(&self, options: &SessionOptions);
}
