//! 드라이버 공개 API와 실제 바깥 루프로 쉘 세션 흐름을 검증하는 통합 테스트.

use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;

use sqlsh::application::driver::ShellDriver;
use sqlsh::application::ports::{DemoSupervisor, PromptKind, Reporter, SqlExecutor};
use sqlsh::domain::demo::NodeSelector;
use sqlsh::domain::lexer::last_lexical_token;
use sqlsh::domain::query::QueryOutcome;
use sqlsh::domain::session::{SessionOptions, ShellConfig};
use sqlsh::domain::state::{CliState, ShellAction, ShellError};
use sqlsh::infrastructure::adapters::LocalDemoCluster;
use sqlsh::interface::cli::{ScriptLineSource, ShellPorts, run_shell};

#[derive(Default)]
struct RecordingSupervisor {
    calls: Mutex<Vec<String>>,
}

impl RecordingSupervisor {
    fn record(&self, verb: &str, node: NodeSelector) -> Result<String> {
        self.calls.lock().unwrap().push(format!("{verb} {node}"));
        Ok(format!("{verb} {node} ok"))
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl DemoSupervisor for RecordingSupervisor {
    fn shutdown(&self, node: NodeSelector) -> Result<String> {
        self.record("shutdown", node)
    }

    fn restart(&self, node: NodeSelector) -> Result<String> {
        self.record("restart", node)
    }

    fn decommission(&self, node: NodeSelector) -> Result<String> {
        self.record("decommission", node)
    }

    fn recommission(&self, node: NodeSelector) -> Result<String> {
        self.record("recommission", node)
    }

    fn list(&self) -> Result<String> {
        self.calls.lock().unwrap().push("ls".to_string());
        Ok("node 1".to_string())
    }
}

/// 받은 SQL을 기록하고 `failing` 문장에만 실패하는 실행기.
#[derive(Default)]
struct FakeExecutor {
    failing: Option<&'static str>,
    refuse_reconnect: bool,
    executed: Mutex<Vec<String>>,
}

impl FakeExecutor {
    fn failing_on(sql: &'static str) -> Self {
        Self {
            failing: Some(sql),
            ..Self::default()
        }
    }

    fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SqlExecutor for FakeExecutor {
    async fn execute(&self, sql: &str) -> Result<QueryOutcome> {
        self.executed.lock().unwrap().push(sql.to_string());
        if self.failing == Some(sql) {
            return Err(anyhow!("boom"));
        }
        Ok(QueryOutcome::default())
    }

    async fn reconnect(&self, database: Option<&str>) -> Result<String> {
        if self.refuse_reconnect {
            bail!("connection refused");
        }
        Ok(format!("connected to {}", database.unwrap_or("default")))
    }

    fn describe(&self) -> String {
        "fake".to_string()
    }
}

#[derive(Default)]
struct RecordingReporter {
    notices: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingReporter {
    fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }

    fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn outcome(&self, _: &QueryOutcome) {}

    fn echo(&self, _: &str) {}

    fn notice(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn timing(&self, _: Duration) {}

    fn help(&self, _: char) {}

    fn options(&self, _: &SessionOptions) {}
}

fn demo_config(interactive: bool) -> ShellConfig {
    ShellConfig {
        demo: true,
        ..ShellConfig::for_input(interactive)
    }
}

/// 스크립트 줄을 실제 바깥 루프로 돌리고 종료 코드를 반환한다.
async fn run_script<const N: usize>(
    executor: &FakeExecutor,
    reporter: &RecordingReporter,
    supervisor: Option<&dyn DemoSupervisor>,
    config: ShellConfig,
    lines: [&str; N],
) -> i32 {
    let ports = ShellPorts {
        executor,
        reporter,
        supervisor,
    };
    let mut source = ScriptLineSource::new(lines);
    run_shell(ports, config, &mut source).await.unwrap()
}

#[test]
fn classifier_concrete_scenarios() {
    let cases = [
        ("; /* comment */", true, true),
        ("SELECT ''''; SET;", true, true),
        ("  -- hello", false, false),
        ("select 'abc", false, true),
        (r"SELECT e'\xaa';", true, true),
    ];
    for (input, end, non_empty) in cases {
        let scan = last_lexical_token(input);
        assert_eq!(scan.is_end(), end, "{input}");
        assert_eq!(scan.non_empty, non_empty, "{input}");
    }
}

#[test]
fn demo_commands_reach_supervisor_only_when_valid() {
    let supervisor = RecordingSupervisor::default();
    let mut driver = ShellDriver::new(demo_config(true), Some(&supervisor));

    let t = driver.process_line(r"\demo shutdown 2");
    assert_eq!(t.state, CliState::StartLine);
    assert_eq!(
        t.action(),
        Some(&ShellAction::Notice("shutdown node 2 ok".to_string()))
    );

    for line in [
        r"\demo shutdown *",
        r"\demo decommission *",
        r"\demo restart abc",
        r"\demo restart 0",
        r"\demo ls 1",
        r"\demo reboot 1",
    ] {
        let t = driver.process_line(line);
        assert!(
            matches!(t.error(), Some(ShellError::InvalidSyntax(_))),
            "{line}"
        );
        assert_eq!(t.state, CliState::StartLine, "{line}");
    }

    driver.process_line(r"\demo restart *");
    driver.process_line(r"\demo ls");
    assert_eq!(
        supervisor.calls(),
        vec!["shutdown node 2", "restart all nodes", "ls"]
    );
}

#[test]
fn demo_command_keeps_partial_statement() {
    let supervisor = RecordingSupervisor::default();
    let mut driver = ShellDriver::new(demo_config(true), Some(&supervisor));

    assert_eq!(driver.process_line("SELECT *").state, CliState::ContinueLine);
    let t = driver.process_line(r"\demo recommission 1");
    assert_eq!(t.state, CliState::ContinueLine);
    assert!(t.action().is_some());

    let t = driver.process_line("FROM t;");
    assert_eq!(t.state, CliState::RunStatement);
    assert_eq!(driver.statement(), "SELECT *\nFROM t;");
}

#[test]
fn supervisor_is_ignored_outside_demo_mode() {
    let supervisor = RecordingSupervisor::default();
    let mut driver = ShellDriver::new(ShellConfig::for_input(true), Some(&supervisor));

    let t = driver.process_line(r"\demo ls");
    assert!(matches!(t.error(), Some(ShellError::InvalidSyntax(_))));
    assert!(supervisor.calls().is_empty());
}

#[test]
fn local_cluster_failures_surface_as_execution_errors() {
    let cluster = LocalDemoCluster::new(3);
    let mut driver = ShellDriver::new(demo_config(true), Some(&cluster));

    assert!(driver.process_line(r"\demo shutdown 1").error().is_none());

    let t = driver.process_line(r"\demo shutdown 1");
    assert_eq!(t.state, CliState::StartLine);
    assert_eq!(
        t.error(),
        Some(&ShellError::Execution("node 1 is already stopped".to_string()))
    );

    let t = driver.process_line(r"\demo restart *");
    assert_eq!(
        t.action(),
        Some(&ShellAction::Notice("node 1 restart done".to_string()))
    );
}

#[tokio::test]
async fn scripted_session_runs_statements_and_trailing_input() {
    let executor = FakeExecutor::default();
    let reporter = RecordingReporter::default();
    let code = run_script(
        &executor,
        &reporter,
        None,
        ShellConfig::for_input(false),
        [
            "SELECT 1;",
            "-- comment only",
            r"\dt",
            "SELECT 'a;b'\n  FROM t;",
            "SELECT 2",
        ],
    )
    .await;

    assert_eq!(code, 0);
    assert_eq!(
        executor.executed(),
        vec![
            "SELECT 1;",
            "SHOW TABLES",
            "SELECT 'a;b'\n  FROM t;",
            "SELECT 2",
        ]
    );
    assert!(reporter.errors().is_empty());
}

#[tokio::test]
async fn scripted_session_stops_on_first_error_with_errexit() {
    let executor = FakeExecutor::failing_on("SELECT bad;");
    let reporter = RecordingReporter::default();
    let code = run_script(
        &executor,
        &reporter,
        None,
        ShellConfig::for_input(false),
        ["SELECT 1;", "SELECT bad;", "SELECT 3;"],
    )
    .await;

    assert_eq!(code, 1);
    assert_eq!(executor.executed(), vec!["SELECT 1;", "SELECT bad;"]);
    let errors = reporter.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("boom"), "{errors:?}");
}

#[tokio::test]
async fn scripted_session_stops_on_invalid_meta_command_with_errexit() {
    let executor = FakeExecutor::default();
    let reporter = RecordingReporter::default();
    let code = run_script(
        &executor,
        &reporter,
        None,
        ShellConfig::for_input(false),
        [r"\dz", "SELECT 1;"],
    )
    .await;

    assert_eq!(code, 1);
    assert!(executor.executed().is_empty());
    assert_eq!(reporter.errors().len(), 1);
}

#[tokio::test]
async fn scripted_session_continues_without_errexit() {
    let executor = FakeExecutor::failing_on("SELECT bad;");
    let reporter = RecordingReporter::default();
    let code = run_script(
        &executor,
        &reporter,
        None,
        ShellConfig::for_input(false),
        [r"\unset errexit", "SELECT bad;", r"\dz", "SELECT 3;"],
    )
    .await;

    assert_eq!(code, 0);
    assert_eq!(executor.executed(), vec!["SELECT bad;", "SELECT 3;"]);
    assert_eq!(reporter.errors().len(), 2);
}

#[tokio::test]
async fn failed_reconnect_stops_script_with_errexit() {
    let executor = FakeExecutor {
        refuse_reconnect: true,
        ..FakeExecutor::default()
    };
    let reporter = RecordingReporter::default();
    let code = run_script(
        &executor,
        &reporter,
        None,
        ShellConfig::for_input(false),
        [r"\c movr", "SELECT 1;"],
    )
    .await;

    assert_eq!(code, 1);
    assert!(executor.executed().is_empty());
    let errors = reporter.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("connection refused"), "{errors:?}");
}

#[tokio::test]
async fn reconnect_and_demo_notices_reach_reporter() {
    let executor = FakeExecutor::default();
    let reporter = RecordingReporter::default();
    let cluster = LocalDemoCluster::new(3);
    let code = run_script(
        &executor,
        &reporter,
        Some(&cluster),
        demo_config(false),
        [r"\c movr", r"\demo shutdown 2", "SELECT 1;"],
    )
    .await;

    assert_eq!(code, 0);
    assert_eq!(
        reporter.notices(),
        vec!["connected to movr", "node 2 shutdown done"]
    );
    assert_eq!(executor.executed(), vec!["SELECT 1;"]);
}

#[tokio::test]
async fn interactive_session_recovers_from_errors_and_drops_leftover() {
    let executor = FakeExecutor::failing_on("SELECT bad;");
    let reporter = RecordingReporter::default();
    let code = run_script(
        &executor,
        &reporter,
        None,
        ShellConfig::for_input(true),
        ["SELECT bad;", r"\dz", "SELECT 2;", "SELECT 3"],
    )
    .await;

    assert_eq!(code, 0);
    assert_eq!(executor.executed(), vec!["SELECT bad;", "SELECT 2;"]);
    assert_eq!(reporter.errors().len(), 2);
}

#[test]
fn interactive_prompt_follows_continuation() {
    let mut driver = ShellDriver::new(ShellConfig::for_input(true), None);
    assert_eq!(driver.prompt_kind(), PromptKind::Start);

    driver.process_line("SELECT");
    assert_eq!(driver.prompt_kind(), PromptKind::Continue);

    let t = driver.cancel();
    assert_eq!(t.error(), Some(&ShellError::Cancelled));
    assert_eq!(driver.prompt_kind(), PromptKind::Start);
    assert_eq!(driver.pending_input(), "");
}
