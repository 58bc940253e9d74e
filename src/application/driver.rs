//! REPL 상태 머신 드라이버.
//!
//! 입력 한 줄마다 메타 명령 디스패처 또는 문장 누산기에 위임하고 다음 상태를 돌려준다.
//! 오류는 항상 `Transition`의 값으로 전달되며, 보고/복귀 여부는 바깥 루프가 결정한다.

use tracing::{debug, warn};

use crate::application::ports::{DemoSupervisor, PromptKind};
use crate::application::usecases::demo_node::DemoNodeUseCase;
use crate::domain::meta_command::{self, Directive};
use crate::domain::session::{SessionOptions, ShellConfig};
use crate::domain::state::{CliState, ShellAction, ShellError, Transition};
use crate::domain::statement::{Accumulated, StatementAccumulator};

pub struct ShellDriver<'a> {
    config: ShellConfig,
    supervisor: Option<&'a dyn DemoSupervisor>,
    options: SessionOptions,
    state: CliState,
    accumulator: StatementAccumulator,
    last_input_line: String,
    statement: String,
}

impl<'a> ShellDriver<'a> {
    /// 데모 관리자는 `config.demo`가 켜진 세션에서만 사용한다.
    pub fn new(config: ShellConfig, supervisor: Option<&'a dyn DemoSupervisor>) -> Self {
        let options = config.options;
        let supervisor = supervisor.filter(|_| config.demo);
        Self {
            config,
            supervisor,
            options,
            state: CliState::StartLine,
            accumulator: StatementAccumulator::new(),
            last_input_line: String::new(),
            statement: String::new(),
        }
    }

    pub fn state(&self) -> CliState {
        self.state
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// `RunStatement` 상태에서 실행할 최종 문장.
    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn last_input_line(&self) -> &str {
        &self.last_input_line
    }

    /// 아직 완성되지 않은 누산 버퍼 내용.
    pub fn pending_input(&self) -> String {
        self.accumulator.text()
    }

    pub fn prompt_kind(&self) -> PromptKind {
        match self.state {
            CliState::ContinueLine => PromptKind::Continue,
            _ => PromptKind::Start,
        }
    }

    /// 입력 한 줄을 처리하고 다음 상태를 반환한다.
    pub fn process_line(&mut self, line: &str) -> Transition {
        self.last_input_line = line.to_string();
        if self.state == CliState::Stop {
            return Transition::to(CliState::Stop);
        }

        let transition = if meta_command::is_meta_command(line, self.config.escape) {
            self.handle_meta_command(line)
        } else {
            self.handle_sql_line(line)
        };
        self.apply(transition)
    }

    /// 실행 싱크 결과를 반영한다. 실행 오류는 그대로 전달한다.
    pub fn complete_statement(&mut self, result: Result<(), ShellError>) -> Transition {
        self.statement.clear();
        match result {
            Ok(()) => self.apply(Transition::to(CliState::StartLine)),
            Err(err) => self.apply(Transition::failed(CliState::Error, err)),
        }
    }

    /// 바깥 루프의 입력 중단(Ctrl-C) 처리: 버퍼를 버리고 처음 상태로 돌아간다.
    pub fn cancel(&mut self) -> Transition {
        self.accumulator.clear();
        self.statement.clear();
        self.apply(Transition::failed(CliState::StartLine, ShellError::Cancelled))
    }

    /// `Error` 상태에서 새 입력을 받을 수 있도록 되돌린다.
    pub fn recover(&mut self) -> Transition {
        self.accumulator.clear();
        self.statement.clear();
        self.apply(Transition::to(CliState::StartLine))
    }

    /// 복구하지 않을 오류를 기록한다.
    pub fn fail(&mut self, error: ShellError) -> Transition {
        self.apply(Transition::failed(CliState::Error, error))
    }

    /// 입력 끝(EOF) 처리.
    /// 비대화형 입력은 세미콜론 없이 남은 문장도 실행한다.
    pub fn end_of_input(&mut self) -> Transition {
        if !self.config.interactive && self.accumulator.has_content() {
            self.statement = self.accumulator.take();
            return self.apply(Transition::to(CliState::RunStatement));
        }

        if self.accumulator.has_content() {
            warn!(
                lines = self.accumulator.line_count(),
                "discarding incomplete statement at end of input"
            );
        }
        self.accumulator.clear();
        self.apply(Transition::to(CliState::Stop))
    }

    /// 종단 상태를 프로세스 종료 코드로 변환한다.
    pub fn exit_code(&self) -> i32 {
        match self.state {
            CliState::Error => 1,
            _ => 0,
        }
    }

    fn apply(&mut self, transition: Transition) -> Transition {
        debug!(
            from = ?self.state,
            to = ?transition.state,
            error = ?transition.error(),
            "transition"
        );
        self.state = transition.state;
        transition
    }

    /// 명령을 읽기 전의 상태. 문법 오류 시 이 상태에 머문다.
    /// 복구 전의 `Error`는 그대로 유지한다.
    fn resting_state(&self) -> CliState {
        if self.state == CliState::Error {
            CliState::Error
        } else if self.accumulator.is_empty() {
            CliState::StartLine
        } else {
            CliState::ContinueLine
        }
    }

    fn handle_meta_command(&mut self, line: &str) -> Transition {
        let prior = self.resting_state();
        let directive = match meta_command::dispatch(line, self.config.escape) {
            Ok(directive) => directive,
            Err(err) => return Transition::failed(prior, err),
        };

        match directive {
            Directive::Sql(sql) => {
                // 변환된 SQL은 누산 버퍼를 대체하고 분류기를 거치지 않는다.
                self.accumulator.clear();
                self.statement = sql;
                Transition::to(CliState::RunStatement)
            }
            Directive::Quit => Transition::to(CliState::Stop),
            Directive::Action(action) => Transition::with_action(prior, action),
            Directive::Demo(args) => {
                let usecase = DemoNodeUseCase {
                    supervisor: self.supervisor,
                };
                match usecase.execute(args.as_slice()) {
                    Ok(message) => Transition::with_action(prior, ShellAction::Notice(message)),
                    Err(err) => Transition::failed(prior, err),
                }
            }
            Directive::Set { name, value } => match self.options.set(&name, value.as_deref()) {
                Ok(()) => Transition::to(prior),
                Err(err) => Transition::failed(prior, err),
            },
            Directive::Unset(name) => match self.options.unset(&name) {
                Ok(()) => Transition::to(prior),
                Err(err) => Transition::failed(prior, err),
            },
        }
    }

    fn handle_sql_line(&mut self, line: &str) -> Transition {
        if self.accumulator.is_empty() {
            if line.trim().is_empty() {
                return Transition::to(CliState::StartLine);
            }
            if is_exit_keyword(line) {
                return Transition::to(CliState::Stop);
            }
        }

        match self.accumulator.push_line(line) {
            Accumulated::Ready(statement) => {
                self.statement = statement;
                Transition::to(CliState::RunStatement)
            }
            Accumulated::Continue => Transition::to(CliState::ContinueLine),
        }
    }
}

/// psql 호환: 빈 버퍼에서 `exit`/`quit`만 입력하면 종료한다.
fn is_exit_keyword(line: &str) -> bool {
    let word = line.trim().trim_end_matches(';').trim_end();
    word.eq_ignore_ascii_case("exit") || word.eq_ignore_ascii_case("quit")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> ShellDriver<'static> {
        ShellDriver::new(ShellConfig::default(), None)
    }

    #[test]
    fn test_sql_alias_commands_run_immediately() {
        let cases = [
            (r"\l", "SHOW DATABASES"),
            (r"\dt", "SHOW TABLES"),
            (r"\dT", "SHOW TYPES"),
            (r"\du", "SHOW USERS"),
            (r"\d mytable", "SHOW COLUMNS FROM mytable"),
            (r"\d", "SHOW TABLES"),
        ];

        for (line, want) in cases {
            let mut d = driver();
            let t = d.process_line(line);
            assert_eq!(t.state, CliState::RunStatement, "{line}");
            assert_eq!(t.outcome, Ok(None));
            assert_eq!(d.statement(), want);
        }
    }

    #[test]
    fn test_invalid_meta_commands_keep_state() {
        for line in [r"\d goodarg badarg", r"\dz"] {
            let mut d = driver();
            let t = d.process_line(line);
            assert_eq!(t.state, CliState::StartLine, "{line}");
            assert!(matches!(t.error(), Some(ShellError::InvalidSyntax(_))));
        }
    }

    #[test]
    fn test_invalid_meta_command_preserves_buffer() {
        let mut d = driver();
        assert_eq!(d.process_line("SELECT *").state, CliState::ContinueLine);

        let t = d.process_line(r"\dz");
        assert_eq!(t.state, CliState::ContinueLine);
        assert!(matches!(t.error(), Some(ShellError::InvalidSyntax(_))));
        assert_eq!(d.pending_input(), "SELECT *");

        let t = d.process_line("FROM t;");
        assert_eq!(t.state, CliState::RunStatement);
        assert_eq!(d.statement(), "SELECT *\nFROM t;");
    }

    #[test]
    fn test_sql_alias_replaces_partial_buffer() {
        let mut d = driver();
        d.process_line("SELECT");
        assert_eq!(d.process_line(r"\l").state, CliState::RunStatement);
        assert_eq!(d.statement(), "SHOW DATABASES");
        assert_eq!(d.pending_input(), "");
    }

    #[test]
    fn test_multi_line_statement_flow() {
        let mut d = driver();
        assert_eq!(d.prompt_kind(), PromptKind::Start);
        assert_eq!(d.process_line("-- comment only").state, CliState::ContinueLine);
        assert_eq!(d.prompt_kind(), PromptKind::Continue);
        assert_eq!(d.process_line("SELECT 'a;").state, CliState::ContinueLine);
        assert_eq!(d.process_line("b';").state, CliState::RunStatement);
        assert_eq!(d.statement(), "-- comment only\nSELECT 'a;\nb';");

        assert_eq!(d.complete_statement(Ok(())).state, CliState::StartLine);
        assert_eq!(d.statement(), "");
    }

    #[test]
    fn test_blank_line_and_exit_keywords() {
        let mut d = driver();
        assert_eq!(d.process_line("   ").state, CliState::StartLine);
        assert_eq!(d.process_line("quit").state, CliState::Stop);
        assert_eq!(d.exit_code(), 0);

        let mut d = driver();
        d.process_line("SELECT");
        // 문장 중간의 `exit`는 SQL 텍스트로 취급한다.
        assert_eq!(d.process_line("exit").state, CliState::ContinueLine);
    }

    #[test]
    fn test_quit_and_help() {
        let mut d = driver();
        assert_eq!(
            d.process_line(r"\?"),
            Transition::with_action(CliState::StartLine, ShellAction::Help)
        );
        assert_eq!(d.process_line(r"\q").state, CliState::Stop);
        assert_eq!(d.process_line("SELECT 1;").state, CliState::Stop);
    }

    #[test]
    fn test_set_and_unset_options() {
        let mut d = driver();
        assert_eq!(d.process_line(r"\set echo").outcome, Ok(None));
        assert!(d.options().echo);
        assert_eq!(d.process_line(r"\unset echo").outcome, Ok(None));
        assert!(!d.options().echo);

        let t = d.process_line(r"\set nosuch");
        assert!(matches!(t.error(), Some(ShellError::InvalidSyntax(_))));
        assert_eq!(t.state, CliState::StartLine);
    }

    #[test]
    fn test_demo_command_outside_demo_mode() {
        let mut d = driver();
        let t = d.process_line(r"\demo shutdown *");
        assert!(matches!(t.error(), Some(ShellError::InvalidSyntax(_))));
        assert_eq!(t.state, CliState::StartLine);
    }

    #[test]
    fn test_cancel_discards_buffer() {
        let mut d = driver();
        d.process_line("SELECT 1");
        let t = d.cancel();
        assert_eq!(t, Transition::failed(CliState::StartLine, ShellError::Cancelled));
        assert_eq!(d.pending_input(), "");
    }

    #[test]
    fn test_execution_error_and_recovery() {
        let mut d = driver();
        d.process_line("SELECT x;");
        let t = d.complete_statement(Err(ShellError::execution("column \"x\" does not exist")));
        assert_eq!(t.state, CliState::Error);
        assert_eq!(
            t.error(),
            Some(&ShellError::Execution("column \"x\" does not exist".to_string()))
        );
        assert_eq!(d.exit_code(), 1);

        assert_eq!(d.recover().state, CliState::StartLine);
        assert_eq!(d.exit_code(), 0);
    }

    #[test]
    fn test_invalid_meta_command_keeps_error_state() {
        let mut d = driver();
        d.process_line("SELECT x;");
        d.complete_statement(Err(ShellError::execution("boom")));

        let t = d.process_line(r"\dz");
        assert_eq!(t.state, CliState::Error);
        assert!(matches!(t.error(), Some(ShellError::InvalidSyntax(_))));
        assert_eq!(d.state(), CliState::Error);
        assert_eq!(d.exit_code(), 1);
    }

    #[test]
    fn test_end_of_input_runs_trailing_statement_when_scripted() {
        let mut d = ShellDriver::new(ShellConfig::for_input(false), None);
        d.process_line("SELECT 1");
        let t = d.end_of_input();
        assert_eq!(t.state, CliState::RunStatement);
        assert_eq!(d.statement(), "SELECT 1");
        d.complete_statement(Ok(()));
        assert_eq!(d.end_of_input().state, CliState::Stop);
    }

    #[test]
    fn test_end_of_input_discards_when_interactive() {
        let mut d = driver();
        d.process_line("SELECT 1");
        assert_eq!(d.end_of_input().state, CliState::Stop);
        assert_eq!(d.pending_input(), "");
    }
}
