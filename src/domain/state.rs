//! REPL 상태, 전이 결과, 오류 분류.

use thiserror::Error;

/// REPL 상태 머신의 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliState {
    StartLine,
    ContinueLine,
    RunStatement,
    /// 정상 종료(종단 상태)
    Stop,
    /// 명령 단위 실패. 바깥 루프가 `StartLine`으로 복귀시킬 수 있다.
    Error,
}

/// 전이 중 감지된 오류. 값으로만 전달되며 프로세스를 중단시키지 않는다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    #[error("invalid syntax: {0}")]
    InvalidSyntax(String),
    #[error("{0}")]
    Execution(String),
    #[error("input cancelled")]
    Cancelled,
}

impl ShellError {
    pub fn invalid_syntax(msg: impl Into<String>) -> Self {
        ShellError::InvalidSyntax(msg.into())
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        ShellError::Execution(msg.into())
    }
}

/// SQL 실행 싱크를 거치지 않는 내부 동작.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellAction {
    Help,
    ShowOptions,
    Reconnect { database: Option<String> },
    Notice(String),
}

/// 한 번의 전이 결과. 다음 상태와 성공/실패를 서로 독립적으로 담는다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: CliState,
    pub outcome: Result<Option<ShellAction>, ShellError>,
}

impl Transition {
    pub fn to(state: CliState) -> Self {
        Self {
            state,
            outcome: Ok(None),
        }
    }

    pub fn with_action(state: CliState, action: ShellAction) -> Self {
        Self {
            state,
            outcome: Ok(Some(action)),
        }
    }

    pub fn failed(state: CliState, error: ShellError) -> Self {
        Self {
            state,
            outcome: Err(error),
        }
    }

    pub fn error(&self) -> Option<&ShellError> {
        self.outcome.as_ref().err()
    }

    pub fn action(&self) -> Option<&ShellAction> {
        self.outcome.as_ref().ok().and_then(Option::as_ref)
    }
}
