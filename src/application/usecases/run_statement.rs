//! 완성된 문장을 실행 싱크로 보내고 결과를 출력하는 유스케이스.

use std::time::Instant;

use crate::application::ports::{Reporter, SqlExecutor};
use crate::domain::session::SessionOptions;
use crate::domain::state::ShellError;

pub struct RunStatementUseCase<'a> {
    pub executor: &'a dyn SqlExecutor,
    pub reporter: &'a dyn Reporter,
}

impl<'a> RunStatementUseCase<'a> {
    /// 실행 실패는 메시지를 그대로 `Execution` 오류로 전달한다.
    pub async fn execute(&self, sql: &str, options: &SessionOptions) -> Result<(), ShellError> {
        if options.echo {
            self.reporter.echo(sql);
        }

        let started = Instant::now();
        let outcome = self
            .executor
            .execute(sql)
            .await
            .map_err(|err| ShellError::execution(format!("{err:#}")))?;

        self.reporter.outcome(&outcome);
        if options.show_times {
            self.reporter.timing(started.elapsed());
        }
        Ok(())
    }
}
