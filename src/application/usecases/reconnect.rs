//! 연결 재설정(`\c [database]`) 유스케이스.

use crate::application::ports::{Reporter, SqlExecutor};
use crate::domain::state::ShellError;

pub struct ReconnectUseCase<'a> {
    pub executor: &'a dyn SqlExecutor,
    pub reporter: &'a dyn Reporter,
}

impl<'a> ReconnectUseCase<'a> {
    pub async fn execute(&self, database: Option<&str>) -> Result<(), ShellError> {
        let message = self
            .executor
            .reconnect(database)
            .await
            .map_err(|err| ShellError::execution(format!("{err:#}")))?;
        tracing::info!(target = %self.executor.describe(), "reconnected");
        self.reporter.notice(&message);
        Ok(())
    }
}
