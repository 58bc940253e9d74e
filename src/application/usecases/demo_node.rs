//! 데모 클러스터 노드 명령 유스케이스.

use crate::application::ports::DemoSupervisor;
use crate::domain::demo::{DemoCommand, DemoVerb, NodeSelector};
use crate::domain::state::ShellError;

/// `\demo` 인자를 검증한 뒤 데모 관리자에게 위임한다.
/// 검증에 실패하면 관리자를 호출하지 않는다.
pub struct DemoNodeUseCase<'a> {
    pub supervisor: Option<&'a dyn DemoSupervisor>,
}

impl<'a> DemoNodeUseCase<'a> {
    pub fn execute<S: AsRef<str>>(&self, args: &[S]) -> Result<String, ShellError> {
        let command = DemoCommand::parse(args)?;
        let Some(supervisor) = self.supervisor else {
            return Err(ShellError::invalid_syntax(
                "\\demo can only be used when connected to a demo cluster",
            ));
        };

        tracing::info!(verb = command.verb.as_str(), selector = ?command.selector, "demo command");

        let result = match (command.verb, command.selector) {
            (DemoVerb::List, _) => supervisor.list(),
            (verb, Some(selector)) => run_verb(supervisor, verb, selector),
            (verb, None) => {
                return Err(ShellError::invalid_syntax(format!(
                    "{} requires a node id",
                    verb.as_str()
                )));
            }
        };

        result.map_err(|err| ShellError::execution(format!("{err:#}")))
    }
}

fn run_verb(
    supervisor: &dyn DemoSupervisor,
    verb: DemoVerb,
    selector: NodeSelector,
) -> anyhow::Result<String> {
    match verb {
        DemoVerb::Shutdown => supervisor.shutdown(selector),
        DemoVerb::Restart => supervisor.restart(selector),
        DemoVerb::Decommission => supervisor.decommission(selector),
        DemoVerb::Recommission => supervisor.recommission(selector),
        DemoVerb::List => supervisor.list(),
    }
}
