//! sqlsh library root.
//! 계층(domain/application/infrastructure/interface)을 외부에 노출한다.

use std::io::{self, IsTerminal};

use anyhow::Result;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interface;

use application::ports::{ConfigRepository, LineSource};
use application::usecases::inspect_config::InspectConfigUseCase;
use infrastructure::adapters::JsonConfigRepository;
use interface::cli::{
    AppComposition, ScriptLineSource, ShellArgs, TerminalLineSource, print_welcome, run_shell,
};

/// 설정을 읽고 쉘을 실행한 뒤 프로세스 종료 코드를 반환한다.
/// `-e` 문장이 있거나 표준 입력이 터미널이 아니면 비대화형으로 동작한다.
pub async fn run(args: ShellArgs) -> Result<i32> {
    let config_repo = JsonConfigRepository;
    let mut config = config_repo.load()?;
    args.apply_to(&mut config);

    let interactive = args.execute.is_empty() && io::stdin().is_terminal();
    let shell_config = args.shell_config(&config, interactive);
    let composition = AppComposition::new(&config, args.demo_nodes(&config))?;

    let mut source: Box<dyn LineSource> = if args.execute.is_empty() {
        Box::new(TerminalLineSource::new(
            config.prompt(),
            config.continuation_prompt(),
            shell_config.escape,
        ))
    } else {
        Box::new(ScriptLineSource::new(&args.execute))
    };

    if shell_config.interactive {
        print_welcome(&composition, &shell_config)?;
    }

    run_shell(composition.shell_ports(), shell_config, source.as_mut()).await
}

/// 설정 점검 JSON 출력용 함수.
pub fn inspect_config_pretty_json() -> Result<String> {
    InspectConfigUseCase {
        config_repo: &JsonConfigRepository,
    }
    .execute()
}
