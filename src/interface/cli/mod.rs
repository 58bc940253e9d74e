//! CLI 인터페이스 모듈 묶음.
//! 인자 파싱/입력 공급/바깥 루프/조립을 한 네임스페이스로 관리한다.

pub mod command;
pub mod composition;
pub mod repl;
pub mod repl_input;

pub use command::{Cli, CliAction, ShellArgs};
pub use composition::AppComposition;
pub use repl::{ShellPorts, print_welcome, run_shell};
pub use repl_input::{ScriptLineSource, TerminalLineSource};
