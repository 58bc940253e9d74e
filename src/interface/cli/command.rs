//! CLI 명령 파싱 모듈.

use clap::{Parser, Subcommand};

use crate::domain::session::{DEFAULT_ESCAPE, ShellConfig};
use crate::infrastructure::config::Config;

#[derive(Debug, Parser)]
#[command(name = "sqlsh")]
#[command(about = "Interactive SQL shell for HTTP SQL endpoints")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Server base URL (overrides config)
    #[arg(long)]
    url: Option<String>,

    /// Database to use (overrides config)
    #[arg(long, short = 'd')]
    database: Option<String>,

    /// Execute SQL and exit; may be repeated
    #[arg(long = "execute", short = 'e', value_name = "SQL")]
    execute: Vec<String>,

    /// Enable demo cluster commands, optionally with a node count
    #[arg(long, value_name = "NODES", require_equals = true)]
    demo: Option<Option<u32>>,

    /// Print each statement before running it
    #[arg(long)]
    echo: bool,

    /// Keep going after errors in non-interactive input
    #[arg(long)]
    no_errexit: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show effective merged config and searched paths
    Config,
}

pub enum CliAction {
    Shell(ShellArgs),
    InspectConfig,
}

/// 쉘 실행 시 설정 위에 덮어쓸 CLI 값.
#[derive(Debug, Clone, Default)]
pub struct ShellArgs {
    pub url: Option<String>,
    pub database: Option<String>,
    pub execute: Vec<String>,
    pub demo: Option<Option<u32>>,
    pub echo: bool,
    pub no_errexit: bool,
}

impl Cli {
    pub fn parse_action() -> Result<CliAction, String> {
        let cli = Cli::parse();
        Ok(cli.into_action())
    }

    fn into_action(self) -> CliAction {
        match self.command {
            Some(Commands::Config) => CliAction::InspectConfig,
            None => CliAction::Shell(ShellArgs {
                url: self.url,
                database: self.database,
                execute: self.execute,
                demo: self.demo,
                echo: self.echo,
                no_errexit: self.no_errexit,
            }),
        }
    }
}

impl ShellArgs {
    /// 연결 관련 플래그를 병합된 설정 위에 적용한다.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.connection.url = Some(url.clone());
        }
        if let Some(db) = &self.database {
            config.connection.database = Some(db.clone());
        }
    }

    /// 데모 모드일 때만 노드 수를 돌려준다. 값이 없으면 설정값을 쓴다.
    pub fn demo_nodes(&self, config: &Config) -> Option<u32> {
        self.demo
            .map(|nodes| nodes.unwrap_or_else(|| config.demo_nodes()).max(1))
    }

    pub fn shell_config(&self, config: &Config, interactive: bool) -> ShellConfig {
        let mut options = config.session_options(interactive);
        if self.echo {
            options.echo = true;
        }
        if self.no_errexit {
            options.errexit = false;
        }

        ShellConfig {
            escape: DEFAULT_ESCAPE,
            interactive,
            demo: self.demo.is_some(),
            options,
        }
    }
}
