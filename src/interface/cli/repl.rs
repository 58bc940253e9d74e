//! `sqlsh` 대화형 쉘의 바깥 읽기 루프.
//!
//! 줄을 읽어 드라이버에 넘기고, 드라이버가 돌려준 상태와 결과에 따라
//! 문장 실행, 액션 처리, 오류 보고, 복귀 여부를 결정한다.

use std::io::{self, IsTerminal, Write};

use anyhow::Result;
use serde_json::Value;

use crate::application::driver::ShellDriver;
use crate::application::ports::{DemoSupervisor, LineRead, LineSource, Reporter, SqlExecutor};
use crate::application::usecases::reconnect::ReconnectUseCase;
use crate::application::usecases::run_statement::RunStatementUseCase;
use crate::domain::session::ShellConfig;
use crate::domain::state::{CliState, ShellAction, ShellError, Transition};
use crate::interface::cli::composition::AppComposition;

/// 바깥 루프가 쓰는 포트 묶음.
#[derive(Clone, Copy)]
pub struct ShellPorts<'a> {
    pub executor: &'a dyn SqlExecutor,
    pub reporter: &'a dyn Reporter,
    pub supervisor: Option<&'a dyn DemoSupervisor>,
}

impl<'a> ShellPorts<'a> {
    fn run_statement_usecase(&self) -> RunStatementUseCase<'a> {
        RunStatementUseCase {
            executor: self.executor,
            reporter: self.reporter,
        }
    }

    fn reconnect_usecase(&self) -> ReconnectUseCase<'a> {
        ReconnectUseCase {
            executor: self.executor,
            reporter: self.reporter,
        }
    }
}

/// 입력이 끝나거나 복구하지 않을 오류가 날 때까지 쉘을 돌리고 종료 코드를 반환한다.
pub async fn run_shell(
    ports: ShellPorts<'_>,
    config: ShellConfig,
    source: &mut dyn LineSource,
) -> Result<i32> {
    let mut driver = ShellDriver::new(config, ports.supervisor);

    loop {
        match driver.state() {
            CliState::Stop | CliState::Error => break,
            CliState::RunStatement => {
                run_pending_statement(ports, &mut driver).await;
                continue;
            }
            CliState::StartLine | CliState::ContinueLine => {}
        }

        let transition = match source.read_line(driver.prompt_kind())? {
            LineRead::Line(line) => driver.process_line(&line),
            LineRead::Interrupted => driver.cancel(),
            LineRead::Eof => driver.end_of_input(),
        };

        handle_transition(ports, &mut driver, transition).await;
    }

    Ok(driver.exit_code())
}

async fn run_pending_statement(ports: ShellPorts<'_>, driver: &mut ShellDriver<'_>) {
    let sql = driver.statement().to_string();
    let options = *driver.options();
    let result = ports.run_statement_usecase().execute(&sql, &options).await;

    let transition = driver.complete_statement(result);
    if let Some(err) = transition.error() {
        ports.reporter.error(&err.to_string());
        if driver.config().interactive || !driver.options().errexit {
            driver.recover();
        }
    }
}

async fn handle_transition(
    ports: ShellPorts<'_>,
    driver: &mut ShellDriver<'_>,
    transition: Transition,
) {
    let reporter = ports.reporter;
    if let Some(err) = transition.error() {
        report_line_error(reporter, driver, err.clone());
        return;
    }

    let Some(action) = transition.action() else {
        return;
    };

    match action {
        ShellAction::Help => reporter.help(driver.config().escape),
        ShellAction::ShowOptions => reporter.options(driver.options()),
        ShellAction::Notice(message) => reporter.notice(message),
        ShellAction::Reconnect { database } => {
            if let Err(err) = ports
                .reconnect_usecase()
                .execute(database.as_deref())
                .await
            {
                report_line_error(reporter, driver, err);
            }
        }
    }
}

/// 줄 처리 중 생긴 오류를 보고한다. 스크립트 입력에서 errexit가 켜져 있으면 종료시킨다.
fn report_line_error(reporter: &dyn Reporter, driver: &mut ShellDriver<'_>, err: ShellError) {
    if err == ShellError::Cancelled {
        return;
    }

    reporter.error(&err.to_string());
    if !driver.config().interactive && driver.options().errexit {
        driver.fail(err);
    }
}

/// 대화형 시작 시 접속 대상과 설정 요약을 상자로 출력한다.
pub fn print_welcome(composition: &AppComposition, config: &ShellConfig) -> Result<()> {
    let color = io::stdout().is_terminal();
    let escape = config.escape;

    let title = paint("sqlsh interactive shell", "1;36", color);
    let help = paint(&format!("{escape}?"), "1;32", color);
    let quit = paint(&format!("{escape}q"), "1;31", color);

    println!("+------------------------------------------------------------+");
    println!("| {} |", pad_box_line(&title, "sqlsh interactive shell", 58));
    println!("+------------------------------------------------------------+");
    for line in build_startup_lines(composition, config) {
        let fitted = fit_box_line(&line, 58);
        println!("| {fitted:<58} |");
    }
    println!("+------------------------------------------------------------+");
    println!("Type {help} for client commands, {quit} to quit. End statements with ';'.");
    println!();
    io::stdout().flush()?;
    Ok(())
}

fn build_startup_lines(composition: &AppComposition, config: &ShellConfig) -> Vec<String> {
    let mut lines = vec![format!("Server: {}", composition.target_description())];

    // 설정 점검 JSON에서 불러온 파일 수만 뽑아 보여준다.
    match composition
        .inspect_config_usecase()
        .execute()
        .ok()
        .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
    {
        Some(value) => {
            let loaded = value
                .get("loaded_paths")
                .and_then(Value::as_array)
                .map(Vec::len)
                .unwrap_or(0);
            lines.push(format!("Config: {loaded} file(s) loaded"));
        }
        None => lines.push("Config: unavailable (run `sqlsh config`)".to_string()),
    }

    if config.demo {
        lines.push(format!("Demo cluster: enabled ({}demo ls)", config.escape));
    }
    lines
}

fn paint(text: &str, ansi: &str, color: bool) -> String {
    if color {
        format!("\x1b[{ansi}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

/// 색 코드가 섞인 문자열은 원문 길이 기준으로 채운다.
fn pad_box_line(painted: &str, plain: &str, width: usize) -> String {
    let pad = width.saturating_sub(plain.chars().count());
    format!("{painted}{}", " ".repeat(pad))
}

fn fit_box_line(text: &str, width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= width {
        return text.to_string();
    }

    if width <= 3 {
        return ".".repeat(width);
    }

    let keep = width - 3;
    let head: String = chars.into_iter().take(keep).collect();
    format!("{head}...")
}
