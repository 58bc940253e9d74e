//! 세션 옵션과 시작 시 한 번 구성되는 쉘 설정 값.

use serde::Serialize;

use crate::domain::state::ShellError;

pub const DEFAULT_ESCAPE: char = '\\';
pub const OPTION_NAMES: [&str; 3] = ["echo", "errexit", "show_times"];

/// `\set`/`\unset`으로 바꿀 수 있는 클라이언트 옵션.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SessionOptions {
    /// 실행 전 문장을 출력한다
    pub echo: bool,
    /// 오류 발생 시 세션을 종료한다
    pub errexit: bool,
    /// 문장 실행 시간을 출력한다
    pub show_times: bool,
}

impl SessionOptions {
    /// 옵션 값을 설정한다. 값이 없으면 `true`로 본다.
    pub fn set(&mut self, name: &str, value: Option<&str>) -> Result<(), ShellError> {
        let parsed = match value {
            None => true,
            Some(raw) => parse_bool(raw).ok_or_else(|| {
                ShellError::invalid_syntax(format!("invalid value for {name}: {raw}"))
            })?,
        };
        *self.slot(name)? = parsed;
        Ok(())
    }

    pub fn unset(&mut self, name: &str) -> Result<(), ShellError> {
        *self.slot(name)? = false;
        Ok(())
    }

    pub fn entries(&self) -> [(&'static str, bool); 3] {
        [
            ("echo", self.echo),
            ("errexit", self.errexit),
            ("show_times", self.show_times),
        ]
    }

    fn slot(&mut self, name: &str) -> Result<&mut bool, ShellError> {
        match name {
            "echo" => Ok(&mut self.echo),
            "errexit" => Ok(&mut self.errexit),
            "show_times" => Ok(&mut self.show_times),
            other => Err(ShellError::invalid_syntax(format!(
                "unknown option: {other} (available: {})",
                OPTION_NAMES.join(", ")
            ))),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// 상태 머신 생성 시 주입하는 불변 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// 메타 명령 시작 문자
    pub escape: char,
    /// 사람이 직접 입력하는 세션인지 여부
    pub interactive: bool,
    /// 데모 클러스터에 연결된 세션인지 여부
    pub demo: bool,
    /// 세션 시작 시 옵션
    pub options: SessionOptions,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self::for_input(true)
    }
}

impl ShellConfig {
    /// 비대화형 입력은 기본적으로 첫 오류에서 종료한다.
    pub fn for_input(interactive: bool) -> Self {
        Self {
            escape: DEFAULT_ESCAPE,
            interactive,
            demo: false,
            options: SessionOptions {
                errexit: !interactive,
                ..SessionOptions::default()
            },
        }
    }
}
