//! 설정 스키마와 병합/해석 규칙.

use std::env;

use serde::{Deserialize, Serialize};

use crate::domain::session::SessionOptions;

pub const DEFAULT_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_PROMPT: &str = "sqlsh> ";
pub const DEFAULT_CONTINUATION_PROMPT: &str = "    -> ";
pub const DEFAULT_DEMO_NODES: u32 = 3;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// SQL 서버 연결 설정
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// 대화형 쉘 설정
    #[serde(default)]
    pub shell: ShellSection,
    /// 데모 클러스터 설정
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ConnectionConfig {
    /// HTTP SQL 엔드포인트 베이스 URL
    pub url: Option<String>,
    /// 기본 데이터베이스
    pub database: Option<String>,
    pub token: Option<String>,
    pub token_env: Option<String>,
    /// 요청 타임아웃(ms)
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ShellSection {
    pub prompt: Option<String>,
    pub continuation_prompt: Option<String>,
    pub echo: Option<bool>,
    /// 미지정 시 비대화형 입력에서만 켠다
    pub errexit: Option<bool>,
    pub show_times: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DemoConfig {
    /// 데모 클러스터 노드 수
    pub nodes: Option<u32>,
}

impl Config {
    pub fn url(&self) -> String {
        self.connection
            .url
            .clone()
            .unwrap_or_else(|| DEFAULT_URL.to_string())
    }

    pub fn database(&self) -> Option<String> {
        self.connection
            .database
            .clone()
            .filter(|db| !db.trim().is_empty())
    }

    pub fn timeout_ms(&self) -> u64 {
        self.connection.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)
    }

    pub fn prompt(&self) -> String {
        self.shell
            .prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string())
    }

    pub fn continuation_prompt(&self) -> String {
        self.shell
            .continuation_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTINUATION_PROMPT.to_string())
    }

    pub fn demo_nodes(&self) -> u32 {
        self.demo.nodes.unwrap_or(DEFAULT_DEMO_NODES).max(1)
    }

    /// 세션 시작 옵션을 해석한다.
    pub fn session_options(&self, interactive: bool) -> SessionOptions {
        SessionOptions {
            echo: self.shell.echo.unwrap_or(false),
            errexit: self.shell.errexit.unwrap_or(!interactive),
            show_times: self.shell.show_times.unwrap_or(false),
        }
    }

    /// 연결 토큰은 `token` 우선, 없으면 `token_env`를 조회한다.
    pub fn resolve_token(&self) -> Option<String> {
        if let Some(token) = &self.connection.token {
            return Some(token.clone());
        }
        let env_name = self.connection.token_env.as_ref()?;
        env::var(env_name).ok().filter(|v| !v.trim().is_empty())
    }

    pub(crate) fn token_source_label(&self) -> Option<String> {
        if self.connection.token.is_some() {
            return Some("inline".to_string());
        }
        let env_name = self.connection.token_env.as_ref()?;
        if env::var(env_name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .is_some()
        {
            Some(format!("env:{env_name}"))
        } else {
            Some(format!("env:{env_name} (missing)"))
        }
    }

    /// 후순위(나중 파일) 값으로 덮어쓰는 병합 규칙.
    pub(crate) fn merge_from(&mut self, other: Config) {
        self.connection.merge_from(other.connection);
        self.shell.merge_from(other.shell);
        if other.demo.nodes.is_some() {
            self.demo.nodes = other.demo.nodes;
        }
    }
}

impl ConnectionConfig {
    pub(crate) fn merge_from(&mut self, other: ConnectionConfig) {
        if other.url.is_some() {
            self.url = other.url;
        }
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.token.is_some() {
            self.token = other.token;
        }
        if other.token_env.is_some() {
            self.token_env = other.token_env;
        }
        if other.timeout_ms.is_some() {
            self.timeout_ms = other.timeout_ms;
        }
    }
}

impl ShellSection {
    pub(crate) fn merge_from(&mut self, other: ShellSection) {
        if other.prompt.is_some() {
            self.prompt = other.prompt;
        }
        if other.continuation_prompt.is_some() {
            self.continuation_prompt = other.continuation_prompt;
        }
        if other.echo.is_some() {
            self.echo = other.echo;
        }
        if other.errexit.is_some() {
            self.errexit = other.errexit;
        }
        if other.show_times.is_some() {
            self.show_times = other.show_times;
        }
    }
}
