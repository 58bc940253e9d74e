//! HTTP SQL 엔드포인트로 문장을 전달하는 실행 싱크 어댑터.

use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use url::Url;

use crate::application::ports::SqlExecutor;
use crate::domain::lexer::split_statements;
use crate::domain::query::{QueryOutcome, StatementResult};

const SQL_API_PATH: &str = "api/v2/sql/";
const APPLICATION_NAME: &str = "sqlsh";

/// `POST {url}/api/v2/sql/` 로 문장 묶음을 보내는 실행기.
pub struct HttpSqlExecutor {
    client: Client,
    base_url: String,
    endpoint: Url,
    token: Option<String>,
    database: Mutex<Option<String>>,
}

impl HttpSqlExecutor {
    pub fn new(
        base_url: &str,
        database: Option<String>,
        token: Option<String>,
        timeout_ms: u64,
    ) -> Result<Self> {
        let endpoint = sql_endpoint(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoint,
            token,
            database: Mutex::new(database),
        })
    }

    fn current_database(&self) -> Option<String> {
        self.database.lock().map(|db| db.clone()).unwrap_or_default()
    }

    async fn post(&self, statements: &[String]) -> Result<QueryOutcome> {
        let body = request_body(self.current_database().as_deref(), statements);

        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.endpoint))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .context("failed to read SQL response body")?;

        let payload: Option<Value> = serde_json::from_str(&text).ok();
        if !status.is_success() {
            let detail = payload
                .as_ref()
                .and_then(error_message)
                .unwrap_or_else(|| text.trim().to_string());
            bail!("server returned {status}: {detail}");
        }

        let payload = payload.ok_or_else(|| anyhow!("invalid JSON in SQL response"))?;
        parse_response(&payload)
    }
}

#[async_trait]
impl SqlExecutor for HttpSqlExecutor {
    async fn execute(&self, sql: &str) -> Result<QueryOutcome> {
        let statements = split_statements(sql);
        if statements.is_empty() {
            return Ok(QueryOutcome::default());
        }

        tracing::debug!(count = statements.len(), endpoint = %self.endpoint, "sending statements");
        self.post(&statements).await
    }

    async fn reconnect(&self, database: Option<&str>) -> Result<String> {
        let previous = self.current_database();
        if let Some(db) = database {
            set_database(&self.database, Some(db.to_string()));
        }

        // 새 대상으로 왕복이 되는지 확인한다. 실패하면 이전 데이터베이스로 되돌린다.
        if let Err(err) = self.post(&["SELECT 1".to_string()]).await {
            set_database(&self.database, previous);
            return Err(err.context("reconnect failed"));
        }

        Ok(format!("connected to {}", self.describe()))
    }

    fn describe(&self) -> String {
        match self.current_database() {
            Some(db) => format!("{} (database: {db})", self.base_url),
            None => self.base_url.clone(),
        }
    }
}

fn set_database(slot: &Mutex<Option<String>>, value: Option<String>) {
    if let Ok(mut db) = slot.lock() {
        *db = value;
    }
}

fn sql_endpoint(base_url: &str) -> Result<Url> {
    let mut base = base_url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let parsed = Url::parse(&base).with_context(|| format!("invalid server URL: {base_url}"))?;
    Ok(parsed.join(SQL_API_PATH)?)
}

fn request_body(database: Option<&str>, statements: &[String]) -> Value {
    let mut body = json!({
        "application_name": APPLICATION_NAME,
        // 없으면 서버가 문장을 파싱만 하고 실행 결과를 돌려주지 않는다.
        "execute": true,
        "statements": statements
            .iter()
            .map(|sql| json!({ "sql": sql }))
            .collect::<Vec<_>>(),
    });
    if let Some(db) = database {
        body["database"] = Value::String(db.to_string());
    }
    body
}

fn error_message(value: &Value) -> Option<String> {
    let err = value.get("error")?;
    err.get("message")
        .and_then(Value::as_str)
        .or_else(|| err.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// 응답의 `execution.txn_results`를 문장별 결과로 변환한다.
/// 어느 문장이든 오류를 담고 있으면 그 메시지로 실패한다.
fn parse_response(payload: &Value) -> Result<QueryOutcome> {
    if let Some(message) = error_message(payload) {
        bail!("{message}");
    }

    let txn_results = payload
        .get("execution")
        .and_then(|e| e.get("txn_results"))
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("SQL response is missing execution.txn_results"))?;

    let mut results = Vec::with_capacity(txn_results.len());
    for item in txn_results {
        if let Some(message) = error_message(item) {
            bail!("{message}");
        }
        results.push(parse_statement_result(item));
    }

    Ok(QueryOutcome { results })
}

fn parse_statement_result(item: &Value) -> StatementResult {
    let columns: Vec<String> = item
        .get("columns")
        .and_then(Value::as_array)
        .map(|cols| {
            cols.iter()
                .filter_map(|c| c.get("name").and_then(Value::as_str))
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default();

    let rows = item
        .get("rows")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .map(|row| {
                    columns
                        .iter()
                        .map(|col| render_value(row.get(col).unwrap_or(&Value::Null)))
                        .collect()
                })
                .collect()
        })
        .unwrap_or_default();

    StatementResult {
        tag: item
            .get("tag")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        columns,
        rows,
        rows_affected: item.get("rows_affected").and_then(Value::as_u64),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
