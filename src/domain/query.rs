//! SQL 실행 결과 값 객체.

/// 문장 하나의 실행 결과.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatementResult {
    /// 명령 태그(SELECT, INSERT, ...)
    pub tag: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub rows_affected: Option<u64>,
}

impl StatementResult {
    pub fn returns_rows(&self) -> bool {
        !self.columns.is_empty()
    }
}

/// 한 번의 실행 요청(여러 문장일 수 있음)에 대한 결과.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryOutcome {
    pub results: Vec<StatementResult>,
}
