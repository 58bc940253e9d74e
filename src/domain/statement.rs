//! 여러 줄 입력을 하나의 SQL 문장으로 모으는 누산기.

use crate::domain::lexer::{LexicalScan, last_lexical_token};

/// 한 줄을 추가한 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accumulated {
    /// 버퍼 끝이 최상위 세미콜론이라 실행 가능한 문장이 완성됐다.
    Ready(String),
    /// 다음 줄이 더 필요하다.
    Continue,
}

#[derive(Debug, Default)]
pub struct StatementAccumulator {
    lines: Vec<String>,
}

impl StatementAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 줄을 버퍼에 붙이고 버퍼 전체를 다시 스캔해 문장 완성 여부를 판단한다.
    pub fn push_line(&mut self, line: &str) -> Accumulated {
        self.lines.push(line.to_string());
        let text = self.text();
        if last_lexical_token(&text).is_end() {
            self.lines.clear();
            return Accumulated::Ready(text.trim().to_string());
        }
        Accumulated::Continue
    }

    /// 줄 주석이 줄 경계에서 끝나도록 개행으로 이어 붙인다.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn scan(&self) -> LexicalScan {
        last_lexical_token(&self.text())
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 공백/주석 외의 내용이 있는지 여부.
    pub fn has_content(&self) -> bool {
        self.scan().non_empty
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// 남은 버퍼를 꺼내고 비운다.
    pub fn take(&mut self) -> String {
        let text = self.text();
        self.lines.clear();
        text.trim().to_string()
    }
}
