//! 콘솔 리포터 포트 구현 어댑터.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use unicode_width::UnicodeWidthStr;

use crate::application::ports::Reporter;
use crate::domain::meta_command::COMMANDS;
use crate::domain::query::{QueryOutcome, StatementResult};
use crate::domain::session::SessionOptions;

/// 결과는 stdout, 오류는 stderr로 내보내는 리포터.
pub struct ConsoleReporter {
    color: bool,
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleReporter {
    /// stderr가 TTY일 때만 오류 메시지에 색을 입힌다.
    pub fn new() -> Self {
        Self {
            color: io::stderr().is_terminal(),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn outcome(&self, outcome: &QueryOutcome) {
        let rendered = format_outcome(outcome);
        if rendered.is_empty() {
            return;
        }
        let mut out = io::stdout().lock();
        let _ = out.write_all(rendered.as_bytes());
        let _ = out.flush();
    }

    fn echo(&self, sql: &str) {
        println!("> {sql}");
    }

    fn notice(&self, message: &str) {
        println!("{message}");
    }

    fn error(&self, message: &str) {
        if self.color {
            eprintln!("\x1b[31mERROR:\x1b[0m {message}");
        } else {
            eprintln!("ERROR: {message}");
        }
    }

    fn timing(&self, elapsed: Duration) {
        println!("Time: {:.3}ms", elapsed.as_secs_f64() * 1000.0);
    }

    fn help(&self, escape: char) {
        print!("{}", format_help(escape));
    }

    fn options(&self, options: &SessionOptions) {
        for (name, enabled) in options.entries() {
            println!("{:<12} {}", name, if enabled { "on" } else { "off" });
        }
    }
}

/// 문장별 결과를 출력 텍스트로 만든다. 행 결과는 표로, 나머지는 명령 태그로 보여준다.
pub fn format_outcome(outcome: &QueryOutcome) -> String {
    let mut out = String::new();
    for result in &outcome.results {
        if result.returns_rows() {
            out.push_str(&render_table(&result.columns, &result.rows));
            let n = result.rows.len();
            out.push_str(&format!("({n} row{})\n", if n == 1 { "" } else { "s" }));
        } else {
            out.push_str(&format_tag(result));
            out.push('\n');
        }
    }
    out
}

fn format_tag(result: &StatementResult) -> String {
    match (result.tag.is_empty(), result.rows_affected) {
        (true, Some(n)) => format!("OK {n}"),
        (true, None) => "OK".to_string(),
        (false, Some(n)) => format!("{} {n}", result.tag),
        (false, None) => result.tag.clone(),
    }
}

/// 동아시아 문자 폭을 고려해 열을 맞춘 표를 만든다.
pub fn render_table(columns: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.width()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(idx) {
                *w = (*w).max(cell.width());
            }
        }
    }

    let mut out = String::new();
    push_row(&mut out, columns, &widths);
    let rule = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    out.push_str(&rule);
    out.push('\n');
    for row in rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = widths
        .iter()
        .enumerate()
        .map(|(idx, width)| {
            let cell = cells.get(idx).map(String::as_str).unwrap_or("");
            // 여러 줄 값은 한 줄로 펴서 정렬을 유지한다.
            let cell = cell.replace('\n', "\\n");
            let pad = width.saturating_sub(cell.width());
            format!(" {cell}{} ", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("|");
    out.push_str(line.trim_end());
    out.push('\n');
}

/// 메타 명령 목록을 도움말 텍스트로 만든다.
pub fn format_help(escape: char) -> String {
    let rows: Vec<(String, &str)> = COMMANDS
        .iter()
        .map(|spec| (spec.usage(escape), spec.description))
        .collect();
    let width = rows.iter().map(|(u, _)| u.width()).max().unwrap_or(0);

    let mut out = String::from("Client commands:\n");
    for (usage, description) in rows {
        out.push_str(&format!("  {usage:<width$}  {description}\n"));
    }
    out.push_str("\nSQL statements end with ';'. Type exit or quit to leave.\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_table_pads_wide_characters() {
        let table = render_table(
            &strings(&["id", "name"]),
            &[strings(&["1", "한글"]), strings(&["22", "ab"])],
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], " id | name");
        assert_eq!(lines[1], "----+------");
        assert_eq!(lines[2], " 1  | 한글");
        assert_eq!(lines[3], " 22 | ab");
    }

    #[test]
    fn test_outcome_mixes_tables_and_tags() {
        let outcome = QueryOutcome {
            results: vec![
                StatementResult {
                    tag: "SELECT".to_string(),
                    columns: strings(&["n"]),
                    rows: vec![strings(&["1"])],
                    rows_affected: Some(1),
                },
                StatementResult {
                    tag: "INSERT".to_string(),
                    columns: vec![],
                    rows: vec![],
                    rows_affected: Some(2),
                },
                StatementResult {
                    tag: "CREATE TABLE".to_string(),
                    ..Default::default()
                },
            ],
        };

        let text = format_outcome(&outcome);
        assert!(text.contains("(1 row)\n"));
        assert!(text.contains("INSERT 2\n"));
        assert!(text.ends_with("CREATE TABLE\n"));
    }

    #[test]
    fn test_help_lists_every_command() {
        let help = format_help('\\');
        for spec in COMMANDS {
            assert!(help.contains(&spec.usage('\\')), "{}", spec.names[0]);
        }
    }
}
