//! 쉘 입력 공급기.
//! 터미널에서는 한 줄 편집기를, 그 밖에는 표준 입력이나 `-e` 스크립트를 사용한다.
//! 백슬래시 명령을 입력하는 동안 실시간 힌트와 Tab 완성을 제공한다.

use std::collections::VecDeque;
use std::env;
use std::io::{self, IsTerminal, Write};

use anyhow::Result;
use crossterm::cursor;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::style::{Color, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, ClearType};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::application::ports::{LineRead, LineSource, PromptKind};
use crate::domain::meta_command::{COMMANDS, lookup};

const MAX_NAME_HINTS: usize = 6;

/// 대화형 터미널 입력기. 지원하지 않는 터미널이면 일반 줄 입력으로 대체한다.
pub struct TerminalLineSource {
    prompt: String,
    continuation_prompt: String,
    escape: char,
    /// 여러 줄 붙여넣기에서 아직 돌려주지 않은 줄
    pending: VecDeque<String>,
    prefill: String,
    history: Vec<String>,
}

impl TerminalLineSource {
    pub fn new(prompt: String, continuation_prompt: String, escape: char) -> Self {
        Self {
            prompt,
            continuation_prompt,
            escape,
            pending: VecDeque::new(),
            prefill: String::new(),
            history: Vec::new(),
        }
    }

    fn prompt_text(&self, kind: PromptKind) -> &str {
        match kind {
            PromptKind::Start => &self.prompt,
            PromptKind::Continue => &self.continuation_prompt,
        }
    }

    fn remember(&mut self, line: &str) {
        if line.trim().is_empty() || self.history.last().is_some_and(|last| last == line) {
            return;
        }
        self.history.push(line.to_string());
    }
}

impl LineSource for TerminalLineSource {
    fn read_line(&mut self, kind: PromptKind) -> Result<LineRead> {
        let prompt = self.prompt_text(kind).to_string();

        if let Some(line) = self.pending.pop_front() {
            // 붙여넣은 줄도 입력한 것처럼 화면에 남긴다.
            println!("{prompt}{line}");
            self.remember(&line);
            return Ok(LineRead::Line(line));
        }

        if !supports_interactive_input() {
            return read_line_fallback(&prompt);
        }

        let initial = std::mem::take(&mut self.prefill);
        let read = match read_line_interactive(self, &prompt, initial) {
            Ok(read) => read,
            Err(err) => {
                tracing::debug!(error = %err, "line editor unavailable, falling back to plain input");
                return read_line_fallback(&prompt);
            }
        };

        if let LineRead::Line(line) = &read {
            self.remember(line);
        }
        Ok(read)
    }
}

/// `-e` 로 받은 문장들을 줄 단위로 흘려보내는 입력기.
pub struct ScriptLineSource {
    lines: VecDeque<String>,
}

impl ScriptLineSource {
    pub fn new<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines = chunks
            .into_iter()
            .flat_map(|chunk| {
                chunk
                    .as_ref()
                    .lines()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        Self { lines }
    }
}

impl LineSource for ScriptLineSource {
    fn read_line(&mut self, _prompt: PromptKind) -> Result<LineRead> {
        Ok(self
            .lines
            .pop_front()
            .map(LineRead::Line)
            .unwrap_or(LineRead::Eof))
    }
}

fn supports_interactive_input() -> bool {
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return false;
    }

    // dumb 터미널에서는 제어 시퀀스 기반 UI를 비활성화한다.
    if let Ok(term) = env::var("TERM")
        && term.eq_ignore_ascii_case("dumb")
    {
        return false;
    }

    true
}

fn read_line_fallback(prompt: &str) -> Result<LineRead> {
    // 파이프 입력에는 프롬프트를 찍지 않는다.
    if io::stdin().is_terminal() {
        print!("{prompt}");
        io::stdout().flush()?;
    }

    let mut line = String::new();
    let read = io::stdin().read_line(&mut line)?;
    if read == 0 {
        return Ok(LineRead::Eof);
    }

    Ok(LineRead::Line(trim_newline(line)))
}

fn read_line_interactive(
    source: &mut TerminalLineSource,
    prompt: &str,
    initial: String,
) -> Result<LineRead> {
    let mut stdout = io::stdout();
    let _guard = InputGuard::enter(&mut stdout)?;

    let escape = source.escape;
    let mut input = initial;
    let mut cursor_chars = input.chars().count();
    let mut history_idx: Option<usize> = None;
    let mut draft = String::new();

    loop {
        render_frame(&mut stdout, prompt, &input, cursor_chars, escape)?;

        match event::read()? {
            Event::Paste(text) => {
                let (complete, rest) = split_paste(&text);
                if complete.is_empty() {
                    cursor_chars += insert_str_at(&mut input, cursor_chars, &rest);
                    continue;
                }

                // 첫 줄은 커서 위치에 끼워 바로 제출하고, 나머지는 다음 읽기로 넘긴다.
                let mut lines = complete.into_iter();
                if let Some(first) = lines.next() {
                    insert_str_at(&mut input, cursor_chars, &first);
                }
                source.pending.extend(lines);
                source.prefill = rest;
                finish_frame(&mut stdout, prompt, &input)?;
                return Ok(LineRead::Line(input));
            }
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                match key.code {
                    KeyCode::Enter => {
                        finish_frame(&mut stdout, prompt, &input)?;
                        return Ok(LineRead::Line(input));
                    }
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        finish_frame(&mut stdout, prompt, &format!("{input}^C"))?;
                        return Ok(LineRead::Interrupted);
                    }
                    KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        if input.is_empty() {
                            finish_frame(&mut stdout, prompt, "")?;
                            return Ok(LineRead::Eof);
                        }
                        if cursor_chars < input.chars().count() {
                            remove_char_at(&mut input, cursor_chars);
                        }
                    }
                    KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        input.clear();
                        cursor_chars = 0;
                    }
                    KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        cursor_chars = 0;
                    }
                    KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        cursor_chars = input.chars().count();
                    }
                    KeyCode::Backspace => {
                        if cursor_chars > 0 {
                            remove_char_at(&mut input, cursor_chars - 1);
                            cursor_chars -= 1;
                        }
                    }
                    KeyCode::Delete => {
                        if cursor_chars < input.chars().count() {
                            remove_char_at(&mut input, cursor_chars);
                        }
                    }
                    KeyCode::Left => {
                        cursor_chars = cursor_chars.saturating_sub(1);
                    }
                    KeyCode::Right => {
                        cursor_chars = (cursor_chars + 1).min(input.chars().count());
                    }
                    KeyCode::Home => {
                        cursor_chars = 0;
                    }
                    KeyCode::End => {
                        cursor_chars = input.chars().count();
                    }
                    KeyCode::Up => {
                        if source.history.is_empty() {
                            continue;
                        }
                        let next = match history_idx {
                            None => {
                                draft = input.clone();
                                source.history.len() - 1
                            }
                            Some(idx) => idx.saturating_sub(1),
                        };
                        history_idx = Some(next);
                        input = source.history[next].clone();
                        cursor_chars = input.chars().count();
                    }
                    KeyCode::Down => {
                        let Some(idx) = history_idx else {
                            continue;
                        };
                        if idx + 1 < source.history.len() {
                            history_idx = Some(idx + 1);
                            input = source.history[idx + 1].clone();
                        } else {
                            history_idx = None;
                            input = std::mem::take(&mut draft);
                        }
                        cursor_chars = input.chars().count();
                    }
                    KeyCode::Tab => {
                        if let Some(completed) = complete_command(&input, escape) {
                            input = completed;
                            cursor_chars = input.chars().count();
                        }
                    }
                    KeyCode::Char(ch) => {
                        if !key.modifiers.contains(KeyModifiers::CONTROL)
                            && !key.modifiers.contains(KeyModifiers::ALT)
                        {
                            insert_char_at(&mut input, cursor_chars, ch);
                            cursor_chars += 1;
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
}

/// 붙여넣은 텍스트를 완성된 줄들과 마지막 미완성 조각으로 나눈다.
fn split_paste(text: &str) -> (Vec<String>, String) {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut parts: Vec<String> = normalized.split('\n').map(ToString::to_string).collect();
    let rest = parts.pop().unwrap_or_default();
    (parts, rest)
}

/// 메타 명령 입력 중 보여줄 힌트. 일반 SQL 줄에는 힌트가 없다.
fn realtime_hint(input: &str, escape: char) -> Option<(Color, String)> {
    let rest = input.trim_start().strip_prefix(escape)?;
    let mut words = rest.split_whitespace();
    let Some(name) = words.next() else {
        return Some((
            Color::Yellow,
            format!("hint: {escape}? lists client commands"),
        ));
    };

    // 아직 이름을 입력하는 중이면 후보 목록을 보여준다.
    if !rest.contains(char::is_whitespace) {
        let candidates: Vec<String> = COMMANDS
            .iter()
            .filter(|spec| spec.names.iter().any(|n| n.starts_with(name)))
            .map(|spec| spec.usage(escape))
            .collect();
        if candidates.is_empty() {
            return Some((
                Color::Red,
                format!("error: unknown command `{escape}{name}`"),
            ));
        }
        let mut shown = candidates
            .iter()
            .take(MAX_NAME_HINTS)
            .cloned()
            .collect::<Vec<_>>()
            .join("  ");
        if candidates.len() > MAX_NAME_HINTS {
            shown.push_str("  ...");
        }
        return Some((Color::Yellow, shown));
    }

    let Some(spec) = lookup(name) else {
        return Some((
            Color::Red,
            format!("error: unknown command `{escape}{name}`"),
        ));
    };
    let argc = words.count();
    if spec.arity.contains(&argc) {
        Some((Color::Green, format!("ready: {}", spec.usage(escape))))
    } else {
        Some((Color::Yellow, format!("hint: {}", spec.usage(escape))))
    }
}

/// 메타 명령 이름을 Tab으로 완성한다. 후보가 여럿이면 공통 접두사까지만 채운다.
fn complete_command(input: &str, escape: char) -> Option<String> {
    let typed = input.strip_prefix(escape)?;
    if typed.contains(char::is_whitespace) {
        return None;
    }

    let candidates: Vec<(&str, bool)> = COMMANDS
        .iter()
        .flat_map(|spec| {
            spec.names
                .iter()
                .map(move |name| (*name, *spec.arity.end() > 0))
        })
        .filter(|(name, _)| name.starts_with(typed))
        .collect();

    match candidates.as_slice() {
        [] => None,
        [(name, takes_args)] => {
            let suffix = if *takes_args { " " } else { "" };
            let completed = format!("{escape}{name}{suffix}");
            (completed != input).then_some(completed)
        }
        many => {
            let prefix = common_prefix(many.iter().map(|(name, _)| *name));
            (prefix.len() > typed.len()).then(|| format!("{escape}{prefix}"))
        }
    }
}

fn common_prefix<'a>(mut names: impl Iterator<Item = &'a str>) -> String {
    let Some(first) = names.next() else {
        return String::new();
    };
    let mut prefix = first.to_string();
    for name in names {
        while !name.starts_with(&prefix) {
            prefix.pop();
        }
    }
    prefix
}

fn render_frame(
    stdout: &mut io::Stdout,
    prompt: &str,
    input: &str,
    cursor_chars: usize,
    escape: char,
) -> Result<()> {
    let (w, _) = terminal::size().unwrap_or((120, 40));
    let width = (w as usize).max(20);

    execute!(
        stdout,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::FromCursorDown)
    )?;
    write!(stdout, "{}", render_prompt_line(prompt, input, width))?;

    // 힌트는 입력줄 바로 아래에 한 줄로 그리고 다시 입력줄로 돌아온다.
    if let Some((color, hint)) = realtime_hint(input, escape) {
        write!(stdout, "\r\n")?;
        execute!(stdout, SetForegroundColor(color))?;
        write!(stdout, "{}", clip_line_display(&hint, width.saturating_sub(1)))?;
        execute!(stdout, ResetColor, cursor::MoveUp(1))?;
    }

    let col = prompt_cursor_col(prompt, input, cursor_chars, width) as u16;
    execute!(stdout, cursor::MoveToColumn(col), cursor::Show)?;
    stdout.flush()?;
    Ok(())
}

/// 힌트를 지우고 최종 입력줄만 남긴 뒤 다음 줄로 내려간다.
fn finish_frame(stdout: &mut io::Stdout, prompt: &str, input: &str) -> Result<()> {
    let (w, _) = terminal::size().unwrap_or((120, 40));
    execute!(
        stdout,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::FromCursorDown)
    )?;
    write!(
        stdout,
        "{}\r\n",
        render_prompt_line(prompt, input, (w as usize).max(20))
    )?;
    stdout.flush()?;
    Ok(())
}

fn render_prompt_line(prompt: &str, input: &str, width: usize) -> String {
    let prefix_width = display_width(prompt);
    let available = width.saturating_sub(prefix_width + 1);
    let shown = tail_with_ellipsis_display(input, available);
    clip_line_display(&format!("{prompt}{shown}"), width)
}

fn prompt_cursor_col(prompt: &str, input: &str, cursor_chars: usize, width: usize) -> usize {
    let prefix_width = display_width(prompt);
    let input_width = display_width(input);
    let before_cursor: String = input.chars().take(cursor_chars).collect();
    let before_cursor_width = display_width(&before_cursor);
    let available = width.saturating_sub(prefix_width + 1);

    if input_width <= available {
        return (prefix_width + before_cursor_width).min(width.saturating_sub(1));
    }

    // 넘친 입력은 끝부분만 보이므로 커서를 입력 끝에 둔다.
    (prefix_width + display_width(&tail_with_ellipsis_display(input, available)))
        .min(width.saturating_sub(1))
}

fn tail_with_ellipsis_display(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }

    if display_width(text) <= max_width {
        return text.to_string();
    }

    if max_width <= 3 {
        return ".".repeat(max_width);
    }

    let target = max_width - 3;
    let mut tail_rev = String::new();
    let mut used = 0usize;

    for ch in text.chars().rev() {
        let cw = char_display_width(ch);
        if used + cw > target {
            break;
        }
        tail_rev.push(ch);
        used += cw;
    }

    let tail: String = tail_rev.chars().rev().collect();
    format!("...{tail}")
}

fn clip_line_display(line: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }

    if display_width(line) <= max_width {
        return line.to_string();
    }

    if max_width <= 3 {
        return ".".repeat(max_width);
    }

    let mut out = String::new();
    let mut used = 0usize;
    let cap = max_width - 3;

    for ch in line.chars() {
        let cw = char_display_width(ch);
        if used + cw > cap {
            break;
        }
        out.push(ch);
        used += cw;
    }

    out.push_str("...");
    out
}

fn trim_newline(mut s: String) -> String {
    while matches!(s.chars().last(), Some('\n' | '\r')) {
        s.pop();
    }
    s
}

fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

fn char_display_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

struct InputGuard;

impl InputGuard {
    fn enter(stdout: &mut io::Stdout) -> Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(stdout, cursor::Show)?;
        Ok(Self)
    }
}

impl Drop for InputGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, cursor::Show, ResetColor);
        let _ = terminal::disable_raw_mode();
        let _ = stdout.flush();
    }
}

fn insert_char_at(input: &mut String, char_idx: usize, ch: char) {
    let byte_idx = byte_index_at_char(input, char_idx);
    input.insert(byte_idx, ch);
}

/// 문자 위치에 문자열을 끼우고 끼운 문자 수를 반환한다.
fn insert_str_at(input: &mut String, char_idx: usize, text: &str) -> usize {
    let byte_idx = byte_index_at_char(input, char_idx);
    input.insert_str(byte_idx, text);
    text.chars().count()
}

fn remove_char_at(input: &mut String, char_idx: usize) {
    let start = byte_index_at_char(input, char_idx);
    let end = byte_index_at_char(input, char_idx + 1);
    if start < end && end <= input.len() {
        input.replace_range(start..end, "");
    }
}

fn byte_index_at_char(input: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    input
        .char_indices()
        .nth(char_idx)
        .map(|(idx, _)| idx)
        .unwrap_or(input.len())
}
