//! 문장 종료 판정용 경량 SQL 어휘 스캐너.
//!
//! 파서를 만들지 않고 토큰 경계(주석, 문자열, 인용 식별자, 세미콜론)만 추적한다.
//! 잘못된 토큰(닫히지 않은 문자열, 잘못된 이스케이프)은 실패 대신 `Other`로 분류하고
//! 가능한 위치부터 스캔을 이어간다.

use std::ops::Range;

/// 스캐너가 구분하는 토큰 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexicalToken {
    Semicolon,
    LineComment,
    BlockComment,
    String,
    Other,
}

impl LexicalToken {
    pub fn is_comment(self) -> bool {
        matches!(self, LexicalToken::LineComment | LexicalToken::BlockComment)
    }
}

/// 입력 전체를 스캔한 결과(마지막 토큰 + 내용 존재 여부).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LexicalScan {
    /// 주석을 제외한 마지막 토큰
    pub last_token: Option<LexicalToken>,
    /// 공백/주석 외의 내용이 하나라도 있었는지 여부
    pub non_empty: bool,
}

impl LexicalScan {
    pub fn is_end(&self) -> bool {
        is_end_of_statement(self.last_token)
    }
}

/// 마지막 토큰이 최상위 세미콜론일 때만 문장이 끝난 것으로 본다.
pub fn is_end_of_statement(last_token: Option<LexicalToken>) -> bool {
    last_token == Some(LexicalToken::Semicolon)
}

/// 입력의 마지막 어휘 토큰과 내용 존재 여부를 반환한다.
pub fn last_lexical_token(input: &str) -> LexicalScan {
    let mut scan = LexicalScan::default();
    for (token, _) in Scanner::new(input) {
        if token.is_comment() {
            continue;
        }
        scan.last_token = Some(token);
        scan.non_empty = true;
    }
    scan
}

/// 최상위 세미콜론 기준으로 입력을 개별 문장으로 나눈다.
/// 주석/공백만 있는 조각은 버리고, 끝의 세미콜론은 포함하지 않는다.
pub fn split_statements(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut has_content = false;

    for (token, span) in Scanner::new(input) {
        match token {
            LexicalToken::Semicolon => {
                if has_content {
                    out.push(input[start..span.start].trim().to_string());
                }
                start = span.end;
                has_content = false;
            }
            token if token.is_comment() => {}
            _ => has_content = true,
        }
    }

    if has_content {
        out.push(input[start..].trim().to_string());
    }
    out
}

/// 토큰과 바이트 범위를 순서대로 내보내는 스캐너.
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn consume(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        &self.input[start..self.pos]
    }

    fn take_up_to(&mut self, max: usize, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        let mut taken = 0;
        while taken < max {
            match self.peek() {
                Some(ch) if pred(ch) => {
                    self.pos += ch.len_utf8();
                    taken += 1;
                }
                _ => break,
            }
        }
        &self.input[start..self.pos]
    }

    fn skip_to_end(&mut self) -> LexicalToken {
        self.pos = self.input.len();
        LexicalToken::Other
    }

    fn scan_line_comment(&mut self) -> LexicalToken {
        self.take_while(|ch| ch != '\n');
        LexicalToken::LineComment
    }

    fn scan_block_comment(&mut self) -> LexicalToken {
        let mut nesting = 0usize;
        while let Some(ch) = self.bump() {
            match ch {
                '*' if self.consume('/') => {
                    if nesting == 0 {
                        return LexicalToken::BlockComment;
                    }
                    nesting -= 1;
                }
                '/' if self.consume('*') => nesting += 1,
                _ => {}
            }
        }
        // 닫히지 않은 블록 주석은 아직 입력 중인 내용으로 취급한다.
        LexicalToken::Other
    }

    fn scan_string(&mut self) -> LexicalToken {
        loop {
            match self.bump() {
                Some('\'') if self.consume('\'') => {}
                Some('\'') => return LexicalToken::String,
                Some(_) => {}
                None => return LexicalToken::Other,
            }
        }
    }

    /// `e'...'`/`b'...'` 백슬래시 이스케이프 문자열을 스캔한다.
    /// 이스케이프가 잘못돼도 닫는 따옴표까지는 소비해 이후 토큰을 살린다.
    fn scan_escaped_string(&mut self, require_utf8: bool) -> LexicalToken {
        let mut bytes = Vec::new();
        let mut valid = true;

        loop {
            match self.bump() {
                None => return LexicalToken::Other,
                Some('\'') if self.consume('\'') => bytes.push(b'\''),
                Some('\'') => break,
                Some('\\') => match self.bump() {
                    None => return LexicalToken::Other,
                    Some('x') => {
                        let digits = self.take_up_to(2, |ch| ch.is_ascii_hexdigit());
                        match u8::from_str_radix(digits, 16) {
                            Ok(byte) => bytes.push(byte),
                            Err(_) => valid = false,
                        }
                    }
                    Some(first @ '0'..='7') => {
                        let rest = self.take_up_to(2, |ch| matches!(ch, '0'..='7'));
                        let value = u32::from_str_radix(&format!("{first}{rest}"), 8).unwrap_or(u32::MAX);
                        match u8::try_from(value) {
                            Ok(byte) => bytes.push(byte),
                            Err(_) => valid = false,
                        }
                    }
                    Some('u') => valid &= self.push_unicode_escape(4, &mut bytes),
                    Some('U') => valid &= self.push_unicode_escape(8, &mut bytes),
                    Some('a') => bytes.push(0x07),
                    Some('b') => bytes.push(0x08),
                    Some('f') => bytes.push(0x0c),
                    Some('n') => bytes.push(b'\n'),
                    Some('r') => bytes.push(b'\r'),
                    Some('t') => bytes.push(b'\t'),
                    Some('v') => bytes.push(0x0b),
                    Some(other) => push_char(&mut bytes, other),
                },
                Some(ch) => push_char(&mut bytes, ch),
            }
        }

        if valid && (!require_utf8 || std::str::from_utf8(&bytes).is_ok()) {
            LexicalToken::String
        } else {
            LexicalToken::Other
        }
    }

    fn push_unicode_escape(&mut self, width: usize, bytes: &mut Vec<u8>) -> bool {
        let digits = self.take_up_to(width, |ch| ch.is_ascii_hexdigit());
        if digits.len() != width {
            return false;
        }
        let Some(ch) = u32::from_str_radix(digits, 16)
            .ok()
            .and_then(|codepoint| char::try_from(codepoint).ok())
        else {
            return false;
        };
        push_char(bytes, ch);
        true
    }

    fn scan_quoted_ident(&mut self) -> LexicalToken {
        loop {
            match self.bump() {
                Some('"') if self.consume('"') => {}
                Some('"') => return LexicalToken::Other,
                Some(_) => {}
                None => return LexicalToken::Other,
            }
        }
    }

    /// `$1` 자리표시자 또는 `$tag$ ... $tag$` 문자열을 스캔한다.
    fn scan_dollar(&mut self) -> LexicalToken {
        if matches!(self.peek(), Some('0'..='9')) {
            self.take_while(|ch| ch.is_ascii_digit());
            return LexicalToken::Other;
        }

        let rest = &self.input[self.pos..];
        let tag_len = rest
            .char_indices()
            .find(|(_, ch)| !is_dollar_tag_char(*ch))
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let tag = &rest[..tag_len];
        let tag_is_valid = tag.chars().next().is_none_or(|ch| !ch.is_ascii_digit());
        if !tag_is_valid || !rest[tag_len..].starts_with('$') {
            return LexicalToken::Other;
        }

        let delimiter = format!("${tag}$");
        let body_start = self.pos + tag_len + 1;
        match self.input[body_start..].find(&delimiter) {
            Some(offset) => {
                self.pos = body_start + offset + delimiter.len();
                LexicalToken::String
            }
            None => self.skip_to_end(),
        }
    }

    fn scan_word(&mut self) -> LexicalToken {
        self.take_while(is_ident_char);
        LexicalToken::Other
    }
}

impl Iterator for Scanner<'_> {
    type Item = (LexicalToken, Range<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        self.take_while(char::is_whitespace);
        let start = self.pos;
        let ch = self.bump()?;

        let token = match ch {
            '-' if self.consume('-') => self.scan_line_comment(),
            '/' if self.consume('*') => self.scan_block_comment(),
            ';' => LexicalToken::Semicolon,
            '\'' => self.scan_string(),
            'e' | 'E' if self.consume('\'') => self.scan_escaped_string(true),
            'b' | 'B' if self.consume('\'') => self.scan_escaped_string(false),
            'x' | 'X' if self.consume('\'') => self.scan_string(),
            '"' => self.scan_quoted_ident(),
            '$' => self.scan_dollar(),
            _ if is_ident_char(ch) => self.scan_word(),
            _ => LexicalToken::Other,
        };

        Some((token, start..self.pos))
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$' || ch == '.'
}

fn is_dollar_tag_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn push_char(bytes: &mut Vec<u8>, ch: char) {
    let mut buf = [0u8; 4];
    bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(input: &str) -> (bool, bool) {
        let scan = last_lexical_token(input);
        (scan.is_end(), scan.non_empty)
    }

    #[test]
    fn test_end_of_statement_table() {
        let cases = [
            (";", true, true),
            ("; /* comment */", true, true),
            ("; SELECT", false, true),
            ("SELECT", false, true),
            ("SET; SELECT 1;", true, true),
            ("SELECT ''''; SET;", true, true),
            ("  -- hello", false, false),
            ("select 'abc", false, true),
            ("'abc", false, true),
            (r"SELECT e'\xaa';", true, true),
        ];

        for (input, is_end, non_empty) in cases {
            assert_eq!(classify(input), (is_end, non_empty), "input: {input:?}");
        }
    }

    #[test]
    fn test_whitespace_and_comments_only() {
        assert_eq!(classify(""), (false, false));
        assert_eq!(classify("   \n\t "), (false, false));
        assert_eq!(classify("/* a */ -- b\n/* /* nested */ */"), (false, false));
    }

    #[test]
    fn test_semicolon_inside_literals_is_not_an_end() {
        assert_eq!(classify("SELECT 'a;"), (false, true));
        assert_eq!(classify("SELECT \"weird;name"), (false, true));
        assert_eq!(classify("SELECT $$ body; $$"), (false, true));
        assert_eq!(classify("SELECT $fn$ a; b"), (false, true));
        assert_eq!(classify("SELECT 1 -- done;"), (false, true));
        assert_eq!(classify("SELECT 1 /* ; */"), (false, true));
    }

    #[test]
    fn test_trailing_comment_after_semicolon_still_ends() {
        assert_eq!(classify("SELECT 1; -- trailing"), (true, true));
        assert_eq!(classify("SELECT 1;\n/* a */\n-- b"), (true, true));
    }

    #[test]
    fn test_unterminated_block_comment_is_content() {
        assert_eq!(classify("SELECT 1; /* still typing"), (false, true));
    }

    #[test]
    fn test_escaped_strings() {
        assert_eq!(
            last_lexical_token(r"e'it\'s'").last_token,
            Some(LexicalToken::String)
        );
        assert_eq!(
            last_lexical_token(r"E'é'").last_token,
            Some(LexicalToken::String)
        );
        assert_eq!(
            last_lexical_token(r"e'\u12'").last_token,
            Some(LexicalToken::Other)
        );
        assert_eq!(
            last_lexical_token(r"b'\xaa'").last_token,
            Some(LexicalToken::String)
        );
        // 백슬래시로 닫는 따옴표가 이스케이프되면 문자열이 끝나지 않는다.
        assert_eq!(classify(r"SELECT e'abc\';"), (false, true));
    }

    #[test]
    fn test_dollar_placeholders_and_identifiers() {
        assert_eq!(classify("SELECT $1;"), (true, true));
        assert_eq!(classify("SELECT a$b;"), (true, true));
        assert_eq!(classify("SELECT \"a\"\"b\";"), (true, true));
    }

    #[test]
    fn test_scan_is_repeatable() {
        let input = "SELECT 'x'; -- c";
        assert_eq!(last_lexical_token(input), last_lexical_token(input));
    }

    #[test]
    fn test_split_statements() {
        assert_eq!(
            split_statements("SET a = 1; SELECT ';' ;;\n-- only comment\n"),
            vec!["SET a = 1".to_string(), "SELECT ';'".to_string()]
        );
        assert_eq!(split_statements("SELECT 1"), vec!["SELECT 1".to_string()]);
        assert!(split_statements("  ;  -- x").is_empty());
    }
}
