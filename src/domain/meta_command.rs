//! 클라이언트 전용 메타 명령(백슬래시 명령) 디스패치 테이블.
//!
//! 명령 이름 → 허용 인자 수 → 변환 규칙을 정적 테이블로 관리한다.
//! 인자 내용은 불투명한 토큰으로 다루고 개수만 검증한다.

use std::ops::RangeInclusive;

use crate::domain::state::{ShellAction, ShellError};

/// 메타 명령 변환 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// 누산 버퍼를 대체해 곧바로 실행할 SQL
    Sql(String),
    Quit,
    Action(ShellAction),
    /// `\demo` 뒤의 인자
    Demo(Vec<String>),
    Set { name: String, value: Option<String> },
    Unset(String),
}

/// 인자 수는 `dispatch`에서 먼저 검증하므로 핸들러는 실패하지 않는다.
type Handler = fn(&[&str]) -> Directive;

#[derive(Clone, Copy)]
pub enum Translation {
    /// 인자 없이 고정 SQL로 치환
    Fixed(&'static str),
    Handler(Handler),
}

pub struct CommandSpec {
    pub names: &'static [&'static str],
    pub arity: RangeInclusive<usize>,
    /// 이름 뒤에 붙는 인자 표기
    pub args: &'static str,
    pub description: &'static str,
    pub translation: Translation,
}

impl CommandSpec {
    pub fn usage(&self, escape: char) -> String {
        if self.args.is_empty() {
            format!("{escape}{}", self.names[0])
        } else {
            format!("{escape}{} {}", self.names[0], self.args)
        }
    }

    pub fn translate(&self, args: &[&str]) -> Directive {
        match self.translation {
            Translation::Fixed(sql) => Directive::Sql(sql.to_string()),
            Translation::Handler(handler) => handler(args),
        }
    }
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        names: &["l"],
        arity: 0..=0,
        args: "",
        description: "list databases",
        translation: Translation::Fixed("SHOW DATABASES"),
    },
    CommandSpec {
        names: &["dt"],
        arity: 0..=0,
        args: "",
        description: "list tables",
        translation: Translation::Fixed("SHOW TABLES"),
    },
    CommandSpec {
        names: &["dT"],
        arity: 0..=0,
        args: "",
        description: "list user-defined types",
        translation: Translation::Fixed("SHOW TYPES"),
    },
    CommandSpec {
        names: &["du"],
        arity: 0..=0,
        args: "",
        description: "list users",
        translation: Translation::Fixed("SHOW USERS"),
    },
    CommandSpec {
        names: &["dg"],
        arity: 0..=0,
        args: "",
        description: "list roles",
        translation: Translation::Fixed("SHOW ROLES"),
    },
    CommandSpec {
        names: &["d"],
        arity: 0..=1,
        args: "[table]",
        description: "list tables, or columns of a table",
        translation: Translation::Handler(describe),
    },
    CommandSpec {
        names: &["dd"],
        arity: 1..=1,
        args: "<table>",
        description: "list constraints of a table",
        translation: Translation::Handler(describe_constraints),
    },
    CommandSpec {
        names: &["c", "connect"],
        arity: 0..=1,
        args: "[database]",
        description: "reconnect, optionally switching database",
        translation: Translation::Handler(reconnect),
    },
    CommandSpec {
        names: &["set"],
        arity: 0..=2,
        args: "[option [value]]",
        description: "show or set client options",
        translation: Translation::Handler(set_option),
    },
    CommandSpec {
        names: &["unset"],
        arity: 1..=1,
        args: "<option>",
        description: "turn a client option off",
        translation: Translation::Handler(unset_option),
    },
    CommandSpec {
        names: &["demo"],
        arity: 1..=2,
        args: "<verb> [node|*]",
        description: "manage demo cluster nodes",
        translation: Translation::Handler(demo),
    },
    CommandSpec {
        names: &["?", "h", "help"],
        arity: 0..=0,
        args: "",
        description: "show this help",
        translation: Translation::Handler(help),
    },
    CommandSpec {
        names: &["q", "quit"],
        arity: 0..=0,
        args: "",
        description: "exit the shell",
        translation: Translation::Handler(quit),
    },
];

/// 이름(이스케이프 문자 제외)으로 명령 사양을 찾는다.
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.names.contains(&name))
}

/// 입력 줄이 메타 명령인지 판정한다.
pub fn is_meta_command(line: &str, escape: char) -> bool {
    line.trim_start().starts_with(escape)
}

/// 메타 명령 줄을 해석해 변환 결과를 반환한다.
pub fn dispatch(line: &str, escape: char) -> Result<Directive, ShellError> {
    let body = line
        .trim_start()
        .strip_prefix(escape)
        .ok_or_else(|| ShellError::invalid_syntax(format!("not a {escape} command")))?;

    let mut parts = body.split_whitespace();
    let name = parts.next().unwrap_or("");
    let args: Vec<&str> = parts.collect();

    let spec = lookup(name).ok_or_else(|| {
        ShellError::invalid_syntax(format!(
            "unknown command: {escape}{name} (try {escape}? for help)"
        ))
    })?;

    if !spec.arity.contains(&args.len()) {
        return Err(ShellError::invalid_syntax(format!(
            "usage: {}",
            spec.usage(escape)
        )));
    }

    Ok(spec.translate(&args))
}

fn describe(args: &[&str]) -> Directive {
    match args.first() {
        None => Directive::Sql("SHOW TABLES".to_string()),
        Some(table) => Directive::Sql(format!("SHOW COLUMNS FROM {table}")),
    }
}

fn describe_constraints(args: &[&str]) -> Directive {
    Directive::Sql(format!("SHOW CONSTRAINTS FROM {}", first_arg(args)))
}

fn reconnect(args: &[&str]) -> Directive {
    Directive::Action(ShellAction::Reconnect {
        database: args.first().map(|db| db.to_string()),
    })
}

fn set_option(args: &[&str]) -> Directive {
    match args {
        [] => Directive::Action(ShellAction::ShowOptions),
        [name, rest @ ..] => Directive::Set {
            name: name.to_string(),
            value: rest.first().map(|value| value.to_string()),
        },
    }
}

fn unset_option(args: &[&str]) -> Directive {
    Directive::Unset(first_arg(args).to_string())
}

fn demo(args: &[&str]) -> Directive {
    Directive::Demo(args.iter().map(|a| a.to_string()).collect())
}

fn help(_: &[&str]) -> Directive {
    Directive::Action(ShellAction::Help)
}

fn quit(_: &[&str]) -> Directive {
    Directive::Quit
}

fn first_arg<'a>(args: &[&'a str]) -> &'a str {
    args.first().copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql(line: &str) -> String {
        match dispatch(line, '\\') {
            Ok(Directive::Sql(sql)) => sql,
            other => panic!("{line}: expected SQL, got {other:?}"),
        }
    }

    #[test]
    fn test_sql_aliases() {
        assert_eq!(sql(r"\l"), "SHOW DATABASES");
        assert_eq!(sql(r"\dt"), "SHOW TABLES");
        assert_eq!(sql(r"\dT"), "SHOW TYPES");
        assert_eq!(sql(r"\du"), "SHOW USERS");
        assert_eq!(sql(r"\dg"), "SHOW ROLES");
        assert_eq!(sql(r"\d"), "SHOW TABLES");
        assert_eq!(sql(r"\d mytable"), "SHOW COLUMNS FROM mytable");
        assert_eq!(sql(r"  \dd   orders "), "SHOW CONSTRAINTS FROM orders");
    }

    #[test]
    fn test_table_argument_is_opaque() {
        assert_eq!(sql(r"\d db.public.t;"), "SHOW COLUMNS FROM db.public.t;");
        // 인용 부호를 해석하지 않으므로 공백이 든 이름은 인자 두 개가 된다.
        assert!(matches!(
            dispatch(r#"\d "My Table""#, '\\'),
            Err(ShellError::InvalidSyntax(_))
        ));
    }

    #[test]
    fn test_invalid_forms() {
        for line in [r"\d goodarg badarg", r"\dz", r"\", r"\l extra", r"\dd", r"\unset"] {
            assert!(
                matches!(dispatch(line, '\\'), Err(ShellError::InvalidSyntax(_))),
                "{line}"
            );
        }
    }

    #[test]
    fn test_internal_actions() {
        assert_eq!(dispatch(r"\q", '\\'), Ok(Directive::Quit));
        assert_eq!(dispatch(r"\quit", '\\'), Ok(Directive::Quit));
        assert_eq!(
            dispatch(r"\?", '\\'),
            Ok(Directive::Action(ShellAction::Help))
        );
        assert_eq!(
            dispatch(r"\c movr", '\\'),
            Ok(Directive::Action(ShellAction::Reconnect {
                database: Some("movr".to_string())
            }))
        );
        assert_eq!(
            dispatch(r"\set", '\\'),
            Ok(Directive::Action(ShellAction::ShowOptions))
        );
        assert_eq!(
            dispatch(r"\set echo off", '\\'),
            Ok(Directive::Set {
                name: "echo".to_string(),
                value: Some("off".to_string())
            })
        );
        assert_eq!(
            dispatch(r"\demo shutdown 2", '\\'),
            Ok(Directive::Demo(vec!["shutdown".to_string(), "2".to_string()]))
        );
    }

    #[test]
    fn test_custom_escape_character() {
        assert!(is_meta_command("  #l", '#'));
        assert!(!is_meta_command(r"\l", '#'));
        assert_eq!(dispatch("#l", '#'), Ok(Directive::Sql("SHOW DATABASES".to_string())));
    }

    #[test]
    fn test_usage_errors_use_configured_escape() {
        let cases = [
            ("#d a b", "usage: #d [table]"),
            ("#dd", "usage: #dd <table>"),
            ("#set a b c", "usage: #set [option [value]]"),
            ("#unset", "usage: #unset <option>"),
        ];
        for (line, usage) in cases {
            assert_eq!(
                dispatch(line, '#'),
                Err(ShellError::InvalidSyntax(usage.to_string())),
                "{line}"
            );
        }
    }

    #[test]
    fn test_every_name_is_unique() {
        let mut names: Vec<&str> = COMMANDS.iter().flat_map(|s| s.names.iter().copied()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
