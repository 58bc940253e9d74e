//! 데모 클러스터 노드 명령(`\demo <verb> [node]`) 해석 규칙.

use std::fmt;

use crate::domain::state::ShellError;

pub const DEMO_USAGE: &str = "\\demo <shutdown|restart|decommission|recommission> <node id|*> | \\demo ls";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoVerb {
    Shutdown,
    Restart,
    Decommission,
    Recommission,
    List,
}

impl DemoVerb {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "shutdown" => Some(DemoVerb::Shutdown),
            "restart" => Some(DemoVerb::Restart),
            "decommission" => Some(DemoVerb::Decommission),
            "recommission" => Some(DemoVerb::Recommission),
            "ls" => Some(DemoVerb::List),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DemoVerb::Shutdown => "shutdown",
            DemoVerb::Restart => "restart",
            DemoVerb::Decommission => "decommission",
            DemoVerb::Recommission => "recommission",
            DemoVerb::List => "ls",
        }
    }

    pub fn takes_selector(self) -> bool {
        !matches!(self, DemoVerb::List)
    }

    /// 모든 노드를 한 번에 내리는 동작은 `*`를 허용하지 않는다.
    pub fn accepts_wildcard(self) -> bool {
        matches!(self, DemoVerb::Restart | DemoVerb::Recommission)
    }
}

/// 대상 노드: 양의 정수 id 또는 전체(`*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeSelector {
    Node(u32),
    All,
}

impl NodeSelector {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "*" {
            return Some(NodeSelector::All);
        }
        // `+3` 같은 부호 표기는 허용하지 않는다.
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match raw.parse::<u32>() {
            Ok(id) if id > 0 => Some(NodeSelector::Node(id)),
            _ => None,
        }
    }
}

impl fmt::Display for NodeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeSelector::Node(id) => write!(f, "node {id}"),
            NodeSelector::All => write!(f, "all nodes"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoCommand {
    pub verb: DemoVerb,
    pub selector: Option<NodeSelector>,
}

impl DemoCommand {
    /// `\demo` 뒤의 인자 목록을 검증해 명령으로 변환한다.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, ShellError> {
        let usage = || ShellError::invalid_syntax(format!("usage: {DEMO_USAGE}"));

        let Some(raw_verb) = args.first() else {
            return Err(usage());
        };
        let verb = DemoVerb::parse(raw_verb.as_ref()).ok_or_else(|| {
            ShellError::invalid_syntax(format!("unknown demo command: {}", raw_verb.as_ref()))
        })?;

        if !verb.takes_selector() {
            if args.len() != 1 {
                return Err(usage());
            }
            return Ok(Self {
                verb,
                selector: None,
            });
        }

        let [_, raw_selector] = args else {
            return Err(usage());
        };
        let raw_selector = raw_selector.as_ref();
        let selector = NodeSelector::parse(raw_selector).ok_or_else(|| {
            ShellError::invalid_syntax(format!(
                "invalid node id: {raw_selector} (expected a positive integer)"
            ))
        })?;

        if selector == NodeSelector::All && !verb.accepts_wildcard() {
            return Err(ShellError::invalid_syntax(format!(
                "{} does not accept *; name a single node",
                verb.as_str()
            )));
        }

        Ok(Self {
            verb,
            selector: Some(selector),
        })
    }
}
