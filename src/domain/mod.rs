//! Domain layer
//! 문장 경계 판정, 메타 명령 해석, 상태/오류 규칙을 외부 의존성 없이 표현한다.

pub mod demo;
pub mod lexer;
pub mod meta_command;
pub mod query;
pub mod session;
pub mod state;
pub mod statement;
