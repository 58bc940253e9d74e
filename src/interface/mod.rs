//! Interface layer
//! 사용자 입력(CLI/터미널)을 애플리케이션 계층으로 연결한다.

pub mod cli;
