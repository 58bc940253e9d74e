//! `sqlsh` 바이너리 진입점.

use sqlsh::interface::cli::{Cli, CliAction};

#[tokio::main]
async fn main() {
    // 로그는 결과 표와 섞이지 않도록 stderr로 보낸다.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let action = match Cli::parse_action() {
        Ok(action) => action,
        Err(msg) => {
            eprintln!("error: {msg}");
            std::process::exit(2);
        }
    };

    match action {
        CliAction::InspectConfig => match sqlsh::inspect_config_pretty_json() {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("error: {err:#}");
                std::process::exit(1);
            }
        },
        CliAction::Shell(args) => match sqlsh::run(args).await {
            Ok(code) => std::process::exit(code),
            Err(err) => {
                eprintln!("error: {err:#}");
                std::process::exit(1);
            }
        },
    }
}
