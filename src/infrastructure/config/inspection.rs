//! 적용 설정 진단(inspection) 뷰 모델.

use serde::Serialize;

use super::loader::LoadedConfig;
use super::types::Config;
use crate::domain::session::SessionOptions;

#[derive(Debug, Clone, Serialize)]
pub struct ConfigInspection {
    pub searched_paths: Vec<String>,
    pub loaded_paths: Vec<String>,
    pub config: Config,
    pub effective: EffectiveSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveSettings {
    pub url: String,
    pub database: Option<String>,
    pub token_source: Option<String>,
    pub token_resolved: bool,
    pub timeout_ms: u64,
    pub prompt: String,
    pub continuation_prompt: String,
    pub interactive_options: SessionOptions,
    pub scripted_options: SessionOptions,
    pub demo_nodes: u32,
}

impl ConfigInspection {
    pub(crate) fn from_loaded(loaded: LoadedConfig) -> Self {
        let cfg = &loaded.config;
        let effective = EffectiveSettings {
            url: cfg.url(),
            database: cfg.database(),
            token_source: cfg.token_source_label(),
            token_resolved: cfg.resolve_token().is_some(),
            timeout_ms: cfg.timeout_ms(),
            prompt: cfg.prompt(),
            continuation_prompt: cfg.continuation_prompt(),
            interactive_options: cfg.session_options(true),
            scripted_options: cfg.session_options(false),
            demo_nodes: cfg.demo_nodes(),
        };

        Self {
            searched_paths: loaded
                .searched_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            loaded_paths: loaded
                .loaded_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            // 인라인 토큰은 진단 출력에 노출하지 않는다.
            config: redact(cfg.clone()),
            effective,
        }
    }
}

fn redact(mut config: Config) -> Config {
    if config.connection.token.is_some() {
        config.connection.token = Some("***".to_string());
    }
    config
}
