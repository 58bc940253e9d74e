//! 병합된 쉘 설정과 탐색 경로를 확인하는 유스케이스.

use anyhow::Result;

use crate::application::ports::ConfigRepository;

/// `sqlsh config` 출력용 설정 진단 JSON을 만든다.
pub struct InspectConfigUseCase<'a> {
    pub config_repo: &'a dyn ConfigRepository,
}

impl<'a> InspectConfigUseCase<'a> {
    pub fn execute(&self) -> Result<String> {
        self.config_repo.inspect_pretty_json()
    }
}
