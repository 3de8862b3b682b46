pub mod cli;
pub mod errors;
pub mod loader;

use std::path::PathBuf;

use tracing::info;

use dxfbound_config::AppConfig;
use errors::FrontendError;

/// 启动 CLI 批处理前端。
pub fn run_cli(paths: &[PathBuf], config: &AppConfig) -> Result<(), FrontendError> {
    info!(file_count = paths.len(), "启动 CLI 批处理前端");
    cli::run_batch(paths, config)
}
