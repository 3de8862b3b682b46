use thiserror::Error;

use dxfbound_engine::errors::EngineError;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("内置示例图纸计算失败: {0}")]
    DemoFailed(#[from] EngineError),
}
