use std::path::PathBuf;

use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use dxfbound_config::{AppConfig, ConfigError};

fn main() {
    let mut args = std::env::args().skip(1);
    let mut paths: Vec<PathBuf> = Vec::new();
    let mut config_override: Option<PathBuf> = None;
    let mut tolerance_override: Option<f64> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(path) = args.next() else {
                    eprintln!("`--config` 需要提供配置文件路径");
                    std::process::exit(1);
                };
                config_override = Some(PathBuf::from(path));
            }
            "--tolerance" => {
                let Some(raw) = args.next() else {
                    eprintln!("`--tolerance` 需要提供毫米数值");
                    std::process::exit(1);
                };
                match raw.parse::<f64>() {
                    Ok(value) => tolerance_override = Some(value),
                    Err(_) => {
                        eprintln!("无法解析容差数值：{raw}");
                        std::process::exit(1);
                    }
                }
            }
            other if other.starts_with('-') => {
                eprintln!("未知参数：{other}");
                std::process::exit(1);
            }
            other => paths.push(PathBuf::from(other)),
        }
    }

    let mut config = load_configuration(config_override);
    if let Some(tolerance) = tolerance_override {
        config.engine.tolerance_mm = tolerance;
    }
    init_logging(&config);
    info!("启动 DXF 范围统计应用");

    if let Err(err) = dxfbound_frontend::run_cli(&paths, &config) {
        error!(error = %err, "批处理执行失败");
        std::process::exit(1);
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
