//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `RESGENIE__*` 覆盖（双下划线表示嵌套，如 `RESGENIE__AGENT__MAX_RETRIES=5`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::tools::Backoff;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub agent: AgentSection,
    pub logging: LoggingSection,
}

/// [app] 段：应用名与运行环境
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    #[serde(default = "default_app_name")]
    pub name: String,
    /// development / testing / production
    #[serde(default = "default_env")]
    pub env: String,
}

fn default_app_name() -> String {
    "resgenie".to_string()
}

fn default_env() -> String {
    "development".to_string()
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            env: default_env(),
        }
    }
}

/// [agent] 段：工具调用重试与超时
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// 单次工具调用超时（秒）；仅供部署方参考，核心不强制
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
    /// 取消信号是否当作普通失败继续重试
    #[serde(default)]
    pub retry_on_cancel: bool,
    #[serde(default)]
    pub backoff: Backoff,
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_secs() -> f64 {
    30.0
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            retry_on_cancel: false,
            backoff: Backoff::None,
        }
    }
}

/// [logging] 段：级别、目录、文件名前缀与输出目标
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    /// 日志文件前缀：<file_name>.log 与 <file_name>_error.log
    #[serde(default = "default_app_name")]
    pub file_name: String,
    #[serde(default = "default_true")]
    pub to_console: bool,
    #[serde(default = "default_true")]
    pub to_file: bool,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_true() -> bool {
    true
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
            file_name: default_app_name(),
            to_console: true,
            to_file: true,
            json: false,
        }
    }
}

/// 从 config 目录加载配置，环境变量 RESGENIE__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 RESGENIE__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    for name in ["config/default", "../config/default"] {
        if std::path::Path::new(&format!("{}.toml", name)).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("RESGENIE")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
