use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别
    pub level: LogLevel,
    /// 是否显示时间戳
    pub show_timestamp: bool,
    /// 是否显示模块路径
    pub show_module: bool,
    /// 是否使用颜色输出（仅终端）
    pub use_color: bool,
    /// 日志输出目标
    pub output: LogOutput,
}

/// 日志输出目标
///
/// 标准输出留给编译后的配置，日志只写标准错误或文件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    /// 仅输出到标准错误
    Stderr,
    /// 仅输出到文件
    File(PathBuf),
    /// 同时输出到标准错误和文件
    Both(PathBuf),
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// 转换为 log::LevelFilter
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }

    /// 从字符串解析日志级别
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" => Some(LogLevel::Off),
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            show_timestamp: true,
            show_module: false,
            use_color: true,
            output: LogOutput::Stderr,
        }
    }
}

impl LogConfig {
    /// 创建新的日志配置
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    pub fn with_timestamp(mut self, show: bool) -> Self {
        self.show_timestamp = show;
        self
    }

    pub fn with_module(mut self, show: bool) -> Self {
        self.show_module = show;
        self
    }

    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    /// 设置输出到文件
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output = LogOutput::File(path.as_ref().to_path_buf());
        self
    }

    /// 设置同时输出到标准错误和文件
    pub fn with_both<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output = LogOutput::Both(path.as_ref().to_path_buf());
        self
    }
}

/// 驱动配置文件中的日志段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfigFile {
    /// 日志级别: off, error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 日志输出目标: stderr, file, both
    #[serde(default = "default_log_output")]
    pub output: String,
    /// 日志文件路径（当 output 为 file 或 both 时使用）
    pub file_path: Option<String>,
    #[serde(default = "default_true")]
    pub show_timestamp: bool,
    #[serde(default)]
    pub show_module: bool,
    #[serde(default = "default_true")]
    pub use_color: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

const DEFAULT_LOG_FILE: &str = "logs/clash-preprocessor.log";

impl Default for LogConfigFile {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            output: default_log_output(),
            file_path: None,
            show_timestamp: true,
            show_module: false,
            use_color: true,
        }
    }
}

impl From<&LogConfigFile> for LogConfig {
    fn from(file: &LogConfigFile) -> Self {
        let level = LogLevel::from_str(&file.level).unwrap_or(LogLevel::Info);
        let config = LogConfig::new(level)
            .with_timestamp(file.show_timestamp)
            .with_module(file.show_module)
            .with_color(file.use_color);

        let file_path = file.file_path.as_deref().unwrap_or(DEFAULT_LOG_FILE);
        match file.output.as_str() {
            "file" => config.with_file(file_path),
            "both" => config.with_both(file_path),
            _ => config,
        }
    }
}

/// 自定义日志器
struct PreprocessLogger {
    config: LogConfig,
    file: Option<Mutex<File>>,
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

impl Log for PreprocessLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.config.level.to_level_filter()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if matches!(self.config.output, LogOutput::Stderr | LogOutput::Both(_)) {
            eprintln!("{}", self.format_log(record, self.config.use_color));
        }

        // 文件中不使用颜色
        if let Some(file) = &self.file {
            if let Ok(mut f) = file.lock() {
                let _ = writeln!(f, "{}", self.format_log(record, false));
            }
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            if let Ok(mut f) = file.lock() {
                let _ = f.flush();
            }
        }
    }
}

impl PreprocessLogger {
    fn format_log(&self, record: &Record, use_color: bool) -> String {
        let timestamp = if self.config.show_timestamp {
            format!("[{}] ", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
        } else {
            String::new()
        };

        let level = if use_color {
            match record.level() {
                log::Level::Error => "\x1b[31mERROR\x1b[0m",
                log::Level::Warn => "\x1b[33mWARN \x1b[0m",
                log::Level::Info => "\x1b[32mINFO \x1b[0m",
                log::Level::Debug => "\x1b[36mDEBUG\x1b[0m",
                log::Level::Trace => "\x1b[35mTRACE\x1b[0m",
            }
        } else {
            match record.level() {
                log::Level::Error => "ERROR",
                log::Level::Warn => "WARN ",
                log::Level::Info => "INFO ",
                log::Level::Debug => "DEBUG",
                log::Level::Trace => "TRACE",
            }
        };

        let module = match record.module_path() {
            Some(module_path) if self.config.show_module => format!("[{}] ", module_path),
            _ => String::new(),
        };

        format!("{}{} {}{}", timestamp, level, module, record.args())
    }
}

/// 初始化日志系统
///
/// ```no_run
/// use clash_preprocessor::logger::{init_logger, LogConfig, LogLevel};
///
/// let config = LogConfig::new(LogLevel::Debug).with_both("logs/preprocess.log");
/// init_logger(config).unwrap();
/// ```
pub fn init_logger(config: LogConfig) -> Result<(), String> {
    let file = match &config.output {
        LogOutput::File(path) | LogOutput::Both(path) => {
            let file = open_log_file(path).map_err(|e| format!("无法创建日志文件: {}", e))?;
            Some(Mutex::new(file))
        }
        LogOutput::Stderr => None,
    };

    let max_level = config.level.to_level_filter();
    log::set_boxed_logger(Box::new(PreprocessLogger { config, file }))
        .map_err(|e| format!("设置日志器失败: {}", e))?;
    log::set_max_level(max_level);

    Ok(())
}

/// 未提供日志配置时使用 env_logger，默认级别 info
pub fn init_env_logger() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init()
        .map_err(|e| format!("设置日志器失败: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::from_str("error"), Some(LogLevel::Error));
        assert_eq!(LogLevel::from_str("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("Debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("off"), Some(LogLevel::Off));
        assert_eq!(LogLevel::from_str("verbose"), None);
    }

    #[test]
    fn test_log_level_to_level_filter() {
        assert_eq!(LogLevel::Off.to_level_filter(), LevelFilter::Off);
        assert_eq!(LogLevel::Warn.to_level_filter(), LevelFilter::Warn);
        assert_eq!(LogLevel::Trace.to_level_filter(), LevelFilter::Trace);
    }

    #[test]
    fn test_log_config_default_writes_stderr() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.output, LogOutput::Stderr);
        assert!(!config.show_module);
    }

    #[test]
    fn test_log_config_from_file_section() {
        let section: LogConfigFile =
            serde_json::from_str(r#"{"level": "debug", "output": "both", "use_color": false}"#).unwrap();
        let config = LogConfig::from(&section);

        assert_eq!(config.level, LogLevel::Debug);
        assert!(!config.use_color);
        assert!(config.show_timestamp);
        assert_eq!(config.output, LogOutput::Both(PathBuf::from(DEFAULT_LOG_FILE)));
    }

    #[test]
    fn test_log_config_file_defaults() {
        let config = LogConfig::from(&LogConfigFile::default());
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.output, LogOutput::Stderr);

        let section = LogConfigFile {
            level: "nonsense".to_string(),
            output: "file".to_string(),
            file_path: Some("out/run.log".to_string()),
            ..Default::default()
        };
        let config = LogConfig::from(&section);
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.output, LogOutput::File(PathBuf::from("out/run.log")));
    }
}
