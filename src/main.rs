use anyhow::{Context, Result};
use clash_preprocessor::config::{
    load_document, render_document, write_document, CompilerOptions, DocumentFormat,
};
use clash_preprocessor::logger::{init_env_logger, init_logger, LogConfig, LogConfigFile};
use clash_preprocessor::ConfigCompiler;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};

#[derive(Debug, Serialize, Deserialize)]
struct Config {
    /// 原始 Clash 配置（.yaml/.yml 或 .json）
    input: String,
    /// 输出路径，缺省时以 YAML 写到标准输出
    output: Option<String>,
    /// 日志配置（可选）
    log: Option<LogConfigFile>,
    /// 关键词与地区规则（可选，缺省使用内置表）
    #[serde(flatten)]
    options: CompilerOptions,
}

fn main() -> Result<()> {
    // 读取配置文件路径（命令行参数或默认值）
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "preprocess.json".to_string());

    let config_content = fs::read_to_string(&config_path)
        .context(format!("无法读取配置文件: {}", config_path))?;

    let config: Config = serde_json::from_str(&config_content)
        .context("解析配置文件失败")?;

    // 初始化日志系统，未配置时交给 env_logger
    let log_init = match &config.log {
        Some(log_config_file) => init_logger(LogConfig::from(log_config_file)),
        None => init_env_logger(),
    };
    log_init.map_err(|e| anyhow::anyhow!("初始化日志系统失败: {}", e))?;

    log::info!("配置文件: {}", config_path);
    log::info!("输入: {}", config.input);
    log::info!(
        "过滤关键词 {} 个, 地区规则 {} 个",
        config.options.keywords.len(),
        config.options.regions.len()
    );

    let raw = load_document(&config.input)?;
    let compiler = ConfigCompiler::new(config.options);
    let compiled = compiler.compile(&raw);

    match &config.output {
        Some(output) => {
            write_document(&compiled, output)?;
            log::info!("已写入: {}", output);
        }
        None => {
            let text = render_document(&compiled, DocumentFormat::Yaml)?;
            io::stdout()
                .write_all(text.as_bytes())
                .context("写入标准输出失败")?;
        }
    }

    Ok(())
}
