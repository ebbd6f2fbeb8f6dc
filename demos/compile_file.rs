use clash_preprocessor::config::{load_document, render_document, DocumentFormat};
use clash_preprocessor::logger::{init_logger, LogConfig, LogLevel};
use clash_preprocessor::{compile_config, CompilerOptions, ConfigCompiler, RegionRuleConfig};
use serde_json::json;

fn main() -> anyhow::Result<()> {
    init_logger(LogConfig::new(LogLevel::Debug).with_module(false))
        .map_err(|e| anyhow::anyhow!(e))?;

    // 示例 1: 编译命令行指定的文件，未指定时使用内置样例
    println!("=== 示例 1: 默认关键词与地区表 ===\n");
    let input = match std::env::args().nth(1) {
        Some(path) => load_document(path)?,
        None => json!({
            "mixed-port": 7890,
            "proxies": [
                {"name": "美国01", "type": "ss", "server": "1.2.3.4", "port": 8388},
                {"name": "香港 IPLC", "type": "trojan", "server": "hk.example.com", "port": 443},
                {"name": "剩余流量: 100GB", "type": "ss", "server": "0.0.0.0", "port": 1},
                {"name": "Moon", "type": "ss", "server": "5.6.7.8", "port": 8388}
            ]
        }),
    };
    let output = compile_config(&input);
    println!("{}", render_document(&output, DocumentFormat::Yaml)?);

    // 示例 2: 自定义地区规则
    println!("=== 示例 2: 自定义地区规则 ===\n");
    let options = CompilerOptions::default().with_regions(vec![RegionRuleConfig {
        name: "韩国节点".to_string(),
        icon: String::new(),
        filter: "(?i)韩国|首尔|KR|Korea".to_string(),
    }]);
    let input = json!({"proxies": [{"name": "首尔 01"}, {"name": "US 01"}]});
    let output = ConfigCompiler::new(options).compile(&input);
    println!("{}", serde_json::to_string_pretty(&output["proxy-groups"])?);

    Ok(())
}
