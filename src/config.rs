use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::keyword::FILTER_KEYWORDS;
use crate::region::{RegionRule, RegionRuleConfig, DEFAULT_REGION_RULES};

/// 编译选项，所有字段缺省时使用内置表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerOptions {
    /// 过滤关键词（按字面匹配）
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    /// 地区规则，按顺序求值
    #[serde(default = "default_regions")]
    pub regions: Vec<RegionRuleConfig>,
}

fn default_keywords() -> Vec<String> {
    FILTER_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

fn default_regions() -> Vec<RegionRuleConfig> {
    DEFAULT_REGION_RULES.iter().map(RegionRuleConfig::from).collect()
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            regions: default_regions(),
        }
    }
}

impl CompilerOptions {
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_regions(mut self, regions: Vec<RegionRuleConfig>) -> Self {
        self.regions = regions;
        self
    }

    /// 转换为地区规则列表，保持声明顺序
    pub fn region_rules(&self) -> Vec<RegionRule> {
        self.regions.iter().cloned().map(RegionRule::from).collect()
    }
}

/// 配置文档格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// 根据扩展名判断格式，`.yaml`/`.yml` 为 YAML，其余按 JSON 处理
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                DocumentFormat::Yaml
            }
            _ => DocumentFormat::Json,
        }
    }
}

/// 解析配置文档，YAML 中的 `<<` 合并键会先展开
pub fn parse_document(content: &str, format: DocumentFormat) -> Result<Value> {
    let value: Value = match format {
        DocumentFormat::Yaml => {
            let mut yaml: serde_yaml::Value =
                serde_yaml::from_str(content).context("解析 YAML 配置失败")?;
            yaml.apply_merge().context("展开 YAML 合并键失败")?;
            serde_yaml::from_value(yaml).context("解析 YAML 配置失败")?
        }
        DocumentFormat::Json => serde_json::from_str(content).context("解析 JSON 配置失败")?,
    };
    Ok(value)
}

/// 读取并解析配置文档
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
    parse_document(&content, DocumentFormat::from_path(path))
        .with_context(|| format!("配置文件格式错误: {}", path.display()))
}

/// 将配置渲染为文本
pub fn render_document(value: &Value, format: DocumentFormat) -> Result<String> {
    let text = match format {
        DocumentFormat::Yaml => serde_yaml::to_string(value).context("序列化 YAML 失败")?,
        DocumentFormat::Json => {
            let mut text = serde_json::to_string_pretty(value).context("序列化 JSON 失败")?;
            text.push('\n');
            text
        }
    };
    Ok(text)
}

/// 将配置写入文件，格式由扩展名决定
pub fn write_document<P: AsRef<Path>>(value: &Value, path: P) -> Result<()> {
    let path = path.as_ref();
    let text = render_document(value, DocumentFormat::from_path(path))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("无法创建目录: {}", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("无法写入配置文件: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_default() {
        let options = CompilerOptions::default();
        assert_eq!(options.keywords.len(), FILTER_KEYWORDS.len());
        assert_eq!(options.regions.len(), 5);
        assert_eq!(options.region_rules(), *DEFAULT_REGION_RULES);
    }

    #[test]
    fn test_options_partial_json() {
        let options: CompilerOptions = serde_json::from_str(r#"{"keywords": ["剩余"]}"#).unwrap();
        assert_eq!(options.keywords, vec!["剩余".to_string()]);
        assert_eq!(options.regions.len(), 5);

        let options: CompilerOptions = serde_json::from_value(json!({
            "regions": [{"name": "韩国节点", "filter": "(?i)韩|KR"}]
        }))
        .unwrap();
        assert_eq!(options.keywords.len(), FILTER_KEYWORDS.len());
        let rules = options.region_rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].pattern.pattern, "韩|KR");
        assert!(rules[0].icon.is_empty());
    }

    #[test]
    fn test_options_builder() {
        let options = CompilerOptions::default().with_keywords(["a", "b"]).with_regions(vec![]);
        assert_eq!(options.keywords, vec!["a".to_string(), "b".to_string()]);
        assert!(options.region_rules().is_empty());
    }

    #[test]
    fn test_document_format_from_path() {
        assert_eq!(DocumentFormat::from_path("clash.yaml"), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path("clash.YML"), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path("clash.json"), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path("clash"), DocumentFormat::Json);
    }

    #[test]
    fn test_parse_yaml_document() {
        let yaml = r#"
port: 7890
mode: rule
proxies:
  - name: "美国01"
    type: ss
    server: 1.2.3.4
    port: 443
"#;
        let value = parse_document(yaml, DocumentFormat::Yaml).unwrap();
        assert_eq!(value["port"], json!(7890));
        assert_eq!(value["proxies"][0]["name"], json!("美国01"));

        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["port", "mode", "proxies"]);
    }

    #[test]
    fn test_parse_yaml_merge_keys() {
        let yaml = r#"
ss-base: &ss-base
  type: ss
  port: 8388
  cipher: aes-128-gcm
proxies:
  - <<: *ss-base
    name: "香港01"
    server: hk.example.com
  - <<: *ss-base
    name: "日本01"
    port: 443
"#;
        let value = parse_document(yaml, DocumentFormat::Yaml).unwrap();
        let first = value["proxies"][0].as_object().unwrap();
        assert!(!first.contains_key("<<"));
        assert_eq!(first["type"], json!("ss"));
        assert_eq!(first["cipher"], json!("aes-128-gcm"));
        assert_eq!(first["name"], json!("香港01"));
        // 显式字段优先于合并来的字段
        assert_eq!(value["proxies"][1]["port"], json!(443));
    }

    #[test]
    fn test_parse_invalid_document() {
        assert!(parse_document("{not json", DocumentFormat::Json).is_err());
        assert!(parse_document("a: [1, 2", DocumentFormat::Yaml).is_err());
    }

    #[test]
    fn test_render_document() {
        let value = json!({"mode": "rule", "rules": ["MATCH,漏网之鱼"]});
        let yaml = render_document(&value, DocumentFormat::Yaml).unwrap();
        assert!(yaml.contains("mode: rule"));

        let reparsed = parse_document(&yaml, DocumentFormat::Yaml).unwrap();
        assert_eq!(reparsed, value);

        let text = render_document(&value, DocumentFormat::Json).unwrap();
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_load_and_write_document() {
        let dir = std::env::temp_dir().join(format!("clash-preprocessor-test-{}", std::process::id()));
        let path = dir.join("out.json");
        let value = json!({"proxies": [], "mode": "rule"});

        write_document(&value, &path).unwrap();
        assert_eq!(load_document(&path).unwrap(), value);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_document("/nonexistent/clash.yaml").unwrap_err();
        assert!(err.to_string().contains("无法读取配置文件"));
    }
}
