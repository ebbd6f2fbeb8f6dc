use log::warn;
use regex::{Regex, RegexBuilder};

/// 内联大小写不敏感标记
pub const CASE_INSENSITIVE_MARKER: &str = "(?i)";

/// 正则模式描述，内联 `(?i)` 标记被解析为显式标志
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSpec {
    /// 原始文本，原样输出到下游引擎
    pub raw: String,
    /// 去除内联标记后的模式文本，用于编译与拼接排除模式
    pub pattern: String,
    /// 原始文本中是否带有 `(?i)` 标记
    pub case_insensitive: bool,
}

impl PatternSpec {
    /// 从原始字符串解析，移除所有 `(?i)` 标记
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            pattern: raw.replace(CASE_INSENSITIVE_MARKER, ""),
            case_insensitive: raw.contains(CASE_INSENSITIVE_MARKER),
        }
    }

    /// 下游引擎使用的 filter 字符串，标记位置保持不变
    pub fn to_filter_string(&self) -> String {
        self.raw.clone()
    }
}

/// 转义字符串中的正则元字符，使其按字面匹配
#[inline]
pub fn escape_literal(s: &str) -> String {
    regex::escape(s)
}

/// 编译后的匹配器，匹配始终不区分大小写
#[derive(Debug, Clone)]
pub enum Matcher {
    /// 正常编译的正则
    Regex(Regex),
    /// 连回退正则都无法构建时，按小写字面子串匹配各个分支
    Literals(Vec<String>),
}

impl Matcher {
    /// 检查文本是否匹配
    #[inline]
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Matcher::Regex(re) => re.is_match(text),
            Matcher::Literals(parts) => {
                let text_lower = text.to_lowercase();
                parts.iter().any(|p| text_lower.contains(p.as_str()))
            }
        }
    }
}

fn build_case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// 编译模式，失败时回退到逐分支转义的安全模式
///
/// 回退规则：按 `|` 拆分，逐段转义后重新以 `|` 连接。此函数永远不会失败。
pub fn compile_pattern(spec: &PatternSpec) -> Matcher {
    match build_case_insensitive(&spec.pattern) {
        Ok(re) => Matcher::Regex(re),
        Err(e) => {
            warn!(
                "无效的正则表达式: \"{}\" ({}), 已回退到字面匹配",
                spec.to_filter_string(),
                e
            );
            compile_literal_alternatives(spec.pattern.split('|'))
        }
    }
}

/// 将一组字面字符串编译为单个不区分大小写的分支匹配器
pub fn compile_literal_alternatives<'a, I>(parts: I) -> Matcher
where
    I: IntoIterator<Item = &'a str>,
{
    let parts: Vec<&str> = parts.into_iter().collect();
    let safe_pattern = parts
        .iter()
        .map(|p| escape_literal(p))
        .collect::<Vec<_>>()
        .join("|");

    match build_case_insensitive(&safe_pattern) {
        Ok(re) => Matcher::Regex(re),
        Err(e) => {
            warn!("回退正则构建失败 ({}), 使用子串匹配", e);
            Matcher::Literals(parts.iter().map(|p| p.to_lowercase()).collect())
        }
    }
}
