use log::debug;

use crate::pattern::{compile_literal_alternatives, Matcher};
use crate::proxy::Proxy;

/// 默认过滤关键词：机场公告、流量提示、高倍率等非节点条目
pub const FILTER_KEYWORDS: &[&str] = &[
    "群", "邀请", "返利", "循环", "官网", "客服", "网站", "网址", "获取",
    "订阅", "流量", "到期", "机场", "下次", "版本", "官址", "备用", "过期",
    "已用", "联系", "邮箱", "工单", "贩卖", "通知", "倒卖", "防止", "国内",
    "建议", "地址", "频道", "无法", "说明", "使用", "提示", "特别", "访问",
    "支持", "10x", "8x", "6x",
];

/// 关键词过滤器
///
/// 关键词按字面匹配（先转义再合并为一个分支正则），不区分大小写。
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    /// 关键词为空时为 None，放行所有节点
    matcher: Option<Matcher>,
}

impl KeywordFilter {
    /// 创建新的关键词过滤器
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        let keywords: Vec<&str> = keywords
            .iter()
            .map(AsRef::as_ref)
            .filter(|k| !k.is_empty())
            .collect();

        let matcher = if keywords.is_empty() {
            None
        } else {
            Some(compile_literal_alternatives(keywords))
        };

        Self { matcher }
    }

    /// 检查名称是否包含任一屏蔽关键词
    #[inline]
    pub fn is_blocked(&self, name: &str) -> bool {
        self.matcher.as_ref().is_some_and(|m| m.is_match(name))
    }

    /// 返回未被屏蔽的节点，保持原有顺序
    pub fn apply(&self, proxies: &[Proxy]) -> Vec<Proxy> {
        let kept: Vec<Proxy> = proxies
            .iter()
            .filter(|p| !self.is_blocked(p.name()))
            .cloned()
            .collect();

        debug!("关键词过滤: {} -> {} 个节点", proxies.len(), kept.len());
        kept
    }
}

impl Default for KeywordFilter {
    fn default() -> Self {
        Self::new(FILTER_KEYWORDS)
    }
}
