use std::collections::HashSet;

use lazy_static::lazy_static;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::group::RESERVED_GROUP_NAMES;
use crate::icons;
use crate::pattern::{compile_pattern, Matcher, PatternSpec};
use crate::proxy::Proxy;

/// 地区规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRule {
    /// 地区分组名称（同时作为代理组名）
    pub name: String,
    /// 分组图标
    pub icon: String,
    /// 地区匹配模式
    pub pattern: PatternSpec,
}

impl RegionRule {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, filter: &str) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
            pattern: PatternSpec::parse(filter),
        }
    }
}

/// 配置文件中的地区规则
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionRuleConfig {
    pub name: String,
    #[serde(default)]
    pub icon: String,
    /// 原始 filter 字符串，可以带 `(?i)` 标记
    pub filter: String,
}

impl From<RegionRuleConfig> for RegionRule {
    fn from(config: RegionRuleConfig) -> Self {
        RegionRule::new(config.name, config.icon, &config.filter)
    }
}

impl From<&RegionRule> for RegionRuleConfig {
    fn from(rule: &RegionRule) -> Self {
        Self {
            name: rule.name.clone(),
            icon: rule.icon.clone(),
            filter: rule.pattern.to_filter_string(),
        }
    }
}

lazy_static! {
    /// 默认地区规则，按声明顺序求值（先匹配者优先）
    pub static ref DEFAULT_REGION_RULES: Vec<RegionRule> = vec![
        RegionRule::new(
            "美国节点",
            icons::US,
            "(?i)美|波特兰|达拉斯|俄勒冈|凤凰城|费利蒙|硅谷|拉斯维加斯|洛杉矶|圣何塞|圣克拉拉|西雅图|芝加哥|US|United States",
        ),
        RegionRule::new(
            "日本节点",
            icons::JP,
            "(?i)日本|川日|东京|大阪|泉日|埼玉|沪日|深日|JP|Japan",
        ),
        RegionRule::new("狮城节点", icons::SG, "(?i)新加坡|坡|狮城|SG|Singapore"),
        RegionRule::new(
            "香港节点",
            icons::HK,
            "(?i)港|HK|hk|Hong Kong|HongKong|hongkong",
        ),
        RegionRule::new("台湾节点", icons::TW, "(?i)台|新北|彰化|TW|Taiwan"),
    ];
}

/// 单个地区的分类结果
#[derive(Debug, Clone)]
pub struct RegionBucket<'a> {
    pub rule: &'a RegionRule,
    pub proxies: Vec<&'a Proxy>,
}

impl RegionBucket<'_> {
    /// 地区是否可用（至少有一个节点）
    #[inline]
    pub fn is_available(&self) -> bool {
        !self.proxies.is_empty()
    }
}

/// 分类结果：按规则顺序排列的地区桶，以及未匹配任何地区的剩余节点
#[derive(Debug, Clone)]
pub struct ClassificationResult<'a> {
    pub buckets: Vec<RegionBucket<'a>>,
    pub leftover: Vec<&'a Proxy>,
}

impl<'a> ClassificationResult<'a> {
    /// 有节点的地区名称，按规则声明顺序
    pub fn available_regions(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.available_rules().map(|rule| rule.name.as_str())
    }

    /// 有节点的地区规则，按规则声明顺序
    pub fn available_rules(&self) -> impl Iterator<Item = &'a RegionRule> + '_ {
        self.buckets
            .iter()
            .filter(|b| b.is_available())
            .map(|b| b.rule)
    }

    #[inline]
    pub fn has_leftover(&self) -> bool {
        !self.leftover.is_empty()
    }

    /// 指定地区的节点
    pub fn bucket(&self, region: &str) -> Option<&[&'a Proxy]> {
        self.buckets
            .iter()
            .find(|b| b.rule.name == region)
            .map(|b| b.proxies.as_slice())
    }

    /// "其他节点" 的排除模式，由全部地区规则生成
    pub fn leftover_union(&self) -> String {
        leftover_union(self.buckets.iter().map(|b| b.rule))
    }
}

/// 将所有地区规则（去除内联标记后）以 `|` 连接
///
/// 结果只依赖规则表本身，与实际节点无关。
pub fn leftover_union<'a, I>(rules: I) -> String
where
    I: IntoIterator<Item = &'a RegionRule>,
{
    rules
        .into_iter()
        .map(|r| r.pattern.pattern.as_str())
        .collect::<Vec<_>>()
        .join("|")
}

/// 地区分类器
#[derive(Debug, Clone)]
pub struct RegionClassifier {
    /// 规则与预编译的匹配器，保持声明顺序
    rules: Vec<(RegionRule, Matcher)>,
}

impl RegionClassifier {
    /// 创建新的分类器并预编译所有地区模式
    ///
    /// 与内置代理组重名的规则会被丢弃，重名的规则只保留第一条。
    pub fn new(rules: Vec<RegionRule>) -> Self {
        let mut seen: HashSet<String> = HashSet::new();
        let rules = rules
            .into_iter()
            .filter(|rule| {
                if RESERVED_GROUP_NAMES.contains(&rule.name.as_str()) {
                    warn!("地区名称 \"{}\" 与内置代理组重名, 已忽略", rule.name);
                    return false;
                }
                if !seen.insert(rule.name.clone()) {
                    warn!("重复的地区名称 \"{}\", 只保留第一条", rule.name);
                    return false;
                }
                true
            })
            .map(|rule| {
                let matcher = compile_pattern(&rule.pattern);
                (rule, matcher)
            })
            .collect();

        Self { rules }
    }

    pub fn rules(&self) -> impl Iterator<Item = &RegionRule> {
        self.rules.iter().map(|(rule, _)| rule)
    }

    /// 返回名称匹配的第一个地区规则的下标
    #[inline]
    fn first_match(&self, name: &str) -> Option<usize> {
        self.rules.iter().position(|(_, matcher)| matcher.is_match(name))
    }

    /// 单次遍历完成分类，每个节点只归入第一个匹配的地区
    pub fn classify<'a>(&'a self, proxies: &'a [Proxy]) -> ClassificationResult<'a> {
        let mut buckets: Vec<RegionBucket<'a>> = self
            .rules
            .iter()
            .map(|(rule, _)| RegionBucket {
                rule,
                proxies: Vec::new(),
            })
            .collect();
        let mut leftover = Vec::new();

        for proxy in proxies {
            match self.first_match(proxy.name()) {
                Some(idx) => buckets[idx].proxies.push(proxy),
                None => leftover.push(proxy),
            }
        }

        for bucket in &buckets {
            debug!("地区 {}: {} 个节点", bucket.rule.name, bucket.proxies.len());
        }
        debug!("其他节点: {} 个", leftover.len());

        ClassificationResult { buckets, leftover }
    }
}

impl Default for RegionClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_REGION_RULES.clone())
    }
}
