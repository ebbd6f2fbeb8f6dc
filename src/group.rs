use std::collections::HashSet;
use std::fmt;

use log::debug;
use serde::{Serialize, Serializer};

use crate::icons;
use crate::region::ClassificationResult;

/// 节点选择
pub const NODE_SELECT: &str = "节点选择";
/// 自动选择
pub const AUTO_SELECT: &str = "自动选择";
/// 手动切换
pub const MANUAL_SELECT: &str = "手动切换";
/// 其他节点
pub const OTHER_NODES: &str = "其他节点";
/// 广告拦截
pub const AD_BLOCK: &str = "广告拦截";
/// 应用净化
pub const APP_PURIFY: &str = "应用净化";
/// 漏网之鱼
pub const FINAL: &str = "漏网之鱼";
/// GLOBAL
pub const GLOBAL: &str = "GLOBAL";

/// 内置代理组与策略名称，地区分组不能与之重名
pub const RESERVED_GROUP_NAMES: [&str; 10] = [
    NODE_SELECT,
    AUTO_SELECT,
    MANUAL_SELECT,
    OTHER_NODES,
    AD_BLOCK,
    APP_PURIFY,
    FINAL,
    GLOBAL,
    "DIRECT",
    "REJECT",
];

/// 测速间隔（秒）
pub const URL_TEST_INTERVAL: u32 = 300;
/// 测速容差（毫秒）
pub const URL_TEST_TOLERANCE: u32 = 50;

/// 代理组类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupKind {
    /// 手动选择
    #[serde(rename = "select")]
    Select,
    /// 延迟测试自动选择
    #[serde(rename = "url-test")]
    UrlTest,
}

/// 代理组成员引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberRef {
    Direct,
    Reject,
    /// 引用另一个代理组
    Group(String),
}

impl MemberRef {
    pub fn group(name: impl Into<String>) -> Self {
        MemberRef::Group(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            MemberRef::Direct => "DIRECT",
            MemberRef::Reject => "REJECT",
            MemberRef::Group(name) => name,
        }
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MemberRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// 代理组，字段名与下游路由引擎一致
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyGroup {
    pub name: String,
    pub icon: String,
    #[serde(rename = "type")]
    pub kind: GroupKind,
    #[serde(rename = "proxies", skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<MemberRef>,
    #[serde(rename = "include-all", skip_serializing_if = "std::ops::Not::not")]
    pub include_all: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(rename = "exclude-filter", skip_serializing_if = "Option::is_none")]
    pub exclude_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<u32>,
}

impl ProxyGroup {
    /// 创建 select 类型的代理组
    pub fn select(
        name: impl Into<String>,
        icon: impl Into<String>,
        members: Vec<MemberRef>,
    ) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
            kind: GroupKind::Select,
            members,
            include_all: false,
            filter: None,
            exclude_filter: None,
            interval: None,
            tolerance: None,
        }
    }

    /// 创建标准的 url-test 代理组（候选为全部节点，固定间隔与容差）
    pub fn url_test(name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            kind: GroupKind::UrlTest,
            include_all: true,
            interval: Some(URL_TEST_INTERVAL),
            tolerance: Some(URL_TEST_TOLERANCE),
            ..Self::select(name, icon, Vec::new())
        }
    }

    pub fn with_include_all(mut self) -> Self {
        self.include_all = true;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_exclude_filter(mut self, exclude_filter: impl Into<String>) -> Self {
        self.exclude_filter = Some(exclude_filter.into());
        self
    }

    /// 成员名称列表
    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(MemberRef::as_str).collect()
    }
}

/// 代理组生成器
#[derive(Debug, Clone, Default)]
pub struct GroupSynthesizer;

impl GroupSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// 按固定顺序生成全部代理组
    pub fn synthesize(&self, classification: &ClassificationResult<'_>) -> Vec<ProxyGroup> {
        let regions: Vec<MemberRef> = classification
            .available_regions()
            .map(MemberRef::group)
            .collect();
        let has_other = classification.has_leftover();

        // 地区组 + 其他节点（若有）
        let mut region_members = regions.clone();
        if has_other {
            region_members.push(MemberRef::group(OTHER_NODES));
        }

        let mut groups = Vec::with_capacity(regions.len() + 9);

        // 1. 核心选择组
        let mut node_select = region_members.clone();
        node_select.extend([
            MemberRef::group(AUTO_SELECT),
            MemberRef::group(MANUAL_SELECT),
            MemberRef::Direct,
        ]);
        groups.push(ProxyGroup::select(NODE_SELECT, icons::PROXY, node_select));
        groups.push(ProxyGroup::url_test(AUTO_SELECT, icons::AUTO));
        groups.push(
            ProxyGroup::select(MANUAL_SELECT, icons::MANUAL, Vec::new()).with_include_all(),
        );

        // 2. 地区分组，filter 保留原始的内联标记
        for rule in classification.available_rules() {
            groups.push(
                ProxyGroup::url_test(rule.name.as_str(), rule.icon.as_str())
                    .with_filter(rule.pattern.to_filter_string()),
            );
        }

        // 3. 其他节点
        if has_other {
            groups.push(
                ProxyGroup::url_test(OTHER_NODES, icons::GLOBAL)
                    .with_exclude_filter(classification.leftover_union()),
            );
        }

        // 4. 功能性分组
        groups.push(ProxyGroup::select(
            AD_BLOCK,
            icons::AD_BLACK,
            vec![MemberRef::Reject, MemberRef::Direct],
        ));
        groups.push(ProxyGroup::select(
            APP_PURIFY,
            icons::HIJACKING,
            vec![MemberRef::Reject, MemberRef::Direct],
        ));

        let mut final_members = vec![MemberRef::group(NODE_SELECT)];
        final_members.extend(region_members.iter().cloned());
        final_members.extend([
            MemberRef::group(AUTO_SELECT),
            MemberRef::group(MANUAL_SELECT),
            MemberRef::Direct,
        ]);
        groups.push(ProxyGroup::select(FINAL, icons::FINAL, final_members));

        let mut global_members = vec![
            MemberRef::group(NODE_SELECT),
            MemberRef::group(AUTO_SELECT),
            MemberRef::group(MANUAL_SELECT),
        ];
        global_members.extend(region_members);
        global_members.extend([
            MemberRef::group(AD_BLOCK),
            MemberRef::group(APP_PURIFY),
            MemberRef::group(FINAL),
        ]);
        groups.push(ProxyGroup::select(GLOBAL, icons::GLOBAL, global_members).with_include_all());

        debug!("生成 {} 个代理组", groups.len());
        groups
    }
}

/// 返回所有无法解析的组引用（引用了不存在的代理组）
pub fn dangling_references(groups: &[ProxyGroup]) -> Vec<String> {
    let names: HashSet<&str> = groups.iter().map(|g| g.name.as_str()).collect();

    groups
        .iter()
        .flat_map(|g| g.members.iter())
        .filter_map(|m| match m {
            MemberRef::Group(name) if !names.contains(name.as_str()) => Some(name.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::Proxy;
    use crate::region::{RegionClassifier, RegionRule};
    use serde_json::json;

    fn proxies(names: &[&str]) -> Vec<Proxy> {
        names.iter().map(|n| Proxy::new(json!({ "name": n }))).collect()
    }

    fn synthesize(names: &[&str]) -> Vec<ProxyGroup> {
        let classifier = RegionClassifier::default();
        let input = proxies(names);
        let classification = classifier.classify(&input);
        GroupSynthesizer::new().synthesize(&classification)
    }

    fn find<'a>(groups: &'a [ProxyGroup], name: &str) -> &'a ProxyGroup {
        groups
            .iter()
            .find(|g| g.name == name)
            .unwrap_or_else(|| panic!("缺少代理组: {}", name))
    }

    fn group_names(groups: &[ProxyGroup]) -> Vec<&str> {
        groups.iter().map(|g| g.name.as_str()).collect()
    }

    #[test]
    fn test_group_order() {
        let groups = synthesize(&["美国01", "日本01", "随机节点"]);
        assert_eq!(
            group_names(&groups),
            vec![
                "节点选择", "自动选择", "手动切换", "美国节点", "日本节点", "其他节点",
                "广告拦截", "应用净化", "漏网之鱼", "GLOBAL",
            ]
        );
    }

    #[test]
    fn test_member_lists() {
        let groups = synthesize(&["美国01", "日本01", "随机节点"]);

        assert_eq!(
            find(&groups, NODE_SELECT).member_names(),
            vec!["美国节点", "日本节点", "其他节点", "自动选择", "手动切换", "DIRECT"]
        );
        assert_eq!(
            find(&groups, FINAL).member_names(),
            vec!["节点选择", "美国节点", "日本节点", "其他节点", "自动选择", "手动切换", "DIRECT"]
        );
        assert_eq!(
            find(&groups, GLOBAL).member_names(),
            vec![
                "节点选择", "自动选择", "手动切换", "美国节点", "日本节点", "其他节点",
                "广告拦截", "应用净化", "漏网之鱼",
            ]
        );
        assert_eq!(find(&groups, AD_BLOCK).member_names(), vec!["REJECT", "DIRECT"]);
        assert_eq!(find(&groups, APP_PURIFY).member_names(), vec!["REJECT", "DIRECT"]);
    }

    #[test]
    fn test_url_test_groups() {
        let groups = synthesize(&["美国01", "随机节点"]);

        let auto = find(&groups, AUTO_SELECT);
        assert_eq!(auto.kind, GroupKind::UrlTest);
        assert!(auto.include_all);
        assert_eq!(auto.interval, Some(300));
        assert_eq!(auto.tolerance, Some(50));
        assert!(auto.members.is_empty());

        let us = find(&groups, "美国节点");
        assert_eq!(us.kind, GroupKind::UrlTest);
        assert!(us.filter.as_deref().is_some_and(|f| f.starts_with("(?i)美|")));
        assert!(us.exclude_filter.is_none());

        let other = find(&groups, OTHER_NODES);
        let exclude = other.exclude_filter.as_deref().unwrap_or_default();
        assert!(!exclude.contains("(?i)"));
        assert!(exclude.contains("|日本|"));
        assert!(exclude.ends_with("|Taiwan"));

        let manual = find(&groups, MANUAL_SELECT);
        assert_eq!(manual.kind, GroupKind::Select);
        assert!(manual.include_all);
        assert!(manual.interval.is_none());
    }

    #[test]
    fn test_empty_classification() {
        let groups = synthesize(&[]);
        assert_eq!(
            group_names(&groups),
            vec!["节点选择", "自动选择", "手动切换", "广告拦截", "应用净化", "漏网之鱼", "GLOBAL"]
        );
        assert_eq!(
            find(&groups, NODE_SELECT).member_names(),
            vec!["自动选择", "手动切换", "DIRECT"]
        );
        assert_eq!(
            find(&groups, GLOBAL).member_names(),
            vec!["节点选择", "自动选择", "手动切换", "广告拦截", "应用净化", "漏网之鱼"]
        );
    }

    #[test]
    fn test_only_leftover() {
        let groups = synthesize(&["Korea 01"]);
        assert_eq!(
            find(&groups, NODE_SELECT).member_names(),
            vec!["其他节点", "自动选择", "手动切换", "DIRECT"]
        );
        assert!(groups.iter().all(|g| g.filter.is_none()));
    }

    #[test]
    fn test_referential_integrity() {
        for names in [
            vec![],
            vec!["美国01", "日本01", "随机节点"],
            vec!["HK", "TW", "SG", "JP", "US"],
            vec!["随机"],
        ] {
            let groups = synthesize(&names);
            assert!(dangling_references(&groups).is_empty());
        }
    }

    #[test]
    fn test_dangling_references_detected() {
        let groups = vec![ProxyGroup::select(
            "A",
            "",
            vec![MemberRef::group("B"), MemberRef::Direct],
        )];
        assert_eq!(dangling_references(&groups), vec!["B".to_string()]);
    }

    #[test]
    fn test_custom_region_without_marker() {
        let classifier = RegionClassifier::new(vec![RegionRule::new("韩国节点", "", "KR|Korea")]);
        let input = proxies(&["korea 01"]);
        let classification = classifier.classify(&input);
        let groups = GroupSynthesizer::new().synthesize(&classification);

        let kr = find(&groups, "韩国节点");
        assert_eq!(kr.filter.as_deref(), Some("KR|Korea"));
        assert!(find(&groups, NODE_SELECT).member_names().contains(&"韩国节点"));
    }

    #[test]
    fn test_serialize_group_fields() {
        let groups = synthesize(&["美国01"]);
        let value = serde_json::to_value(&groups).unwrap();

        assert_eq!(
            value[0],
            json!({
                "name": "节点选择",
                "icon": icons::PROXY,
                "type": "select",
                "proxies": ["美国节点", "自动选择", "手动切换", "DIRECT"],
            })
        );
        assert_eq!(
            value[1],
            json!({
                "name": "自动选择",
                "icon": icons::AUTO,
                "type": "url-test",
                "include-all": true,
                "interval": 300,
                "tolerance": 50,
            })
        );
        assert_eq!(value[3]["filter"], json!(DEFAULT_US_FILTER));
    }

    const DEFAULT_US_FILTER: &str =
        "(?i)美|波特兰|达拉斯|俄勒冈|凤凰城|费利蒙|硅谷|拉斯维加斯|洛杉矶|圣何塞|圣克拉拉|西雅图|芝加哥|US|United States";
}
