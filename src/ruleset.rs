use lazy_static::lazy_static;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::group::{AD_BLOCK, APP_PURIFY, FINAL, NODE_SELECT};

const ACL4SSR_BASE: &str = "https://testingcf.jsdelivr.net/gh/ACL4SSR/ACL4SSR@master/Clash";

/// 规则集刷新间隔（秒）
pub const RULE_PROVIDER_INTERVAL: u32 = 86400;

/// 规则集匹配行为
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    Classical,
    Domain,
    IpCidr,
}

/// 规则提供者描述
///
/// 只是静态描述，下载与缓存由下游路由引擎负责。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleProviderDescriptor {
    #[serde(skip)]
    pub key: String,
    pub url: String,
    pub path: String,
    pub behavior: Behavior,
    pub interval: u32,
    pub format: String,
    #[serde(rename = "type")]
    pub fetch_type: String,
}

impl RuleProviderDescriptor {
    /// ACL4SSR 规则集，文本格式，通过 http 获取
    fn acl4ssr(key: &str, behavior: Behavior) -> Self {
        Self {
            key: key.to_string(),
            url: format!("{}/{}.list", ACL4SSR_BASE, key),
            path: format!("./ruleset/{}.list", key),
            behavior,
            interval: RULE_PROVIDER_INTERVAL,
            format: "text".to_string(),
            fetch_type: "http".to_string(),
        }
    }
}

/// 有序的规则提供者集合，序列化为以 key 为键的映射
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleProviders(pub Vec<RuleProviderDescriptor>);

impl RuleProviders {
    pub fn get(&self, key: &str) -> Option<&RuleProviderDescriptor> {
        self.0.iter().find(|p| p.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|p| p.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for RuleProviders {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for provider in &self.0 {
            map.serialize_entry(&provider.key, provider)?;
        }
        map.end()
    }
}

lazy_static! {
    static ref RULE_PROVIDERS: RuleProviders = RuleProviders(vec![
        RuleProviderDescriptor::acl4ssr("LocalAreaNetwork", Behavior::Classical),
        RuleProviderDescriptor::acl4ssr("UnBan", Behavior::Classical),
        RuleProviderDescriptor::acl4ssr("BanAD", Behavior::Classical),
        RuleProviderDescriptor::acl4ssr("BanProgramAD", Behavior::Classical),
        RuleProviderDescriptor::acl4ssr("ProxyGFWlist", Behavior::Classical),
        RuleProviderDescriptor::acl4ssr("ChinaDomain", Behavior::Domain),
        RuleProviderDescriptor::acl4ssr("ChinaCompanyIp", Behavior::IpCidr),
        RuleProviderDescriptor::acl4ssr("Download", Behavior::Classical),
    ]);

    /// 规则自上而下匹配，顺序不可调整
    static ref RULES: Vec<String> = vec![
        "RULE-SET,LocalAreaNetwork,DIRECT".to_string(),
        "RULE-SET,UnBan,DIRECT".to_string(),
        format!("RULE-SET,BanAD,{}", AD_BLOCK),
        format!("RULE-SET,BanProgramAD,{}", APP_PURIFY),
        format!("RULE-SET,ProxyGFWlist,{}", NODE_SELECT),
        "RULE-SET,ChinaDomain,DIRECT".to_string(),
        "RULE-SET,ChinaCompanyIp,DIRECT".to_string(),
        "RULE-SET,Download,DIRECT".to_string(),
        "GEOIP,CN,DIRECT".to_string(),
        format!("MATCH,{}", FINAL),
    ];
}

/// 规则集附加器，与节点数据无关
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleSetAttacher;

impl RuleSetAttacher {
    pub fn rule_providers(&self) -> &'static RuleProviders {
        &RULE_PROVIDERS
    }

    pub fn rules(&self) -> &'static [String] {
        &RULES
    }
}
