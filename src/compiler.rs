use log::{debug, info, warn};
use serde_json::{Map, Value};

use crate::config::CompilerOptions;
use crate::group::{dangling_references, GroupSynthesizer, ProxyGroup};
use crate::keyword::KeywordFilter;
use crate::proxy::{extract_proxies, Proxy};
use crate::region::RegionClassifier;
use crate::ruleset::RuleSetAttacher;

/// 编译结果中由本 crate 生成的部分
#[derive(Debug, Clone)]
pub struct CompiledParts {
    pub proxies: Vec<Proxy>,
    pub proxy_groups: Vec<ProxyGroup>,
}

/// Clash 配置编译器
///
/// 流程：关键词过滤 -> 地区分类 -> 生成代理组 -> 附加规则集。
/// 输入不会被修改，每次调用都会构造新的配置对象。
#[derive(Debug, Clone)]
pub struct ConfigCompiler {
    keyword_filter: KeywordFilter,
    classifier: RegionClassifier,
    synthesizer: GroupSynthesizer,
    attacher: RuleSetAttacher,
}

impl ConfigCompiler {
    /// 根据选项创建编译器，关键词与地区模式在此预编译
    pub fn new(options: CompilerOptions) -> Self {
        debug!(
            "初始化编译器: {} 个过滤关键词, {} 个地区规则",
            options.keywords.len(),
            options.regions.len()
        );

        Self {
            keyword_filter: KeywordFilter::new(&options.keywords),
            classifier: RegionClassifier::new(options.region_rules()),
            synthesizer: GroupSynthesizer::new(),
            attacher: RuleSetAttacher,
        }
    }

    /// 对节点列表执行过滤、分类与分组
    pub fn compile_proxies(&self, proxies: &[Proxy]) -> CompiledParts {
        let filtered = self.keyword_filter.apply(proxies);
        let classification = self.classifier.classify(&filtered);
        let proxy_groups = self.synthesizer.synthesize(&classification);

        info!(
            "节点: {} -> {}, 可用地区: [{}], 其他节点: {}",
            proxies.len(),
            filtered.len(),
            classification.available_regions().collect::<Vec<_>>().join(", "),
            classification.leftover.len()
        );

        let dangling = dangling_references(&proxy_groups);
        if !dangling.is_empty() {
            warn!("代理组引用了不存在的组: {:?}", dangling);
        }

        CompiledParts {
            proxies: filtered,
            proxy_groups,
        }
    }

    /// 编译完整配置
    ///
    /// 替换 `proxies`、`proxy-groups`、`rule-providers` 和 `rules`，其他字段原样保留。
    /// 输入不是对象时原样返回。
    pub fn compile(&self, config: &Value) -> Value {
        let Some(fields) = config.as_object() else {
            warn!("配置不是对象，跳过处理");
            return config.clone();
        };

        let parts = self.compile_proxies(&extract_proxies(config));

        let mut output: Map<String, Value> = fields.clone();
        output.insert(
            "proxies".to_string(),
            Value::Array(parts.proxies.into_iter().map(Proxy::into_value).collect()),
        );
        output.insert("proxy-groups".to_string(), to_value(&parts.proxy_groups));
        output.insert(
            "rule-providers".to_string(),
            to_value(self.attacher.rule_providers()),
        );
        output.insert("rules".to_string(), to_value(self.attacher.rules()));

        Value::Object(output)
    }
}

impl Default for ConfigCompiler {
    fn default() -> Self {
        Self::new(CompilerOptions::default())
    }
}

/// 这些类型只包含字符串、整数和布尔值，序列化不会失败
fn to_value<T: serde::Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        warn!("序列化失败: {}", e);
        Value::Null
    })
}
