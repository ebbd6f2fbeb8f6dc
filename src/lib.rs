//! Clash 配置预处理
//!
//! 将原始订阅配置编译为完整的路由配置：过滤无效节点，按地区分组，
//! 生成代理组层级并附加固定的规则集。整个过程是纯函数，不做任何网络请求。
//!
//! ```
//! use clash_preprocessor::compile_config;
//! use serde_json::json;
//!
//! let output = compile_config(&json!({
//!     "proxies": [{"name": "美国01"}, {"name": "剩余流量: 10GB"}]
//! }));
//! assert_eq!(output["proxies"].as_array().map(Vec::len), Some(1));
//! assert_eq!(output["proxy-groups"][0]["name"], "节点选择");
//! ```

use lazy_static::lazy_static;
use serde_json::Value;

pub mod compiler;
pub mod config;
pub mod group;
pub mod icons;
pub mod keyword;
pub mod logger;
pub mod pattern;
pub mod proxy;
pub mod region;
pub mod ruleset;

pub use compiler::{CompiledParts, ConfigCompiler};
pub use config::{
    load_document, render_document, write_document, CompilerOptions, DocumentFormat,
};
pub use group::{GroupKind, GroupSynthesizer, MemberRef, ProxyGroup};
pub use keyword::KeywordFilter;
pub use pattern::PatternSpec;
pub use proxy::Proxy;
pub use region::{ClassificationResult, RegionClassifier, RegionRule, RegionRuleConfig};
pub use ruleset::{Behavior, RuleProviderDescriptor, RuleSetAttacher};

lazy_static! {
    static ref DEFAULT_COMPILER: ConfigCompiler = ConfigCompiler::default();
}

/// 使用内置关键词与地区表编译配置
pub fn compile_config(config: &Value) -> Value {
    DEFAULT_COMPILER.compile(config)
}
