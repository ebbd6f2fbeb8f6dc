use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 上游代理节点
///
/// 节点内容对本 crate 不透明，只读取 `name` 字段，其他字段原样保留。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Proxy(Value);

impl Proxy {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// 节点显示名称，缺失或非字符串时视为空字符串
    #[inline]
    pub fn name(&self) -> &str {
        self.0.get("name").and_then(Value::as_str).unwrap_or("")
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Proxy {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// 从配置中读取 `proxies` 列表，缺失或不是数组时返回空列表
pub fn extract_proxies(config: &Value) -> Vec<Proxy> {
    config
        .get("proxies")
        .and_then(Value::as_array)
        .map(|list| list.iter().cloned().map(Proxy::new).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_proxy_name() {
        let proxy = Proxy::new(json!({"name": "美国01", "type": "ss", "port": 443}));
        assert_eq!(proxy.name(), "美国01");
    }

    #[test]
    fn test_proxy_name_missing_or_invalid() {
        assert_eq!(Proxy::new(json!({"type": "ss"})).name(), "");
        assert_eq!(Proxy::new(json!({"name": 42})).name(), "");
        assert_eq!(Proxy::new(json!(null)).name(), "");
        assert_eq!(Proxy::new(json!("just a string")).name(), "");
    }

    #[test]
    fn test_extract_proxies() {
        let config = json!({"proxies": [{"name": "a"}, {"name": "b"}]});
        let proxies = extract_proxies(&config);
        assert_eq!(proxies.len(), 2);
        assert_eq!(proxies[1].name(), "b");
    }

    #[test]
    fn test_extract_proxies_not_a_list() {
        assert!(extract_proxies(&json!({})).is_empty());
        assert!(extract_proxies(&json!({"proxies": "oops"})).is_empty());
        assert!(extract_proxies(&json!({"proxies": null})).is_empty());
        assert!(extract_proxies(&json!([1, 2])).is_empty());
    }

    #[test]
    fn test_proxy_fields_preserved() {
        let raw = json!({"name": "日本01", "server": "1.2.3.4", "udp": true});
        let proxy = Proxy::new(raw.clone());
        assert_eq!(proxy.as_value(), &raw);
        assert_eq!(proxy.into_value(), raw);
    }
}
