//! 配置值解析与校验
//!
//! 列表类配置既可以写成 TOML 数组，也可以写成按行分隔的字符串
//! （兼容从后台文本框导入的旧数据）。

use serde::{Deserialize, Deserializer};

use super::StaticConfig;
use super::types::{LinkEncoding, MaskingType};

/// 默认跳转标记
pub const DEFAULT_SEPARATOR: &str = "goto";

/// 将按行分隔的文本拆成列表：去掉首尾空白，丢弃空行
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// serde 辅助：接受数组或多行字符串
pub fn deserialize_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::List(items) => items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Raw::Text(text) => split_lines(&text),
    })
}

/// 规范化跳转标记：去掉斜杠与空白，空值回退为 `goto`
pub fn normalize_separator(separator: &str) -> String {
    let trimmed = separator.trim().trim_matches('/');
    if trimmed.is_empty() {
        DEFAULT_SEPARATOR.to_string()
    } else {
        trimmed.to_string()
    }
}

/// 规范化站点地址：去掉末尾斜杠
pub fn normalize_origin(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_string()
}

/// 启动时的配置检查，返回需要提示的警告
///
/// 这些情况不会阻止启动，只会降级或忽略部分功能。
pub fn validate_static_config(config: &StaticConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if url::Url::parse(&config.site.origin).is_err() {
        warnings.push(format!(
            "site.origin '{}' is not an absolute URL; generated mask links may be broken",
            config.site.origin
        ));
    }

    if config.masking.separator.trim().trim_matches('/').is_empty() {
        warnings.push(format!(
            "masking.separator is empty, falling back to '{}'",
            DEFAULT_SEPARATOR
        ));
    }

    if config.masking.masking_type == MaskingType::No
        && config.masking.link_encoding != LinkEncoding::None
    {
        warnings.push(
            "masking.link_encoding has no effect while masking_type = no".to_string(),
        );
    }

    if config.masking.remove_all_links && config.masking.links_to_text {
        warnings.push(
            "masking.remove_all_links and masking.links_to_text are both set; remove_all_links wins"
                .to_string(),
        );
    }

    if config.masking.anonymize_links && config.masking.anonymous_link_provider.trim().is_empty()
    {
        warnings.push(
            "masking.anonymize_links is on but anonymous_link_provider is empty".to_string(),
        );
    }

    if config.logs.enabled && config.logs.log_duration < 0 {
        warnings.push(format!(
            "logs.log_duration = {} is negative, treated as 0 (keep forever)",
            config.logs.log_duration
        ));
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_handles_crlf() {
        let items = split_lines("https://a.example\r\n\r\n  https://b.example  \nhttps://c.example");
        assert_eq!(
            items,
            vec![
                "https://a.example".to_string(),
                "https://b.example".to_string(),
                "https://c.example".to_string()
            ]
        );
    }

    #[test]
    fn test_deserialize_list_accepts_both_shapes() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(deserialize_with = "deserialize_list")]
            items: Vec<String>,
        }

        let from_array: Holder =
            serde_json::from_str(r#"{"items": [" a ", "", "b"]}"#).unwrap();
        assert_eq!(from_array.items, vec!["a", "b"]);

        let from_text: Holder = serde_json::from_str(r#"{"items": "a\r\nb\n"}"#).unwrap();
        assert_eq!(from_text.items, vec!["a", "b"]);
    }

    #[test]
    fn test_normalize_separator() {
        assert_eq!(normalize_separator(""), "goto");
        assert_eq!(normalize_separator("  "), "goto");
        assert_eq!(normalize_separator("/out/"), "out");
        assert_eq!(normalize_separator("go"), "go");
    }

    #[test]
    fn test_validate_default_config_is_clean() {
        let config = StaticConfig::default();
        assert!(validate_static_config(&config).is_empty());
    }
}
