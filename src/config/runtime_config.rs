//! 运行时遮罩配置
//!
//! `StaticConfig` 经过规范化（标记、站点地址、密钥解析）后生成
//! 不可变的 `MaskingConfig`，启动时构建一次，之后以 `Arc` 传给各组件。

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::warn;

use super::types::LinkEncoding;
use super::validators::{normalize_origin, normalize_separator};
use super::{
    LogsConfig, MaskingSection, RedirectConfig, SeoHideConfig, ShortenerConfig, StaticConfig,
};

/// AES-256 密钥长度
pub const ENCRYPTION_KEY_LEN: usize = 32;

/// 遮罩引擎使用的不可变配置
#[derive(Debug, Clone)]
pub struct MaskingConfig {
    /// 站点首页地址（无末尾斜杠）
    pub site_origin: String,
    pub pretty_permalinks: bool,
    pub trusted_proxies: Vec<String>,
    pub masking: MaskingSection,
    pub seo_hide: SeoHideConfig,
    pub shortener: ShortenerConfig,
    pub redirect: RedirectConfig,
    pub logs: LogsConfig,
    /// 解码后的 AES 密钥
    pub encryption_key: Option<[u8; ENCRYPTION_KEY_LEN]>,
    /// 实际生效的编码方式（aes256 不可用时回退为 none）
    pub effective_encoding: LinkEncoding,
    /// 回退原因，通过 /_linkmasker/status 暴露
    pub encoding_warning: Option<String>,
}

impl MaskingConfig {
    /// 从静态配置构建
    ///
    /// `stored_key` 为数据库中持久化的 base64 密钥，配置文件中的密钥优先。
    pub fn build(config: &StaticConfig, stored_key: Option<&str>) -> Self {
        let mut masking = config.masking.clone();
        masking.separator = normalize_separator(&masking.separator);

        let key_source = masking
            .encryption_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .or(stored_key);
        let encryption_key = key_source.and_then(decode_encryption_key);

        let (effective_encoding, encoding_warning) =
            resolve_encoding(masking.link_encoding, encryption_key.is_some());
        if let Some(ref reason) = encoding_warning {
            warn!("{}", reason);
        }

        Self {
            site_origin: normalize_origin(&config.site.origin),
            pretty_permalinks: config.site.pretty_permalinks,
            trusted_proxies: config.site.trusted_proxies.clone(),
            masking,
            seo_hide: config.seo_hide.clone(),
            shortener: config.shortener.clone(),
            redirect: config.redirect.clone(),
            logs: config.logs.clone(),
            encryption_key,
            effective_encoding,
            encoding_warning,
        }
    }

    /// 跳转标记（已规范化）
    pub fn separator(&self) -> &str {
        &self.masking.separator
    }

    /// 日志保留天数（负数按 0 处理）
    pub fn log_duration_days(&self) -> u32 {
        self.logs.log_duration.max(0) as u32
    }

    /// 去掉协议的站点地址，用于构建默认排除列表
    pub fn site_without_scheme(&self) -> &str {
        self.site_origin
            .strip_prefix("https://")
            .or_else(|| self.site_origin.strip_prefix("http://"))
            .unwrap_or(&self.site_origin)
    }
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self::build(&StaticConfig::default(), None)
    }
}

/// 解码 base64 密钥，长度不为 32 字节时视为无效
pub fn decode_encryption_key(encoded: &str) -> Option<[u8; ENCRYPTION_KEY_LEN]> {
    let bytes = STANDARD.decode(encoded.trim()).ok()?;
    bytes.try_into().ok()
}

/// 生成新的随机密钥（base64）
pub fn generate_encryption_key() -> String {
    let key: [u8; ENCRYPTION_KEY_LEN] = rand::random();
    STANDARD.encode(key)
}

/// 计算实际生效的编码方式
fn resolve_encoding(requested: LinkEncoding, has_key: bool) -> (LinkEncoding, Option<String>) {
    if requested != LinkEncoding::Aes256 {
        return (requested, None);
    }

    if !crate::masking::cipher::is_available() {
        return (
            LinkEncoding::None,
            Some(
                "link_encoding = aes256 but the aes256 feature is not compiled in; falling back to none"
                    .to_string(),
            ),
        );
    }

    if !has_key {
        return (
            LinkEncoding::None,
            Some(
                "link_encoding = aes256 but no valid 32-byte encryption key is available; falling back to none"
                    .to_string(),
            ),
        );
    }

    (LinkEncoding::Aes256, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_normalizes_site_and_separator() {
        let mut config = StaticConfig::default();
        config.site.origin = "https://mysite.example/".to_string();
        config.masking.separator = String::new();

        let masking = MaskingConfig::build(&config, None);
        assert_eq!(masking.site_origin, "https://mysite.example");
        assert_eq!(masking.site_without_scheme(), "mysite.example");
        assert_eq!(masking.separator(), "goto");
    }

    #[test]
    fn test_aes_without_key_falls_back() {
        let mut config = StaticConfig::default();
        config.masking.link_encoding = LinkEncoding::Aes256;

        let masking = MaskingConfig::build(&config, None);
        assert_eq!(masking.effective_encoding, LinkEncoding::None);
        assert!(masking.encoding_warning.is_some());
    }

    #[cfg(feature = "aes256")]
    #[test]
    fn test_aes_with_stored_key() {
        let mut config = StaticConfig::default();
        config.masking.link_encoding = LinkEncoding::Aes256;
        let key = generate_encryption_key();

        let masking = MaskingConfig::build(&config, Some(&key));
        assert_eq!(masking.effective_encoding, LinkEncoding::Aes256);
        assert!(masking.encryption_key.is_some());
    }

    #[test]
    fn test_decode_encryption_key_rejects_short_keys() {
        assert!(decode_encryption_key("c2hvcnQ=").is_none());
        assert!(decode_encryption_key("not base64!").is_none());
        assert!(decode_encryption_key(&generate_encryption_key()).is_some());
    }
}
