use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::{LinkEncoding, MaskingType, Shortener, Targeting};
use super::validators::deserialize_list;
use crate::errors::{LinkMaskerError, Result};
use crate::masking::bots::Bot;

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server / database / logging: 基础设施
/// - site: 站点地址、固定链接模式、可信代理
/// - masking / seo_hide / shortener / redirect / logs: 链接遮罩行为
/// - admin: 管理 API token
///
/// 启动后转换为不可变的 `MaskingConfig`，以 `Arc` 共享给各组件。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub masking: MaskingSection,
    #[serde(default)]
    pub seo_hide: SeoHideConfig,
    #[serde(default)]
    pub shortener: ShortenerConfig,
    #[serde(default)]
    pub redirect: RedirectConfig,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：LM，分隔符：__
    /// 示例：LM__MASKING__MASKING_TYPE=301
    pub fn load(path: &str) -> Result<Self> {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖
            .add_source(
                Environment::with_prefix("LM")
                    .separator("__")
                    .try_parsing(true),
            );

        let settings = builder
            .build()
            .map_err(|e| LinkMaskerError::validation(format!("Failed to build config: {}", e)))?;

        let config = settings.try_deserialize::<StaticConfig>().map_err(|e| {
            LinkMaskerError::validation(format!("Failed to deserialize config: {}", e))
        })?;

        if Path::new(path).exists() {
            eprintln!("[INFO] Configuration loaded from: {}", path);
        }

        Ok(config)
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LinkMaskerError::serialization(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 站点配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// 站点首页地址（含协议），例如 `https://mysite.example`
    #[serde(default = "default_site_origin")]
    pub origin: String,
    /// 固定链接模式：`/goto/<token>`；关闭时为 `/?goto=<token>`
    #[serde(default = "default_true")]
    pub pretty_permalinks: bool,
    /// 可信反向代理（IP 或 CIDR），用于提取访客 IP
    #[serde(default, deserialize_with = "deserialize_list")]
    pub trusted_proxies: Vec<String>,
}

/// 链接遮罩配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskingSection {
    #[serde(default)]
    pub masking_type: MaskingType,
    /// javascript 模式与防盗链页面的等待秒数
    #[serde(default = "default_redirect_time")]
    pub redirect_time: u32,
    /// `all`: 整页遮罩；`specific`: 只处理下面勾选的内容类型
    #[serde(default = "default_specific")]
    pub mask_links: Targeting,
    #[serde(default = "default_true")]
    pub mask_posts_pages: bool,
    #[serde(default = "default_true")]
    pub mask_comments: bool,
    #[serde(default = "default_true")]
    pub mask_comment_author: bool,
    #[serde(default = "default_true")]
    pub mask_rss: bool,
    #[serde(default = "default_true")]
    pub mask_rss_comments: bool,
    #[serde(default = "default_true")]
    pub nofollow: bool,
    #[serde(default = "default_true")]
    pub target_blank: bool,
    #[serde(default)]
    pub noindex_tag: bool,
    #[serde(default)]
    pub noindex_comment: bool,
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default)]
    pub link_encoding: LinkEncoding,
    /// base64 编码的 32 字节密钥；留空时首次启动生成并写入数据库
    #[serde(default)]
    pub encryption_key: Option<String>,
    #[serde(default)]
    pub remove_all_links: bool,
    #[serde(default)]
    pub links_to_text: bool,
    #[serde(default)]
    pub debug_mode: bool,
    #[serde(default)]
    pub anonymize_links: bool,
    #[serde(default = "default_anonymous_link_provider")]
    pub anonymous_link_provider: String,
    #[serde(default)]
    pub bot_targeting: Targeting,
    #[serde(default)]
    pub bots_selector: Vec<Bot>,
    #[serde(default = "default_true")]
    pub check_referrer: bool,
    /// 非空时只遮罩以其中某项开头的链接（区分大小写）
    #[serde(default, deserialize_with = "deserialize_list")]
    pub inclusion_list: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub exclusion_list: Vec<String>,
    #[serde(default)]
    pub skip_auth: bool,
    #[serde(default)]
    pub skip_follow: bool,
}

/// SEO 隐藏配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoHideConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_specific")]
    pub mode: Targeting,
    /// mode = specific 时生效的域名列表
    #[serde(default, deserialize_with = "deserialize_list")]
    pub include_list: Vec<String>,
    /// mode = all 时排除的域名列表
    #[serde(default, deserialize_with = "deserialize_list")]
    pub exclude_list: Vec<String>,
}

/// 短链服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenerConfig {
    #[serde(default)]
    pub provider: Shortener,
    #[serde(default)]
    pub adfly_api_key: String,
    #[serde(default)]
    pub adfly_user_id: String,
    #[serde(default = "default_adfly_advert_type")]
    pub adfly_advert_type: u32,
    #[serde(default = "default_adfly_domain")]
    pub adfly_domain: String,
    #[serde(default)]
    pub bitly_login: String,
    #[serde(default)]
    pub bitly_api_key: String,
    #[serde(default)]
    pub shortest_api_key: String,
    #[serde(default)]
    pub yourls_domain: String,
    #[serde(default)]
    pub yourls_signature: String,
}

/// 跳转页面配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectConfig {
    /// 自定义跳转落地页；javascript 模式下抓取其内容并替换 `%linkurl%`
    #[serde(default)]
    pub redirect_page: Option<String>,
    #[serde(default = "default_redirect_message")]
    pub redirect_message: String,
}

/// 点击日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 保留天数，0 表示永久保留
    #[serde(default)]
    pub log_duration: i64,
}

/// 管理 API 配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdminConfig {
    /// 为空时管理 API 关闭（返回 404）
    #[serde(default)]
    pub token: String,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_true() -> bool {
    true
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_database_url() -> String {
    "sqlite://linkmasker.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_site_origin() -> String {
    "http://localhost:8080".to_string()
}

fn default_redirect_time() -> u32 {
    3
}

fn default_specific() -> Targeting {
    Targeting::Specific
}

fn default_separator() -> String {
    super::validators::DEFAULT_SEPARATOR.to_string()
}

fn default_anonymous_link_provider() -> String {
    "https://href.li/?".to_string()
}

fn default_adfly_advert_type() -> u32 {
    2
}

fn default_adfly_domain() -> String {
    "adf.ly".to_string()
}

fn default_redirect_message() -> String {
    "You will be redirected in 3 seconds. If your browser does not automatically redirect you, please <a href=\"%linkurl%\">click here</a>.".to_string()
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            workers: default_workers(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: default_site_origin(),
            pretty_permalinks: true,
            trusted_proxies: Vec::new(),
        }
    }
}

impl Default for MaskingSection {
    fn default() -> Self {
        Self {
            masking_type: MaskingType::default(),
            redirect_time: default_redirect_time(),
            mask_links: Targeting::Specific,
            mask_posts_pages: true,
            mask_comments: true,
            mask_comment_author: true,
            mask_rss: true,
            mask_rss_comments: true,
            nofollow: true,
            target_blank: true,
            noindex_tag: false,
            noindex_comment: false,
            separator: default_separator(),
            link_encoding: LinkEncoding::default(),
            encryption_key: None,
            remove_all_links: false,
            links_to_text: false,
            debug_mode: false,
            anonymize_links: false,
            anonymous_link_provider: default_anonymous_link_provider(),
            bot_targeting: Targeting::All,
            bots_selector: Vec::new(),
            check_referrer: true,
            inclusion_list: Vec::new(),
            exclusion_list: Vec::new(),
            skip_auth: false,
            skip_follow: false,
        }
    }
}

impl Default for SeoHideConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: Targeting::Specific,
            include_list: Vec::new(),
            exclude_list: Vec::new(),
        }
    }
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self {
            provider: Shortener::None,
            adfly_api_key: String::new(),
            adfly_user_id: String::new(),
            adfly_advert_type: default_adfly_advert_type(),
            adfly_domain: default_adfly_domain(),
            bitly_login: String::new(),
            bitly_api_key: String::new(),
            shortest_api_key: String::new(),
            yourls_domain: String::new(),
            yourls_signature: String::new(),
        }
    }
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            redirect_page: None,
            redirect_message: default_redirect_message(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_duration: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_plugin_defaults() {
        let config = StaticConfig::default();
        assert_eq!(config.masking.masking_type, MaskingType::Found);
        assert_eq!(config.masking.redirect_time, 3);
        assert_eq!(config.masking.separator, "goto");
        assert_eq!(config.masking.link_encoding, LinkEncoding::None);
        assert_eq!(config.masking.bot_targeting, Targeting::All);
        assert_eq!(config.masking.mask_links, Targeting::Specific);
        assert!(config.masking.nofollow);
        assert!(config.masking.target_blank);
        assert!(config.masking.check_referrer);
        assert!(config.logs.enabled);
        assert_eq!(config.logs.log_duration, 0);
        assert_eq!(config.shortener.provider, Shortener::None);
        assert!(config.redirect.redirect_message.contains("%linkurl%"));
    }

    #[test]
    fn test_sample_config_roundtrips_through_toml() {
        let sample = StaticConfig::generate_sample_config();
        let parsed: StaticConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.masking.anonymous_link_provider, "https://href.li/?");
        assert_eq!(parsed.site.origin, "http://localhost:8080");
    }

    #[test]
    fn test_lists_from_multiline_toml() {
        let parsed: StaticConfig = toml::from_str(
            r#"
            [masking]
            exclusion_list = "https://partner.example\r\nhttps://cdn.example\n"
            bots_selector = ["googlebot", "bingbot"]
            bot_targeting = "specific"
            masking_type = "javascript"
            "#,
        )
        .unwrap();
        assert_eq!(
            parsed.masking.exclusion_list,
            vec!["https://partner.example", "https://cdn.example"]
        );
        assert_eq!(parsed.masking.bots_selector, vec![Bot::Googlebot, Bot::Bingbot]);
        assert_eq!(parsed.masking.bot_targeting, Targeting::Specific);
        assert_eq!(parsed.masking.masking_type, MaskingType::Javascript);
    }
}
