//! 请求与渲染上下文

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::bots::{self, Bot};
use crate::config::{MaskingConfig, PostMaskOverride, Targeting};

/// 当前请求的访客信息
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    /// 请求 URI（路径 + 查询串）
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub referer: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub client_ip: Option<String>,
    /// 站点首页地址（无末尾斜杠）
    #[serde(default)]
    pub site_origin: String,
    #[serde(default = "default_true")]
    pub pretty_permalinks: bool,
}

fn default_true() -> bool {
    true
}

impl RequestContext {
    /// 以配置中的站点信息为基础构建
    pub fn for_site(config: &MaskingConfig) -> Self {
        Self {
            site_origin: config.site_origin.clone(),
            pretty_permalinks: config.pretty_permalinks,
            ..Default::default()
        }
    }

    /// 缺省字段用配置补齐（HTTP 调用方可能只传访客信息）
    pub fn with_site_defaults(mut self, config: &MaskingConfig) -> Self {
        if self.site_origin.trim().is_empty() {
            self.site_origin = config.site_origin.clone();
        } else {
            self.site_origin = self.site_origin.trim_end_matches('/').to_string();
        }
        self
    }

    /// 识别访客是否为已知爬虫
    pub fn bot(&self) -> Option<Bot> {
        self.user_agent.as_deref().and_then(bots::identify)
    }

    /// 去掉协议的站点地址
    pub fn site_without_scheme(&self) -> &str {
        self.site_origin
            .strip_prefix("https://")
            .or_else(|| self.site_origin.strip_prefix("http://"))
            .unwrap_or(&self.site_origin)
    }
}

/// 内容单元类型
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ContentKind {
    /// 文章/页面正文
    Content,
    /// 摘要
    Excerpt,
    /// 评论正文与评论链接
    Comment,
    /// 评论者链接
    CommentAuthor,
    /// RSS 正文与摘要
    Rss,
    /// RSS 评论
    RssComment,
}

impl ContentKind {
    /// 是否为文章级内容（受单篇覆盖与落地页排除影响）
    pub fn is_post(&self) -> bool {
        matches!(self, Self::Content | Self::Excerpt)
    }

    pub fn is_feed(&self) -> bool {
        matches!(self, Self::Rss | Self::RssComment)
    }

    /// 当前配置下该类型是否启用遮罩
    ///
    /// RSS 两项不受 `mask_links` 范围限制；其余类型只在 `specific` 下逐项生效，
    /// `all` 时由整页过滤统一处理。
    pub fn is_enabled(&self, config: &MaskingConfig) -> bool {
        let m = &config.masking;
        let specific = m.mask_links == Targeting::Specific;
        match self {
            Self::Content | Self::Excerpt => specific && m.mask_posts_pages,
            Self::Comment => specific && m.mask_comments,
            Self::CommentAuthor => specific && m.mask_comment_author,
            Self::Rss => m.mask_rss,
            Self::RssComment => m.mask_rss_comments,
        }
    }
}

/// 一次渲染的上下文
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderContext {
    #[serde(default)]
    pub visitor: RequestContext,
    #[serde(default)]
    pub post_override: PostMaskOverride,
    /// 当前文章就是自定义跳转落地页
    #[serde(default)]
    pub post_id_is_redirect_page: bool,
    #[serde(default)]
    pub is_feed: bool,
    #[serde(default)]
    pub is_admin: bool,
    /// 非 HTTP 上下文（定时任务等）不做整页过滤
    #[serde(default = "default_true")]
    pub is_http: bool,
    #[serde(default)]
    pub logged_in: bool,
}

impl RenderContext {
    pub fn new(visitor: RequestContext) -> Self {
        Self {
            visitor,
            is_http: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_kind_scope() {
        let mut config = MaskingConfig::default();
        assert!(ContentKind::Content.is_enabled(&config));
        assert!(ContentKind::Rss.is_enabled(&config));

        config.masking.mask_links = Targeting::All;
        assert!(!ContentKind::Content.is_enabled(&config));
        assert!(!ContentKind::CommentAuthor.is_enabled(&config));
        assert!(ContentKind::Rss.is_enabled(&config));

        config.masking.mask_rss_comments = false;
        assert!(!ContentKind::RssComment.is_enabled(&config));
    }

    #[test]
    fn test_content_kind_parse() {
        assert_eq!(
            "comment_author".parse::<ContentKind>().ok(),
            Some(ContentKind::CommentAuthor)
        );
        assert_eq!(ContentKind::RssComment.as_ref(), "rss_comment");
    }

    #[test]
    fn test_request_context_site_defaults() {
        let config = MaskingConfig::default();
        let ctx = RequestContext::default().with_site_defaults(&config);
        assert_eq!(ctx.site_origin, config.site_origin);

        let ctx = RequestContext {
            site_origin: "https://mysite.example/".into(),
            ..Default::default()
        }
        .with_site_defaults(&config);
        assert_eq!(ctx.site_origin, "https://mysite.example");
        assert_eq!(ctx.site_without_scheme(), "mysite.example");
    }

    #[test]
    fn test_bot_detection_from_context() {
        let ctx = RequestContext {
            user_agent: Some(
                "Mozilla/5.0 (compatible; YandexBot/3.0; +http://yandex.com/bots)".into(),
            ),
            ..Default::default()
        };
        assert_eq!(ctx.bot(), Some(Bot::Yandexbot));
        assert_eq!(RequestContext::default().bot(), None);
    }
}
