//! 跳转分发
//!
//! 识别请求中的跳转令牌，解码后记录日志，再按 `masking_type` 输出
//! 3xx 跳转或中间页。没有令牌时返回 `None`，交由调用方继续处理。

use std::sync::Arc;

use tracing::{debug, info, warn};
use url::form_urlencoded;

use super::context::RequestContext;
use super::encoder::LinkEncoder;
use super::html::{decode_entities, strip_tags};
use super::pages;
use crate::config::{MaskingConfig, MaskingType};
use crate::errors::Result;
use crate::services::{ClickLog, http};
use crate::storage::NewLogEntry;

const NO_CACHE: &str = "no-cache, no-store, must-revalidate";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// 与框架无关的跳转响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl DispatchResponse {
    fn html(status: u16, body: String) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), HTML_CONTENT_TYPE.to_string())],
            body,
        }
    }

    fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// 按名称取头（不区分大小写）
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// 从请求 URI 中取出跳转令牌
///
/// 查询参数 `{marker}=...` 优先（百分号解码一次）；否则取第一个 `/{marker}/`
/// 之后的全部内容（原样）。结果去掉 HTML 标签，空串视为没有令牌。
pub fn extract_token(uri: &str, separator: &str) -> Option<String> {
    if separator.is_empty() {
        return None;
    }

    let from_query = uri.split_once('?').and_then(|(_, query)| {
        form_urlencoded::parse(query.as_bytes())
            .find(|(k, v)| k == separator && !v.is_empty())
            .map(|(_, v)| v.into_owned())
    });

    let raw = from_query.or_else(|| {
        let marker = format!("/{}/", separator);
        uri.find(&marker)
            .map(|pos| uri[pos + marker.len()..].to_string())
    })?;

    let token = strip_tags(&raw).trim().to_string();
    if token.is_empty() { None } else { Some(token) }
}

#[derive(Clone)]
pub struct RedirectDispatcher {
    config: Arc<MaskingConfig>,
    encoder: LinkEncoder,
    click_log: Option<ClickLog>,
}

impl RedirectDispatcher {
    pub fn new(config: Arc<MaskingConfig>, encoder: LinkEncoder, click_log: Option<ClickLog>) -> Self {
        Self {
            config,
            encoder,
            click_log,
        }
    }

    pub fn config(&self) -> &MaskingConfig {
        &self.config
    }

    /// 处理一次请求；不是跳转请求时返回 `None`
    pub async fn dispatch(&self, request: &RequestContext) -> Option<DispatchResponse> {
        let token = extract_token(&request.uri, self.config.separator())?;
        let request = request.clone().with_site_defaults(&self.config);

        let response = self.respond(&request, &token).await;
        Some(response.with_header("Cache-Control", NO_CACHE))
    }

    async fn respond(&self, request: &RequestContext, token: &str) -> DispatchResponse {
        let home = request.site_origin.as_str();

        if self.config.masking.check_referrer && is_foreign_referrer(request.referer.as_deref(), home)
        {
            info!(
                "Redirect blocked, suspicious referrer: {}",
                request.referer.as_deref().unwrap_or_default()
            );
            return DispatchResponse::html(200, pages::referrer_warning_page(home))
                .with_header("Refresh", format!("5; url={}", home));
        }

        let decoded = match self.decode_token(token).await {
            Ok(url) => url,
            Err(e) => {
                debug!("Unable to decode redirect token {:?}: {}", token, e);
                return DispatchResponse::html(200, pages::no_destination_page());
            }
        };

        let mut target = decode_entities(&decoded).trim().to_string();
        if !is_web_url(&target) {
            warn!("Refusing redirect to non-http destination: {:?}", target);
            return DispatchResponse::html(200, pages::no_destination_page());
        }

        self.record(request, &decoded).await;
        if self.config.masking.anonymize_links {
            target = format!("{}{}", self.config.masking.anonymous_link_provider, target);
        }

        self.render(&target).await
    }

    /// 解码令牌；路径令牌后面带了无关查询串（如 `?fbclid=`）时去掉再试一次
    async fn decode_token(&self, token: &str) -> Result<String> {
        match self.encoder.decode(token).await {
            Ok(url) => Ok(url),
            Err(e) => match token.split_once('?') {
                Some((head, _)) if !head.trim().is_empty() => self.encoder.decode(head).await,
                _ => Err(e),
            },
        }
    }

    /// 写日志并顺带清理过期记录，失败不影响跳转
    async fn record(&self, request: &RequestContext, url: &str) {
        if !self.config.logs.enabled {
            return;
        }
        let Some(click_log) = &self.click_log else {
            return;
        };

        let entry = NewLogEntry {
            url: url.to_string(),
            referring_url: request.referer.clone(),
            user_agent: request.user_agent.clone(),
            ip_address: request.client_ip.clone(),
        };
        click_log.append(&entry).await;

        if let Err(e) = click_log.maybe_purge(self.config.log_duration_days()).await {
            warn!("Redirect log purge failed: {}", e);
        }
    }

    async fn render(&self, target: &str) -> DispatchResponse {
        let masking = &self.config.masking;

        if let Some(status) = masking.masking_type.status_code() {
            return DispatchResponse::html(status, String::new())
                .with_header("Location", header_safe(target));
        }

        let time = masking.redirect_time;
        let mut response = DispatchResponse::html(200, String::new());
        if masking.masking_type == MaskingType::Javascript {
            response =
                response.with_header("Refresh", format!("{}; url={}", time, header_safe(target)));
        }

        if let Some(page_url) = self
            .config
            .redirect
            .redirect_page
            .as_deref()
            .filter(|u| !u.trim().is_empty())
        {
            match http::fetch_text(page_url).await {
                Ok(body) => {
                    response.body = pages::fill_landing_page(&body, target);
                    return response.with_header("X-Robots-Tag", "noindex, nofollow");
                }
                Err(e) => {
                    warn!("Landing page {} unavailable, using built-in page: {}", page_url, e);
                }
            }
        }

        response.body = pages::redirect_page(target, time, &self.config.redirect.redirect_message);
        response
    }
}

/// 头部值只允许可见 ASCII，其余字节百分号编码
fn header_safe(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        if b.is_ascii_graphic() {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

/// 只跳转到 http / https 地址
fn is_web_url(target: &str) -> bool {
    url::Url::parse(target)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// 来源存在且不以本站地址开头（不区分大小写）
fn is_foreign_referrer(referer: Option<&str>, home: &str) -> bool {
    match referer.map(str::trim) {
        Some(r) if !r.is_empty() => !r.to_ascii_lowercase().starts_with(&home.to_ascii_lowercase()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LinkEncoding;

    #[test]
    fn test_extract_token_from_path() {
        assert_eq!(
            extract_token("/goto/aHR0cHM6Ly9hLmI=", "goto").as_deref(),
            Some("aHR0cHM6Ly9hLmI=")
        );
        assert_eq!(
            extract_token("/blog/goto/https://a.example/x?y=1", "goto").as_deref(),
            Some("https://a.example/x?y=1")
        );
        assert_eq!(extract_token("/goto/", "goto"), None);
        assert_eq!(extract_token("/about/", "goto"), None);
    }

    #[test]
    fn test_extract_token_query_wins() {
        assert_eq!(
            extract_token("/goto/path-token?goto=aHR0cHM6Ly9hLmI%3D", "goto").as_deref(),
            Some("aHR0cHM6Ly9hLmI=")
        );
        assert_eq!(
            extract_token("/?goto=%3Cb%3E42%3C%2Fb%3E", "goto").as_deref(),
            Some("42")
        );
        assert_eq!(extract_token("/?other=1", "goto"), None);
    }

    #[test]
    fn test_header_safe() {
        assert_eq!(header_safe("https://a.example/x?y=1"), "https://a.example/x?y=1");
        assert_eq!(header_safe("https://a.example/é b"), "https://a.example/%C3%A9%20b");
    }

    #[test]
    fn test_foreign_referrer() {
        let home = "https://mysite.example";
        assert!(!is_foreign_referrer(None, home));
        assert!(!is_foreign_referrer(Some(""), home));
        assert!(!is_foreign_referrer(Some("HTTPS://MySite.example/post"), home));
        assert!(is_foreign_referrer(Some("https://evil.example/"), home));
    }

    fn dispatcher(configure: impl FnOnce(&mut MaskingConfig)) -> RedirectDispatcher {
        let mut config = MaskingConfig::default();
        config.site_origin = "https://mysite.example".to_string();
        configure(&mut config);
        let encoder = LinkEncoder::with_encoding(LinkEncoding::Base64, None, None);
        RedirectDispatcher::new(Arc::new(config), encoder, None)
    }

    fn visit(uri: &str) -> RequestContext {
        RequestContext {
            uri: uri.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_found_redirect() {
        let d = dispatcher(|_| {});
        let resp = d.dispatch(&visit("/goto/aHR0cHM6Ly9hLmI=")).await.unwrap();
        assert_eq!(resp.status, 302);
        assert_eq!(resp.header("location"), Some("https://a.b"));
        assert_eq!(resp.header("cache-control"), Some(NO_CACHE));
    }

    #[tokio::test]
    async fn test_anonymizer_prefix() {
        let d = dispatcher(|c| c.masking.anonymize_links = true);
        let resp = d.dispatch(&visit("/goto/aHR0cHM6Ly9hLmI=")).await.unwrap();
        assert_eq!(resp.header("Location"), Some("https://href.li/?https://a.b"));
    }

    #[tokio::test]
    async fn test_not_a_redirect_request() {
        let d = dispatcher(|_| {});
        assert!(d.dispatch(&visit("/hello-world/")).await.is_none());
    }

    #[tokio::test]
    async fn test_suspicious_referrer() {
        let d = dispatcher(|_| {});
        let mut req = visit("/goto/aHR0cHM6Ly9hLmI=");
        req.referer = Some("https://evil.example/".to_string());

        let resp = d.dispatch(&req).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.header("Refresh"), Some("5; url=https://mysite.example"));
        assert!(resp.body.contains("suspicious source"));
        assert!(resp.header("Location").is_none());
    }

    #[tokio::test]
    async fn test_javascript_page() {
        let d = dispatcher(|c| c.masking.masking_type = MaskingType::Javascript);
        let resp = d.dispatch(&visit("/goto/aHR0cHM6Ly9hLmI=")).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.header("Refresh"), Some("3; url=https://a.b"));
        assert!(resp.body.contains(r#"<a href="https://a.b">click here</a>"#));
    }

    #[test]
    fn test_is_web_url() {
        assert!(is_web_url("https://a.example/x"));
        assert!(is_web_url("HTTP://A.example"));
        assert!(!is_web_url("javascript:alert(1)"));
        assert!(!is_web_url("JavaScript:alert(1)"));
        assert!(!is_web_url("data:text/html,x"));
        assert!(!is_web_url("//a.example/x"));
        assert!(!is_web_url(""));
    }

    #[tokio::test]
    async fn test_script_destination_is_refused() {
        let d = dispatcher(|c| c.masking.masking_type = MaskingType::Javascript);
        // javascript:alert(document.cookie)
        let resp = d.dispatch(&visit("/goto/amF2YXNjcmlwdDphbGVydChkb2N1bWVudC5jb29raWUp")).await.unwrap();
        assert_eq!(resp.status, 200);
        assert!(resp.body.contains("no url redirect specified"));
        assert!(!resp.body.contains("javascript:"));
        assert!(resp.header("Refresh").is_none());

        let d = dispatcher(|_| {});
        let resp = d.dispatch(&visit("/goto/ZGF0YTp0ZXh0L2h0bWwsPHNjcmlwdD5hbGVydCgxKTwvc2NyaXB0Pg==")).await.unwrap();
        assert_eq!(resp.status, 200);
        assert!(resp.header("Location").is_none());
    }

    #[tokio::test]
    async fn test_path_token_with_tracking_query() {
        let d = dispatcher(|_| {});
        let resp = d
            .dispatch(&visit("/goto/aHR0cHM6Ly9hLmI=?fbclid=abc123"))
            .await
            .unwrap();
        assert_eq!(resp.status, 302);
        assert_eq!(resp.header("Location"), Some("https://a.b"));
    }

    #[tokio::test]
    async fn test_malformed_token() {
        let d = dispatcher(|_| {});
        let resp = d.dispatch(&visit("/goto/@@@")).await.unwrap();
        assert_eq!(resp.status, 200);
        assert!(resp.body.contains("no url redirect specified"));
    }
}
