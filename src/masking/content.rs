//! 内容过滤入口
//!
//! - `render_block`：单个内容单元（正文、摘要、评论、RSS 等），`mask_links = specific`
//! - `wrap_full_response`：整页渲染完成后统一过滤，`mask_links = all`

use std::sync::Arc;

use tracing::trace;

use super::context::{ContentKind, RenderContext};
use super::debug::DebugLog;
use super::encoder::LinkEncoder;
use super::html::neutralize_comment;
use super::scanner::ScanPass;
use crate::config::{MaskingConfig, MaskingType, PostMaskOverride, Targeting};
use crate::services::MaskStore;

#[derive(Clone)]
pub struct ContentFilter {
    config: Arc<MaskingConfig>,
    encoder: LinkEncoder,
    store: Option<MaskStore>,
}

impl ContentFilter {
    pub fn new(config: Arc<MaskingConfig>, store: Option<MaskStore>) -> Self {
        let encoder = LinkEncoder::new(&config, store.clone());
        Self {
            config,
            encoder,
            store,
        }
    }

    /// 使用指定编码器（测试与工具使用）
    pub fn with_encoder(
        config: Arc<MaskingConfig>,
        encoder: LinkEncoder,
        store: Option<MaskStore>,
    ) -> Self {
        Self {
            config,
            encoder,
            store,
        }
    }

    pub fn config(&self) -> &MaskingConfig {
        &self.config
    }

    /// `masking_type = no` 时不做任何扫描（短链与 SEO 隐藏也不生效）
    pub fn scanning_enabled(&self) -> bool {
        self.config.masking.masking_type != MaskingType::No
    }

    fn skipped_for_visitor(&self, ctx: &RenderContext) -> bool {
        ctx.is_admin || (self.config.masking.skip_auth && ctx.logged_in)
    }

    /// 过滤单个内容单元
    pub async fn render_block(&self, kind: ContentKind, html: &str, ctx: &RenderContext) -> String {
        if html.is_empty()
            || !kind.is_enabled(&self.config)
            || self.skipped_for_visitor(ctx)
            || !self.scanning_enabled()
        {
            return html.to_string();
        }

        let mut debug = DebugLog::new(self.config.masking.debug_mode);

        if kind.is_post() {
            debug.note(|| "Checking post for meta.".to_string());

            if ctx.post_override == PostMaskOverride::Disabled {
                debug.note(|| "Meta nomask. No masking will be applied".to_string());
                return format!("{}{}", html, debug.render());
            }
            if ctx.post_id_is_redirect_page {
                debug.note(|| "Custom redirect page, not masking".to_string());
                return format!("{}{}", html, debug.render());
            }
            debug.note(|| "Filter will be applied".to_string());
        }

        let is_feed = ctx.is_feed || kind.is_feed();
        let filtered = self.filter(html, ctx, is_feed, &mut debug).await;
        format!("{}{}", filtered, debug.render())
    }

    /// 整页过滤：先完整渲染，再统一扫描，最后输出
    ///
    /// 非 HTTP 上下文、feed、单篇禁用与自定义落地页直接返回原始渲染结果。
    pub async fn wrap_full_response<F>(&self, render_fn: F, ctx: &RenderContext) -> String
    where
        F: FnOnce() -> String,
    {
        let content = render_fn();

        if !ctx.is_http
            || content.is_empty()
            || self.config.masking.mask_links != Targeting::All
            || self.skipped_for_visitor(ctx)
            || !self.scanning_enabled()
            || ctx.is_feed
            || ctx.post_override == PostMaskOverride::Disabled
            || ctx.post_id_is_redirect_page
        {
            return content;
        }

        let mut debug = DebugLog::new(self.config.masking.debug_mode);
        let filtered = self.filter(&content, ctx, false, &mut debug).await;
        inject_before_body_end(filtered, &debug.render())
    }

    async fn filter(
        &self,
        html: &str,
        ctx: &RenderContext,
        is_feed: bool,
        debug: &mut DebugLog,
    ) -> String {
        debug.note(|| format!("Processing text: \n{}", neutralize_comment(html)));

        let m = &self.config.masking;
        if is_feed && !m.mask_rss && !m.mask_rss_comments {
            debug.note(|| "It is feed, no processing".to_string());
            return html.to_string();
        }

        let visitor = ctx.visitor.clone().with_site_defaults(&self.config);
        let mut pass = ScanPass::begin(
            &self.config,
            &self.encoder,
            self.store.as_ref(),
            &visitor,
            debug,
        )
        .await;
        let out = pass.run(html, debug).await;

        trace!("{} anchors processed", pass.replacements());
        debug.note(|| {
            format!(
                "{} replacements done.\nFilter returned: \n{}",
                pass.replacements(),
                neutralize_comment(&out)
            )
        });
        out
    }
}

/// 调试注释放在 `</body>` 之前，没有则追加到末尾
fn inject_before_body_end(mut html: String, extra: &str) -> String {
    if extra.is_empty() {
        return html;
    }
    match html.rfind("</body>") {
        Some(pos) => {
            html.insert_str(pos, extra);
            html
        }
        None => {
            html.push_str(extra);
            html
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LinkEncoding;
    use crate::masking::context::RequestContext;

    fn filter_with(config: MaskingConfig) -> ContentFilter {
        let encoder = LinkEncoder::with_encoding(LinkEncoding::None, None, None);
        ContentFilter::with_encoder(Arc::new(config), encoder, None)
    }

    fn site_config() -> MaskingConfig {
        let mut config = MaskingConfig::default();
        config.site_origin = "https://mysite.example".to_string();
        config
    }

    fn ctx(config: &MaskingConfig) -> RenderContext {
        RenderContext::new(RequestContext::for_site(config))
    }

    const LINK: &str = r#"<a href="https://ext.example/page">Text</a>"#;
    const MASKED: &str = r#"<a target="_blank" rel="nofollow" href="https://mysite.example/goto/https://ext.example/page">Text</a>"#;

    #[tokio::test]
    async fn test_render_block_masks_content() {
        let config = site_config();
        let filter = filter_with(config.clone());
        let out = filter
            .render_block(ContentKind::Content, LINK, &ctx(&config))
            .await;
        assert_eq!(out, MASKED);
    }

    #[tokio::test]
    async fn test_masking_type_no_leaves_links() {
        let mut config = site_config();
        config.masking.masking_type = MaskingType::No;
        let filter = filter_with(config.clone());
        assert!(!filter.scanning_enabled());

        let out = filter
            .render_block(ContentKind::Comment, LINK, &ctx(&config))
            .await;
        assert_eq!(out, LINK);
    }

    #[tokio::test]
    async fn test_masking_type_no_ignores_seo_hide_and_shortener() {
        let mut config = site_config();
        config.masking.masking_type = MaskingType::No;
        config.seo_hide.enabled = true;
        config.seo_hide.mode = Targeting::All;
        config.shortener.provider = crate::config::Shortener::Bitly;
        let filter = filter_with(config.clone());
        assert!(!filter.scanning_enabled());

        let out = filter
            .render_block(ContentKind::Content, LINK, &ctx(&config))
            .await;
        assert_eq!(out, LINK);

        config.masking.mask_links = Targeting::All;
        let filter = filter_with(config.clone());
        let page = format!("<html><body>{}</body></html>", LINK);
        let out = filter
            .wrap_full_response(|| page.clone(), &ctx(&config))
            .await;
        assert_eq!(out, page);
    }

    #[tokio::test]
    async fn test_post_override_and_admin() {
        let config = site_config();
        let filter = filter_with(config.clone());

        let mut disabled = ctx(&config);
        disabled.post_override = PostMaskOverride::Disabled;
        assert_eq!(
            filter.render_block(ContentKind::Content, LINK, &disabled).await,
            LINK
        );
        // 单篇覆盖只作用于文章内容
        assert_eq!(
            filter.render_block(ContentKind::Comment, LINK, &disabled).await,
            MASKED
        );

        let mut admin = ctx(&config);
        admin.is_admin = true;
        assert_eq!(
            filter.render_block(ContentKind::Content, LINK, &admin).await,
            LINK
        );
    }

    #[tokio::test]
    async fn test_skip_auth() {
        let mut config = site_config();
        config.masking.skip_auth = true;
        let filter = filter_with(config.clone());

        let mut logged_in = ctx(&config);
        logged_in.logged_in = true;
        assert_eq!(
            filter.render_block(ContentKind::Content, LINK, &logged_in).await,
            LINK
        );
        assert_eq!(
            filter.render_block(ContentKind::Content, LINK, &ctx(&config)).await,
            MASKED
        );
    }

    #[tokio::test]
    async fn test_feed_skipped_when_rss_disabled() {
        let mut config = site_config();
        config.masking.mask_rss = false;
        config.masking.mask_rss_comments = false;
        let filter = filter_with(config.clone());

        let mut feed = ctx(&config);
        feed.is_feed = true;
        assert_eq!(
            filter.render_block(ContentKind::Content, LINK, &feed).await,
            LINK
        );
    }

    #[tokio::test]
    async fn test_full_page_only_in_all_mode() {
        let mut config = site_config();
        let page = format!("<html><body>{}</body></html>", LINK);

        let filter = filter_with(config.clone());
        let out = filter
            .wrap_full_response(|| page.clone(), &ctx(&config))
            .await;
        assert_eq!(out, page);

        config.masking.mask_links = Targeting::All;
        let filter = filter_with(config.clone());
        let out = filter
            .wrap_full_response(|| page.clone(), &ctx(&config))
            .await;
        assert_eq!(out, format!("<html><body>{}</body></html>", MASKED));

        let mut cron = ctx(&config);
        cron.is_http = false;
        let out = filter.wrap_full_response(|| page.clone(), &cron).await;
        assert_eq!(out, page);
    }

    #[tokio::test]
    async fn test_debug_comment_appended() {
        let mut config = site_config();
        config.masking.debug_mode = true;
        let filter = filter_with(config.clone());

        let out = filter
            .render_block(ContentKind::Content, LINK, &ctx(&config))
            .await;
        assert!(out.starts_with(MASKED));
        assert!(out.contains("<!--linkmasker debug:"));
        assert!(out.contains("1 replacements done."));
        assert!(out.trim_end().ends_with("-->"));
    }
}
