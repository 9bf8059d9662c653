//! HTML 链接扫描
//!
//! 用正则找出 `<a ... href="..." ...>...</a>`（不区分大小写，`.` 匹配换行），
//! 按出现顺序逐个决策并重写。排除集合由一次 `ScanPass` 独占，不跨请求共享。

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use super::bots::Bot;
use super::context::RequestContext;
use super::debug::DebugLog;
use super::encoder::LinkEncoder;
use super::policy::{self, Action, AnchorMatch, ExclusionSet};
use crate::config::{MaskingConfig, MaskingType};
use crate::services::MaskStore;

static ANCHOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?si)<a (.*?)href=["'](.*?)["'](.*?)>(.*?)</a>"#)
        .expect("ANCHOR_RE regex is valid")
});

/// 找出所有锚点及其在原文中的位置
pub fn find_anchors(html: &str) -> Vec<(std::ops::Range<usize>, AnchorMatch)> {
    ANCHOR_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or_default().to_string();
            Some((
                whole.range(),
                AnchorMatch {
                    anchor: whole.as_str().to_string(),
                    before: group(1),
                    href: group(2),
                    after: group(3),
                    text: group(4),
                },
            ))
        })
        .collect()
}

/// 一次渲染的扫描过程
pub struct ScanPass<'a> {
    config: &'a MaskingConfig,
    encoder: &'a LinkEncoder,
    store: Option<&'a MaskStore>,
    visitor: &'a RequestContext,
    bot: Option<Bot>,
    exclusions: ExclusionSet,
    replacements: usize,
}

impl<'a> ScanPass<'a> {
    /// 初始化排除集合（含已发出的短链）
    pub async fn begin(
        config: &'a MaskingConfig,
        encoder: &'a LinkEncoder,
        store: Option<&'a MaskStore>,
        visitor: &'a RequestContext,
        debug: &mut DebugLog,
    ) -> Self {
        let known = match store {
            Some(store) => match store.known_masks().await {
                Ok(masks) => masks,
                Err(e) => {
                    warn!("Unable to load known masks: {}", e);
                    debug.note(|| format!("Unable to load known masks: {}", e));
                    Default::default()
                }
            },
            None => Default::default(),
        };

        let exclusions = ExclusionSet::seeded(
            visitor.site_without_scheme(),
            &config.masking.exclusion_list,
            known.iter(),
        );

        Self {
            config,
            encoder,
            store,
            visitor,
            bot: visitor.bot(),
            exclusions,
            replacements: 0,
        }
    }

    /// 被匹配并处理的锚点数
    pub fn replacements(&self) -> usize {
        self.replacements
    }

    /// 扫描并重写整段 HTML
    pub async fn run(&mut self, html: &str, debug: &mut DebugLog) -> String {
        let anchors = find_anchors(html);
        if anchors.is_empty() {
            return html.to_string();
        }

        let mut out = String::with_capacity(html.len() + anchors.len() * 32);
        let mut last = 0;
        for (range, link) in anchors {
            out.push_str(&html[last..range.start]);
            let rewritten = self.process(&link, debug).await;
            out.push_str(&rewritten);
            last = range.end;
            self.replacements += 1;
        }
        out.push_str(&html[last..]);
        out
    }

    /// 处理单个锚点
    pub async fn process(&mut self, link: &AnchorMatch, debug: &mut DebugLog) -> String {
        debug.note(|| format!("Parser called for link {{{}}}", link.href));

        match policy::decide(link, self.config, &mut self.exclusions) {
            Action::Replace(anchor) => {
                debug.note(|| format!("rel=\"exclude\" on {}, not masking", link.href));
                anchor
            }
            Action::Keep => {
                if let Some(prefix) = self.exclusions.matching(&link.href) {
                    debug.note(|| format!("In exclusion list ({}), not masking...", prefix));
                } else {
                    debug.note(|| format!("{} is not in the inclusion list", link.href));
                }
                link.anchor.clone()
            }
            Action::Mask => self.mask(link, debug).await,
        }
    }

    async fn mask(&mut self, link: &AnchorMatch, debug: &mut DebugLog) -> String {
        let config = self.config;

        if !policy::bot_gate_passes(config, self.bot) {
            debug.note(|| "User agent targeting does not match, not masking it.".to_string());
            return link.anchor.clone();
        }

        if config.masking.skip_follow && policy::has_follow_rel(&link.anchor) {
            debug.note(|| "This link has a follow attribute not masking it.".to_string());
            return link.anchor.clone();
        }

        if let Some(span) = policy::seo_hide_span(config, link) {
            return span;
        }

        let shortener = config.shortener.provider;
        if shortener.is_enabled() {
            let Some(store) = self.store else {
                debug.note(|| "Shortening is enabled but no mask store is available".to_string());
                return link.anchor.clone();
            };
            return match store.find_or_create(&link.href, shortener).await {
                Ok(short) => {
                    self.exclusions.push(short.clone());
                    policy::anchor_html(config, &short, &link.attributes(), &link.text)
                }
                Err(e) => {
                    warn!("Shortening {} failed: {}", link.href, e);
                    debug.note(|| format!("Shortening failed: {}", e));
                    link.anchor.clone()
                }
            };
        }

        let mut href = link.href.clone();
        if config.masking.masking_type != MaskingType::No {
            match self.encoder.encode(&link.href).await {
                Ok(token) => {
                    href = policy::mask_url(
                        &self.visitor.site_origin,
                        config.separator(),
                        self.visitor.pretty_permalinks,
                        &token,
                    );
                }
                Err(e) => {
                    // 本次渲染保持原链接
                    warn!("Encoding {} failed: {}", link.href, e);
                    debug.note(|| format!("Encoding failed, link left unmasked: {}", e));
                    return link.anchor.clone();
                }
            }
        }

        policy::shape_output(config, link, &href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_anchors_multiline_and_quotes() {
        let html = "<p><a class=\"x\"\n href='https://a.example/1' title=\"t\">One</a> and <A HREF=\"https://b.example\">Two</A></p>";
        let anchors = find_anchors(html);
        assert_eq!(anchors.len(), 2);

        let (range, first) = &anchors[0];
        assert_eq!(&html[range.clone()], first.anchor);
        assert_eq!(first.href, "https://a.example/1");
        assert_eq!(first.before, "class=\"x\"\n ");
        assert_eq!(first.after, " title=\"t\"");
        assert_eq!(first.text, "One");

        assert_eq!(anchors[1].1.href, "https://b.example");
        assert_eq!(anchors[1].1.text, "Two");
    }

    #[test]
    fn test_find_anchors_ignores_anchors_without_href() {
        assert!(find_anchors("<a name=\"top\">Top</a>").is_empty());
    }

    #[tokio::test]
    async fn test_base64_masking_without_store() {
        let mut config = MaskingConfig::default();
        config.site_origin = "https://mysite.example".to_string();
        let encoder = LinkEncoder::with_encoding(crate::config::LinkEncoding::Base64, None, None);
        let visitor = RequestContext::for_site(&config);
        let mut debug = DebugLog::new(false);

        let mut pass = ScanPass::begin(&config, &encoder, None, &visitor, &mut debug).await;
        let out = pass
            .run(
                r#"<a href="https://ext.example/">Ext</a> <a href="/local">Local</a>"#,
                &mut debug,
            )
            .await;

        assert_eq!(
            out,
            r#"<a target="_blank" rel="nofollow" href="https://mysite.example/goto/aHR0cHM6Ly9leHQuZXhhbXBsZS8=">Ext</a> <a href="/local">Local</a>"#
        );
        assert_eq!(pass.replacements(), 2);
    }
}
