//! 单个链接的遮罩决策与输出拼装
//!
//! 决策顺序：
//! 1. `rel="exclude"`：记入本次渲染的排除集合，去掉该属性后原样输出
//! 2. 包含列表非空：只遮罩以其中某项开头的链接（区分大小写），忽略排除列表
//! 3. 否则以排除集合任一项开头（不区分大小写）的链接原样输出
//!
//! 需要遮罩时依次经过爬虫定向、follow 跳过、SEO 隐藏、短链、跳转编码与输出整形，
//! 异步部分（短链与编码）在 `scanner` 中完成。

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use once_cell::sync::Lazy;
use regex::Regex;

use super::bots::Bot;
use super::html::escape_attr;
use crate::config::{MaskingConfig, Targeting};

/// 内置排除前缀（站点地址之外）
const DEFAULT_EXCLUSIONS: &[&str] = &[
    "javascript",
    "magnet",
    "mailto",
    "skype",
    "tel",
    "/",
    "#",
    "https://wordpress.org/",
    "https://codex.wordpress.org/",
];

static EXCLUDE_SENTINEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i) rel=["']exclude["']"#).expect("EXCLUDE_SENTINEL_RE regex is valid")
});

static CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?si)class="([^"]+)""#).expect("CLASS_RE regex is valid"));

/// 扫描到的一个 `<a>` 标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorMatch {
    /// 完整标签文本
    pub anchor: String,
    /// `href` 之前的属性
    pub before: String,
    pub href: String,
    /// `href` 之后的属性
    pub after: String,
    /// 链接文本（可含内层标签）
    pub text: String,
}

impl AnchorMatch {
    /// 除 href 外的其余属性
    pub fn attributes(&self) -> String {
        format!("{} {}", self.before.trim(), self.after.trim())
            .trim()
            .to_string()
    }
}

/// 单次渲染的排除集合
///
/// 由默认项、用户排除列表与已发出的短链初始化，渲染过程中会追加
/// `rel="exclude"` 链接与新生成的短链，只在本次渲染内有效。
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    entries: Vec<String>,
}

impl ExclusionSet {
    pub fn seeded<'a, I>(site_without_scheme: &str, user_entries: &[String], known_masks: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut entries = vec![
            format!("http://{}", site_without_scheme),
            format!("https://{}", site_without_scheme),
        ];
        entries.extend(DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()));
        entries.extend(user_entries.iter().cloned());
        entries.extend(known_masks.into_iter().cloned());
        entries.retain(|e| !e.is_empty());

        Self { entries }
    }

    pub fn push(&mut self, entry: impl Into<String>) {
        let entry = entry.into();
        if !entry.is_empty() {
            self.entries.push(entry);
        }
    }

    /// 返回命中的排除前缀
    pub fn matching(&self, url: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| starts_with_ignore_case(url, e))
            .map(String::as_str)
    }

    pub fn contains_prefix_of(&self, url: &str) -> bool {
        self.matching(url).is_some()
    }
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack.len() >= prefix.len()
        && haystack.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// 第一阶段决策结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// 原样输出
    Keep,
    /// 用给定文本替换（去掉了 `rel="exclude"`）
    Replace(String),
    /// 进入遮罩分支
    Mask,
}

/// 决定是否遮罩
pub fn decide(link: &AnchorMatch, config: &MaskingConfig, exclusions: &mut ExclusionSet) -> Action {
    if let Some(found) = EXCLUDE_SENTINEL_RE.find(&link.anchor) {
        exclusions.push(link.href.clone());
        return Action::Replace(link.anchor.replacen(found.as_str(), "", 1));
    }

    let inclusion = &config.masking.inclusion_list;
    if !inclusion.is_empty() {
        return if inclusion.iter().any(|entry| link.href.starts_with(entry.as_str())) {
            Action::Mask
        } else {
            Action::Keep
        };
    }

    if exclusions.contains_prefix_of(&link.href) {
        Action::Keep
    } else {
        Action::Mask
    }
}

/// 爬虫定向：`specific` 时只放行选中的爬虫，普通访客总是放行
pub fn bot_gate_passes(config: &MaskingConfig, bot: Option<Bot>) -> bool {
    match (config.masking.bot_targeting, bot) {
        (Targeting::All, _) => true,
        (Targeting::Specific, None) => true,
        (Targeting::Specific, Some(bot)) => config.masking.bots_selector.contains(&bot),
    }
}

/// 标签的 `rel` 属性是否含有前面不是 `no` 的 `follow`
pub fn has_follow_rel(anchor: &str) -> bool {
    let lower = anchor.to_ascii_lowercase();

    for (start, _) in lower.match_indices("rel=") {
        let rest = &lower[start + 4..];
        let Some(value) = rest.strip_prefix('"').or_else(|| rest.strip_prefix('\'')) else {
            continue;
        };
        // 单行内匹配
        let line = value.split('\n').next().unwrap_or_default();
        let bytes = line.as_bytes();

        for (pos, _) in line.match_indices("follow") {
            let preceded_by_no = pos >= 2 && &bytes[pos - 2..pos] == b"no";
            let closed = line[pos + "follow".len()..].contains(['"', '\'']);
            if !preceded_by_no && closed {
                return true;
            }
        }
    }
    false
}

/// 从 URL 取主机名
pub fn domain_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

/// SEO 隐藏：命中时返回替代的 `<span>`
pub fn seo_hide_span(config: &MaskingConfig, link: &AnchorMatch) -> Option<String> {
    let seo = &config.seo_hide;
    if !seo.enabled {
        return None;
    }

    let domain = domain_of(&link.href).unwrap_or_default();
    let hide = match seo.mode {
        Targeting::Specific => seo.include_list.iter().any(|d| *d == domain),
        Targeting::All => !seo.exclude_list.iter().any(|d| *d == domain),
    };
    if !hide {
        return None;
    }

    let attributes = link.attributes();
    let mut classes = String::from("waslinkname");
    if let Some(extra) = CLASS_RE.captures(&attributes).and_then(|c| c.get(1)) {
        classes.push(' ');
        classes.push_str(extra.as_str());
    }

    let target = if config.masking.target_blank {
        r#" data-target="_blank""#
    } else {
        ""
    };

    Some(format!(
        r#"<span class="{}" data-link="{}"{}>{}</span>"#,
        escape_attr(&classes),
        escape_attr(&STANDARD.encode(link.href.as_bytes())),
        target,
        link.text
    ))
}

/// 站内跳转地址：`{site}/{marker}/{token}` 或 `{site}/?{marker}={token}`
pub fn mask_url(site_origin: &str, separator: &str, pretty_permalinks: bool, token: &str) -> String {
    let site = site_origin.trim_matches('/');
    if pretty_permalinks {
        format!("{}/{}/{}", site, separator, token)
    } else {
        format!("{}/?{}={}", site, separator, urlencoding::encode(token))
    }
}

/// 拼装 `<a>` 标签
pub fn anchor_html(config: &MaskingConfig, href: &str, attributes: &str, text: &str) -> String {
    let blank = if config.masking.target_blank {
        r#" target="_blank""#
    } else {
        ""
    };
    let nofollow = if config.masking.nofollow {
        r#" rel="nofollow""#
    } else {
        ""
    };
    let attributes = if attributes.is_empty() {
        String::new()
    } else {
        format!(" {}", attributes)
    };

    format!(
        r#"<a{}{} href="{}"{}>{}</a>"#,
        blank, nofollow, href, attributes, text
    )
}

/// 输出整形：去链接 / 转文字 / 普通链接（可选 noindex 包裹）
pub fn shape_output(config: &MaskingConfig, link: &AnchorMatch, href: &str) -> String {
    let m = &config.masking;

    if m.remove_all_links {
        return format!(r#"<span class="waslinkname">{}</span>"#, link.text);
    }

    if m.links_to_text {
        return format!(
            r#"<span class="waslinkname">{}</span> ^(<span class="waslinkurl">{})</span>"#,
            link.text, href
        );
    }

    let mut anchor = anchor_html(config, href, &link.attributes(), &link.text);
    if m.noindex_tag {
        anchor = format!("<noindex>{}</noindex>", anchor);
    }
    if m.noindex_comment {
        anchor = format!("<!--noindex-->{}<!--/noindex-->", anchor);
    }
    anchor
}
