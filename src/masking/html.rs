//! HTML 文本工具：实体还原、属性转义、去标签

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});")
        .expect("ENTITY_RE regex is valid")
});

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[^>]*>?").expect("TAG_RE regex is valid"));

fn named_entity(name: &str) -> Option<char> {
    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "hellip" => '\u{2026}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "trade" => '\u{2122}',
        _ => return None,
    };
    Some(ch)
}

/// 还原 HTML 实体（`&#038;`、`&amp;`、十进制/十六进制与常见命名实体）
///
/// 未知实体原样保留。
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    ENTITY_RE.replace_all(input, |caps: &Captures| {
        let body = &caps[1];
        let decoded = if let Some(hex) = body
            .strip_prefix("#x")
            .or_else(|| body.strip_prefix("#X"))
        {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = body.strip_prefix('#') {
            dec.parse::<u32>().ok().and_then(char::from_u32)
        } else {
            named_entity(body)
        };

        match decoded {
            Some(ch) => ch.to_string(),
            None => caps[0].to_string(),
        }
    })
}

/// 转义为可安全放入双引号属性值的文本
pub fn escape_attr(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// 转义跳转目标 URL（`&` 写作 `&#038;`）
pub fn escape_url(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&#038;"),
            '\'' => out.push_str("&#039;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            ' ' => out.push_str("%20"),
            _ => out.push(ch),
        }
    }
    out
}

/// 去掉所有 HTML 标签
pub fn strip_tags(input: &str) -> Cow<'_, str> {
    if !input.contains('<') {
        return Cow::Borrowed(input);
    }
    TAG_RE.replace_all(input, "")
}

/// 中和 HTML 注释结束符，用于调试注释输出
pub fn neutralize_comment(input: &str) -> String {
    input.replace("-->", "--&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_entities() {
        assert_eq!(
            decode_entities("https://a.example/?x=1&#038;y=2&amp;z=3"),
            "https://a.example/?x=1&y=2&z=3"
        );
        assert_eq!(decode_entities("&#x26;&lt;&gt;&quot;"), "&<>\"");
        assert_eq!(decode_entities("&unknown; stays"), "&unknown; stays");
        assert!(matches!(decode_entities("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(
            escape_attr(r#"a"b'<c>&"#),
            "a&quot;b&#039;&lt;c&gt;&amp;"
        );
    }

    #[test]
    fn test_escape_url_round_trips_through_decode() {
        let url = "https://a.example/?x=1&y=2";
        assert_eq!(escape_url(url), "https://a.example/?x=1&#038;y=2");
        assert_eq!(decode_entities(&escape_url(url)), url);
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<b>42</b>"), "42");
        assert_eq!(strip_tags("abc<script>x"), "abcx");
        assert_eq!(strip_tags("no tags"), "no tags");
    }

    #[test]
    fn test_neutralize_comment() {
        assert_eq!(neutralize_comment("a --> b"), "a --&gt; b");
    }
}
