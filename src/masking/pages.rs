//! 跳转相关的 HTML 页面

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

use super::html::escape_url;

/// 自定义落地页中的占位符（可带协议前缀）
static LINKURL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(https?://)?%linkurl%").expect("LINKURL_RE regex is valid")
});

const PAGE_HEAD: &str = r#"<meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, user-scalable=no, initial-scale=1.0, maximum-scale=1.0, minimum-scale=1.0">
    <meta http-equiv="X-UA-Compatible" content="ie=edge">
    <meta name="robots" content="noindex,nofollow"/>"#;

/// 可疑来源提示页，5 秒后回到首页
pub fn referrer_warning_page(home: &str) -> String {
    let home = escape_url(home);
    format!(
        r#"<!doctype html>
<html>
<head>
    <title>Redirecting...</title>
    {head}
    <meta http-equiv="refresh" content="5; url={home}"/>
</head>
<body style="margin:0;">
    <div align="center" style="margin-top: 15em;">
        You have been redirected through this website from a suspicious source. We prevented it and you are going to be redirected to our <a href="{home}">safe web site.</a>
    </div>
</body>
</html>
"#,
        head = PAGE_HEAD,
        home = home
    )
}

/// 内置跳转页：倒计时脚本 + meta refresh + 手动链接
pub fn redirect_page(url: &str, redirect_time: u32, redirect_message: &str) -> String {
    let escaped = escape_url(url);
    // 脚本中使用 JSON 字符串字面量
    let js_url = serde_json::to_string(url)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/");

    let message = if redirect_message.trim().is_empty() {
        format!(
            r#"You were going to the redirect link, but something did not work properly.<br>Please, click <a href="{url}">HERE</a> to go to {url} manually."#,
            url = escaped
        )
    } else {
        redirect_message.replace("%linkurl%", &escaped)
    };

    format!(
        r#"<!doctype html>
<html>
<head>
    {head}
    <meta http-equiv="refresh" content="{time}; url={url}"/>
    <title>Redirecting...</title>
</head>
<body style="margin:0;">
    <div align="center" style="margin-top: 15em;">
        {message}
        <p id="linkmasker-countdown">{time}</p>
    </div>
    <script>
        (function () {{
            var left = {time};
            var el = document.getElementById("linkmasker-countdown");
            var timer = setInterval(function () {{
                left -= 1;
                if (el) {{ el.textContent = Math.max(left, 0); }}
                if (left <= 0) {{
                    clearInterval(timer);
                    window.location.href = {js_url};
                }}
            }}, 1000);
        }})();
    </script>
</body>
</html>
"#,
        head = PAGE_HEAD,
        time = redirect_time,
        url = escaped,
        js_url = js_url,
        message = message
    )
}

/// 无法解析目标时的页面
pub fn no_destination_page() -> String {
    format!(
        r#"<!doctype html>
<html>
<head>
    {head}
    <title>Redirecting...</title>
</head>
<body style="margin:0;">
    <div align="center" style="margin-top: 15em;">
        Sorry, no url redirect specified. Can't complete request.
    </div>
</body>
</html>
"#,
        head = PAGE_HEAD
    )
}

/// 在自定义落地页正文中填入目标地址
pub fn fill_landing_page(body: &str, url: &str) -> String {
    let escaped = escape_url(url);
    LINKURL_RE
        .replace_all(body, NoExpand(escaped.as_str()))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referrer_warning_points_home() {
        let page = referrer_warning_page("https://mysite.example");
        assert!(page.contains(r#"content="5; url=https://mysite.example""#));
        assert!(page.contains("suspicious source"));
    }

    #[test]
    fn test_redirect_page_uses_message_template() {
        let page = redirect_page(
            "https://ext.example/?a=1&b=2",
            3,
            r#"Go <a href="%linkurl%">here</a>"#,
        );
        assert!(page.contains(r#"Go <a href="https://ext.example/?a=1&#038;b=2">here</a>"#));
        assert!(page.contains(r#"content="3; url=https://ext.example/?a=1&#038;b=2""#));
        assert!(page.contains("var left = 3;"));
        assert!(page.contains(r#"window.location.href = "https://ext.example/?a=1&b=2";"#));
    }

    #[test]
    fn test_redirect_page_fallback_message() {
        let page = redirect_page("https://ext.example/", 0, "");
        assert!(page.contains("something did not work properly"));
        assert!(page.contains(r#"<a href="https://ext.example/">HERE</a>"#));
    }

    #[test]
    fn test_fill_landing_page() {
        let body = "Leaving to https://%LinkUrl% or %linkurl% now";
        assert_eq!(
            fill_landing_page(body, "https://ext.example/$1"),
            "Leaving to https://ext.example/$1 or https://ext.example/$1 now"
        );
    }
}
