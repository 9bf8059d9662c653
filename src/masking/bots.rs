//! 爬虫识别
//!
//! 按固定顺序匹配 User-Agent 签名，第一个命中即返回。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// 可识别的爬虫
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Bot {
    Aol,
    Bingbot,
    Googlebot,
    Ask,
    Yahoo,
    Baiduspider,
    Duckduckbot,
    Yandexbot,
}

/// (爬虫, 签名)，顺序即优先级
const SIGNATURES: &[(Bot, &str)] = &[
    (
        Bot::Aol,
        r"compatible;\sMSIE(?:[a-z\-]+)?\s(?:\d\.\d);\sAOL\s(?:\d\.\d);\sAOLBuild",
    ),
    (
        Bot::Bingbot,
        r"compatible;\sBingbot(?:[a-z\-]+)?.*/(?:\d\.\d);[\s\+]+http://www\.bing\.com/bingbot\.htm\)",
    ),
    (
        Bot::Bingbot,
        r"msnbot/(?:\d\.\d)(?:[a-z]?)[\s\+]+\(\+http://search\.msn\.com/msnbot\.htm\)",
    ),
    (
        Bot::Googlebot,
        r"compatible;\sGooglebot(?:[a-z\-]+)?.*/(?:\d\.\d);[\s\+]+http://www\.google\.com/bot\.html\)",
    ),
    (Bot::Ask, r"compatible;\sAsk Jeeves/Teoma"),
    (
        Bot::Yahoo,
        r"compatible;\sYahoo!(?:[a-z\-]+)?.*;[\s\+]+http://help\.yahoo\.com/",
    ),
    (
        Bot::Baiduspider,
        r"compatible;\sBaiduspider(?:[a-z\-]+)?.*/(?:\d\.\d);[\s\+]+http://www\.baidu\.com/search/spider\.html\)",
    ),
    (
        Bot::Baiduspider,
        r"Baiduspider[\+]+\(\+http://www\.baidu\.com/search",
    ),
    (
        Bot::Duckduckbot,
        r"DuckDuckBot(?:[a-z\-]+)?.*/(?:\d\.\d);[\s]+\(\+http://duckduckgo\.com/duckduckbot\.html\)",
    ),
    (
        Bot::Yandexbot,
        r"compatible;\sYandexBot(?:[a-z\-]+)?.*/(?:\d\.\d);[\s\+]+http://yandex\.com/bots\)",
    ),
];

static SIGNATURE_TABLE: Lazy<Vec<(Bot, Regex)>> = Lazy::new(|| {
    SIGNATURES
        .iter()
        .filter_map(|(bot, pattern)| Regex::new(pattern).ok().map(|re| (*bot, re)))
        .collect()
});

/// 识别 User-Agent 对应的爬虫，未识别视为普通访客
pub fn identify(user_agent: &str) -> Option<Bot> {
    if user_agent.is_empty() {
        return None;
    }

    SIGNATURE_TABLE
        .iter()
        .find(|(_, re)| re.is_match(user_agent))
        .map(|(bot, _)| *bot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_signatures_compile() {
        assert_eq!(SIGNATURE_TABLE.len(), SIGNATURES.len());
    }

    #[test]
    fn test_identify_known_crawlers() {
        let cases = [
            (
                "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
                Bot::Googlebot,
            ),
            (
                "Mozilla/5.0 (compatible; Bingbot/2.0; +http://www.bing.com/bingbot.htm)",
                Bot::Bingbot,
            ),
            (
                "msnbot/2.0b (+http://search.msn.com/msnbot.htm)",
                Bot::Bingbot,
            ),
            (
                "Mozilla/5.0 (compatible; YandexBot/3.0; +http://yandex.com/bots)",
                Bot::Yandexbot,
            ),
            (
                "Mozilla/5.0 (compatible; Baiduspider/2.0; +http://www.baidu.com/search/spider.html)",
                Bot::Baiduspider,
            ),
            (
                "Baiduspider+(+http://www.baidu.com/search/spider.htm)",
                Bot::Baiduspider,
            ),
            (
                "DuckDuckBot/1.1; (+http://duckduckgo.com/duckduckbot.html)",
                Bot::Duckduckbot,
            ),
            (
                "Mozilla/5.0 (compatible; Yahoo! Slurp; http://help.yahoo.com/help/us/ysearch/slurp)",
                Bot::Yahoo,
            ),
            ("Mozilla/2.0 (compatible; Ask Jeeves/Teoma)", Bot::Ask),
        ];

        for (ua, expected) in cases {
            assert_eq!(identify(ua), Some(expected), "ua: {}", ua);
        }
    }

    #[test]
    fn test_bingbot_signature_is_case_sensitive() {
        // 签名区分大小写，小写 `bingbot` 不命中
        assert_eq!(
            identify("Mozilla/5.0 (compatible; bingbot/2.0; +http://www.bing.com/bingbot.htm)"),
            None
        );
    }

    #[test]
    fn test_browsers_are_not_bots() {
        assert_eq!(
            identify("Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0"),
            None
        );
        assert_eq!(identify(""), None);
    }

    #[test]
    fn test_bot_parse_lowercase() {
        assert_eq!("googlebot".parse::<Bot>().ok(), Some(Bot::Googlebot));
        assert_eq!("YandexBot".parse::<Bot>().ok(), Some(Bot::Yandexbot));
        assert_eq!(Bot::Duckduckbot.as_ref(), "duckduckbot");
    }
}
