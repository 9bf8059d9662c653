//! 配置中使用的封闭枚举
//!
//! 所有枚举同时支持 serde（TOML / 环境变量）与 `FromStr`（CLI / API 参数），
//! 解析大小写不敏感。

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// 跳转方式
///
/// `301` / `302` / `307` 直接返回 `Location`，`javascript` 渲染倒计时页面，
/// `no` 表示不生成跳转链接（仍可启用短链或 SEO 隐藏）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum MaskingType {
    #[strum(serialize = "no")]
    No,
    #[strum(serialize = "301")]
    Permanent,
    #[default]
    #[strum(serialize = "302")]
    Found,
    #[strum(serialize = "307")]
    Temporary,
    #[strum(serialize = "javascript")]
    Javascript,
}

impl MaskingType {
    /// 对应的 HTTP 状态码（仅 Location 跳转）
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Permanent => Some(301),
            Self::Found => Some(302),
            Self::Temporary => Some(307),
            Self::No | Self::Javascript => None,
        }
    }
}

// 环境变量 `LM__MASKING__MASKING_TYPE=301` 经 try_parsing 后是整数，
// 这里同时接受字符串与整数
impl<'de> Deserialize<'de> for MaskingType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Str(String),
        }

        let raw = Raw::deserialize(deserializer)?;
        let text = match raw {
            Raw::Int(n) => n.to_string(),
            Raw::Str(s) => s,
        };
        text.trim().parse().map_err(|_| {
            serde::de::Error::custom(format!(
                "Invalid masking_type: '{}'. Valid: no, 301, 302, 307, javascript",
                text
            ))
        })
    }
}

impl Serialize for MaskingType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_ref())
    }
}

/// 链接编码策略
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LinkEncoding {
    #[default]
    None,
    Base64,
    Numbers,
    Aes256,
}

/// 第三方短链服务
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Shortener {
    #[default]
    None,
    Adfly,
    Bitly,
    Shortest,
    Yourls,
}

impl Shortener {
    /// 写入 `short_url` 列的标签（`None` 为空串）
    pub fn tag(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Adfly => "adfly",
            Self::Bitly => "bitly",
            Self::Shortest => "shortest",
            Self::Yourls => "yourls",
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// 通用的 `all | specific` 开关
///
/// 用于 `mask_links`、`bot_targeting` 与 `seo_hide_mode`。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Targeting {
    #[default]
    All,
    Specific,
}

/// 单篇内容的覆盖设置
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PostMaskOverride {
    #[default]
    Default,
    Disabled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_masking_type_parse() {
        assert_eq!(MaskingType::from_str("301").unwrap(), MaskingType::Permanent);
        assert_eq!(
            MaskingType::from_str("JavaScript").unwrap(),
            MaskingType::Javascript
        );
        assert!(MaskingType::from_str("308").is_err());
        assert_eq!(MaskingType::Temporary.status_code(), Some(307));
        assert_eq!(MaskingType::No.status_code(), None);
    }

    #[test]
    fn test_masking_type_accepts_integer() {
        let v: MaskingType = serde_json::from_str("307").unwrap();
        assert_eq!(v, MaskingType::Temporary);
        let v: MaskingType = serde_json::from_str("\"no\"").unwrap();
        assert_eq!(v, MaskingType::No);
        assert_eq!(serde_json::to_string(&MaskingType::Found).unwrap(), "\"302\"");
    }

    #[test]
    fn test_shortener_tags() {
        assert_eq!(Shortener::from_str("YOURLS").unwrap(), Shortener::Yourls);
        assert_eq!(Shortener::Bitly.tag(), "bitly");
        assert_eq!(Shortener::None.tag(), "");
        assert!(!Shortener::None.is_enabled());
    }

    #[test]
    fn test_link_encoding_serde() {
        let v: LinkEncoding = serde_json::from_str("\"aes256\"").unwrap();
        assert_eq!(v, LinkEncoding::Aes256);
        assert_eq!(LinkEncoding::Numbers.to_string(), "numbers");
    }
}
