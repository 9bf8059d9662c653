//! adf.ly / bit.ly / shorte.st / YOURLS 的 HTTP 实现

use async_trait::async_trait;
use tracing::{debug, warn};

use super::ShortenerProvider;
use crate::config::{Shortener, ShortenerConfig};
use crate::errors::{LinkMaskerError, Result};
use crate::services::http::get_agent;

const ADFLY_API_URL: &str = "https://api.adf.ly/v1/shorten";
const BITLY_API_URL: &str = "https://api-ssl.bitly.com/v3/shorten";
const SHORTEST_API_URL: &str = "https://api.shorte.st/s";

/// 基于 ureq 的短链客户端
pub struct HttpShortener {
    config: ShortenerConfig,
}

impl HttpShortener {
    pub fn new(config: ShortenerConfig) -> Self {
        Self { config }
    }

    /// 发起请求并返回响应正文（同步，在 spawn_blocking 中调用）
    fn request_sync(config: &ShortenerConfig, url: &str, long_url: &str) -> Result<String> {
        let agent = get_agent();
        let transport = |e: ureq::Error| {
            LinkMaskerError::shortener(format!("{} request failed: {}", config.provider, e))
        };

        let resp = match config.provider {
            Shortener::Adfly => {
                let advert_type = config.adfly_advert_type.to_string();
                agent
                    .post(ADFLY_API_URL)
                    .send_form([
                        ("domain", config.adfly_domain.as_str()),
                        ("advert_type", advert_type.as_str()),
                        ("url", url),
                        ("_api_key", config.adfly_api_key.as_str()),
                        ("_user_id", config.adfly_user_id.as_str()),
                    ])
                    .map_err(transport)?
            }
            Shortener::Bitly => {
                let api_url = format!(
                    "{}?login={}&apiKey={}&longUrl={}",
                    BITLY_API_URL,
                    urlencoding::encode(&config.bitly_login),
                    urlencoding::encode(&config.bitly_api_key),
                    long_url
                );
                agent.get(&api_url).call().map_err(transport)?
            }
            Shortener::Shortest => {
                let api_url = format!(
                    "{}/{}/{}",
                    SHORTEST_API_URL, config.shortest_api_key, long_url
                );
                agent.get(&api_url).call().map_err(transport)?
            }
            Shortener::Yourls => {
                let host = format!("https://{}/yourls-api.php", config.yourls_domain);
                agent
                    .get(&host)
                    .query("action", "shorturl")
                    .query("format", "json")
                    .query("signature", &config.yourls_signature)
                    .query("url", url)
                    .call()
                    .map_err(transport)?
            }
            Shortener::None => {
                return Err(LinkMaskerError::shortener("No shortener configured"));
            }
        };

        resp.into_body()
            .read_to_string()
            .map_err(|e| LinkMaskerError::shortener(format!("Reading response failed: {}", e)))
    }
}

/// 从服务响应中取出短链
///
/// YOURLS 返回空正文时沿用转义后的原链接。
pub(crate) fn parse_response(kind: Shortener, body: &str, long_url: &str) -> Result<String> {
    if body.trim().is_empty() {
        return match kind {
            Shortener::Yourls => Ok(long_url.to_string()),
            _ => Err(LinkMaskerError::shortener(format!(
                "{} returned an empty body",
                kind
            ))),
        };
    }

    let json: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| LinkMaskerError::shortener(format!("{} returned invalid JSON: {}", kind, e)))?;

    let short = match kind {
        Shortener::Adfly => json["data"][0]["short_url"].as_str(),
        Shortener::Bitly => json["data"]["url"].as_str(),
        Shortener::Shortest => json["shortenedUrl"].as_str(),
        Shortener::Yourls => json["shorturl"].as_str(),
        Shortener::None => None,
    };

    short
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| LinkMaskerError::shortener(format!("{} response has no short url", kind)))
}

#[async_trait]
impl ShortenerProvider for HttpShortener {
    async fn shorten(&self, url: &str) -> Result<String> {
        let config = self.config.clone();
        let url = url.to_string();
        let long_url = urlencoding::encode(&url).into_owned();
        let kind = config.provider;

        let body = tokio::task::spawn_blocking({
            let long_url = long_url.clone();
            move || Self::request_sync(&config, &url, &long_url)
        })
        .await
        .unwrap_or_else(|e| {
            warn!("Shortener spawn_blocking failed: {}", e);
            Err(LinkMaskerError::shortener(format!(
                "spawn_blocking failed: {}",
                e
            )))
        })?;

        let short = parse_response(kind, &body, &long_url)?;
        debug!("{} shortened {} -> {}", kind, long_url, short);
        Ok(short)
    }

    fn kind(&self) -> Shortener {
        self.config.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_adfly() {
        let body = r#"{"data":[{"short_url":"https://adf.ly/1a2b"}],"errors":[]}"#;
        assert_eq!(
            parse_response(Shortener::Adfly, body, "x").unwrap(),
            "https://adf.ly/1a2b"
        );
    }

    #[test]
    fn test_parse_bitly() {
        let body = r#"{"status_code":200,"data":{"url":"https://bit.ly/abc","hash":"abc"}}"#;
        assert_eq!(
            parse_response(Shortener::Bitly, body, "x").unwrap(),
            "https://bit.ly/abc"
        );
    }

    #[test]
    fn test_parse_shortest() {
        let body = r#"{"status":"ok","shortenedUrl":"http://sh.st/xyz"}"#;
        assert_eq!(
            parse_response(Shortener::Shortest, body, "x").unwrap(),
            "http://sh.st/xyz"
        );
    }

    #[test]
    fn test_parse_yourls_empty_body_falls_back() {
        assert_eq!(
            parse_response(Shortener::Yourls, "", "https%3A%2F%2Fa.example").unwrap(),
            "https%3A%2F%2Fa.example"
        );
        let body = r#"{"shorturl":"https://s.example/1"}"#;
        assert_eq!(
            parse_response(Shortener::Yourls, body, "x").unwrap(),
            "https://s.example/1"
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_response(Shortener::Bitly, "", "x").is_err());
        assert!(parse_response(Shortener::Bitly, "not json", "x").is_err());
        assert!(parse_response(Shortener::Bitly, r#"{"data":{}}"#, "x").is_err());
    }
}
