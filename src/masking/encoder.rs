//! 链接编码 / 解码
//!
//! | 策略 | 令牌 |
//! |---|---|
//! | none | 原链接 |
//! | base64 | 标准字母表、带填充 |
//! | numbers | 遮罩表中的行 id |
//! | aes256 | `base64(密文):base64(iv)` |

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};

use super::cipher;
use crate::config::runtime_config::ENCRYPTION_KEY_LEN;
use crate::config::{LinkEncoding, MaskingConfig, Shortener};
use crate::errors::{LinkMaskerError, Result};
use crate::services::MaskStore;

#[derive(Clone)]
pub struct LinkEncoder {
    encoding: LinkEncoding,
    key: Option<[u8; ENCRYPTION_KEY_LEN]>,
    store: Option<MaskStore>,
}

impl LinkEncoder {
    /// 使用配置中实际生效的编码方式
    pub fn new(config: &MaskingConfig, store: Option<MaskStore>) -> Self {
        Self {
            encoding: config.effective_encoding,
            key: config.encryption_key,
            store,
        }
    }

    /// 指定编码方式（测试与工具使用）
    pub fn with_encoding(
        encoding: LinkEncoding,
        key: Option<[u8; ENCRYPTION_KEY_LEN]>,
        store: Option<MaskStore>,
    ) -> Self {
        Self {
            encoding,
            key,
            store,
        }
    }

    pub fn encoding(&self) -> LinkEncoding {
        self.encoding
    }

    fn store(&self) -> Result<&MaskStore> {
        self.store
            .as_ref()
            .ok_or_else(|| LinkMaskerError::database_config("numbers encoding requires a mask store"))
    }

    fn key(&self) -> Result<&[u8; ENCRYPTION_KEY_LEN]> {
        self.key
            .as_ref()
            .ok_or_else(|| LinkMaskerError::cipher("No encryption key available"))
    }

    /// 编码 URL 为令牌
    pub async fn encode(&self, url: &str) -> Result<String> {
        match self.encoding {
            LinkEncoding::None => Ok(url.to_string()),
            LinkEncoding::Base64 => Ok(STANDARD.encode(url.as_bytes())),
            LinkEncoding::Numbers => self.store()?.find_or_create(url, Shortener::None).await,
            LinkEncoding::Aes256 => cipher::encrypt(self.key()?, url),
        }
    }

    /// 解码令牌，结果为空视为失败
    pub async fn decode(&self, token: &str) -> Result<String> {
        let token = token.trim();
        if token.is_empty() {
            return Err(LinkMaskerError::decode("Empty token"));
        }

        let url = match self.encoding {
            LinkEncoding::None => token.to_string(),
            LinkEncoding::Base64 => decode_base64(token)?,
            LinkEncoding::Numbers => {
                let id = token
                    .parse::<i64>()
                    .map_err(|_| LinkMaskerError::decode(format!("Not a mask id: {}", token)))?;
                self.store()?
                    .url_for_id(id)
                    .await?
                    .ok_or_else(|| LinkMaskerError::not_found(format!("Mask {} not found", id)))?
            }
            LinkEncoding::Aes256 => cipher::decrypt(self.key()?, token)?,
        };

        if url.trim().is_empty() {
            return Err(LinkMaskerError::decode("Token decoded to an empty url"));
        }
        Ok(url)
    }
}

/// 宽松的 base64 解码：缺少填充也接受
fn decode_base64(token: &str) -> Result<String> {
    let bytes = match STANDARD.decode(token) {
        Ok(bytes) => bytes,
        Err(_) => STANDARD_NO_PAD.decode(token.trim_end_matches('='))?,
    };
    Ok(String::from_utf8(bytes)?)
}
