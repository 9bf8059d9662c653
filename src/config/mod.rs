pub mod runtime_config;
mod structs;
pub mod types;
pub mod validators;

pub use runtime_config::{MaskingConfig, decode_encryption_key, generate_encryption_key};
pub use structs::*;
pub use types::{LinkEncoding, MaskingType, PostMaskOverride, Shortener, Targeting};
