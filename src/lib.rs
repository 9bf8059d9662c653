//! linkmasker - outbound link masking engine
//!
//! Rewrites external `<a>` links in rendered HTML so they point at the site's
//! own redirect endpoint (`{site}/{marker}/{token}`), then serves those
//! redirects with optional click logging.
//!
//! # Features
//! - **aes256**: AES-256-CBC link encryption (default)
//!
//! # Architecture
//! - `masking`: link policy, scanner, encoders, redirect dispatcher
//! - `services`: mask store, click log, URL shortener providers
//! - `storage`: sea-orm backends (SQLite / MySQL / PostgreSQL)
//! - `api`: HTTP services and middleware
//! - `config`: configuration loading and the immutable `MaskingConfig`
//! - `runtime`: startup, HTTP server, shutdown
//! - `system`: logging

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod masking;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
