//! 调试记录
//!
//! 开启 `debug_mode` 时按渲染收集诊断信息，最终作为一条 HTML 注释追加到输出。

use tracing::debug;

use super::html::neutralize_comment;

#[derive(Debug, Default)]
pub struct DebugLog {
    enabled: bool,
    entries: Vec<String>,
}

impl DebugLog {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 记录一条诊断信息（关闭时不分配）
    pub fn note<F>(&mut self, f: F)
    where
        F: FnOnce() -> String,
    {
        if self.enabled {
            let entry = f();
            debug!(target: "linkmasker::debug", "{}", entry);
            self.entries.push(entry);
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// 渲染为 HTML 注释，无记录时为空串
    pub fn render(&self) -> String {
        if !self.enabled || self.entries.is_empty() {
            return String::new();
        }
        format!(
            "\n<!--linkmasker debug:\n{}\n-->",
            neutralize_comment(&self.entries.join("\n\n"))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_log_is_silent() {
        let mut log = DebugLog::new(false);
        log.note(|| "ignored".to_string());
        assert!(log.entries().is_empty());
        assert_eq!(log.render(), "");
    }

    #[test]
    fn test_render_neutralizes_comment_end() {
        let mut log = DebugLog::new(true);
        log.note(|| "first".to_string());
        log.note(|| "<!-- nested -->".to_string());

        let out = log.render();
        assert!(out.starts_with("\n<!--linkmasker debug:\nfirst\n\n"));
        assert!(out.contains("<!-- nested --&gt;"));
        assert!(out.ends_with("\n-->"));
    }
}
