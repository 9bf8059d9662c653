use std::fmt;

#[derive(Debug, Clone)]
pub enum LinkMaskerError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    SchemaMissing(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Serialization(String),
    Decode(String),
    Cipher(String),
    Shortener(String),
    Http(String),
}

impl LinkMaskerError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            LinkMaskerError::DatabaseConfig(_) => "E001",
            LinkMaskerError::DatabaseConnection(_) => "E002",
            LinkMaskerError::DatabaseOperation(_) => "E003",
            LinkMaskerError::SchemaMissing(_) => "E004",
            LinkMaskerError::FileOperation(_) => "E005",
            LinkMaskerError::Validation(_) => "E006",
            LinkMaskerError::NotFound(_) => "E007",
            LinkMaskerError::Serialization(_) => "E008",
            LinkMaskerError::Decode(_) => "E009",
            LinkMaskerError::Cipher(_) => "E010",
            LinkMaskerError::Shortener(_) => "E011",
            LinkMaskerError::Http(_) => "E012",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            LinkMaskerError::DatabaseConfig(_) => "Database Configuration Error",
            LinkMaskerError::DatabaseConnection(_) => "Database Connection Error",
            LinkMaskerError::DatabaseOperation(_) => "Database Operation Error",
            LinkMaskerError::SchemaMissing(_) => "Missing Table",
            LinkMaskerError::FileOperation(_) => "File Operation Error",
            LinkMaskerError::Validation(_) => "Validation Error",
            LinkMaskerError::NotFound(_) => "Resource Not Found",
            LinkMaskerError::Serialization(_) => "Serialization Error",
            LinkMaskerError::Decode(_) => "Link Decode Error",
            LinkMaskerError::Cipher(_) => "Cipher Error",
            LinkMaskerError::Shortener(_) => "Shortener Provider Error",
            LinkMaskerError::Http(_) => "Outbound HTTP Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            LinkMaskerError::DatabaseConfig(msg) => msg,
            LinkMaskerError::DatabaseConnection(msg) => msg,
            LinkMaskerError::DatabaseOperation(msg) => msg,
            LinkMaskerError::SchemaMissing(msg) => msg,
            LinkMaskerError::FileOperation(msg) => msg,
            LinkMaskerError::Validation(msg) => msg,
            LinkMaskerError::NotFound(msg) => msg,
            LinkMaskerError::Serialization(msg) => msg,
            LinkMaskerError::Decode(msg) => msg,
            LinkMaskerError::Cipher(msg) => msg,
            LinkMaskerError::Shortener(msg) => msg,
            LinkMaskerError::Http(msg) => msg,
        }
    }

    /// 映射到 HTTP 状态码（Admin API 使用）
    pub fn http_status(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            LinkMaskerError::Validation(_) | LinkMaskerError::Decode(_) => StatusCode::BAD_REQUEST,
            LinkMaskerError::NotFound(_) => StatusCode::NOT_FOUND,
            LinkMaskerError::Shortener(_) | LinkMaskerError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for LinkMaskerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for LinkMaskerError {}

// 便捷的构造函数
impl LinkMaskerError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        LinkMaskerError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        LinkMaskerError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        LinkMaskerError::DatabaseOperation(msg.into())
    }

    pub fn schema_missing<T: Into<String>>(msg: T) -> Self {
        LinkMaskerError::SchemaMissing(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        LinkMaskerError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        LinkMaskerError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        LinkMaskerError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        LinkMaskerError::Serialization(msg.into())
    }

    pub fn decode<T: Into<String>>(msg: T) -> Self {
        LinkMaskerError::Decode(msg.into())
    }

    pub fn cipher<T: Into<String>>(msg: T) -> Self {
        LinkMaskerError::Cipher(msg.into())
    }

    pub fn shortener<T: Into<String>>(msg: T) -> Self {
        LinkMaskerError::Shortener(msg.into())
    }

    pub fn http<T: Into<String>>(msg: T) -> Self {
        LinkMaskerError::Http(msg.into())
    }

    /// 是否是"表不存在"类错误（触发自愈建表）
    pub fn is_schema_missing(&self) -> bool {
        match self {
            LinkMaskerError::SchemaMissing(_) => true,
            LinkMaskerError::DatabaseOperation(msg) => is_missing_table_message(msg),
            _ => false,
        }
    }
}

/// 各数据库"表不存在"的错误消息特征
fn is_missing_table_message(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    lower.contains("no such table")
        || lower.contains("doesn't exist")
        || (lower.contains("relation") && lower.contains("does not exist"))
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for LinkMaskerError {
    fn from(err: sea_orm::DbErr) -> Self {
        let msg = err.to_string();
        if is_missing_table_message(&msg) {
            LinkMaskerError::SchemaMissing(msg)
        } else {
            LinkMaskerError::DatabaseOperation(msg)
        }
    }
}

impl From<std::io::Error> for LinkMaskerError {
    fn from(err: std::io::Error) -> Self {
        LinkMaskerError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for LinkMaskerError {
    fn from(err: serde_json::Error) -> Self {
        LinkMaskerError::Serialization(err.to_string())
    }
}

impl From<base64::DecodeError> for LinkMaskerError {
    fn from(err: base64::DecodeError) -> Self {
        LinkMaskerError::Decode(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for LinkMaskerError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        LinkMaskerError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LinkMaskerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_table_detection() {
        let sqlite = LinkMaskerError::database_operation(
            "Execution Error: error returned from database: (code: 1) no such table: external_links_logs",
        );
        assert!(sqlite.is_schema_missing());

        let mysql = LinkMaskerError::database_operation(
            "Table 'wp.external_links_masks' doesn't exist",
        );
        assert!(mysql.is_schema_missing());

        let pg = LinkMaskerError::database_operation(
            "relation \"external_links_logs\" does not exist",
        );
        assert!(pg.is_schema_missing());

        let other = LinkMaskerError::database_operation("database is locked");
        assert!(!other.is_schema_missing());
    }

    #[test]
    fn test_codes_and_status() {
        let err = LinkMaskerError::not_found("mask 42");
        assert_eq!(err.code(), "E007");
        assert_eq!(err.http_status(), actix_web::http::StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Resource Not Found: mask 42");
    }
}
