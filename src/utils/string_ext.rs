//! 字符串扩展工具模块
//!
//! 提供过滤条件清理、报告文本截断等字符串辅助函数

/// 清理并验证字符串，返回 Option<String>
///
/// 用于处理可选的过滤条件（数据库名、用户名、SQL 模式），去除空白并过滤空字符串
///
/// # Example
/// ```ignore
/// let database = clean_optional_string(args.database.as_ref());
/// ```
#[inline]
pub fn clean_optional_string(s: Option<&String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// 按字符数截断字符串，超出部分以 "..." 结尾
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

/// 字符串清理扩展 trait
pub trait StringExt {
    /// 清理字符串并返回 Option，空字符串返回 None
    fn clean(&self) -> Option<String>;
}

impl StringExt for str {
    #[inline]
    fn clean(&self) -> Option<String> {
        let trimmed = self.trim();
        if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
    }
}

impl<T: AsRef<str>> StringExt for Option<T> {
    #[inline]
    fn clean(&self) -> Option<String> {
        self.as_ref().and_then(|s| s.as_ref().clean())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_optional_string() {
        assert_eq!(clean_optional_string(Some(&"  sales ".to_string())), Some("sales".into()));
        assert_eq!(clean_optional_string(Some(&"   ".to_string())), None);
        assert_eq!(clean_optional_string(None), None);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("SELECT 1", 20), "SELECT 1");
        assert_eq!(truncate_chars("SELECT * FROM t", 6), "SELECT...");
    }

    #[test]
    fn test_option_clean() {
        let none: Option<&str> = None;
        assert_eq!(none.clean(), None);
        assert_eq!(Some(" x ").clean(), Some("x".to_string()));
    }
}
