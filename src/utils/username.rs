use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::OnceLock;

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.\-]{3,30}$").expect("static regex"))
}

/// 验证用户名格式
pub fn validate_username(username: &str) -> AppResult<()> {
    if !username_regex().is_match(username) {
        return Err(AppError::ValidationError(
            "Username must be 3-30 characters of letters, digits, '_', '.' or '-'".to_string(),
        ));
    }
    Ok(())
}

/// 去掉首尾空白
pub fn normalize_username(username: &str) -> String {
    username.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("user").is_ok());
        assert!(validate_username("raffle.fan_01").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(31)).is_err());
    }

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username("  user \n"), "user");
    }
}
