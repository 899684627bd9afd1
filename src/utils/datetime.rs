use chrono::{DateTime, Utc};

/// 轮次截止时间展示格式，例如 "Mar. 7, 2026, 3:07 PM"（日与小时不补零）
pub fn format_deadline(deadline: DateTime<Utc>) -> String {
    deadline.format("%b. %-d, %Y, %-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_deadline_strips_leading_zeros() {
        let t = Utc.with_ymd_and_hms(2026, 3, 7, 15, 7, 0).unwrap();
        assert_eq!(format_deadline(t), "Mar. 7, 2026, 3:07 PM");

        let t = Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap();
        assert_eq!(format_deadline(t), "Oct. 19, 2026, 9:30 AM");
    }
}
