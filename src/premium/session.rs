//! Shanghai Gold Exchange day session
//!
//! Day trading runs 09:00-11:30 and 13:30-15:30 Beijing time (UTC+8).

use chrono::{DateTime, FixedOffset, NaiveTime, Utc};

const BEIJING_OFFSET_SECS: i32 = 8 * 3600;

/// Wall-clock time in Beijing for a UTC instant
pub fn beijing_time(now: DateTime<Utc>) -> NaiveTime {
    match FixedOffset::east_opt(BEIJING_OFFSET_SECS) {
        Some(offset) => now.with_timezone(&offset).time(),
        None => now.time(),
    }
}

/// Whether the SGE day session is open at `now`
pub fn sge_session_open(now: DateTime<Utc>) -> bool {
    let t = beijing_time(now);
    let hm = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN);

    (t >= hm(9, 0) && t < hm(11, 30)) || (t >= hm(13, 30) && t < hm(15, 30))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    #[test]
    fn test_beijing_time() {
        assert_eq!(beijing_time(utc(1, 15)), NaiveTime::from_hms_opt(9, 15, 0).unwrap());
        assert_eq!(beijing_time(utc(20, 0)), NaiveTime::from_hms_opt(4, 0, 0).unwrap());
    }

    #[test]
    fn test_morning_session() {
        assert!(!sge_session_open(utc(0, 59))); // 08:59
        assert!(sge_session_open(utc(1, 0))); // 09:00
        assert!(sge_session_open(utc(3, 29))); // 11:29
        assert!(!sge_session_open(utc(3, 30))); // 11:30
    }

    #[test]
    fn test_lunch_break() {
        assert!(!sge_session_open(utc(4, 0))); // 12:00
        assert!(!sge_session_open(utc(5, 29))); // 13:29
    }

    #[test]
    fn test_afternoon_session() {
        assert!(sge_session_open(utc(5, 30))); // 13:30
        assert!(sge_session_open(utc(7, 29))); // 15:29
        assert!(!sge_session_open(utc(7, 30))); // 15:30
    }

    #[test]
    fn test_overnight_closed() {
        assert!(!sge_session_open(utc(14, 0))); // 22:00
    }
}
