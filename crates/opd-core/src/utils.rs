//! 通用工具函数

use chrono::{DateTime, Local, LocalResult, NaiveTime, TimeZone, Utc};

/// 当日起点（本地午夜），用于界定"今日队列"
pub fn start_of_today() -> DateTime<Utc> {
    start_of_day(Local::now())
}

/// 给定时刻所在日的本地午夜，换算为UTC
pub fn start_of_day(now: DateTime<Local>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // 个别时区的午夜可能因夏令时不存在，按UTC解释
        LocalResult::None => Utc.from_utc_datetime(&midnight),
    }
}
