//! Datagram timestamps.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// A datagram timestamp.
///
/// The date is encoded as `year * 10000 + month * 100 + day` (so Feb 26,
/// 1995 is `19950226`) and the time of day as milliseconds since midnight.
/// All time matching between datagrams compares the pair directly; the
/// conversion to absolute seconds is only needed for interpolation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    /// Calendar date as `year * 10000 + month * 100 + day`.
    pub date: u32,
    /// Milliseconds since midnight.
    pub msec: u32,
}

impl Timestamp {
    /// Creates a timestamp from the encoded date and milliseconds.
    ///
    /// # Examples
    ///
    /// ```
    /// use swath::Timestamp;
    /// let timestamp = Timestamp::new(19950226, 29570234);
    /// assert_eq!(1995, timestamp.year());
    /// assert_eq!(2, timestamp.month());
    /// assert_eq!(26, timestamp.day());
    /// ```
    pub fn new(date: u32, msec: u32) -> Timestamp {
        Timestamp { date, msec }
    }

    /// The calendar year.
    pub fn year(&self) -> u32 {
        self.date / 10000
    }

    /// The calendar month, 1 through 12.
    pub fn month(&self) -> u32 {
        self.date / 100 % 100
    }

    /// The day of the month.
    pub fn day(&self) -> u32 {
        self.date % 100
    }

    /// Converts to a calendar date and time.
    ///
    /// Returns `None` for nonsense dates (e.g. month 13), which do occur in
    /// corrupt streams.
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(self.year() as i32, self.month(), self.day())?;
        let time = NaiveTime::from_num_seconds_from_midnight_opt(
            self.msec / 1000,
            self.msec % 1000 * 1_000_000,
        )?;
        Some(date.and_time(time))
    }

    /// Builds a timestamp from a calendar date and time, truncating to
    /// millisecond precision.
    pub fn from_datetime(datetime: NaiveDateTime) -> Timestamp {
        use chrono::Datelike;
        let date = datetime.year() as u32 * 10000 + datetime.month() * 100 + datetime.day();
        let msec = datetime.num_seconds_from_midnight() * 1000 + datetime.nanosecond() / 1_000_000;
        Timestamp { date, msec }
    }

    /// Absolute time as seconds since the Unix epoch.
    ///
    /// Nonsense dates collapse to zero, which keeps interpolation queries
    /// harmless against corrupt records.
    pub fn seconds(&self) -> f64 {
        match self.to_datetime() {
            Some(datetime) => {
                datetime.and_utc().timestamp() as f64 + f64::from(self.msec % 1000) / 1000.0
            }
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields() {
        let timestamp = Timestamp::new(20080505, 3_600_000);
        assert_eq!(2008, timestamp.year());
        assert_eq!(5, timestamp.month());
        assert_eq!(5, timestamp.day());
    }

    #[test]
    fn datetime_round_trip() {
        let timestamp = Timestamp::new(19950226, 29570234);
        let datetime = timestamp.to_datetime().unwrap();
        assert_eq!(timestamp, Timestamp::from_datetime(datetime));
    }

    #[test]
    fn chronological_ordering() {
        assert!(Timestamp::new(19950226, 100) < Timestamp::new(19950226, 200));
        assert!(Timestamp::new(19950226, 100) < Timestamp::new(19950301, 0));
    }

    #[test]
    fn bad_date_is_not_fatal() {
        let timestamp = Timestamp::new(19951399, 0);
        assert_eq!(None, timestamp.to_datetime());
        assert_eq!(0.0, timestamp.seconds());
    }

    #[test]
    fn seconds_carry_milliseconds() {
        let a = Timestamp::new(20080505, 1000);
        let b = Timestamp::new(20080505, 1250);
        let delta = b.seconds() - a.seconds();
        assert!((delta - 0.25).abs() < 1e-9);
    }
}
