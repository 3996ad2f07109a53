use std::{fmt, time};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
/// Timestamp consisting of a seconds and a microseconds component
///
/// Drivers usually stamp buffers with `CLOCK_MONOTONIC`, so this is not wall clock time.
pub struct Timestamp {
    pub sec: i64,
    pub usec: i64,
}

impl Timestamp {
    /// Returns a timestamp representation
    ///
    /// # Example
    ///
    /// ```
    /// use webcam::Timestamp;
    /// let ts = Timestamp::new(5, 5);
    /// ```
    pub fn new(sec: i64, usec: i64) -> Self {
        Timestamp { sec, usec }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let floating: f64 = self.sec as f64 + self.usec as f64 / 1_000_000.0;
        write!(f, "{} [s]", floating)
    }
}

impl From<libc::timeval> for Timestamp {
    fn from(tv: libc::timeval) -> Self {
        Timestamp {
            sec: tv.tv_sec as i64,
            usec: tv.tv_usec as i64,
        }
    }
}

impl From<Timestamp> for time::Duration {
    fn from(ts: Timestamp) -> Self {
        time::Duration::from_secs(ts.sec.max(0) as u64)
            + time::Duration::from_micros(ts.usec.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_duration() {
        let ts = Timestamp::new(3, 250_000);
        assert_eq!(time::Duration::from(ts), time::Duration::from_millis(3250));
        assert_eq!(ts.to_string(), "3.25 [s]");
    }

    #[test]
    fn from_timeval() {
        let tv = libc::timeval {
            tv_sec: 12,
            tv_usec: 34,
        };
        assert_eq!(Timestamp::from(tv), Timestamp::new(12, 34));
    }
}
