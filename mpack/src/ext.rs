//! Extension framing and the one extension type MessagePack itself defines: the timestamp.

use std::convert::TryFrom;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// The header of an application-defined extension: a signed type code and the payload length in bytes.
/// Negative type codes are reserved by the MessagePack specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtHeader {
    pub type_code: i8,
    pub len: u32,
}

impl ExtHeader {
    pub fn new(type_code: i8, len: u32) -> Self {
        Self { type_code, len }
    }
}

pub(crate) const NANOS_PER_SEC: u32 = 1_000_000_000;

/// A point in time as seconds and nanoseconds relative to the unix epoch. `nanoseconds` is always below
/// one billion, negative instants have negative `seconds` and a positive nanosecond part.
///
/// On wire a timestamp is extension type -1 with one of three payloads, chosen by the writer as the
/// smallest one able to hold the value:
///
/// | payload  | layout                                     | range                    |
/// |----------|--------------------------------------------|--------------------------|
/// | 4 bytes  | u32 seconds                                | 1970 to 2106, whole secs |
/// | 8 bytes  | 30 bit nanoseconds, 34 bit seconds         | 1970 to 2514             |
/// | 12 bytes | u32 nanoseconds, i64 seconds               | everything               |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp {
    seconds: i64,
    nanoseconds: u32,
}

impl Timestamp {

    /// Returns `None` if `nanoseconds` is one billion or more.
    pub fn new(seconds: i64, nanoseconds: u32) -> Option<Self> {
        if nanoseconds < NANOS_PER_SEC {
            Some(Self { seconds, nanoseconds })
        } else {
            None
        }
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn nanoseconds(&self) -> u32 {
        self.nanoseconds
    }

    /// Packs the timestamp into the smallest of the three wire layouts. Returns the number of used bytes
    /// of the returned buffer.
    pub(crate) fn encode(&self) -> ([u8; 12], usize) {
        let mut buf = [0u8; 12];
        if self.seconds >= 0 && self.seconds >> 34 == 0 {
            let data = (u64::from(self.nanoseconds) << 34) | self.seconds as u64;
            if data >> 32 == 0 {
                buf[..4].copy_from_slice(&(data as u32).to_be_bytes());
                return (buf, 4);
            }
            buf[..8].copy_from_slice(&data.to_be_bytes());
            return (buf, 8);
        }
        buf[..4].copy_from_slice(&self.nanoseconds.to_be_bytes());
        buf[4..].copy_from_slice(&self.seconds.to_be_bytes());
        (buf, 12)
    }

}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Timestamp {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Timestamp { seconds: d.as_secs() as i64, nanoseconds: d.subsec_nanos() },
            Err(e) => {
                let d = e.duration();
                let mut seconds = -(d.as_secs() as i64);
                let mut nanoseconds = d.subsec_nanos();
                if nanoseconds > 0 {
                    seconds -= 1;
                    nanoseconds = NANOS_PER_SEC - nanoseconds;
                }
                Timestamp { seconds, nanoseconds }
            }
        }
    }
}

impl TryFrom<Timestamp> for SystemTime {
    type Error = Timestamp;

    /// Fails with the original timestamp if the platform's `SystemTime` cannot represent it.
    fn try_from(ts: Timestamp) -> Result<SystemTime, Timestamp> {
        let nanos = Duration::from_nanos(u64::from(ts.nanoseconds));
        if ts.seconds >= 0 {
            UNIX_EPOCH.checked_add(Duration::from_secs(ts.seconds as u64)).and_then(|t| t.checked_add(nanos))
        } else {
            UNIX_EPOCH.checked_sub(Duration::from_secs(ts.seconds.unsigned_abs())).and_then(|t| t.checked_add(nanos))
        }.ok_or(ts)
    }
}

#[cfg(test)]
mod tests {
    use super::Timestamp;
    use std::convert::TryFrom;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    #[test]
    fn layouts() {
        assert_eq!(4, Timestamp::new(0, 0).unwrap().encode().1);
        assert_eq!(4, Timestamp::new(u32::MAX as i64, 0).unwrap().encode().1);
        assert_eq!(8, Timestamp::new(u32::MAX as i64 + 1, 0).unwrap().encode().1);
        assert_eq!(8, Timestamp::new(1, 1).unwrap().encode().1);
        assert_eq!(8, Timestamp::new((1 << 34) - 1, 999_999_999).unwrap().encode().1);
        assert_eq!(12, Timestamp::new(1 << 34, 0).unwrap().encode().1);
        assert_eq!(12, Timestamp::new(-1, 0).unwrap().encode().1);
    }

    #[test]
    fn invalid_nanos() {
        assert!(Timestamp::new(0, 1_000_000_000).is_none());
    }

    #[test]
    fn system_time() {
        let before = UNIX_EPOCH - Duration::new(1, 500_000_000);
        let ts = Timestamp::from(before);
        assert_eq!((-2, 500_000_000), (ts.seconds(), ts.nanoseconds()));
        assert_eq!(Ok(before), SystemTime::try_from(ts));
        let after = UNIX_EPOCH + Duration::new(1_600_000_000, 7);
        assert_eq!(Ok(after), SystemTime::try_from(Timestamp::from(after)));
    }

}
