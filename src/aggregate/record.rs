use std::borrow::Cow;

use crate::parse::Reading;

/// Running min/max/sum/count for one station, all in tenths of a degree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: Box<[u8]>,
    pub min: i16,
    pub max: i16,
    pub sum: i64,
    pub count: u64,
}

impl Record {
    pub fn new(reading: &Reading<'_>) -> Self {
        Self {
            name: reading.station.into(),
            min: reading.temperature,
            max: reading.temperature,
            sum: i64::from(reading.temperature),
            count: 1,
        }
    }

    pub fn station(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    pub fn observe(&mut self, temperature: i16) {
        self.min = self.min.min(temperature);
        self.max = self.max.max(temperature);
        self.sum += i64::from(temperature);
        self.count += 1;
    }

    /// Folds another record for the same station into this one.
    pub fn absorb(&mut self, other: &Record) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
    }

    /// Mean in tenths: truncated quotient, bumped by one tenth whenever the
    /// division leaves a remainder.
    pub fn mean_tenths(&self) -> i64 {
        let count = self.count as i64;
        let quotient = self.sum / count;
        if self.sum % count != 0 {
            quotient + 1
        } else {
            quotient
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sum: i64, count: u64) -> Record {
        Record {
            name: Box::from(&b"x"[..]),
            min: 0,
            max: 0,
            sum,
            count,
        }
    }

    #[test]
    fn single_reading_identity() {
        let r = Record::new(&Reading::new(b"Oslo", -31));
        assert_eq!((r.min, r.max, r.sum, r.count), (-31, -31, -31, 1));
        assert_eq!(r.mean_tenths(), -31);
        assert_eq!(r.station(), "Oslo");
    }

    #[test]
    fn mean_biases_up_on_remainder() {
        assert_eq!(record(7, 2).mean_tenths(), 4);
        assert_eq!(record(6, 2).mean_tenths(), 3);
        assert_eq!(record(111, 2).mean_tenths(), 56);
        assert_eq!(record(-7, 2).mean_tenths(), -2);
    }

    #[test]
    fn observe_and_absorb_track_extremes() {
        let mut a = Record::new(&Reading::new(b"x", 42));
        a.observe(69);
        a.observe(-5);
        assert_eq!((a.min, a.max, a.sum, a.count), (-5, 69, 106, 3));

        let mut b = Record::new(&Reading::new(b"x", 420));
        b.absorb(&a);
        assert_eq!((b.min, b.max, b.sum, b.count), (-5, 420, 526, 4));
    }
}
