//! Conversion between physical quantities and the device's native enumerations.

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    A,
    B,
    C,
    D,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::A, Channel::B, Channel::C, Channel::D];

    /// Parses a channel letter. Case is ignored but surrounding whitespace is not.
    pub fn from_name(name: &str) -> Result<Channel> {
        Self::ALL.into_iter()
            .find(|channel| name.eq_ignore_ascii_case(channel.name()))
            .ok_or_else(|| Error::InvalidChannel(name.to_owned()))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn ps2000a_code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coupling {
    AC,
    #[default]
    DC,
}

impl Coupling {
    pub fn from_name(name: &str) -> Result<Coupling> {
        if name.eq_ignore_ascii_case("AC") {
            Ok(Self::AC)
        } else if name.eq_ignore_ascii_case("DC") {
            Ok(Self::DC)
        } else {
            Err(Error::InvalidCoupling(name.to_owned()))
        }
    }

    pub fn ps2000a_code(self) -> i32 {
        match self {
            Self::AC => 0,
            Self::DC => 1,
        }
    }
}

/// Input range selector, named after the full-scale voltage it represents.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Range {
    mV10,
    mV20,
    mV50,
    mV100,
    mV200,
    mV500,
    V1,
    V2,
    V5,
    V10,
    V20,
    V50,
}

impl Range {
    pub fn ps2000a_code(self) -> i32 {
        match self {
            Self::mV10  => 0,
            Self::mV20  => 1,
            Self::mV50  => 2,
            Self::mV100 => 3,
            Self::mV200 => 4,
            Self::mV500 => 5,
            Self::V1    => 6,
            Self::V2    => 7,
            Self::V5    => 8,
            Self::V10   => 9,
            Self::V20   => 10,
            Self::V50   => 11,
        }
    }
}

/// Ladder of input ranges supported by a device family, in ascending order of full scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltageRangeTable {
    entries: &'static [(Range, f64)],
}

impl VoltageRangeTable {
    pub fn new(entries: &'static [(Range, f64)]) -> VoltageRangeTable {
        assert!(!entries.is_empty());
        assert!(entries.windows(2).all(|pair| pair[0].1 < pair[1].1),
            "voltage range table must be strictly increasing");
        VoltageRangeTable { entries }
    }

    pub fn ps2000a() -> VoltageRangeTable {
        Self::new(&[
            (Range::mV20,  20e-3),
            (Range::mV50,  50e-3),
            (Range::mV100, 100e-3),
            (Range::mV200, 200e-3),
            (Range::mV500, 500e-3),
            (Range::V1,    1.0),
            (Range::V2,    2.0),
            (Range::V5,    5.0),
            (Range::V10,   10.0),
            (Range::V20,   20.0),
        ])
    }

    /// Largest input voltage any range in the table can represent.
    pub fn ceiling(&self) -> f64 {
        self.entries[self.entries.len() - 1].1
    }

    /// Selects the smallest range whose full scale is at least `max_volts`.
    pub fn range_for_max_voltage(&self, max_volts: f64) -> Result<Range> {
        self.entries.iter()
            .find(|&&(_, full_scale)| max_volts <= full_scale)
            .map(|&(range, _)| range)
            .ok_or(Error::UnsupportedRange { requested: max_volts, ceiling: self.ceiling() })
    }

    pub fn full_scale_volts(&self, range: Range) -> Result<f64> {
        self.entries.iter()
            .find(|&&(entry, _)| entry == range)
            .map(|&(_, full_scale)| full_scale)
            .ok_or(Error::InvalidRange(range))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdDirection {
    Above,
    Below,
    Rising,
    Falling,
    RisingOrFalling,
}

impl ThresholdDirection {
    const NAMES: [(&'static str, ThresholdDirection); 5] = [
        ("ABOVE",             ThresholdDirection::Above),
        ("BELOW",             ThresholdDirection::Below),
        ("RISING",            ThresholdDirection::Rising),
        ("FALLING",           ThresholdDirection::Falling),
        ("RISING_OR_FALLING", ThresholdDirection::RisingOrFalling),
    ];

    pub fn from_name(name: &str) -> Result<ThresholdDirection> {
        Self::NAMES.iter()
            .find(|(known, _)| name.eq_ignore_ascii_case(known))
            .map(|&(_, direction)| direction)
            .ok_or_else(|| Error::InvalidDirection(name.to_owned()))
    }

    pub fn ps2000a_code(self) -> i32 {
        match self {
            Self::Above           => 0,
            Self::Below           => 1,
            Self::Rising          => 2,
            Self::Falling         => 3,
            Self::RisingOrFalling => 4,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_range_minimality() {
        let table = VoltageRangeTable::ps2000a();
        for max_volts in [1e-6, 0.02, 0.021, 0.05, 0.3, 0.5, 0.99, 1.0, 1.5, 4.9, 5.0, 7.5, 19.99, 20.0] {
            let range = table.range_for_max_voltage(max_volts).unwrap();
            let full_scale = table.full_scale_volts(range).unwrap();
            assert!(full_scale >= max_volts, "{range:?} cannot hold {max_volts} V");
            assert!(table.entries.iter().all(|&(_, fs)| fs >= full_scale || fs < max_volts),
                "{range:?} is not the smallest range holding {max_volts} V");
        }
    }

    #[test]
    fn test_range_exact_boundaries() {
        let table = VoltageRangeTable::ps2000a();
        assert_eq!(table.range_for_max_voltage(5.0).unwrap(), Range::V5);
        assert_eq!(table.range_for_max_voltage(5.000001).unwrap(), Range::V10);
        assert_eq!(table.range_for_max_voltage(0.02).unwrap(), Range::mV20);
        assert_eq!(table.range_for_max_voltage(20.0).unwrap(), Range::V20);
    }

    #[test]
    fn test_range_above_ceiling() {
        let table = VoltageRangeTable::ps2000a();
        assert!(matches!(table.range_for_max_voltage(20.0001),
            Err(Error::UnsupportedRange { ceiling, .. }) if ceiling == 20.0));
        assert!(matches!(table.range_for_max_voltage(50.0), Err(Error::UnsupportedRange { .. })));
        assert!(matches!(table.range_for_max_voltage(f64::NAN), Err(Error::UnsupportedRange { .. })));
    }

    #[test]
    fn test_range_outside_table() {
        let table = VoltageRangeTable::ps2000a();
        assert!(matches!(table.full_scale_volts(Range::mV10), Err(Error::InvalidRange(Range::mV10))));
        assert!(matches!(table.full_scale_volts(Range::V50), Err(Error::InvalidRange(Range::V50))));
        assert_eq!(table.full_scale_volts(Range::mV500).unwrap(), 0.5);
    }

    #[test]
    #[should_panic]
    fn test_table_must_ascend() {
        VoltageRangeTable::new(&[(Range::V2, 2.0), (Range::V1, 1.0)]);
    }

    #[test]
    fn test_channel_names() {
        assert_eq!(Channel::from_name("a").unwrap(), Channel::A);
        assert_eq!(Channel::from_name("A").unwrap(), Channel::A);
        assert_eq!(Channel::from_name("d").unwrap(), Channel::D);
        for name in ["a ", " A", "E", "", "AB", "1"] {
            assert!(matches!(Channel::from_name(name), Err(Error::InvalidChannel(ref n)) if n == name));
        }
    }

    #[test]
    fn test_coupling_names() {
        assert_eq!(Coupling::from_name("dc").unwrap(), Coupling::DC);
        assert_eq!(Coupling::from_name("Ac").unwrap(), Coupling::AC);
        assert!(matches!(Coupling::from_name("gnd"), Err(Error::InvalidCoupling(_))));
        assert!(matches!(Coupling::from_name("dc "), Err(Error::InvalidCoupling(_))));
    }

    #[test]
    fn test_direction_names() {
        assert_eq!(ThresholdDirection::from_name("rising").unwrap(), ThresholdDirection::Rising);
        assert_eq!(ThresholdDirection::from_name("Rising_Or_Falling").unwrap(),
            ThresholdDirection::RisingOrFalling);
        assert_eq!(ThresholdDirection::from_name("BELOW").unwrap(), ThresholdDirection::Below);
        assert!(matches!(ThresholdDirection::from_name("rising or falling"),
            Err(Error::InvalidDirection(_))));
        assert!(matches!(ThresholdDirection::from_name("inside"), Err(Error::InvalidDirection(_))));
    }

    #[test]
    fn test_device_codes() {
        assert_eq!(Range::mV20.ps2000a_code(), 1);
        assert_eq!(Range::V20.ps2000a_code(), 10);
        assert_eq!(Channel::C.ps2000a_code(), 2);
        assert_eq!(Coupling::DC.ps2000a_code(), 1);
        assert_eq!(ThresholdDirection::RisingOrFalling.ps2000a_code(), 4);
    }
}
