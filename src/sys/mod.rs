//! Low-level primitives of the vendor driver, as seen by the rest of the crate.
//!
//! A `Driver` owns one open device handle. Opening the handle is up to whoever constructs the
//! driver; the session built on top of it is responsible for stopping and closing it.

use std::fmt;

use bitflags::bitflags;

use crate::{Channel, Coupling, Range, TriggerConfig};

pub mod sim;

/// Status code returned by every driver primitive.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub u32);

impl Status {
    pub const OK: Status = Status(0x00);
    pub const NOT_FOUND: Status = Status(0x03);
    pub const INVALID_HANDLE: Status = Status(0x0c);
    pub const INVALID_PARAMETER: Status = Status(0x0d);
    pub const INVALID_TIMEBASE: Status = Status(0x0e);
    pub const INVALID_VOLTAGE_RANGE: Status = Status(0x0f);
    pub const INVALID_CHANNEL: Status = Status(0x10);
    pub const TOO_MANY_SAMPLES: Status = Status(0x1d);
    pub const DEVICE_SAMPLING: Status = Status(0x24);
    pub const NO_SAMPLES_AVAILABLE: Status = Status(0x25);

    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::OK => "PICO_OK",
            Self::NOT_FOUND => "PICO_NOT_FOUND",
            Self::INVALID_HANDLE => "PICO_INVALID_HANDLE",
            Self::INVALID_PARAMETER => "PICO_INVALID_PARAMETER",
            Self::INVALID_TIMEBASE => "PICO_INVALID_TIMEBASE",
            Self::INVALID_VOLTAGE_RANGE => "PICO_INVALID_VOLTAGE_RANGE",
            Self::INVALID_CHANNEL => "PICO_INVALID_CHANNEL",
            Self::TOO_MANY_SAMPLES => "PICO_TOO_MANY_SAMPLES",
            Self::DEVICE_SAMPLING => "PICO_DEVICE_SAMPLING",
            Self::NO_SAMPLES_AVAILABLE => "PICO_NO_SAMPLES_AVAILABLE",
            _ => return None
        })
    }

    /// Returns `true` for statuses meaning a capture is still in progress.
    pub fn is_busy(self) -> bool {
        self == Self::DEVICE_SAMPLING
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "Status({:#010x})", self.0),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({:#x})", name, self.0),
            None => write!(f, "{:#x}", self.0),
        }
    }
}

/// Fields readable with `Driver::unit_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoField {
    DriverVersion,
    UsbVersion,
    HardwareVersion,
    VariantInfo,
    BatchAndSerial,
    CalibrationDate,
    KernelVersion,
}

impl InfoField {
    pub fn ps2000a_code(self) -> u32 {
        match self {
            Self::DriverVersion   => 0,
            Self::UsbVersion      => 1,
            Self::HardwareVersion => 2,
            Self::VariantInfo     => 3,
            Self::BatchAndSerial  => 4,
            Self::CalibrationDate => 5,
            Self::KernelVersion   => 6,
        }
    }
}

bitflags! {
    /// Channels whose input exceeded the selected range during a capture.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Overflow: u16 {
        const ChannelA = 1<<0;
        const ChannelB = 1<<1;
        const ChannelC = 1<<2;
        const ChannelD = 1<<3;
    }
}

impl Overflow {
    pub fn channel(channel: Channel) -> Self {
        match channel {
            Channel::A => Overflow::ChannelA,
            Channel::B => Overflow::ChannelB,
            Channel::C => Overflow::ChannelC,
            Channel::D => Overflow::ChannelD,
        }
    }
}

/// Result of `Driver::timebase`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimebaseInfo {
    /// Sample interval the device will use, in nanoseconds.
    pub interval_ns: f32,
    /// Largest capture the device can take at this timebase.
    pub max_samples: u32,
}

/// Per-channel destination for retrieved samples.
///
/// Downsampled retrieval stores the maximum and minimum of every reporting interval; without
/// downsampling both traces hold the same samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffers {
    pub channel: Channel,
    pub max: Vec<i16>,
    pub min: Vec<i16>,
}

impl SampleBuffers {
    pub fn new(channel: Channel, length: usize) -> SampleBuffers {
        SampleBuffers { channel, max: vec![0; length], min: vec![0; length] }
    }

    pub fn len(&self) -> usize {
        self.max.len()
    }
}

/// Result of `Driver::get_values`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retrieved {
    pub samples: u32,
    pub overflow: Overflow,
}

pub trait Driver {
    /// Copies an information string into `buffer`, returning the length the string requires.
    /// If the returned length exceeds `buffer.len()`, the contents of `buffer` are truncated.
    fn unit_info(&mut self, field: InfoField, buffer: &mut [u8]) -> Result<usize, Status>;

    fn set_channel(&mut self, channel: Channel, enabled: bool, coupling: Coupling, range: Range,
                   offset: f32) -> Result<(), Status>;

    fn set_simple_trigger(&mut self, trigger: &TriggerConfig) -> Result<(), Status>;

    fn timebase(&mut self, index: u32, samples: u32) -> Result<TimebaseInfo, Status>;

    fn run_block(&mut self, pre_trigger: u32, post_trigger: u32, timebase: u32)
        -> Result<(), Status>;

    fn is_ready(&mut self) -> Result<bool, Status>;

    /// Registers a destination of `length` samples for `channel`.
    fn set_data_buffers(&mut self, channel: Channel, length: usize) -> Result<(), Status>;

    /// Transfers `samples` samples into `buffers`, which must match the registered channels.
    fn get_values(&mut self, samples: u32, buffers: &mut [SampleBuffers])
        -> Result<Retrieved, Status>;

    fn max_adc_count(&mut self) -> Result<i16, Status>;

    fn stop(&mut self) -> Result<(), Status>;

    fn close(&mut self) -> Result<(), Status>;
}

impl<D: Driver + ?Sized> Driver for &mut D {
    fn unit_info(&mut self, field: InfoField, buffer: &mut [u8]) -> Result<usize, Status> {
        (**self).unit_info(field, buffer)
    }

    fn set_channel(&mut self, channel: Channel, enabled: bool, coupling: Coupling, range: Range,
                   offset: f32) -> Result<(), Status> {
        (**self).set_channel(channel, enabled, coupling, range, offset)
    }

    fn set_simple_trigger(&mut self, trigger: &TriggerConfig) -> Result<(), Status> {
        (**self).set_simple_trigger(trigger)
    }

    fn timebase(&mut self, index: u32, samples: u32) -> Result<TimebaseInfo, Status> {
        (**self).timebase(index, samples)
    }

    fn run_block(&mut self, pre_trigger: u32, post_trigger: u32, timebase: u32)
            -> Result<(), Status> {
        (**self).run_block(pre_trigger, post_trigger, timebase)
    }

    fn is_ready(&mut self) -> Result<bool, Status> {
        (**self).is_ready()
    }

    fn set_data_buffers(&mut self, channel: Channel, length: usize) -> Result<(), Status> {
        (**self).set_data_buffers(channel, length)
    }

    fn get_values(&mut self, samples: u32, buffers: &mut [SampleBuffers])
            -> Result<Retrieved, Status> {
        (**self).get_values(samples, buffers)
    }

    fn max_adc_count(&mut self) -> Result<i16, Status> {
        (**self).max_adc_count()
    }

    fn stop(&mut self) -> Result<(), Status> {
        (**self).stop()
    }

    fn close(&mut self) -> Result<(), Status> {
        (**self).close()
    }
}
