pub mod sys;
mod units;
mod timebase;
mod config;
mod registry;
mod trigger;
mod capture;
mod device;

use sys::Status;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{primitive} failed with status {status}")]
    DeviceStatus { primitive: &'static str, status: Status },
    #[error("channel should be one of A, B, C or D, not {0:?}")]
    InvalidChannel(String),
    #[error("coupling should be AC or DC, not {0:?}")]
    InvalidCoupling(String),
    #[error("invalid trigger direction {0:?}")]
    InvalidDirection(String),
    #[error("voltage range {0:?} is not available on this device")]
    InvalidRange(Range),
    #[error("channel {0:?} has not been configured")]
    ChannelNotConfigured(Channel),
    #[error("trigger threshold {threshold} V is not within the {full_scale} V range")]
    ThresholdOutOfRange { threshold: f64, full_scale: f64 },
    #[error("maximum input voltage is {ceiling} V, requested {requested} V")]
    UnsupportedRange { requested: f64, ceiling: f64 },
    #[error("model {0:?} is not supported")]
    UnsupportedModel(String),
    #[error("sample interval of {requested} s exceeds the coarsest interval of {limit} s")]
    ResolutionTooCoarse { requested: f64, limit: f64 },
    #[error("info buffer of {available} bytes cannot hold {required} bytes")]
    InfoBufferTooSmall { required: usize, available: usize },
    #[error("expected device with serial {requested:?}, found {found:?}")]
    SerialMismatch { requested: String, found: String },
    #[error("invalid capture window {t_start} s..{t_end} s at {dt} s")]
    InvalidWindow { t_start: f64, t_end: f64, dt: f64 },
    #[error("capture of {requested} samples exceeds the device maximum of {maximum}")]
    TooManySamples { requested: u64, maximum: u32 },
    #[error("no channels are enabled")]
    NoEnabledChannels,
}

impl Error {
    /// Returns `true` if the device rejected an operation because a capture is in progress.
    pub fn is_device_busy(&self) -> bool {
        matches!(self, Self::DeviceStatus { status, .. } if status.is_busy())
    }
}

pub type Result<T> =
    core::result::Result<T, Error>;

pub use units::{
    Channel,
    Coupling,
    Range,
    ThresholdDirection,
    VoltageRangeTable,
};

pub use timebase::{
    Timebase,
    TimebaseFamily,
    TimebaseResolver,
};

pub use config::{
    ChannelConfig,
    TriggerConfig,
    CaptureWindow,
    SessionOptions,
};

pub use registry::ChannelRegistry;

pub use capture::{
    CaptureState,
    Trace,
    AcquisitionResult,
};

pub use device::Device;
