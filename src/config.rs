//! Configuration of channels, triggers and captures in terms of device-native values.

use std::time::Duration;

use crate::{Channel, Coupling, Range, ThresholdDirection};

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    pub channel: Channel,
    pub enabled: bool,
    pub coupling: Coupling,
    pub range: Range,
    /// Analog offset in volts.
    pub offset: f32,
    /// Channel name as given by the caller; captured traces are labelled with it.
    pub label: String,
}

impl ChannelConfig {
    /// Settings pushed to the device for a disabled channel. Coupling and range have no
    /// effect on a disabled channel but must still be valid.
    pub fn disabled(channel: Channel, label: String) -> ChannelConfig {
        ChannelConfig {
            channel,
            enabled: false,
            coupling: Coupling::DC,
            range: Range::V5,
            offset: 0.0,
            label,
        }
    }
}

/// Single-channel, single-condition trigger.
///
/// `threshold_counts` is quantized against the range `channel` had when the trigger was last
/// pushed to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerConfig {
    pub channel: Channel,
    pub threshold_counts: i16,
    pub direction: ThresholdDirection,
    /// Samples between the trigger event and the start of the capture.
    pub delay_samples: u32,
    /// Time after which the device triggers by itself; `0` waits indefinitely.
    pub auto_trigger_ms: u16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureWindow {
    pub pre_trigger_samples: u32,
    pub post_trigger_samples: u32,
    pub timebase_index: u32,
    /// Sample interval confirmed by the device, in seconds.
    pub interval: f64,
}

impl CaptureWindow {
    pub fn total_samples(&self) -> u64 {
        self.pre_trigger_samples as u64 + self.post_trigger_samples as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Size of the buffer used to read device information strings.
    pub info_buffer_len: usize,
    /// Delay between readiness polls. `None` polls without pausing.
    pub poll_interval: Option<Duration>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            info_buffer_len: 32,
            poll_interval: None,
        }
    }
}
