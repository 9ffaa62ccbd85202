//! Block capture: arm the device, wait for the trigger, retrieve and convert the samples.

use std::thread::sleep;
use std::time::Duration;

use crate::{CaptureWindow, Channel, ChannelConfig, ChannelRegistry, Error, Result};
use crate::sys::{Driver, Overflow, SampleBuffers, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Armed,
    Polling,
    Ready,
    Retrieving,
    Complete,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    /// Channel name as given when the channel was configured.
    pub label: String,
    pub channel: Channel,
    pub volts: Vec<f64>,
    /// Whether the input exceeded the channel's range at some point during the capture.
    pub overflowed: bool,
}

/// Samples of every enabled channel, on a shared time axis starting at the first sample.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionResult {
    /// Seconds since the first sample.
    pub time: Vec<f64>,
    pub traces: Vec<Trace>,
}

impl AcquisitionResult {
    pub fn trace(&self, label: &str) -> Option<&Trace> {
        self.traces.iter().find(|trace| trace.label == label)
    }

    pub fn volts(&self, label: &str) -> Option<&[f64]> {
        self.trace(label).map(|trace| &trace.volts[..])
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.traces.iter().map(|trace| trace.label.as_str())
    }

    pub fn overflowed(&self) -> bool {
        self.traces.iter().any(|trace| trace.overflowed)
    }
}

pub(crate) fn counts_to_volts(counts: i16, max_adc_count: i16, full_scale_volts: f64) -> f64 {
    counts as f64 / max_adc_count as f64 * full_scale_volts
}

fn status(primitive: &'static str) -> impl FnOnce(Status) -> Error {
    move |status| Error::DeviceStatus { primitive, status }
}

#[derive(Debug, Default)]
pub(crate) struct BlockCapture {
    state: CaptureState,
}

impl BlockCapture {
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Runs one capture of `window` on every channel enabled in `registry`.
    ///
    /// On failure nothing retrieved so far is returned, and a block already started on the
    /// device is stopped.
    pub fn run<D: Driver>(&mut self, driver: &mut D, registry: &ChannelRegistry,
                          window: &CaptureWindow, poll_interval: Option<Duration>)
            -> Result<AcquisitionResult> {
        self.state = CaptureState::Idle;
        let result = self.sequence(driver, registry, window, poll_interval);
        if let Err(ref error) = result {
            log::debug!("capture failed in state {:?}: {}", self.state, error);
            if !matches!(self.state, CaptureState::Idle) {
                if let Err(status) = driver.stop() {
                    log::warn!("failed to stop aborted capture: {}", status);
                }
            }
            self.transition(CaptureState::Error);
        }
        result
    }

    fn transition(&mut self, state: CaptureState) {
        log::debug!("capture {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    fn sequence<D: Driver>(&mut self, driver: &mut D, registry: &ChannelRegistry,
                           window: &CaptureWindow, poll_interval: Option<Duration>)
            -> Result<AcquisitionResult> {
        let channels = registry.enabled().collect::<Vec<&ChannelConfig>>();
        if channels.is_empty() {
            return Err(Error::NoEnabledChannels)
        }
        // ranges as of the start of the capture
        let full_scales = channels.iter()
            .map(|config| registry.ranges().full_scale_volts(config.range))
            .collect::<Result<Vec<f64>>>()?;
        let total_samples = u32::try_from(window.total_samples())
            .map_err(|_| Error::TooManySamples {
                requested: window.total_samples(),
                maximum: u32::MAX,
            })?;

        log::debug!("run_block({}, {}, {})",
            window.pre_trigger_samples, window.post_trigger_samples, window.timebase_index);
        driver.run_block(window.pre_trigger_samples, window.post_trigger_samples,
                window.timebase_index)
            .map_err(status("run_block"))?;
        self.transition(CaptureState::Armed);

        self.transition(CaptureState::Polling);
        let mut polls = 0u64;
        while !driver.is_ready().map_err(status("is_ready"))? {
            polls += 1;
            if let Some(poll_interval) = poll_interval {
                sleep(poll_interval);
            }
        }
        log::trace!("ready after {} polls", polls);
        self.transition(CaptureState::Ready);

        self.transition(CaptureState::Retrieving);
        let mut buffers = Vec::with_capacity(channels.len());
        for config in channels.iter() {
            log::trace!("set_data_buffers({:?}, {})", config.channel, total_samples);
            driver.set_data_buffers(config.channel, total_samples as usize)
                .map_err(status("set_data_buffers"))?;
            buffers.push(SampleBuffers::new(config.channel, total_samples as usize));
        }
        let retrieved = driver.get_values(total_samples, &mut buffers[..])
            .map_err(status("get_values"))?;
        log::debug!("get_values({}) = {:?}", total_samples, retrieved);
        let sample_count = retrieved.samples.min(total_samples) as usize;
        if sample_count < total_samples as usize {
            log::warn!("device returned {} of {} samples", sample_count, total_samples);
        }
        let max_adc_count = driver.max_adc_count().map_err(status("max_adc_count"))?;

        let time = (0..sample_count)
            .map(|index| index as f64 * window.interval)
            .collect();
        let traces = channels.into_iter()
            .zip(full_scales)
            .zip(buffers)
            .map(|((config, full_scale), buffers)| Trace {
                label: config.label.clone(),
                channel: config.channel,
                volts: buffers.max[..sample_count].iter()
                    .map(|&counts| counts_to_volts(counts, max_adc_count, full_scale))
                    .collect(),
                overflowed: retrieved.overflow.contains(Overflow::channel(config.channel)),
            })
            .collect();
        self.transition(CaptureState::Complete);
        Ok(AcquisitionResult { time, traces })
    }
}
