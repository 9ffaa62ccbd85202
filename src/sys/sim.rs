//! In-process stand-in for a PicoScope, for use without hardware.

use std::f64::consts::PI;

use crate::{Channel, Coupling, Range, TimebaseResolver, TriggerConfig};
use super::{Driver, InfoField, Overflow, Retrieved, SampleBuffers, Status, TimebaseInfo};

/// Driver primitives, for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    UnitInfo,
    SetChannel,
    SetSimpleTrigger,
    Timebase,
    RunBlock,
    IsReady,
    SetDataBuffers,
    GetValues,
    MaxAdcCount,
    Stop,
    Close,
}

/// A primitive invocation as recorded by `SimulatedDriver`.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    UnitInfo(InfoField),
    SetChannel { channel: Channel, enabled: bool, coupling: Coupling, range: Range, offset: f32 },
    SetSimpleTrigger(TriggerConfig),
    Timebase { index: u32, samples: u32 },
    RunBlock { pre_trigger: u32, post_trigger: u32, timebase: u32 },
    IsReady,
    SetDataBuffers { channel: Channel, length: usize },
    GetValues { samples: u32 },
    MaxAdcCount,
    Stop,
    Close,
}

impl Call {
    fn primitive(&self) -> Primitive {
        match self {
            Self::UnitInfo(_)           => Primitive::UnitInfo,
            Self::SetChannel { .. }     => Primitive::SetChannel,
            Self::SetSimpleTrigger(_)   => Primitive::SetSimpleTrigger,
            Self::Timebase { .. }       => Primitive::Timebase,
            Self::RunBlock { .. }       => Primitive::RunBlock,
            Self::IsReady               => Primitive::IsReady,
            Self::SetDataBuffers { .. } => Primitive::SetDataBuffers,
            Self::GetValues { .. }      => Primitive::GetValues,
            Self::MaxAdcCount           => Primitive::MaxAdcCount,
            Self::Stop                  => Primitive::Stop,
            Self::Close                 => Primitive::Close,
        }
    }
}

/// Waveform fed into a simulated channel, in ADC counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    Constant(i16),
    Sine { amplitude: i16, period: usize },
}

impl Signal {
    fn sample(self, index: usize) -> i16 {
        match self {
            Self::Constant(counts) => counts,
            Self::Sine { amplitude, period } => {
                let phase = 2.0 * PI * (index % period.max(1)) as f64 / period.max(1) as f64;
                (amplitude as f64 * phase.sin()).round() as i16
            }
        }
    }
}

#[derive(Debug)]
pub struct SimulatedDriver {
    serial: String,
    model: String,
    max_adc_count: i16,
    interval_ns: Option<f32>,
    max_samples: u32,
    polls_until_ready: u32,
    sample_limit: Option<u32>,
    signals: [Signal; 4],
    overflow: Overflow,
    // device state
    channels: [Option<(bool, Coupling, Range, f32)>; 4],
    trigger: Option<TriggerConfig>,
    registered: Vec<(Channel, usize)>,
    block: Option<u32>,
    polls_remaining: u32,
    closed: bool,
    // test hooks
    failure: Option<(Primitive, Status)>,
    calls: Vec<Call>,
}

impl SimulatedDriver {
    pub fn new(model: &str) -> SimulatedDriver {
        let max_adc_count = 32767;
        SimulatedDriver {
            serial: "SIM00/0001".to_owned(),
            model: model.to_owned(),
            max_adc_count,
            interval_ns: None,
            max_samples: 32_000_000,
            polls_until_ready: 3,
            sample_limit: None,
            signals: [Signal::Sine { amplitude: max_adc_count / 2, period: 100 }; 4],
            overflow: Overflow::empty(),
            channels: [None; 4],
            trigger: None,
            registered: Vec::new(),
            block: None,
            polls_remaining: 0,
            closed: false,
            failure: None,
            calls: Vec::new(),
        }
    }

    pub fn with_serial(self, serial: &str) -> Self {
        Self { serial: serial.to_owned(), ..self }
    }

    /// Reports `interval_ns` for every timebase instead of the nominal interval of the model.
    pub fn with_interval_ns(self, interval_ns: f32) -> Self {
        Self { interval_ns: Some(interval_ns), ..self }
    }

    pub fn with_max_samples(self, max_samples: u32) -> Self {
        Self { max_samples, ..self }
    }

    /// Number of readiness polls answered with "not ready" after a block is started.
    pub fn with_polls_until_ready(self, polls_until_ready: u32) -> Self {
        Self { polls_until_ready, ..self }
    }

    /// Makes `get_values` return at most `sample_limit` samples, as a device does when a
    /// capture ends early.
    pub fn with_sample_limit(self, sample_limit: u32) -> Self {
        Self { sample_limit: Some(sample_limit), ..self }
    }

    pub fn with_signal(mut self, channel: Channel, signal: Signal) -> Self {
        self.signals[channel.index()] = signal;
        self
    }

    pub fn with_overflow(self, overflow: Overflow) -> Self {
        Self { overflow, ..self }
    }

    pub fn set_max_adc_count(&mut self, max_adc_count: i16) {
        self.max_adc_count = max_adc_count;
    }

    /// Makes every subsequent invocation of `primitive` fail with `status`.
    pub fn fail(&mut self, primitive: Primitive, status: Status) {
        self.failure = Some((primitive, status));
    }

    pub fn clear_failure(&mut self) {
        self.failure = None;
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn channel(&self, channel: Channel) -> Option<(bool, Coupling, Range, f32)> {
        self.channels[channel.index()]
    }

    pub fn trigger(&self) -> Option<TriggerConfig> {
        self.trigger
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn record(&mut self, call: Call) -> Result<(), Status> {
        log::trace!("simulated {:?}", call);
        let primitive = call.primitive();
        self.calls.push(call);
        match self.failure {
            Some((failing, status)) if failing == primitive => Err(status),
            _ if self.closed => Err(Status::INVALID_HANDLE),
            _ => Ok(())
        }
    }

    fn nominal_interval_ns(&self, index: u32) -> Result<f32, Status> {
        match self.interval_ns {
            Some(interval_ns) => Ok(interval_ns),
            None => TimebaseResolver::ps2000a().family(&self.model)
                .map(|family| (family.interval(index) * 1e9) as f32)
                .map_err(|_| Status::INVALID_TIMEBASE),
        }
    }
}

impl Driver for SimulatedDriver {
    fn unit_info(&mut self, field: InfoField, buffer: &mut [u8]) -> Result<usize, Status> {
        self.record(Call::UnitInfo(field))?;
        let value = match field {
            InfoField::BatchAndSerial => self.serial.as_str(),
            InfoField::VariantInfo => self.model.as_str(),
            InfoField::DriverVersion => "PS2000A Linux Driver, 3.0.0.0",
            _ => "",
        };
        let mut string = value.as_bytes().to_vec();
        string.push(0);
        let length = string.len().min(buffer.len());
        buffer[..length].copy_from_slice(&string[..length]);
        Ok(string.len())
    }

    fn set_channel(&mut self, channel: Channel, enabled: bool, coupling: Coupling, range: Range,
                   offset: f32) -> Result<(), Status> {
        self.record(Call::SetChannel { channel, enabled, coupling, range, offset })?;
        if matches!(range, Range::mV10 | Range::V50) {
            return Err(Status::INVALID_VOLTAGE_RANGE)
        }
        self.channels[channel.index()] = Some((enabled, coupling, range, offset));
        Ok(())
    }

    fn set_simple_trigger(&mut self, trigger: &TriggerConfig) -> Result<(), Status> {
        self.record(Call::SetSimpleTrigger(*trigger))?;
        self.trigger = Some(*trigger);
        Ok(())
    }

    fn timebase(&mut self, index: u32, samples: u32) -> Result<TimebaseInfo, Status> {
        self.record(Call::Timebase { index, samples })?;
        Ok(TimebaseInfo {
            interval_ns: self.nominal_interval_ns(index)?,
            max_samples: self.max_samples,
        })
    }

    fn run_block(&mut self, pre_trigger: u32, post_trigger: u32, timebase: u32)
            -> Result<(), Status> {
        self.record(Call::RunBlock { pre_trigger, post_trigger, timebase })?;
        let samples = pre_trigger + post_trigger;
        if samples == 0 || samples > self.max_samples {
            return Err(Status::TOO_MANY_SAMPLES)
        }
        self.block = Some(samples);
        self.polls_remaining = self.polls_until_ready;
        Ok(())
    }

    fn is_ready(&mut self) -> Result<bool, Status> {
        self.record(Call::IsReady)?;
        if self.block.is_none() {
            return Err(Status::NO_SAMPLES_AVAILABLE)
        }
        if self.polls_remaining == 0 {
            Ok(true)
        } else {
            self.polls_remaining -= 1;
            Ok(false)
        }
    }

    fn set_data_buffers(&mut self, channel: Channel, length: usize) -> Result<(), Status> {
        self.record(Call::SetDataBuffers { channel, length })?;
        self.registered.retain(|&(registered, _)| registered != channel);
        self.registered.push((channel, length));
        Ok(())
    }

    fn get_values(&mut self, samples: u32, buffers: &mut [SampleBuffers])
            -> Result<Retrieved, Status> {
        self.record(Call::GetValues { samples })?;
        let captured = match self.block {
            Some(captured) if self.polls_remaining == 0 => captured,
            Some(_) => return Err(Status::DEVICE_SAMPLING),
            None => return Err(Status::NO_SAMPLES_AVAILABLE),
        };
        let count = samples.min(captured).min(self.sample_limit.unwrap_or(u32::MAX)) as usize;
        let mut overflow = Overflow::empty();
        for buffers in buffers.iter_mut() {
            let registered = self.registered.iter()
                .any(|&(channel, length)| channel == buffers.channel && length >= count);
            if !registered || buffers.len() < count {
                return Err(Status::INVALID_PARAMETER)
            }
            let signal = self.signals[buffers.channel.index()];
            for index in 0..count {
                buffers.max[index] = signal.sample(index);
                buffers.min[index] = signal.sample(index);
            }
            overflow |= self.overflow & Overflow::channel(buffers.channel);
        }
        Ok(Retrieved { samples: count as u32, overflow })
    }

    fn max_adc_count(&mut self) -> Result<i16, Status> {
        self.record(Call::MaxAdcCount)?;
        Ok(self.max_adc_count)
    }

    fn stop(&mut self) -> Result<(), Status> {
        self.record(Call::Stop)?;
        self.block = None;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Status> {
        self.record(Call::Close)?;
        self.closed = true;
        self.registered.clear();
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unit_info() {
        let mut driver = SimulatedDriver::new("2206B");
        let mut buffer = [0u8; 32];
        assert_eq!(driver.unit_info(InfoField::VariantInfo, &mut buffer).unwrap(), 6);
        assert_eq!(&buffer[..6], b"2206B\0");
        let mut short = [0u8; 4];
        assert_eq!(driver.unit_info(InfoField::BatchAndSerial, &mut short).unwrap(), 11);
        assert_eq!(&short, b"SIM0");
    }

    #[test]
    fn test_block_lifecycle() {
        let mut driver = SimulatedDriver::new("2206B")
            .with_polls_until_ready(2)
            .with_signal(Channel::A, Signal::Constant(100));
        driver.run_block(2, 3, 10).unwrap();
        assert_eq!(driver.is_ready(), Ok(false));
        assert_eq!(driver.is_ready(), Ok(false));
        assert_eq!(driver.is_ready(), Ok(true));
        driver.set_data_buffers(Channel::A, 5).unwrap();
        let mut buffers = [SampleBuffers::new(Channel::A, 5)];
        let retrieved = driver.get_values(5, &mut buffers).unwrap();
        assert_eq!(retrieved.samples, 5);
        assert_eq!(buffers[0].max, [100; 5]);
        assert_eq!(buffers[0].min, [100; 5]);
    }

    #[test]
    fn test_unregistered_buffer() {
        let mut driver = SimulatedDriver::new("2206B").with_polls_until_ready(0);
        driver.run_block(0, 4, 10).unwrap();
        let mut buffers = [SampleBuffers::new(Channel::B, 4)];
        assert_eq!(driver.get_values(4, &mut buffers), Err(Status::INVALID_PARAMETER));
    }

    #[test]
    fn test_nominal_interval() {
        let mut driver = SimulatedDriver::new("2208B");
        assert_eq!(driver.timebase(3, 100).unwrap().interval_ns, 8.0);
        let mut driver = SimulatedDriver::new("2204A");
        assert_eq!(driver.timebase(3, 100), Err(Status::INVALID_TIMEBASE));
    }

    #[test]
    fn test_sine() {
        let sine = Signal::Sine { amplitude: 1000, period: 4 };
        assert_eq!((0..4).map(|index| sine.sample(index)).collect::<Vec<_>>(), [0, 1000, 0, -1000]);
    }

    #[test]
    fn test_failure_injection() {
        let mut driver = SimulatedDriver::new("2206B");
        driver.fail(Primitive::MaxAdcCount, Status::INVALID_HANDLE);
        assert_eq!(driver.max_adc_count(), Err(Status::INVALID_HANDLE));
        driver.clear_failure();
        assert_eq!(driver.max_adc_count(), Ok(32767));
        driver.close().unwrap();
        assert_eq!(driver.max_adc_count(), Err(Status::INVALID_HANDLE));
    }
}
