use crate::{AcquisitionResult, CaptureState, CaptureWindow, Channel, ChannelConfig};
use crate::{ChannelRegistry, Error, Result, SessionOptions, TimebaseResolver, TriggerConfig};
use crate::VoltageRangeTable;
use crate::capture::BlockCapture;
use crate::sys::{Driver, InfoField, Status};
use crate::trigger::SimpleTrigger;

fn status(primitive: &'static str) -> impl FnOnce(Status) -> Error {
    move |status| Error::DeviceStatus { primitive, status }
}

/// An open oscilloscope.
///
/// The device is stopped and closed when this object is dropped, unless `close` was called.
#[derive(Debug)]
pub struct Device<D: Driver> {
    driver: D,
    options: SessionOptions,
    serial: String,
    model: String,
    timebases: TimebaseResolver,
    registry: ChannelRegistry,
    trigger: Option<SimpleTrigger>,
    capture: BlockCapture,
    open: bool,
}

impl<D: Driver> Device<D> {
    /// Takes ownership of an open driver and identifies the device behind it.
    ///
    /// If `serial` is given, it must match the serial number the device reports. If
    /// identification fails, the driver is stopped and closed before the error is returned.
    pub fn open(driver: D, serial: Option<&str>, options: SessionOptions) -> Result<Device<D>> {
        let mut device = Device {
            driver,
            options,
            serial: String::new(),
            model: String::new(),
            timebases: TimebaseResolver::ps2000a(),
            registry: ChannelRegistry::new(VoltageRangeTable::ps2000a()),
            trigger: None,
            capture: BlockCapture::default(),
            open: true,
        };
        let found = device.read_info(InfoField::BatchAndSerial)?;
        if let Some(requested) = serial {
            if requested != found {
                return Err(Error::SerialMismatch { requested: requested.to_owned(), found })
            }
        }
        device.serial = found;
        device.model = device.read_info(InfoField::VariantInfo)?;
        log::debug!("opened PicoScope {} with serial {}", device.model, device.serial);
        Ok(device)
    }

    /// Opens the device, runs `f` on it, and closes it afterwards.
    pub fn with<F, R>(driver: D, serial: Option<&str>, options: SessionOptions, f: F) -> Result<R>
            where F: FnOnce(&mut Device<D>) -> Result<R> {
        let mut device = Self::open(driver, serial, options)?;
        let result = f(&mut device);
        let closed = device.close();
        let value = result?;
        closed?;
        Ok(value)
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn channels(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// Trigger as last pushed to the device, if any.
    pub fn trigger(&self) -> Option<&TriggerConfig> {
        self.trigger.as_ref().map(SimpleTrigger::config)
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture.state()
    }

    /// Reads an information string, such as the serial number or the model.
    pub fn read_info(&mut self, field: InfoField) -> Result<String> {
        let mut buffer = vec![0u8; self.options.info_buffer_len];
        let required = self.driver.unit_info(field, &mut buffer[..]).map_err(status("unit_info"))?;
        if required > buffer.len() {
            return Err(Error::InfoBufferTooSmall { required, available: buffer.len() })
        }
        let value = String::from_utf8_lossy(&buffer[..required]).trim_matches('\0').to_owned();
        log::trace!("read_info({:?}) = {:?}", field, value);
        Ok(value)
    }

    /// Enables or disables a channel, selecting the smallest range that fits `max_volts`.
    pub fn configure_channel(&mut self, name: &str, enabled: bool, coupling: &str,
                             max_volts: f64, offset: f32) -> Result<()> {
        self.registry.configure(&mut self.driver, name, enabled, coupling, max_volts, offset)
    }

    pub fn disable_channel(&mut self, name: &str) -> Result<()> {
        self.registry.disable(&mut self.driver, name)
    }

    pub fn channel(&self, name: &str) -> Result<&ChannelConfig> {
        self.registry.get(Channel::from_name(name)?)
    }

    /// Triggers on `name` crossing `threshold_volts` in `direction`.
    ///
    /// If the channel is later reconfigured to a different range, the threshold is converted
    /// again for the new range before the next capture.
    pub fn set_trigger(&mut self, name: &str, threshold_volts: f64, direction: &str,
                       delay_samples: u32, auto_trigger_ms: u16) -> Result<()> {
        let trigger = SimpleTrigger::set(&mut self.driver, &self.registry, name,
            threshold_volts, direction, delay_samples, auto_trigger_ms)?;
        self.trigger = Some(trigger);
        Ok(())
    }

    /// Computes the sample counts and timebase covering `t_start..t_end` seconds around the
    /// trigger with samples approximately `dt` seconds apart.
    ///
    /// The sample counts are derived from the interval the device reports for the requested
    /// capture size, which may differ from the nominal interval of the timebase.
    pub fn resolve_capture_window(&mut self, t_start: f64, t_end: f64, dt: f64)
            -> Result<CaptureWindow> {
        let valid = t_start.is_finite() && t_end.is_finite() && t_end > t_start &&
            dt.is_finite() && dt > 0.0;
        if !valid {
            return Err(Error::InvalidWindow { t_start, t_end, dt })
        }
        let timebase = self.timebases.resolve(&self.model, dt)?;

        let pre_trigger_time = (-t_start).max(0.0);
        let post_trigger_time = t_end.max(0.0);
        let sample_counts = |interval: f64| {
            let pre = (pre_trigger_time / interval).round() as u32;
            let post = (post_trigger_time / interval).round() as u32;
            (pre, post)
        };

        let (pre, post) = sample_counts(timebase.interval);
        let estimated = pre.saturating_add(post);
        if estimated == 0 {
            return Err(Error::InvalidWindow { t_start, t_end, dt })
        }
        let info = self.driver.timebase(timebase.index, estimated).map_err(status("timebase"))?;
        log::debug!("timebase({}, {}) = {:?}", timebase.index, estimated, info);

        let interval = info.interval_ns as f64 / 1e9;
        let (pre_trigger_samples, post_trigger_samples) = sample_counts(interval);
        let total = pre_trigger_samples as u64 + post_trigger_samples as u64;
        if total == 0 {
            return Err(Error::InvalidWindow { t_start, t_end, dt })
        }
        if total > info.max_samples as u64 {
            return Err(Error::TooManySamples { requested: total, maximum: info.max_samples })
        }
        Ok(CaptureWindow {
            pre_trigger_samples,
            post_trigger_samples,
            timebase_index: timebase.index,
            interval,
        })
    }

    /// Captures one block on every enabled channel.
    pub fn run_capture(&mut self, window: &CaptureWindow) -> Result<AcquisitionResult> {
        if let Some(trigger) = self.trigger.as_mut() {
            trigger.refresh(&mut self.driver, &self.registry)?;
        }
        self.capture.run(&mut self.driver, &self.registry, window, self.options.poll_interval)
    }

    /// Stops and closes the device, reporting any failure.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        if !self.open {
            return Ok(())
        }
        self.open = false;
        log::debug!("closing PicoScope {}", self.serial);
        let stopped = self.driver.stop().map_err(status("stop"));
        let closed = self.driver.close().map_err(status("close"));
        stopped.and(closed)
    }
}

impl<D: Driver> Drop for Device<D> {
    fn drop(&mut self) {
        if let Err(error) = self.shutdown() {
            log::error!("failed to close PicoScope {}: {}", self.serial, error);
        }
    }
}
