//! Implements a simple threshold trigger on a single channel.

use crate::{ChannelRegistry, Channel, Error, Range, Result, ThresholdDirection, TriggerConfig};
use crate::sys::Driver;

/// Converts a threshold in volts to ADC counts.
///
/// The threshold must lie strictly within the full scale of the range; a threshold at the
/// full scale itself could never be crossed.
pub(crate) fn quantize(threshold_volts: f64, full_scale_volts: f64, max_adc_count: i16)
        -> Result<i16> {
    check_threshold(threshold_volts, full_scale_volts)?;
    Ok((threshold_volts / full_scale_volts * max_adc_count as f64).round() as i16)
}

fn check_threshold(threshold_volts: f64, full_scale_volts: f64) -> Result<()> {
    if threshold_volts.abs() < full_scale_volts {
        Ok(())
    } else {
        Err(Error::ThresholdOutOfRange { threshold: threshold_volts, full_scale: full_scale_volts })
    }
}

/// A trigger as requested by the caller, along with what was last pushed to the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SimpleTrigger {
    threshold_volts: f64,
    /// Range of the trigger channel that `config.threshold_counts` was quantized against.
    range: Range,
    config: TriggerConfig,
}

impl SimpleTrigger {
    pub fn set<D: Driver>(driver: &mut D, registry: &ChannelRegistry, name: &str,
                          threshold_volts: f64, direction: &str, delay_samples: u32,
                          auto_trigger_ms: u16) -> Result<SimpleTrigger> {
        let channel = Channel::from_name(name)?;
        let direction = ThresholdDirection::from_name(direction)?;
        let range = registry.get(channel)?.range;
        let threshold_counts = Self::threshold_counts(driver, registry, range, threshold_volts)?;
        let trigger = SimpleTrigger {
            threshold_volts,
            range,
            config: TriggerConfig {
                channel,
                threshold_counts,
                direction,
                delay_samples,
                auto_trigger_ms,
            }
        };
        trigger.push(driver)?;
        Ok(trigger)
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    /// Re-quantizes and re-pushes the threshold if the trigger channel changed range since
    /// the trigger was set. A disabled trigger channel is left alone.
    pub fn refresh<D: Driver>(&mut self, driver: &mut D, registry: &ChannelRegistry)
            -> Result<()> {
        let config = registry.get(self.config.channel)?;
        if !config.enabled {
            log::warn!("trigger channel {:?} is disabled; the capture will only end on the \
                auto trigger", self.config.channel);
            return Ok(())
        }
        let range = config.range;
        if range == self.range {
            return Ok(())
        }
        log::debug!("trigger channel {:?} moved from {:?} to {:?}",
            self.config.channel, self.range, range);
        let threshold_counts =
            Self::threshold_counts(driver, registry, range, self.threshold_volts)?;
        let refreshed = SimpleTrigger {
            range,
            config: TriggerConfig { threshold_counts, ..self.config },
            ..*self
        };
        refreshed.push(driver)?;
        *self = refreshed;
        Ok(())
    }

    fn threshold_counts<D: Driver>(driver: &mut D, registry: &ChannelRegistry, range: Range,
                                   threshold_volts: f64) -> Result<i16> {
        let full_scale = registry.ranges().full_scale_volts(range)?;
        check_threshold(threshold_volts, full_scale)?;
        // can vary with resolution, so never cached
        let max_adc_count = driver.max_adc_count()
            .map_err(|status| Error::DeviceStatus { primitive: "max_adc_count", status })?;
        quantize(threshold_volts, full_scale, max_adc_count)
    }

    fn push<D: Driver>(&self, driver: &mut D) -> Result<()> {
        log::debug!("set_simple_trigger({:?})", self.config);
        driver.set_simple_trigger(&self.config)
            .map_err(|status| Error::DeviceStatus { primitive: "set_simple_trigger", status })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::VoltageRangeTable;
    use crate::sys::Status;
    use crate::sys::sim::{Call, Primitive, SimulatedDriver};

    fn setup() -> (ChannelRegistry, SimulatedDriver) {
        let mut driver = SimulatedDriver::new("2206B");
        let mut registry = ChannelRegistry::new(VoltageRangeTable::ps2000a());
        registry.configure(&mut driver, "A", true, "dc", 5.0, 0.0).unwrap();
        driver.clear_calls();
        (registry, driver)
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(2.0, 5.0, 32767).unwrap(), 13107);
        assert_eq!(quantize(-2.0, 5.0, 32767).unwrap(), -13107);
        assert_eq!(quantize(0.0, 5.0, 32767).unwrap(), 0);
        assert_eq!(quantize(4.9999, 5.0, 32767).unwrap(), 32766);
    }

    #[test]
    fn test_quantize_out_of_range() {
        assert!(matches!(quantize(5.0, 5.0, 32767), Err(Error::ThresholdOutOfRange { .. })));
        assert!(matches!(quantize(-5.0, 5.0, 32767), Err(Error::ThresholdOutOfRange { .. })));
        assert!(matches!(quantize(7.0, 5.0, 32767), Err(Error::ThresholdOutOfRange { .. })));
        assert!(matches!(quantize(f64::NAN, 5.0, 32767), Err(Error::ThresholdOutOfRange { .. })));
    }

    #[test]
    fn test_set() {
        let (registry, mut driver) = setup();
        let trigger = SimpleTrigger::set(&mut driver, &registry, "a", 2.0, "rising", 10, 1000)
            .unwrap();
        let expected = TriggerConfig {
            channel: Channel::A,
            threshold_counts: 13107,
            direction: ThresholdDirection::Rising,
            delay_samples: 10,
            auto_trigger_ms: 1000,
        };
        assert_eq!(trigger.config(), &expected);
        assert_eq!(driver.trigger(), Some(expected));
    }

    #[test]
    fn test_max_adc_count_queried_each_time() {
        let (registry, mut driver) = setup();
        SimpleTrigger::set(&mut driver, &registry, "A", 2.0, "rising", 0, 0).unwrap();
        driver.set_max_adc_count(32512);
        let trigger = SimpleTrigger::set(&mut driver, &registry, "A", 2.0, "rising", 0, 0)
            .unwrap();
        assert_eq!(trigger.config().threshold_counts, 13005);
        assert_eq!(driver.calls().iter().filter(|call| **call == Call::MaxAdcCount).count(), 2);
    }

    #[test]
    fn test_set_validation() {
        let (registry, mut driver) = setup();
        assert!(matches!(SimpleTrigger::set(&mut driver, &registry, "B", 1.0, "rising", 0, 0),
            Err(Error::ChannelNotConfigured(Channel::B))));
        assert!(matches!(SimpleTrigger::set(&mut driver, &registry, "A", 1.0, "sideways", 0, 0),
            Err(Error::InvalidDirection(_))));
        assert!(matches!(SimpleTrigger::set(&mut driver, &registry, "X", 1.0, "rising", 0, 0),
            Err(Error::InvalidChannel(_))));
        assert!(matches!(SimpleTrigger::set(&mut driver, &registry, "A", 5.0, "rising", 0, 0),
            Err(Error::ThresholdOutOfRange { .. })));
        assert!(driver.calls().is_empty());
        assert_eq!(driver.trigger(), None);
    }

    #[test]
    fn test_set_validation_precedence() {
        let (registry, mut driver) = setup();
        // channel name, then direction, then registry, then threshold
        assert!(matches!(SimpleTrigger::set(&mut driver, &registry, "X", 50.0, "sideways", 0, 0),
            Err(Error::InvalidChannel(_))));
        assert!(matches!(SimpleTrigger::set(&mut driver, &registry, "B", 50.0, "sideways", 0, 0),
            Err(Error::InvalidDirection(_))));
        assert!(matches!(SimpleTrigger::set(&mut driver, &registry, "A", 50.0, "sideways", 0, 0),
            Err(Error::InvalidDirection(_))));
        assert!(matches!(SimpleTrigger::set(&mut driver, &registry, "B", 50.0, "rising", 0, 0),
            Err(Error::ChannelNotConfigured(Channel::B))));
        assert!(driver.calls().is_empty());
    }

    #[test]
    fn test_set_device_failure() {
        let (registry, mut driver) = setup();
        driver.fail(Primitive::SetSimpleTrigger, Status::INVALID_PARAMETER);
        assert!(matches!(SimpleTrigger::set(&mut driver, &registry, "A", 1.0, "above", 0, 0),
            Err(Error::DeviceStatus { primitive: "set_simple_trigger", .. })));
    }

    #[test]
    fn test_refresh_after_range_change() {
        let (mut registry, mut driver) = setup();
        let mut trigger = SimpleTrigger::set(&mut driver, &registry, "A", 2.0, "falling", 0, 0)
            .unwrap();
        driver.clear_calls();
        trigger.refresh(&mut driver, &registry).unwrap();
        assert!(driver.calls().is_empty());

        registry.configure(&mut driver, "A", true, "dc", 10.0, 0.0).unwrap();
        trigger.refresh(&mut driver, &registry).unwrap();
        assert_eq!(trigger.config().threshold_counts, 6553);
        assert_eq!(driver.trigger().map(|config| config.threshold_counts), Some(6553));
    }

    #[test]
    fn test_refresh_disabled_channel() {
        let (mut registry, mut driver) = setup();
        registry.configure(&mut driver, "A", true, "dc", 10.0, 0.0).unwrap();
        let mut trigger = SimpleTrigger::set(&mut driver, &registry, "A", 2.0, "rising", 0, 0)
            .unwrap();
        registry.disable(&mut driver, "A").unwrap();
        driver.clear_calls();
        trigger.refresh(&mut driver, &registry).unwrap();
        assert!(driver.calls().is_empty());
        assert_eq!(trigger.config().threshold_counts, 6553);

        registry.configure(&mut driver, "A", true, "dc", 5.0, 0.0).unwrap();
        trigger.refresh(&mut driver, &registry).unwrap();
        assert_eq!(driver.trigger().map(|config| config.threshold_counts), Some(13107));
    }

    #[test]
    fn test_refresh_out_of_range() {
        let (mut registry, mut driver) = setup();
        let mut trigger = SimpleTrigger::set(&mut driver, &registry, "A", 2.0, "rising", 0, 0)
            .unwrap();
        registry.configure(&mut driver, "A", true, "dc", 1.0, 0.0).unwrap();
        assert!(matches!(trigger.refresh(&mut driver, &registry),
            Err(Error::ThresholdOutOfRange { .. })));
        assert_eq!(trigger.config().threshold_counts, 13107);
    }
}
