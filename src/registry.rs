use crate::{Channel, ChannelConfig, Coupling, Error, Result, VoltageRangeTable};
use crate::sys::Driver;

/// Current configuration of every channel that has been configured at least once.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRegistry {
    ranges: VoltageRangeTable,
    channels: [Option<ChannelConfig>; 4],
}

impl ChannelRegistry {
    pub fn new(ranges: VoltageRangeTable) -> ChannelRegistry {
        ChannelRegistry { ranges, channels: Default::default() }
    }

    pub fn ranges(&self) -> &VoltageRangeTable {
        &self.ranges
    }

    /// Configures a channel on the device and records it.
    ///
    /// All arguments are validated before the device is touched, and nothing is recorded
    /// unless the device accepts the configuration.
    pub fn configure<D: Driver>(&mut self, driver: &mut D, name: &str, enabled: bool,
                                coupling: &str, max_volts: f64, offset: f32) -> Result<()> {
        let channel = Channel::from_name(name)?;
        let coupling = Coupling::from_name(coupling)?;
        let range = self.ranges.range_for_max_voltage(max_volts)?;
        self.apply(driver, ChannelConfig {
            channel,
            enabled,
            coupling,
            range,
            offset,
            label: name.to_owned(),
        })
    }

    /// Disables a previously configured channel.
    pub fn disable<D: Driver>(&mut self, driver: &mut D, name: &str) -> Result<()> {
        let channel = Channel::from_name(name)?;
        self.get(channel)?;
        self.apply(driver, ChannelConfig::disabled(channel, name.to_owned()))
    }

    pub fn get(&self, channel: Channel) -> Result<&ChannelConfig> {
        self.channels[channel.index()].as_ref()
            .ok_or(Error::ChannelNotConfigured(channel))
    }

    /// Configurations of enabled channels, in channel order.
    pub fn enabled(&self) -> impl Iterator<Item = &ChannelConfig> {
        self.channels.iter().flatten().filter(|config| config.enabled)
    }

    fn apply<D: Driver>(&mut self, driver: &mut D, config: ChannelConfig) -> Result<()> {
        log::debug!("set_channel({:?})", config);
        driver.set_channel(config.channel, config.enabled, config.coupling, config.range,
                config.offset)
            .map_err(|status| Error::DeviceStatus { primitive: "set_channel", status })?;
        let index = config.channel.index();
        self.channels[index] = Some(config);
        Ok(())
    }
}
