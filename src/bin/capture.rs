use picoblock::{Channel, Device, SessionOptions};
use picoblock::sys::sim::{Signal, SimulatedDriver};

fn main() -> picoblock::Result<()> {
    env_logger::init();
    let driver = SimulatedDriver::new("2206B")
        .with_signal(Channel::A, Signal::Sine { amplitude: 16000, period: 50 })
        .with_signal(Channel::B, Signal::Constant(-3000));
    Device::with(driver, None, SessionOptions::default(), |device| {
        println!("opened PicoScope {} (serial {})", device.model(), device.serial());
        device.configure_channel("A", true, "dc", 5.0, 0.0)?;
        device.configure_channel("B", true, "dc", 5.0, 0.0)?;
        device.set_trigger("A", 2.0, "RISING", 0, 1000)?;
        let window = device.resolve_capture_window(-0.2, 0.2, 0.001)?;
        println!("capturing {} + {} samples at timebase {} ({} s per sample)",
            window.pre_trigger_samples, window.post_trigger_samples,
            window.timebase_index, window.interval);
        let result = device.run_capture(&window)?;
        for trace in result.traces.iter() {
            let (min, max) = trace.volts.iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &volts| {
                    (min.min(volts), max.max(volts))
                });
            println!("channel {}: {} samples, {:.3} V to {:.3} V{}",
                trace.label, trace.volts.len(), min, max,
                if trace.overflowed { " (overflowed)" } else { "" });
        }
        Ok(())
    })
}
