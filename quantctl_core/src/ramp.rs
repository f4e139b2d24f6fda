//! Soft-ramp helper: step a generator's amplitude/offset linearly from one
//! level to another instead of jumping, the same shape as `doser_core`'s
//! motor-speed ramping but driving `HardwareIo::configure_generator` instead
//! of a motor PWM duty cycle.

use quantctl_traits::clock::Clock;
use quantctl_traits::hardware::{HardwareIo, Waveform};
use tracing::warn;

use crate::constants::RAMP_MIN_STEPS;

/// Ramp output from `(from_amp, from_offset)` to `(to_amp, to_offset)` over
/// `ramp_ms`, taking at least `RAMP_MIN_STEPS` linear increments regardless
/// of duration.
///
/// Best-effort: if an intermediate `configure_generator` call fails, logs a
/// warning and writes the final target directly rather than aborting the
/// ramp outright. Returns the result of that final write.
pub fn soft_ramp<H: HardwareIo + ?Sized>(
    hw: &mut H,
    clock: &dyn Clock,
    waveform: Waveform,
    from_amp: f64,
    from_offset: f64,
    to_amp: f64,
    to_offset: f64,
    ramp_ms: u64,
) -> Result<(), quantctl_traits::hardware::HwIoError> {
    if ramp_ms == 0 {
        return hw.configure_generator(waveform, to_amp, to_offset);
    }

    let steps = RAMP_MIN_STEPS.max(1);
    let step_delay_ms = ramp_ms / u64::from(steps);
    let step_delay = std::time::Duration::from_millis(step_delay_ms);

    for i in 1..=steps {
        let t = f64::from(i) / f64::from(steps);
        let amp = from_amp + (to_amp - from_amp) * t;
        let offset = from_offset + (to_offset - from_offset) * t;
        if let Err(e) = hw.configure_generator(waveform, amp, offset) {
            warn!(error = %e, step = i, "soft ramp step failed, writing final target directly");
            return hw.configure_generator(waveform, to_amp, to_offset);
        }
        clock.sleep(step_delay);
    }

    Ok(())
}
