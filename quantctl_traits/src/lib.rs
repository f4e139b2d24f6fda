#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Hardware and time abstractions used by the therapy/assessment core.
//!
//! - `hardware::HardwareIo` is the capability bundle the core drives: a two-channel
//!   generator + oscilloscope. It has no knowledge of USB/serial/GPIB transports.
//! - `clock` offers a `MonotonicClock` for real timing and a deterministic `TestClock`
//!   for tests, so ramps and ticks never depend on wall-clock sleeps in unit tests.
//!
//! `quantctl_core` depends only on these traits, which keeps it free of any concrete
//! transport dependency; `quantctl_hardware` is where the transports live.
pub mod clock;
pub mod hardware;

pub use clock::{Clock, MonotonicClock};
pub use clock::test_clock::TestClock;
pub use hardware::{HardwareIo, HwIoError, OutputMode, Waveform};
