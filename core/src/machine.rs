//! Presence state machine
//!
//! One wake cycle runs `Sampling → (Unchanged | Reporting) → Arming`, then the
//! caller hands the chosen wake source to [`PresenceMachine::sleep`].
//!
//! The watchdog is armed on entry to every cycle because the countdown may not
//! survive deep sleep, and it is kicked before every report attempt: an
//! unreachable network keeps the loop spinning on a constant backoff, and
//! only a stuck join/resolve/send is allowed to run into the watchdog.

use core::convert::Infallible;

use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;
use hal_abstractions::{
    NetworkSession, PowerControl, PresenceIndicator, RetainedWord, Transport, WakeSource, Watchdog,
};

use crate::occupancy::OccupancyState;
use crate::reporter::Reporter;
use crate::retained::RetainedState;
use crate::wake::WakePolicy;

/// Countdown armed at the start of every cycle
pub const DEFAULT_WATCHDOG_TIMEOUT_MS: u32 = 20_000;
/// Constant pause between failed report attempts
pub const DEFAULT_RETRY_BACKOFF_MS: u32 = 500;

/// When a sampled state is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportMode {
    /// Only when it differs from the last reported state
    OnChange,
    /// On every wake, for boards without retained memory
    EveryWake,
}

/// Timing and policy knobs of the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MachineConfig {
    pub watchdog_timeout_ms: u32,
    pub retry_backoff_ms: u32,
    pub wake: WakePolicy,
    pub mode: ReportMode,
}

impl MachineConfig {
    pub const fn new(sensor_pin: u8) -> Self {
        Self {
            watchdog_timeout_ms: DEFAULT_WATCHDOG_TIMEOUT_MS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            wake: WakePolicy::new(sensor_pin),
            mode: ReportMode::OnChange,
        }
    }

    pub const fn with_watchdog_timeout(self, watchdog_timeout_ms: u32) -> Self {
        Self {
            watchdog_timeout_ms,
            ..self
        }
    }

    /// Whether an attempt bounded by `attempt_ms`, plus the backoff that
    /// follows a failure, ends before the watchdog expires
    ///
    /// The watchdog is kicked once per attempt, so a board must keep its
    /// network timeouts inside this window.
    pub const fn covers_attempt(&self, attempt_ms: u64) -> bool {
        attempt_ms + (self.retry_backoff_ms as u64) < self.watchdog_timeout_ms as u64
    }
}

/// What happened to the sampled state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleOutcome {
    /// Matched the last reported state; the radio stayed off
    Unchanged,
    /// Delivered after `attempts` tries
    Reported { attempts: u32, status: Option<u16> },
}

/// Result of one wake cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleSummary {
    pub state: OccupancyState,
    pub outcome: CycleOutcome,
    /// Wake source to arm for the next sleep
    pub wake: WakeSource,
}

pub struct PresenceMachine<'a, N, T, W, D, I> {
    config: MachineConfig,
    reporter: Reporter<'a, N, T>,
    watchdog: W,
    delay: D,
    indicator: I,
}

impl<'a, N, T, W, D, I> PresenceMachine<'a, N, T, W, D, I>
where
    N: NetworkSession,
    T: Transport,
    W: Watchdog,
    D: DelayNs,
    I: PresenceIndicator,
{
    pub fn new(
        config: MachineConfig,
        reporter: Reporter<'a, N, T>,
        watchdog: W,
        delay: D,
        indicator: I,
    ) -> Self {
        Self {
            config,
            reporter,
            watchdog,
            delay,
            indicator,
        }
    }

    /// Run one cycle from a fresh wake up to the choice of wake source
    ///
    /// Does not return until the state is delivered or no delivery is needed.
    pub async fn run_cycle<P, C>(
        &mut self,
        sensor: &mut P,
        retained: &mut RetainedState<C>,
    ) -> CycleSummary
    where
        P: InputPin<Error = Infallible>,
        C: RetainedWord,
    {
        self.watchdog.arm(self.config.watchdog_timeout_ms);

        let state = sample(sensor);
        self.indicator.show(state.is_occupied());
        let last = retained.last();
        info!("Sampled {}, last reported {}", state, last);

        let outcome = if self.config.mode == ReportMode::OnChange && !last.differs_from(state) {
            CycleOutcome::Unchanged
        } else {
            let (attempts, status) = self.report_until_delivered(state).await;
            retained.record(state);
            CycleOutcome::Reported { attempts, status }
        };

        let wake = self.config.wake.wake_for(state);
        CycleSummary {
            state,
            outcome,
            wake,
        }
    }

    async fn report_until_delivered(&mut self, state: OccupancyState) -> (u32, Option<u16>) {
        let mut attempts: u32 = 0;
        loop {
            attempts = attempts.saturating_add(1);
            self.watchdog.kick();
            match self.reporter.report(state).await {
                Ok(delivery) => {
                    info!("Reported {} after {} attempt(s)", state, attempts);
                    return (attempts, delivery.status);
                }
                Err(e) => {
                    warn!("Report attempt {} failed: {}", attempts, e);
                    self.delay.delay_ms(self.config.retry_backoff_ms).await;
                }
            }
        }
    }

    /// Enter deep sleep with `wake` armed
    ///
    /// Consumes the machine: nothing runs after this in the current boot.
    pub fn sleep<P: PowerControl>(self, power: &mut P, wake: WakeSource) -> ! {
        info!("Enter sleep, wake on {}", wake);
        power.deep_sleep(wake)
    }
}

fn sample<P: InputPin<Error = Infallible>>(sensor: &mut P) -> OccupancyState {
    match sensor.is_high() {
        Ok(high) => OccupancyState::from_level(high),
        Err(never) => match never {},
    }
}
