//! Dead-man detection for a telemetry source.
//!
//! Simulators keep streaming packets while paused or sitting in menus, so
//! "a packet arrived" is not enough to call a session active. A
//! [`LivenessPolicy`] decides which packets qualify; qualifying packets renew a
//! [`LivenessTimer`], and when the timer runs out the session goes inactive.
//!
//! The monitor is driven from the same task that mutates the status, so there is
//! never a race over who touched the status last:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         recv = socket.recv(&mut buf) => {
//!             let packet = decode(&buf[..recv?])?;
//!             if monitor.observe(&packet) {
//!                 aggregator.activate();
//!             }
//!             publish(aggregator.update(&packet));
//!         }
//!         event = monitor.expired() => match event {
//!             TimerEvent::Expired => publish(aggregator.deactivate()),
//!             TimerEvent::Cancelled => break,
//!         },
//!     }
//! }
//! ```

use std::fmt;
use std::pin::Pin;
use std::str::FromStr;
use std::time::Duration;

use rallydash_telemetry_codemasters::Telemetry;
use tokio::time::{Instant, Sleep};
use tokio_util::sync::CancellationToken;

use crate::ParseSettingError;

/// Window after the last qualifying packet before the session goes inactive.
pub const DEFAULT_LIVENESS_WINDOW: Duration = Duration::from_secs(5);

/// Which packets count as proof that someone is driving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LivenessPolicy {
    /// Lap time, lap distance, steering, throttle, brake or clutch changed since
    /// the previous packet.
    #[default]
    FieldDiff,
    /// Throttle or speed is non-zero.
    Motion,
}

impl LivenessPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FieldDiff => "field-diff",
            Self::Motion => "motion",
        }
    }
}

impl fmt::Display for LivenessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LivenessPolicy {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "field-diff" | "diff" => Ok(Self::FieldDiff),
            "motion" => Ok(Self::Motion),
            _ => Err(ParseSettingError {
                setting: "liveness policy",
                value: s.to_string(),
                expected: "field-diff, motion",
            }),
        }
    }
}

/// The packet fields liveness policies look at.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LivenessSample {
    pub lap_time: f32,
    pub lap_distance: f32,
    pub steering: f32,
    pub throttle: f32,
    pub brake: f32,
    pub clutch: f32,
    pub speed: f32,
}

impl LivenessSample {
    pub fn from_telemetry<T: Telemetry + ?Sized>(telemetry: &T) -> Self {
        Self {
            lap_time: telemetry.lap_time(),
            lap_distance: telemetry.lap_distance(),
            steering: telemetry.steering(),
            throttle: telemetry.throttle(),
            brake: telemetry.brake(),
            clutch: telemetry.clutch(),
            speed: telemetry.speed(),
        }
    }

    /// Bitwise comparison of the diffed fields; a repeated NaN is not a change.
    fn differs_from(&self, other: &Self) -> bool {
        let pairs = [
            (self.lap_time, other.lap_time),
            (self.lap_distance, other.lap_distance),
            (self.steering, other.steering),
            (self.throttle, other.throttle),
            (self.brake, other.brake),
            (self.clutch, other.clutch),
        ];
        pairs.iter().any(|(a, b)| a.to_bits() != b.to_bits())
    }

    fn in_motion(&self) -> bool {
        self.throttle.abs() > 0.0 || self.speed.abs() > 0.0
    }
}

/// Applies a [`LivenessPolicy`] to a stream of packets.
#[derive(Debug, Clone)]
pub struct LivenessTracker {
    policy: LivenessPolicy,
    previous: LivenessSample,
}

impl LivenessTracker {
    pub fn new(policy: LivenessPolicy) -> Self {
        Self {
            policy,
            previous: LivenessSample::default(),
        }
    }

    pub fn policy(&self) -> LivenessPolicy {
        self.policy
    }

    /// Record a packet and report whether it qualifies.
    ///
    /// The first packet is compared against an all-zero sample.
    pub fn observe<T: Telemetry + ?Sized>(&mut self, telemetry: &T) -> bool {
        let sample = LivenessSample::from_telemetry(telemetry);
        let qualifies = match self.policy {
            LivenessPolicy::FieldDiff => sample.differs_from(&self.previous),
            LivenessPolicy::Motion => sample.in_motion(),
        };
        self.previous = sample;
        qualifies
    }
}

/// Outcome of waiting on a [`LivenessTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Expired,
    Cancelled,
}

/// One-shot resettable deadline.
///
/// A disarmed timer never expires; waiting on it only returns once the
/// cancellation token fires. Expiry disarms the timer until the next reset.
#[derive(Debug)]
pub struct LivenessTimer {
    window: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
    cancel: CancellationToken,
}

impl LivenessTimer {
    pub fn new(window: Duration, cancel: CancellationToken) -> Self {
        Self {
            window,
            sleep: None,
            cancel,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_armed(&self) -> bool {
        self.sleep.is_some()
    }

    /// Arm the timer to fire `duration` from now. Must run inside a Tokio runtime.
    pub fn reset(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        match self.sleep.as_mut() {
            Some(sleep) => sleep.as_mut().reset(deadline),
            None => self.sleep = Some(Box::pin(tokio::time::sleep_until(deadline))),
        }
    }

    /// Re-arm for the configured window.
    pub fn renew(&mut self) {
        self.reset(self.window);
    }

    pub fn disarm(&mut self) {
        self.sleep = None;
    }

    /// Wait for expiry or cancellation. Cancel safe: dropping the future leaves
    /// the deadline untouched.
    pub async fn expired(&mut self) -> TimerEvent {
        let Some(sleep) = self.sleep.as_mut() else {
            self.cancel.cancelled().await;
            return TimerEvent::Cancelled;
        };

        let fired = tokio::select! {
            biased;
            () = self.cancel.cancelled() => false,
            () = sleep.as_mut() => true,
        };

        if fired {
            self.sleep = None;
            TimerEvent::Expired
        } else {
            TimerEvent::Cancelled
        }
    }
}

/// Policy tracking plus the dead-man timer for one telemetry source.
#[derive(Debug)]
pub struct LivenessMonitor {
    tracker: LivenessTracker,
    timer: LivenessTimer,
}

impl LivenessMonitor {
    pub fn new(policy: LivenessPolicy, window: Duration, cancel: CancellationToken) -> Self {
        Self {
            tracker: LivenessTracker::new(policy),
            timer: LivenessTimer::new(window, cancel),
        }
    }

    pub fn policy(&self) -> LivenessPolicy {
        self.tracker.policy()
    }

    pub fn window(&self) -> Duration {
        self.timer.window()
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_armed()
    }

    /// Feed a packet; qualifying packets renew the window. Returns whether the
    /// packet qualified.
    pub fn observe<T: Telemetry + ?Sized>(&mut self, telemetry: &T) -> bool {
        let qualifies = self.tracker.observe(telemetry);
        if qualifies {
            self.timer.renew();
        }
        qualifies
    }

    pub async fn expired(&mut self) -> TimerEvent {
        self.timer.expired().await
    }

    /// Stop the timer without firing.
    pub fn stop(&mut self) {
        self.timer.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Fake {
        lap_time: f32,
        steering: f32,
        throttle: f32,
        speed: f32,
    }

    impl Telemetry for Fake {
        fn steering(&self) -> f32 {
            self.steering
        }
        fn throttle(&self) -> f32 {
            self.throttle
        }
        fn brake(&self) -> f32 {
            0.0
        }
        fn clutch(&self) -> f32 {
            0.0
        }
        fn handbrake(&self) -> f32 {
            0.0
        }
        fn gear(&self) -> i32 {
            0
        }
        fn rpm(&self) -> f32 {
            0.0
        }
        fn max_rpm(&self) -> f32 {
            0.0
        }
        fn speed(&self) -> f32 {
            self.speed
        }
        fn stage_distance(&self) -> f32 {
            0.0
        }
        fn lap_time(&self) -> f32 {
            self.lap_time
        }
        fn lap_distance(&self) -> f32 {
            0.0
        }
    }

    #[test]
    fn field_diff_ignores_duplicates() {
        let mut tracker = LivenessTracker::new(LivenessPolicy::FieldDiff);
        let packet = Fake {
            lap_time: 1.0,
            steering: 0.2,
            ..Default::default()
        };
        assert!(tracker.observe(&packet));
        assert!(!tracker.observe(&packet));
        assert!(!tracker.observe(&packet));
    }

    #[test]
    fn field_diff_first_zero_packet_does_not_qualify() {
        let mut tracker = LivenessTracker::new(LivenessPolicy::FieldDiff);
        assert!(!tracker.observe(&Fake::default()));
    }

    #[test]
    fn field_diff_ignores_speed_only_changes() {
        let mut tracker = LivenessTracker::new(LivenessPolicy::FieldDiff);
        assert!(!tracker.observe(&Fake {
            speed: 10.0,
            ..Default::default()
        }));
    }

    #[test]
    fn field_diff_treats_repeated_nan_as_unchanged() {
        let mut tracker = LivenessTracker::new(LivenessPolicy::FieldDiff);
        let packet = Fake {
            steering: f32::NAN,
            ..Default::default()
        };
        assert!(tracker.observe(&packet));
        assert!(!tracker.observe(&packet));
    }

    #[test]
    fn motion_policy_needs_throttle_or_speed() {
        let mut tracker = LivenessTracker::new(LivenessPolicy::Motion);
        assert!(!tracker.observe(&Fake {
            steering: 0.5,
            ..Default::default()
        }));
        let rolling = Fake {
            speed: 3.0,
            ..Default::default()
        };
        assert!(tracker.observe(&rolling));
        assert!(tracker.observe(&rolling));
    }

    #[test]
    fn policy_parses_from_text() {
        assert_eq!("field-diff".parse(), Ok(LivenessPolicy::FieldDiff));
        assert_eq!("FIELD_DIFF".parse(), Ok(LivenessPolicy::FieldDiff));
        assert_eq!(" motion ".parse(), Ok(LivenessPolicy::Motion));
        assert!("always".parse::<LivenessPolicy>().is_err());
        assert_eq!(LivenessPolicy::Motion.to_string(), "motion");
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_once_after_window() {
        let mut timer = LivenessTimer::new(Duration::from_secs(5), CancellationToken::new());
        timer.renew();
        let start = Instant::now();

        assert_eq!(timer.expired().await, TimerEvent::Expired);
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert!(!timer.is_armed());

        let second = tokio::time::timeout(Duration::from_secs(60), timer.expired()).await;
        assert!(second.is_err(), "disarmed timer must not fire again");
    }

    #[tokio::test(start_paused = true)]
    async fn reset_pushes_deadline_out() {
        let mut timer = LivenessTimer::new(Duration::from_secs(5), CancellationToken::new());
        timer.renew();
        tokio::time::advance(Duration::from_secs(4)).await;
        timer.renew();
        let start = Instant::now();

        assert_eq!(timer.expired().await, TimerEvent::Expired);
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_wins_over_pending_deadline() {
        let cancel = CancellationToken::new();
        let mut timer = LivenessTimer::new(Duration::from_secs(5), cancel.clone());
        timer.renew();
        cancel.cancel();
        assert_eq!(timer.expired().await, TimerEvent::Cancelled);
        assert!(timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn disarmed_timer_waits_for_cancellation() {
        let cancel = CancellationToken::new();
        let mut timer = LivenessTimer::new(Duration::from_secs(1), cancel.clone());
        let waiter = tokio::spawn(async move { timer.expired().await });
        tokio::time::sleep(Duration::from_secs(30)).await;
        cancel.cancel();
        assert_eq!(waiter.await.ok(), Some(TimerEvent::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn monitor_renews_only_on_qualifying_packets() {
        let mut monitor = LivenessMonitor::new(
            LivenessPolicy::FieldDiff,
            Duration::from_secs(5),
            CancellationToken::new(),
        );
        assert!(!monitor.is_armed());

        let moving = Fake {
            lap_time: 3.0,
            ..Default::default()
        };
        assert!(monitor.observe(&moving));
        assert!(monitor.is_armed());

        tokio::time::advance(Duration::from_secs(3)).await;
        // Duplicate: must not push the deadline out.
        assert!(!monitor.observe(&moving));
        let start = Instant::now();
        assert_eq!(monitor.expired().await, TimerEvent::Expired);
        assert!(start.elapsed() < Duration::from_secs(3));
    }
}
