use std::time::Duration;

use crate::PlayerError;

/// Settings for a [`MidiPlayer`](crate::MidiPlayer) thread.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerConfig {
    /// Wait between ticks while playing (default: 1 ms)
    pub tick_interval: Duration,
    /// Wait between checks while paused or stopped (default: 10 ms)
    pub idle_interval: Duration,
    /// Fired events buffered for [`MidiPlayer::dispatch`](crate::MidiPlayer::dispatch)
    /// before new ones are dropped (default: 4096)
    pub event_capacity: usize,
    /// Control calls buffered before callers block (default: 64)
    pub command_capacity: usize,
    /// Name of the playback thread (default: `smfplay-playback`)
    pub thread_name: String,
    /// Restart when every track has finished (default: false)
    pub looping: bool,
    /// Playback rate, 2.0 plays twice as fast (default: 1.0)
    pub speed_scale: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(1),
            idle_interval: Duration::from_millis(10),
            event_capacity: 4096,
            command_capacity: 64,
            thread_name: "smfplay-playback".into(),
            looping: false,
            speed_scale: 1.0,
        }
    }
}

impl PlayerConfig {
    /// Set the wait between ticks
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the wait between checks while idle
    pub fn with_idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval;
        self
    }

    /// Set the event queue capacity
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Set the command queue capacity
    pub fn with_command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity;
        self
    }

    /// Set the thread name
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Start with looping on or off
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Start at this playback rate
    pub fn with_speed_scale(mut self, speed_scale: f64) -> Self {
        self.speed_scale = speed_scale;
        self
    }

    /// Check every value is usable.
    ///
    /// # Errors
    /// [`PlayerError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), PlayerError> {
        if self.tick_interval.is_zero() {
            return Err(PlayerError::InvalidConfig("tick_interval must be positive".into()));
        }
        if self.idle_interval < self.tick_interval {
            return Err(PlayerError::InvalidConfig(
                "idle_interval must not be shorter than tick_interval".into(),
            ));
        }
        if self.event_capacity == 0 || self.command_capacity == 0 {
            return Err(PlayerError::InvalidConfig("queue capacities must be positive".into()));
        }
        if self.thread_name.is_empty() {
            return Err(PlayerError::InvalidConfig("thread_name is empty".into()));
        }
        if !(self.speed_scale.is_finite() && self.speed_scale > 0.) {
            return Err(PlayerError::InvalidConfig(format!(
                "speed_scale {} must be finite and positive",
                self.speed_scale
            )));
        }
        Ok(())
    }
}

#[test]
fn default_config_is_valid() {
    let config = PlayerConfig::default();
    assert_eq!(config.tick_interval, Duration::from_millis(1));
    assert_eq!(config.event_capacity, 4096);
    assert_eq!(config.thread_name, "smfplay-playback");
    assert!(config.validate().is_ok());
}

#[test]
fn rejects_bad_values() {
    let config = PlayerConfig::default().with_speed_scale(0.);
    assert!(matches!(config.validate(), Err(PlayerError::InvalidConfig(_))));

    let config = PlayerConfig::default().with_tick_interval(Duration::ZERO);
    assert!(config.validate().is_err());

    let config = PlayerConfig::default()
        .with_tick_interval(Duration::from_millis(20))
        .with_idle_interval(Duration::from_millis(5));
    assert!(config.validate().is_err());

    let config = PlayerConfig::default().with_event_capacity(0);
    assert!(config.validate().is_err());
}
