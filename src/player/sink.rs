use crossbeam_channel::{Sender, TrySendError};

use crate::event::Event;

#[doc = r#"
Receives playback notifications.

Calls are never concurrent with each other. A [`Scheduler`](crate::Scheduler)
calls its sink from whatever thread drives it, and a
[`MidiPlayer`](crate::MidiPlayer) calls it from
[`dispatch`](crate::MidiPlayer::dispatch) on the caller's thread.

Closures taking `(time_usec, track, &Event)` are sinks.

# Example
```rust
# use smfplay::prelude::*;
let mut notes = 0;
let mut sink = |_time: f64, _track: usize, event: &Event| {
    if matches!(event, Event::Note(_)) {
        notes += 1;
    }
};
# sink.on_event(0., 0, &Event::System(SystemEvent { kind: SystemKind::Start, delta_ticks: 0 }));
```
"#]
pub trait EventSink {
    /// An event came due. `time_usec` is when it was due, not when it fired.
    fn on_event(&mut self, time_usec: f64, track: usize, event: &Event);
    /// Every track finished and playback restarted
    fn on_loop(&mut self) {}
    /// Every track finished and playback stopped
    fn on_finished(&mut self) {}
}

impl<F> EventSink for F
where
    F: FnMut(f64, usize, &Event),
{
    fn on_event(&mut self, time_usec: f64, track: usize, event: &Event) {
        self(time_usec, track, event)
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&mut self, _time_usec: f64, _track: usize, _event: &Event) {}
}

/// A notification, owned so it can cross threads
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// See [`EventSink::on_event`]
    Event {
        /// When the event was due, in microseconds
        time_usec: f64,
        /// Track index
        track: usize,
        /// The event
        event: Event,
    },
    /// See [`EventSink::on_loop`]
    Looped,
    /// See [`EventSink::on_finished`]
    Finished,
}

impl PlaybackEvent {
    /// Deliver to `sink`
    pub fn deliver(&self, sink: &mut impl EventSink) {
        match self {
            Self::Event {
                time_usec,
                track,
                event,
            } => sink.on_event(*time_usec, *track, event),
            Self::Looped => sink.on_loop(),
            Self::Finished => sink.on_finished(),
        }
    }
}

/// Forwards notifications over a bounded channel without blocking.
///
/// When the channel is full the notification is dropped and counted.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<PlaybackEvent>,
    dropped: u64,
}

impl ChannelSink {
    /// Forward into `sender`
    pub fn new(sender: Sender<PlaybackEvent>) -> Self {
        Self { sender, dropped: 0 }
    }

    /// Notifications lost to a full channel
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    fn push(&mut self, event: PlaybackEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.dropped += 1;
                tracing::warn!("Event queue full, dropped {event:?}");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!("Event queue receiver is gone");
            }
        }
    }
}

impl EventSink for ChannelSink {
    fn on_event(&mut self, time_usec: f64, track: usize, event: &Event) {
        self.push(PlaybackEvent::Event {
            time_usec,
            track,
            event: event.clone(),
        });
    }
    fn on_loop(&mut self) {
        self.push(PlaybackEvent::Looped);
    }
    fn on_finished(&mut self) {
        self.push(PlaybackEvent::Finished);
    }
}

/// An event recorded by an [`EventLog`]
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedEvent {
    /// When the event was due, in microseconds
    pub time_usec: f64,
    /// Track index
    pub track: usize,
    /// The event
    pub event: Event,
}

/// Records everything it receives
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    /// Fired events, in order
    pub events: Vec<LoggedEvent>,
    /// Times playback looped
    pub loops: usize,
    /// Times playback finished
    pub finished: usize,
}

impl EventLog {
    /// Number of fired events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if no event fired
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Fired events of one track
    pub fn track(&self, track: usize) -> impl Iterator<Item = &LoggedEvent> {
        self.events.iter().filter(move |e| e.track == track)
    }

    /// Forget everything
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl EventSink for EventLog {
    fn on_event(&mut self, time_usec: f64, track: usize, event: &Event) {
        self.events.push(LoggedEvent {
            time_usec,
            track,
            event: event.clone(),
        });
    }
    fn on_loop(&mut self) {
        self.loops += 1;
    }
    fn on_finished(&mut self) {
        self.finished += 1;
    }
}

#[cfg(test)]
fn clock_tick() -> Event {
    Event::System(crate::event::SystemEvent {
        kind: crate::event::SystemKind::TimingClock,
        delta_ticks: 0,
    })
}

#[test]
fn channel_sink_drops_when_full() {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let mut sink = ChannelSink::new(tx);
    sink.on_event(0., 0, &clock_tick());
    sink.on_finished();
    assert_eq!(sink.dropped(), 1);

    let mut log = EventLog::default();
    for event in rx.try_iter() {
        event.deliver(&mut log);
    }
    assert_eq!(log.len(), 1);
    assert_eq!(log.finished, 0);
}

#[test]
fn closures_are_sinks() {
    let mut seen = Vec::new();
    {
        let mut sink = |time: f64, track: usize, _: &Event| seen.push((time, track));
        sink.on_event(10., 1, &clock_tick());
        sink.on_loop();
    }
    assert_eq!(seen, vec![(10., 1)]);
}
