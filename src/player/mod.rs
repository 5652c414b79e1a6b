#![doc = r#"
Real time playback of a [`MidiDocument`](crate::MidiDocument).

- [`Scheduler`] is the playback core. It is driven by hand, one tick at a
  time, and fires events straight into an [`EventSink`].
- [`MidiPlayer`] runs a scheduler on its own thread against a
  [`ClockSource`], queueing fired events for the caller to
  [`dispatch`](MidiPlayer::dispatch).

```text
caller ── PlayerCommand ──► [ clock ─► Scheduler ─► ChannelSink ]  playback thread
caller ◄── dispatch ◄─────── PlaybackEvent queue ◄──────┘
```
"#]

mod clock;
pub use clock::*;

mod config;
pub use config::*;

mod scheduler;
pub use scheduler::*;

mod sink;
pub use sink::*;

mod thread;
pub use thread::*;
