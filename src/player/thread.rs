use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU8, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use atomic_float::AtomicF64;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use parking_lot::Mutex;

use crate::{
    PlayerError,
    file::MidiDocument,
    player::{
        ChannelSink, ClockSource, EventSink, PlaybackEvent, PlayerConfig, PlayerState, Scheduler,
        SystemClock,
    },
};

/// Control messages for the playback thread
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    /// Replace the document and stop
    Load(Arc<MidiDocument>),
    /// [`Scheduler::play`]
    Play,
    /// [`Scheduler::stop`]
    Stop,
    /// [`Scheduler::pause`]
    Pause,
    /// [`Scheduler::resume`]
    Resume,
    /// [`Scheduler::set_loop`]
    SetLoop(bool),
    /// [`Scheduler::set_speed_scale`]
    SetSpeedScale(f64),
    /// [`Scheduler::set_current_time`]
    Seek(f64),
    /// Leave the loop
    Shutdown,
}

/// Control calls the playback thread has not applied yet
#[derive(Debug, Default)]
struct Queued {
    commands: usize,
    loaded: bool,
}

#[doc = r#"
Values the playback thread publishes after every tick.

A control call publishes the outcome it expects before it is queued.
While any control call is queued the thread leaves the values alone, and
applying the last one publishes what the scheduler actually did.
"#]
#[derive(Debug)]
struct Published {
    state: AtomicU8,
    time: AtomicF64,
    looping: AtomicBool,
    speed_scale: AtomicF64,
    queued: Mutex<Queued>,
}

impl Published {
    fn new(config: &PlayerConfig) -> Self {
        Self {
            state: AtomicU8::new(PlayerState::Stopped.into()),
            time: AtomicF64::new(0.),
            looping: AtomicBool::new(config.looping),
            speed_scale: AtomicF64::new(config.speed_scale),
            queued: Mutex::new(Queued::default()),
        }
    }

    fn state(&self) -> PlayerState {
        PlayerState::try_from(self.state.load(Ordering::Acquire)).unwrap_or_default()
    }

    fn set_state(&self, state: PlayerState) {
        self.state.store(state.into(), Ordering::Release);
    }

    fn rewound(&self, state: PlayerState) {
        self.set_state(state);
        self.time.store(0., Ordering::Release);
    }

    /// Publish what `command` will do once the thread applies it
    fn expect(&self, command: &PlayerCommand) {
        let mut queued = self.queued.lock();
        queued.commands += 1;
        match *command {
            PlayerCommand::Load(_) => {
                queued.loaded = true;
                self.rewound(PlayerState::Stopped);
            }
            PlayerCommand::Play if queued.loaded => self.rewound(PlayerState::Playing),
            PlayerCommand::Stop => self.rewound(PlayerState::Stopped),
            PlayerCommand::Pause if self.state() == PlayerState::Playing => {
                self.set_state(PlayerState::Paused);
            }
            PlayerCommand::Resume if self.state() == PlayerState::Paused => {
                self.set_state(PlayerState::Playing);
            }
            PlayerCommand::SetLoop(looping) => self.looping.store(looping, Ordering::Release),
            PlayerCommand::SetSpeedScale(speed) if speed.is_finite() && speed > 0. => {
                self.speed_scale.store(speed, Ordering::Release);
            }
            PlayerCommand::Seek(seconds) if queued.loaded => {
                let target = if seconds.is_finite() { seconds.max(0.) } else { 0. };
                self.time.store(target, Ordering::Release);
                if self.state() == PlayerState::Stopped {
                    self.set_state(PlayerState::Paused);
                }
            }
            _ => {}
        }
    }

    /// The command behind the last [`expect`](Self::expect) never reached the thread
    fn retract(&self) {
        let mut queued = self.queued.lock();
        queued.commands = queued.commands.saturating_sub(1);
        self.set_state(PlayerState::Stopped);
    }

    fn publish(&self, scheduler: &Scheduler) {
        self.set_state(scheduler.state());
        self.time.store(scheduler.current_time(), Ordering::Release);
        self.looping.store(scheduler.looping(), Ordering::Release);
        self.speed_scale
            .store(scheduler.speed_scale(), Ordering::Release);
    }

    /// After a tick
    fn store(&self, scheduler: &Scheduler) {
        let queued = self.queued.lock();
        if queued.commands == 0 {
            self.publish(scheduler);
        }
    }

    /// After the thread applied one control command
    fn applied(&self, scheduler: &Scheduler) {
        let mut queued = self.queued.lock();
        queued.commands = queued.commands.saturating_sub(1);
        if queued.commands == 0 {
            self.publish(scheduler);
        }
    }

    /// The thread is leaving. Whatever is still queued will never apply.
    fn exit(&self, scheduler: &Scheduler) {
        let mut queued = self.queued.lock();
        queued.commands = 0;
        self.publish(scheduler);
    }

    fn caught_up(&self) -> bool {
        self.queued.lock().commands == 0
    }
}

#[doc = r#"
Plays a document on its own thread.

The thread owns a [`Scheduler`] and drives it from a [`ClockSource`].
Control calls are queued to it and take effect within one tick. The
getters reflect a control call as soon as it returns, and show what the
thread last published otherwise. Fired
events are queued back, and [`dispatch`](Self::dispatch) hands them to a
sink on the calling thread, so the sink never runs on the playback thread.

Dropping the player stops the thread.

# Example
```rust,no_run
# use smfplay::prelude::*;
# fn main() -> Result<(), Box<dyn std::error::Error>> {
let document = MidiDocument::load("song.mid")?;
let player = MidiPlayer::spawn(PlayerConfig::default())?;
player.load(document)?;
player.play()?;

let mut log = EventLog::default();
while player.state() != PlayerState::Stopped {
    player.dispatch(&mut log);
    std::thread::sleep(std::time::Duration::from_millis(16));
}
player.dispatch(&mut log);
# Ok(())
# }
```
"#]
#[derive(Debug)]
pub struct MidiPlayer {
    commands: Sender<PlayerCommand>,
    events: Receiver<PlaybackEvent>,
    published: Arc<Published>,
    shutdown: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl MidiPlayer {
    /// Start a playback thread timed by wall clock
    ///
    /// # Errors
    /// [`PlayerError::InvalidConfig`] or [`PlayerError::Spawn`].
    pub fn spawn(config: PlayerConfig) -> Result<Self, PlayerError> {
        Self::with_clock(config, SystemClock::new())
    }

    /// Start a playback thread timed by `clock`
    ///
    /// # Errors
    /// [`PlayerError::InvalidConfig`] or [`PlayerError::Spawn`].
    pub fn with_clock(config: PlayerConfig, clock: impl ClockSource) -> Result<Self, PlayerError> {
        config.validate()?;
        let (command_tx, command_rx) = bounded(config.command_capacity);
        let (event_tx, event_rx) = bounded(config.event_capacity);
        let published = Arc::new(Published::new(&config));
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut scheduler = Scheduler::new();
        scheduler.set_loop(config.looping);
        scheduler.set_speed_scale(config.speed_scale);

        let worker = Worker {
            scheduler,
            clock,
            commands: command_rx,
            sink: ChannelSink::new(event_tx),
            published: Arc::clone(&published),
            shutdown: Arc::clone(&shutdown),
            tick_interval: config.tick_interval,
            idle_interval: config.idle_interval,
        };
        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || worker.run())?;
        tracing::debug!("Spawned playback thread {}", config.thread_name);

        Ok(Self {
            commands: command_tx,
            events: event_rx,
            published,
            shutdown,
            handle: Mutex::new(Some(handle)),
        })
    }

    fn send(&self, command: PlayerCommand) -> Result<(), PlayerError> {
        self.published.expect(&command);
        self.commands.send(command).map_err(|_| {
            self.published.retract();
            PlayerError::Disconnected
        })
    }

    /// Replace the document. Playback stops.
    pub fn load(&self, document: impl Into<Arc<MidiDocument>>) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Load(document.into()))
    }

    /// See [`Scheduler::play`]
    pub fn play(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Play)
    }

    /// See [`Scheduler::stop`]
    pub fn stop(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Stop)
    }

    /// See [`Scheduler::pause`]
    pub fn pause(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Pause)
    }

    /// See [`Scheduler::resume`]
    pub fn resume(&self) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Resume)
    }

    /// See [`Scheduler::set_loop`]
    pub fn set_loop(&self, looping: bool) -> Result<(), PlayerError> {
        self.send(PlayerCommand::SetLoop(looping))
    }

    /// See [`Scheduler::set_speed_scale`]
    pub fn set_speed_scale(&self, speed_scale: f64) -> Result<(), PlayerError> {
        self.send(PlayerCommand::SetSpeedScale(speed_scale))
    }

    /// See [`Scheduler::set_current_time`]
    pub fn set_current_time(&self, seconds: f64) -> Result<(), PlayerError> {
        self.send(PlayerCommand::Seek(seconds))
    }

    /// Where playback is, counting control calls not yet applied
    pub fn state(&self) -> PlayerState {
        self.published.state()
    }

    /// Playback time in seconds
    pub fn current_time(&self) -> f64 {
        self.published.time.load(Ordering::Acquire)
    }

    /// True if playback restarts at the end
    pub fn looping(&self) -> bool {
        self.published.looping.load(Ordering::Acquire)
    }

    /// The playback rate
    pub fn speed_scale(&self) -> f64 {
        self.published.speed_scale.load(Ordering::Acquire)
    }

    /// True once the thread has applied every control call made so far
    pub fn caught_up(&self) -> bool {
        self.published.caught_up()
    }

    /// Hand every queued notification to `sink`. Returns how many there were.
    pub fn dispatch(&self, sink: &mut impl EventSink) -> usize {
        let mut count = 0;
        for event in self.events.try_iter() {
            event.deliver(sink);
            count += 1;
        }
        count
    }

    /// The queue of notifications, for callers that want to block on it
    pub fn events(&self) -> &Receiver<PlaybackEvent> {
        &self.events
    }

    /// True while the playback thread is alive
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the thread and wait for it. Later control calls fail with
    /// [`PlayerError::Disconnected`].
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.commands.try_send(PlayerCommand::Shutdown);

        if let Some(handle) = self.handle.lock().take()
            && handle.join().is_err()
        {
            tracing::warn!("Playback thread panicked");
        }
    }
}

impl Drop for MidiPlayer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker<C> {
    scheduler: Scheduler,
    clock: C,
    commands: Receiver<PlayerCommand>,
    sink: ChannelSink,
    published: Arc<Published>,
    shutdown: Arc<AtomicBool>,
    tick_interval: Duration,
    idle_interval: Duration,
}

impl<C: ClockSource> Worker<C> {
    fn run(mut self) {
        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }
            if !self.drain_commands() {
                break;
            }

            let position = self.clock.position();
            self.scheduler.advance_to(position, &mut self.sink);
            self.published.store(&self.scheduler);

            let wait = match self.scheduler.state() {
                PlayerState::Playing => self.tick_interval,
                PlayerState::Paused | PlayerState::Stopped => self.idle_interval,
            };
            match self.commands.recv_timeout(wait) {
                Ok(command) => {
                    if !self.apply(command) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        self.scheduler.stop();
        self.published.exit(&self.scheduler);
        if self.sink.dropped() > 0 {
            tracing::warn!("{} notifications were dropped", self.sink.dropped());
        }
        tracing::debug!("Playback thread exiting");
    }

    /// False once the thread should exit
    fn drain_commands(&mut self) -> bool {
        loop {
            match self.commands.try_recv() {
                Ok(command) => {
                    if !self.apply(command) {
                        return false;
                    }
                }
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn apply(&mut self, command: PlayerCommand) -> bool {
        match command {
            PlayerCommand::Load(document) => self.scheduler.load(document),
            PlayerCommand::Play => self.scheduler.play(),
            PlayerCommand::Stop => self.scheduler.stop(),
            PlayerCommand::Pause => self.scheduler.pause(),
            PlayerCommand::Resume => self.scheduler.resume(),
            PlayerCommand::SetLoop(looping) => self.scheduler.set_loop(looping),
            PlayerCommand::SetSpeedScale(speed) => self.scheduler.set_speed_scale(speed),
            PlayerCommand::Seek(seconds) => self.scheduler.set_current_time(seconds),
            PlayerCommand::Shutdown => return false,
        }
        self.published.applied(&self.scheduler);
        true
    }
}
