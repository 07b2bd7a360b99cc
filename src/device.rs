//! Owns the device lifecycle: the bus handshake, mode switching, report
//! dispatch and the power-driven re-initialization policy.

use std::{
    error::Error,
    sync::Mutex,
    thread,
    time::{Duration, Instant},
};

use log::{debug, error, warn};
use thiserror::Error;

use crate::{
    bus::{BLOCK_MAX, SmbusTransport, commands},
    event::{EventEmitter, TouchpadEvent},
    gate::{InputGate, QUIET_WINDOW},
    packet::{self, PacketError, Report},
    touch::{ContactTracker, Geometry},
    trackpoint::TrackpointState,
};

/// Mode-set bit enabling absolute (multitouch) reporting.
pub const ENABLE_ABS: u8 = 0x01;

/// How many times initialization is attempted before giving up.
const RETRY_COUNT: u32 = 5;

/// The pause between failed initialization attempts.
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// The boot settle time granted to the device before the first attempt.
const SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Timing knobs for the lifecycle controller.
///
/// The defaults are the values the device family needs in production; tests
/// and embedders with faster hardware may shrink the waits. Protocol
/// constants are not configurable.
#[derive(Clone, Copy, Debug)]
pub struct DriverOptions {
    /// Wait before the first initialization attempt of a run.
    pub settle_delay: Duration,

    /// Wait between failed initialization attempts.
    pub retry_backoff: Duration,

    /// How many initialization attempts a run may take.
    pub retry_count: u32,

    /// How long touch input stays suppressed after a keystroke.
    pub quiet_window: Duration,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            settle_delay: SETTLE_DELAY,
            retry_backoff: RETRY_BACKOFF,
            retry_count: RETRY_COUNT,
            quiet_window: QUIET_WINDOW,
        }
    }
}

/// Represents the power state the host reports for the device.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PowerState {
    /// The device is powered and expected to deliver reports.
    Awake,

    /// The device was put to sleep by the host.
    Asleep,
}

/// The state guarded by the driver's mutual-exclusion domain.
///
/// Report decode, lifecycle transitions and input-gate checks all go
/// through this one lock; none of them may observe a transition midway.
struct DriverState {
    geometry: Geometry,
    tracker: ContactTracker,
    trackpoint: TrackpointState,
    gate: InputGate,
    awake: bool,
}

/// Represents one ELAN touchpad attached to an SMBus transport.
///
/// The driver is reactive: the platform adapter calls in on bus "data
/// ready" notifications, power transitions and keyboard activity, and
/// decoded input surfaces on the event stream handed out by
/// [`Self::listen`]. No threads are spawned internally.
pub struct TouchpadDriver<T: SmbusTransport> {
    bus: T,
    options: DriverOptions,
    emitter: EventEmitter<TouchpadEvent>,
    state: Mutex<DriverState>,
}

impl<T: SmbusTransport> TouchpadDriver<T> {
    pub fn new(bus: T) -> Self {
        Self::with_options(bus, DriverOptions::default())
    }

    pub fn with_options(bus: T, options: DriverOptions) -> Self {
        Self {
            bus,
            emitter: EventEmitter::new(),
            state: Mutex::new(DriverState {
                geometry: Geometry::new(),
                tracker: ContactTracker::new(),
                trackpoint: TrackpointState::new(),
                gate: InputGate::new(options.quiet_window),
                awake: true,
            }),
            options,
        }
    }

    /// Creates a new receiver for the driver's event stream.
    pub fn listen(&self) -> flume::Receiver<TouchpadEvent> {
        self.emitter.create_receiver()
    }

    /// Brings the device up after host start.
    ///
    /// Runs the bounded-retry initialization sequence; an error means the
    /// retry budget is exhausted and the lifecycle owner may refuse to
    /// publish the device as operational.
    pub fn start(&self) -> Result<(), DeviceError<T::Error>> {
        self.try_initialize()
    }

    /// Applies a host power transition.
    ///
    /// Powering off sends the sleep command best-effort and never retries
    /// it. Powering on re-runs the bounded-retry initialization; a failure
    /// there is logged and leaves the device awake, so a later successful
    /// re-initialization can still revive it.
    pub fn set_power(&self, power: PowerState) {
        match power {
            PowerState::Asleep => {
                let mut state = self.state.lock().unwrap();
                if state.awake {
                    state.awake = false;
                    drop(state);
                    self.send_sleep_command();
                }
            },
            PowerState::Awake => {
                let mut state = self.state.lock().unwrap();
                if !state.awake {
                    // Marked awake before the retry loop so a concurrent
                    // power-off can cancel it between attempts.
                    state.awake = true;
                    drop(state);

                    debug!("waking up");
                    if let Err(err) = self.try_initialize() {
                        error!("could not initialize the device: {err}");
                    }
                }
            },
        }
    }

    /// The power state the driver currently assumes.
    pub fn power_state(&self) -> PowerState {
        if self.state.lock().unwrap().awake {
            PowerState::Awake
        } else {
            PowerState::Asleep
        }
    }

    /// Puts the device to sleep before the driver goes away.
    pub fn shutdown(&self) {
        self.send_sleep_command();
    }

    /// Handles a "data ready" notification from the bus.
    ///
    /// Pulls one report, consults the input gate and dispatches by report
    /// identifier. Malformed and unrecognized reports are logged and
    /// dropped without touching tracker state.
    pub fn handle_host_notify(&self) {
        let mut report = [0u8; packet::MAX_REPORT_LEN];
        if let Err(err) = self.read_report(&mut report) {
            error!("failed to read report data: {err}");
            return;
        }

        let now = Instant::now();
        let mut state = self.state.lock().unwrap();
        let DriverState {
            geometry,
            tracker,
            trackpoint,
            gate,
            ..
        } = &mut *state;

        if !gate.should_process(now) {
            return;
        }

        match Report::parse(&report) {
            Ok(Report::Absolute(report)) => {
                let event = tracker.decode(&report, geometry, now);
                self.emitter.emit(TouchpadEvent::Touch(event));
            },
            Ok(Report::Trackpoint(report)) => {
                let event = trackpoint.decode(&report);
                self.emitter.emit(event);
            },
            Err(err) => {
                error!("dropping report: {err}");
            },
        }
    }

    /// Suppresses or re-enables touch input, on behalf of the keyboard
    /// collaborator.
    pub fn set_touch_enabled(&self, enabled: bool) {
        self.state.lock().unwrap().gate.set_ignore_all(!enabled);
    }

    /// Whether touch input is currently enabled.
    pub fn touch_enabled(&self) -> bool {
        !self.state.lock().unwrap().gate.ignore_all()
    }

    /// Records a keystroke observed by the keyboard collaborator, opening
    /// the quiet window.
    pub fn note_keystroke(&self, at: Instant) {
        self.state.lock().unwrap().gate.record_keystroke(at);
    }

    /// Runs the bounded-retry initialization sequence.
    ///
    /// The device lock is held for the bus I/O of each attempt but released
    /// across the settle and backoff sleeps, so a concurrent power
    /// transition is never starved. A power-off arriving between attempts
    /// aborts the run.
    fn try_initialize(&self) -> Result<(), DeviceError<T::Error>> {
        thread::sleep(self.options.settle_delay);

        let mut attempt = 0;
        loop {
            let result = {
                let mut state = self.state.lock().unwrap();
                if !state.awake {
                    debug!("powered off, abandoning initialization");
                    return Err(DeviceError::PoweredOff);
                }

                self.initialize(&mut state)
            };

            match result {
                Ok(()) => return Ok(()),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.options.retry_count {
                        return Err(err);
                    }

                    warn!("initialization attempt {attempt} failed: {err}");
                    thread::sleep(self.options.retry_backoff);
                },
            }
        }
    }

    /// One initialization attempt: hello handshake, touch enable, absolute
    /// reporting mode. Any failure aborts the attempt as a whole.
    fn initialize(&self, state: &mut DriverState) -> Result<(), DeviceError<T::Error>> {
        let mut values = [0u8; BLOCK_MAX];
        let len = self.bus.read_block(commands::HELLO_PACKET, &mut values)?;
        packet::verify_hello(&values[..len]).map_err(DeviceError::Packet)?;

        self.bus.write_byte(commands::ENABLE_TP)?;
        self.set_mode(ENABLE_ABS)?;

        state.geometry = Geometry::new();
        Ok(())
    }

    /// Writes the 4-byte mode-set payload.
    fn set_mode(&self, mode: u8) -> Result<(), T::Error> {
        let cmd = [0x00, 0x07, 0x00, mode];
        self.bus.write_block(commands::IAP, &cmd)
    }

    /// Pulls one report from the bus into `buf`.
    fn read_report(
        &self,
        buf: &mut [u8; packet::MAX_REPORT_LEN],
    ) -> Result<(), DeviceError<T::Error>> {
        let len = self
            .bus
            .read_block(commands::PACKET_QUERY, &mut buf[packet::REPORT_OFFSET..])?;

        if len != packet::REPORT_LEN {
            return Err(DeviceError::Packet(PacketError::TruncatedReport { got: len }));
        }

        Ok(())
    }

    /// Sends the sleep command. Failure is logged, never retried.
    fn send_sleep_command(&self) {
        if let Err(err) = self.bus.write_byte(commands::SLEEP) {
            warn!("failed to send sleep command: {err}");
        }
    }
}

/// Represents an error surfaced by the lifecycle controller.
#[derive(Debug, Error)]
pub enum DeviceError<E: Error + Send + Sync + 'static> {
    /// Indicates that the bus transport failed.
    #[error("the bus transport returned an error")]
    Bus(#[from] E),

    /// Indicates a protocol violation in a packet read from the device.
    #[error("protocol violation")]
    Packet(#[source] PacketError),

    /// Indicates that initialization was abandoned because the device was
    /// powered off.
    #[error("the device was powered off during initialization")]
    PoweredOff,
}
