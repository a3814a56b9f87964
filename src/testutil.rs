// testutil.rs — shared fakes for the capability seams (test builds only)

use core::time::Duration;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::*;

/// One observable side effect of the firmware against its hardware.
#[derive(Clone, Debug, PartialEq)]
pub enum Ev {
    DelayMs(u32),
    AdcRead,
    PinWrite(&'static str, Level),
    PinRead(&'static str),
    RadioBegin(u64, u8),
    Tx(String),
    Display(String),
    NetJoin,
    NetOff,
    UpdatesBegin,
    UpdatesPoll,
    BluetoothOff,
    DeepSleep(Duration),
}

/// Chronological record shared by all fakes, so ordering contracts
/// (settle before sleep, excitation off after read) are checkable.
#[derive(Clone, Default)]
pub struct Trace(Rc<RefCell<Vec<Ev>>>);

impl Trace {
    pub fn push(&self, ev: Ev) {
        self.0.borrow_mut().push(ev);
    }

    pub fn events(&self) -> Vec<Ev> {
        self.0.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Ev) -> bool) -> usize {
        self.0.borrow().iter().filter(|e| pred(e)).count()
    }

    /// All display renderings, lines joined with newlines.
    pub fn displayed(&self) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Ev::Display(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Simulated monotonic clock; time advances only through `delay_ms`.
#[derive(Clone)]
pub struct FakeClock {
    now: Rc<RefCell<u64>>,
    trace: Trace,
}

impl FakeClock {
    pub fn new(trace: &Trace) -> Self {
        Self {
            now: Rc::new(RefCell::new(0)),
            trace: trace.clone(),
        }
    }
}

impl Clock for FakeClock {
    fn millis(&self) -> u64 {
        *self.now.borrow()
    }

    fn delay_ms(&self, ms: u32) {
        self.trace.push(Ev::DelayMs(ms));
        *self.now.borrow_mut() += u64::from(ms);
    }
}

pub struct FakeAdc {
    value: u16,
    trace: Trace,
}

impl FakeAdc {
    pub fn constant(value: u16, trace: &Trace) -> Self {
        Self {
            value,
            trace: trace.clone(),
        }
    }
}

impl AnalogSource for FakeAdc {
    fn read_raw(&mut self) -> u16 {
        self.trace.push(Ev::AdcRead);
        self.value
    }
}

pub struct FakeOutput {
    name: &'static str,
    state: Rc<RefCell<Level>>,
    trace: Trace,
}

impl FakeOutput {
    pub fn new(name: &'static str, trace: &Trace) -> Self {
        Self {
            name,
            state: Rc::new(RefCell::new(Level::Low)),
            trace: trace.clone(),
        }
    }

    pub fn state(&self) -> Level {
        *self.state.borrow()
    }
}

impl PinOutput for FakeOutput {
    fn write(&mut self, level: Level) {
        *self.state.borrow_mut() = level;
        self.trace.push(Ev::PinWrite(self.name, level));
    }
}

pub struct FakeInput {
    name: &'static str,
    level: Level,
    trace: Trace,
}

impl FakeInput {
    pub fn fixed(name: &'static str, level: Level, trace: &Trace) -> Self {
        Self {
            name,
            level,
            trace: trace.clone(),
        }
    }
}

impl PinInput for FakeInput {
    fn read(&mut self) -> Level {
        self.trace.push(Ev::PinRead(self.name));
        self.level
    }
}

/// Active-low key that asserts at a scheduled simulated time and stays
/// held from then on.
pub struct FakeKey {
    clock: FakeClock,
    pressed_at: Option<u64>,
}

impl FakeKey {
    pub fn pressed_at(clock: &FakeClock, at_ms: u64) -> Self {
        Self {
            clock: clock.clone(),
            pressed_at: Some(at_ms),
        }
    }

    pub fn released(clock: &FakeClock) -> Self {
        Self {
            clock: clock.clone(),
            pressed_at: None,
        }
    }
}

impl PinInput for FakeKey {
    fn read(&mut self) -> Level {
        match self.pressed_at {
            Some(at) if self.clock.millis() >= at => Level::Low,
            _ => Level::High,
        }
    }
}

pub struct FakeRadio {
    fail_begin: bool,
    fail_tx: bool,
    trace: Trace,
}

impl FakeRadio {
    pub fn new(trace: &Trace, fail_begin: bool, fail_tx: bool) -> Self {
        Self {
            fail_begin,
            fail_tx,
            trace: trace.clone(),
        }
    }
}

impl RadioLink for FakeRadio {
    fn begin(&mut self, band_hz: u64, sync_word: u8) -> anyhow::Result<()> {
        if self.fail_begin {
            bail!("no SX1276 on the bus (version 0x00)");
        }
        self.trace.push(Ev::RadioBegin(band_hz, sync_word));
        Ok(())
    }

    fn transmit(&mut self, frame: &[u8]) -> anyhow::Result<()> {
        self.trace
            .push(Ev::Tx(String::from_utf8_lossy(frame).into_owned()));
        if self.fail_tx {
            bail!("TX done flag never rose");
        }
        Ok(())
    }
}

pub struct FakeDisplay {
    trace: Trace,
}

impl FakeDisplay {
    pub fn new(trace: &Trace) -> Self {
        Self {
            trace: trace.clone(),
        }
    }
}

impl StatusDisplay for FakeDisplay {
    fn show(&mut self, lines: &[&str]) {
        self.trace.push(Ev::Display(lines.join("\n")));
    }
}

pub struct FakeNet {
    out_of_range: bool,
    trace: Trace,
}

impl FakeNet {
    pub fn new(trace: &Trace) -> Self {
        Self {
            out_of_range: false,
            trace: trace.clone(),
        }
    }

    pub fn out_of_range(trace: &Trace) -> Self {
        Self {
            out_of_range: true,
            trace: trace.clone(),
        }
    }
}

impl NetworkControl for FakeNet {
    fn join(&mut self) -> anyhow::Result<()> {
        self.trace.push(Ev::NetJoin);
        if self.out_of_range {
            bail!("no connection after 10000 ms");
        }
        Ok(())
    }

    fn power_off(&mut self) {
        self.trace.push(Ev::NetOff);
    }
}

/// Update listener fed by the test; `poll` drains in push order.
#[derive(Clone)]
pub struct FakeUpdates {
    queue: Rc<RefCell<VecDeque<UpdateEvent>>>,
    trace: Trace,
}

impl FakeUpdates {
    pub fn new(trace: &Trace) -> Self {
        Self {
            queue: Rc::new(RefCell::new(VecDeque::new())),
            trace: trace.clone(),
        }
    }

    pub fn push(&self, event: UpdateEvent) {
        self.queue.borrow_mut().push_back(event);
    }
}

impl UpdateService for FakeUpdates {
    fn begin(&mut self) -> anyhow::Result<()> {
        self.trace.push(Ev::UpdatesBegin);
        Ok(())
    }

    fn poll(&mut self) -> Option<UpdateEvent> {
        self.trace.push(Ev::UpdatesPoll);
        self.queue.borrow_mut().pop_front()
    }
}

pub struct FakePower {
    trace: Trace,
}

impl FakePower {
    pub fn new(trace: &Trace) -> Self {
        Self {
            trace: trace.clone(),
        }
    }
}

impl PowerControl for FakePower {
    fn bluetooth_off(&mut self) {
        self.trace.push(Ev::BluetoothOff);
    }

    fn deep_sleep(&mut self, after: Duration) {
        self.trace.push(Ev::DeepSleep(after));
    }
}
// EOF
