//! Test doubles for the HAL traits
//!
//! Every double is a cheap handle over shared state so a test can hand one
//! clone to the code under test and inspect the other.

use std::cell::{Cell, RefCell};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin};
use embedded_hal_async::delay::DelayNs;
use hal_abstractions::{NetworkSession, PresenceIndicator, RetainedWord, Transport, Watchdog};

use crate::config::Config;

pub fn config_with(ssid: &str, psk: &str, sink_name: &str, sink_addr: &str) -> Config {
    let mut config = Config::default();
    config.ssid.push_str(ssid).unwrap();
    config.psk.push_str(psk).unwrap();
    config.sink_name.push_str(sink_name).unwrap();
    config.sink_addr.push_str(sink_addr).unwrap();
    config.db_name.push_str("sensors").unwrap();
    config.measurement.push_str("room").unwrap();
    config
}

#[derive(Debug)]
pub struct MockError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Join,
    Resolve(String),
    Leave,
}

#[derive(Clone)]
pub struct MockSession {
    events: Rc<RefCell<Vec<SessionEvent>>>,
    join_failures: Rc<Cell<usize>>,
    resolve_failures: Rc<Cell<usize>>,
    resolved: Rc<Cell<Ipv4Addr>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self {
            events: Rc::default(),
            join_failures: Rc::default(),
            resolve_failures: Rc::default(),
            resolved: Rc::new(Cell::new(Ipv4Addr::new(192, 168, 1, 50))),
        }
    }

    /// Fail the next `count` joins
    pub fn fail_joins(&self, count: usize) {
        self.join_failures.set(count);
    }

    /// Fail the next `count` lookups
    pub fn fail_resolves(&self, count: usize) {
        self.resolve_failures.set(count);
    }

    pub fn resolve_to(&self, address: Ipv4Addr) {
        self.resolved.set(address);
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.borrow().clone()
    }

    pub fn joins(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| **e == SessionEvent::Join)
            .count()
    }
}

impl NetworkSession for MockSession {
    type Error = MockError;

    async fn join(&mut self, _ssid: &str, _passphrase: &str) -> Result<(), MockError> {
        self.events.borrow_mut().push(SessionEvent::Join);
        let failures = self.join_failures.get();
        if failures > 0 {
            self.join_failures.set(failures - 1);
            return Err(MockError);
        }
        Ok(())
    }

    async fn resolve(&mut self, host: &str) -> Result<Ipv4Addr, MockError> {
        self.events
            .borrow_mut()
            .push(SessionEvent::Resolve(host.into()));
        let failures = self.resolve_failures.get();
        if failures > 0 {
            self.resolve_failures.set(failures - 1);
            return Err(MockError);
        }
        Ok(self.resolved.get())
    }

    async fn leave(&mut self) {
        self.events.borrow_mut().push(SessionEvent::Leave);
    }
}

#[derive(Debug, Clone)]
pub struct SentRequest {
    pub remote: SocketAddrV4,
    pub text: String,
}

#[derive(Clone)]
pub struct MockTransport {
    sent: Rc<RefCell<Vec<SentRequest>>>,
    send_failures: Rc<Cell<usize>>,
    response: &'static [u8],
}

impl MockTransport {
    pub fn new(response: &'static [u8]) -> Self {
        Self {
            sent: Rc::default(),
            send_failures: Rc::default(),
            response,
        }
    }

    /// Fail the next `count` sends
    pub fn fail_sends(&self, count: usize) {
        self.send_failures.set(count);
    }

    pub fn requests(&self) -> Vec<SentRequest> {
        self.sent.borrow().clone()
    }

    /// Bodies of all delivered requests
    pub fn bodies(&self) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .map(|r| r.text.split("\r\n\r\n").nth(1).unwrap_or_default().into())
            .collect()
    }
}

impl Transport for MockTransport {
    type Error = MockError;

    async fn exchange(
        &mut self,
        remote: SocketAddrV4,
        request: &[u8],
        response: &mut [u8],
    ) -> Result<usize, MockError> {
        let failures = self.send_failures.get();
        if failures > 0 {
            self.send_failures.set(failures - 1);
            return Err(MockError);
        }
        self.sent.borrow_mut().push(SentRequest {
            remote,
            text: String::from_utf8(request.to_vec()).unwrap(),
        });
        let len = self.response.len().min(response.len());
        response[..len].copy_from_slice(&self.response[..len]);
        Ok(len)
    }
}

/// Records arm/kick calls in order
#[derive(Clone, Default)]
pub struct MockWatchdog {
    arms: Rc<RefCell<Vec<u32>>>,
    kicks: Rc<Cell<u32>>,
}

impl MockWatchdog {
    pub fn arms(&self) -> Vec<u32> {
        self.arms.borrow().clone()
    }

    pub fn kicks(&self) -> u32 {
        self.kicks.get()
    }
}

impl Watchdog for MockWatchdog {
    fn arm(&mut self, timeout_ms: u32) {
        self.arms.borrow_mut().push(timeout_ms);
    }

    fn kick(&mut self) {
        self.kicks.set(self.kicks.get() + 1);
    }
}

/// Records every state shown
#[derive(Clone, Default)]
pub struct MockIndicator {
    shown: Rc<RefCell<Vec<bool>>>,
}

impl MockIndicator {
    pub fn shown(&self) -> Vec<bool> {
        self.shown.borrow().clone()
    }
}

impl PresenceIndicator for MockIndicator {
    fn show(&mut self, occupied: bool) {
        self.shown.borrow_mut().push(occupied);
    }
}

/// Delay that returns immediately, optionally yielding once so a test can
/// observe a retry loop between polls
#[derive(Clone, Default)]
pub struct MockDelay {
    waits_ms: Rc<RefCell<Vec<u32>>>,
    yield_each: bool,
}

impl MockDelay {
    pub fn yielding() -> Self {
        Self {
            yield_each: true,
            ..Self::default()
        }
    }

    pub fn waits_ms(&self) -> Vec<u32> {
        self.waits_ms.borrow().clone()
    }
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.waits_ms.borrow_mut().push(ns / 1_000_000);
        if self.yield_each {
            embassy_futures::yield_now().await;
        }
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.waits_ms.borrow_mut().push(ms);
        if self.yield_each {
            embassy_futures::yield_now().await;
        }
    }
}

pub struct MockPin {
    pub high: bool,
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.high)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.high)
    }
}

/// Retained word shared between "boots"
#[derive(Clone, Default)]
pub struct MockRetained {
    word: Rc<Cell<u32>>,
}

impl MockRetained {
    pub fn with_word(word: u32) -> Self {
        Self {
            word: Rc::new(Cell::new(word)),
        }
    }

    pub fn word(&self) -> u32 {
        self.word.get()
    }
}

impl RetainedWord for MockRetained {
    fn read(&self) -> u32 {
        self.word.get()
    }

    fn write(&mut self, value: u32) {
        self.word.set(value);
    }
}
