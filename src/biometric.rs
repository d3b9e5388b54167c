//! Live heart rate ingestion
//!
//! A phone or sensor sends bpm readings as small UDP datagrams. The listener
//! thread parses them and publishes the latest value into a [`BpmSlot`]; the
//! game loop reads the slot once per frame and never waits on it.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::clamp;

/// Accepted range for published readings
pub const BPM_FLOOR: i32 = 40;
pub const BPM_CEIL: i32 = 200;
/// Port the companion app sends to by default
pub const DEFAULT_PORT: u16 = 5005;

const MAX_DATAGRAM: usize = 512;
const RECV_TIMEOUT: Duration = Duration::from_secs(1);
/// Slot value meaning "nothing received yet"
const EMPTY: i32 = i32::MIN;

/// Parse one payload into a bpm reading.
///
/// Accepted encodings:
/// - JSON object with a `bpm` field: `{"bpm": 82}` or `{"bpm": "82.4"}`
/// - `label:value` pairs, the rightmost numeric token wins: `BPM:82`
/// - a bare number: `82`
///
/// Readings are rounded to the nearest integer. Anything else is `None`.
pub fn parse_bpm(msg: &str) -> Option<i32> {
    let msg = msg.trim();
    if msg.is_empty() {
        return None;
    }

    if msg.starts_with('{') && msg.ends_with('}') {
        return parse_json(msg);
    }

    if msg.contains(':') {
        if let Some(v) = msg.rsplit(':').find_map(|part| unsigned_decimal(part.trim())) {
            return to_bpm(v);
        }
    }

    unsigned_decimal(msg).and_then(to_bpm)
}

fn parse_json(msg: &str) -> Option<i32> {
    let value: serde_json::Value = serde_json::from_str(msg).ok()?;
    let v = match value.get("bpm")? {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    to_bpm(v)
}

/// Digits with at most one decimal point (no sign, no exponent)
fn unsigned_decimal(s: &str) -> Option<f64> {
    let digits = s.bytes().filter(u8::is_ascii_digit).count();
    let dots = s.bytes().filter(|&b| b == b'.').count();
    if digits == 0 || dots > 1 || digits + dots != s.len() {
        return None;
    }
    s.parse().ok()
}

fn to_bpm(v: f64) -> Option<i32> {
    // `as` saturates, so absurd readings still land in the clamp below
    v.is_finite().then(|| v.round() as i32)
}

/// Single-value handoff between a producer thread and the game loop.
///
/// Only the latest reading matters, so this is one atomic integer, not a
/// queue. Cloning shares the slot.
#[derive(Debug, Clone)]
pub struct BpmSlot {
    value: Arc<AtomicI32>,
}

impl Default for BpmSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl BpmSlot {
    pub fn new() -> Self {
        Self {
            value: Arc::new(AtomicI32::new(EMPTY)),
        }
    }

    /// Store a reading, clamped to the accepted range
    pub fn publish(&self, bpm: i32) {
        self.value
            .store(clamp(bpm, BPM_FLOOR, BPM_CEIL), Ordering::Relaxed);
    }

    /// Latest reading, if any has arrived
    pub fn latest(&self) -> Option<i32> {
        match self.value.load(Ordering::Relaxed) {
            EMPTY => None,
            bpm => Some(bpm),
        }
    }

    /// Forget the last reading (back to autonomous drift)
    pub fn clear(&self) {
        self.value.store(EMPTY, Ordering::Relaxed);
    }
}

/// Background UDP receiver feeding a [`BpmSlot`]
pub struct BpmListener {
    local_addr: SocketAddr,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl BpmListener {
    /// Bind `addr` and start receiving on a background thread
    pub fn spawn<A: ToSocketAddrs>(addr: A, slot: BpmSlot) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(Some(RECV_TIMEOUT))?;
        let local_addr = socket.local_addr()?;
        log::info!("Listening for bpm on udp://{local_addr}");

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("bpm-listener".into())
            .spawn(move || receive_loop(socket, slot, flag))?;

        Ok(Self {
            local_addr,
            running,
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Ask the thread to exit and wait for it (at most one read timeout)
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("bpm listener thread panicked");
            }
        }
    }
}

impl Drop for BpmListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn receive_loop(socket: UdpSocket, slot: BpmSlot, running: Arc<AtomicBool>) {
    let mut buf = [0u8; MAX_DATAGRAM];
    let mut last = None;

    while running.load(Ordering::Relaxed) {
        let (len, from) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                continue;
            }
            Err(e) => {
                log::warn!("bpm socket error: {e}");
                continue;
            }
        };

        let msg = String::from_utf8_lossy(&buf[..len]);
        let Some(bpm) = parse_bpm(&msg) else {
            log::trace!("Dropped payload from {from}: {:?}", msg.trim());
            continue;
        };
        slot.publish(bpm);
        if last != slot.latest() {
            last = slot.latest();
            log::debug!("bpm {bpm} from {from}");
        }
    }
    log::debug!("bpm listener stopped");
}
