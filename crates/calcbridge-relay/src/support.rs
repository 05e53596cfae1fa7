//! Scripted and recording media shared by the channel tests.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use calcbridge_transport::{Medium, Result as TransportResult};

/// One scripted read-side event.
pub enum Step {
    /// Deliver these bytes.
    Data(Vec<u8>),
    /// Sleep, then move on to the next step.
    Wait(Duration),
    /// One read timeout.
    Timeout,
    /// Remote end closed: read returns zero bytes.
    Eof,
    /// One I/O failure of the given kind.
    Fail(ErrorKind),
}

/// A medium whose reads follow a script and whose writes are recorded.
///
/// Clones share the write log and the closed flag, which matches how real
/// media are split into a reader half and a lock-guarded writer half.
/// After the script is exhausted, reads behave like a quiet device:
/// short timeout errors forever.
#[derive(Clone)]
pub struct ScriptedMedium {
    steps: Arc<Mutex<VecDeque<Step>>>,
    written: Arc<Mutex<Vec<Vec<u8>>>>,
    closed: Arc<AtomicBool>,
}

impl ScriptedMedium {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
            written: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Every write call, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.written.lock().unwrap().clone()
    }

    /// All written bytes, concatenated.
    pub fn concat(&self) -> Vec<u8> {
        self.writes().concat()
    }

    /// How many write calls contained `needle` as an exact payload.
    pub fn count_writes(&self, needle: &[u8]) -> usize {
        self.writes().iter().filter(|w| w.as_slice() == needle).count()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Read for ScriptedMedium {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        loop {
            if self.closed.load(Ordering::SeqCst) {
                return Ok(0);
            }
            let step = self.steps.lock().unwrap().pop_front();
            match step {
                None => {
                    std::thread::sleep(Duration::from_millis(1));
                    return Err(ErrorKind::TimedOut.into());
                }
                Some(Step::Data(data)) => {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    if n < data.len() {
                        self.steps
                            .lock()
                            .unwrap()
                            .push_front(Step::Data(data[n..].to_vec()));
                    }
                    return Ok(n);
                }
                Some(Step::Wait(duration)) => {
                    std::thread::sleep(duration);
                }
                Some(Step::Timeout) => return Err(ErrorKind::TimedOut.into()),
                Some(Step::Eof) => return Ok(0),
                Some(Step::Fail(kind)) => return Err(kind.into()),
            }
        }
    }
}

impl Write for ScriptedMedium {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.written.lock().unwrap().push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Medium for ScriptedMedium {
    fn try_clone(&self) -> TransportResult<Box<dyn Medium>> {
        Ok(Box::new(self.clone()))
    }

    fn bytes_to_read(&mut self) -> TransportResult<u32> {
        let steps = self.steps.lock().unwrap();
        match steps.front() {
            Some(Step::Data(data)) => Ok(data.len() as u32),
            _ => Ok(0),
        }
    }

    fn shutdown(&mut self) -> TransportResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Write-only medium: reads idle forever, writes are recorded.
#[derive(Clone)]
pub struct RecordingMedium {
    inner: ScriptedMedium,
}

impl RecordingMedium {
    pub fn new() -> Self {
        Self {
            inner: ScriptedMedium::new(Vec::new()),
        }
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.inner.writes()
    }

    pub fn concat(&self) -> Vec<u8> {
        self.inner.concat()
    }

    pub fn count_writes(&self, needle: &[u8]) -> usize {
        self.inner.count_writes(needle)
    }
}

impl Read for RecordingMedium {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for RecordingMedium {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl Medium for RecordingMedium {
    fn try_clone(&self) -> TransportResult<Box<dyn Medium>> {
        Ok(Box::new(self.clone()))
    }
}

/// Accepts one byte per write call. Any interleaving between concurrent
/// writers becomes visible in the byte log.
#[derive(Clone)]
pub struct TrickleMedium {
    log: Arc<Mutex<Vec<u8>>>,
}

impl TrickleMedium {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn concat(&self) -> Vec<u8> {
        self.log.lock().unwrap().clone()
    }
}

impl Read for TrickleMedium {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        std::thread::sleep(Duration::from_millis(1));
        Err(ErrorKind::TimedOut.into())
    }
}

impl Write for TrickleMedium {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.log.lock().unwrap().push(buf[0]);
        std::thread::yield_now();
        Ok(1)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Medium for TrickleMedium {
    fn try_clone(&self) -> TransportResult<Box<dyn Medium>> {
        Ok(Box::new(self.clone()))
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// A clock that sleeps briefly and counts how often it was asked to.
pub struct CountingClock {
    pub sleeps: std::sync::atomic::AtomicUsize,
}

impl CountingClock {
    pub fn new() -> Self {
        Self {
            sleeps: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.sleeps.load(Ordering::SeqCst)
    }
}

impl calcbridge_transport::Clock for CountingClock {
    fn sleep(&self, _duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(1));
    }
}
