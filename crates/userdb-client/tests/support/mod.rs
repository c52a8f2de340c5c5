//! Fake userdb multiplexer for integration tests.
//!
//! Binds a Unix socket in a temporary directory and answers each request
//! whose exact text (without the NUL terminator) appears in its script. Every
//! connection is served in turn on one background thread.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use tempfile::TempDir;

const ACCEPT_WINDOW: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How the fake answers one request.
#[derive(Debug, Clone)]
pub enum Response {
    /// Sends the bytes, appending a NUL terminator when they lack one.
    Reply(Vec<u8>),
    /// Sends the bytes exactly as given.
    Raw(Vec<u8>),
    /// Keeps the connection open without answering until the client leaves.
    Silent,
}

impl Response {
    pub fn reply(text: &str) -> Self {
        Self::Reply(text.as_bytes().to_vec())
    }
}

/// A scripted userdb service listening on a temporary socket.
pub struct FakeUserDb {
    _dir: TempDir,
    socket: PathBuf,
    requests: Arc<Mutex<Vec<String>>>,
    result: Arc<Mutex<Option<Result<()>>>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FakeUserDb {
    /// Starts serving `script`, keyed by request text.
    pub fn spawn(script: Vec<(String, Response)>) -> Result<Self> {
        let dir = tempfile::tempdir().context("create socket dir")?;
        let socket = dir.path().join("multiplexer.sock");
        let listener = UnixListener::bind(&socket).context("bind fake userdb")?;
        listener
            .set_nonblocking(true)
            .context("fake userdb nonblocking")?;

        let requests = Arc::new(Mutex::new(Vec::new()));
        let result = Arc::new(Mutex::new(None));
        let shutdown = Arc::new(AtomicBool::new(false));
        let script: HashMap<String, Response> = script.into_iter().collect();

        let requests_clone = Arc::clone(&requests);
        let result_clone = Arc::clone(&result);
        let shutdown_clone = Arc::clone(&shutdown);
        let handle = thread::spawn(move || {
            let outcome = serve(&listener, script, &requests_clone, &shutdown_clone);
            if let Ok(mut guard) = result_clone.lock() {
                *guard = Some(outcome);
            }
        });

        Ok(Self {
            _dir: dir,
            socket,
            requests,
            result,
            shutdown,
            handle: Some(handle),
        })
    }

    pub fn socket(&self) -> &Path {
        &self.socket
    }

    /// Stops the server and returns every request it received, in order.
    pub fn finish(mut self) -> Result<Vec<String>> {
        self.stop()?;
        if let Some(outcome) = self
            .result
            .lock()
            .map_err(|error| anyhow!("lock fake userdb result: {error}"))?
            .take()
        {
            outcome.context("fake userdb failed")?;
        }
        let requests = self
            .requests
            .lock()
            .map_err(|error| anyhow!("lock requests: {error}"))?;
        Ok(requests.clone())
    }

    fn stop(&mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("fake userdb thread panicked"))?;
        }
        Ok(())
    }
}

impl Drop for FakeUserDb {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn serve(
    listener: &UnixListener,
    mut script: HashMap<String, Response>,
    requests: &Mutex<Vec<String>>,
    shutdown: &AtomicBool,
) -> Result<()> {
    let started = Instant::now();
    while !shutdown.load(Ordering::SeqCst) && started.elapsed() < ACCEPT_WINDOW {
        match listener.accept() {
            Ok((stream, _)) => {
                stream
                    .set_nonblocking(false)
                    .context("blocking client stream")?;
                let Some(request) = read_request(&stream)? else {
                    continue;
                };
                requests
                    .lock()
                    .map_err(|error| anyhow!("lock requests: {error}"))?
                    .push(request.clone());
                let Some(response) = script.remove(&request) else {
                    bail!("unexpected request: {request}");
                };
                respond(stream, response, shutdown)?;
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(POLL_INTERVAL);
            }
            Err(error) => return Err(error).context("accept connection"),
        }
    }
    Ok(())
}

/// Reads one NUL-terminated request; `None` when the client left first.
fn read_request(mut stream: &UnixStream) -> Result<Option<String>> {
    let mut request = Vec::new();
    let mut chunk = [0_u8; 4096];
    loop {
        let count = stream.read(&mut chunk).context("read request")?;
        if count == 0 {
            return Ok(None);
        }
        request.extend_from_slice(chunk.get(..count).unwrap_or_default());
        if request.last() == Some(&0) {
            request.pop();
            return String::from_utf8(request)
                .map(Some)
                .context("request is not UTF-8");
        }
    }
}

fn respond(mut stream: UnixStream, response: Response, shutdown: &AtomicBool) -> Result<()> {
    match response {
        Response::Reply(mut data) => {
            if data.last() != Some(&0) {
                data.push(0);
            }
            stream.write_all(&data).context("write reply")
        }
        Response::Raw(data) => stream.write_all(&data).context("write raw reply"),
        Response::Silent => {
            stream
                .set_read_timeout(Some(POLL_INTERVAL))
                .context("silent read timeout")?;
            let mut sink = [0_u8; 64];
            while !shutdown.load(Ordering::SeqCst) {
                match stream.read(&mut sink) {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(error)
                        if matches!(
                            error.kind(),
                            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                        ) => {}
                    Err(error) if error.kind() == io::ErrorKind::ConnectionReset => break,
                    Err(error) => return Err(error).context("wait for client"),
                }
            }
            Ok(())
        }
    }
}
