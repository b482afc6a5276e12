//! The renderer control thread.
//!
//! The renderer collaborator may only be driven from one designated
//! context. [`RendererHandle`] owns that context: a dedicated thread that
//! executes commands sequentially against the renderer. Callers submit a
//! command and wait on its reply channel with a bounded timeout, so a
//! hung browser can never block the session indefinitely.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::renderer::{Renderer, RendererError};

type Reply = mpsc::Sender<Result<(), RendererError>>;

enum Command {
    Start(Reply),
    Open(String, Reply),
    Resize(u32, u32, Reply),
    Close(Reply),
}

/// Handle to the renderer control thread.
pub struct RendererHandle {
    commands: mpsc::Sender<Command>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RendererHandle {
    /// Move `renderer` onto a fresh control thread and return the handle.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::Control`] if the thread cannot be
    /// spawned.
    pub fn spawn(renderer: Box<dyn Renderer>) -> Result<Self, RendererError> {
        let (commands, inbox) = mpsc::channel();
        let thread = thread::Builder::new()
            .name(String::from("plotline-renderer"))
            .spawn(move || control_loop(renderer, &inbox))
            .map_err(|e| RendererError::Control(format!("control thread spawn failed: {e}")))?;
        Ok(Self {
            commands,
            thread: Some(thread),
        })
    }

    /// Prepare the renderer.
    ///
    /// # Errors
    ///
    /// Propagates the renderer's failure, or reports a control error when
    /// the command times out or the thread is gone.
    pub fn start(&self, timeout: Duration) -> Result<(), RendererError> {
        self.request(Command::Start, timeout)
    }

    /// Navigate the renderer to `url`.
    ///
    /// # Errors
    ///
    /// Propagates the renderer's failure, or reports a control error when
    /// the command times out or the thread is gone.
    pub fn open(&self, url: &str, timeout: Duration) -> Result<(), RendererError> {
        let url = url.to_owned();
        self.request(move |reply| Command::Open(url, reply), timeout)
    }

    /// Resize the renderer viewport.
    ///
    /// # Errors
    ///
    /// Propagates the renderer's failure, or reports a control error when
    /// the command times out or the thread is gone.
    pub fn resize(&self, width: u32, height: u32, timeout: Duration) -> Result<(), RendererError> {
        self.request(move |reply| Command::Resize(width, height, reply), timeout)
    }

    /// Close the renderer window.
    ///
    /// # Errors
    ///
    /// Propagates the renderer's failure, or reports a control error when
    /// the command times out or the thread is gone.
    pub fn close(&self, timeout: Duration) -> Result<(), RendererError> {
        self.request(Command::Close, timeout)
    }

    /// Stop the control thread and join it. The renderer is closed
    /// best-effort by the loop on its way out.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::Control`] if the thread panicked.
    pub fn shutdown(self) -> Result<(), RendererError> {
        let Self { commands, thread } = self;
        // Dropping the sender ends the control loop.
        drop(commands);
        if let Some(thread) = thread {
            thread
                .join()
                .map_err(|_| RendererError::Control(String::from("control thread panicked")))?;
        }
        Ok(())
    }

    fn request(
        &self,
        build: impl FnOnce(Reply) -> Command,
        timeout: Duration,
    ) -> Result<(), RendererError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.commands
            .send(build(reply_tx))
            .map_err(|_| RendererError::Control(String::from("renderer thread is gone")))?;
        match reply_rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(RendererError::Control(format!(
                "renderer command timed out after {timeout:?}"
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(RendererError::Control(
                String::from("renderer thread is gone"),
            )),
        }
    }
}

/// Execute commands sequentially until the handle is dropped, then close
/// the renderer best-effort.
fn control_loop(mut renderer: Box<dyn Renderer>, inbox: &mpsc::Receiver<Command>) {
    while let Ok(command) = inbox.recv() {
        match command {
            Command::Start(reply) => {
                let result = renderer.start();
                if result.is_err() {
                    // A failed start must not leak a half-open browser.
                    if let Err(e) = renderer.close() {
                        warn!(error = %e, "close after failed start also failed");
                    }
                }
                let _ = reply.send(result);
            }
            Command::Open(url, reply) => {
                let _ = reply.send(renderer.open(&url));
            }
            Command::Resize(width, height, reply) => {
                let _ = reply.send(renderer.resize(width, height));
            }
            Command::Close(reply) => {
                let _ = reply.send(renderer.close());
            }
        }
    }
    if let Err(e) = renderer.close() {
        debug!(error = %e, "renderer close on thread exit failed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const TIMEOUT: Duration = Duration::from_secs(2);

    /// Records the call sequence into a shared log.
    struct RecordingRenderer {
        log: Arc<Mutex<Vec<String>>>,
        fail_start: bool,
    }

    impl RecordingRenderer {
        fn pair(fail_start: bool) -> (Self, Arc<Mutex<Vec<String>>>) {
            let log = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    log: Arc::clone(&log),
                    fail_start,
                },
                log,
            )
        }

        fn record(&self, entry: &str) {
            if let Ok(mut log) = self.log.lock() {
                log.push(entry.to_owned());
            }
        }
    }

    impl Renderer for RecordingRenderer {
        fn start(&mut self) -> Result<(), RendererError> {
            self.record("start");
            if self.fail_start {
                Err(RendererError::Launch(String::from("no browser")))
            } else {
                Ok(())
            }
        }

        fn open(&mut self, url: &str) -> Result<(), RendererError> {
            self.record(&format!("open {url}"));
            Ok(())
        }

        fn resize(&mut self, width: u32, height: u32) -> Result<(), RendererError> {
            self.record(&format!("resize {width}x{height}"));
            Ok(())
        }

        fn close(&mut self) -> Result<(), RendererError> {
            self.record("close");
            Ok(())
        }
    }

    #[test]
    fn commands_execute_in_order_on_the_control_thread() {
        let (renderer, log) = RecordingRenderer::pair(false);
        let handle = RendererHandle::spawn(Box::new(renderer)).unwrap();

        handle.start(TIMEOUT).unwrap();
        handle.open("http://127.0.0.1:9/", TIMEOUT).unwrap();
        handle.resize(800, 600, TIMEOUT).unwrap();
        handle.close(TIMEOUT).unwrap();
        handle.shutdown().unwrap();

        let log = log.lock().unwrap();
        assert_eq!(
            *log,
            vec![
                "start",
                "open http://127.0.0.1:9/",
                "resize 800x600",
                "close",
                // The loop closes once more on its way out.
                "close",
            ]
        );
    }

    #[test]
    fn failed_start_closes_the_renderer_before_reporting() {
        let (renderer, log) = RecordingRenderer::pair(true);
        let handle = RendererHandle::spawn(Box::new(renderer)).unwrap();

        let err = handle.start(TIMEOUT).unwrap_err();
        assert!(matches!(err, RendererError::Launch(_)));
        handle.shutdown().unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log[..2], ["start".to_owned(), "close".to_owned()]);
    }

    #[test]
    fn shutdown_without_commands_is_clean() {
        let (renderer, log) = RecordingRenderer::pair(false);
        let handle = RendererHandle::spawn(Box::new(renderer)).unwrap();
        handle.shutdown().unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["close".to_owned()]);
    }
}
