// SPDX-License-Identifier: MIT
//
// vtline — a scrolling status line driven by vtline-console.
//
// This binary is the smallest render loop that exercises the whole
// console layer:
//
//   signal bridge thread → cancel callback / resize channel
//   render loop          → append → scroll_down(column) → flush
//
// Every tick it scrolls down one line and prints a status line with the
// frame and resize counters. Ctrl-C (or SIGTERM, SIGQUIT) cancels the
// shared context; the loop notices, the bridge exits, and the process
// leaves the cursor on a fresh line.
//
// Usage:
//   vtline [--stderr] [--frames N] [--interval-ms MS]
//
// Logging goes to stderr and is filtered by RUST_LOG (default: warn).

use std::env;
use std::process;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthStr;

use vtline_console::{
    CancelToken, ConsoleWriter, FlushError, SignalHandler, new_stderr_writer, new_stdout_writer,
};

/// Default tick length (milliseconds).
const DEFAULT_INTERVAL_MS: u64 = 250;

// ─── Options ────────────────────────────────────────────────────────────────

/// Command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Options {
    /// Render to stderr instead of stdout.
    stderr: bool,
    /// Stop after this many frames. `None` runs until cancelled.
    frames: Option<u64>,
    /// Time between frames.
    interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            stderr: false,
            frames: None,
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
        }
    }
}

/// Parse arguments (without the program name).
fn parse_args<I, S>(args: I) -> Result<Options, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = Options::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_ref() {
            "--stderr" => options.stderr = true,
            "--frames" => {
                let n = next_number(&mut args, "--frames")?;
                options.frames = Some(n);
            }
            "--interval-ms" => {
                let ms = next_number(&mut args, "--interval-ms")?;
                options.interval = Duration::from_millis(ms);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    Ok(options)
}

fn next_number<S: AsRef<str>>(args: &mut impl Iterator<Item = S>, flag: &str) -> Result<u64, String> {
    let value = args.next().ok_or_else(|| format!("{flag} needs a value"))?;
    value
        .as_ref()
        .parse()
        .map_err(|_| format!("{flag}: not a number: {}", value.as_ref()))
}

// ─── Ticker ─────────────────────────────────────────────────────────────────

/// Render state carried from frame to frame.
#[derive(Debug, Default)]
struct Ticker {
    frame: u64,
    resizes: u64,
    /// Display width of the line printed last frame, i.e. the cursor column.
    column: usize,
}

impl Ticker {
    /// The status text for the current frame.
    fn status_line(&self) -> String {
        format!("› frame {} · resizes {}", self.frame, self.resizes)
    }

    /// Append one frame to `out`.
    ///
    /// The first frame prints in place; later frames scroll down a line
    /// first, telling the writer where the cursor sits so legacy consoles
    /// can put it back.
    fn render(&mut self, out: &mut impl ConsoleWriter) {
        if self.frame > 0 {
            out.scroll_down(i32::try_from(self.column).unwrap_or(i32::MAX));
        }
        let line = self.status_line();
        out.write_raw(b"\r");
        out.write_text(&line);
        self.column = line.width();
        self.frame += 1;
    }
}

// ─── Render loop ────────────────────────────────────────────────────────────

/// Run the render loop until cancelled or out of frames.
fn run(options: &Options, out: &mut impl ConsoleWriter) -> Result<(), FlushError> {
    let mut handler = SignalHandler::new();
    let resized = handler.resize_events();
    let ctx = CancelToken::new();

    let bridge = {
        let cancel_ctx = ctx.clone();
        handler.spawn(ctx.clone(), move || cancel_ctx.cancel())
    };
    let bridge = match bridge {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::warn!(%err, "signal bridge unavailable, Ctrl-C will not be handled");
            None
        }
    };

    let mut ticker = Ticker::default();
    let result = loop {
        if let Some(rx) = &resized {
            while rx.try_recv().is_ok() {
                ticker.resizes += 1;
            }
        }

        ticker.render(out);
        if let Err(err) = out.flush() {
            break Err(err);
        }

        if options.frames.is_some_and(|n| ticker.frame >= n) {
            break Ok(());
        }
        if ctx.wait_timeout(options.interval) {
            tracing::debug!(frames = ticker.frame, "cancelled");
            break Ok(());
        }
    };

    ctx.cancel();
    join_bridge(bridge);

    out.write_raw(b"\r\n");
    result.and(out.flush())
}

/// Wait for the bridge thread. Returns `false` if it panicked.
fn join_bridge(bridge: Option<JoinHandle<()>>) -> bool {
    let Some(handle) = bridge else {
        return true;
    };
    match handle.join() {
        Ok(()) => true,
        Err(_) => {
            tracing::warn!("signal bridge panicked");
            false
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = parse_args(env::args().skip(1)).unwrap_or_else(|e| {
        eprintln!("vtline: {e}");
        eprintln!("usage: vtline [--stderr] [--frames N] [--interval-ms MS]");
        process::exit(2);
    });

    let result = if options.stderr {
        run(&options, &mut new_stderr_writer())
    } else {
        run(&options, &mut new_stdout_writer())
    };

    if let Err(e) = result {
        eprintln!("vtline: {e}");
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
