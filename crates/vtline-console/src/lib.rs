// SPDX-License-Identifier: MIT
//
// vtline-console — buffered VT100 output and signal plumbing for vtline.
//
// A line editor renders a frame by appending escape sequences and text
// to a writer, then flushing once. This crate owns that writer and the
// one concurrent piece around it: a bridge that turns SIGINT, SIGTERM,
// SIGQUIT and SIGWINCH into a cancellation callback and resize events.
//
// Which writer a build gets is fixed at compile time. Unix builds write
// raw VT100 to the stdout/stderr descriptors with partial-write resume
// and a small retry budget. Windows builds write through a console stream
// with virtual-terminal processing on, and trade the Index sequence the
// console lacks for a line feed plus cursor-forward.

pub mod context;
pub mod error;
pub mod legacy;
pub mod output;
pub mod posix;
pub mod retry;
pub mod scroll;
pub mod signal;
pub mod writer;

pub use context::CancelToken;
pub use error::FlushError;
pub use retry::RetryPolicy;
pub use signal::{SignalConfig, SignalHandler};
#[allow(deprecated)]
pub use writer::{
    ConsoleWriter, StdWriter, new_standard_output_writer, new_stderr_writer, new_stdout_writer,
};
