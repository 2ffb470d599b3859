use std::io;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

pub const DEFAULT_FILTER: &str = "iaw_annotation_crops=info";

/// Forwards formatted tracing lines to the Workers console.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleWriter;

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let line = String::from_utf8_lossy(buf);
        let line = line.trim_end();
        if !line.is_empty() {
            worker::console_log!("{line}");
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for ConsoleWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        *self
    }
}

/// Installs the global subscriber once per isolate.
pub fn init() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(DEFAULT_FILTER))
        .with_writer(ConsoleWriter)
        .with_ansi(false)
        .without_time()
        .try_init();

    if let Err(error) = installed {
        worker::console_error!("tracing subscriber was not installed: {error}");
    }
}
