//! Line-oriented sink for recoverable engine errors.
//!
//! Each report becomes exactly one `\n`-terminated line in the caller's
//! writer and is mirrored to the `log` facade at ERROR. The line text is
//! stable; operators grep for it.

use std::{
    io::Write,
    sync::{Mutex, PoisonError},
};

pub struct Diagnostics {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Diagnostics {
    pub fn new<W: Write + Send + 'static>(sink: W) -> Self {
        Self { sink: Mutex::new(Box::new(sink)) }
    }

    pub fn error(&self, line: &str) {
        log::error!(target: "rules::diagnostics", "{line}");

        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(sink, "{line}").and_then(|_| sink.flush()) {
            log::warn!("diagnostics sink write failed: {e}");
        }
    }
}
