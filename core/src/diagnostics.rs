//! Injected diagnostic sink
//!
//! The parser never writes to the global logger implicitly. It holds a
//! [`Diagnostics`] handle wrapping any [`log::Log`] implementation; the
//! default handle discards everything.

use log::{Level, Log, Metadata, Record};
use std::fmt;

/// Log target used for every parser diagnostic
pub const TARGET: &str = "dcm2tables::parser";

/// A logger that drops every record
pub struct NopLogger;

impl Log for NopLogger {
    fn enabled(&self, _: &Metadata<'_>) -> bool {
        false
    }

    fn log(&self, _: &Record<'_>) {}

    fn flush(&self) {}
}

static NOP: NopLogger = NopLogger;

/// Handle to the sink receiving parser diagnostics
#[derive(Clone, Copy)]
pub struct Diagnostics {
    sink: &'static dyn Log,
}

impl Diagnostics {
    pub fn new(sink: &'static dyn Log) -> Self {
        Self { sink }
    }

    /// Discards all diagnostics
    pub fn disabled() -> Self {
        Self::new(&NOP)
    }

    /// Forwards to whatever logger is installed for the `log` facade
    pub fn global() -> Self {
        Self::new(log::logger())
    }

    pub fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        let metadata = Metadata::builder().level(level).target(TARGET).build();
        if self.sink.enabled(&metadata) {
            self.sink.log(
                &Record::builder()
                    .metadata(metadata)
                    .args(args)
                    .module_path_static(Some(module_path!()))
                    .build(),
            );
        }
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Debug, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Warn, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Error, args);
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::disabled()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics").finish_non_exhaustive()
    }
}
