use std::io::Write;
use std::sync::Once;

use log::LevelFilter;

struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = writeln!(std::io::stderr().lock(), "[{}] {}: {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: ConsoleLogger = ConsoleLogger;
static INIT: Once = Once::new();

/// Info, or Debug with the `verbose_logs` feature.
pub fn default_level() -> LevelFilter {
    if cfg!(feature = "verbose_logs") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Install the console logger once; later calls only adjust the level.
pub fn init_logger(level: LevelFilter) {
    INIT.call_once(|| {
        let _ = log::set_logger(&LOGGER);
    });
    log::set_max_level(level);
}
