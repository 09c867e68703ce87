use std::sync::OnceLock;

static LOG_FILTER: OnceLock<env_filter::Filter> = OnceLock::new();

/// Quickly initialize logging, for tests and small programs.
///
/// Same as `init_log(log::LevelFilter::Warn)`
pub fn log_init() {
    init_log(log::LevelFilter::Warn)
}

/// Install a logger that prints to stderr.
///
/// If the `RUST_LOG` environment variable is set, messages are filtered
/// the same way as [`env_logger`](https://docs.rs/env_logger/latest/env_logger/#enabling-logging),
/// otherwise by `level`. Calling this more than once has no further effect
/// on the filter.
pub fn init_log(level: log::LevelFilter) {
    let log_level = if let Ok(value) = std::env::var("RUST_LOG")
        && !value.is_empty()
    {
        let mut builder = env_filter::Builder::new();
        let filter = builder.parse(&value).build();
        let log_level = filter.filter();
        let _ = LOG_FILTER.set(filter);
        log_level.max(level)
    } else {
        level
    };
    log::set_max_level(log_level);

    struct LogImpl;
    impl log::Log for LogImpl {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            match LOG_FILTER.get() {
                Some(filter) => filter.enabled(metadata),
                None => metadata.level() <= log::max_level(),
            }
        }

        fn log(&self, record: &log::Record) {
            if !self.enabled(record.metadata()) {
                return;
            }
            eprintln!(
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            );
        }

        fn flush(&self) {}
    }

    let _ = log::set_logger(&LogImpl);
}
