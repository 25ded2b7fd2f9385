#![allow(unused_macros)]
use self::simple_logger::SimpleLogger;
use std::ops::Deref;

mod simple_logger;

macro_rules! logger_macro {
    ($name:ident is $rule_level:ident to $target:expr, $d:tt) => {
        macro_rules! $name {
            ($d($d arg:tt)+) => (::log::log!(target: $target, ::log::Level::$rule_level, $d($d arg)+));
        }

        pub(crate) use $name;
    };
    ($name:ident is $rule_level:ident to $target:expr) => {
        logger_macro!($name is $rule_level to $target, $);
    };
}

logger_macro!(user_error is Error to "tsh::user");

logger_macro!(job_info is Info to "tsh::job");

macro_rules! dev_logger_macro {
    ($name:ident is $rule_level:ident to $target:expr, $d:tt) => {
        macro_rules! $name {
            ($d($d arg:tt)+) => {
                if std::cfg!(feature = "dev") {
                    (::log::log!(
                        target: $target,
                        ::log::Level::$rule_level,
                        "{}: {}",
                        std::panic::Location::caller(),
                        format_args!($d($d arg)+)
                    ));
                }
            };
        }

        pub(crate) use $name;
    };
    ($name:ident is $rule_level:ident to $target:expr) => {
        dev_logger_macro!($name is $rule_level to $target, $);
    };
}

dev_logger_macro!(dev_error is Error to "tsh::dev");
dev_logger_macro!(dev_warn is Warn to "tsh::dev");
dev_logger_macro!(dev_info is Info to "tsh::dev");
dev_logger_macro!(dev_debug is Debug to "tsh::dev");

/// A logger that hands every record to the loggers registered for its target prefix.
#[derive(Default)]
pub struct TshLogger(Vec<(String, Box<dyn log::Log>)>);

impl TshLogger {
    /// `prefix` is put in front of every user facing message, the job trace is only wired up
    /// when `verbose` is set.
    pub fn new(prefix: &'static str, verbose: bool) -> Self {
        let mut logger: Self = Default::default();

        logger.add_logger("tsh::user", SimpleLogger::user(prefix));

        if verbose {
            logger.add_logger("tsh::job", SimpleLogger::job_trace());
        }

        #[cfg(feature = "dev")]
        {
            let path = option_env!("TSH_DEV_LOGS")
                .map(|s| s.into())
                .unwrap_or_else(|| {
                    std::env::temp_dir().join(format!("tsh-dev-{}.log", std::process::id()))
                });
            match SimpleLogger::dev_file(&path) {
                Ok(file) => logger.add_logger("tsh::dev", file),
                Err(err) => println_ignore_io_error!("cannot open {}: {err}", path.display()),
            }
        }

        logger
    }

    pub fn into_global_logger(self) {
        log::set_boxed_logger(Box::new(self))
            .map(|()| log::set_max_level(log::LevelFilter::Trace))
            .expect("Could not set previously set logger");
    }

    /// Add a logger for a specific prefix to the stack
    fn add_logger(
        &mut self,
        prefix: impl ToString + Deref<Target = str>,
        logger: impl log::Log + 'static,
    ) {
        let prefix = if prefix.ends_with("::") {
            prefix.to_string()
        } else {
            // given a prefix `my::prefix`, we want to match `my::prefix::somewhere`
            // but not `my::prefix_to_somewhere`
            format!("{}::", prefix.to_string())
        };
        self.0.push((prefix, Box::new(logger)))
    }

    fn matches(prefix: &str, target: &str) -> bool {
        target == &prefix[..prefix.len() - 2] || target.starts_with(prefix)
    }
}

impl log::Log for TshLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level() && metadata.level() <= log::STATIC_MAX_LEVEL
    }

    fn log(&self, record: &log::Record) {
        for (prefix, l) in self.0.iter() {
            if Self::matches(prefix, record.target()) {
                l.log(record);
            }
        }
    }

    fn flush(&self) {
        for (_, l) in self.0.iter() {
            l.flush();
        }
    }
}
