//! logger module
//! every line is tagged with the LOG_TAG of the calling module

use std::io::Error;

/// init the logger, level comes from settings `env.log_level`
pub fn init_logger(log_level: &str) -> Result<(), Error> {
    // already initialized
    if log::max_level() != log::LevelFilter::Off {
        println!("logger initialized twice, skipping");
        return Ok(())
    }

    pretty_env_logger::formatted_builder()
        .target(pretty_env_logger::env_logger::Target::Stdout)
        .filter_level(parse_level(log_level))
        .try_init()
        .map_err(|e| Error::new(std::io::ErrorKind::Other, e))?;
    println!("logger initialized");
    Ok(())
}

fn parse_level(log_level: &str) -> log::LevelFilter {
    match log_level {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info
    }
}


/// log with a TAG, supports trace debug info warn error
#[macro_export]
macro_rules! warn {
    ($tag:expr, $($arg:tt)*) => ({
        log::warn!("[{}] {}", $tag, format_args!($($arg)*));
    })
}

#[macro_export]
macro_rules! error {
    ($tag:expr, $($arg:tt)*) => ({
        log::error!("[{}] {}", $tag, format_args!($($arg)*));
    })
}

#[macro_export]
macro_rules! info {
    ($tag:expr, $($arg:tt)*) => ({
        log::info!("[{}] {}", $tag, format_args!($($arg)*));
    })
}

#[macro_export]
macro_rules! debug {
    ($tag:expr, $($arg:tt)*) => ({
        log::debug!("[{}] {}", $tag, format_args!($($arg)*));
    })
}

#[macro_export]
macro_rules! trace {
    ($tag:expr, $($arg:tt)*) => ({
        log::trace!("[{}] {}", $tag, format_args!($($arg)*));
    })
}
