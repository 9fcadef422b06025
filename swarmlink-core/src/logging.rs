//! Logging abstraction
//!
//! Unified logging macros for every target:
//! - Embedded (`defmt` feature): forwards to defmt
//! - Host tests: prints to stdout
//! - Host non-test: no-op, arguments are still type-checked
//!
//! Format strings must stay within the subset both defmt and `core::fmt`
//! accept: plain `{}` placeholders and `{:?}`, no width or precision.

/// Log error message
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::error!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!("[ERROR] {}", format_args!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}

/// Log warning message
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!("[WARN] {}", format_args!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}

/// Log info message
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!("[INFO] {}", format_args!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}

/// Log debug message
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!("[DEBUG] {}", format_args!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}

/// Log trace message
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::trace!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!("[TRACE] {}", format_args!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}
