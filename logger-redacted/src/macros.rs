// Logging macros that redact the formatted message before emitting it.

#[macro_export]
macro_rules! redacted_debug {
    ($($arg:tt)*) => {
        $crate::__tracing::debug!("{}", $crate::redact_message(&format!($($arg)*)))
    };
}

#[macro_export]
macro_rules! redacted_info {
    ($($arg:tt)*) => {
        $crate::__tracing::info!("{}", $crate::redact_message(&format!($($arg)*)))
    };
}

#[macro_export]
macro_rules! redacted_warn {
    ($($arg:tt)*) => {
        $crate::__tracing::warn!("{}", $crate::redact_message(&format!($($arg)*)))
    };
}

#[macro_export]
macro_rules! redacted_error {
    ($($arg:tt)*) => {
        $crate::__tracing::error!("{}", $crate::redact_message(&format!($($arg)*)))
    };
}
