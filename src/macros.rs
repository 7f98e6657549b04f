//! Small crate-wide convenience macros.

/// Log a formatted line to the browser console in debug builds.
///
/// Compiles to nothing in release builds and on non-wasm targets, so the
/// reducers can log freely while still running under plain `cargo test`.
///
/// ```rust,ignore
/// debug_log!("opening channel for {} (gen {})", id, generation);
/// ```
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {{
        #[cfg(all(debug_assertions, target_arch = "wasm32"))]
        {
            web_sys::console::log_1(&format!($($arg)*).into());
        }
        #[cfg(not(all(debug_assertions, target_arch = "wasm32")))]
        {
            if false {
                let _ = format!($($arg)*);
            }
        }
    }};
}

/// Like `debug_log!` but always emitted on wasm, as a console warning.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {{
        #[cfg(target_arch = "wasm32")]
        {
            web_sys::console::warn_1(&format!($($arg)*).into());
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            if false {
                let _ = format!($($arg)*);
            }
        }
    }};
}
