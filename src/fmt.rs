//! Logging front end
//!
//! Library code logs through these macros. With the `defmt` feature the
//! messages go to `defmt`, otherwise to the `log` facade, where the
//! application installs the logger. Format strings stick to the subset both
//! backends accept (`{}`, `{:?}`, `{:#x}`).

macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::debug!($($arg)*);
        #[cfg(not(feature = "defmt"))]
        log::debug!($($arg)*);
    }};
}

macro_rules! warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::warn!($($arg)*);
        #[cfg(not(feature = "defmt"))]
        log::warn!($($arg)*);
    }};
}

macro_rules! error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::error!($($arg)*);
        #[cfg(not(feature = "defmt"))]
        log::error!($($arg)*);
    }};
}
