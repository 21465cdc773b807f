//! Loopback audio spectrum visualization.
//!
//! Captures whatever the default output device is playing, transforms it into a
//! spectrum and maps that onto a row of bars with falling peak markers.  Drawing the
//! bars is left to the caller.
//!
//! # Example
//! ```rust,no_run
//! fn main() -> loopvis_core::Result<()> {
//!     // Initialize the logger.  Take a look at the sources if you want to customize
//!     // the logger.
//!     loopvis_core::default_log();
//!
//!     // Load the default config source.  More about config later on.
//!     loopvis_core::default_config();
//!
//!     // Everything not set here is taken from the config
//!     let mut frames = loopvis_core::Visualizer::new()
//!         .width(640)
//!         .refresh_rate(30.0)
//!         .frames()?;
//!
//!     loop {
//!         let frame = frames.next_frame()?;
//!
//!         // This is just a primitive example, your drawing code belongs here
//!         for (level, hat) in frames.plot().bars() {
//!             print!("{:>3}/{:>3} ", (level * 100.0) as u8, (hat * 100.0) as u8);
//!         }
//!         println!("");
//!
//!         std::thread::sleep(frames.target_interval());
//! #
//! #       if frame.frame > 20 {
//! #           break Ok(());
//! #       }
//!     }
//! }
//! ```
pub mod analyzer;
pub mod capture;
pub mod error;
pub mod frames;
pub mod helpers;
pub mod plot;
pub mod recorder;
pub mod visualizer;

#[doc(inline)]
pub use crate::error::{Error, Result};
#[doc(inline)]
pub use crate::frames::{Frame, Frames};
#[doc(inline)]
pub use crate::visualizer::Visualizer;

/// `ezconf` configuration
///
/// Usually you will call [`default_config`](fn.default_config.html) in the beginning
/// which will populate this object, but you can also specify your own custom config
/// sources.
///
/// # Example
/// To make use of this config, use code similar to this:
///
/// ```rust
/// # loopvis_core::default_config();
/// let refresh_rate = loopvis_core::CONFIG.get_or(
///     // Toml path to value
///     "display.refresh_rate",
///     // Default value.  Type gets inferred from this
///     60.0,
/// );
/// ```
pub static CONFIG: ezconf::Config = ezconf::INIT;

/// Initialize config from default sources
///
/// The default sources are:
/// * `./loopvis.toml`
/// * `./config/loopvis.toml`
/// * Defaults from code
pub fn default_config() {
    CONFIG
        .init(
            [
                ezconf::Source::File("loopvis.toml"),
                ezconf::Source::File("config/loopvis.toml"),
            ]
            .iter(),
        )
        .expect("Can't load config");
}

/// Initialize logger
///
/// By default, enable debug output in debug-builds.
pub fn default_log() {
    init_log(false);
}

/// Initialize logger for hosts drawing into the terminal stderr is attached to
///
/// Stays silent unless `RUST_LOG` asks for output, e.g. `RUST_LOG=debug loopvis 2>loopvis.log`.
pub fn terminal_log() {
    init_log(true);
}

fn init_log(interactive: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(fallback_level(interactive));
    }
    builder.init();

    color_backtrace::install();
}

fn fallback_level(interactive: bool) -> log::LevelFilter {
    if interactive {
        log::LevelFilter::Off
    } else if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_level() {
        assert_eq!(fallback_level(true), log::LevelFilter::Off);
        assert!(fallback_level(false) >= log::LevelFilter::Error);
        if cfg!(debug_assertions) {
            assert_eq!(fallback_level(false), log::LevelFilter::Debug);
        }
    }
}
