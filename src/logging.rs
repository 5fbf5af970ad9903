//! Log subscriber setup for bean-container
//!
//! The container logs through `tracing` under the `bean_container` target,
//! and advice activity under `bean_container::advice`. This module installs
//! a `tracing-subscriber` formatter for applications that do not bring their
//! own.
//!
//! # Features
//!
//! - `logging` - Emit container events through `tracing` (default)
//! - `logging-json` - JSON lines output
//! - `logging-pretty` - Multi-line human-readable output
//!
//! Without one of the two subscriber features, [`LoggingBuilder::init`] does
//! nothing and returns `false`.
//!
//! # Example
//!
//! ```rust
//! use bean_container::logging;
//!
//! let installed = logging::builder()
//!     .debug()
//!     .container_only()
//!     .compact()
//!     .init();
//! # let _ = installed;
//! ```

use tracing::Level;

/// Target every container event is logged under
pub const CONTAINER_TARGET: &str = "bean_container";

/// Target for proxy and advice events
pub const ADVICE_TARGET: &str = "bean_container::advice";

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line. Needs `logging-json`; otherwise falls back
    /// to [`LogFormat::Full`].
    Json,
    /// Multi-line output for development
    Pretty,
    /// Single-line output
    Compact,
    /// The `tracing-subscriber` default formatter
    #[default]
    Full,
}

/// Builder for the log subscriber
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    targets: Vec<&'static str>,
    with_file: bool,
    with_line_number: bool,
    with_thread_ids: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: if cfg!(feature = "logging-json") {
                LogFormat::Json
            } else {
                LogFormat::Full
            },
            targets: Vec::new(),
            with_file: false,
            with_line_number: false,
            with_thread_ids: false,
        }
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    pub fn info(self) -> Self {
        self.with_level(Level::INFO)
    }

    pub fn warn(self) -> Self {
        self.with_level(Level::WARN)
    }

    /// Restrict output to `target` and its children. Can be called more
    /// than once; with no target, every crate is logged.
    pub fn with_target(mut self, target: &'static str) -> Self {
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
        self
    }

    /// Only show container and advice events
    pub fn container_only(self) -> Self {
        self.with_target(CONTAINER_TARGET)
    }

    /// Only show advice events
    pub fn advice_only(self) -> Self {
        self.with_target(ADVICE_TARGET)
    }

    pub fn with_file(mut self) -> Self {
        self.with_file = true;
        self
    }

    pub fn with_line_number(mut self) -> Self {
        self.with_line_number = true;
        self
    }

    pub fn with_thread_ids(mut self) -> Self {
        self.with_thread_ids = true;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn json(self) -> Self {
        self.format(LogFormat::Json)
    }

    pub fn pretty(self) -> Self {
        self.format(LogFormat::Pretty)
    }

    pub fn compact(self) -> Self {
        self.format(LogFormat::Compact)
    }

    /// `EnvFilter` directives for the current settings
    pub fn directives(&self) -> String {
        let level = self.level.as_str().to_ascii_lowercase();
        if self.targets.is_empty() {
            return level;
        }
        self.targets
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Install the subscriber as the global default.
    ///
    /// Returns `false` if a global subscriber was already set.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) -> bool {
        use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

        let filter = EnvFilter::new(self.directives());
        let layer = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_line_number)
            .with_thread_ids(self.with_thread_ids)
            .with_target(true);

        let layer: Box<dyn Layer<Registry> + Send + Sync> = match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Compact => layer.compact().boxed(),
            _ => layer.boxed(),
        };

        tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init()
            .is_ok()
    }

    /// No subscriber feature enabled: nothing to install
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) -> bool {
        false
    }
}

/// Create a new logging builder
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Install a subscriber with default settings
pub fn init() -> bool {
    builder().init()
}

/// Install a subscriber showing container events at DEBUG
pub fn init_container_only() -> bool {
    builder().container_only().debug().init()
}
