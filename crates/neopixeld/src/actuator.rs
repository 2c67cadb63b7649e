//! The pixel strip driven by relayed commands.
//!
//! Commands never talk to hardware directly. They acquire a [`PixelStrip`]
//! from a [`StripProvider`], buffer their changes and flush them with a single
//! [`PixelStrip::show`]. The daemon ships a [`SimulatedStripProvider`] that
//! keeps the programmed state in memory and logs each flush; hardware drivers
//! plug in behind the same traits.

use std::fmt;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::info;

use neopixel_config::Config;

pub(crate) const ACTUATOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::actuator");

/// A 24-bit colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
}

impl Rgb {
    /// Every channel off.
    pub const OFF: Self = Self::new(0, 0, 0);

    /// Builds a colour from its channels.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

/// Global strip brightness in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Brightness(f32);

impl Brightness {
    /// Full brightness, the driver default.
    pub const FULL: Self = Self(1.0);

    /// Wraps `value` when it is a finite fraction in `[0.0, 1.0]`.
    #[must_use]
    pub fn new(value: f32) -> Option<Self> {
        (value.is_finite() && (0.0..=1.0).contains(&value)).then_some(Self(value))
    }

    /// Pins a finite `value` into `[0.0, 1.0]`, as strip drivers do.
    #[must_use]
    pub fn clamped(value: f32) -> Option<Self> {
        value.is_finite().then(|| Self(value.clamp(0.0, 1.0)))
    }

    /// The wrapped fraction.
    #[must_use]
    pub const fn value(self) -> f32 {
        self.0
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self::FULL
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strip geometry handed to providers on every acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripSettings {
    /// Number of addressable elements.
    pub pixel_count: usize,
}

impl StripSettings {
    /// Reads the strip geometry from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            pixel_count: config.pixel_count(),
        }
    }
}

/// Errors reported by strip providers and drivers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActuatorError {
    /// The strip could not be acquired.
    #[error("pixel strip unavailable: {message}")]
    Unavailable {
        /// Driver supplied detail.
        message: String,
    },
    /// The driver refused the buffered update.
    #[error("pixel strip rejected the update: {message}")]
    Rejected {
        /// Driver supplied detail.
        message: String,
    },
}

impl ActuatorError {
    /// Builds an [`ActuatorError::Unavailable`].
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Builds an [`ActuatorError::Rejected`].
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

/// A strip whose writes are buffered until [`PixelStrip::show`].
#[cfg_attr(test, mockall::automock)]
pub trait PixelStrip: Send {
    /// Number of addressable elements.
    fn pixel_count(&self) -> usize;

    /// Buffers `color` for every element.
    fn fill(&mut self, color: Rgb);

    /// Buffers a new global brightness.
    fn set_brightness(&mut self, brightness: Brightness);

    /// Pushes the buffered state to the strip in one update.
    fn show(&mut self) -> Result<(), ActuatorError>;
}

/// Hands out strips to commands.
#[cfg_attr(test, mockall::automock)]
pub trait StripProvider: Send + Sync {
    /// Acquires the strip described by `settings`.
    fn acquire(&self, settings: StripSettings) -> Result<Box<dyn PixelStrip>, ActuatorError>;
}

/// State last flushed to a simulated strip.
#[derive(Debug, Clone, PartialEq)]
pub struct StripState {
    /// Colour of each element.
    pub pixels: Vec<Rgb>,
    /// Global brightness.
    pub brightness: Brightness,
    /// Number of completed flushes.
    pub flushes: usize,
}

/// In-memory strip used when no hardware driver is attached.
#[derive(Debug, Clone, Default)]
pub struct SimulatedStripProvider {
    state: Arc<Mutex<StripState>>,
}

impl Default for StripState {
    fn default() -> Self {
        Self {
            pixels: Vec::new(),
            brightness: Brightness::FULL,
            flushes: 0,
        }
    }
}

impl SimulatedStripProvider {
    /// Builds a provider whose strip starts dark at full brightness.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the state last flushed to the strip.
    ///
    /// # Errors
    ///
    /// Returns [`ActuatorError::Unavailable`] if a previous flush panicked
    /// while holding the state.
    pub fn snapshot(&self) -> Result<StripState, ActuatorError> {
        self.state
            .lock()
            .map(|state| state.clone())
            .map_err(|_| ActuatorError::unavailable("simulated strip state poisoned"))
    }
}

impl StripProvider for SimulatedStripProvider {
    fn acquire(&self, settings: StripSettings) -> Result<Box<dyn PixelStrip>, ActuatorError> {
        let current = self.snapshot()?;
        let mut pixels = current.pixels;
        pixels.resize(settings.pixel_count, Rgb::OFF);
        Ok(Box::new(SimulatedStrip {
            shared: Arc::clone(&self.state),
            pixels,
            brightness: current.brightness,
        }))
    }
}

struct SimulatedStrip {
    shared: Arc<Mutex<StripState>>,
    pixels: Vec<Rgb>,
    brightness: Brightness,
}

impl PixelStrip for SimulatedStrip {
    fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    fn set_brightness(&mut self, brightness: Brightness) {
        self.brightness = brightness;
    }

    fn show(&mut self) -> Result<(), ActuatorError> {
        let mut shared = self
            .shared
            .lock()
            .map_err(|_| ActuatorError::rejected("simulated strip state poisoned"))?;
        shared.pixels.clone_from(&self.pixels);
        shared.brightness = self.brightness;
        shared.flushes += 1;
        info!(
            target: ACTUATOR_TARGET,
            pixels = shared.pixels.len(),
            first = %shared.pixels.first().copied().unwrap_or_default(),
            brightness = %shared.brightness,
            "strip updated"
        );
        Ok(())
    }
}
