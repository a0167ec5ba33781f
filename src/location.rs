//! Device geolocation.
//! See [Port].

use std::time::Duration;

use async_trait::async_trait;

use crate::gis::Position;

/// How long a position request may take before it fails with [`LocationError::Timeout`].
pub const LOCATE_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration of a single position request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionOptions {
    /// Ask the device for its most accurate fix (e.g. GPS rather than network location).
    pub high_accuracy: bool,
    /// Give up after this long.
    pub timeout: Duration,
    /// Maximum age of a cached fix that may be returned. Zero means a fresh fix is required.
    pub maximum_age: Duration,
}

impl PositionOptions {
    /// Options used when filling in your own position: accurate, fresh, and bounded by
    /// [`LOCATE_TIMEOUT`].
    pub const LOCATE_SELF: PositionOptions = PositionOptions {
        high_accuracy: true,
        timeout: LOCATE_TIMEOUT,
        maximum_age: Duration::ZERO,
    };
}

/// A position reported by the device.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeviceFix {
    /// Reported position.
    pub position: Position,
    /// Accuracy radius in meters, if the device reports it.
    pub accuracy: Option<f64>,
}

/// Reason a position request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// The user (or platform policy) refused access to the location.
    #[error("Please allow location access.")]
    PermissionDenied,
    /// No position could be determined.
    #[error("Location information unavailable.")]
    PositionUnavailable,
    /// No position within [`PositionOptions::timeout`].
    #[error("Request timed out.")]
    Timeout,
    /// Any other failure code reported by the platform.
    #[error("Unknown location error (code {code}).")]
    Unknown {
        /// The platform error code.
        code: u16,
    },
    /// The device has no location service at all, so no request was made.
    #[error("Location is not supported on this device.")]
    Unsupported,
}

impl LocationError {
    /// Map a W3C geolocation `GeolocationPositionError.code`.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            2 => Self::PositionUnavailable,
            3 => Self::Timeout,
            code => Self::Unknown { code },
        }
    }

    /// The W3C geolocation error code for this error, `None` if no request was made.
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::PermissionDenied => Some(1),
            Self::PositionUnavailable => Some(2),
            Self::Timeout => Some(3),
            Self::Unknown { code } => Some(*code),
            Self::Unsupported => None,
        }
    }

    /// Message to show the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unknown { .. } => "Unable to get your location.".to_string(),
            Self::Unsupported => self.to_string(),
            _ => format!("Unable to get your location. {}", self),
        }
    }
}

/// Trait used to allow mocking the device location service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Port: Send + Sync {
    /// Request the current position. Resolves exactly once, and cannot be cancelled once issued.
    async fn request_current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<DeviceFix, LocationError>;
}

/// Implementation of [Port] reporting a configured position, for devices without a location
/// service.
pub struct FixedGateway {
    fix: Option<DeviceFix>,
    latency: Duration,
}

impl FixedGateway {
    /// Construct a new [FixedGateway]. Without a `position` every request fails with
    /// [`LocationError::Unsupported`].
    pub fn new(position: Option<Position>, accuracy: Option<f64>) -> Self {
        Self {
            fix: position.map(|position| DeviceFix { position, accuracy }),
            latency: Duration::ZERO,
        }
    }

    /// Simulate the time taken to acquire a fix.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl Port for FixedGateway {
    async fn request_current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<DeviceFix, LocationError> {
        let Some(fix) = self.fix else {
            tracing::warn!("No device position configured, location is not supported");
            return Err(LocationError::Unsupported);
        };
        tokio::time::timeout(options.timeout, tokio::time::sleep(self.latency))
            .await
            .map_err(|_| LocationError::Timeout)?;
        Ok(fix)
    }
}
