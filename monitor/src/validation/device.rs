//! Device snapshot attached to every consistency report

use crate::types::Platform;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Shortest side, in logical pixels, from which a device counts as a tablet
pub const TABLET_MIN_SIDE: f64 = 600.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub platform: Platform,
    pub width: f64,
    pub height: f64,
    pub pixel_density: f64,
    pub font_scale: f64,
    pub is_tablet: bool,
}

impl DeviceInfo {
    pub fn new(platform: Platform, width: f64, height: f64, pixel_density: f64, font_scale: f64) -> Self {
        Self {
            platform,
            width,
            height,
            pixel_density,
            font_scale,
            is_tablet: width.min(height) >= TABLET_MIN_SIDE,
        }
    }

    /// Small-phone defaults used when the host cannot describe the display
    pub fn conservative(platform: Platform) -> Self {
        Self::new(platform, 375.0, 667.0, 2.0, 1.0)
    }
}

/// Host hook describing the current display. `None` means the capability
/// is unavailable.
pub trait DeviceInfoProvider: Send + Sync {
    fn device_info(&self) -> Option<DeviceInfo>;
}

/// Provider that always returns the same snapshot
pub struct StaticDeviceInfo(pub DeviceInfo);

impl DeviceInfoProvider for StaticDeviceInfo {
    fn device_info(&self) -> Option<DeviceInfo> {
        Some(self.0.clone())
    }
}

/// Provider for hosts with no display API
pub struct UnavailableDeviceInfo;

impl DeviceInfoProvider for UnavailableDeviceInfo {
    fn device_info(&self) -> Option<DeviceInfo> {
        None
    }
}

/// Ask the provider, falling back to [`DeviceInfo::conservative`]
pub fn resolve(provider: &dyn DeviceInfoProvider, platform: Platform) -> DeviceInfo {
    match provider.device_info() {
        Some(info) if info.width > 0.0 && info.height > 0.0 => info,
        Some(info) => {
            warn!(width = info.width, height = info.height, "Invalid display size, using defaults");
            DeviceInfo::conservative(platform)
        }
        None => {
            warn!(%platform, "Device info unavailable, using defaults");
            DeviceInfo::conservative(platform)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tablet_flag() {
        assert!(!DeviceInfo::new(Platform::Ios, 390.0, 844.0, 3.0, 1.0).is_tablet);
        assert!(DeviceInfo::new(Platform::Android, 1280.0, 800.0, 2.0, 1.0).is_tablet);
        assert!(DeviceInfo::new(Platform::Web, 600.0, 900.0, 1.0, 1.0).is_tablet);
    }

    #[test]
    fn test_fallbacks() {
        let info = resolve(&UnavailableDeviceInfo, Platform::Android);
        assert_eq!(info, DeviceInfo::conservative(Platform::Android));
        assert_eq!(info.width, 375.0);
        assert!(!info.is_tablet);

        let broken = StaticDeviceInfo(DeviceInfo::new(Platform::Web, 0.0, 0.0, 1.0, 1.0));
        assert_eq!(resolve(&broken, Platform::Web).height, 667.0);

        let tablet = DeviceInfo::new(Platform::Ios, 820.0, 1180.0, 2.0, 1.2);
        assert_eq!(resolve(&StaticDeviceInfo(tablet.clone()), Platform::Ios), tablet);
    }
}
