//! Device and platform metadata
//!
//! Lookups are best-effort. A provider that cannot answer returns `None`
//! and the normalizer carries on with empty fields.

use crate::types::{Platform, Size};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Operating system as reported by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsDescriptor {
    pub name: String,
    pub version: String,
}

/// Hardware details as reported by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDetails {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    /// OS release string on platforms that report one separately
    pub release: Option<String>,
}

/// Best-effort device metadata lookup
pub trait DeviceMetadataProvider: Send + Sync {
    fn os(&self) -> Option<OsDescriptor>;

    fn device_details(&self) -> Option<DeviceDetails> {
        None
    }

    /// Current window size, used while fullscreen
    fn window_size(&self) -> Option<Size> {
        None
    }
}

/// Provider with fixed answers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticDevice {
    pub os: Option<OsDescriptor>,
    pub details: Option<DeviceDetails>,
    pub window: Option<Size>,
}

impl StaticDevice {
    /// Provider that knows nothing
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn new(os_name: impl Into<String>, os_version: impl Into<String>) -> Self {
        Self {
            os: Some(OsDescriptor {
                name: os_name.into(),
                version: os_version.into(),
            }),
            ..Default::default()
        }
    }

    pub fn with_details(mut self, details: DeviceDetails) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_window(mut self, window: Size) -> Self {
        self.window = Some(window);
        self
    }
}

impl DeviceMetadataProvider for StaticDevice {
    fn os(&self) -> Option<OsDescriptor> {
        self.os.clone()
    }

    fn device_details(&self) -> Option<DeviceDetails> {
        self.details.clone()
    }

    fn window_size(&self) -> Option<Size> {
        self.window
    }
}

/// Device fields merged into the sink configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub os_name: String,
    pub os_version: String,
    pub browser: String,
    pub browser_version: String,
    pub device_manufacturer: String,
    pub device_model: String,
    pub device_name: String,
    pub device_category: String,
}

impl DeviceInfo {
    /// Collect from a provider. The host application stands in for the
    /// browser fields.
    pub fn collect(
        provider: &dyn DeviceMetadataProvider,
        application_name: Option<&str>,
        application_version: Option<&str>,
    ) -> Self {
        let os = provider.os().unwrap_or_default();
        let details = provider.device_details().unwrap_or_default();

        let os_version = if Platform::from_os_name(&os.name) == Platform::Ios {
            os.version.clone()
        } else {
            details.release.clone().unwrap_or_default()
        };
        let manufacturer = details.manufacturer.unwrap_or_default();

        Self {
            os_name: os.name,
            os_version,
            browser: application_name.unwrap_or_default().to_string(),
            browser_version: application_version.unwrap_or_default().to_string(),
            device_name: manufacturer.clone(),
            device_manufacturer: manufacturer,
            device_model: details.model.unwrap_or_default(),
            device_category: "Mobile".to_string(),
        }
    }

    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ios_uses_os_version() {
        let device = StaticDevice::new("ios", "17.4").with_details(DeviceDetails {
            manufacturer: Some("Apple".into()),
            model: Some("iPhone15,2".into()),
            release: None,
        });
        let info = DeviceInfo::collect(&device, Some("Kino"), Some("2.1.0"));
        assert_eq!(info.os_version, "17.4");
        assert_eq!(info.device_name, "Apple");
        assert_eq!(info.browser, "Kino");
        assert_eq!(info.device_category, "Mobile");
    }

    #[test]
    fn test_android_uses_release() {
        let device = StaticDevice::new("android", "34").with_details(DeviceDetails {
            manufacturer: Some("Google".into()),
            model: Some("Pixel 8".into()),
            release: Some("14".into()),
        });
        let info = DeviceInfo::collect(&device, None, None);
        assert_eq!(info.os_version, "14");
        assert_eq!(info.device_model, "Pixel 8");
        assert_eq!(info.browser, "");
    }

    #[test]
    fn test_unavailable_provider_yields_empty_record() {
        let info = DeviceInfo::collect(&StaticDevice::unavailable(), None, None);
        assert_eq!(info.os_name, "");
        assert_eq!(info.device_manufacturer, "");
        let map = info.to_map();
        assert_eq!(map.get("device_category"), Some(&Value::from("Mobile")));
        assert_eq!(map.len(), 8);
    }
}
