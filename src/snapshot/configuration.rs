//! Device and interface-style configurations a view is rendered under.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A rendering target size with a stable identifier used in filenames.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    /// Identifier used in artifact filenames
    pub id: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Device {
    /// Create a device with a custom identifier
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
        }
    }

    /// 390x844 phone
    pub fn phone() -> Self {
        Self::new("phone", 390, 844)
    }

    /// 320x568 phone
    pub fn phone_small() -> Self {
        Self::new("phone_small", 320, 568)
    }

    /// 820x1180 tablet
    pub fn tablet() -> Self {
        Self::new("tablet", 820, 1180)
    }

    /// 1280x800 desktop window
    pub fn desktop() -> Self {
        Self::new("desktop", 1280, 800)
    }

    /// Parse a preset name or a `WxH` size.
    ///
    /// Custom sizes get the id `WxH`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "phone" => Some(Self::phone()),
            "phone_small" => Some(Self::phone_small()),
            "tablet" => Some(Self::tablet()),
            "desktop" => Some(Self::desktop()),
            custom => {
                let (w, h) = custom.split_once('x')?;
                let width: u32 = w.parse().ok()?;
                let height: u32 = h.parse().ok()?;
                Some(Self::new(format!("{}x{}", width, height), width, height))
            }
        }
    }

    /// (width, height)
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::phone()
    }
}

/// Light/dark appearance a view is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceStyle {
    /// Force light appearance
    Light,
    /// Force dark appearance
    Dark,
    /// Leave the appearance to the view
    #[default]
    Default,
}

impl InterfaceStyle {
    /// Identifier used in artifact filenames
    pub fn id(&self) -> &'static str {
        match self {
            InterfaceStyle::Light => "light",
            InterfaceStyle::Dark => "dark",
            InterfaceStyle::Default => "default",
        }
    }

    /// Parse `light`, `dark` or `default`
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "light" => Some(InterfaceStyle::Light),
            "dark" => Some(InterfaceStyle::Dark),
            "default" => Some(InterfaceStyle::Default),
            _ => None,
        }
    }
}

impl fmt::Display for InterfaceStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One (device, interface style) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Configuration {
    /// Target device
    pub device: Device,
    /// Appearance
    pub interface_style: InterfaceStyle,
}

impl Configuration {
    /// Create a configuration
    pub fn new(device: Device, interface_style: InterfaceStyle) -> Self {
        Self {
            device,
            interface_style,
        }
    }

    /// Filename discriminator: `<device id>_<style id>`
    pub fn id(&self) -> String {
        format!("{}_{}", self.device.id, self.interface_style.id())
    }

    /// Device size in pixels
    pub fn size(&self) -> (u32, u32) {
        self.device.size()
    }

    /// Parse `<device>_<style>`, e.g. `tablet_dark` or `800x600_light`
    pub fn parse(s: &str) -> Option<Self> {
        let (device, style) = s.rsplit_once('_')?;
        Some(Self::new(Device::parse(device)?, InterfaceStyle::parse(style)?))
    }
}

/// Ordered, append-only list of configurations.
///
/// Duplicates are allowed; they resolve to the same artifact files and the
/// later one overwrites the earlier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationSet {
    configs: Vec<Configuration>,
}

impl ConfigurationSet {
    /// An empty set, to be built up with [`ConfigurationSet::add`]
    pub fn new() -> Self {
        Self {
            configs: Vec::new(),
        }
    }

    /// A new set with `config` appended; `self` is left unchanged
    #[must_use]
    pub fn add(&self, config: Configuration) -> Self {
        let mut configs = self.configs.clone();
        configs.push(config);
        Self { configs }
    }

    /// Number of configurations
    pub fn count(&self) -> usize {
        self.configs.len()
    }

    /// Whether the set holds no configurations
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Configurations in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Configuration> {
        self.configs.iter()
    }

    /// Every style for every given device, devices outermost
    pub fn matrix(devices: &[Device], styles: &[InterfaceStyle]) -> Self {
        let configs = devices
            .iter()
            .flat_map(|device| {
                styles
                    .iter()
                    .map(move |style| Configuration::new(device.clone(), *style))
            })
            .collect();
        Self { configs }
    }
}

impl Default for ConfigurationSet {
    /// A single configuration with the default device and style
    fn default() -> Self {
        Self {
            configs: vec![Configuration::default()],
        }
    }
}

impl<'a> IntoIterator for &'a ConfigurationSet {
    type Item = &'a Configuration;
    type IntoIter = std::slice::Iter<'a, Configuration>;

    fn into_iter(self) -> Self::IntoIter {
        self.configs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_id() {
        let config = Configuration::new(Device::phone(), InterfaceStyle::Dark);
        assert_eq!(config.id(), "phone_dark");
        assert_eq!(Configuration::default().id(), "phone_default");
    }

    #[test]
    fn test_add_leaves_original_unchanged() {
        let base = ConfigurationSet::default();
        let extended = base.add(Configuration::new(Device::tablet(), InterfaceStyle::Light));
        assert_eq!(base.count(), 1);
        assert_eq!(extended.count(), 2);
        let ids: Vec<String> = extended.iter().map(Configuration::id).collect();
        assert_eq!(ids, vec!["phone_default", "tablet_light"]);
    }

    #[test]
    fn test_duplicates_allowed() {
        let config = Configuration::new(Device::phone(), InterfaceStyle::Light);
        let set = ConfigurationSet::new().add(config.clone()).add(config);
        assert_eq!(set.count(), 2);
    }

    #[test]
    fn test_parse_device_presets() {
        assert_eq!(Device::parse("tablet"), Some(Device::tablet()));
        assert_eq!(Device::parse("Desktop"), Some(Device::desktop()));
    }

    #[test]
    fn test_parse_device_custom() {
        let device = Device::parse("100x30").unwrap();
        assert_eq!(device.size(), (100, 30));
        assert_eq!(device.id, "100x30");
    }

    #[test]
    fn test_parse_device_invalid() {
        assert_eq!(Device::parse("invalid"), None);
        assert_eq!(Device::parse("100"), None);
    }

    #[test]
    fn test_parse_configuration() {
        let config = Configuration::parse("phone_small_dark").unwrap();
        assert_eq!(config.device, Device::phone_small());
        assert_eq!(config.interface_style, InterfaceStyle::Dark);
        assert_eq!(Configuration::parse("phone"), None);
    }

    #[test]
    fn test_matrix_order() {
        let set = ConfigurationSet::matrix(
            &[Device::phone(), Device::tablet()],
            &[InterfaceStyle::Light, InterfaceStyle::Dark],
        );
        let ids: Vec<String> = set.iter().map(Configuration::id).collect();
        assert_eq!(
            ids,
            vec!["phone_light", "phone_dark", "tablet_light", "tablet_dark"]
        );
    }
}
