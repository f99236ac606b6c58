//! Artwork layout, stored as YAML under the config directory.

use std::path::{Path, PathBuf};

use scrapyard_core::FieldKind;
use serde::{Deserialize, Serialize};

use crate::error::FrontendError;

const LAYOUT_FILE: &str = "artwork-layout.yaml";

/// Where each element of the exported artwork goes.
///
/// Every section may be omitted from the YAML file; missing values take
/// their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtworkLayout {
    pub canvas: CanvasSlot,
    pub screenshot: ScreenshotSlot,
    pub cover: ArtSlot,
    pub logo: LogoSlot,
    pub texture: TextureSlot,
    pub shadow: ShadowStyle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSlot {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotSlot {
    pub max_width: u32,
    pub max_height: u32,
    /// Horizontal shift from the canvas centre
    pub x_offset: i32,
    /// Frame thickness around the screenshot; 0 disables the frame
    pub frame: u32,
    pub frame_color: FrameColor,
    pub corner_radius: u32,
    /// Stretch small screenshots up to the slot
    pub upscale: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtSlot {
    pub max_width: u32,
    pub max_height: u32,
    pub anchor: Anchor,
    pub shadow: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoSlot {
    pub max_width: u32,
    pub max_height: u32,
    pub anchor: Anchor,
    pub shadow: bool,
    /// Record fields tried in order for the logo
    pub sources: Vec<FieldKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSlot {
    pub max_width: u32,
    pub max_height: u32,
    pub placement: TexturePlacement,
    /// Distance from the cover when placed beside it
    pub gap: u32,
    pub shadow: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowStyle {
    pub offset: u32,
    /// 0.0 to 1.0
    pub opacity: f32,
    pub blur_radius: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameColor {
    /// Average colour of the screenshot's border pixels
    #[default]
    Auto,
    /// `#rrggbb`
    #[serde(untagged)]
    Fixed(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopRight,
    #[default]
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TexturePlacement {
    /// Beside the cover, on the side facing the canvas centre
    #[default]
    BesideCover,
    /// Bottom-right corner, independent of the cover
    Corner,
}

impl Default for ArtworkLayout {
    fn default() -> Self {
        Self {
            canvas: CanvasSlot::default(),
            screenshot: ScreenshotSlot::default(),
            cover: ArtSlot {
                max_width: 620,
                max_height: 600,
                anchor: Anchor::BottomLeft,
                shadow: true,
            },
            logo: LogoSlot::default(),
            texture: TextureSlot::default(),
            shadow: ShadowStyle::default(),
        }
    }
}

impl Default for CanvasSlot {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 960,
        }
    }
}

impl Default for ScreenshotSlot {
    fn default() -> Self {
        Self {
            max_width: 1060,
            max_height: 800,
            x_offset: 40,
            frame: 12,
            frame_color: FrameColor::Auto,
            corner_radius: 16,
            upscale: true,
        }
    }
}

impl Default for ArtSlot {
    fn default() -> Self {
        ArtworkLayout::default().cover
    }
}

impl Default for LogoSlot {
    fn default() -> Self {
        Self {
            max_width: 620,
            max_height: 460,
            anchor: Anchor::TopRight,
            shadow: true,
            sources: vec![FieldKind::Wheel, FieldKind::Marquee],
        }
    }
}

impl Default for TextureSlot {
    fn default() -> Self {
        Self {
            max_width: 300,
            max_height: 240,
            placement: TexturePlacement::BesideCover,
            gap: 32,
            shadow: true,
        }
    }
}

impl Default for ShadowStyle {
    fn default() -> Self {
        Self {
            offset: 12,
            opacity: 0.6,
            blur_radius: 4,
        }
    }
}

impl ArtworkLayout {
    /// `~/.config/scrapyard/artwork-layout.yaml`
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("scrapyard").join(LAYOUT_FILE))
    }

    /// Load the user's layout, writing the defaults on first use.
    pub fn load_or_create() -> Result<Self, FrontendError> {
        let path = Self::config_path()
            .ok_or_else(|| FrontendError::invalid_layout("could not determine config directory"))?;
        if path.exists() {
            return Self::load_from(&path);
        }
        let layout = Self::default();
        layout.save_to(&path)?;
        log::info!("Wrote default artwork layout to {}", path.display());
        Ok(layout)
    }

    pub fn load_from(path: &Path) -> Result<Self, FrontendError> {
        let contents = std::fs::read_to_string(path)?;
        let layout: Self = serde_yml::from_str(&contents)
            .map_err(|e| FrontendError::invalid_layout(format!("{}: {}", path.display(), e)))?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), FrontendError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yml::to_string(self)
            .map_err(|e| FrontendError::invalid_layout(format!("cannot serialize layout: {}", e)))?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), FrontendError> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(FrontendError::invalid_layout("canvas has no area"));
        }
        if !(0.0..=1.0).contains(&self.shadow.opacity) {
            return Err(FrontendError::invalid_layout(format!(
                "shadow opacity {} is outside 0.0..=1.0",
                self.shadow.opacity
            )));
        }
        if let FrameColor::Fixed(hex) = &self.screenshot.frame_color {
            if parse_hex_color(hex).is_none() {
                return Err(FrontendError::invalid_layout(format!(
                    "frame colour '{}' is not #rrggbb",
                    hex
                )));
            }
        }
        if let Some(kind) = self.logo.sources.iter().find(|k| !k.is_media()) {
            return Err(FrontendError::invalid_layout(format!(
                "logo source '{}' is not an image field",
                kind.name()
            )));
        }
        Ok(())
    }
}

/// `#rrggbb` (leading `#` optional) to RGB.
pub fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}
