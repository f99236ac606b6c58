//! Composite export artwork from a record's images.
//!
//! The screenshot is required and fills the centre of the canvas inside a
//! frame. Cover and logo are anchored to corners; the media texture sits
//! next to the cover. Images come straight from the record: cached files
//! are opened in place, in-memory data is decoded, URLs are ignored.

use std::path::PathBuf;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use scrapyard_core::{FieldKind, Media, ResolvedRecord};
use scrapyard_lib::{Compositor, EngineError};

use crate::error::FrontendError;
use crate::layout::{
    Anchor, ArtworkLayout, FrameColor, ShadowStyle, TexturePlacement, parse_hex_color,
};

/// Gap kept between an unshadowed element and the canvas border.
const EDGE_MARGIN: i64 = 8;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Renders `<export dir>/<base name>.png` for records served from the cache.
pub struct ArtworkCompositor {
    layout: ArtworkLayout,
    export_dir: PathBuf,
}

/// Placed element on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rect {
    pub x: i64,
    pub y: i64,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    fn right(&self) -> i64 {
        self.x + self.w as i64
    }

    fn bottom(&self) -> i64 {
        self.y + self.h as i64
    }
}

impl ArtworkCompositor {
    pub fn new(layout: ArtworkLayout, export_dir: impl Into<PathBuf>) -> Result<Self, FrontendError> {
        layout.validate()?;
        Ok(Self {
            layout,
            export_dir: export_dir.into(),
        })
    }

    pub fn layout(&self) -> &ArtworkLayout {
        &self.layout
    }

    pub fn output_path(&self, base_name: &str) -> PathBuf {
        self.export_dir.join(format!("{}.png", base_name))
    }

    /// Render the artwork for `record`, or `None` without a screenshot.
    pub fn render(&self, record: &ResolvedRecord) -> Result<Option<RgbaImage>, FrontendError> {
        let Some(screenshot) = load_image(record, FieldKind::Screenshot)? else {
            return Ok(None);
        };
        let layout = &self.layout;
        let mut canvas = RgbaImage::new(layout.canvas.width, layout.canvas.height);

        let framed = frame_screenshot(&screenshot, layout);
        let x = (canvas.width() as i64 - framed.width() as i64) / 2 + layout.screenshot.x_offset as i64;
        let y = (canvas.height() as i64 - framed.height() as i64) / 2;
        imageops::overlay(&mut canvas, &framed, x, y);

        let cover = optional_image(record, FieldKind::Cover).map(|img| {
            let slot = &layout.cover;
            let img = shrink(&img, slot.max_width, slot.max_height);
            let shadow = slot.shadow.then_some(&layout.shadow);
            let rect = anchored(slot.anchor, &img, &canvas, shadow);
            draw(&mut canvas, &img, rect, shadow);
            rect
        });

        let logo = layout
            .logo
            .sources
            .iter()
            .find_map(|kind| optional_image(record, *kind));
        if let Some(img) = logo {
            let slot = &layout.logo;
            let img = shrink(&img, slot.max_width, slot.max_height);
            let shadow = slot.shadow.then_some(&layout.shadow);
            let rect = anchored(slot.anchor, &img, &canvas, shadow);
            draw(&mut canvas, &img, rect, shadow);
        }

        if let Some(img) = optional_image(record, FieldKind::Texture) {
            let slot = &layout.texture;
            let img = shrink(&img, slot.max_width, slot.max_height);
            let shadow = slot.shadow.then_some(&layout.shadow);
            let rect = texture_rect(&img, &canvas, cover, layout, shadow);
            draw(&mut canvas, &img, rect, shadow);
        }

        Ok(Some(canvas))
    }

    fn write(&self, record: &ResolvedRecord, base_name: &str) -> Result<Option<PathBuf>, FrontendError> {
        let Some(canvas) = self.render(record)? else {
            return Ok(None);
        };
        let path = self.output_path(base_name);
        std::fs::create_dir_all(&self.export_dir)?;
        canvas.save(&path)?;
        log::debug!("Artwork written to {}", path.display());
        Ok(Some(path))
    }
}

impl Compositor for ArtworkCompositor {
    fn compose(&self, record: &ResolvedRecord, base_name: &str) -> Result<Option<PathBuf>, EngineError> {
        Ok(self.write(record, base_name)?)
    }
}

/// Decode the image stored under `kind`.
///
/// Missing files and remote URLs count as absent.
pub(crate) fn load_image(record: &ResolvedRecord, kind: FieldKind) -> Result<Option<RgbaImage>, FrontendError> {
    let image = match record.media(kind) {
        Some(Media::File(path)) => {
            if !path.is_file() {
                log::debug!("{} image {} is gone", kind.name(), path.display());
                return Ok(None);
            }
            image::open(path)?
        }
        Some(Media::Data { bytes, .. }) => image::load_from_memory(bytes)?,
        Some(Media::Url(_)) | None => return Ok(None),
    };
    Ok(Some(image.into_rgba8()))
}

/// Like [`load_image`], but an undecodable image is only logged.
fn optional_image(record: &ResolvedRecord, kind: FieldKind) -> Option<RgbaImage> {
    match load_image(record, kind) {
        Ok(image) => image,
        Err(e) => {
            log::warn!("Skipping {} in artwork: {}", kind.name(), e);
            None
        }
    }
}

fn frame_screenshot(screenshot: &RgbaImage, layout: &ArtworkLayout) -> RgbaImage {
    let slot = &layout.screenshot;
    let (w, h) = if slot.upscale {
        fit_to_bounds(screenshot.width(), screenshot.height(), slot.max_width, slot.max_height)
    } else {
        scale_to_fit(screenshot.width(), screenshot.height(), slot.max_width, slot.max_height)
    };
    // Nearest keeps pixel art crisp when enlarging
    let filter = if w > screenshot.width() {
        FilterType::Nearest
    } else {
        FilterType::Lanczos3
    };
    let scaled = imageops::resize(screenshot, w, h, filter);

    let color = match &slot.frame_color {
        FrameColor::Auto => sample_edge_color(&scaled),
        FrameColor::Fixed(hex) => {
            let [r, g, b] = parse_hex_color(hex).unwrap_or([0, 0, 0]);
            Rgba([r, g, b, 255])
        }
    };
    let mut framed = RgbaImage::from_pixel(w + slot.frame * 2, h + slot.frame * 2, color);
    imageops::overlay(&mut framed, &scaled, slot.frame as i64, slot.frame as i64);
    round_corners(&mut framed, slot.corner_radius);
    framed
}

fn shrink(img: &RgbaImage, max_w: u32, max_h: u32) -> RgbaImage {
    let (w, h) = scale_to_fit(img.width(), img.height(), max_w, max_h);
    if (w, h) == img.dimensions() {
        return img.clone();
    }
    imageops::resize(img, w, h, FilterType::Lanczos3)
}

fn margin(shadow: Option<&ShadowStyle>) -> i64 {
    shadow.map_or(EDGE_MARGIN, |s| s.offset as i64)
}

fn anchored(anchor: Anchor, img: &RgbaImage, canvas: &RgbaImage, shadow: Option<&ShadowStyle>) -> Rect {
    let m = margin(shadow);
    let (w, h) = img.dimensions();
    let right = canvas.width() as i64 - w as i64 - m;
    let bottom = canvas.height() as i64 - h as i64 - m;
    let (x, y) = match anchor {
        Anchor::TopLeft => (m, m),
        Anchor::TopRight => (right, m),
        Anchor::BottomLeft => (m, bottom),
        Anchor::BottomRight => (right, bottom),
    };
    Rect { x, y, w, h }
}

/// Beside the cover (bottoms aligned), or bottom-right without one.
pub(crate) fn texture_rect(
    img: &RgbaImage,
    canvas: &RgbaImage,
    cover: Option<Rect>,
    layout: &ArtworkLayout,
    shadow: Option<&ShadowStyle>,
) -> Rect {
    let (w, h) = img.dimensions();
    let gap = layout.texture.gap as i64;
    match (layout.texture.placement, cover) {
        (TexturePlacement::BesideCover, Some(cover)) => {
            let on_left = cover.x + cover.w as i64 / 2 < canvas.width() as i64 / 2;
            let x = if on_left {
                cover.right() + gap
            } else {
                cover.x - gap - w as i64
            };
            Rect {
                x,
                y: cover.bottom() - h as i64,
                w,
                h,
            }
        }
        _ => anchored(Anchor::BottomRight, img, canvas, shadow),
    }
}

fn draw(canvas: &mut RgbaImage, img: &RgbaImage, rect: Rect, shadow: Option<&ShadowStyle>) {
    if let Some(style) = shadow {
        let offset = style.offset as i64;
        imageops::overlay(canvas, &drop_shadow(img, style), rect.x + offset, rect.y + offset);
    }
    imageops::overlay(canvas, img, rect.x, rect.y);
}

/// Largest size within the bounds; never enlarges.
pub(crate) fn scale_to_fit(src_w: u32, src_h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if src_w <= max_w && src_h <= max_h {
        return (src_w, src_h);
    }
    fit_to_bounds(src_w, src_h, max_w, max_h)
}

/// Largest size within the bounds, enlarging if needed.
pub(crate) fn fit_to_bounds(src_w: u32, src_h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if src_w == 0 || src_h == 0 {
        return (0, 0);
    }
    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = (src_w as f64 * scale).round() as u32;
    let h = (src_h as f64 * scale).round() as u32;
    (w.max(1), h.max(1))
}

/// Average colour of the border pixels, fully opaque.
pub(crate) fn sample_edge_color(img: &RgbaImage) -> Rgba<u8> {
    let (w, h) = img.dimensions();
    let edge = img
        .enumerate_pixels()
        .filter(|(x, y, _)| *x == 0 || *y == 0 || *x + 1 == w || *y + 1 == h);

    let mut sums = [0u64; 3];
    let mut count = 0u64;
    for (_, _, p) in edge {
        for (sum, channel) in sums.iter_mut().zip(p.0) {
            *sum += channel as u64;
        }
        count += 1;
    }
    if count == 0 {
        return Rgba([0, 0, 0, 255]);
    }
    let [r, g, b] = sums.map(|s| (s / count) as u8);
    Rgba([r, g, b, 255])
}

/// Black silhouette of `img`'s alpha, blurred.
pub(crate) fn drop_shadow(img: &RgbaImage, style: &ShadowStyle) -> RgbaImage {
    let opacity = (style.opacity * 255.0).clamp(0.0, 255.0) as u16;
    let silhouette = RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        let alpha = img.get_pixel(x, y)[3] as u16;
        Rgba([0, 0, 0, (alpha * opacity / 255) as u8])
    });
    box_blur(&silhouette, style.blur_radius)
}

/// Separable box blur; the kernel is clipped at the borders.
pub(crate) fn box_blur(img: &RgbaImage, radius: u32) -> RgbaImage {
    if radius == 0 || img.width() == 0 || img.height() == 0 {
        return img.clone();
    }
    let horizontal = blur_pass(img, radius, (1, 0));
    blur_pass(&horizontal, radius, (0, 1))
}

fn blur_pass(img: &RgbaImage, radius: u32, (dx, dy): (i64, i64)) -> RgbaImage {
    let (w, h) = (img.width() as i64, img.height() as i64);
    let r = radius as i64;
    RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        let mut sums = [0u32; 4];
        let mut count = 0u32;
        for step in -r..=r {
            let (sx, sy) = (x as i64 + step * dx, y as i64 + step * dy);
            if sx < 0 || sy < 0 || sx >= w || sy >= h {
                continue;
            }
            let p = img.get_pixel(sx as u32, sy as u32);
            for (sum, channel) in sums.iter_mut().zip(p.0) {
                *sum += channel as u32;
            }
            count += 1;
        }
        Rgba(sums.map(|s| (s / count.max(1)) as u8))
    })
}

/// Clear the pixels outside a rounded rectangle, softening the last pixel
/// of each arc.
pub(crate) fn round_corners(img: &mut RgbaImage, radius: u32) {
    let (w, h) = img.dimensions();
    let r = radius.min(w / 2).min(h / 2);
    if r == 0 {
        return;
    }
    for y in 0..h {
        for x in 0..w {
            let Some(distance) = corner_distance(x, y, w, h, r) else {
                continue;
            };
            let coverage = (r as f64 - distance + 0.5).clamp(0.0, 1.0);
            if coverage <= 0.0 {
                img.put_pixel(x, y, TRANSPARENT);
            } else if coverage < 1.0 {
                let p = img.get_pixel_mut(x, y);
                p[3] = (p[3] as f64 * coverage) as u8;
            }
        }
    }
}

/// Distance from the arc centre for pixels inside a corner square.
fn corner_distance(x: u32, y: u32, w: u32, h: u32, r: u32) -> Option<f64> {
    let cx = if x < r {
        r
    } else if x >= w - r {
        w - r
    } else {
        return None;
    };
    let cy = if y < r {
        r
    } else if y >= h - r {
        h - r
    } else {
        return None;
    };
    // Measured from the pixel centre
    let dx = x as f64 + 0.5 - cx as f64;
    let dy = y as f64 + 0.5 - cy as f64;
    Some((dx * dx + dy * dy).sqrt())
}

#[cfg(test)]
#[path = "tests/compositor_tests.rs"]
mod tests;
