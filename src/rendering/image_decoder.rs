//! Decoding of image samples into tiny-skia pixmaps.

use crate::content::graphics_state::cmyk_to_rgb;
use crate::content::{EncodedImage, ImageColor, ImageFilter};
use crate::error::{Error, Result};
use tiny_skia::{IntSize, Pixmap};

/// Decode an image into a premultiplied RGBA pixmap.
pub fn decode_to_pixmap(image: &EncodedImage) -> Result<Pixmap> {
    let rgba = match image.filter {
        ImageFilter::Dct => decode_jpeg(image)?,
        ImageFilter::Raw => decode_samples(image)?,
    };
    let size = IntSize::from_wh(image.width, image.height)
        .ok_or_else(|| Error::Image(format!("invalid image size {}x{}", image.width, image.height)))?;
    Pixmap::from_vec(premultiply(rgba), size)
        .ok_or_else(|| Error::Image("image buffer does not match its dimensions".to_string()))
}

fn decode_jpeg(image: &EncodedImage) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory_with_format(&image.data, image::ImageFormat::Jpeg)?;
    let mut rgba = decoded.to_rgba8();
    if rgba.width() != image.width || rgba.height() != image.height {
        rgba = image::imageops::resize(
            &rgba,
            image.width,
            image.height,
            image::imageops::FilterType::Triangle,
        );
    }
    let mut data = rgba.into_raw();
    if image.inverted {
        for px in data.chunks_exact_mut(4) {
            px[0] = 255 - px[0];
            px[1] = 255 - px[1];
            px[2] = 255 - px[2];
        }
    }
    Ok(data)
}

/// Unpack raw samples to straight RGBA.
fn decode_samples(image: &EncodedImage) -> Result<Vec<u8>> {
    let bpc = image.bits_per_component;
    if !matches!(bpc, 1 | 2 | 4 | 8 | 16) {
        return Err(Error::Image(format!("unsupported bits per component {}", bpc)));
    }
    let components = match &image.color {
        ImageColor::Gray | ImageColor::Indexed { .. } => 1,
        ImageColor::Rgb => 3,
        ImageColor::Cmyk => 4,
        ImageColor::Unknown => guess_components(image),
    };
    let width = image.width as usize;
    let height = image.height as usize;
    let row_bytes = (width * components * bpc as usize).div_ceil(8);
    let max = ((1u32 << bpc) - 1) as f32;

    let mut rgba = Vec::with_capacity(width * height * 4);
    let mut comps = [0u32; 4];
    for y in 0..height {
        let row = image.data.get(y * row_bytes..(y + 1) * row_bytes).unwrap_or(&[]);
        for x in 0..width {
            for (c, slot) in comps.iter_mut().enumerate().take(components) {
                let mut v = read_sample(row, x * components + c, bpc);
                if image.inverted && !image.is_mask {
                    v = max as u32 - v;
                }
                *slot = v;
            }
            rgba.extend_from_slice(&to_rgba(image, &comps[..components], max));
        }
    }
    Ok(rgba)
}

fn guess_components(image: &EncodedImage) -> usize {
    let pixels = image.width as usize * image.height as usize;
    if pixels > 0 && image.bits_per_component == 8 {
        match image.data.len() / pixels {
            n @ (1 | 3 | 4) => return n,
            _ => {},
        }
    }
    1
}

/// Sample `index` of a row; missing bytes read as zero.
fn read_sample(row: &[u8], index: usize, bpc: u8) -> u32 {
    let byte_at = |i: usize| row.get(i).copied().unwrap_or(0) as u32;
    match bpc {
        8 => byte_at(index),
        16 => (byte_at(index * 2) << 8) | byte_at(index * 2 + 1),
        _ => {
            let bit = index * bpc as usize;
            let shift = 8 - bpc as usize - (bit % 8);
            (byte_at(bit / 8) >> shift) & ((1 << bpc) - 1)
        },
    }
}

fn to_rgba(image: &EncodedImage, comps: &[u32], max: f32) -> [u8; 4] {
    let unit = |v: u32| v as f32 / max;
    let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;

    if image.is_mask {
        // sample 0 paints unless /Decode [1 0]
        let paints = (comps[0] == 0) != image.inverted;
        let [r, g, b] = image.mask_color;
        return if paints {
            [byte(r), byte(g), byte(b), 255]
        } else {
            [0, 0, 0, 0]
        };
    }

    match &image.color {
        ImageColor::Indexed {
            base_components,
            palette,
        } => {
            let n = (*base_components).max(1);
            let start = comps[0] as usize * n;
            let entry = |i: usize| palette.get(start + i).copied().unwrap_or(0);
            match n {
                3 => [entry(0), entry(1), entry(2), 255],
                4 => {
                    let unit8 = |i: usize| entry(i) as f32 / 255.0;
                    let [r, g, b] = cmyk_to_rgb(unit8(0), unit8(1), unit8(2), unit8(3));
                    [byte(r), byte(g), byte(b), 255]
                },
                _ => [entry(0), entry(0), entry(0), 255],
            }
        },
        _ => match comps.len() {
            3 => [byte(unit(comps[0])), byte(unit(comps[1])), byte(unit(comps[2])), 255],
            4 => {
                let [r, g, b] = cmyk_to_rgb(unit(comps[0]), unit(comps[1]), unit(comps[2]), unit(comps[3]));
                [byte(r), byte(g), byte(b), 255]
            },
            _ => {
                let g = byte(unit(comps[0]));
                [g, g, g, 255]
            },
        },
    }
}

/// Straight RGBA to premultiplied RGBA.
fn premultiply(mut rgba: Vec<u8>) -> Vec<u8> {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a < 255 {
            for c in &mut px[..3] {
                *c = ((*c as u16 * a + 127) / 255) as u8;
            }
        }
    }
    rgba
}
