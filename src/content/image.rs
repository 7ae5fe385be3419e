//! Reading image XObjects into [`EncodedImage`]s.

use super::ccitt::{decode_ccitt, CcittParams};
use super::scene::{EncodedImage, ImageColor, ImageFilter, ImageSource};
use crate::document::{dict_get, name, number, resolve, stream_data};
use lopdf::{Document, Object, Stream};

/// Read an image XObject.
///
/// `fill_color` is used when the image is a stencil mask.
pub fn read_image(doc: &Document, stream: &Stream, fill_color: [f32; 3]) -> ImageSource {
    let dict = &stream.dict;
    let width = dict_get(doc, dict, b"Width").and_then(number).unwrap_or(0.0) as u32;
    let height = dict_get(doc, dict, b"Height").and_then(number).unwrap_or(0.0) as u32;
    if width == 0 || height == 0 {
        return ImageSource::Unsupported;
    }

    let is_mask = matches!(dict_get(doc, dict, b"ImageMask"), Some(Object::Boolean(true)));
    let bits_per_component = if is_mask {
        1
    } else {
        dict_get(doc, dict, b"BitsPerComponent")
            .and_then(number)
            .unwrap_or(8.0) as u8
    };

    let color = if is_mask {
        ImageColor::Gray
    } else {
        dict_get(doc, dict, b"ColorSpace")
            .map(|cs| image_color(doc, cs))
            .unwrap_or(ImageColor::Unknown)
    };

    let inverted = match dict_get(doc, dict, b"Decode") {
        Some(Object::Array(items)) => items
            .first()
            .and_then(|o| resolve(doc, o))
            .and_then(number)
            .is_some_and(|first| first > 0.5),
        _ => false,
    };

    let filters = filter_names(doc, dict);
    let (filter, data) = match filters.as_slice() {
        [] => (ImageFilter::Raw, stream.content.clone()),
        [only] if only == "DCTDecode" || only == "DCT" => (ImageFilter::Dct, stream.content.clone()),
        [only] if only == "CCITTFaxDecode" || only == "CCF" => {
            let params = CcittParams::from_parms(doc, dict_get(doc, dict, b"DecodeParms"), width, height);
            let data = decode_ccitt(&stream.content, &params);
            return ImageSource::Encoded(EncodedImage {
                width: params.columns,
                height,
                bits_per_component: 1,
                color: ImageColor::Gray,
                filter: ImageFilter::Raw,
                data,
                is_mask,
                mask_color: fill_color,
                inverted,
            });
        },
        // TODO: JPX and JBIG2 images on rebuilt pages still render as placeholders
        names if names.iter().any(|n| n == "JPXDecode" || n == "JBIG2Decode" || n == "CCITTFaxDecode") => {
            log::debug!("Image filter {:?} not supported, using placeholder", names);
            return ImageSource::Unsupported;
        },
        _ => match stream_data(stream) {
            Some(data) => (ImageFilter::Raw, data),
            None => {
                log::debug!("Image stream could not be decompressed ({:?})", filters);
                return ImageSource::Unsupported;
            },
        },
    };

    ImageSource::Encoded(EncodedImage {
        width,
        height,
        bits_per_component,
        color,
        filter,
        data,
        is_mask,
        mask_color: fill_color,
        inverted,
    })
}

fn filter_names(doc: &Document, dict: &lopdf::Dictionary) -> Vec<String> {
    match dict_get(doc, dict, b"Filter") {
        Some(Object::Name(n)) => vec![String::from_utf8_lossy(n).into_owned()],
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|o| resolve(doc, o).and_then(name))
            .collect(),
        _ => Vec::new(),
    }
}

/// Classify an image color space object.
pub fn image_color(doc: &Document, cs: &Object) -> ImageColor {
    match cs {
        Object::Name(n) => match n.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => ImageColor::Gray,
            b"DeviceRGB" | b"CalRGB" | b"RGB" => ImageColor::Rgb,
            b"DeviceCMYK" | b"CMYK" => ImageColor::Cmyk,
            _ => ImageColor::Unknown,
        },
        Object::Array(items) => {
            let family = items.first().and_then(|o| resolve(doc, o)).and_then(name);
            match family.as_deref() {
                Some("ICCBased") => {
                    let n = match items.get(1).and_then(|o| resolve(doc, o)) {
                        Some(Object::Stream(s)) => dict_get(doc, &s.dict, b"N").and_then(number),
                        _ => None,
                    };
                    match n.map(|n| n as u32) {
                        Some(1) => ImageColor::Gray,
                        Some(4) => ImageColor::Cmyk,
                        _ => ImageColor::Rgb,
                    }
                },
                Some("CalGray") => ImageColor::Gray,
                Some("CalRGB") | Some("Lab") => ImageColor::Rgb,
                Some("Indexed") | Some("I") => {
                    let base = items
                        .get(1)
                        .and_then(|o| resolve(doc, o))
                        .map(|b| image_color(doc, b));
                    let base_components = match base {
                        Some(ImageColor::Gray) => 1,
                        Some(ImageColor::Cmyk) => 4,
                        _ => 3,
                    };
                    let palette = match items.get(3).and_then(|o| resolve(doc, o)) {
                        Some(Object::String(bytes, _)) => bytes.clone(),
                        Some(Object::Stream(s)) => stream_data(s).unwrap_or_default(),
                        _ => Vec::new(),
                    };
                    ImageColor::Indexed {
                        base_components,
                        palette,
                    }
                },
                _ => ImageColor::Unknown,
            }
        },
        _ => ImageColor::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_raw_rgb_image() {
        let doc = Document::with_version("1.5");
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 1,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            vec![255, 0, 0, 0, 0, 255],
        );
        let ImageSource::Encoded(img) = read_image(&doc, &stream, [0.0; 3]) else {
            panic!("expected encoded image");
        };
        assert_eq!((img.width, img.height), (2, 1));
        assert_eq!(img.color, ImageColor::Rgb);
        assert_eq!(img.filter, ImageFilter::Raw);
        assert_eq!(img.data.len(), 6);
    }

    #[test]
    fn test_stencil_mask_takes_fill_color() {
        let doc = Document::with_version("1.5");
        let stream = Stream::new(
            dictionary! {
                "Width" => 8,
                "Height" => 1,
                "ImageMask" => true,
            },
            vec![0b1010_1010],
        );
        let ImageSource::Encoded(img) = read_image(&doc, &stream, [1.0, 0.0, 0.0]) else {
            panic!("expected encoded image");
        };
        assert!(img.is_mask);
        assert_eq!(img.bits_per_component, 1);
        assert_eq!(img.mask_color, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_ccitt_image_decodes_to_one_bit_gray() {
        let doc = Document::with_version("1.5");
        let stream = Stream::new(
            dictionary! {
                "Width" => 8,
                "Height" => 2,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 1,
                "Filter" => "CCITTFaxDecode",
                "DecodeParms" => dictionary! { "K" => -1, "Columns" => 8, "Rows" => 2 },
            },
            vec![0b1100_0000, 0b0000_0100, 0b0000_0000, 0b0100_0000],
        );
        let ImageSource::Encoded(img) = read_image(&doc, &stream, [0.0; 3]) else {
            panic!("expected encoded image");
        };
        assert_eq!(img.filter, ImageFilter::Raw);
        assert_eq!(img.bits_per_component, 1);
        assert_eq!(img.color, ImageColor::Gray);
        assert_eq!(img.data, vec![0xFF, 0xFF]);
    }

    #[test]
    fn test_unsupported_filter() {
        let doc = Document::with_version("1.5");
        let stream = Stream::new(
            dictionary! {
                "Width" => 4,
                "Height" => 4,
                "Filter" => "JPXDecode",
            },
            vec![0; 16],
        );
        assert_eq!(read_image(&doc, &stream, [0.0; 3]), ImageSource::Unsupported);
    }
}
