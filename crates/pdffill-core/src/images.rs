//! Image decoding and XObject embedding
//!
//! Signature and photo payloads arrive as base64 data-URLs. The declared
//! subtype drives the path: JPEG bytes embed as-is behind a DCTDecode
//! filter, PNG decodes to raw RGB with a DeviceGray soft mask carrying
//! the alpha channel, WebP transcodes to JPEG first. Anything else is
//! rejected here and becomes a placeholder box upstream.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat};
use lopdf::{dictionary, Document, ObjectId, Stream};
use signfast_types::{ImageData, ImageMime};

use crate::error::PdfFillError;

/// An image registered in the document, ready to reference from a
/// content stream.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedImage {
    pub xobject_id: ObjectId,
    pub width: u32,
    pub height: u32,
}

/// Decode a payload and add it to the document as an image XObject.
///
/// Errors here are per-field: the caller converts them into placeholder
/// boxes instead of aborting the render.
pub fn embed_image(doc: &mut Document, image: &ImageData) -> Result<EmbeddedImage, PdfFillError> {
    match image.mime {
        ImageMime::Jpeg => {
            let decoded = decode(&image.bytes, ImageFormat::Jpeg)?;
            let (width, height) = decoded.dimensions();
            Ok(embed_jpeg_bytes(doc, image.bytes.clone(), width, height))
        }
        ImageMime::Png => {
            let decoded = decode(&image.bytes, ImageFormat::Png)?;
            Ok(embed_rgba(doc, &decoded))
        }
        ImageMime::Webp => {
            // The embed step only handles PNG and JPEG; re-encode.
            let decoded = decode(&image.bytes, ImageFormat::WebP)?;
            let (width, height) = decoded.dimensions();
            let mut jpeg = Vec::new();
            DynamicImage::ImageRgb8(decoded.to_rgb8())
                .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
                .map_err(|e| PdfFillError::ImageEmbed(format!("WebP transcode failed: {}", e)))?;
            Ok(embed_jpeg_bytes(doc, jpeg, width, height))
        }
        ImageMime::Other(ref subtype) => Err(PdfFillError::ImageEmbed(format!(
            "Unsupported image subtype: {}",
            subtype
        ))),
    }
}

fn decode(bytes: &[u8], format: ImageFormat) -> Result<DynamicImage, PdfFillError> {
    image::load_from_memory_with_format(bytes, format)
        .map_err(|e| PdfFillError::ImageDecode(e.to_string()))
}

/// JPEG data goes into the document untouched; the viewer decompresses.
fn embed_jpeg_bytes(doc: &mut Document, bytes: Vec<u8>, width: u32, height: u32) -> EmbeddedImage {
    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        bytes,
    );
    EmbeddedImage {
        xobject_id: doc.add_object(stream),
        width,
        height,
    }
}

/// Decoded pixels split into an RGB image stream and a DeviceGray soft
/// mask so PNG transparency survives.
fn embed_rgba(doc: &mut Document, decoded: &DynamicImage) -> EmbeddedImage {
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for pixel in rgba.pixels() {
        rgb.push(pixel[0]);
        rgb.push(pixel[1]);
        rgb.push(pixel[2]);
        alpha.push(pixel[3]);
    }

    let smask = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        alpha,
    );
    let smask_id = doc.add_object(smask);

    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "SMask" => smask_id,
        },
        rgb,
    );
    EmbeddedImage {
        xobject_id: doc.add_object(stream),
        width,
        height,
    }
}
