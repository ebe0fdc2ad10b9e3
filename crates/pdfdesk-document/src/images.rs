//! Raster images: embedding as XObjects and composing image-only PDFs.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView};
use lopdf::{Document, ObjectId, Stream, dictionary};

use crate::canvas::{add_resource, append_content, image_operations, resource_name};
use crate::error::DocumentResult;
use crate::pages::{PageSize, new_blank_page, new_document, rebuild_page_tree, save};

/// Quality used when re-encoding images into a PDF.
pub const JPEG_QUALITY: u8 = 90;

/// An image XObject added to a document.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EmbeddedImage {
    pub id: ObjectId,
    pub width: u32,
    pub height: u32,
}

/// Decode `bytes` (PNG, JPEG, WebP, ...) and add it as a DCT-encoded image.
/// Transparency is kept as a soft mask.
pub(crate) fn embed_image(doc: &mut Document, bytes: &[u8]) -> DocumentResult<EmbeddedImage> {
    let decoded = image::load_from_memory(bytes)?;
    let (width, height) = decoded.dimensions();

    let mut jpeg = Vec::new();
    DynamicImage::ImageRgb8(decoded.to_rgb8())
        .write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY))?;

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(width),
        "Height" => i64::from(height),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
    };

    if decoded.color().has_alpha() {
        let alpha: Vec<u8> = decoded.to_rgba8().pixels().map(|p| p.0[3]).collect();
        let mut mask = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        );
        mask.compress()?;
        dict.set("SMask", doc.add_object(mask));
    }

    let mut stream = Stream::new(dict, jpeg);
    stream.allows_compression = false;
    let id = doc.add_object(stream);

    Ok(EmbeddedImage { id, width, height })
}

/// Place each image on its own page of `page_size`, scaled to fit and
/// centred, in the given order.
pub fn images_to_pdf(images: &[Vec<u8>], page_size: PageSize) -> DocumentResult<Vec<u8>> {
    let mut doc = new_document();
    let name = resource_name("Im");
    let mut pages = Vec::with_capacity(images.len());

    for bytes in images {
        let image = embed_image(&mut doc, bytes)?;
        let page_id = new_blank_page(&mut doc, page_size);

        let scale = (page_size.width / image.width as f32).min(page_size.height / image.height as f32);
        let width = image.width as f32 * scale;
        let height = image.height as f32 * scale;
        let x = (page_size.width - width) / 2.0;
        let y = (page_size.height - height) / 2.0;

        add_resource(&mut doc, page_id, b"XObject", &name, image.id)?;
        append_content(&mut doc, page_id, image_operations(&name, x, y, width, height))?;
        pages.push(page_id);
    }

    tracing::debug!(images = images.len(), "Composed image PDF");
    rebuild_page_tree(&mut doc, &pages)?;
    save(&mut doc)
}
