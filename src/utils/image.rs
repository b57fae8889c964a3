//! 图片归一化工具
//!
//! 拍摄的药品标签照片在发给提取服务前统一缩放并重编码为JPEG，
//! 控制上传体积和API成本

use crate::models::ImageSettings;
use anyhow::Result;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::io::BufWriter;
use tracing::debug;

/// 归一化图片：按配置缩放到上限分辨率内，并以指定质量重编码JPEG
///
/// 保持宽高比缩放（标签文字不能被拉伸变形），小于上限的图片不放大
pub fn normalize_image(data: &[u8], settings: &ImageSettings) -> Result<Vec<u8>> {
    let img = image::load_from_memory(data)?;

    let resized = if let Some((max_width, max_height)) = settings.resolution.dimensions() {
        resize_to_fit(img, max_width, max_height)
    } else {
        img
    };

    encode_jpeg(&resized, settings.image_quality)
}

/// 保持宽高比缩放到边界内
fn resize_to_fit(img: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    if img.width() <= max_width && img.height() <= max_height {
        return img;
    }

    debug!(
        "缩放图片: {}x{} -> 上限 {}x{}",
        img.width(),
        img.height(),
        max_width,
        max_height
    );
    img.resize(max_width, max_height, image::imageops::FilterType::Lanczos3)
}

/// 使用 JpegEncoder 来指定质量参数
fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    // JPEG不支持alpha通道，统一转RGB8
    let rgb = img.to_rgb8();

    let mut buffer = Vec::new();
    {
        let writer = BufWriter::new(&mut buffer);
        let mut encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));
        encoder.encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ColorType::Rgb8,
        )?;
    }

    Ok(buffer)
}
