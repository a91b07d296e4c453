use std::borrow::Borrow;
use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use anyhow::Context;
use image::{DynamicImage, ImageFormat, Rgb};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use tracing::info;

use crate::models::Prediction;

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const LABEL_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const LABEL_FONT_SIZE: f32 = 20.0;

/// Draws prediction boxes onto a copy of the input image and saves it as JPEG.
///
/// Labels are only drawn when a font has been loaded.
pub struct DebugRenderer {
    output_dir: PathBuf,
    font: Option<FontVec>,
}

impl std::fmt::Debug for DebugRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugRenderer")
            .field("output_dir", &self.output_dir)
            .field("font", &self.font.is_some())
            .finish()
    }
}

impl DebugRenderer {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            font: None,
        }
    }

    pub fn with_font_file<P: AsRef<Path>>(mut self, font_path: P) -> anyhow::Result<Self> {
        let data = std::fs::read(font_path.as_ref())
            .with_context(|| format!("Failed to read font {:?}", font_path.as_ref()))?;
        let font = FontVec::try_from_vec(data)
            .map_err(|e| anyhow::anyhow!("Invalid font {:?}: {}", font_path.as_ref(), e))?;
        info!(path = ?font_path.as_ref(), "loaded debug font");
        self.font = Some(font);
        Ok(self)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render `predictions` over `image` into `<output_dir>/<file_name>`.
    pub fn render<I>(&self, image: &DynamicImage, predictions: I, file_name: &str) -> anyhow::Result<PathBuf>
    where
        I: IntoIterator,
        I::Item: Borrow<Prediction>,
    {
        let mut canvas = image.to_rgb8();
        let (width, height) = canvas.dimensions();
        let scale = PxScale::from(LABEL_FONT_SIZE);

        let mut drawn = 0usize;
        for prediction in predictions {
            let prediction: &Prediction = prediction.borrow();
            let (x, y, w, h) = prediction.bbox.to_pixels(width, height);
            draw_hollow_rect_mut(&mut canvas, Rect::at(x, y).of_size(w, h), BOX_COLOR);

            if let Some(font) = &self.font {
                let label = format!("{}: {:.2}", prediction.class_name, prediction.score);
                let (_, label_height) = text_size(scale, font, &label);
                let label_y = (y - label_height as i32).max(0);
                draw_text_mut(&mut canvas, LABEL_COLOR, x, label_y, scale, font, &label);
            }
            drawn += 1;
        }

        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create debug directory {:?}", self.output_dir))?;
        let output_path = self.output_dir.join(file_name);
        canvas
            .save_with_format(&output_path, ImageFormat::Jpeg)
            .with_context(|| format!("Failed to save debug image {:?}", output_path))?;
        info!(predictions = drawn, path = ?output_path, "saved debug image");
        Ok(output_path)
    }
}
