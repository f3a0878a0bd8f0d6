use crate::composition::Draw;
use crate::stimulus::{Rgba, StimulusCatalog, StimulusId, StimulusType};
use crate::timer::HighPrecisionTimer;
use anyhow::{anyhow, Result};
use std::time::Duration;
use tiny_skia::{
    Color, FillRule, LineCap, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

pub struct FrameStats {
    pub clear: Duration,
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
    pub draw_count: usize,
}

/// Software renderer: every catalog stimulus is rasterised once into its
/// own pixmap and frames are assembled by blitting those pixmaps.
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    background: Rgba,
    canvas: Pixmap,
    static_cache: Vec<Pixmap>,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, background: Rgba, catalog: &StimulusCatalog) -> Result<Self> {
        let canvas = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("cannot allocate {width}x{height} canvas"))?;
        let mut renderer = Self {
            width,
            height,
            background,
            canvas,
            static_cache: Vec::with_capacity(StimulusId::COUNT),
        };
        renderer.cache_stimuli(catalog)?;
        Ok(renderer)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: u32, height: u32, catalog: &StimulusCatalog) -> Result<()> {
        self.width = width;
        self.height = height;
        self.canvas = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("cannot allocate {width}x{height} canvas"))?;
        self.cache_stimuli(catalog)
    }

    fn cache_stimuli(&mut self, catalog: &StimulusCatalog) -> Result<()> {
        self.static_cache.clear();
        for (id, stimulus) in catalog.iter() {
            let pixmap = render_stimulus_to_pixmap(stimulus)
                .ok_or_else(|| anyhow!("cannot rasterise {id:?}"))?;
            self.static_cache.push(pixmap);
        }
        Ok(())
    }

    /// Clears the canvas, draws `draws` back to front and copies the result
    /// into `frame_buffer` (RGBA8, `width * height * 4` bytes).
    pub fn render_frame(
        &mut self,
        draws: &[Draw],
        catalog: &StimulusCatalog,
        frame_buffer: &mut [u8],
        timer: &mut HighPrecisionTimer,
    ) -> Result<FrameStats> {
        let [r, g, b, a] = self.background;

        let t_clear = {
            let t = timer.now();
            self.canvas.fill(Color::from_rgba8(r, g, b, a));
            timer.elapsed(t)
        };

        let t_draw = {
            let t = timer.now();
            for d in draws {
                let pos = catalog.anchor(d.anchor);
                self.blit_cached(d.stimulus, (pos.x, pos.y));
            }
            timer.elapsed(t)
        };

        let t_copy = {
            let t = timer.now();
            let data = self.canvas.data();
            if frame_buffer.len() != data.len() {
                return Err(anyhow!(
                    "frame buffer holds {} bytes, canvas {}",
                    frame_buffer.len(),
                    data.len()
                ));
            }
            frame_buffer.copy_from_slice(data);
            timer.elapsed(t)
        };

        let total = t_clear + t_draw + t_copy;
        timer.record_frame(total);

        Ok(FrameStats {
            clear: t_clear,
            draw: t_draw,
            copy: t_copy,
            total,
            draw_count: draws.len(),
        })
    }

    /// Draws a cached stimulus with its centre at `pos`.
    fn blit_cached(&mut self, id: StimulusId, pos: (f32, f32)) {
        let Some(pixmap) = self.static_cache.get(id.index()) else {
            return;
        };
        let x = (pos.0 - pixmap.width() as f32 * 0.5).round() as i32;
        let y = (pos.1 - pixmap.height() as f32 * 0.5).round() as i32;
        self.canvas.draw_pixmap(
            x,
            y,
            pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}

fn paint_for(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;
    paint
}

/// Rasterises a stimulus centred in a transparent square pixmap.
pub fn render_stimulus_to_pixmap(stimulus: &StimulusType) -> Option<Pixmap> {
    // one pixel of slack on each side for anti-aliasing
    let side = stimulus.extent().ceil() as u32 + 2;
    let mut pixmap = Pixmap::new(side, side)?;
    let c = side as f32 / 2.0;

    match stimulus {
        StimulusType::Line {
            length,
            thickness,
            color,
            rotation_deg,
        } => {
            let mut pb = PathBuilder::new();
            pb.move_to(c - length / 2.0, c);
            pb.line_to(c + length / 2.0, c);
            let path = pb.finish()?;
            let stroke = Stroke {
                width: *thickness,
                line_cap: LineCap::Butt,
                ..Default::default()
            };
            pixmap.stroke_path(
                &path,
                &paint_for(*color),
                &stroke,
                Transform::from_rotate_at(*rotation_deg, c, c),
                None,
            );
        }
        StimulusType::Circle {
            diameter,
            stroke,
            fill,
        } => {
            let path = PathBuilder::from_circle(c, c, diameter / 2.0)?;
            pixmap.fill_path(
                &path,
                &paint_for(*fill),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
            if let Some(s) = stroke {
                let outline = Stroke {
                    width: s.width,
                    ..Default::default()
                };
                pixmap.stroke_path(
                    &path,
                    &paint_for(s.color),
                    &outline,
                    Transform::identity(),
                    None,
                );
            }
        }
    }

    Some(pixmap)
}
