use anyhow::Context;
use picobridge_core::core::{Display, PresentationSurface};
use picobridge_core::error::DisplayError;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, TextureCreator};
use sdl2::video::{Window, WindowContext};
use tracing::warn;

/// Largest window scale factor; keeps 320x240 times scale well inside
/// SDL's window limits.
pub const MAX_SCALE: u32 = 16;

/// Clamp a requested scale factor to `1..=MAX_SCALE`.
pub fn clamp_scale(scale: u32) -> u32 {
    let clamped = scale.clamp(1, MAX_SCALE);
    if clamped != scale {
        warn!(requested = scale, using = clamped, "window scale out of range");
    }
    clamped
}

/// [`Display`] over an SDL window.
///
/// Frames are converted into a host-side ARGB8888 surface, then uploaded
/// to a streaming texture and presented.
pub struct SdlDisplay {
    canvas: Canvas<Window>,
    texture_creator: TextureCreator<WindowContext>,
    surface: Vec<u32>,
    width: u32,
    height: u32,
    scale: u32,
}

impl SdlDisplay {
    /// Create an SDL window and renderer. The native size is set by the
    /// session's first `resize`.
    pub fn new(sdl_video: &sdl2::VideoSubsystem, title: &str, scale: u32) -> anyhow::Result<Self> {
        let scale = clamp_scale(scale);
        let (width, height) = (320, 224);
        let window = sdl_video
            .window(title, width * scale, height * scale)
            .position_centered()
            .build()
            .context("failed to create window")?;

        let canvas = window
            .into_canvas()
            .accelerated()
            .build()
            .context("failed to create canvas")?;

        let texture_creator = canvas.texture_creator();

        Ok(Self {
            canvas,
            texture_creator,
            surface: vec![0; (width * height) as usize],
            width,
            height,
            scale,
        })
    }
}

impl Display for SdlDisplay {
    fn resize(&mut self, width: u32, height: u32) {
        if let Err(e) = self
            .canvas
            .window_mut()
            .set_size(width * self.scale, height * self.scale)
        {
            warn!("window resize failed: {e}");
        }
        self.width = width;
        self.height = height;
        self.surface = vec![0; (width * height) as usize];
    }

    fn clear(&mut self) {
        self.canvas.clear();
    }

    fn with_surface(
        &mut self,
        blit: &mut dyn FnMut(&mut PresentationSurface<'_>),
    ) -> Result<(), DisplayError> {
        let mut surface = PresentationSurface {
            pixels: &mut self.surface,
            width: self.width as usize,
            height: self.height as usize,
            pitch: self.width as usize,
        };
        blit(&mut surface);
        Ok(())
    }

    /// Upload the ARGB8888 surface to a texture and present it.
    fn present(&mut self) -> Result<(), DisplayError> {
        let mut texture = self
            .texture_creator
            .create_texture_streaming(PixelFormatEnum::ARGB8888, self.width, self.height)
            .map_err(|e| DisplayError::Surface(e.to_string()))?;

        texture
            .update(
                None,
                bytemuck::cast_slice(&self.surface),
                (self.width * 4) as usize,
            )
            .map_err(|e| DisplayError::Surface(e.to_string()))?;

        self.canvas
            .copy(&texture, None, None)
            .map_err(DisplayError::Present)?;
        self.canvas.present();
        Ok(())
    }
}
