//! Per-slot render contexts.
//!
//! A [`RenderContext`] is the GPU state for one preview: an offscreen target,
//! the model's vertex buffers, a uniform buffer and a camera framed on the
//! model. It owns the slot it draws into for as long as the preview is alive.
//! Releasing the context is the only way to get the slot back, so the GPU
//! resources are freed exactly once.

use std::path::Path;
use std::sync::Arc;

use catalog_preview_core::Aabb;
use catalog_preview_geometry::PreviewModel;
use glam::{UVec2, Vec3};
use image::RgbaImage;
use log::debug;
use wgpu::util::DeviceExt;

use crate::camera::Camera;
use crate::error::{RenderError, RenderResult};
use crate::gpu::{FrameUniforms, GpuDevice};
use crate::slot::{Placeholder, PreviewSlot};
use crate::target::RenderTarget;

/// Lighting and background for a preview scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scene {
    /// Clear color.
    pub background: Vec3,
    /// Direction toward the key light.
    pub light_direction: Vec3,
    /// Ambient light intensity.
    pub ambient: f32,
    /// Directional light intensity.
    pub diffuse: f32,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            background: Vec3::splat(0.96),
            light_direction: Vec3::new(0.4, 1.0, 0.6).normalize(),
            ambient: 0.45,
            diffuse: 0.55,
        }
    }
}

impl Scene {
    fn clear_color(&self) -> wgpu::Color {
        wgpu::Color {
            r: f64::from(self.background.x),
            g: f64::from(self.background.y),
            b: f64::from(self.background.z),
            a: 1.0,
        }
    }
}

/// A failed [`RenderContext::new`], carrying the slot back to the caller.
#[derive(Debug)]
pub struct AttachError<S> {
    /// The slot that was passed in.
    pub slot: S,
    /// Why the context could not be created.
    pub error: RenderError,
}

impl<S> AttachError<S> {
    /// Returns the slot, discarding the error.
    pub fn into_slot(self) -> S {
        self.slot
    }
}

impl<S> From<AttachError<S>> for RenderError {
    fn from(err: AttachError<S>) -> Self {
        err.error
    }
}

/// A vertex buffer and how many vertices it holds.
struct VertexBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl VertexBuffer {
    /// Uploads `vertices`, or returns `None` if there are none.
    #[allow(clippy::cast_possible_truncation)]
    fn upload<T: bytemuck::Pod>(
        device: &wgpu::Device,
        label: &str,
        vertices: &[T],
    ) -> Option<Self> {
        if vertices.is_empty() {
            return None;
        }
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Some(Self {
            buffer,
            count: vertices.len() as u32,
        })
    }
}

/// GPU rendering state bound to one preview slot.
pub struct RenderContext<S: PreviewSlot> {
    slot: S,
    gpu: Arc<GpuDevice>,
    scene: Scene,
    camera: Camera,
    target: RenderTarget,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    surfaces: Option<VertexBuffer>,
    lines: Option<VertexBuffer>,
    frame: RgbaImage,
    frames: u64,
}

impl<S: PreviewSlot> RenderContext<S> {
    /// Creates a context for `model` on `gpu`, drawing into `slot`.
    ///
    /// Uploads the model geometry once and frames the camera on the model
    /// bounds so rotation keeps it in view. On failure the slot is handed
    /// back inside the error.
    pub fn new(
        gpu: Arc<GpuDevice>,
        slot: S,
        size: UVec2,
        model: &PreviewModel,
    ) -> Result<Self, AttachError<S>> {
        let bounds = match check_attach(&gpu, size, model) {
            Ok(bounds) => bounds,
            Err(error) => return Err(AttachError { slot, error }),
        };

        #[allow(clippy::cast_precision_loss)]
        let mut camera = Camera::new(size.x as f32 / size.y as f32);
        camera.frame_bounds(&bounds);

        let device = gpu.device();
        let target = RenderTarget::new(device, size.x, size.y);
        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("preview frame uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("preview frame bind group"),
            layout: gpu.frame_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });
        let surfaces =
            VertexBuffer::upload(device, "preview surface vertices", &model.surface_vertices());
        let lines = VertexBuffer::upload(device, "preview line vertices", &model.overlay_vertices());

        let context = Self {
            slot,
            scene: Scene::default(),
            camera,
            target,
            uniforms,
            bind_group,
            surfaces,
            lines,
            frame: RgbaImage::new(size.x, size.y),
            frames: 0,
            gpu,
        };
        debug!(
            "created render context {}x{} ({} bytes)",
            size.x,
            size.y,
            context.memory_size()
        );
        Ok(context)
    }

    /// Replaces the scene settings.
    #[must_use]
    pub fn with_scene(mut self, scene: Scene) -> Self {
        self.scene = scene;
        self
    }

    /// Returns the slot this context draws into.
    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Returns the camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Returns the last rendered frame.
    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    /// Number of frames rendered.
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// GPU memory held by the context, in bytes.
    pub fn memory_size(&self) -> u64 {
        let vertices = [&self.surfaces, &self.lines]
            .into_iter()
            .flatten()
            .map(|v| v.buffer.size())
            .sum::<u64>();
        self.target.memory_size() + self.uniforms.size() + vertices
    }

    /// Renders `model` at its current rotation, reads the frame back and
    /// presents it to the slot.
    pub fn render(&mut self, model: &PreviewModel) -> RenderResult<()> {
        let uniforms = FrameUniforms {
            view_proj: self.camera.view_projection_matrix().to_cols_array_2d(),
            model: model.parent_matrix().to_cols_array_2d(),
            light_direction: self.scene.light_direction.extend(0.0).to_array(),
            lighting: [self.scene.ambient, self.scene.diffuse, 0.0, 0.0],
        };
        let queue = self.gpu.queue();
        queue.write_buffer(&self.uniforms, 0, bytemuck::cast_slice(&[uniforms]));

        let mut encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("preview frame encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("preview pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.target.color_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.scene.clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.target.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.bind_group, &[]);
            if let Some(surfaces) = &self.surfaces {
                pass.set_pipeline(self.gpu.surface_pipeline());
                pass.set_vertex_buffer(0, surfaces.buffer.slice(..));
                pass.draw(0..surfaces.count, 0..1);
            }
            if let Some(lines) = &self.lines {
                pass.set_pipeline(self.gpu.line_pipeline());
                pass.set_vertex_buffer(0, lines.buffer.slice(..));
                pass.draw(0..lines.count, 0..1);
            }
        }
        self.target.copy_to_readback(&mut encoder);
        queue.submit(std::iter::once(encoder.finish()));

        self.frame = self.target.read(self.gpu.device())?;
        self.frames += 1;
        self.slot.present(&self.frame);
        Ok(())
    }

    /// Writes the last frame to a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> image::ImageResult<()> {
        self.frame.save_with_format(path, image::ImageFormat::Png)
    }

    /// Frees the GPU resources and hands the slot back showing `placeholder`.
    pub fn release(self, placeholder: Placeholder) -> S {
        debug!(
            "releasing render context after {} frames ({} bytes)",
            self.frames,
            self.memory_size()
        );
        let Self {
            slot,
            target,
            uniforms,
            surfaces,
            lines,
            ..
        } = self;
        target.destroy();
        uniforms.destroy();
        for vertices in [surfaces, lines].into_iter().flatten() {
            vertices.buffer.destroy();
        }
        slot.show_placeholder(placeholder);
        slot
    }
}

/// Validates a context request and returns the bounds to frame.
fn check_attach(gpu: &GpuDevice, size: UVec2, model: &PreviewModel) -> RenderResult<Aabb> {
    if size.x == 0 || size.y == 0 {
        return Err(RenderError::EmptySurface(size.x, size.y));
    }
    let max = gpu.max_texture_size();
    if size.x > max || size.y > max {
        return Err(RenderError::SurfaceTooLarge {
            width: size.x,
            height: size.y,
            max,
        });
    }
    model.bounds().ok_or(RenderError::EmptyModel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::{MemorySlot, SlotContent};
    use catalog_preview_core::{CatalogItem, CategoryPalette, Dimensions};
    use catalog_preview_geometry::build_fallback;
    use image::Rgba;
    use std::sync::OnceLock;

    /// Shared device; `None` skips the test when no adapter is available.
    fn gpu() -> Option<Arc<GpuDevice>> {
        static GPU: OnceLock<Option<Arc<GpuDevice>>> = OnceLock::new();
        GPU.get_or_init(|| match GpuDevice::request() {
            Ok(gpu) => Some(gpu),
            Err(e) => {
                eprintln!("Skipping GPU tests: no adapter available ({e})");
                None
            }
        })
        .clone()
    }

    fn fallback_model() -> PreviewModel {
        let item = CatalogItem::new("Desk", "furniture", Dimensions::new(120.0, 60.0, 75.0));
        build_fallback(&item, &CategoryPalette::default()).unwrap()
    }

    fn close_to(pixel: Rgba<u8>, rgb: [u8; 3]) -> bool {
        pixel.0[..3].iter().zip(rgb).all(|(&a, b)| a.abs_diff(b) <= 1)
    }

    #[test]
    fn test_rejects_empty_surface() {
        let Some(gpu) = gpu() else { return };
        let model = fallback_model();
        let slot = MemorySlot::new();
        let Err(err) = RenderContext::new(gpu, slot.clone(), UVec2::new(0, 120), &model) else {
            panic!("expected an error");
        };
        assert!(matches!(err.error, RenderError::EmptySurface(0, 120)));
        err.into_slot().show_placeholder(Placeholder::Error);
        assert_eq!(slot.placeholder(), Some(Placeholder::Error));
    }

    #[test]
    fn test_rejects_surface_above_device_limit() {
        let Some(gpu) = gpu() else { return };
        let too_wide = UVec2::new(gpu.max_texture_size() + 1, 16);
        let result = RenderContext::new(gpu, MemorySlot::new(), too_wide, &fallback_model());
        assert!(matches!(
            result.map(|_| ()).map_err(RenderError::from),
            Err(RenderError::SurfaceTooLarge { .. })
        ));
    }

    #[test]
    fn test_render_presents_frame() {
        let Some(gpu) = gpu() else { return };
        let model = fallback_model();
        let slot = MemorySlot::new();
        let mut ctx = RenderContext::new(gpu, slot.clone(), UVec2::new(160, 120), &model).unwrap();
        ctx.render(&model).unwrap();

        assert_eq!(slot.frames_presented(), 1);
        let SlotContent::Frame(frame) = slot.content() else {
            panic!("expected a frame");
        };
        assert_eq!(frame.dimensions(), (160, 120));

        // Model is centered, so the middle pixel is geometry, not background
        assert!(!close_to(*frame.get_pixel(80, 60), [245, 245, 245]));
        assert!(close_to(*frame.get_pixel(0, 0), [245, 245, 245]));
    }

    #[test]
    fn test_custom_scene_background() {
        let Some(gpu) = gpu() else { return };
        let model = fallback_model();
        let scene = Scene {
            background: Vec3::ZERO,
            ..Scene::default()
        };
        let mut ctx = RenderContext::new(gpu, MemorySlot::new(), UVec2::new(64, 48), &model)
            .unwrap()
            .with_scene(scene);
        ctx.render(&model).unwrap();
        assert!(close_to(*ctx.frame().get_pixel(0, 0), [0, 0, 0]));
    }

    #[test]
    fn test_rotation_changes_frame() {
        let Some(gpu) = gpu() else { return };
        let mut model = fallback_model();
        let mut ctx = RenderContext::new(gpu, MemorySlot::new(), UVec2::new(64, 48), &model).unwrap();
        ctx.render(&model).unwrap();
        let first = ctx.frame().clone();

        model.rotate_by(0.7);
        ctx.render(&model).unwrap();
        assert_ne!(*ctx.frame(), first);
        assert_eq!(ctx.frames_rendered(), 2);
    }

    #[test]
    fn test_release_returns_slot_with_placeholder() {
        let Some(gpu) = gpu() else { return };
        let model = fallback_model();
        let slot = MemorySlot::new();
        let mut ctx = RenderContext::new(gpu, slot.clone(), UVec2::new(32, 24), &model).unwrap();
        ctx.render(&model).unwrap();
        assert!(ctx.memory_size() > 0);

        let returned = ctx.release(Placeholder::Neutral);
        assert_eq!(returned.placeholder(), Some(Placeholder::Neutral));
        assert_eq!(slot.placeholder(), Some(Placeholder::Neutral));
    }
}
