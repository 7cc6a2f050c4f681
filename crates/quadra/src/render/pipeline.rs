//! # Pipeline — The GPU Configuration for Drawing Sprites
//!
//! A wgpu render pipeline freezes shaders, vertex layout, and blend state
//! into one object. Blend state is the only piece sprites change at
//! runtime, so [`SpritePipeline`] keeps one pipeline per distinct blend
//! state and builds each the first time it is asked for:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ SpritePipeline                                              │
//! │                                                             │
//! │  Shader module ─── vs_main + fs_main from shader.wgsl       │
//! │                                                             │
//! │  Vertex layout ─── SpriteVertex { xyuv, tint }              │
//! │                                                             │
//! │  Bind group layouts                                         │
//! │    group 0: projection uniform (mat4x4, dynamic offset)     │
//! │    group 1: texture + sampler (fragment-only)               │
//! │                                                             │
//! │  pipelines: HashMap<Option<BlendState>, RenderPipeline>     │
//! │    None            → blending off                           │
//! │    Some(alpha)     → built at startup                       │
//! │    Some(additive)  → built at startup                       │
//! │    Some(custom)    → built on first use                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The blend constant color is not part of the pipeline; it is set on the
//! render pass.
//!
//! ## Projection Slots
//!
//! `Queue::write_buffer` lands before any command of the submission runs, so
//! rewriting one uniform in the middle of a frame would change the matrix
//! for draws recorded earlier too. Every projection upload instead takes
//! the next slot of a uniform buffer and group 0 is rebound at that slot's
//! offset. When the slots run out the buffer is replaced, just like the
//! vertex stream.
//!
//! ## Why No Depth Buffer
//!
//! Layering comes from the sort order: sprites are drawn back to front and
//! blend over what is already there. A depth test would reject the
//! transparent edges of sprites behind.

use std::collections::HashMap;
use std::num::NonZeroU64;

use wgpu::util::DeviceExt;

use crate::math::Mat4;
use crate::sprite::BlendMode;
use crate::sprite::vertex::{ProjectionUniform, SpriteVertex};

const PROJECTION_SIZE: u64 = std::mem::size_of::<ProjectionUniform>() as u64;

/// Projection uploads one uniform buffer holds before it is replaced.
const PROJECTION_SLOTS: u64 = 64;

/// Write cursor over the slots of the projection uniform buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ProjectionSlots {
    stride: u64,
    count: u64,
    next: u64,
    bound: u64,
}

impl ProjectionSlots {
    /// `count` slots, each starting on a multiple of `alignment` bytes.
    pub(crate) fn new(alignment: u64, count: u64) -> Self {
        Self {
            stride: PROJECTION_SIZE.next_multiple_of(alignment.max(1)),
            count: count.max(1),
            next: 0,
            bound: 0,
        }
    }

    pub(crate) fn buffer_size(&self) -> u64 {
        self.stride * self.count
    }

    /// Byte offset of the slot holding the current projection.
    pub(crate) fn bound(&self) -> u64 {
        self.bound
    }

    /// Take the next unused slot and return its byte offset. `true` means
    /// every slot is spoken for and the buffer must be replaced before the
    /// write.
    pub(crate) fn claim(&mut self) -> (u64, bool) {
        let replace = self.next == self.count;
        if replace {
            self.next = 0;
        }
        self.bound = self.next * self.stride;
        self.next += 1;
        (self.bound, replace)
    }
}

/// Shaders, layouts, and per-blend-state pipelines for sprite drawing.
pub struct SpritePipeline {
    shader: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    target_format: wgpu::TextureFormat,
    pipelines: HashMap<Option<wgpu::BlendState>, wgpu::RenderPipeline>,
    pub(crate) texture_bind_group_layout: wgpu::BindGroupLayout,
    projection_layout: wgpu::BindGroupLayout,
    projection_slots: ProjectionSlots,
    projection_buffer: wgpu::Buffer,
    pub(crate) projection_bind_group: wgpu::BindGroup,
    pub(crate) sampler: wgpu::Sampler,
}

impl SpritePipeline {
    /// Build the shared resources and the pipelines for the preset blend
    /// modes, targeting `target_format`.
    pub fn new(device: &wgpu::Device, target_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sprite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let projection_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("projection bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(PROJECTION_SIZE),
                },
                count: None,
            }],
        });

        let texture_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprite texture bind group layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sprite pipeline layout"),
            bind_group_layouts: &[&projection_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let projection_slots = ProjectionSlots::new(
            device.limits().min_uniform_buffer_offset_alignment as u64,
            PROJECTION_SLOTS,
        );
        let (projection_buffer, projection_bind_group) =
            create_projection(device, &projection_layout, &projection_slots);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let mut pipeline = Self {
            shader,
            layout,
            target_format,
            pipelines: HashMap::new(),
            texture_bind_group_layout,
            projection_layout,
            projection_slots,
            projection_buffer,
            projection_bind_group,
            sampler,
        };
        for mode in [BlendMode::None, BlendMode::Alpha, BlendMode::Additive, BlendMode::Premultiplied] {
            pipeline.get_or_build(device, mode.state().pipeline_key());
        }
        pipeline
    }

    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    /// Pipelines built so far.
    pub fn cached(&self) -> usize {
        self.pipelines.len()
    }

    /// The pipeline for `blend`, built on first request.
    pub fn get_or_build(&mut self, device: &wgpu::Device, blend: Option<wgpu::BlendState>) -> &wgpu::RenderPipeline {
        let Self {
            shader,
            layout,
            target_format,
            pipelines,
            ..
        } = self;
        pipelines.entry(blend).or_insert_with(|| {
            log::debug!("building sprite pipeline for blend {blend:?}");
            build_pipeline(device, shader, layout, *target_format, blend)
        })
    }

    /// Upload `projection` into a fresh slot and return the dynamic offset
    /// group 0 must be bound at for later draws to see it.
    pub fn write_projection(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, projection: &Mat4) -> u32 {
        let (offset, replace) = self.projection_slots.claim();
        if replace {
            log::debug!("projection slots used up; replacing uniform buffer");
            (self.projection_buffer, self.projection_bind_group) =
                create_projection(device, &self.projection_layout, &self.projection_slots);
        }
        let uniform = ProjectionUniform {
            matrix: projection.to_cols_array_2d(),
        };
        queue.write_buffer(&self.projection_buffer, offset, bytemuck::bytes_of(&uniform));
        offset as u32
    }

    /// Dynamic offset of the most recently written projection.
    pub fn projection_offset(&self) -> u32 {
        self.projection_slots.bound() as u32
    }
}

fn create_projection(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    slots: &ProjectionSlots,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    // Slot 0 starts as identity so a draw before any upload still has a matrix.
    let mut contents = vec![0u8; slots.buffer_size() as usize];
    let identity = ProjectionUniform {
        matrix: Mat4::IDENTITY.to_cols_array_2d(),
    };
    contents[..PROJECTION_SIZE as usize].copy_from_slice(bytemuck::bytes_of(&identity));

    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("projection uniform slots"),
        contents: &contents,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("projection bind group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: NonZeroU64::new(PROJECTION_SIZE),
            }),
        }],
    });
    (buffer, bind_group)
}

fn build_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("sprite pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[SpriteVertex::LAYOUT],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_aligned() {
        assert_eq!(ProjectionSlots::new(256, 4).buffer_size(), 1024);
        // A matrix is already 64 bytes; smaller alignments don't pad.
        assert_eq!(ProjectionSlots::new(16, 4).buffer_size(), 256);
        assert_eq!(ProjectionSlots::new(0, 1).buffer_size(), PROJECTION_SIZE);
    }

    #[test]
    fn each_upload_takes_a_new_slot() {
        let mut slots = ProjectionSlots::new(256, 3);
        assert_eq!(slots.bound(), 0);
        assert_eq!(slots.claim(), (0, false));
        assert_eq!(slots.claim(), (256, false));
        assert_eq!(slots.claim(), (512, false));
        assert_eq!(slots.bound(), 512);

        // Out of slots: a new buffer, starting over at zero.
        assert_eq!(slots.claim(), (0, true));
        assert_eq!(slots.claim(), (256, false));
        assert_eq!(slots.bound(), 256);
    }
}
