//! wgpu Post-Processing Context
//!
//! [`WgpuPostContext`] implements [`PostProcessContext`] on top of a wgpu
//! device. It owns the frame's command encoder between
//! [`begin_frame`](WgpuPostContext::begin_frame) and
//! [`finish`](WgpuPostContext::finish); stages record into it through
//! [`encoder`](WgpuPostContext::encoder).
//!
//! # Frame Flow
//!
//! ```text
//! begin_frame() → collection.update / execute / copy → finish() → queue.submit
//! ```
//!
//! The copy helper is a single full-screen triangle that samples the
//! collection output and writes it unmodified into the target view.

use std::borrow::Cow;

use super::context::PostProcessContext;
use super::tracked::Tracked;

const COPY_WGSL: &str = r#"
struct VertexOutput {
    @builtin(position) position : vec4<f32>,
    @location(0) uv : vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vertexIndex : u32) -> VertexOutput {
    var pos = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 3.0, -1.0),
        vec2<f32>(-1.0,  3.0)
    );
    var output : VertexOutput;
    output.position = vec4<f32>(pos[vertexIndex], 0.0, 1.0);
    output.uv = pos[vertexIndex] * 0.5 + 0.5;
    output.uv.y = 1.0 - output.uv.y;
    return output;
}

@group(0) @binding(0) var t_color : texture_2d<f32>;
@group(0) @binding(1) var s_color : sampler;

@fragment
fn fs_main(in : VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(t_color, s_color, in.uv);
}
"#;

/// Cached full-screen pass-through command.
///
/// The pipeline is built for a single target format. The bind group is
/// rebuilt only when the source texture changes identity.
pub struct CopyPass {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    pipeline: wgpu::RenderPipeline,
    target_format: wgpu::TextureFormat,
    /// (source texture id, bind group)
    current_bind_group: Option<(u64, wgpu::BindGroup)>,
}

impl CopyPass {
    #[must_use]
    pub fn new(device: &wgpu::Device, target_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("PostProcess Copy Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(COPY_WGSL)),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("PostProcess Copy Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
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

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("PostProcess Copy Pipeline Layout"),
            bind_group_layouts: &[Some(&layout)],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("PostProcess Copy Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("PostProcess Copy Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        Self {
            layout,
            sampler,
            pipeline,
            target_format,
            current_bind_group: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    /// Returns the bind group for `source`, rebuilding it when the source
    /// texture changed.
    fn bind_group(
        &mut self,
        device: &wgpu::Device,
        source: &Tracked<wgpu::TextureView>,
    ) -> wgpu::BindGroup {
        if let Some((id, bind_group)) = &self.current_bind_group
            && *id == source.id()
        {
            return bind_group.clone();
        }

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("PostProcess Copy BindGroup"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        self.current_bind_group = Some((source.id(), bind_group.clone()));
        bind_group
    }

    /// Records the copy into `encoder`.
    pub fn record(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        source: &Tracked<wgpu::TextureView>,
        target: &wgpu::TextureView,
    ) {
        let bind_group = self.bind_group(device, source);

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("PostProcess Copy Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            ..Default::default()
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

/// wgpu-backed [`PostProcessContext`].
pub struct WgpuPostContext {
    device: wgpu::Device,
    target_format: wgpu::TextureFormat,
    encoder: Option<wgpu::CommandEncoder>,
}

impl WgpuPostContext {
    /// Creates a context whose copy command targets `target_format` views.
    #[must_use]
    pub fn new(device: wgpu::Device, target_format: wgpu::TextureFormat) -> Self {
        Self {
            device,
            target_format,
            encoder: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    #[must_use]
    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    /// Starts recording a frame. A still-open encoder is replaced.
    pub fn begin_frame(&mut self) {
        if self.encoder.is_some() {
            log::warn!("PostProcess frame started before the previous one was finished");
        }
        self.encoder = Some(
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("PostProcess Encoder"),
                }),
        );
    }

    /// Encoder of the frame being recorded, if any.
    #[inline]
    pub fn encoder(&mut self) -> Option<&mut wgpu::CommandEncoder> {
        self.encoder.as_mut()
    }

    /// Ends the frame and returns the recorded commands for submission.
    pub fn finish(&mut self) -> Option<wgpu::CommandBuffer> {
        self.encoder.take().map(wgpu::CommandEncoder::finish)
    }
}

impl PostProcessContext for WgpuPostContext {
    type Texture = Tracked<wgpu::TextureView>;
    type Framebuffer = wgpu::TextureView;
    type CopyCommand = CopyPass;

    fn create_copy_command(&mut self) -> CopyPass {
        log::debug!(
            "Compiling PostProcess copy pipeline for format {:?}",
            self.target_format
        );
        CopyPass::new(&self.device, self.target_format)
    }

    fn execute_copy(
        &mut self,
        command: &mut CopyPass,
        source: &Tracked<wgpu::TextureView>,
        target: &wgpu::TextureView,
    ) {
        let Some(encoder) = self.encoder.as_mut() else {
            log::warn!("PostProcess copy requested outside begin_frame/finish; skipped");
            return;
        };
        command.record(&self.device, encoder, source, target);
    }
}
