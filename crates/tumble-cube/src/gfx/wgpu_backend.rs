use glam::Mat4;
use image::RgbaImage;
use tumble_engine::render::RenderTarget;
use wgpu::util::DeviceExt;

use super::reflect::{self, CompiledStage, ProgramInterface};
use super::{
    Bindings, BufferData, BufferHandle, BufferKind, GfxError, GraphicsContext, HandleTable,
    IndexFormat, ProgramHandle, ShaderHandle, ShaderStage, TextureHandle, UniformLocation, check_image,
};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

// ── blend ─────────────────────────────────────────────────────────────────

fn alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

fn vertex_format(components: u32) -> Option<wgpu::VertexFormat> {
    match components {
        1 => Some(wgpu::VertexFormat::Float32),
        2 => Some(wgpu::VertexFormat::Float32x2),
        3 => Some(wgpu::VertexFormat::Float32x3),
        4 => Some(wgpu::VertexFormat::Float32x4),
        _ => None,
    }
}

// ── resources ─────────────────────────────────────────────────────────────

struct GpuBuffer {
    buffer: wgpu::Buffer,
    kind: BufferKind,
    len: usize,
}

struct GpuShader {
    module: wgpu::ShaderModule,
    compiled: CompiledStage,
}

struct GpuProgram {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    interface: ProgramInterface,
}

struct GpuTexture {
    bind_group: wgpu::BindGroup,
    texture: wgpu::Texture,
}

struct DepthTarget {
    view: wgpu::TextureView,
    size: (u32, u32),
}

/// A draw captured by `draw_indexed`, encoded at `flush`.
struct QueuedDraw {
    pipeline: wgpu::RenderPipeline,
    uniforms: wgpu::BindGroup,
    texture: wgpu::BindGroup,
    vertex_buffers: Vec<wgpu::Buffer>,
    index_buffer: wgpu::Buffer,
    index_format: wgpu::IndexFormat,
    index_count: u32,
}

// ── context ───────────────────────────────────────────────────────────────

/// [`GraphicsContext`] backed by a wgpu device.
///
/// Pipelines are built at link time with depth test `LessEqual`, back-face
/// culling and `SrcAlpha / OneMinusSrcAlpha` blending. Draws are queued and
/// encoded into the frame's render pass by [`WgpuGraphics::flush`].
///
/// Uniform writes go through `Queue::write_buffer`, so every draw in one
/// frame observes the last value written before submission.
pub struct WgpuGraphics {
    device: wgpu::Device,
    queue: wgpu::Queue,
    color_format: wgpu::TextureFormat,
    max_texture_dimension: u32,

    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    // Clamp-to-edge, nearest; shared by every texture.
    sampler: wgpu::Sampler,
    // Sampled when no texture is bound.
    fallback_texture: GpuTexture,

    buffers: HandleTable<GpuBuffer>,
    shaders: HandleTable<GpuShader>,
    programs: HandleTable<GpuProgram>,
    textures: HandleTable<GpuTexture>,
    bindings: Bindings,

    queued: Vec<QueuedDraw>,
    depth: Option<DepthTarget>,
}

impl WgpuGraphics {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, color_format: wgpu::TextureFormat) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tumble uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: reflect::UNIFORM_BINDING.1,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tumble texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: reflect::TEXTURE_BINDING.1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: reflect::SAMPLER_BINDING.1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tumble sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let fallback_texture = create_gpu_texture(&device, &texture_layout, &sampler, 1, 1);

        Self {
            max_texture_dimension: device.limits().max_texture_dimension_2d,
            device,
            queue,
            color_format,
            uniform_layout,
            texture_layout,
            sampler,
            fallback_texture,
            buffers: HandleTable::new("buffer"),
            shaders: HandleTable::new("shader"),
            programs: HandleTable::new("program"),
            textures: HandleTable::new("texture"),
            bindings: Bindings::default(),
            queued: Vec::new(),
            depth: None,
        }
    }

    /// Encodes queued draws into `target` on top of the already cleared color.
    ///
    /// Depth is cleared to 1.0 at the start of the pass.
    pub fn flush(&mut self, target: &mut RenderTarget<'_>) {
        if self.queued.is_empty() {
            return;
        }
        self.ensure_depth((target.size.width, target.size.height));
        let Some(depth) = self.depth.as_ref() else {
            self.queued.clear();
            return;
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tumble cube pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        for draw in self.queued.drain(..) {
            rpass.set_pipeline(&draw.pipeline);
            rpass.set_bind_group(0, &draw.uniforms, &[]);
            rpass.set_bind_group(1, &draw.texture, &[]);
            for (slot, buffer) in draw.vertex_buffers.iter().enumerate() {
                rpass.set_vertex_buffer(slot as u32, buffer.slice(..));
            }
            rpass.set_index_buffer(draw.index_buffer.slice(..), draw.index_format);
            rpass.draw_indexed(0..draw.index_count, 0, 0..1);
        }
    }

    fn ensure_depth(&mut self, size: (u32, u32)) {
        if size.0 == 0 || size.1 == 0 {
            self.depth = None;
            return;
        }
        if self.depth.as_ref().is_some_and(|d| d.size == size) {
            return;
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tumble depth"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        log::debug!("depth target resized to {}x{}", size.0, size.1);
        self.depth = Some(DepthTarget {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            size,
        });
    }

    fn build_pipeline(
        &self,
        vertex: &GpuShader,
        fragment: &GpuShader,
        interface: &ProgramInterface,
    ) -> Result<wgpu::RenderPipeline, GfxError> {
        let attributes = interface
            .attributes
            .iter()
            .map(|input| {
                let format = vertex_format(input.components).ok_or_else(|| {
                    GfxError::ProgramLink(format!("vertex input `{}` has {} components", input.name, input.components))
                })?;
                Ok([wgpu::VertexAttribute {
                    format,
                    offset: 0,
                    shader_location: input.location,
                }])
            })
            .collect::<Result<Vec<_>, GfxError>>()?;

        // One tightly packed buffer per attribute, slots in location order.
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = attributes
            .iter()
            .map(|attr| wgpu::VertexBufferLayout {
                array_stride: attr[0].format.size(),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attr,
            })
            .collect();

        let layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tumble program layout"),
            bind_group_layouts: &[&self.uniform_layout, &self.texture_layout],
            immediate_size: 0,
        });

        Ok(self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tumble program"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &vertex.module,
                entry_point: Some(interface.vertex_entry.as_str()),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment.module,
                entry_point: Some(interface.fragment_entry.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.color_format,
                    blend: Some(alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        }))
    }
}

/// Creates a zero-initialised texture and its bind group.
fn create_gpu_texture(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    width: u32,
    height: u32,
) -> GpuTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("tumble texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("tumble texture bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: reflect::TEXTURE_BINDING.1,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: reflect::SAMPLER_BINDING.1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    GpuTexture {
        bind_group,
        texture,
    }
}

impl GraphicsContext for WgpuGraphics {
    fn create_buffer(&mut self, data: BufferData<'_>) -> Result<BufferHandle, GfxError> {
        if data.is_empty() {
            return Err(GfxError::EmptyBuffer);
        }
        let kind = data.kind();
        let usage = match kind {
            BufferKind::Attribute => wgpu::BufferUsages::VERTEX,
            BufferKind::Index(_) => wgpu::BufferUsages::INDEX,
        };
        // wgpu requires buffer sizes to be a multiple of 4 bytes.
        let mut contents = data.as_bytes().to_vec();
        contents.resize(contents.len().next_multiple_of(4), 0);

        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tumble buffer"),
            contents: &contents,
            usage,
        });
        let id = self.buffers.insert(GpuBuffer {
            buffer,
            kind,
            len: data.len(),
        });
        log::trace!("created {kind:?} buffer #{id} ({} elements)", data.len());
        Ok(BufferHandle(id))
    }

    fn compile_shader(&mut self, source: &str, stage: ShaderStage) -> Result<ShaderHandle, GfxError> {
        // Validate first: wgpu reports invalid WGSL through the device's
        // uncaptured error handler instead of a return value.
        let compiled = reflect::compile(source, stage)?;
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(match stage {
                ShaderStage::Vertex => "tumble vertex stage",
                ShaderStage::Fragment => "tumble fragment stage",
            }),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let id = self.shaders.insert(GpuShader { module, compiled });
        log::debug!("compiled {stage} shader #{id}");
        Ok(ShaderHandle(id))
    }

    fn link_program(&mut self, stages: &[ShaderHandle]) -> Result<ProgramHandle, GfxError> {
        let shaders = stages
            .iter()
            .map(|s| self.shaders.get(s.0))
            .collect::<Result<Vec<_>, _>>()?;
        let compiled: Vec<&CompiledStage> = shaders.iter().map(|s| &s.compiled).collect();
        let interface = reflect::link(&compiled)?;

        let stage_module = |stage: ShaderStage| {
            shaders
                .iter()
                .find(|s| s.compiled.stage == stage)
                .copied()
                .ok_or_else(|| GfxError::ProgramLink(format!("no {stage} stage")))
        };
        let pipeline = self.build_pipeline(
            stage_module(ShaderStage::Vertex)?,
            stage_module(ShaderStage::Fragment)?,
            &interface,
        )?;

        let uniform_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tumble uniform block"),
            size: u64::from(interface.uniform_size.max(16).next_multiple_of(16)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tumble uniform bind group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: reflect::UNIFORM_BINDING.1,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let attribute_count = interface.attributes.len();
        let id = self.programs.insert(GpuProgram {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            interface,
        });
        log::debug!("linked program #{id} ({attribute_count} attributes)");
        Ok(ProgramHandle(id))
    }

    fn create_texture(&mut self) -> Result<TextureHandle, GfxError> {
        let texture = create_gpu_texture(&self.device, &self.texture_layout, &self.sampler, 1, 1);
        let handle = TextureHandle(self.textures.insert(texture));
        self.bindings.texture = Some(handle);
        Ok(handle)
    }

    fn upload_texture(&mut self, texture: TextureHandle, image: &RgbaImage) -> Result<(), GfxError> {
        check_image(image, self.max_texture_dimension)?;
        let (width, height) = image.dimensions();

        self.textures.get(texture.0)?;
        let replacement = create_gpu_texture(&self.device, &self.texture_layout, &self.sampler, width, height);

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &replacement.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        *self.textures.get_mut(texture.0)? = replacement;
        log::debug!("uploaded {width}x{height} image to texture #{}", texture.0);
        Ok(())
    }

    fn use_program(&mut self, program: ProgramHandle) -> Result<(), GfxError> {
        self.programs.get(program.0)?;
        self.bindings.program = Some(program);
        Ok(())
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        let program = self.programs.get(program.0).ok()?;
        program.interface.attribute(name).map(|a| a.location)
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let member = self.programs.get(program.0).ok()?.interface.uniform(name)?;
        Some(UniformLocation {
            program,
            offset: member.offset,
        })
    }

    fn bind_attribute(&mut self, location: u32, buffer: BufferHandle, components: u32) -> Result<(), GfxError> {
        if self.buffers.get(buffer.0)?.kind != BufferKind::Attribute {
            return Err(GfxError::WrongBufferKind(buffer.0, "not an attribute buffer"));
        }
        let current = self
            .bindings
            .program
            .and_then(|p| self.programs.get(p.0).ok())
            .map(|p| &p.interface);
        self.bindings.bind_attribute(current, location, buffer, components)
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle) -> Result<(), GfxError> {
        if !matches!(self.buffers.get(buffer.0)?.kind, BufferKind::Index(_)) {
            return Err(GfxError::WrongBufferKind(buffer.0, "not an index buffer"));
        }
        self.bindings.index_buffer = Some(buffer);
        Ok(())
    }

    fn bind_texture(&mut self, texture: TextureHandle) -> Result<(), GfxError> {
        self.textures.get(texture.0)?;
        self.bindings.texture = Some(texture);
        Ok(())
    }

    fn upload_matrix(&mut self, location: UniformLocation, value: &Mat4) -> Result<(), GfxError> {
        let program = self.programs.get(location.program.0)?;
        let is_mat4 = program
            .interface
            .uniform_at(location.offset)
            .is_some_and(|m| m.is_mat4);
        if !is_mat4 {
            return Err(GfxError::NotAMatrix { offset: location.offset });
        }
        self.queue.write_buffer(
            &program.uniform_buffer,
            u64::from(location.offset),
            bytemuck::cast_slice(&value.to_cols_array()),
        );
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32) -> Result<(), GfxError> {
        let program_handle = self
            .bindings
            .program
            .ok_or_else(|| GfxError::Draw("no program in use".into()))?;
        let index_handle = self
            .bindings
            .index_buffer
            .ok_or_else(|| GfxError::Draw("no index buffer bound".into()))?;

        let program = self.programs.get(program_handle.0)?;
        let index = self.buffers.get(index_handle.0)?;
        self.bindings.check_draw(&program.interface, index.len, index_count)?;

        let index_format = match index.kind {
            BufferKind::Index(IndexFormat::U16) => wgpu::IndexFormat::Uint16,
            BufferKind::Index(IndexFormat::U32) => wgpu::IndexFormat::Uint32,
            BufferKind::Attribute => return Err(GfxError::WrongBufferKind(index_handle.0, "not an index buffer")),
        };

        let vertex_buffers = program
            .interface
            .attributes
            .iter()
            .map(|input| {
                let binding = self.bindings.attributes.get(&input.location).ok_or_else(|| {
                    GfxError::Draw(format!("attribute `{}` has no buffer", input.name))
                })?;
                Ok(self.buffers.get(binding.buffer.0)?.buffer.clone())
            })
            .collect::<Result<Vec<_>, GfxError>>()?;

        let texture = match self.bindings.texture {
            Some(t) => &self.textures.get(t.0)?.bind_group,
            None => &self.fallback_texture.bind_group,
        };

        let draw = QueuedDraw {
            pipeline: program.pipeline.clone(),
            uniforms: program.uniform_bind_group.clone(),
            texture: texture.clone(),
            vertex_buffers,
            index_buffer: index.buffer.clone(),
            index_format,
            index_count,
        };
        self.queued.push(draw);
        Ok(())
    }

    fn clear(&mut self) {
        if !self.queued.is_empty() {
            log::trace!("clear dropped {} queued draws", self.queued.len());
        }
        self.queued.clear();
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) -> Result<(), GfxError> {
        self.buffers.remove(buffer.0)?;
        self.bindings.forget_buffer(buffer);
        Ok(())
    }

    fn delete_shader(&mut self, shader: ShaderHandle) -> Result<(), GfxError> {
        self.shaders.remove(shader.0)?;
        Ok(())
    }

    fn delete_program(&mut self, program: ProgramHandle) -> Result<(), GfxError> {
        self.programs.remove(program.0)?;
        self.bindings.forget_program(program);
        Ok(())
    }

    fn delete_texture(&mut self, texture: TextureHandle) -> Result<(), GfxError> {
        self.textures.remove(texture.0)?;
        self.bindings.forget_texture(texture);
        Ok(())
    }
}
