//! The main mesh shading pass.
//!
//! # Architecture
//!
//! Three bind groups, all resolved at pipeline creation:
//! - **Group 0**: transform, lighting, and material uniform buffers
//! - **Group 1**: the five material maps plus a shared repeat sampler
//! - **Group 2**: irradiance and environment cubemaps plus their sampler
//!
//! Uniform buffers are created once and rewritten each frame. The texture
//! bind groups are created per frame since reload operations can swap any
//! slot between frames.

use crate::environment::Cubemap;
use crate::geometry::Vertex;
use crate::gpu::GpuContext;
use crate::mesh::Mesh;
use crate::shaders;
use crate::shading::{LightingUniforms, MaterialUniforms, TransformUniforms};
use crate::texture::Texture;

/// The material map slots, bound in a fixed order every frame.
pub struct MaterialMaps<'a> {
    pub base_color: &'a Texture,
    pub normal: &'a Texture,
    pub roughness: &'a Texture,
    pub metallic: &'a Texture,
    pub ao: &'a Texture,
}

/// Renders a mesh with Cook-Torrance shading and image-based lighting.
pub struct PbrPass {
    pipeline: wgpu::RenderPipeline,
    transform_buffer: wgpu::Buffer,
    lighting_buffer: wgpu::Buffer,
    material_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    map_bind_group_layout: wgpu::BindGroupLayout,
    ibl_bind_group_layout: wgpu::BindGroupLayout,
    map_sampler: wgpu::Sampler,
}

impl PbrPass {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = shaders::create_module(gpu, "pbr");

        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("PBR Uniform Bind Group Layout"),
                entries: &[uniform_entry(0), uniform_entry(1), uniform_entry(2)],
            });

        let make_buffer = |label: &str, size: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let transform_buffer = make_buffer(
            "Transform Uniforms",
            std::mem::size_of::<TransformUniforms>(),
        );
        let lighting_buffer =
            make_buffer("Lighting Uniforms", std::mem::size_of::<LightingUniforms>());
        let material_buffer =
            make_buffer("Material Uniforms", std::mem::size_of::<MaterialUniforms>());

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("PBR Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: transform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lighting_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: material_buffer.as_entire_binding(),
                },
            ],
        });

        let texture_entry = |binding: u32, dimension: wgpu::TextureViewDimension| {
            wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: dimension,
                    multisampled: false,
                },
                count: None,
            }
        };
        let sampler_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };

        let map_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("PBR Map Bind Group Layout"),
                entries: &[
                    texture_entry(0, wgpu::TextureViewDimension::D2),
                    texture_entry(1, wgpu::TextureViewDimension::D2),
                    texture_entry(2, wgpu::TextureViewDimension::D2),
                    texture_entry(3, wgpu::TextureViewDimension::D2),
                    texture_entry(4, wgpu::TextureViewDimension::D2),
                    sampler_entry(5),
                ],
            });

        let ibl_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("PBR IBL Bind Group Layout"),
                entries: &[
                    texture_entry(0, wgpu::TextureViewDimension::Cube),
                    texture_entry(1, wgpu::TextureViewDimension::Cube),
                    sampler_entry(2),
                ],
            });

        let map_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("PBR Map Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("PBR Pipeline Layout"),
            bind_group_layouts: &[
                &uniform_bind_group_layout,
                &map_bind_group_layout,
                &ibl_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("PBR Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Imported models have arbitrary winding; don't cull.
                cull_mode: None,
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            transform_buffer,
            lighting_buffer,
            material_buffer,
            uniform_bind_group,
            map_bind_group_layout,
            ibl_bind_group_layout,
            map_sampler,
        }
    }

    /// Renders the mesh with the given frame state.
    ///
    /// The render pass must carry a Depth32Float attachment.
    pub fn render(
        &self,
        gpu: &GpuContext,
        render_pass: &mut wgpu::RenderPass,
        transform: &TransformUniforms,
        lighting: &LightingUniforms,
        material: &MaterialUniforms,
        maps: &MaterialMaps,
        irradiance: &Cubemap,
        environment: &Cubemap,
        mesh: &Mesh,
    ) {
        gpu.queue
            .write_buffer(&self.transform_buffer, 0, bytemuck::cast_slice(&[*transform]));
        gpu.queue
            .write_buffer(&self.lighting_buffer, 0, bytemuck::cast_slice(&[*lighting]));
        gpu.queue
            .write_buffer(&self.material_buffer, 0, bytemuck::cast_slice(&[*material]));

        let map_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("PBR Map Bind Group"),
            layout: &self.map_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&maps.base_color.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&maps.normal.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&maps.roughness.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&maps.metallic.view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(&maps.ao.view),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(&self.map_sampler),
                },
            ],
        });

        let ibl_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("PBR IBL Bind Group"),
            layout: &self.ibl_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&irradiance.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&environment.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&environment.sampler),
                },
            ],
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_bind_group(1, &map_bind_group, &[]);
        render_pass.set_bind_group(2, &ibl_bind_group, &[]);
        mesh.draw(render_pass);
    }
}
