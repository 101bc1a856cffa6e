use glam::{Mat4, Vec3};
use wgpu::*;

use crate::controller::PlayerController;
use crate::model::{LightingPreset, Scene};
use crate::utils::{Mesh, MeshBuffer, Vertex};

const GUN_COLOR: [f32; 4] = [0.2, 0.22, 0.25, 1.0];
const RAY_COLOR: [f32; 4] = [1.0, 0.25, 0.15, 0.8];
const GUN_SIZE: Vec3 = Vec3::new(2.0, 3.0, 10.0);

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    pub sun_dir: [f32; 3],
    pub sun_intensity: f32,
    pub point_pos: [f32; 3],
    pub point_radius: f32,
    pub ambient: f32,
    pub point_enabled: f32,
    pub _pad: [f32; 2],
}

impl LightingUniform {
    /// Sun and ambient from the preset, plus the gun light when it is on
    pub fn new(preset: LightingPreset, point_light: Option<(Vec3, f32)>) -> Self {
        let (sun_intensity, ambient) = match preset {
            LightingPreset::Play => (0.55, 0.3),
            LightingPreset::Spectate => (0.9, 0.6),
        };
        let (pos, radius, enabled) = match point_light {
            Some((pos, radius)) => (pos, radius, 1.0),
            None => (Vec3::ZERO, 0.0, 0.0),
        };
        Self {
            sun_dir: [0.4, -1.0, 0.25],
            sun_intensity,
            point_pos: pos.to_array(),
            point_radius: radius,
            ambient,
            point_enabled: enabled,
            _pad: [0.0; 2],
        }
    }
}

/// Skybox color for a lighting preset
pub fn clear_color(preset: LightingPreset) -> Color {
    match preset {
        LightingPreset::Play => Color { r: 0.02, g: 0.03, b: 0.06, a: 1.0 },
        LightingPreset::Spectate => Color { r: 0.35, g: 0.45, b: 0.6, a: 1.0 },
    }
}

pub struct CameraResources {
    pub camera_buffer: wgpu::Buffer,
    pub lighting_buffer: wgpu::Buffer,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub camera_bind_group: wgpu::BindGroup,
}

pub struct PipelineResources {
    pub pipeline: wgpu::RenderPipeline,
    pub wireframe_pipeline: Option<wgpu::RenderPipeline>,
}

pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub fn create_camera_resources(device: &wgpu::Device) -> CameraResources {
    let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("camera_buffer"),
        size: std::mem::size_of::<CameraUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let lighting_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("lighting_buffer"),
        size: std::mem::size_of::<LightingUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("camera_bind_group_layout"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::VERTEX),
            uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
        ],
    });

    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("camera_bind_group"),
        layout: &bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 1, resource: lighting_buffer.as_entire_binding() },
        ],
    });

    CameraResources { camera_buffer, lighting_buffer, bind_group_layout, camera_bind_group }
}

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 4] = [
    wgpu::VertexAttribute { offset: 0, shader_location: 0, format: wgpu::VertexFormat::Float32x3 },
    wgpu::VertexAttribute { offset: 12, shader_location: 1, format: wgpu::VertexFormat::Float32x3 },
    wgpu::VertexAttribute { offset: 24, shader_location: 2, format: wgpu::VertexFormat::Float32x4 },
    wgpu::VertexAttribute { offset: 40, shader_location: 3, format: wgpu::VertexFormat::Float32x2 },
];

fn create_box_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    depth_format: wgpu::TextureFormat,
    polygon_mode: wgpu::PolygonMode,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &VERTEX_ATTRIBUTES,
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState { format, blend: Some(wgpu::BlendState::ALPHA_BLENDING), write_mask: wgpu::ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Wireframes draw both faces
            cull_mode: match polygon_mode {
                wgpu::PolygonMode::Fill => Some(wgpu::Face::Back),
                _ => None,
            },
            polygon_mode,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: depth_format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

pub fn create_scene_pipelines(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    bind_group_layout: &wgpu::BindGroupLayout,
    depth_format: wgpu::TextureFormat,
) -> PipelineResources {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("scene_shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pipeline_layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = create_box_pipeline(
        device, "render_pipeline", &pipeline_layout, &shader, format, depth_format, wgpu::PolygonMode::Fill,
    );

    let wireframe_pipeline = device
        .features()
        .contains(wgpu::Features::POLYGON_MODE_LINE)
        .then(|| create_box_pipeline(
            device, "wireframe_pipeline", &pipeline_layout, &shader, format, depth_format, wgpu::PolygonMode::Line,
        ));

    PipelineResources { pipeline, wireframe_pipeline }
}

/// Level geometry split into solid and wireframe boxes
pub fn build_scene_meshes(scene: &Scene) -> (Mesh, Mesh) {
    let mut solid = Mesh::empty();
    let mut wire = Mesh::empty();
    for node in scene.nodes() {
        let target = if node.wireframe { &mut wire } else { &mut solid };
        target.push_box(node.bounds.model_matrix(), node.color);
    }
    (solid, wire)
}

/// Gun and beam in world space. Empty while the spectator camera is active.
pub fn build_player_mesh(player: &PlayerController) -> Mesh {
    let mut mesh = Mesh::empty();
    if !player.is_playing() {
        return mesh;
    }

    if player.gun().node.visible {
        mesh.push_box(player.gun_world_matrix() * Mat4::from_scale(GUN_SIZE), GUN_COLOR);
    }

    let ray = player.ray();
    if ray.node.visible && ray.length > 0.0 {
        // Unit box shifted so the beam starts at the muzzle and grows along its local z
        let model = player.ray_world_matrix() * Mat4::from_translation(Vec3::new(0.0, 0.0, 0.5));
        mesh.push_box(model, RAY_COLOR);
    }
    mesh
}

fn upload_or_none(mesh: &Mesh, device: &Device) -> Option<MeshBuffer> {
    (!mesh.is_empty()).then(|| mesh.upload(device))
}

/// GPU side of a frame: pipelines, cached level meshes and the egui overlay
pub struct RenderState {
    pub format: TextureFormat,
    pub alpha_mode: CompositeAlphaMode,
    pub width: u32,
    pub height: u32,

    pub pipeline: RenderPipeline,
    pub wireframe_pipeline: Option<RenderPipeline>,

    scene_mesh: Option<MeshBuffer>,
    wire_mesh: Option<MeshBuffer>,
    scene_revision: Option<u64>,

    pub egui_renderer: egui_wgpu::Renderer,
    pub egui_primitives: Option<Vec<egui::ClippedPrimitive>>,
    pub egui_textures: Option<egui::TexturesDelta>,
    pub egui_dpr: f32,
}

impl RenderState {
    pub fn new(
        format: TextureFormat,
        alpha_mode: CompositeAlphaMode,
        width: u32,
        height: u32,
        pipelines: PipelineResources,
        egui_renderer: egui_wgpu::Renderer,
    ) -> Self {
        Self {
            format,
            alpha_mode,
            width,
            height,
            pipeline: pipelines.pipeline,
            wireframe_pipeline: pipelines.wireframe_pipeline,
            scene_mesh: None,
            wire_mesh: None,
            scene_revision: None,
            egui_renderer,
            egui_primitives: None,
            egui_textures: None,
            egui_dpr: 1.0,
        }
    }

    /// Rebuild level meshes when the scene changed since the last upload
    pub fn sync_scene(&mut self, device: &Device, scene: &Scene) {
        if self.scene_revision == Some(scene.revision()) {
            return;
        }
        let (solid, wire) = build_scene_meshes(scene);
        self.scene_mesh = upload_or_none(&solid, device);
        self.wire_mesh = upload_or_none(&wire, device);
        self.scene_revision = Some(scene.revision());
        tracing::debug!(revision = scene.revision(), "scene meshes rebuilt");
    }

    fn draw_mesh(rp: &mut RenderPass<'_>, mesh: &MeshBuffer) {
        if mesh.index_count == 0 {
            return;
        }
        rp.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        rp.set_index_buffer(mesh.index_buffer.slice(..), IndexFormat::Uint32);
        rp.draw_indexed(0..mesh.index_count, 0, 0..1);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_frame(
        &mut self,
        device: &Device,
        queue: &Queue,
        surface: &Surface,
        depth_view: &TextureView,
        cam_bg: &BindGroup,
        player_mesh: Option<&MeshBuffer>,
        clear: Color,
    ) -> Result<(), SurfaceError> {
        let egui_primitives = self.egui_primitives.take().unwrap_or_default();
        let egui_textures = self.egui_textures.take().unwrap_or_default();

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.width, self.height],
            pixels_per_point: self.egui_dpr,
        };

        let frame = surface.get_current_texture()?;
        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("encoder"),
        });

        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(clear),
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_pipeline(&self.pipeline);
            rp.set_bind_group(0, cam_bg, &[]);

            if let Some(mesh) = &self.scene_mesh {
                Self::draw_mesh(&mut rp, mesh);
            }
            if let Some(mesh) = player_mesh {
                Self::draw_mesh(&mut rp, mesh);
            }

            // Destroyed breakables; without line rendering they simply vanish
            if let (Some(wf), Some(mesh)) = (&self.wireframe_pipeline, &self.wire_mesh) {
                rp.set_pipeline(wf);
                Self::draw_mesh(&mut rp, mesh);
            }
        }

        for (id, image_delta) in &egui_textures.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, &mut encoder, &egui_primitives, &screen_descriptor);

        {
            let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("egui_render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Load,
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer
                .render(&mut egui_pass.forget_lifetime(), &egui_primitives, &screen_descriptor);
        }

        for id in &egui_textures.free {
            self.egui_renderer.free_texture(id);
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
