use glam::{Mat4, Vec4};

use crate::renderer::culling::ShadowSplitData;

/// Clip-space and texture conventions of the device the commands target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClipConventions {
    /// Depth buffer stores 1 at the near plane.
    pub reversed_z: bool,
    /// Texture rows start at the top (wgpu, D3D, Metal).
    pub flip_y: bool,
}

impl ClipConventions {
    pub const WGPU: Self = Self {
        reversed_z: false,
        flip_y: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadAction {
    Load,
    Clear,
    DontCare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    Store,
    DontCare,
}

/// Description of a frame-scoped render texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporaryTarget {
    pub width: u32,
    pub height: u32,
    pub depth_bits: u32,
    pub filter: wgpu::FilterMode,
    pub format: wgpu::TextureFormat,
}

impl TemporaryTarget {
    pub fn shadow_map(size: u32) -> Self {
        Self {
            width: size,
            height: size,
            depth_bits: 32,
            filter: wgpu::FilterMode::Linear,
            format: wgpu::TextureFormat::Depth32Float,
        }
    }

    pub fn texture_descriptor<'a>(&self, label: &'a str) -> wgpu::TextureDescriptor<'a> {
        wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: self.width.max(1),
                height: self.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        }
    }
}

/// Pixel rectangle inside a render target, origin at the first texel row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Selects which casters a shadow draw renders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowDrawSettings {
    pub visible_light_index: usize,
    pub split_data: ShadowSplitData,
}

/// Sink for the GPU work recorded by the lighting and shadow code.
///
/// Calls are appended in order and executed later by the backend.
pub trait CommandRecorder {
    fn conventions(&self) -> ClipConventions;

    fn get_temporary_target(&mut self, name: &'static str, target: TemporaryTarget);
    fn release_temporary_target(&mut self, name: &'static str);
    fn set_render_target(&mut self, name: &'static str, load: LoadAction, store: StoreAction);
    fn clear_render_target(&mut self, clear_depth: bool, clear_color: bool);

    fn begin_sample(&mut self, name: &'static str);
    fn end_sample(&mut self, name: &'static str);

    fn set_viewport(&mut self, viewport: Viewport);
    fn set_view_projection(&mut self, view: Mat4, projection: Mat4);
    fn set_depth_bias(&mut self, bias: wgpu::DepthBiasState);

    fn set_global_int(&mut self, name: &'static str, value: i32);
    fn set_global_vector(&mut self, name: &'static str, value: Vec4);
    fn set_global_vector_array(&mut self, name: &'static str, values: &[Vec4]);
    fn set_global_matrix_array(&mut self, name: &'static str, values: &[Mat4]);

    fn enable_keyword(&mut self, keyword: &'static str);
    fn disable_keyword(&mut self, keyword: &'static str);

    fn draw_shadows(&mut self, settings: &ShadowDrawSettings);
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShadowCommand {
    GetTemporaryTarget {
        name: &'static str,
        target: TemporaryTarget,
    },
    ReleaseTemporaryTarget(&'static str),
    SetRenderTarget {
        name: &'static str,
        load: LoadAction,
        store: StoreAction,
    },
    ClearRenderTarget {
        depth: bool,
        color: bool,
    },
    BeginSample(&'static str),
    EndSample(&'static str),
    SetViewport(Viewport),
    SetViewProjection {
        view: Mat4,
        projection: Mat4,
    },
    SetDepthBias(wgpu::DepthBiasState),
    SetGlobalInt(&'static str, i32),
    SetGlobalVector(&'static str, Vec4),
    SetGlobalVectorArray(&'static str, Vec<Vec4>),
    SetGlobalMatrixArray(&'static str, Vec<Mat4>),
    EnableKeyword(&'static str),
    DisableKeyword(&'static str),
    DrawShadows(ShadowDrawSettings),
}

/// In-memory recorder that keeps every command in submission order.
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    conventions: ClipConventions,
    commands: Vec<ShadowCommand>,
}

impl CommandBuffer {
    pub fn new(conventions: ClipConventions) -> Self {
        Self {
            conventions,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[ShadowCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| matches!(command, ShadowCommand::DrawShadows(_)))
            .count()
    }

    pub fn allocations(&self) -> impl Iterator<Item = &TemporaryTarget> + '_ {
        self.commands.iter().filter_map(|command| match command {
            ShadowCommand::GetTemporaryTarget { target, .. } => Some(target),
            _ => None,
        })
    }

    pub fn releases(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.iter().filter_map(|command| match command {
            ShadowCommand::ReleaseTemporaryTarget(name) => Some(*name),
            _ => None,
        })
    }

    pub fn viewports(&self) -> impl Iterator<Item = Viewport> + '_ {
        self.commands.iter().filter_map(|command| match command {
            ShadowCommand::SetViewport(viewport) => Some(*viewport),
            _ => None,
        })
    }

    /// Last value uploaded for a global int.
    pub fn global_int(&self, name: &str) -> Option<i32> {
        self.commands.iter().rev().find_map(|command| match command {
            ShadowCommand::SetGlobalInt(n, value) if *n == name => Some(*value),
            _ => None,
        })
    }

    pub fn global_vector(&self, name: &str) -> Option<Vec4> {
        self.commands.iter().rev().find_map(|command| match command {
            ShadowCommand::SetGlobalVector(n, value) if *n == name => Some(*value),
            _ => None,
        })
    }

    pub fn global_vector_array(&self, name: &str) -> Option<&[Vec4]> {
        self.commands.iter().rev().find_map(|command| match command {
            ShadowCommand::SetGlobalVectorArray(n, values) if *n == name => {
                Some(values.as_slice())
            }
            _ => None,
        })
    }

    pub fn global_matrix_array(&self, name: &str) -> Option<&[Mat4]> {
        self.commands.iter().rev().find_map(|command| match command {
            ShadowCommand::SetGlobalMatrixArray(n, values) if *n == name => {
                Some(values.as_slice())
            }
            _ => None,
        })
    }

    /// Final enabled state of a keyword, `None` if it was never touched.
    pub fn keyword_enabled(&self, keyword: &str) -> Option<bool> {
        self.commands.iter().rev().find_map(|command| match command {
            ShadowCommand::EnableKeyword(k) if *k == keyword => Some(true),
            ShadowCommand::DisableKeyword(k) if *k == keyword => Some(false),
            _ => None,
        })
    }

    fn push(&mut self, command: ShadowCommand) {
        log::trace!("record {:?}", command);
        self.commands.push(command);
    }
}

impl CommandRecorder for CommandBuffer {
    fn conventions(&self) -> ClipConventions {
        self.conventions
    }

    fn get_temporary_target(&mut self, name: &'static str, target: TemporaryTarget) {
        self.push(ShadowCommand::GetTemporaryTarget { name, target });
    }

    fn release_temporary_target(&mut self, name: &'static str) {
        self.push(ShadowCommand::ReleaseTemporaryTarget(name));
    }

    fn set_render_target(&mut self, name: &'static str, load: LoadAction, store: StoreAction) {
        self.push(ShadowCommand::SetRenderTarget { name, load, store });
    }

    fn clear_render_target(&mut self, clear_depth: bool, clear_color: bool) {
        self.push(ShadowCommand::ClearRenderTarget {
            depth: clear_depth,
            color: clear_color,
        });
    }

    fn begin_sample(&mut self, name: &'static str) {
        self.push(ShadowCommand::BeginSample(name));
    }

    fn end_sample(&mut self, name: &'static str) {
        self.push(ShadowCommand::EndSample(name));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.push(ShadowCommand::SetViewport(viewport));
    }

    fn set_view_projection(&mut self, view: Mat4, projection: Mat4) {
        self.push(ShadowCommand::SetViewProjection { view, projection });
    }

    fn set_depth_bias(&mut self, bias: wgpu::DepthBiasState) {
        self.push(ShadowCommand::SetDepthBias(bias));
    }

    fn set_global_int(&mut self, name: &'static str, value: i32) {
        self.push(ShadowCommand::SetGlobalInt(name, value));
    }

    fn set_global_vector(&mut self, name: &'static str, value: Vec4) {
        self.push(ShadowCommand::SetGlobalVector(name, value));
    }

    fn set_global_vector_array(&mut self, name: &'static str, values: &[Vec4]) {
        self.push(ShadowCommand::SetGlobalVectorArray(name, values.to_vec()));
    }

    fn set_global_matrix_array(&mut self, name: &'static str, values: &[Mat4]) {
        self.push(ShadowCommand::SetGlobalMatrixArray(name, values.to_vec()));
    }

    fn enable_keyword(&mut self, keyword: &'static str) {
        self.push(ShadowCommand::EnableKeyword(keyword));
    }

    fn disable_keyword(&mut self, keyword: &'static str) {
        self.push(ShadowCommand::DisableKeyword(keyword));
    }

    fn draw_shadows(&mut self, settings: &ShadowDrawSettings) {
        self.push(ShadowCommand::DrawShadows(*settings));
    }
}
