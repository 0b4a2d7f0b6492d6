//! Start/stop lifecycle and per-frame drawing of the cube.

use log::{debug, info, trace, warn};

use crate::camera::{CameraConfig, Transform};
use crate::geometry::{CUBE_INDICES, CUBE_POSITIONS, CUBE_UVS, INDEX_COUNT, POSITION_COMPONENTS, UV_COMPONENTS};
use crate::gfx::{
    BufferHandle, GfxError, GraphicsContext, ProgramHandle, ShaderHandle, ShaderStage, TextureHandle,
};
use crate::schedule::{AnimationHandle, FrameScheduler};
use crate::shading::{CameraUniforms, FRAGMENT_SOURCE, POSITION_ATTRIBUTE, UV_ATTRIBUTE, VERTEX_SOURCE};
use crate::texture::{TextureLoad, TextureLoadError, TextureRequest};

#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    #[error("render loop is already running")]
    AlreadyRunning,

    #[error("program has no `{0}` attribute")]
    MissingAttribute(&'static str),

    #[error(transparent)]
    Gfx(#[from] GfxError),

    #[error(transparent)]
    Texture(#[from] TextureLoadError),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LoopConfig {
    pub camera: CameraConfig,
    /// Rotation about X applied once at start, in pointer pixels.
    pub initial_tilt: f32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            initial_tilt: 35.0,
        }
    }
}

// ── resources ─────────────────────────────────────────────────────────────

/// Every GPU object the cube owns. Released as a unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResourceSet {
    pub position_buffer: BufferHandle,
    pub uv_buffer: BufferHandle,
    pub index_buffer: BufferHandle,
    pub vertex_shader: ShaderHandle,
    pub fragment_shader: ShaderHandle,
    pub texture: TextureHandle,
    pub program: ProgramHandle,
}

/// Objects created so far while building a `ResourceSet`.
#[derive(Debug, Default)]
struct Partial {
    buffers: Vec<BufferHandle>,
    shaders: Vec<ShaderHandle>,
    texture: Option<TextureHandle>,
    program: Option<ProgramHandle>,
}

impl Partial {
    fn release<G: GraphicsContext + ?Sized>(self, gfx: &mut G) {
        let mut failures = 0;
        for buffer in self.buffers {
            if let Err(e) = gfx.delete_buffer(buffer) {
                warn!("release buffer: {e}");
                failures += 1;
            }
        }
        for shader in self.shaders {
            if let Err(e) = gfx.delete_shader(shader) {
                warn!("release shader: {e}");
                failures += 1;
            }
        }
        if let Some(Err(e)) = self.program.map(|p| gfx.delete_program(p)) {
            warn!("release program: {e}");
            failures += 1;
        }
        if let Some(Err(e)) = self.texture.map(|t| gfx.delete_texture(t)) {
            warn!("release texture: {e}");
            failures += 1;
        }
        if failures > 0 {
            warn!("{failures} objects could not be released");
        }
    }
}

impl From<ResourceSet> for Partial {
    fn from(set: ResourceSet) -> Self {
        Self {
            buffers: vec![set.position_buffer, set.uv_buffer, set.index_buffer],
            shaders: vec![set.vertex_shader, set.fragment_shader],
            texture: Some(set.texture),
            program: Some(set.program),
        }
    }
}

impl ResourceSet {
    /// Creates buffers, shader stages, the texture and the linked program.
    ///
    /// On failure everything created so far is released before returning.
    pub fn create<G: GraphicsContext + ?Sized>(gfx: &mut G) -> Result<Self, GfxError> {
        let mut partial = Partial::default();
        match Self::create_into(gfx, &mut partial) {
            Ok(set) => Ok(set),
            Err(e) => {
                debug!("resource creation failed; releasing partial set");
                partial.release(gfx);
                Err(e)
            }
        }
    }

    fn create_into<G: GraphicsContext + ?Sized>(gfx: &mut G, partial: &mut Partial) -> Result<Self, GfxError> {
        let position_buffer = gfx.create_buffer(CUBE_POSITIONS.as_slice().into())?;
        partial.buffers.push(position_buffer);
        let uv_buffer = gfx.create_buffer(CUBE_UVS.as_slice().into())?;
        partial.buffers.push(uv_buffer);
        let index_buffer = gfx.create_buffer(CUBE_INDICES.as_slice().into())?;
        partial.buffers.push(index_buffer);

        let vertex_shader = gfx.compile_shader(VERTEX_SOURCE, ShaderStage::Vertex)?;
        partial.shaders.push(vertex_shader);
        let fragment_shader = gfx.compile_shader(FRAGMENT_SOURCE, ShaderStage::Fragment)?;
        partial.shaders.push(fragment_shader);

        let texture = gfx.create_texture()?;
        partial.texture = Some(texture);

        let program = gfx.link_program(&[vertex_shader, fragment_shader])?;
        partial.program = Some(program);

        Ok(Self {
            position_buffer,
            uv_buffer,
            index_buffer,
            vertex_shader,
            fragment_shader,
            texture,
            program,
        })
    }

    /// Deletes every handle exactly once.
    pub fn release<G: GraphicsContext + ?Sized>(self, gfx: &mut G) {
        Partial::from(self).release(gfx);
    }
}

// ── loop ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Running {
    resources: ResourceSet,
    uniforms: CameraUniforms,
    transform: Transform,
    texture_load: Option<TextureLoad>,
    frame: AnimationHandle,
    frames_drawn: u64,
}

#[derive(Debug)]
enum LoopState {
    Stopped,
    Running(Box<Running>),
}

/// Owns the cube's GPU resources and transform between `start` and `stop`.
///
/// The graphics context is passed into every call; the loop never holds it.
#[derive(Debug)]
pub struct RenderLoop {
    config: LoopConfig,
    scheduler: FrameScheduler,
    state: LoopState,
}

impl RenderLoop {
    pub fn new(config: LoopConfig) -> Self {
        Self {
            config,
            scheduler: FrameScheduler::new(),
            state: LoopState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, LoopState::Running(_))
    }

    pub fn transform(&self) -> Option<&Transform> {
        match &self.state {
            LoopState::Running(r) => Some(&r.transform),
            LoopState::Stopped => None,
        }
    }

    pub fn resources(&self) -> Option<&ResourceSet> {
        match &self.state {
            LoopState::Running(r) => Some(&r.resources),
            LoopState::Stopped => None,
        }
    }

    /// Creates all resources, uploads the initial matrices, binds the mesh
    /// and schedules the first frame. `texture` starts loading in the
    /// background; the cube samples a blank texture until it arrives.
    pub fn start<G: GraphicsContext + ?Sized>(
        &mut self,
        gfx: &mut G,
        aspect: f32,
        texture: TextureRequest,
    ) -> Result<(), LoopError> {
        if self.is_running() {
            return Err(LoopError::AlreadyRunning);
        }

        let resources = ResourceSet::create(gfx)?;
        let running = match self.wire(gfx, resources, aspect, texture) {
            Ok(running) => running,
            Err(e) => {
                resources.release(gfx);
                return Err(e);
            }
        };

        info!("render loop started (aspect {aspect:.3})");
        self.state = LoopState::Running(Box::new(running));
        Ok(())
    }

    fn wire<G: GraphicsContext + ?Sized>(
        &mut self,
        gfx: &mut G,
        resources: ResourceSet,
        aspect: f32,
        texture: TextureRequest,
    ) -> Result<Running, LoopError> {
        let program = resources.program;
        gfx.use_program(program)?;

        let uniforms = CameraUniforms::locate(gfx, program)?;
        let mut transform = Transform::new(&self.config.camera, aspect);
        uniforms.upload_all(gfx, &transform)?;

        transform.rotate(self.config.initial_tilt, 0.0);
        gfx.upload_matrix(uniforms.world, &transform.world)?;

        for (name, buffer, components) in [
            (POSITION_ATTRIBUTE, resources.position_buffer, POSITION_COMPONENTS),
            (UV_ATTRIBUTE, resources.uv_buffer, UV_COMPONENTS),
        ] {
            let location = gfx
                .attribute_location(program, name)
                .ok_or(LoopError::MissingAttribute(name))?;
            gfx.bind_attribute(location, buffer, components)?;
        }
        gfx.bind_index_buffer(resources.index_buffer)?;
        gfx.bind_texture(resources.texture)?;

        let texture_load = TextureLoad::spawn(texture)?;
        let frame = self.scheduler.request();

        Ok(Running {
            resources,
            uniforms,
            transform,
            texture_load: Some(texture_load),
            frame,
            frames_drawn: 0,
        })
    }

    /// Rotates the cube and uploads the new world matrix right away.
    ///
    /// Does nothing while stopped.
    pub fn rotate<G: GraphicsContext + ?Sized>(&mut self, gfx: &mut G, dx: f32, dy: f32) -> Result<(), LoopError> {
        let LoopState::Running(running) = &mut self.state else {
            return Ok(());
        };
        running.transform.rotate(dx, dy);
        gfx.upload_matrix(running.uniforms.world, &running.transform.world)?;
        Ok(())
    }

    /// One frame: deliver a finished texture load, drop anything left over
    /// from an unpresented frame, draw, request the next frame. Returns
    /// whether a frame was drawn.
    pub fn animation<G: GraphicsContext + ?Sized>(&mut self, gfx: &mut G) -> Result<bool, LoopError> {
        let LoopState::Running(running) = &mut self.state else {
            return Ok(false);
        };
        match self.scheduler.fire() {
            Some(handle) if handle == running.frame => {}
            _ => return Ok(false),
        }

        running.deliver_texture(gfx);
        // A frame that never reached the screen must not carry its draw
        // into the next one.
        gfx.clear();
        gfx.draw_indexed(INDEX_COUNT)?;
        running.frames_drawn += 1;
        running.frame = self.scheduler.request();
        trace!("frame {} drawn", running.frames_drawn);
        Ok(true)
    }

    /// Cancels the pending frame and texture load, releases every resource
    /// and clears the framebuffer. Returns `false` if already stopped.
    pub fn stop<G: GraphicsContext + ?Sized>(&mut self, gfx: &mut G) -> bool {
        let LoopState::Running(running) = std::mem::replace(&mut self.state, LoopState::Stopped) else {
            debug!("stop ignored: render loop is not running");
            return false;
        };
        let Running {
            resources,
            texture_load,
            frame,
            frames_drawn,
            ..
        } = *running;

        self.scheduler.cancel(frame);
        if let Some(load) = texture_load {
            load.cancel();
        }
        resources.release(gfx);
        gfx.clear();

        info!("render loop stopped after {frames_drawn} frames");
        true
    }
}

impl Running {
    fn deliver_texture<G: GraphicsContext + ?Sized>(&mut self, gfx: &mut G) {
        let Some(load) = self.texture_load.as_mut() else { return };
        let Some(result) = load.poll() else { return };

        match result {
            Ok(image) => {
                let (w, h) = image.dimensions();
                match gfx.upload_texture(self.resources.texture, &image) {
                    Ok(()) => info!("texture `{}` ready ({w}x{h})", load.label()),
                    Err(e) => warn!("texture `{}` upload failed: {e}", load.label()),
                }
            }
            Err(e) => warn!("texture `{}` failed to load: {e}", load.label()),
        }
        self.texture_load = None;
    }
}
