//! GPU-free `GraphicsContext` that records every call.
//!
//! Compile and link go through the same naga rules as the wgpu backend, so
//! shader errors surface exactly where they would on a device.

use std::collections::HashMap;

use glam::Mat4;
use image::RgbaImage;

use super::reflect::{self, CompiledStage, ProgramInterface};
use super::{
    Bindings, BufferData, BufferHandle, BufferKind, GfxError, GraphicsContext, HandleTable, ProgramHandle,
    ShaderHandle, ShaderStage, TextureHandle, UniformLocation, check_image,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateBuffer(BufferHandle, BufferKind),
    CompileShader(ShaderHandle, ShaderStage),
    LinkProgram(ProgramHandle),
    CreateTexture(TextureHandle),
    UploadTexture(TextureHandle, u32, u32),
    UseProgram(ProgramHandle),
    BindAttribute(u32, BufferHandle, u32),
    BindIndexBuffer(BufferHandle),
    BindTexture(TextureHandle),
    UploadMatrix(String, Mat4),
    DrawIndexed(u32),
    Clear,
    DeleteBuffer(BufferHandle),
    DeleteShader(ShaderHandle),
    DeleteProgram(ProgramHandle),
    DeleteTexture(TextureHandle),
}

#[derive(Debug)]
pub(crate) struct RecordingGraphics {
    pub calls: Vec<Call>,
    /// Makes the next compile of this stage fail.
    pub fail_compile: Option<ShaderStage>,
    buffers: HandleTable<(BufferKind, usize)>,
    shaders: HandleTable<CompiledStage>,
    programs: HandleTable<ProgramInterface>,
    textures: HandleTable<Option<(u32, u32)>>,
    bindings: Bindings,
    uniforms: HashMap<String, Mat4>,
    // Draws since the last clear.
    pending: usize,
}

impl Default for RecordingGraphics {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            fail_compile: None,
            buffers: HandleTable::new("buffer"),
            shaders: HandleTable::new("shader"),
            programs: HandleTable::new("program"),
            textures: HandleTable::new("texture"),
            bindings: Bindings::default(),
            uniforms: HashMap::new(),
            pending: 0,
        }
    }
}

impl RecordingGraphics {
    pub fn draws(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::DrawIndexed(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    /// Draws recorded since the last `clear`.
    pub fn pending_draws(&self) -> usize {
        self.pending
    }

    /// Number of objects still alive across all tables.
    pub fn live_objects(&self) -> usize {
        self.buffers.len() + self.shaders.len() + self.programs.len() + self.textures.len()
    }

    /// Last value uploaded to a uniform, by member name.
    pub fn uniform(&self, name: &str) -> Option<Mat4> {
        self.uniforms.get(name).copied()
    }

    pub fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures.get(texture.0).ok().copied().flatten()
    }

    /// Every create call has exactly one matching delete call.
    pub fn assert_released_once(&self) {
        let mut created: Vec<String> = Vec::new();
        let mut deleted: Vec<String> = Vec::new();
        for call in &self.calls {
            match call {
                Call::CreateBuffer(h, _) => created.push(format!("{h:?}")),
                Call::CompileShader(h, _) => created.push(format!("{h:?}")),
                Call::LinkProgram(h) => created.push(format!("{h:?}")),
                Call::CreateTexture(h) => created.push(format!("{h:?}")),
                Call::DeleteBuffer(h) => deleted.push(format!("{h:?}")),
                Call::DeleteShader(h) => deleted.push(format!("{h:?}")),
                Call::DeleteProgram(h) => deleted.push(format!("{h:?}")),
                Call::DeleteTexture(h) => deleted.push(format!("{h:?}")),
                _ => {}
            }
        }
        created.sort();
        deleted.sort();
        assert_eq!(created, deleted, "every created object must be deleted exactly once");
        assert_eq!(self.live_objects(), 0);
    }
}

impl GraphicsContext for RecordingGraphics {
    fn create_buffer(&mut self, data: BufferData<'_>) -> Result<BufferHandle, GfxError> {
        if data.is_empty() {
            return Err(GfxError::EmptyBuffer);
        }
        let h = BufferHandle(self.buffers.insert((data.kind(), data.len())));
        self.calls.push(Call::CreateBuffer(h, data.kind()));
        Ok(h)
    }

    fn compile_shader(&mut self, source: &str, stage: ShaderStage) -> Result<ShaderHandle, GfxError> {
        if self.fail_compile == Some(stage) {
            self.fail_compile = None;
            return Err(GfxError::ShaderCompile {
                stage,
                log: "injected failure".into(),
            });
        }
        let compiled = reflect::compile(source, stage)?;
        let h = ShaderHandle(self.shaders.insert(compiled));
        self.calls.push(Call::CompileShader(h, stage));
        Ok(h)
    }

    fn link_program(&mut self, stages: &[ShaderHandle]) -> Result<ProgramHandle, GfxError> {
        let compiled = stages
            .iter()
            .map(|s| self.shaders.get(s.0))
            .collect::<Result<Vec<_>, _>>()?;
        let interface = reflect::link(&compiled)?;
        let h = ProgramHandle(self.programs.insert(interface));
        self.calls.push(Call::LinkProgram(h));
        Ok(h)
    }

    fn create_texture(&mut self) -> Result<TextureHandle, GfxError> {
        let h = TextureHandle(self.textures.insert(None));
        self.bindings.texture = Some(h);
        self.calls.push(Call::CreateTexture(h));
        Ok(h)
    }

    fn upload_texture(&mut self, texture: TextureHandle, image: &RgbaImage) -> Result<(), GfxError> {
        check_image(image, 8192)?;
        let (w, h) = image.dimensions();
        *self.textures.get_mut(texture.0)? = Some((w, h));
        self.calls.push(Call::UploadTexture(texture, w, h));
        Ok(())
    }

    fn use_program(&mut self, program: ProgramHandle) -> Result<(), GfxError> {
        self.programs.get(program.0)?;
        self.bindings.program = Some(program);
        self.calls.push(Call::UseProgram(program));
        Ok(())
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        self.programs.get(program.0).ok()?.attribute(name).map(|a| a.location)
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let member = self.programs.get(program.0).ok()?.uniform(name)?;
        Some(UniformLocation {
            program,
            offset: member.offset,
        })
    }

    fn bind_attribute(&mut self, location: u32, buffer: BufferHandle, components: u32) -> Result<(), GfxError> {
        let (kind, _) = *self.buffers.get(buffer.0)?;
        if kind != BufferKind::Attribute {
            return Err(GfxError::WrongBufferKind(buffer.0, "not an attribute buffer"));
        }
        let current = self.bindings.program.and_then(|p| self.programs.get(p.0).ok());
        self.bindings.bind_attribute(current, location, buffer, components)?;
        self.calls.push(Call::BindAttribute(location, buffer, components));
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle) -> Result<(), GfxError> {
        let (kind, _) = *self.buffers.get(buffer.0)?;
        if !matches!(kind, BufferKind::Index(_)) {
            return Err(GfxError::WrongBufferKind(buffer.0, "not an index buffer"));
        }
        self.bindings.index_buffer = Some(buffer);
        self.calls.push(Call::BindIndexBuffer(buffer));
        Ok(())
    }

    fn bind_texture(&mut self, texture: TextureHandle) -> Result<(), GfxError> {
        self.textures.get(texture.0)?;
        self.bindings.texture = Some(texture);
        self.calls.push(Call::BindTexture(texture));
        Ok(())
    }

    fn upload_matrix(&mut self, location: UniformLocation, value: &Mat4) -> Result<(), GfxError> {
        let interface = self.programs.get(location.program.0)?;
        let member = interface
            .uniform_at(location.offset)
            .filter(|m| m.is_mat4)
            .ok_or(GfxError::NotAMatrix { offset: location.offset })?;
        let name = member.name.clone();
        self.uniforms.insert(name.clone(), *value);
        self.calls.push(Call::UploadMatrix(name, *value));
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32) -> Result<(), GfxError> {
        let program = self
            .bindings
            .program
            .ok_or_else(|| GfxError::Draw("no program in use".into()))?;
        let index = self
            .bindings
            .index_buffer
            .ok_or_else(|| GfxError::Draw("no index buffer bound".into()))?;
        let (_, index_len) = *self.buffers.get(index.0)?;
        let interface = self.programs.get(program.0)?;
        self.bindings.check_draw(interface, index_len, index_count)?;
        self.pending += 1;
        self.calls.push(Call::DrawIndexed(index_count));
        Ok(())
    }

    fn clear(&mut self) {
        self.pending = 0;
        self.calls.push(Call::Clear);
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) -> Result<(), GfxError> {
        self.buffers.remove(buffer.0)?;
        self.bindings.forget_buffer(buffer);
        self.calls.push(Call::DeleteBuffer(buffer));
        Ok(())
    }

    fn delete_shader(&mut self, shader: ShaderHandle) -> Result<(), GfxError> {
        self.shaders.remove(shader.0)?;
        self.calls.push(Call::DeleteShader(shader));
        Ok(())
    }

    fn delete_program(&mut self, program: ProgramHandle) -> Result<(), GfxError> {
        self.programs.remove(program.0)?;
        self.bindings.forget_program(program);
        self.calls.push(Call::DeleteProgram(program));
        Ok(())
    }

    fn delete_texture(&mut self, texture: TextureHandle) -> Result<(), GfxError> {
        self.textures.remove(texture.0)?;
        self.bindings.forget_texture(texture);
        self.calls.push(Call::DeleteTexture(texture));
        Ok(())
    }
}
