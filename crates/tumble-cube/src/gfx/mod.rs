//! Host graphics API.
//!
//! [`GraphicsContext`] is the immediate-mode surface the render loop talks to:
//! opaque handles for buffers, shader stages, programs and textures, plus a
//! small amount of global binding state (current program, attribute buffers,
//! index buffer, texture), in the style of a GL context.
//!
//! `wgpu_backend` implements it on top of wgpu. Shader stages are validated
//! and reflected with naga (`reflect`) so both the real backend and the test
//! recorder share the same compile/link rules.

mod handles;
pub mod reflect;
pub mod wgpu_backend;

#[cfg(test)]
pub(crate) mod recording;

use std::collections::BTreeMap;
use std::fmt;

use glam::Mat4;
use image::RgbaImage;

pub use handles::{BufferHandle, ProgramHandle, ShaderHandle, TextureHandle};
pub(crate) use handles::HandleTable;

use reflect::ProgramInterface;

// ── buffers ───────────────────────────────────────────────────────────────

/// Element width of an index buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IndexFormat {
    U16,
    U32,
}

/// What a buffer is bound as. Inferred from the element type of its data.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferKind {
    Attribute,
    Index(IndexFormat),
}

/// Typed buffer contents.
#[derive(Debug, Copy, Clone)]
pub enum BufferData<'a> {
    F32(&'a [f32]),
    U16(&'a [u16]),
    U32(&'a [u32]),
}

impl<'a> BufferData<'a> {
    /// Integer element types are index data; floats are attribute data.
    pub fn kind(&self) -> BufferKind {
        match self {
            BufferData::F32(_) => BufferKind::Attribute,
            BufferData::U16(_) => BufferKind::Index(IndexFormat::U16),
            BufferData::U32(_) => BufferKind::Index(IndexFormat::U32),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            BufferData::F32(d) => d.len(),
            BufferData::U16(d) => d.len(),
            BufferData::U32(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            BufferData::F32(d) => bytemuck::cast_slice(d),
            BufferData::U16(d) => bytemuck::cast_slice(d),
            BufferData::U32(d) => bytemuck::cast_slice(d),
        }
    }
}

impl<'a> From<&'a [f32]> for BufferData<'a> {
    fn from(d: &'a [f32]) -> Self {
        BufferData::F32(d)
    }
}

impl<'a> From<&'a [u16]> for BufferData<'a> {
    fn from(d: &'a [u16]) -> Self {
        BufferData::U16(d)
    }
}

impl<'a> From<&'a [u32]> for BufferData<'a> {
    fn from(d: &'a [u32]) -> Self {
        BufferData::U32(d)
    }
}

// ── shaders ───────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Location of a uniform inside a program's uniform block.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformLocation {
    pub program: ProgramHandle,
    /// Byte offset inside the block.
    pub offset: u32,
}

// ── errors ────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum GfxError {
    #[error("buffer data is empty")]
    EmptyBuffer,

    #[error("failed to compile {stage} shader:\n{log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("failed to link program: {0}")]
    ProgramLink(String),

    #[error("unknown or released {kind} handle #{id}")]
    UnknownHandle { kind: &'static str, id: u32 },

    #[error("buffer #{0} cannot be bound here: {1}")]
    WrongBufferKind(u32, &'static str),

    #[error("attribute location {location} takes {expected} components, got {got}")]
    AttributeComponents { location: u32, expected: u32, got: u32 },

    #[error("uniform at offset {offset} is not a 4x4 float matrix")]
    NotAMatrix { offset: u32 },

    #[error("draw rejected: {0}")]
    Draw(String),

    #[error("texture upload rejected: {0}")]
    TextureUpload(String),
}

// ── context ───────────────────────────────────────────────────────────────

/// Immediate-mode graphics API consumed by the render loop.
///
/// Handles are only valid on the context that created them. Every `delete_*`
/// call releases a handle exactly once; using it afterwards is an
/// [`GfxError::UnknownHandle`].
pub trait GraphicsContext {
    /// Creates a static buffer. The binding kind follows the element type.
    fn create_buffer(&mut self, data: BufferData<'_>) -> Result<BufferHandle, GfxError>;

    /// Compiles one shader stage from WGSL source.
    fn compile_shader(&mut self, source: &str, stage: ShaderStage) -> Result<ShaderHandle, GfxError>;

    /// Links compiled stages into a program.
    fn link_program(&mut self, stages: &[ShaderHandle]) -> Result<ProgramHandle, GfxError>;

    /// Creates a texture with undefined (zeroed) contents and binds it.
    /// Sampling clamps to the edge with nearest filtering.
    fn create_texture(&mut self) -> Result<TextureHandle, GfxError>;

    /// Replaces the texture's storage with `image`.
    fn upload_texture(&mut self, texture: TextureHandle, image: &RgbaImage) -> Result<(), GfxError>;

    fn use_program(&mut self, program: ProgramHandle) -> Result<(), GfxError>;

    /// Location of a vertex input by name, or `None` when the program has no
    /// such input.
    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32>;

    /// Location of a uniform block member by name.
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    /// Feeds attribute `location` from a float buffer with `components` per vertex.
    fn bind_attribute(&mut self, location: u32, buffer: BufferHandle, components: u32) -> Result<(), GfxError>;

    fn bind_index_buffer(&mut self, buffer: BufferHandle) -> Result<(), GfxError>;

    fn bind_texture(&mut self, texture: TextureHandle) -> Result<(), GfxError>;

    fn upload_matrix(&mut self, location: UniformLocation, value: &Mat4) -> Result<(), GfxError>;

    /// Draws `index_count` indices of the bound index buffer as triangles.
    fn draw_indexed(&mut self, index_count: u32) -> Result<(), GfxError>;

    /// Discards draws recorded since the last present. The framebuffer is
    /// cleared by the host when it presents the next frame, not here.
    fn clear(&mut self);

    fn delete_buffer(&mut self, buffer: BufferHandle) -> Result<(), GfxError>;
    fn delete_shader(&mut self, shader: ShaderHandle) -> Result<(), GfxError>;
    fn delete_program(&mut self, program: ProgramHandle) -> Result<(), GfxError>;
    fn delete_texture(&mut self, texture: TextureHandle) -> Result<(), GfxError>;
}

// ── shared binding state ──────────────────────────────────────────────────

/// An attribute binding: buffer + components per vertex.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct AttributeBinding {
    pub buffer: BufferHandle,
    pub components: u32,
}

/// Global bind points of a context.
///
/// Deleting an object also unbinds it, as in GL.
#[derive(Debug, Default)]
pub(crate) struct Bindings {
    pub program: Option<ProgramHandle>,
    pub attributes: BTreeMap<u32, AttributeBinding>,
    pub index_buffer: Option<BufferHandle>,
    pub texture: Option<TextureHandle>,
}

impl Bindings {
    pub fn forget_buffer(&mut self, buffer: BufferHandle) {
        self.attributes.retain(|_, b| b.buffer != buffer);
        if self.index_buffer == Some(buffer) {
            self.index_buffer = None;
        }
    }

    pub fn forget_program(&mut self, program: ProgramHandle) {
        if self.program == Some(program) {
            self.program = None;
        }
    }

    pub fn forget_texture(&mut self, texture: TextureHandle) {
        if self.texture == Some(texture) {
            self.texture = None;
        }
    }

    /// Binds `buffer` to attribute `location`. When `current` (the program
    /// in use) has an input there, `components` must match it.
    pub fn bind_attribute(
        &mut self,
        current: Option<&ProgramInterface>,
        location: u32,
        buffer: BufferHandle,
        components: u32,
    ) -> Result<(), GfxError> {
        let expected = current
            .and_then(|interface| interface.attribute_at(location))
            .map(|input| input.components);
        if let Some(expected) = expected.filter(|&n| n != components) {
            return Err(GfxError::AttributeComponents {
                location,
                expected,
                got: components,
            });
        }
        self.attributes.insert(location, AttributeBinding { buffer, components });
        Ok(())
    }

    /// Checks that a draw of `index_count` indices is fully specified.
    ///
    /// `index_len` is the element count of the bound index buffer.
    pub fn check_draw(
        &self,
        interface: &ProgramInterface,
        index_len: usize,
        index_count: u32,
    ) -> Result<(), GfxError> {
        for input in &interface.attributes {
            let Some(binding) = self.attributes.get(&input.location) else {
                return Err(GfxError::Draw(format!(
                    "attribute `{}` (location {}) has no buffer",
                    input.name, input.location
                )));
            };
            if binding.components != input.components {
                return Err(GfxError::AttributeComponents {
                    location: input.location,
                    expected: input.components,
                    got: binding.components,
                });
            }
        }

        if index_count as usize > index_len {
            return Err(GfxError::Draw(format!(
                "{index_count} indices requested, index buffer holds {index_len}"
            )));
        }

        Ok(())
    }
}

/// Rejects images the backend cannot store.
pub(crate) fn check_image(image: &RgbaImage, max_dimension: u32) -> Result<(), GfxError> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Err(GfxError::TextureUpload(format!("image is {w}x{h}")));
    }
    if w > max_dimension || h > max_dimension {
        return Err(GfxError::TextureUpload(format!(
            "{w}x{h} exceeds the {max_dimension}px limit"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── BufferData ────────────────────────────────────────────────────────

    #[test]
    fn float_data_is_attribute_data() {
        let data: BufferData<'_> = [1.0f32, 2.0].as_slice().into();
        assert_eq!(data.kind(), BufferKind::Attribute);
        assert_eq!(data.as_bytes().len(), 8);
    }

    #[test]
    fn integer_data_is_index_data() {
        let short: BufferData<'_> = [0u16, 1, 2].as_slice().into();
        let long: BufferData<'_> = [0u32, 1, 2].as_slice().into();
        assert_eq!(short.kind(), BufferKind::Index(IndexFormat::U16));
        assert_eq!(long.kind(), BufferKind::Index(IndexFormat::U32));
        assert_eq!(long.as_bytes().len(), 12);
    }

    #[test]
    fn empty_data_reports_empty() {
        let data: BufferData<'_> = (&[] as &[f32]).into();
        assert!(data.is_empty());
    }

    // ── Bindings ──────────────────────────────────────────────────────────

    #[test]
    fn forgetting_a_buffer_unbinds_it_everywhere() {
        let buffer = BufferHandle(4);
        let mut bindings = Bindings::default();
        bindings.attributes.insert(0, AttributeBinding { buffer, components: 3 });
        bindings.index_buffer = Some(buffer);

        bindings.forget_buffer(buffer);

        assert!(bindings.attributes.is_empty());
        assert!(bindings.index_buffer.is_none());
    }

    #[test]
    fn attribute_components_must_match_the_program_input() {
        use super::recording::RecordingGraphics;
        use crate::shading::{FRAGMENT_SOURCE, POSITION_ATTRIBUTE, VERTEX_SOURCE};

        let mut gfx = RecordingGraphics::default();
        let vs = gfx.compile_shader(VERTEX_SOURCE, ShaderStage::Vertex).unwrap();
        let fs = gfx.compile_shader(FRAGMENT_SOURCE, ShaderStage::Fragment).unwrap();
        let program = gfx.link_program(&[vs, fs]).unwrap();
        let buffer = gfx.create_buffer([0.0f32; 6].as_slice().into()).unwrap();
        let location = gfx.attribute_location(program, POSITION_ATTRIBUTE).unwrap();

        // Nothing to check against until a program is in use.
        gfx.bind_attribute(location, buffer, 2).unwrap();

        gfx.use_program(program).unwrap();
        let err = gfx.bind_attribute(location, buffer, 2).unwrap_err();
        assert!(matches!(
            err,
            GfxError::AttributeComponents { expected: 3, got: 2, .. }
        ));
        gfx.bind_attribute(location, buffer, 3).unwrap();
    }

    #[test]
    fn unused_location_takes_any_component_count() {
        let mut bindings = Bindings::default();
        bindings.bind_attribute(None, 7, BufferHandle(1), 4).unwrap();
        assert_eq!(
            bindings.attributes.get(&7),
            Some(&AttributeBinding { buffer: BufferHandle(1), components: 4 })
        );
    }

    #[test]
    fn check_image_rejects_oversized() {
        let image = RgbaImage::new(8, 2);
        assert!(check_image(&image, 4).is_err());
        assert!(check_image(&image, 8).is_ok());
    }
}
