//! The cube's shading program: `clip = projection · view · world · position`
//! and a texture lookup at the interpolated UV.

use crate::camera::Transform;
use crate::gfx::{GfxError, GraphicsContext, ProgramHandle, UniformLocation};

pub const VERTEX_SOURCE: &str = include_str!("shaders/cube.vert.wgsl");
pub const FRAGMENT_SOURCE: &str = include_str!("shaders/cube.frag.wgsl");

pub const POSITION_ATTRIBUTE: &str = "vertex_position";
pub const UV_ATTRIBUTE: &str = "vertex_texture";

pub const WORLD_MATRIX: &str = "world_matrix";
pub const VIEW_MATRIX: &str = "view_matrix";
pub const PROJECTION_MATRIX: &str = "projection_matrix";

/// Uniform locations of the three camera matrices in a linked program.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CameraUniforms {
    pub world: UniformLocation,
    pub view: UniformLocation,
    pub projection: UniformLocation,
}

impl CameraUniforms {
    pub fn locate<G: GraphicsContext + ?Sized>(gfx: &G, program: ProgramHandle) -> Result<Self, GfxError> {
        let find = |name: &str| {
            gfx.uniform_location(program, name)
                .ok_or_else(|| GfxError::ProgramLink(format!("program has no `{name}` uniform")))
        };
        Ok(Self {
            world: find(WORLD_MATRIX)?,
            view: find(VIEW_MATRIX)?,
            projection: find(PROJECTION_MATRIX)?,
        })
    }

    pub fn upload_all<G: GraphicsContext + ?Sized>(&self, gfx: &mut G, transform: &Transform) -> Result<(), GfxError> {
        gfx.upload_matrix(self.world, &transform.world)?;
        gfx.upload_matrix(self.view, &transform.view)?;
        gfx.upload_matrix(self.projection, &transform.projection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::ShaderStage;
    use crate::gfx::reflect::{compile, link};

    #[test]
    fn sources_validate_and_link() {
        let vs = compile(VERTEX_SOURCE, ShaderStage::Vertex).unwrap();
        let fs = compile(FRAGMENT_SOURCE, ShaderStage::Fragment).unwrap();
        let program = link(&[&vs, &fs]).unwrap();

        let position = program.attribute(POSITION_ATTRIBUTE).unwrap();
        assert_eq!((position.location, position.components), (0, 3));
        let uv = program.attribute(UV_ATTRIBUTE).unwrap();
        assert_eq!((uv.location, uv.components), (1, 2));

        for (name, offset) in [(WORLD_MATRIX, 0), (VIEW_MATRIX, 64), (PROJECTION_MATRIX, 128)] {
            let member = program.uniform(name).unwrap();
            assert_eq!(member.offset, offset, "{name}");
            assert!(member.is_mat4, "{name}");
        }
        assert_eq!(program.uniform_size, 192);
    }

    #[test]
    fn stages_are_not_interchangeable() {
        assert!(compile(VERTEX_SOURCE, ShaderStage::Fragment).is_err());
        assert!(compile(FRAGMENT_SOURCE, ShaderStage::Vertex).is_err());
    }
}
