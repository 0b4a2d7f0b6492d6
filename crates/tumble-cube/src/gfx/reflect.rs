//! WGSL validation and interface reflection with naga.
//!
//! Resource binding convention shared by every program:
//! - `@group(0) @binding(0)`: the uniform block
//! - `@group(1) @binding(0)`: the sampled texture
//! - `@group(1) @binding(1)`: its sampler

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, Module, Scalar, TypeInner, VectorSize};

use super::{GfxError, ShaderStage};

pub const UNIFORM_BINDING: (u32, u32) = (0, 0);
pub const TEXTURE_BINDING: (u32, u32) = (1, 0);
pub const SAMPLER_BINDING: (u32, u32) = (1, 1);

/// A validated single-stage module.
#[derive(Debug, Clone)]
pub struct CompiledStage {
    pub stage: ShaderStage,
    pub entry_point: String,
    pub module: Module,
}

/// A float vertex input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexInput {
    pub name: String,
    pub location: u32,
    pub components: u32,
}

/// A member of the uniform block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformMember {
    pub name: String,
    pub offset: u32,
    pub is_mat4: bool,
}

/// Everything a backend needs to build a pipeline for a linked program.
#[derive(Debug, Clone)]
pub struct ProgramInterface {
    pub vertex_entry: String,
    pub fragment_entry: String,
    /// Sorted by location.
    pub attributes: Vec<VertexInput>,
    pub uniforms: Vec<UniformMember>,
    /// Byte size of the uniform block, 0 when there is none.
    pub uniform_size: u32,
}

impl ProgramInterface {
    pub fn attribute(&self, name: &str) -> Option<&VertexInput> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_at(&self, location: u32) -> Option<&VertexInput> {
        self.attributes.iter().find(|a| a.location == location)
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformMember> {
        self.uniforms.iter().find(|u| u.name == name)
    }

    pub fn uniform_at(&self, offset: u32) -> Option<&UniformMember> {
        self.uniforms.iter().find(|u| u.offset == offset)
    }
}

/// Parses and validates `source`, requiring an entry point for `stage`.
pub fn compile(source: &str, stage: ShaderStage) -> Result<CompiledStage, GfxError> {
    let compile_error = |log: String| GfxError::ShaderCompile { stage, log };

    let module = naga::front::wgsl::parse_str(source).map_err(|e| compile_error(e.emit_to_string(source)))?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| compile_error(e.emit_to_string(source)))?;

    let wanted = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let entry_point = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == wanted)
        .map(|ep| ep.name.clone())
        .ok_or_else(|| compile_error(format!("no @{stage} entry point")))?;

    for (_, var) in module.global_variables.iter() {
        let Some(rb) = &var.binding else { continue };
        let slot = (rb.group, rb.binding);
        if slot != UNIFORM_BINDING && slot != TEXTURE_BINDING && slot != SAMPLER_BINDING {
            return Err(compile_error(format!(
                "`{}` uses @group({}) @binding({}), outside the uniform/texture/sampler slots",
                var.name.as_deref().unwrap_or("<unnamed>"),
                rb.group,
                rb.binding
            )));
        }
    }

    Ok(CompiledStage {
        stage,
        entry_point,
        module,
    })
}

/// Links one vertex and one fragment stage.
pub fn link(stages: &[&CompiledStage]) -> Result<ProgramInterface, GfxError> {
    let pick = |stage: ShaderStage| -> Result<&CompiledStage, GfxError> {
        let mut found = stages.iter().filter(|s| s.stage == stage);
        match (found.next(), found.next()) {
            (Some(s), None) => Ok(*s),
            (None, _) => Err(GfxError::ProgramLink(format!("no {stage} stage"))),
            (Some(_), Some(_)) => Err(GfxError::ProgramLink(format!("more than one {stage} stage"))),
        }
    };
    let vertex = pick(ShaderStage::Vertex)?;
    let fragment = pick(ShaderStage::Fragment)?;

    let produced = vertex_outputs(vertex);
    for (name, location) in fragment_inputs(fragment) {
        if !produced.contains(&location) {
            return Err(GfxError::ProgramLink(format!(
                "fragment input `{name}` at location {location} is not written by the vertex stage"
            )));
        }
    }

    let mut attributes = vertex_inputs(vertex)?;
    attributes.sort_by_key(|a| a.location);

    let (uniforms, uniform_size) = match (uniform_block(&vertex.module), uniform_block(&fragment.module)) {
        (Some(v), Some(f)) if v != f => {
            return Err(GfxError::ProgramLink(
                "vertex and fragment stages declare different uniform blocks".into(),
            ));
        }
        (Some(block), _) | (None, Some(block)) => block,
        (None, None) => (Vec::new(), 0),
    };

    Ok(ProgramInterface {
        vertex_entry: vertex.entry_point.clone(),
        fragment_entry: fragment.entry_point.clone(),
        attributes,
        uniforms,
        uniform_size,
    })
}

fn entry<'a>(stage: &'a CompiledStage) -> Option<&'a naga::EntryPoint> {
    stage.module.entry_points.iter().find(|ep| ep.name == stage.entry_point)
}

/// Flattens `(name, binding, type)` over plain and struct-typed bindings.
fn flatten<'a>(
    module: &'a Module,
    name: Option<&'a str>,
    binding: Option<&'a Binding>,
    ty: naga::Handle<naga::Type>,
    out: &mut Vec<(String, &'a Binding, naga::Handle<naga::Type>)>,
) {
    match (binding, &module.types[ty].inner) {
        (Some(b), _) => out.push((name.unwrap_or_default().to_string(), b, ty)),
        (None, TypeInner::Struct { members, .. }) => {
            for m in members {
                flatten(module, m.name.as_deref(), m.binding.as_ref(), m.ty, out);
            }
        }
        (None, _) => {}
    }
}

fn location(binding: &Binding) -> Option<u32> {
    match binding {
        Binding::Location { location, .. } => Some(*location),
        _ => None,
    }
}

fn vertex_outputs(stage: &CompiledStage) -> Vec<u32> {
    let Some(ep) = entry(stage) else { return Vec::new() };
    let Some(result) = &ep.function.result else { return Vec::new() };
    let mut flat = Vec::new();
    flatten(&stage.module, None, result.binding.as_ref(), result.ty, &mut flat);
    flat.iter().filter_map(|(_, b, _)| location(b)).collect()
}

fn fragment_inputs(stage: &CompiledStage) -> Vec<(String, u32)> {
    let Some(ep) = entry(stage) else { return Vec::new() };
    let mut flat = Vec::new();
    for arg in &ep.function.arguments {
        flatten(&stage.module, arg.name.as_deref(), arg.binding.as_ref(), arg.ty, &mut flat);
    }
    flat.into_iter()
        .filter_map(|(name, b, _)| location(b).map(|l| (name, l)))
        .collect()
}

fn vertex_inputs(stage: &CompiledStage) -> Result<Vec<VertexInput>, GfxError> {
    let Some(ep) = entry(stage) else { return Ok(Vec::new()) };
    let mut flat = Vec::new();
    for arg in &ep.function.arguments {
        flatten(&stage.module, arg.name.as_deref(), arg.binding.as_ref(), arg.ty, &mut flat);
    }

    let mut inputs = Vec::new();
    for (name, binding, ty) in flat {
        let Some(location) = location(binding) else { continue };
        let components = match stage.module.types[ty].inner {
            TypeInner::Scalar(Scalar::F32) => 1,
            TypeInner::Vector { size, scalar: Scalar::F32 } => size as u32,
            _ => {
                return Err(GfxError::ProgramLink(format!(
                    "vertex input `{name}` is not a 32-bit float scalar or vector"
                )));
            }
        };
        inputs.push(VertexInput {
            name,
            location,
            components,
        });
    }
    Ok(inputs)
}

fn uniform_block(module: &Module) -> Option<(Vec<UniformMember>, u32)> {
    let (_, var) = module
        .global_variables
        .iter()
        .find(|(_, v)| v.space == AddressSpace::Uniform)?;

    let is_mat4 = |ty: naga::Handle<naga::Type>| {
        matches!(
            module.types[ty].inner,
            TypeInner::Matrix {
                columns: VectorSize::Quad,
                rows: VectorSize::Quad,
                scalar: Scalar::F32,
            }
        )
    };

    match &module.types[var.ty].inner {
        TypeInner::Struct { members, span } => {
            let members = members
                .iter()
                .map(|m| UniformMember {
                    name: m.name.clone().unwrap_or_default(),
                    offset: m.offset,
                    is_mat4: is_mat4(m.ty),
                })
                .collect();
            Some((members, *span))
        }
        // A bare uniform is a one-member block named after the variable.
        inner => {
            let member = UniformMember {
                name: var.name.clone().unwrap_or_default(),
                offset: 0,
                is_mat4: is_mat4(var.ty),
            };
            Some((vec![member], inner.size(module.to_ctx())))
        }
    }
}
