//! Shaders: source, compiled program and declared bindings.
//!
//! A [`Shader`] owns a vertex/fragment source pair, the binding
//! declarations that describe how its variables get populated, and the
//! cached results of the two one-off phases:
//!
//! 1. program compile/link through the device (once per shader; a failure
//!    is remembered and every later pass using the shader skips),
//! 2. validation: uniform/attribute location lookup (once per compiled
//!    program; only dynamic values are re-resolved per frame).
//!
//! Cloning a compiled shader shares the program handle but gives the clone
//! its own binding values, which is how several scene objects reuse one
//! program without sharing binding state. Clone after compiling to get the
//! sharing; clones made earlier each compile their own program.

use crate::{
    device::{GraphicsDevice, ProgramHandle},
    error::RenderError,
    pipelines::binding::{BindingDecl, BindingKey, BindingSource, VarSlot, VarType},
};

#[derive(Clone, Debug)]
pub struct Shader {
    label: String,
    vertex_source: String,
    fragment_source: String,
    declarations: Vec<BindingDecl>,
    program: Option<ProgramHandle>,
    failure: Option<String>,
    slots: Option<Vec<VarSlot>>,
}

impl Shader {
    pub fn new(label: &str, vertex_source: &str, fragment_source: &str) -> Self {
        Self {
            label: label.to_string(),
            vertex_source: vertex_source.to_string(),
            fragment_source: fragment_source.to_string(),
            declarations: Vec::new(),
            program: None,
            failure: None,
            slots: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Declare a variable populated from a semantic binding key. The key
    /// is parsed here, so a typo fails at declare time.
    pub fn bind(&mut self, name: &str, ty: VarType, key: &str) -> Result<(), RenderError> {
        let key = BindingKey::parse(key)?;
        self.declarations.push(BindingDecl {
            name: name.to_string(),
            ty,
            source: BindingSource::Semantic(key),
        });
        self.slots = None;
        Ok(())
    }

    /// Declare a variable set to a literal constant vector; bypasses
    /// semantic lookup entirely. The arity is checked here.
    pub fn bind_literal(
        &mut self,
        name: &str,
        ty: VarType,
        values: &[f32],
    ) -> Result<(), RenderError> {
        let expected = match ty {
            VarType::Scalar => 1,
            VarType::Vec2 => 2,
            VarType::Vec3 => 3,
            VarType::Vec4 => 4,
            VarType::Mat3 => 9,
            VarType::Mat4 => 16,
            VarType::Sampler => {
                return Err(RenderError::binding(name, "samplers cannot be literals"));
            }
        };
        if values.len() != expected {
            return Err(RenderError::binding(
                name,
                format!("literal has {} values but the type needs {expected}", values.len()),
            ));
        }
        self.declarations.push(BindingDecl {
            name: name.to_string(),
            ty,
            source: BindingSource::Literal(values.to_vec()),
        });
        self.slots = None;
        Ok(())
    }

    pub fn declarations(&self) -> &[BindingDecl] {
        &self.declarations
    }

    pub fn is_compiled(&self) -> bool {
        self.program.is_some()
    }

    /// Compile and validate as needed; returns the program handle and the
    /// cached location slots. Both phases run at most once; a remembered
    /// compile failure keeps erroring until a new shader replaces this one.
    pub(crate) fn ensure_ready(
        &mut self,
        device: &mut dyn GraphicsDevice,
    ) -> Result<(ProgramHandle, &[VarSlot]), RenderError> {
        if let Some(message) = &self.failure {
            return Err(RenderError::Compile {
                label: self.label.clone(),
                message: message.clone(),
            });
        }
        let program = match self.program {
            Some(program) => program,
            None => match device.compile_program(&self.vertex_source, &self.fragment_source) {
                Ok(program) => {
                    self.program = Some(program);
                    program
                }
                Err(message) => {
                    self.failure = Some(message.clone());
                    return Err(RenderError::Compile {
                        label: self.label.clone(),
                        message,
                    });
                }
            },
        };
        if self.slots.is_none() {
            let slots = self
                .declarations
                .iter()
                .map(|declaration| {
                    let attribute = matches!(
                        &declaration.source,
                        BindingSource::Semantic(key) if key.is_attribute()
                    );
                    if attribute {
                        VarSlot::Attribute(device.attribute_location(program, &declaration.name))
                    } else {
                        VarSlot::Uniform(device.uniform_location(program, &declaration.name))
                    }
                })
                .collect();
            self.slots = Some(slots);
        }
        // just filled above
        Ok((program, self.slots.as_deref().unwrap()))
    }
}
