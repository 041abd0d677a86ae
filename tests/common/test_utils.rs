use std::{
    cell::RefCell,
    collections::HashSet,
    rc::Rc,
};

use render_ngin::{
    context::Context,
    device::{
        AttributeBinding, AttributeLocation, BlendState, BufferHandle, BufferKind, DepthFunc,
        DeviceCapabilities, GraphicsDevice, Primitive, ProgramHandle, TextureHandle,
        TextureParams, UniformLocation,
    },
};

/// Everything the mock device observed, in call order where it matters.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    UseProgram(u32),
    UniformF32(u32, f32),
    UniformVec(u32, Vec<f32>),
    UniformMat3(u32, [f32; 9]),
    UniformMat4(u32, [f32; 16]),
    BindTexture { location: u32, unit: u32, texture: u32 },
    BindAttribute { location: u32, binding: AttributeBinding },
    DepthTest(Option<DepthFunc>),
    Blend(Option<BlendState>),
    Clear([f32; 4]),
    DrawArrays {
        primitive: Primitive,
        first: u32,
        count: u32,
        instances: Option<u32>,
    },
    DrawElements {
        primitive: Primitive,
        buffer: u32,
        count: u32,
        instances: Option<u32>,
    },
}

pub(crate) struct MockState {
    pub calls: Vec<Call>,
    pub buffers: Vec<(BufferKind, Vec<u8>)>,
    pub textures: Vec<(u32, u32, Vec<u8>)>,
    pub programs: Vec<(String, String)>,
    /// Uniform/attribute names that pretend not to exist in any program.
    pub missing_names: HashSet<String>,
    pub fail_compile: bool,
    pub compile_attempts: u32,
    pub capabilities: DeviceCapabilities,
    next_location: u32,
}

impl MockState {
    pub fn draw_calls(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::DrawArrays { .. } | Call::DrawElements { .. }))
            .collect()
    }
}

/// A recording backend: hands out sequential handles, remembers every
/// buffer upload and call, draws nothing.
pub(crate) struct MockDevice {
    state: Rc<RefCell<MockState>>,
}

pub(crate) type MockHandle = Rc<RefCell<MockState>>;

impl MockDevice {
    pub fn new() -> (Self, MockHandle) {
        Self::with_capabilities(DeviceCapabilities {
            supports_instancing: true,
            supports_large_indices: true,
            max_texture_size: 4096,
        })
    }

    pub fn with_capabilities(capabilities: DeviceCapabilities) -> (Self, MockHandle) {
        let state = Rc::new(RefCell::new(MockState {
            calls: Vec::new(),
            buffers: Vec::new(),
            textures: Vec::new(),
            programs: Vec::new(),
            missing_names: HashSet::new(),
            fail_compile: false,
            compile_attempts: 0,
            capabilities,
            next_location: 0,
        }));
        (
            Self {
                state: state.clone(),
            },
            state,
        )
    }
}

impl GraphicsDevice for MockDevice {
    fn capabilities(&self) -> DeviceCapabilities {
        self.state.borrow().capabilities
    }

    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8]) -> BufferHandle {
        let mut state = self.state.borrow_mut();
        state.buffers.push((kind, contents.to_vec()));
        BufferHandle(state.buffers.len() as u32 - 1)
    }

    fn update_buffer(&mut self, buffer: BufferHandle, contents: &[u8]) {
        let mut state = self.state.borrow_mut();
        let slot = buffer.0 as usize;
        if slot < state.buffers.len() {
            state.buffers[slot].1 = contents.to_vec();
        }
    }

    fn create_texture(&mut self, width: u32, height: u32, pixels: &[u8]) -> TextureHandle {
        let mut state = self.state.borrow_mut();
        state.textures.push((width, height, pixels.to_vec()));
        TextureHandle(state.textures.len() as u32 - 1)
    }

    fn set_texture_parameters(&mut self, _texture: TextureHandle, _params: &TextureParams) {}

    fn compile_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramHandle, String> {
        let mut state = self.state.borrow_mut();
        state.compile_attempts += 1;
        if state.fail_compile {
            return Err("mock compile failure".to_string());
        }
        state
            .programs
            .push((vertex_source.to_string(), fragment_source.to_string()));
        Ok(ProgramHandle(state.programs.len() as u32 - 1))
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.state.borrow_mut().calls.push(Call::UseProgram(program.0));
    }

    fn uniform_location(&mut self, _program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let mut state = self.state.borrow_mut();
        if state.missing_names.contains(name) {
            return None;
        }
        state.next_location += 1;
        Some(UniformLocation(state.next_location))
    }

    fn attribute_location(
        &mut self,
        _program: ProgramHandle,
        name: &str,
    ) -> Option<AttributeLocation> {
        let mut state = self.state.borrow_mut();
        if state.missing_names.contains(name) {
            return None;
        }
        state.next_location += 1;
        Some(AttributeLocation(state.next_location))
    }

    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32) {
        self.state
            .borrow_mut()
            .calls
            .push(Call::UniformF32(location.0, value));
    }

    fn set_uniform_vec(&mut self, location: UniformLocation, value: &[f32]) {
        self.state
            .borrow_mut()
            .calls
            .push(Call::UniformVec(location.0, value.to_vec()));
    }

    fn set_uniform_mat3(&mut self, location: UniformLocation, value: &[f32; 9]) {
        self.state
            .borrow_mut()
            .calls
            .push(Call::UniformMat3(location.0, *value));
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &[f32; 16]) {
        self.state
            .borrow_mut()
            .calls
            .push(Call::UniformMat4(location.0, *value));
    }

    fn bind_texture(&mut self, location: UniformLocation, unit: u32, texture: TextureHandle) {
        self.state.borrow_mut().calls.push(Call::BindTexture {
            location: location.0,
            unit,
            texture: texture.0,
        });
    }

    fn bind_attribute(&mut self, location: AttributeLocation, binding: &AttributeBinding) {
        self.state.borrow_mut().calls.push(Call::BindAttribute {
            location: location.0,
            binding: *binding,
        });
    }

    fn set_depth_test(&mut self, func: Option<DepthFunc>) {
        self.state.borrow_mut().calls.push(Call::DepthTest(func));
    }

    fn set_blend(&mut self, blend: Option<BlendState>) {
        self.state.borrow_mut().calls.push(Call::Blend(blend));
    }

    fn set_viewport(&mut self, _width: u32, _height: u32) {}

    fn clear(&mut self, colour: [f32; 4]) {
        self.state.borrow_mut().calls.push(Call::Clear(colour));
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) {
        self.state.borrow_mut().calls.push(Call::DrawArrays {
            primitive,
            first,
            count,
            instances: None,
        });
    }

    fn draw_arrays_instanced(
        &mut self,
        primitive: Primitive,
        first: u32,
        count: u32,
        instances: u32,
    ) {
        self.state.borrow_mut().calls.push(Call::DrawArrays {
            primitive,
            first,
            count,
            instances: Some(instances),
        });
    }

    fn draw_elements(&mut self, primitive: Primitive, indices: BufferHandle, count: u32) {
        self.state.borrow_mut().calls.push(Call::DrawElements {
            primitive,
            buffer: indices.0,
            count,
            instances: None,
        });
    }

    fn draw_elements_instanced(
        &mut self,
        primitive: Primitive,
        indices: BufferHandle,
        count: u32,
        instances: u32,
    ) {
        self.state.borrow_mut().calls.push(Call::DrawElements {
            primitive,
            buffer: indices.0,
            count,
            instances: Some(instances),
        });
    }
}

/// A context over a fresh recording device, plus the handle to inspect it.
pub(crate) fn test_context() -> (Context, MockHandle) {
    let (device, handle) = MockDevice::new();
    (Context::new(Box::new(device), 800, 600), handle)
}
