use crate::buffer::{Buffer, BufferTarget, BufferUsage, ScopedBufferBinding};
use crate::draw::{draw_arrays, PrimitiveMode};
use crate::error::{check_errors, Result};
use crate::shader::{Program, ScopedProgramBinding};
use crate::vertex_array::{AttributeLayout, ScopedVertexArrayBinding, VertexArray};
use gl::types::{GLsizei, GLuint};
use nalgebra_glm as glm;
use std::rc::Rc;

/// Accumulates tinted line segments and draws them all in one call.
/// Buffers are re-uploaded lazily when the line set changed.
pub struct DebugDraw {
    endpoints: Vec<glm::Vec3>,
    tints: Vec<glm::Vec4>,

    position_buffer: Option<Rc<Buffer>>,
    tint_buffer: Option<Rc<Buffer>>,

    line_width: f32,
    dirty: bool,
}

impl DebugDraw {
    pub fn new() -> Self {
        Self {
            endpoints: Vec::new(),
            tints: Vec::new(),
            position_buffer: None,
            tint_buffer: None,
            line_width: 1.0,
            dirty: true,
        }
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
    }

    pub fn add_line(&mut self, start: glm::Vec3, end: glm::Vec3, tint: glm::Vec4) {
        self.endpoints.push(start);
        self.endpoints.push(end);

        // One tint per endpoint so the attribute arrays stay parallel.
        self.tints.push(tint);
        self.tints.push(tint);

        self.dirty = true;
    }

    pub fn clear_lines(&mut self) {
        self.endpoints.clear();
        self.tints.clear();
        self.dirty = true;
    }

    pub fn line_count(&self) -> usize {
        self.endpoints.len() / 2
    }

    pub fn rebuild_buffers(&mut self) -> Result<()> {
        let positions = Rc::new(Buffer::new()?);
        {
            let mut bound = ScopedBufferBinding::new(&positions, BufferTarget::Array)?;
            bound.upload(&self.endpoints, BufferUsage::StaticDraw)?;
        }

        let tints = Rc::new(Buffer::new()?);
        {
            let mut bound = ScopedBufferBinding::new(&tints, BufferTarget::Array)?;
            bound.upload(&self.tints, BufferUsage::StaticDraw)?;
        }

        self.position_buffer = Some(positions);
        self.tint_buffer = Some(tints);
        self.dirty = false;
        Ok(())
    }

    pub fn render(&mut self, program: &Program) -> Result<()> {
        if self.endpoints.is_empty() {
            return Ok(());
        }
        if self.dirty {
            self.rebuild_buffers()?;
        }

        let mut vertex_array = VertexArray::new()?;
        let mut bound_vao = ScopedVertexArrayBinding::new(&mut vertex_array)?;

        if let (Some(positions), Some(location)) = (
            &self.position_buffer,
            program.try_attribute_location("position")?,
        ) {
            bound_vao.set_attribute(
                location as GLuint,
                positions,
                AttributeLayout::packed_floats(3),
            )?;
        }
        if let (Some(tints), Some(location)) =
            (&self.tint_buffer, program.try_attribute_location("tint")?)
        {
            bound_vao.set_attribute(location as GLuint, tints, AttributeLayout::packed_floats(4))?;
        }

        unsafe { gl::LineWidth(self.line_width) };
        check_errors()?;

        let _bound_program = ScopedProgramBinding::new(program)?;
        draw_arrays(PrimitiveMode::Lines, 0, self.endpoints.len() as GLsizei)
    }
}

impl Default for DebugDraw {
    fn default() -> Self {
        Self::new()
    }
}
