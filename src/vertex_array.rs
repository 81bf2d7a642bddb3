use crate::buffer::{Buffer, BufferTarget, ScopedBufferBinding};
use crate::draw::IndexType;
use crate::error::{check_errors, drain_errors, Error, Result};
use crate::handle::{self, RawHandle};
use fxhash::FxHashMap;
use gl::types::{GLenum, GLint, GLsizei, GLuint};
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

/// How attribute data is laid out inside its buffer.
#[derive(Debug, Clone, Copy)]
pub struct AttributeLayout {
    pub components: GLint,
    pub component_type: GLenum,
    pub normalized: bool,
    pub stride: GLsizei,
    pub offset: usize,
}

impl AttributeLayout {
    /// Tightly packed float vectors starting at the buffer's beginning.
    pub fn packed_floats(components: GLint) -> Self {
        Self {
            components,
            component_type: gl::FLOAT,
            normalized: false,
            stride: 0,
            offset: 0,
        }
    }
}

/// Shared-owns every buffer referenced by its attribute and index
/// bindings, so source buffers outlive their external owners.
pub struct VertexArray {
    handle: RawHandle,
    attribute_buffers: FxHashMap<GLuint, Rc<Buffer>>,
    index_buffer: Option<Rc<Buffer>>,
    index_type: Option<IndexType>,
}

impl VertexArray {
    pub fn new() -> Result<Self> {
        let mut id = 0;
        unsafe { gl::GenVertexArrays(1, &mut id) };
        check_errors()?;
        Ok(Self {
            handle: RawHandle::new(id),
            attribute_buffers: FxHashMap::default(),
            index_buffer: None,
            index_type: None,
        })
    }

    pub fn get_id(&self) -> GLuint {
        self.handle.get()
    }

    pub fn attribute_buffer(&self, location: GLuint) -> Option<&Rc<Buffer>> {
        self.attribute_buffers.get(&location)
    }

    pub fn index_buffer(&self) -> Option<&Rc<Buffer>> {
        self.index_buffer.as_ref()
    }

    pub fn index_type(&self) -> Result<IndexType> {
        self.index_type.ok_or(Error::MissingIndexType)
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        let id = self.handle.take();
        if id != 0 {
            unsafe { gl::DeleteVertexArrays(1, &id) };
            drain_errors("deleting vertex array");
        }
    }
}

pub struct VertexArrayBinding<'a> {
    vertex_array: &'a mut VertexArray,
}

impl<'a> VertexArrayBinding<'a> {
    pub fn new(vertex_array: &'a mut VertexArray) -> Result<Self> {
        unsafe { gl::BindVertexArray(vertex_array.get_id()) };
        check_errors()?;
        Ok(Self { vertex_array })
    }

    pub fn vertex_array(&self) -> &VertexArray {
        self.vertex_array
    }

    /// Points `location` at `buffer` with the given layout and records the
    /// shared reference. The array-buffer binding is only borrowed for the
    /// pointer call and restored before returning.
    pub fn set_attribute(
        &mut self,
        location: GLuint,
        buffer: &Rc<Buffer>,
        layout: AttributeLayout,
    ) -> Result<()> {
        unsafe { gl::EnableVertexAttribArray(location) };
        check_errors()?;

        {
            let _bound = ScopedBufferBinding::new(buffer, BufferTarget::Array)?;
            unsafe {
                gl::VertexAttribPointer(
                    location,
                    layout.components,
                    layout.component_type,
                    if layout.normalized { gl::TRUE } else { gl::FALSE },
                    layout.stride,
                    layout.offset as *const _,
                )
            };
            check_errors()?;
        }

        self.vertex_array
            .attribute_buffers
            .insert(location, Rc::clone(buffer));
        Ok(())
    }

    /// The element-array binding is part of the vertex array's own state,
    /// so this bind deliberately sticks instead of being scoped.
    pub fn set_index_buffer(&mut self, buffer: &Rc<Buffer>, index_type: IndexType) -> Result<()> {
        unsafe { gl::BindBuffer(BufferTarget::ElementArray.gl(), buffer.get_id()) };
        check_errors()?;

        self.vertex_array.index_buffer = Some(Rc::clone(buffer));
        self.vertex_array.index_type = Some(index_type);
        Ok(())
    }
}

pub struct ScopedVertexArrayBinding<'a> {
    old_vertex_array: GLuint,
    binding: VertexArrayBinding<'a>,
}

impl<'a> ScopedVertexArrayBinding<'a> {
    pub fn new(vertex_array: &'a mut VertexArray) -> Result<Self> {
        let old_vertex_array = handle::current_binding(gl::VERTEX_ARRAY_BINDING)?;
        let binding = VertexArrayBinding::new(vertex_array)?;
        Ok(Self {
            old_vertex_array,
            binding,
        })
    }
}

impl Drop for ScopedVertexArrayBinding<'_> {
    fn drop(&mut self) {
        unsafe { gl::BindVertexArray(self.old_vertex_array) };
        drain_errors("restoring vertex array binding");
    }
}

impl<'a> Deref for ScopedVertexArrayBinding<'a> {
    type Target = VertexArrayBinding<'a>;

    fn deref(&self) -> &Self::Target {
        &self.binding
    }
}

impl DerefMut for ScopedVertexArrayBinding<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.binding
    }
}
