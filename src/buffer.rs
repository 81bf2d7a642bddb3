use crate::error::{check_errors, drain_errors, Result};
use crate::handle::{self, RawHandle};
use gl::types::{GLenum, GLsizeiptr, GLuint};
use std::mem::size_of_val;
use std::ops::{Deref, DerefMut};
use std::ptr;

/// The binding targets a buffer can be attached to. Each target has its
/// own "currently bound" state with its own query enumerant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

impl BufferTarget {
    pub fn gl(self) -> GLenum {
        match self {
            Self::Array => gl::ARRAY_BUFFER,
            Self::ElementArray => gl::ELEMENT_ARRAY_BUFFER,
        }
    }

    pub fn binding_query(self) -> GLenum {
        match self {
            Self::Array => gl::ARRAY_BUFFER_BINDING,
            Self::ElementArray => gl::ELEMENT_ARRAY_BUFFER_BINDING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

impl BufferUsage {
    pub fn gl(self) -> GLenum {
        match self {
            Self::StaticDraw => gl::STATIC_DRAW,
            Self::DynamicDraw => gl::DYNAMIC_DRAW,
            Self::StreamDraw => gl::STREAM_DRAW,
        }
    }
}

pub struct Buffer {
    handle: RawHandle,
}

impl Buffer {
    pub fn new() -> Result<Self> {
        let mut id = 0;
        unsafe { gl::GenBuffers(1, &mut id) };
        check_errors()?;
        Ok(Self {
            handle: RawHandle::new(id),
        })
    }

    pub fn get_id(&self) -> GLuint {
        self.handle.get()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        let id = self.handle.take();
        if id != 0 {
            unsafe { gl::DeleteBuffers(1, &id) };
            drain_errors("deleting buffer");
        }
    }
}

pub struct BufferBinding<'a> {
    buffer: &'a Buffer,
    target: BufferTarget,
}

impl<'a> BufferBinding<'a> {
    pub fn new(buffer: &'a Buffer, target: BufferTarget) -> Result<Self> {
        unsafe { gl::BindBuffer(target.gl(), buffer.get_id()) };
        check_errors()?;
        Ok(Self { buffer, target })
    }

    pub fn buffer(&self) -> &'a Buffer {
        self.buffer
    }

    pub fn target(&self) -> BufferTarget {
        self.target
    }

    /// Replaces the buffer's entire data store with `data`.
    pub fn upload<T>(&mut self, data: &[T], usage: BufferUsage) -> Result<()> {
        unsafe {
            gl::BufferData(
                self.target.gl(),
                size_of_val(data) as GLsizeiptr,
                data.as_ptr().cast(),
                usage.gl(),
            )
        };
        check_errors()
    }

    /// Allocates `byte_len` bytes with unspecified content.
    pub fn allocate(&mut self, byte_len: usize, usage: BufferUsage) -> Result<()> {
        unsafe {
            gl::BufferData(
                self.target.gl(),
                byte_len as GLsizeiptr,
                ptr::null(),
                usage.gl(),
            )
        };
        check_errors()
    }

    /// Overwrites a subrange of the existing data store. The range must
    /// already be allocated.
    pub fn patch<T>(&mut self, byte_offset: usize, data: &[T]) -> Result<()> {
        unsafe {
            gl::BufferSubData(
                self.target.gl(),
                byte_offset as isize,
                size_of_val(data) as GLsizeiptr,
                data.as_ptr().cast(),
            )
        };
        check_errors()
    }
}

pub struct ScopedBufferBinding<'a> {
    old_buffer: GLuint,
    binding: BufferBinding<'a>,
}

impl<'a> ScopedBufferBinding<'a> {
    pub fn new(buffer: &'a Buffer, target: BufferTarget) -> Result<Self> {
        let old_buffer = handle::current_binding(target.binding_query())?;
        let binding = BufferBinding::new(buffer, target)?;
        Ok(Self { old_buffer, binding })
    }
}

impl Drop for ScopedBufferBinding<'_> {
    fn drop(&mut self) {
        unsafe { gl::BindBuffer(self.binding.target().gl(), self.old_buffer) };
        drain_errors("restoring buffer binding");
    }
}

impl<'a> Deref for ScopedBufferBinding<'a> {
    type Target = BufferBinding<'a>;

    fn deref(&self) -> &Self::Target {
        &self.binding
    }
}

impl DerefMut for ScopedBufferBinding<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.binding
    }
}

#[cfg(test)]
mod tests {
    use super::BufferTarget;

    #[test]
    fn targets_pair_with_their_binding_queries() {
        assert_eq!(BufferTarget::Array.gl(), gl::ARRAY_BUFFER);
        assert_eq!(
            BufferTarget::Array.binding_query(),
            gl::ARRAY_BUFFER_BINDING
        );
        assert_eq!(BufferTarget::ElementArray.gl(), gl::ELEMENT_ARRAY_BUFFER);
        assert_eq!(
            BufferTarget::ElementArray.binding_query(),
            gl::ELEMENT_ARRAY_BUFFER_BINDING
        );
    }
}
