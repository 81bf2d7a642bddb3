use crate::error::{check_errors, Result};
use gl::types::{GLenum, GLint, GLuint};

/// A raw object name with move-only semantics. `take` zeroes the source
/// so a release never runs twice for the same name.
pub struct RawHandle {
    id: GLuint,
}

impl RawHandle {
    pub fn new(id: GLuint) -> Self {
        Self { id }
    }

    pub fn get(&self) -> GLuint {
        self.id
    }

    pub fn take(&mut self) -> GLuint {
        std::mem::take(&mut self.id)
    }
}

/// Reads back the object name currently bound for `pname`, for scoped
/// guards to restore on drop.
pub(crate) fn current_binding(pname: GLenum) -> Result<GLuint> {
    let mut id: GLint = 0;
    unsafe { gl::GetIntegerv(pname, &mut id) };
    check_errors()?;
    Ok(id as GLuint)
}

#[cfg(test)]
mod tests {
    use super::RawHandle;

    #[test]
    fn take_leaves_zero_behind() {
        let mut handle = RawHandle::new(42);
        assert_eq!(handle.take(), 42);
        assert_eq!(handle.get(), 0);
        assert_eq!(handle.take(), 0);
    }
}
