use crate::error::{check_errors, Error, Result};
use gl::types::{GLenum, GLint, GLsizei};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveMode {
    Triangles,
    TriangleFan,
    Lines,
}

impl PrimitiveMode {
    pub fn gl(self) -> GLenum {
        match self {
            Self::Triangles => gl::TRIANGLES,
            Self::TriangleFan => gl::TRIANGLE_FAN,
            Self::Lines => gl::LINES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    UnsignedByte,
    Byte,
    UnsignedShort,
    Short,
    UnsignedInt,
    Int,
}

impl IndexType {
    /// Fails on anything outside the closed set rather than defaulting to
    /// a wrong width.
    pub fn from_gl(raw: GLenum) -> Result<Self> {
        match raw {
            gl::UNSIGNED_BYTE => Ok(Self::UnsignedByte),
            gl::BYTE => Ok(Self::Byte),
            gl::UNSIGNED_SHORT => Ok(Self::UnsignedShort),
            gl::SHORT => Ok(Self::Short),
            gl::UNSIGNED_INT => Ok(Self::UnsignedInt),
            gl::INT => Ok(Self::Int),
            other => Err(Error::UnsupportedIndexType(other)),
        }
    }

    pub fn gl(self) -> GLenum {
        match self {
            Self::UnsignedByte => gl::UNSIGNED_BYTE,
            Self::Byte => gl::BYTE,
            Self::UnsignedShort => gl::UNSIGNED_SHORT,
            Self::Short => gl::SHORT,
            Self::UnsignedInt => gl::UNSIGNED_INT,
            Self::Int => gl::INT,
        }
    }

    pub fn byte_width(self) -> usize {
        match self {
            Self::UnsignedByte | Self::Byte => 1,
            Self::UnsignedShort | Self::Short => 2,
            Self::UnsignedInt | Self::Int => 4,
        }
    }
}

pub fn draw_arrays(mode: PrimitiveMode, first: GLint, count: GLsizei) -> Result<()> {
    unsafe { gl::DrawArrays(mode.gl(), first, count) };
    check_errors()
}

/// Indexed draw. `first` is an index count, translated into a byte offset
/// from the index type's width.
pub fn draw_elements(
    mode: PrimitiveMode,
    index_type: IndexType,
    first: usize,
    count: GLsizei,
) -> Result<()> {
    let byte_offset = first * index_type.byte_width();
    unsafe { gl::DrawElements(mode.gl(), count, index_type.gl(), byte_offset as *const _) };
    check_errors()
}

pub fn clear(red: f32, green: f32, blue: f32, alpha: f32) -> Result<()> {
    unsafe {
        gl::ClearColor(red, green, blue, alpha);
        gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT);
    }
    check_errors()
}

#[cfg(test)]
mod tests {
    use super::IndexType;
    use crate::error::Error;

    #[test]
    fn byte_widths_are_fixed() {
        assert_eq!(IndexType::UnsignedByte.byte_width(), 1);
        assert_eq!(IndexType::Byte.byte_width(), 1);
        assert_eq!(IndexType::UnsignedShort.byte_width(), 2);
        assert_eq!(IndexType::Short.byte_width(), 2);
        assert_eq!(IndexType::UnsignedInt.byte_width(), 4);
        assert_eq!(IndexType::Int.byte_width(), 4);
    }

    #[test]
    fn conversions_round_trip() {
        for index_type in [
            IndexType::UnsignedByte,
            IndexType::Byte,
            IndexType::UnsignedShort,
            IndexType::Short,
            IndexType::UnsignedInt,
            IndexType::Int,
        ] {
            assert_eq!(IndexType::from_gl(index_type.gl()).unwrap(), index_type);
        }
    }

    #[test]
    fn unsupported_index_type_fails() {
        match IndexType::from_gl(gl::FLOAT) {
            Err(Error::UnsupportedIndexType(raw)) => assert_eq!(raw, gl::FLOAT),
            other => panic!("expected UnsupportedIndexType, got {other:?}"),
        }
    }
}
