use crate::framebuffer::FrameBufferStatus;
use gl::types::GLenum;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("backend reported {0}")]
    Backend(GlErrorCode),

    #[error("shader compilation failed: {0}")]
    Compile(String),

    #[error("program linking failed: {0}")]
    Link(String),

    #[error("unknown shader stage 0x{0:x}")]
    UnknownShaderStage(GLenum),

    #[error("attribute {0:?} not found")]
    AttributeNotFound(String),

    #[error("uniform {0:?} not found")]
    UniformNotFound(String),

    #[error("identifier {0:?} contains an interior nul")]
    InvalidIdentifier(String),

    #[error("vertex array has no index buffer")]
    MissingIndexType,

    #[error("unsupported index type 0x{0:x}")]
    UnsupportedIndexType(GLenum),

    #[error("framebuffer incomplete: {0}")]
    Incomplete(FrameBufferStatus),

    #[error("failed to decode {}: {reason}", path.display())]
    ImageDecode { path: PathBuf, reason: String },

    #[error("{} has {channels} channels, expected 3 or 4", path.display())]
    UnsupportedChannelCount { path: PathBuf, channels: usize },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load model {}", path.display())]
    Model {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("model {} contains no shapes", .0.display())]
    EmptyModel(PathBuf),

    #[error("index count is not a multiple of 3")]
    MalformedMesh,

    #[error("failed to initialize windowing")]
    GlfwInit(#[from] glfw::InitError),

    #[error("failed to create window")]
    WindowCreation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlErrorCode {
    InvalidEnum,
    InvalidValue,
    InvalidOperation,
    InvalidFramebufferOperation,
    OutOfMemory,
    StackUnderflow,
    StackOverflow,
    Unknown(GLenum),
}

impl GlErrorCode {
    pub fn from_raw(raw: GLenum) -> Self {
        match raw {
            gl::INVALID_ENUM => Self::InvalidEnum,
            gl::INVALID_VALUE => Self::InvalidValue,
            gl::INVALID_OPERATION => Self::InvalidOperation,
            gl::INVALID_FRAMEBUFFER_OPERATION => Self::InvalidFramebufferOperation,
            gl::OUT_OF_MEMORY => Self::OutOfMemory,
            gl::STACK_UNDERFLOW => Self::StackUnderflow,
            gl::STACK_OVERFLOW => Self::StackOverflow,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for GlErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnum => f.write_str("GL_INVALID_ENUM"),
            Self::InvalidValue => f.write_str("GL_INVALID_VALUE"),
            Self::InvalidOperation => f.write_str("GL_INVALID_OPERATION"),
            Self::InvalidFramebufferOperation => f.write_str("GL_INVALID_FRAMEBUFFER_OPERATION"),
            Self::OutOfMemory => f.write_str("GL_OUT_OF_MEMORY"),
            Self::StackUnderflow => f.write_str("GL_STACK_UNDERFLOW"),
            Self::StackOverflow => f.write_str("GL_STACK_OVERFLOW"),
            Self::Unknown(raw) => write!(f, "unknown error code 0x{raw:x}"),
        }
    }
}

/// Fails with the first queued error code. The queue accumulates one code
/// per flag until read, so the rest is drained too; otherwise a later,
/// unrelated check would report stale errors.
pub fn check_errors() -> Result<()> {
    let first = unsafe { gl::GetError() };
    if first == gl::NO_ERROR {
        return Ok(());
    }
    while unsafe { gl::GetError() } != gl::NO_ERROR {}
    Err(Error::Backend(GlErrorCode::from_raw(first)))
}

/// Non-failing drain for drop paths. A destructor must not panic, and a
/// secondary failure during cleanup should never mask the original one,
/// so anything found is only logged.
pub fn drain_errors(context: &str) {
    loop {
        let raw = unsafe { gl::GetError() };
        if raw == gl::NO_ERROR {
            return;
        }
        log::error!("{context}: {}", GlErrorCode::from_raw(raw));
    }
}

#[cfg(test)]
mod tests {
    use super::GlErrorCode;

    #[test]
    fn codes_map_to_symbolic_names() {
        assert_eq!(
            GlErrorCode::from_raw(gl::INVALID_ENUM).to_string(),
            "GL_INVALID_ENUM"
        );
        assert_eq!(
            GlErrorCode::from_raw(gl::INVALID_OPERATION).to_string(),
            "GL_INVALID_OPERATION"
        );
        assert_eq!(
            GlErrorCode::from_raw(gl::OUT_OF_MEMORY).to_string(),
            "GL_OUT_OF_MEMORY"
        );
    }

    #[test]
    fn unrecognized_code_is_preserved() {
        assert_eq!(
            GlErrorCode::from_raw(0xbeef),
            GlErrorCode::Unknown(0xbeef)
        );
    }
}
