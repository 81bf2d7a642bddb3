use crate::error::{check_errors, drain_errors, Error, Result};
use crate::handle::{self, RawHandle};
use gl::types::{GLenum, GLint, GLsizei, GLuint};
use nalgebra_glm as glm;
use std::ffi::CString;
use std::fs;
use std::ops::Deref;
use std::path::Path;
use std::rc::Rc;
use strum::EnumCount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumCount)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl(self) -> GLenum {
        match self {
            Self::Vertex => gl::VERTEX_SHADER,
            Self::Fragment => gl::FRAGMENT_SHADER,
        }
    }

    pub fn from_gl(raw: GLenum) -> Result<Self> {
        match raw {
            gl::VERTEX_SHADER => Ok(Self::Vertex),
            gl::FRAGMENT_SHADER => Ok(Self::Fragment),
            other => Err(Error::UnknownShaderStage(other)),
        }
    }
}

pub struct Shader {
    handle: RawHandle,
    stage: ShaderStage,
}

impl Shader {
    pub fn new(stage: ShaderStage) -> Result<Self> {
        let id = unsafe { gl::CreateShader(stage.gl()) };
        check_errors()?;
        Ok(Self {
            handle: RawHandle::new(id),
            stage,
        })
    }

    pub fn get_id(&self) -> GLuint {
        self.handle.get()
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Fails with the backend-reported log verbatim when compilation does
    /// not succeed.
    pub fn compile(&self, source: &str) -> Result<()> {
        let ptr = source.as_ptr().cast();
        let len = source.len() as GLint;
        unsafe { gl::ShaderSource(self.get_id(), 1, &ptr, &len) };
        check_errors()?;

        unsafe { gl::CompileShader(self.get_id()) };
        check_errors()?;

        let mut status: GLint = 0;
        unsafe { gl::GetShaderiv(self.get_id(), gl::COMPILE_STATUS, &mut status) };
        check_errors()?;
        if status == 0 {
            return Err(Error::Compile(self.info_log()?));
        }
        Ok(())
    }

    fn info_log(&self) -> Result<String> {
        let mut needed_len: GLint = 0;
        unsafe { gl::GetShaderiv(self.get_id(), gl::INFO_LOG_LENGTH, &mut needed_len) };
        check_errors()?;

        let mut log = vec![0u8; needed_len.max(0) as usize];
        let mut written: GLsizei = 0;
        unsafe {
            gl::GetShaderInfoLog(
                self.get_id(),
                log.len() as GLsizei,
                &mut written,
                log.as_mut_ptr().cast(),
            )
        };
        check_errors()?;

        log.truncate(written.max(0) as usize);
        Ok(String::from_utf8_lossy(&log).into_owned())
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        let id = self.handle.take();
        if id != 0 {
            unsafe { gl::DeleteShader(id) };
            drain_errors("deleting shader");
        }
    }
}

/// Shared-owns one shader per stage; attaching a second shader of the same
/// stage replaces the reference.
pub struct Program {
    handle: RawHandle,
    shaders: [Option<Rc<Shader>>; ShaderStage::COUNT],
}

impl Program {
    pub fn new() -> Result<Self> {
        let id = unsafe { gl::CreateProgram() };
        check_errors()?;
        Ok(Self {
            handle: RawHandle::new(id),
            shaders: std::array::from_fn(|_| None),
        })
    }

    /// Reads both files as text, compiles each as its stage, attaches and
    /// links. The first failure propagates.
    pub fn from_files(
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let vertex_source = read_source(vertex_path.as_ref())?;
        let fragment_source = read_source(fragment_path.as_ref())?;

        let vertex = Rc::new(Shader::new(ShaderStage::Vertex)?);
        vertex.compile(&vertex_source)?;

        let fragment = Rc::new(Shader::new(ShaderStage::Fragment)?);
        fragment.compile(&fragment_source)?;

        let mut program = Program::new()?;
        program.attach(&vertex)?;
        program.attach(&fragment)?;
        program.link()?;
        Ok(program)
    }

    pub fn get_id(&self) -> GLuint {
        self.handle.get()
    }

    pub fn attach(&mut self, shader: &Rc<Shader>) -> Result<()> {
        unsafe { gl::AttachShader(self.get_id(), shader.get_id()) };
        check_errors()?;

        self.shaders[shader.stage() as usize] = Some(Rc::clone(shader));
        Ok(())
    }

    pub fn attached_shader(&self, stage: ShaderStage) -> Option<&Rc<Shader>> {
        self.shaders[stage as usize].as_ref()
    }

    pub fn link(&self) -> Result<()> {
        unsafe { gl::LinkProgram(self.get_id()) };
        check_errors()?;

        let mut status: GLint = 0;
        unsafe { gl::GetProgramiv(self.get_id(), gl::LINK_STATUS, &mut status) };
        check_errors()?;
        if status == 0 {
            return Err(Error::Link(self.info_log()?));
        }
        Ok(())
    }

    fn info_log(&self) -> Result<String> {
        let mut needed_len: GLint = 0;
        unsafe { gl::GetProgramiv(self.get_id(), gl::INFO_LOG_LENGTH, &mut needed_len) };
        check_errors()?;

        let mut log = vec![0u8; needed_len.max(0) as usize];
        let mut written: GLsizei = 0;
        unsafe {
            gl::GetProgramInfoLog(
                self.get_id(),
                log.len() as GLsizei,
                &mut written,
                log.as_mut_ptr().cast(),
            )
        };
        check_errors()?;

        log.truncate(written.max(0) as usize);
        Ok(String::from_utf8_lossy(&log).into_owned())
    }

    pub fn try_attribute_location(&self, name: &str) -> Result<Option<GLint>> {
        let c_name = identifier(name)?;
        let location = unsafe { gl::GetAttribLocation(self.get_id(), c_name.as_ptr()) };
        check_errors()?;
        Ok((location != -1).then_some(location))
    }

    pub fn attribute_location(&self, name: &str) -> Result<GLint> {
        self.try_attribute_location(name)?
            .ok_or_else(|| Error::AttributeNotFound(name.to_string()))
    }

    pub fn try_uniform_location(&self, name: &str) -> Result<Option<GLint>> {
        let c_name = identifier(name)?;
        let location = unsafe { gl::GetUniformLocation(self.get_id(), c_name.as_ptr()) };
        check_errors()?;
        Ok((location != -1).then_some(location))
    }

    pub fn uniform_location(&self, name: &str) -> Result<GLint> {
        self.try_uniform_location(name)?
            .ok_or_else(|| Error::UniformNotFound(name.to_string()))
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        let id = self.handle.take();
        if id != 0 {
            unsafe { gl::DeleteProgram(id) };
            drain_errors("deleting program");
        }
    }
}

/// Uniform uploads write into the active program's state, so they live
/// here rather than on `Program`. The by-name variants resolve the
/// location on every call and fail if the name is absent.
pub struct ProgramBinding<'a> {
    program: &'a Program,
}

impl<'a> ProgramBinding<'a> {
    pub fn new(program: &'a Program) -> Result<Self> {
        unsafe { gl::UseProgram(program.get_id()) };
        check_errors()?;
        Ok(Self { program })
    }

    pub fn program(&self) -> &'a Program {
        self.program
    }

    pub fn upload_int(&self, location: GLint, value: GLint) -> Result<()> {
        unsafe { gl::Uniform1i(location, value) };
        check_errors()
    }

    pub fn upload_int_by_name(&self, name: &str, value: GLint) -> Result<()> {
        self.upload_int(self.program.uniform_location(name)?, value)
    }

    pub fn upload_float(&self, location: GLint, value: f32) -> Result<()> {
        unsafe { gl::Uniform1f(location, value) };
        check_errors()
    }

    pub fn upload_float_by_name(&self, name: &str, value: f32) -> Result<()> {
        self.upload_float(self.program.uniform_location(name)?, value)
    }

    pub fn upload_vec2(&self, location: GLint, value: &glm::Vec2) -> Result<()> {
        unsafe { gl::Uniform2fv(location, 1, value.as_ptr()) };
        check_errors()
    }

    pub fn upload_vec2_by_name(&self, name: &str, value: &glm::Vec2) -> Result<()> {
        self.upload_vec2(self.program.uniform_location(name)?, value)
    }

    pub fn upload_vec4(&self, location: GLint, value: &glm::Vec4) -> Result<()> {
        unsafe { gl::Uniform4fv(location, 1, value.as_ptr()) };
        check_errors()
    }

    pub fn upload_vec4_by_name(&self, name: &str, value: &glm::Vec4) -> Result<()> {
        self.upload_vec4(self.program.uniform_location(name)?, value)
    }

    pub fn upload_matrix4(&self, location: GLint, value: &glm::Mat4) -> Result<()> {
        unsafe { gl::UniformMatrix4fv(location, 1, gl::FALSE, value.as_ptr()) };
        check_errors()
    }

    pub fn upload_matrix4_by_name(&self, name: &str, value: &glm::Mat4) -> Result<()> {
        self.upload_matrix4(self.program.uniform_location(name)?, value)
    }
}

pub struct ScopedProgramBinding<'a> {
    old_program: GLuint,
    binding: ProgramBinding<'a>,
}

impl<'a> ScopedProgramBinding<'a> {
    pub fn new(program: &'a Program) -> Result<Self> {
        let old_program = handle::current_binding(gl::CURRENT_PROGRAM)?;
        let binding = ProgramBinding::new(program)?;
        Ok(Self {
            old_program,
            binding,
        })
    }
}

impl Drop for ScopedProgramBinding<'_> {
    fn drop(&mut self) {
        unsafe { gl::UseProgram(self.old_program) };
        drain_errors("restoring program binding");
    }
}

impl<'a> Deref for ScopedProgramBinding<'a> {
    type Target = ProgramBinding<'a>;

    fn deref(&self) -> &Self::Target {
        &self.binding
    }
}

fn identifier(name: &str) -> Result<CString> {
    CString::new(name).map_err(|_| Error::InvalidIdentifier(name.to_string()))
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.into(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::ShaderStage;
    use crate::error::Error;

    #[test]
    fn stage_conversions() {
        assert_eq!(
            ShaderStage::from_gl(gl::VERTEX_SHADER).unwrap(),
            ShaderStage::Vertex
        );
        assert_eq!(
            ShaderStage::from_gl(gl::FRAGMENT_SHADER).unwrap(),
            ShaderStage::Fragment
        );
        match ShaderStage::from_gl(gl::GEOMETRY_SHADER) {
            Err(Error::UnknownShaderStage(raw)) => assert_eq!(raw, gl::GEOMETRY_SHADER),
            other => panic!("expected UnknownShaderStage, got {other:?}"),
        }
    }
}
