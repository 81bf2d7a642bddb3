use crate::error::{check_errors, drain_errors, Error, Result};
use crate::handle::{self, RawHandle};
use crate::texture::Texture2D;
use fxhash::FxHashMap;
use gl::types::{GLenum, GLsizei, GLuint};
use std::cell::RefCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

/// Offscreen render-target storage without sampling support.
pub struct RenderBuffer {
    handle: RawHandle,
}

impl RenderBuffer {
    pub fn new() -> Result<Self> {
        let mut id = 0;
        unsafe { gl::GenRenderbuffers(1, &mut id) };
        check_errors()?;
        Ok(Self {
            handle: RawHandle::new(id),
        })
    }

    pub fn get_id(&self) -> GLuint {
        self.handle.get()
    }
}

impl Drop for RenderBuffer {
    fn drop(&mut self) {
        let id = self.handle.take();
        if id != 0 {
            unsafe { gl::DeleteRenderbuffers(1, &id) };
            drain_errors("deleting renderbuffer");
        }
    }
}

pub struct RenderBufferBinding<'a> {
    render_buffer: &'a RenderBuffer,
}

impl<'a> RenderBufferBinding<'a> {
    pub fn new(render_buffer: &'a RenderBuffer) -> Result<Self> {
        unsafe { gl::BindRenderbuffer(gl::RENDERBUFFER, render_buffer.get_id()) };
        check_errors()?;
        Ok(Self { render_buffer })
    }

    pub fn render_buffer(&self) -> &'a RenderBuffer {
        self.render_buffer
    }

    pub fn create_storage(
        &mut self,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) -> Result<()> {
        unsafe { gl::RenderbufferStorage(gl::RENDERBUFFER, internal_format, width, height) };
        check_errors()
    }
}

pub struct ScopedRenderBufferBinding<'a> {
    old_render_buffer: GLuint,
    binding: RenderBufferBinding<'a>,
}

impl<'a> ScopedRenderBufferBinding<'a> {
    pub fn new(render_buffer: &'a RenderBuffer) -> Result<Self> {
        let old_render_buffer = handle::current_binding(gl::RENDERBUFFER_BINDING)?;
        let binding = RenderBufferBinding::new(render_buffer)?;
        Ok(Self {
            old_render_buffer,
            binding,
        })
    }
}

impl Drop for ScopedRenderBufferBinding<'_> {
    fn drop(&mut self) {
        unsafe { gl::BindRenderbuffer(gl::RENDERBUFFER, self.old_render_buffer) };
        drain_errors("restoring renderbuffer binding");
    }
}

impl<'a> Deref for ScopedRenderBufferBinding<'a> {
    type Target = RenderBufferBinding<'a>;

    fn deref(&self) -> &Self::Target {
        &self.binding
    }
}

impl DerefMut for ScopedRenderBufferBinding<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.binding
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentPoint {
    Color(u32),
    Depth,
    Stencil,
    DepthStencil,
}

impl AttachmentPoint {
    pub fn gl(self) -> GLenum {
        match self {
            Self::Color(index) => gl::COLOR_ATTACHMENT0 + index,
            Self::Depth => gl::DEPTH_ATTACHMENT,
            Self::Stencil => gl::STENCIL_ATTACHMENT,
            Self::DepthStencil => gl::DEPTH_STENCIL_ATTACHMENT,
        }
    }
}

/// What occupies one attachment point. Texture and renderbuffer are
/// mutually exclusive per point.
#[derive(Clone)]
pub enum Attachment {
    Texture(Rc<Texture2D>),
    RenderBuffer(Rc<RenderBuffer>),
}

/// Draw and read targets have independent "currently bound" state; `Both`
/// affects the two at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameBufferTarget {
    Both,
    Draw,
    Read,
}

impl FrameBufferTarget {
    pub fn gl(self) -> GLenum {
        match self {
            Self::Both => gl::FRAMEBUFFER,
            Self::Draw => gl::DRAW_FRAMEBUFFER,
            Self::Read => gl::READ_FRAMEBUFFER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameBufferStatus {
    Complete,
    Undefined,
    IncompleteAttachment,
    MissingAttachment,
    IncompleteDrawBuffer,
    IncompleteReadBuffer,
    Unsupported,
    IncompleteMultisample,
    IncompleteLayerTargets,
    Unknown(GLenum),
}

impl FrameBufferStatus {
    pub fn from_raw(raw: GLenum) -> Self {
        match raw {
            gl::FRAMEBUFFER_COMPLETE => Self::Complete,
            gl::FRAMEBUFFER_UNDEFINED => Self::Undefined,
            gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => Self::IncompleteAttachment,
            gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => Self::MissingAttachment,
            gl::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => Self::IncompleteDrawBuffer,
            gl::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => Self::IncompleteReadBuffer,
            gl::FRAMEBUFFER_UNSUPPORTED => Self::Unsupported,
            gl::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => Self::IncompleteMultisample,
            gl::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS => Self::IncompleteLayerTargets,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for FrameBufferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete => f.write_str("GL_FRAMEBUFFER_COMPLETE"),
            Self::Undefined => f.write_str("GL_FRAMEBUFFER_UNDEFINED"),
            Self::IncompleteAttachment => f.write_str("GL_FRAMEBUFFER_INCOMPLETE_ATTACHMENT"),
            Self::MissingAttachment => {
                f.write_str("GL_FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT")
            }
            Self::IncompleteDrawBuffer => f.write_str("GL_FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER"),
            Self::IncompleteReadBuffer => f.write_str("GL_FRAMEBUFFER_INCOMPLETE_READ_BUFFER"),
            Self::Unsupported => f.write_str("GL_FRAMEBUFFER_UNSUPPORTED"),
            Self::IncompleteMultisample => f.write_str("GL_FRAMEBUFFER_INCOMPLETE_MULTISAMPLE"),
            Self::IncompleteLayerTargets => {
                f.write_str("GL_FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS")
            }
            Self::Unknown(raw) => write!(f, "unknown framebuffer status 0x{raw:x}"),
        }
    }
}

/// Shared-owns whatever is attached at each point so render targets are
/// not destroyed while the framebuffer still references them.
pub struct FrameBuffer {
    handle: RawHandle,
    attachments: RefCell<FxHashMap<AttachmentPoint, Attachment>>,
}

impl FrameBuffer {
    pub fn new() -> Result<Self> {
        let mut id = 0;
        unsafe { gl::GenFramebuffers(1, &mut id) };
        check_errors()?;
        Ok(Self {
            handle: RawHandle::new(id),
            attachments: RefCell::new(FxHashMap::default()),
        })
    }

    /// The window-system-provided target. Identifier zero is not ours to
    /// delete.
    pub fn default_framebuffer() -> Self {
        Self {
            handle: RawHandle::new(0),
            attachments: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn get_id(&self) -> GLuint {
        self.handle.get()
    }

    pub fn attachment(&self, point: AttachmentPoint) -> Option<Attachment> {
        self.attachments.borrow().get(&point).cloned()
    }
}

impl Drop for FrameBuffer {
    fn drop(&mut self) {
        let id = self.handle.take();
        if id != 0 {
            unsafe { gl::DeleteFramebuffers(1, &id) };
            drain_errors("deleting framebuffer");
        }
    }
}

pub struct FrameBufferBinding<'a> {
    frame_buffer: &'a FrameBuffer,
    target: FrameBufferTarget,
}

impl<'a> FrameBufferBinding<'a> {
    pub fn new(frame_buffer: &'a FrameBuffer, target: FrameBufferTarget) -> Result<Self> {
        unsafe { gl::BindFramebuffer(target.gl(), frame_buffer.get_id()) };
        check_errors()?;
        Ok(Self {
            frame_buffer,
            target,
        })
    }

    pub fn frame_buffer(&self) -> &'a FrameBuffer {
        self.frame_buffer
    }

    pub fn target(&self) -> FrameBufferTarget {
        self.target
    }

    /// Attaches level 0 of `texture`, replacing and releasing whatever was
    /// attached at `point` before.
    pub fn attach_texture(
        &mut self,
        point: AttachmentPoint,
        texture: &Rc<Texture2D>,
    ) -> Result<()> {
        unsafe {
            gl::FramebufferTexture2D(
                self.target.gl(),
                point.gl(),
                gl::TEXTURE_2D,
                texture.get_id(),
                0,
            )
        };
        check_errors()?;

        self.frame_buffer
            .attachments
            .borrow_mut()
            .insert(point, Attachment::Texture(Rc::clone(texture)));
        Ok(())
    }

    pub fn attach_render_buffer(
        &mut self,
        point: AttachmentPoint,
        render_buffer: &Rc<RenderBuffer>,
    ) -> Result<()> {
        unsafe {
            gl::FramebufferRenderbuffer(
                self.target.gl(),
                point.gl(),
                gl::RENDERBUFFER,
                render_buffer.get_id(),
            )
        };
        check_errors()?;

        self.frame_buffer
            .attachments
            .borrow_mut()
            .insert(point, Attachment::RenderBuffer(Rc::clone(render_buffer)));
        Ok(())
    }

    /// Removes the attachment at `point` and drops the shared reference.
    pub fn detach(&mut self, point: AttachmentPoint) -> Result<()> {
        unsafe { gl::FramebufferRenderbuffer(self.target.gl(), point.gl(), gl::RENDERBUFFER, 0) };
        check_errors()?;

        self.frame_buffer.attachments.borrow_mut().remove(&point);
        Ok(())
    }

    pub fn status(&self) -> Result<FrameBufferStatus> {
        let status = unsafe { gl::CheckFramebufferStatus(self.target.gl()) };
        check_errors()?;
        Ok(FrameBufferStatus::from_raw(status))
    }

    /// Fails naming the specific incompleteness reason.
    pub fn validate_status(&self) -> Result<()> {
        match self.status()? {
            FrameBufferStatus::Complete => Ok(()),
            status => Err(Error::Incomplete(status)),
        }
    }
}

/// Snapshots only the sub-targets its binding touches: draw for `Draw`,
/// read for `Read`, both for `Both`.
pub struct ScopedFrameBufferBinding<'a> {
    old_draw: Option<GLuint>,
    old_read: Option<GLuint>,
    binding: FrameBufferBinding<'a>,
}

impl<'a> ScopedFrameBufferBinding<'a> {
    pub fn new(frame_buffer: &'a FrameBuffer, target: FrameBufferTarget) -> Result<Self> {
        let old_draw = match target {
            FrameBufferTarget::Both | FrameBufferTarget::Draw => {
                Some(handle::current_binding(gl::DRAW_FRAMEBUFFER_BINDING)?)
            }
            FrameBufferTarget::Read => None,
        };
        let old_read = match target {
            FrameBufferTarget::Both | FrameBufferTarget::Read => {
                Some(handle::current_binding(gl::READ_FRAMEBUFFER_BINDING)?)
            }
            FrameBufferTarget::Draw => None,
        };

        let binding = FrameBufferBinding::new(frame_buffer, target)?;
        Ok(Self {
            old_draw,
            old_read,
            binding,
        })
    }
}

impl Drop for ScopedFrameBufferBinding<'_> {
    fn drop(&mut self) {
        if let Some(old_draw) = self.old_draw {
            unsafe { gl::BindFramebuffer(gl::DRAW_FRAMEBUFFER, old_draw) };
            drain_errors("restoring draw framebuffer binding");
        }
        if let Some(old_read) = self.old_read {
            unsafe { gl::BindFramebuffer(gl::READ_FRAMEBUFFER, old_read) };
            drain_errors("restoring read framebuffer binding");
        }
    }
}

impl<'a> Deref for ScopedFrameBufferBinding<'a> {
    type Target = FrameBufferBinding<'a>;

    fn deref(&self) -> &Self::Target {
        &self.binding
    }
}

impl DerefMut for ScopedFrameBufferBinding<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.binding
    }
}

#[cfg(test)]
mod tests {
    use super::{AttachmentPoint, FrameBufferStatus};

    #[test]
    fn attachment_points_map_to_enumerants() {
        assert_eq!(AttachmentPoint::Color(0).gl(), gl::COLOR_ATTACHMENT0);
        assert_eq!(AttachmentPoint::Color(3).gl(), gl::COLOR_ATTACHMENT3);
        assert_eq!(AttachmentPoint::Depth.gl(), gl::DEPTH_ATTACHMENT);
        assert_eq!(AttachmentPoint::Stencil.gl(), gl::STENCIL_ATTACHMENT);
        assert_eq!(
            AttachmentPoint::DepthStencil.gl(),
            gl::DEPTH_STENCIL_ATTACHMENT
        );
    }

    #[test]
    fn statuses_name_their_reason() {
        assert_eq!(
            FrameBufferStatus::from_raw(gl::FRAMEBUFFER_COMPLETE),
            FrameBufferStatus::Complete
        );
        assert_eq!(
            FrameBufferStatus::from_raw(gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT)
                .to_string(),
            "GL_FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT"
        );
        assert_eq!(
            FrameBufferStatus::from_raw(gl::FRAMEBUFFER_UNSUPPORTED).to_string(),
            "GL_FRAMEBUFFER_UNSUPPORTED"
        );
    }
}
