use crate::error::{check_errors, drain_errors, Error, Result};
use crate::handle::{self, RawHandle};
use bitflags::bitflags;
use gl::types::{GLenum, GLint, GLsizei, GLuint};
use std::ops::{Deref, DerefMut};
use std::path::Path;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LoadFlags: u32 {
        /// Image files store rows top-down, GL expects bottom-up.
        const INVERT_Y = 1;
    }
}

pub struct Texture2D {
    handle: RawHandle,
}

impl Texture2D {
    pub fn new() -> Result<Self> {
        let mut id = 0;
        unsafe { gl::GenTextures(1, &mut id) };
        check_errors()?;
        Ok(Self {
            handle: RawHandle::new(id),
        })
    }

    pub fn get_id(&self) -> GLuint {
        self.handle.get()
    }
}

impl Drop for Texture2D {
    fn drop(&mut self) {
        let id = self.handle.take();
        if id != 0 {
            unsafe { gl::DeleteTextures(1, &id) };
            drain_errors("deleting texture");
        }
    }
}

/// Selects which texture unit subsequent texture and sampler operations
/// apply to.
pub struct ActiveTextureBinding {
    unit: GLuint,
}

impl ActiveTextureBinding {
    pub fn new(unit: GLuint) -> Result<Self> {
        unsafe { gl::ActiveTexture(gl::TEXTURE0 + unit) };
        check_errors()?;
        Ok(Self { unit })
    }

    pub fn unit(&self) -> GLuint {
        self.unit
    }
}

pub struct ScopedActiveTextureBinding {
    old_unit: GLenum,
    binding: ActiveTextureBinding,
}

impl ScopedActiveTextureBinding {
    pub fn new(unit: GLuint) -> Result<Self> {
        // GL_ACTIVE_TEXTURE reads back the enumerant, not the unit index.
        let old_unit = handle::current_binding(gl::ACTIVE_TEXTURE)?;
        let binding = ActiveTextureBinding::new(unit)?;
        Ok(Self { old_unit, binding })
    }
}

impl Drop for ScopedActiveTextureBinding {
    fn drop(&mut self) {
        unsafe { gl::ActiveTexture(self.old_unit) };
        drain_errors("restoring active texture unit");
    }
}

impl Deref for ScopedActiveTextureBinding {
    type Target = ActiveTextureBinding;

    fn deref(&self) -> &Self::Target {
        &self.binding
    }
}

/// Binds to the 2D target of the currently active unit.
pub struct Texture2DBinding<'a> {
    texture: &'a Texture2D,
}

impl<'a> Texture2DBinding<'a> {
    pub fn new(texture: &'a Texture2D) -> Result<Self> {
        unsafe { gl::BindTexture(gl::TEXTURE_2D, texture.get_id()) };
        check_errors()?;
        Ok(Self { texture })
    }

    pub fn texture(&self) -> &'a Texture2D {
        self.texture
    }

    /// Decodes an image file and uploads it as level 0, then generates
    /// mipmaps. Only 8-bit RGB and RGBA images are accepted.
    pub fn load_image(&mut self, path: impl AsRef<Path>, flags: LoadFlags) -> Result<()> {
        let path = path.as_ref();
        let mut image = match stb_image::image::load(path) {
            stb_image::image::LoadResult::ImageU8(image) => image,
            stb_image::image::LoadResult::ImageF32(_) => {
                return Err(Error::ImageDecode {
                    path: path.into(),
                    reason: "HDR images are not supported".into(),
                })
            }
            stb_image::image::LoadResult::Error(reason) => {
                return Err(Error::ImageDecode {
                    path: path.into(),
                    reason,
                })
            }
        };

        let format = match image.depth {
            3 => gl::RGB,
            4 => gl::RGBA,
            channels => {
                return Err(Error::UnsupportedChannelCount {
                    path: path.into(),
                    channels,
                })
            }
        };

        if flags.contains(LoadFlags::INVERT_Y) {
            flip_rows(&mut image.data, image.width * image.depth, image.height);
        }

        unsafe {
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                format as GLint,
                image.width as GLsizei,
                image.height as GLsizei,
                0,
                format,
                gl::UNSIGNED_BYTE,
                image.data.as_ptr().cast(),
            )
        };
        check_errors()?;

        unsafe { gl::GenerateMipmap(gl::TEXTURE_2D) };
        check_errors()
    }

    /// Allocates immutable multi-level storage without content, for render
    /// targets.
    pub fn create_storage(
        &mut self,
        levels: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) -> Result<()> {
        unsafe { gl::TexStorage2D(gl::TEXTURE_2D, levels, internal_format, width, height) };
        check_errors()
    }

    pub fn width(&self) -> Result<GLint> {
        let mut width = 0;
        unsafe { gl::GetTexLevelParameteriv(gl::TEXTURE_2D, 0, gl::TEXTURE_WIDTH, &mut width) };
        check_errors()?;
        Ok(width)
    }

    pub fn height(&self) -> Result<GLint> {
        let mut height = 0;
        unsafe { gl::GetTexLevelParameteriv(gl::TEXTURE_2D, 0, gl::TEXTURE_HEIGHT, &mut height) };
        check_errors()?;
        Ok(height)
    }
}

pub struct ScopedTexture2DBinding<'a> {
    old_texture: GLuint,
    binding: Texture2DBinding<'a>,
}

impl<'a> ScopedTexture2DBinding<'a> {
    pub fn new(texture: &'a Texture2D) -> Result<Self> {
        let old_texture = handle::current_binding(gl::TEXTURE_BINDING_2D)?;
        let binding = Texture2DBinding::new(texture)?;
        Ok(Self {
            old_texture,
            binding,
        })
    }
}

impl Drop for ScopedTexture2DBinding<'_> {
    fn drop(&mut self) {
        unsafe { gl::BindTexture(gl::TEXTURE_2D, self.old_texture) };
        drain_errors("restoring texture binding");
    }
}

impl<'a> Deref for ScopedTexture2DBinding<'a> {
    type Target = Texture2DBinding<'a>;

    fn deref(&self) -> &Self::Target {
        &self.binding
    }
}

impl DerefMut for ScopedTexture2DBinding<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.binding
    }
}

/// Filtering and wrap parameters, bound to a texture unit independently of
/// whichever texture is bound there.
pub struct Sampler {
    handle: RawHandle,
}

impl Sampler {
    pub fn new() -> Result<Self> {
        let mut id = 0;
        unsafe { gl::GenSamplers(1, &mut id) };
        check_errors()?;
        Ok(Self {
            handle: RawHandle::new(id),
        })
    }

    pub fn get_id(&self) -> GLuint {
        self.handle.get()
    }

    pub fn set_parameter(&mut self, pname: GLenum, value: GLint) -> Result<()> {
        unsafe { gl::SamplerParameteri(self.get_id(), pname, value) };
        check_errors()
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        let id = self.handle.take();
        if id != 0 {
            unsafe { gl::DeleteSamplers(1, &id) };
            drain_errors("deleting sampler");
        }
    }
}

pub struct SamplerBinding<'a> {
    sampler: &'a Sampler,
    unit: GLuint,
}

impl<'a> SamplerBinding<'a> {
    pub fn new(sampler: &'a Sampler, unit: GLuint) -> Result<Self> {
        unsafe { gl::BindSampler(unit, sampler.get_id()) };
        check_errors()?;
        Ok(Self { sampler, unit })
    }

    pub fn sampler(&self) -> &'a Sampler {
        self.sampler
    }

    pub fn unit(&self) -> GLuint {
        self.unit
    }
}

/// The unit's previous sampler has to be read through `GL_SAMPLER_BINDING`,
/// which only reports the active unit, so the snapshot switches units,
/// queries, and switches back before binding.
pub struct ScopedSamplerBinding<'a> {
    old_sampler: GLuint,
    binding: SamplerBinding<'a>,
}

impl<'a> ScopedSamplerBinding<'a> {
    pub fn new(sampler: &'a Sampler, unit: GLuint) -> Result<Self> {
        let old_unit = handle::current_binding(gl::ACTIVE_TEXTURE)?;

        unsafe { gl::ActiveTexture(gl::TEXTURE0 + unit) };
        check_errors()?;

        let old_sampler = handle::current_binding(gl::SAMPLER_BINDING)?;

        unsafe { gl::ActiveTexture(old_unit) };
        check_errors()?;

        let binding = SamplerBinding::new(sampler, unit)?;
        Ok(Self {
            old_sampler,
            binding,
        })
    }
}

impl Drop for ScopedSamplerBinding<'_> {
    fn drop(&mut self) {
        unsafe { gl::BindSampler(self.binding.unit(), self.old_sampler) };
        drain_errors("restoring sampler binding");
    }
}

impl<'a> Deref for ScopedSamplerBinding<'a> {
    type Target = SamplerBinding<'a>;

    fn deref(&self) -> &Self::Target {
        &self.binding
    }
}

fn flip_rows(data: &mut [u8], row_len: usize, rows: usize) {
    for y in 0..rows / 2 {
        let top = y * row_len;
        let bottom = (rows - 1 - y) * row_len;
        for x in 0..row_len {
            data.swap(top + x, bottom + x);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::flip_rows;

    #[test]
    fn flip_reverses_row_order() {
        let mut data = vec![
            1, 1, 1, //
            2, 2, 2, //
            3, 3, 3,
        ];
        flip_rows(&mut data, 3, 3);
        assert_eq!(data, vec![3, 3, 3, 2, 2, 2, 1, 1, 1]);
    }

    #[test]
    fn flip_of_even_row_count_swaps_all_rows() {
        let mut data = vec![1, 2, 3, 4];
        flip_rows(&mut data, 2, 2);
        assert_eq!(data, vec![3, 4, 1, 2]);
    }

    #[test]
    fn single_row_is_untouched() {
        let mut data = vec![9, 8, 7];
        flip_rows(&mut data, 3, 1);
        assert_eq!(data, vec![9, 8, 7]);
    }
}
