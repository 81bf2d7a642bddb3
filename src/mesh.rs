use crate::buffer::{Buffer, BufferTarget, BufferUsage, ScopedBufferBinding};
use crate::draw::{draw_elements, IndexType, PrimitiveMode};
use crate::error::{Error, Result};
use crate::shader::{Program, ScopedProgramBinding};
use crate::texture::{LoadFlags, ScopedActiveTextureBinding, ScopedTexture2DBinding, Texture2D};
use crate::vertex_array::{AttributeLayout, ScopedVertexArrayBinding, VertexArray};
use gl::types::{GLsizei, GLuint};
use std::path::Path;
use std::rc::Rc;

/// Indexed triangle geometry with an optional diffuse texture, uploaded
/// once and drawn against whichever attributes a program exposes.
pub struct StaticMesh {
    positions: Option<Rc<Buffer>>,
    normals: Option<Rc<Buffer>>,
    texcoords: Option<Rc<Buffer>>,
    indices: Rc<Buffer>,
    index_count: usize,
    diffuse_texture: Option<Rc<Texture2D>>,
}

impl StaticMesh {
    /// Loads the first shape of a Wavefront OBJ file, plus its material's
    /// diffuse texture if one is named (resolved next to the OBJ file).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (models, materials) = tobj::load_obj(path, true).map_err(|source| Error::Model {
            path: path.into(),
            source,
        })?;
        let model = models.first().ok_or_else(|| Error::EmptyModel(path.into()))?;

        let diffuse_texture = model
            .mesh
            .material_id
            .and_then(|id| materials.get(id))
            .map(|material| material.diffuse_texture.as_str())
            .filter(|name| !name.is_empty())
            .map(|name| path.parent().unwrap_or_else(|| Path::new("")).join(name));

        Self::from_shape(&model.mesh, diffuse_texture.as_deref())
    }

    pub fn from_shape(mesh: &tobj::Mesh, diffuse_texture: Option<&Path>) -> Result<Self> {
        if mesh.indices.len() % 3 != 0 {
            return Err(Error::MalformedMesh);
        }

        let indices = upload_static(&mesh.indices, BufferTarget::ElementArray)?;
        let positions = upload_optional(&mesh.positions)?;
        let normals = upload_optional(&mesh.normals)?;
        let texcoords = upload_optional(&mesh.texcoords)?;

        let diffuse_texture = match diffuse_texture {
            Some(path) => {
                let texture = Rc::new(Texture2D::new()?);
                let mut bound = ScopedTexture2DBinding::new(&texture)?;
                bound.load_image(path, LoadFlags::INVERT_Y)?;
                drop(bound);
                Some(texture)
            }
            None => None,
        };

        Ok(Self {
            positions,
            normals,
            texcoords,
            indices,
            index_count: mesh.indices.len(),
            diffuse_texture,
        })
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }

    pub fn render(&self, program: &Program) -> Result<()> {
        let mut vertex_array = VertexArray::new()?;
        let mut bound_vao = ScopedVertexArrayBinding::new(&mut vertex_array)?;

        bound_vao.set_index_buffer(&self.indices, IndexType::UnsignedInt)?;

        if let Some(positions) = &self.positions {
            if let Some(location) = program.try_attribute_location("position")? {
                bound_vao.set_attribute(
                    location as GLuint,
                    positions,
                    AttributeLayout::packed_floats(3),
                )?;
            }
        }
        if let Some(normals) = &self.normals {
            if let Some(location) = program.try_attribute_location("normal")? {
                bound_vao.set_attribute(
                    location as GLuint,
                    normals,
                    AttributeLayout::packed_floats(3),
                )?;
            }
        }
        if let Some(texcoords) = &self.texcoords {
            if let Some(location) = program.try_attribute_location("texcoord0")? {
                bound_vao.set_attribute(
                    location as GLuint,
                    texcoords,
                    AttributeLayout::packed_floats(2),
                )?;
            }
        }

        let bound_program = ScopedProgramBinding::new(program)?;
        let _texture_guards = match &self.diffuse_texture {
            Some(texture) => {
                let unit = ScopedActiveTextureBinding::new(0)?;
                let bound_texture = ScopedTexture2DBinding::new(texture)?;
                bound_program.upload_int_by_name("diffuseTexture", 0)?;
                Some((unit, bound_texture))
            }
            None => None,
        };

        draw_elements(
            PrimitiveMode::Triangles,
            IndexType::UnsignedInt,
            0,
            self.index_count as GLsizei,
        )
    }
}

fn upload_static<T>(data: &[T], target: BufferTarget) -> Result<Rc<Buffer>> {
    let buffer = Rc::new(Buffer::new()?);
    let mut bound = ScopedBufferBinding::new(&buffer, target)?;
    bound.upload(data, BufferUsage::StaticDraw)?;
    drop(bound);
    Ok(buffer)
}

fn upload_optional(data: &[f32]) -> Result<Option<Rc<Buffer>>> {
    if data.is_empty() {
        return Ok(None);
    }
    Ok(Some(upload_static(data, BufferTarget::Array)?))
}
