use crate::buffer::{Buffer, BufferTarget, BufferUsage, ScopedBufferBinding};
use crate::draw::{draw_arrays, PrimitiveMode};
use crate::error::Result;
use crate::shader::{Program, ScopedProgramBinding};
use crate::texture::{ScopedActiveTextureBinding, ScopedTexture2DBinding, Texture2D};
use crate::vertex_array::{AttributeLayout, ScopedVertexArrayBinding, VertexArray};
use gl::types::GLuint;
use nalgebra_glm as glm;
use std::mem::size_of;
use std::rc::Rc;

/// A textured quad that turns to face the camera. Vertex data is rebuilt
/// lazily whenever the center, dimensions, or camera basis change.
pub struct Billboard {
    texture: Option<Rc<Texture2D>>,
    positions: Rc<Buffer>,
    texcoords: Rc<Buffer>,
    dirty: bool,

    center: glm::Vec3,
    dimensions: glm::Vec2,

    camera_position: glm::Vec3,
    camera_view: glm::Vec3,
    camera_up: glm::Vec3,
}

impl Billboard {
    pub fn new() -> Result<Self> {
        let positions = Rc::new(Buffer::new()?);
        {
            let mut bound = ScopedBufferBinding::new(&positions, BufferTarget::Array)?;
            bound.allocate(4 * 3 * size_of::<f32>(), BufferUsage::StreamDraw)?;
        }

        let texcoords = Rc::new(Buffer::new()?);
        {
            let mut bound = ScopedBufferBinding::new(&texcoords, BufferTarget::Array)?;
            bound.allocate(4 * 2 * size_of::<f32>(), BufferUsage::StaticDraw)?;
        }

        Ok(Self {
            texture: None,
            positions,
            texcoords,
            dirty: true,
            center: glm::Vec3::zeros(),
            dimensions: glm::vec2(1.0, 1.0),
            camera_position: glm::Vec3::zeros(),
            camera_view: glm::vec3(0.0, 0.0, -1.0),
            camera_up: glm::vec3(0.0, 1.0, 0.0),
        })
    }

    pub fn set_texture(&mut self, texture: &Rc<Texture2D>) {
        self.texture = Some(Rc::clone(texture));
    }

    pub fn set_center_position(&mut self, center: glm::Vec3) {
        self.center = center;
        self.dirty = true;
    }

    pub fn center_position(&self) -> glm::Vec3 {
        self.center
    }

    pub fn set_dimensions(&mut self, dimensions: glm::Vec2) {
        self.dimensions = dimensions;
        self.dirty = true;
    }

    pub fn dimensions(&self) -> glm::Vec2 {
        self.dimensions
    }

    pub fn set_camera_position(&mut self, position: glm::Vec3) {
        self.camera_position = position;
        self.dirty = true;
    }

    pub fn camera_position(&self) -> glm::Vec3 {
        self.camera_position
    }

    pub fn set_camera_view_direction(&mut self, view: glm::Vec3) {
        self.camera_view = view;
        self.dirty = true;
    }

    pub fn set_camera_up(&mut self, up: glm::Vec3) {
        self.camera_up = up;
        self.dirty = true;
    }

    /// The quad's parallelogram in world space: bottom-left corner plus the
    /// across and up edge vectors. Also what picking rays test against.
    pub fn plane(&self) -> (glm::Vec3, glm::Vec3, glm::Vec3) {
        quad_plane(
            self.center,
            self.dimensions,
            self.camera_view,
            self.camera_up,
        )
    }

    pub fn rebuild_buffers(&mut self) -> Result<()> {
        let (bottom_left, across, up) = self.plane();

        let corners = [
            bottom_left,
            bottom_left + across,
            bottom_left + across + up,
            bottom_left + up,
        ];
        let mut positions = [0.0f32; 12];
        for (corner, chunk) in corners.iter().zip(positions.chunks_exact_mut(3)) {
            chunk.copy_from_slice(corner.as_slice());
        }

        {
            let mut bound = ScopedBufferBinding::new(&self.positions, BufferTarget::Array)?;
            bound.patch(0, &positions)?;
        }

        let texcoords: [f32; 8] = [
            0.0, 0.0, //
            1.0, 0.0, //
            1.0, 1.0, //
            0.0, 1.0,
        ];
        {
            let mut bound = ScopedBufferBinding::new(&self.texcoords, BufferTarget::Array)?;
            bound.patch(0, &texcoords)?;
        }

        self.dirty = false;
        Ok(())
    }

    pub fn render(&mut self, program: &Program) -> Result<()> {
        if self.dirty {
            self.rebuild_buffers()?;
        }

        let mut vertex_array = VertexArray::new()?;
        let mut bound_vao = ScopedVertexArrayBinding::new(&mut vertex_array)?;

        if let Some(location) = program.try_attribute_location("position")? {
            bound_vao.set_attribute(
                location as GLuint,
                &self.positions,
                AttributeLayout::packed_floats(3),
            )?;
        }
        if let Some(location) = program.try_attribute_location("texcoord0")? {
            bound_vao.set_attribute(
                location as GLuint,
                &self.texcoords,
                AttributeLayout::packed_floats(2),
            )?;
        }

        let bound_program = ScopedProgramBinding::new(program)?;
        let _texture_guards = match &self.texture {
            Some(texture) => {
                let unit = ScopedActiveTextureBinding::new(0)?;
                let bound_texture = ScopedTexture2DBinding::new(texture)?;
                bound_program.upload_int_by_name("diffuseTexture", 0)?;
                Some((unit, bound_texture))
            }
            None => None,
        };

        draw_arrays(PrimitiveMode::TriangleFan, 0, 4)
    }
}

/// Billboard basis from the camera's view and up vectors. Kept as a free
/// function so it can be exercised without a GL context.
fn quad_plane(
    center: glm::Vec3,
    dimensions: glm::Vec2,
    camera_view: glm::Vec3,
    camera_up: glm::Vec3,
) -> (glm::Vec3, glm::Vec3, glm::Vec3) {
    let unit_view = glm::normalize(&camera_view);
    let unit_side = glm::cross(&unit_view, &glm::normalize(&camera_up));
    let unit_up = glm::cross(&unit_side, &unit_view);

    let bottom_left = center - unit_side / 2.0 * dimensions.x - unit_up / 2.0 * dimensions.y;
    (
        bottom_left,
        unit_side * dimensions.x,
        unit_up * dimensions.y,
    )
}

#[cfg(test)]
mod tests {
    use super::quad_plane;
    use nalgebra_glm as glm;

    #[test]
    fn quad_faces_the_camera() {
        let (bottom_left, across, up) = quad_plane(
            glm::vec3(0.0, 1.0, 0.0),
            glm::vec2(2.0, 2.0),
            glm::vec3(0.0, 0.0, -1.0),
            glm::vec3(0.0, 1.0, 0.0),
        );

        // Looking down -Z, "across" is the camera's right (+X) and "up"
        // stays +Y.
        assert!(glm::distance(&across, &glm::vec3(2.0, 0.0, 0.0)) < 1e-6);
        assert!(glm::distance(&up, &glm::vec3(0.0, 2.0, 0.0)) < 1e-6);
        let center = bottom_left + across / 2.0 + up / 2.0;
        assert!(glm::distance(&center, &glm::vec3(0.0, 1.0, 0.0)) < 1e-6);
    }

    #[test]
    fn plane_normal_opposes_view_direction() {
        let view = glm::vec3(1.0, -0.5, 0.25);
        let (_, across, up) = quad_plane(
            glm::vec3(3.0, 2.0, 1.0),
            glm::vec2(1.5, 1.0),
            view,
            glm::vec3(0.0, 1.0, 0.0),
        );
        let normal = glm::cross(&across, &up);
        assert!(glm::dot(&normal, &view) < 0.0);
    }
}
