use crate::billboard::Billboard;
use crate::debug_draw::DebugDraw;
use crate::error::{check_errors, Result};
use crate::framebuffer::FrameBuffer;
use crate::geometry::ray_parallelogram_intersect;
use crate::mesh::StaticMesh;
use crate::minefield::{Minefield, MoundState};
use crate::shader::{Program, ScopedProgramBinding};
use crate::texture::{LoadFlags, ScopedTexture2DBinding, Texture2D};
use glfw::{Action, Key, MouseButton, WindowEvent};
use nalgebra_glm as glm;
use std::path::Path;
use std::rc::Rc;

const FIELD_WIDTH: usize = 8;
const FIELD_HEIGHT: usize = 8;
const MINE_COUNT: usize = 10;
const MOUND_SPACING: f32 = 1.0;
const MOUND_SIZE: f32 = 0.9;

const FOV_DEGREES: f32 = 70.0;
const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 1000.0;

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub top_left: glm::IVec2,
    pub size: glm::IVec2,
}

impl Viewport {
    pub fn new(top_left: glm::IVec2, size: glm::IVec2) -> Self {
        Self { top_left, size }
    }
}

/// Where a scene draws to. The framebuffer reference keeps render
/// targets alive for as long as anything still draws into them.
pub struct RenderContext {
    pub framebuffer: Rc<FrameBuffer>,
    pub viewport: Viewport,
}

impl RenderContext {
    pub fn aspect_ratio(&self) -> f32 {
        self.viewport.size.x as f32 / self.viewport.size.y as f32
    }
}

struct LookAtCamera {
    eye: glm::Vec3,
    target: glm::Vec3,
    up: glm::Vec3,
}

impl LookAtCamera {
    fn view_matrix(&self) -> glm::Mat4 {
        glm::look_at(&self.eye, &self.target, &self.up)
    }

    /// Rotates the eye around the target, yaw about the up axis and
    /// pitch clamped away from the poles.
    fn orbit(&mut self, yaw: f32, pitch: f32) {
        let offset = self.eye - self.target;
        let radius = glm::length(&offset);

        let mut current_pitch = (offset.y / radius).asin();
        let mut current_yaw = offset.z.atan2(offset.x);

        current_yaw += yaw;
        current_pitch = (current_pitch + pitch).clamp(-1.4, 1.4);

        self.eye = self.target
            + glm::vec3(
                radius * current_pitch.cos() * current_yaw.cos(),
                radius * current_pitch.sin(),
                radius * current_pitch.cos() * current_yaw.sin(),
            );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameStatus {
    Playing,
    Dead,
    Cleared,
}

pub struct WorldScene {
    floor_mesh: StaticMesh,
    model_program: Program,
    debug_program: Program,
    debug_draw: DebugDraw,
    show_debug: bool,

    mound_texture: Rc<Texture2D>,
    flag_texture: Rc<Texture2D>,
    mine_texture: Rc<Texture2D>,

    player: Billboard,
    mounds: Vec<Billboard>,
    minefield: Minefield,
    status: GameStatus,

    camera: LookAtCamera,
    cursor: glm::Vec2,
    orbiting: bool,
}

impl WorldScene {
    pub fn new() -> Result<Self> {
        let floor_mesh = StaticMesh::load("assets/floor.obj")?;
        let model_program =
            Program::from_files("assets/shaders/world.vert", "assets/shaders/world.frag")?;
        let debug_program =
            Program::from_files("assets/shaders/debug.vert", "assets/shaders/debug.frag")?;

        let player_texture = load_texture("assets/player.png")?;
        let mound_texture = load_texture("assets/mound.png")?;
        let flag_texture = load_texture("assets/flag.png")?;
        let mine_texture = load_texture("assets/mine.png")?;

        let mut player = Billboard::new()?;
        player.set_texture(&player_texture);
        player.set_center_position(glm::vec3(
            0.0,
            1.0,
            FIELD_HEIGHT as f32 / 2.0 * MOUND_SPACING + 1.0,
        ));
        player.set_dimensions(glm::vec2(2.0, 2.0));

        let minefield = Minefield::new(FIELD_WIDTH, FIELD_HEIGHT, MINE_COUNT, &mut rand::thread_rng());
        let mut mounds = Vec::with_capacity(FIELD_WIDTH * FIELD_HEIGHT);
        for y in 0..FIELD_HEIGHT {
            for x in 0..FIELD_WIDTH {
                let mut mound = Billboard::new()?;
                mound.set_texture(&mound_texture);
                mound.set_center_position(mound_center(x, y));
                mound.set_dimensions(glm::vec2(MOUND_SIZE, MOUND_SIZE));
                mounds.push(mound);
            }
        }

        Ok(Self {
            floor_mesh,
            model_program,
            debug_program,
            debug_draw: DebugDraw::new(),
            show_debug: false,
            mound_texture,
            flag_texture,
            mine_texture,
            player,
            mounds,
            minefield,
            status: GameStatus::Playing,
            camera: LookAtCamera {
                eye: glm::vec3(3.0, 6.0, 8.0),
                target: glm::Vec3::zeros(),
                up: glm::vec3(0.0, 1.0, 0.0),
            },
            cursor: glm::Vec2::zeros(),
            orbiting: false,
        })
    }

    pub fn handle_event(&mut self, event: &WindowEvent, context: &RenderContext) -> Result<()> {
        match *event {
            WindowEvent::CursorPos(x, y) => {
                let position = glm::vec2(x as f32, y as f32);
                if self.orbiting {
                    let delta = position - self.cursor;
                    self.camera.orbit(delta.x * 0.01, delta.y * 0.01);
                }
                self.cursor = position;
            }
            // Button1/2/3 are left, right, and middle.
            WindowEvent::MouseButton(MouseButton::Button3, action, _) => {
                self.orbiting = action == Action::Press;
            }
            WindowEvent::MouseButton(MouseButton::Button1, Action::Press, _) => {
                self.pick(context, |field, x, y| {
                    field.uncover(x, y);
                })?;
            }
            WindowEvent::MouseButton(MouseButton::Button2, Action::Press, _) => {
                self.pick(context, |field, x, y| field.toggle_flag(x, y))?;
            }
            WindowEvent::Key(Key::R, _, Action::Press, _) => {
                self.minefield.reset(&mut rand::thread_rng());
                self.status = GameStatus::Playing;
                log::info!("field reset");
            }
            WindowEvent::Key(Key::F1, _, Action::Press, _) => {
                self.show_debug = !self.show_debug;
            }
            _ => {}
        }
        Ok(())
    }

    /// Casts a ray through the cursor and applies `action` to the nearest
    /// untouched or flagged mound it hits.
    fn pick(
        &mut self,
        context: &RenderContext,
        action: impl FnOnce(&mut Minefield, usize, usize),
    ) -> Result<()> {
        if self.status != GameStatus::Playing {
            return Ok(());
        }

        let (origin, direction) = self.cursor_ray(context);
        if self.show_debug {
            self.debug_draw.clear_lines();
            self.debug_draw.add_line(
                origin + direction * NEAR_PLANE,
                origin + direction * 100.0,
                glm::vec4(1.0, 0.0, 0.0, 1.0),
            );
        }

        let mut nearest: Option<(f32, usize, usize)> = None;
        for y in 0..self.minefield.height() {
            for x in 0..self.minefield.width() {
                if self.minefield.state(x, y) == MoundState::Uncovered {
                    continue;
                }
                let billboard = &mut self.mounds[y * self.minefield.width() + x];
                billboard.set_camera_position(self.camera.eye);
                billboard.set_camera_view_direction(self.camera.target - self.camera.eye);
                billboard.set_camera_up(self.camera.up);

                let (corner, across, up) = billboard.plane();
                if let Some(t) = ray_parallelogram_intersect(origin, direction, corner, across, up)
                {
                    if t >= 0.0 && nearest.map_or(true, |(best, _, _)| t < best) {
                        nearest = Some((t, x, y));
                    }
                }
            }
        }

        if let Some((_, x, y)) = nearest {
            action(&mut self.minefield, x, y);
            self.refresh_status(x, y);
        }
        Ok(())
    }

    fn refresh_status(&mut self, x: usize, y: usize) {
        if self.minefield.state(x, y) == MoundState::Uncovered && self.minefield.is_mined(x, y) {
            self.status = GameStatus::Dead;
            log::info!("mine hit at ({x}, {y})");
        } else if self.minefield.is_cleared() {
            self.status = GameStatus::Cleared;
            log::info!("field cleared");
        }
    }

    /// World-space ray under the cursor. Window rows run top-down while
    /// device rows run bottom-up, so the y coordinate flips.
    fn cursor_ray(&self, context: &RenderContext) -> (glm::Vec3, glm::Vec3) {
        let viewport = glm::vec4(
            context.viewport.top_left.x as f32,
            context.viewport.top_left.y as f32,
            context.viewport.size.x as f32,
            context.viewport.size.y as f32,
        );
        let window = glm::vec2(
            self.cursor.x,
            context.viewport.size.y as f32 - self.cursor.y,
        );

        let view = self.camera.view_matrix();
        let projection = self.projection_matrix(context.aspect_ratio());

        let near = glm::unproject(
            &glm::vec3(window.x, window.y, 0.0),
            &view,
            &projection,
            viewport,
        );
        let far = glm::unproject(
            &glm::vec3(window.x, window.y, 1.0),
            &view,
            &projection,
            viewport,
        );
        (self.camera.eye, glm::normalize(&(far - near)))
    }

    fn projection_matrix(&self, aspect: f32) -> glm::Mat4 {
        glm::perspective(aspect, FOV_DEGREES.to_radians(), NEAR_PLANE, FAR_PLANE)
    }

    pub fn update(&mut self, _delta_time_ms: u32) {}

    pub fn render(&mut self, context: &RenderContext, _partial_update_percentage: f32) -> Result<()> {
        let projection = self.projection_matrix(context.aspect_ratio());
        let view = self.camera.view_matrix();

        {
            let bound_program = ScopedProgramBinding::new(&self.model_program)?;
            bound_program.upload_matrix4_by_name("projection", &projection)?;
            bound_program.upload_matrix4_by_name("modelview", &view)?;
        }

        unsafe { gl::Enable(gl::DEPTH_TEST) };
        check_errors()?;

        self.floor_mesh.render(&self.model_program)?;

        let camera_view = self.camera.target - self.camera.eye;
        self.player.set_camera_position(self.camera.eye);
        self.player.set_camera_view_direction(camera_view);
        self.player.set_camera_up(self.camera.up);
        self.player.render(&self.model_program)?;

        for y in 0..self.minefield.height() {
            for x in 0..self.minefield.width() {
                let texture = match self.minefield.state(x, y) {
                    MoundState::Untouched => &self.mound_texture,
                    MoundState::Flagged => &self.flag_texture,
                    MoundState::Uncovered if self.minefield.is_mined(x, y) => &self.mine_texture,
                    MoundState::Uncovered => continue,
                };

                let billboard = &mut self.mounds[y * self.minefield.width() + x];
                billboard.set_texture(texture);
                billboard.set_camera_position(self.camera.eye);
                billboard.set_camera_view_direction(camera_view);
                billboard.set_camera_up(self.camera.up);
                billboard.render(&self.model_program)?;
            }
        }

        if self.show_debug && self.debug_draw.line_count() > 0 {
            let bound_program = ScopedProgramBinding::new(&self.debug_program)?;
            bound_program.upload_matrix4_by_name("projection", &projection)?;
            bound_program.upload_matrix4_by_name("modelview", &view)?;
            drop(bound_program);
            self.debug_draw.render(&self.debug_program)?;
        }

        Ok(())
    }
}

fn mound_center(x: usize, y: usize) -> glm::Vec3 {
    glm::vec3(
        (x as f32 - (FIELD_WIDTH - 1) as f32 / 2.0) * MOUND_SPACING,
        MOUND_SIZE / 2.0,
        (y as f32 - (FIELD_HEIGHT - 1) as f32 / 2.0) * MOUND_SPACING,
    )
}

fn load_texture(path: impl AsRef<Path>) -> Result<Rc<Texture2D>> {
    let texture = Rc::new(Texture2D::new()?);
    {
        let mut bound = ScopedTexture2DBinding::new(&texture)?;
        bound.load_image(path, LoadFlags::INVERT_Y)?;
    }
    Ok(texture)
}
