use crate::error::{Error, Result};
use glfw::{
    fail_on_errors, Context as _, Glfw, GlfwReceiver, OpenGlProfileHint, PWindow, SwapInterval,
    WindowEvent, WindowHint, WindowMode,
};

const CONTEXT_VERSION: WindowHint = WindowHint::ContextVersion(3, 3);
const OPENGL_PROFILE: WindowHint = WindowHint::OpenGlProfile(OpenGlProfileHint::Core);
const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const TITLE: &str = "Beneath the Surface";

/// Owns the window and its GL context. Function pointers are loaded as
/// soon as the context is current, so wrapper types are usable from the
/// moment this exists.
pub struct Application {
    pub glfw: Glfw,
    pub receiver: GlfwReceiver<(f64, WindowEvent)>,
    pub window: PWindow,
}

impl Application {
    pub fn new() -> Result<Self> {
        let mut glfw = glfw::init(fail_on_errors!())?;
        glfw.window_hint(OPENGL_PROFILE);
        glfw.window_hint(CONTEXT_VERSION);

        let (mut window, receiver) = glfw
            .create_window(DEFAULT_WIDTH, DEFAULT_HEIGHT, TITLE, WindowMode::Windowed)
            .ok_or(Error::WindowCreation)?;
        window.make_current();
        Self::enable_polling(&mut window);
        glfw.set_swap_interval(SwapInterval::Sync(1));

        load_gl();

        Ok(Self {
            glfw,
            receiver,
            window,
        })
    }

    fn enable_polling(window: &mut PWindow) {
        window.set_key_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_mouse_button_polling(true);
        window.set_framebuffer_size_polling(true);
    }
}

fn load_gl() {
    gl_loader::init_gl();
    gl::load_with(|symbol| gl_loader::get_proc_address(symbol) as *const _);
}
