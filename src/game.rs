use crate::application::Application;
use crate::draw::clear;
use crate::error::{check_errors, Result};
use crate::framebuffer::FrameBuffer;
use crate::scene::{RenderContext, Viewport, WorldScene};
use glfw::{Action, Context as _, Key, WindowEvent};
use nalgebra_glm as glm;
use std::rc::Rc;
use std::time::Instant;

const MILLISECONDS_PER_UPDATE: u32 = 1000 / 60;

pub struct GameContext {
    application: Application,
    render_context: RenderContext,
    scene: WorldScene,
}

impl GameContext {
    pub fn new() -> Result<Self> {
        let application = Application::new()?;

        let (width, height) = application.window.get_framebuffer_size();
        let render_context = RenderContext {
            framebuffer: Rc::new(FrameBuffer::default_framebuffer()),
            viewport: Viewport::new(glm::IVec2::zeros(), glm::vec2(width, height)),
        };

        let scene = WorldScene::new()?;

        Ok(Self {
            application,
            render_context,
            scene,
        })
    }

    /// Fixed-timestep loop. Simulation advances in whole update ticks;
    /// whatever lag is left over goes to the renderer as a percentage of
    /// one tick.
    pub fn run(mut self) -> Result<()> {
        let mut last_time = Instant::now();
        let mut time_lag: u32 = 0;

        while !self.application.window.should_close() {
            let current_time = Instant::now();
            time_lag += current_time.duration_since(last_time).as_millis() as u32;
            last_time = current_time;

            self.application.glfw.poll_events();
            let events: Vec<_> = glfw::flush_messages(&self.application.receiver)
                .map(|(_, event)| event)
                .collect();
            for event in events {
                self.handle_event(event)?;
            }

            while time_lag >= MILLISECONDS_PER_UPDATE {
                self.scene.update(MILLISECONDS_PER_UPDATE);
                time_lag -= MILLISECONDS_PER_UPDATE;
            }

            let partial_update_percentage = time_lag as f32 / MILLISECONDS_PER_UPDATE as f32;
            self.render(partial_update_percentage)?;
        }
        Ok(())
    }

    fn handle_event(&mut self, event: WindowEvent) -> Result<()> {
        match event {
            WindowEvent::Key(Key::Escape, _, Action::Press, _) => {
                self.application.window.set_should_close(true);
                Ok(())
            }
            WindowEvent::FramebufferSize(width, height) => {
                self.render_context.viewport = Viewport::new(glm::IVec2::zeros(), glm::vec2(width, height));
                unsafe { gl::Viewport(0, 0, width, height) };
                check_errors()
            }
            other => self.scene.handle_event(&other, &self.render_context),
        }
    }

    fn render(&mut self, partial_update_percentage: f32) -> Result<()> {
        clear(1.0, 1.0, 1.0, 1.0)?;
        self.scene
            .render(&self.render_context, partial_update_percentage)?;
        self.application.window.swap_buffers();
        Ok(())
    }
}
