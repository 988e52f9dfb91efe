use anyhow::Result;
use log::{error, info};
use std::sync::Arc;
use winit::{
    event::{ElementState, Event, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

mod audio;
mod graphics;
mod visual;

use audio::SpectrumSource;
use graphics::GraphicsEngine;
use visual::{FrameClock, ModeController, VisualMode, VisualState};

fn main() -> Result<()> {
    env_logger::init();
    info!("Starting Trailwave");

    // Acquire the microphone before anything else: without a live input
    // stream there is nothing to drive, so a denied or missing device ends
    // the process here rather than starting a dead tick loop.
    let mut spectrum = SpectrumSource::acquire()?;

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Trailwave")
            .with_inner_size(winit::dpi::LogicalSize::new(1200, 800))
            .build(&event_loop)?,
    );

    let mut engine = pollster::block_on(GraphicsEngine::new(&window))?;
    let mut state = VisualState::new(ModeController::default());
    let mut clock = FrameClock::new();

    info!("Visualizer initialized successfully");

    let window_clone = Arc::clone(&window);
    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    info!("Close requested");
                    elwt.exit();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state == ElementState::Pressed {
                        match event.physical_key {
                            PhysicalKey::Code(KeyCode::Escape) => {
                                info!("Escape pressed");
                                elwt.exit();
                            }
                            PhysicalKey::Code(KeyCode::Digit1) => {
                                state.modes.force_mode(VisualMode::Trail);
                            }
                            PhysicalKey::Code(KeyCode::Digit2) => {
                                state.modes.force_mode(VisualMode::Particles);
                            }
                            PhysicalKey::Code(KeyCode::Digit3) => {
                                state.modes.force_mode(VisualMode::Hybrid);
                            }
                            _ => {}
                        }
                    }
                }
                WindowEvent::Resized(physical_size) => {
                    engine.resize(physical_size);
                }
                WindowEvent::RedrawRequested => {
                    let dt = clock.tick();
                    let frame = spectrum.read_frame();
                    state.tick(dt, frame);

                    if let Err(e) = engine.render(&state) {
                        error!("Render error: {}", e);
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window_clone.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
