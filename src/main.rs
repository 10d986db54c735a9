use std::sync::Mutex;

use anyhow::Context;
use futures::executor::block_on;
use log::{info, warn};
use winit::{
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

mod renderer;
use renderer::GraphicsContext;

use maze_saver::{open_session, PaintOutcome, RedrawRequester, SessionConfig, SurfaceSize, VertexCanvas};

/// Wakes the event loop from a generator thread.
#[derive(Debug, Clone, Copy)]
enum MazeEvent {
    Redraw,
}

fn swap_chain_desc(size: winit::dpi::PhysicalSize<u32>) -> wgpu::SwapChainDescriptor {
    wgpu::SwapChainDescriptor {
        usage: wgpu::TextureUsage::OUTPUT_ATTACHMENT,
        format: wgpu::TextureFormat::Bgra8UnormSrgb,
        width: size.width,
        height: size.height,
        present_mode: wgpu::PresentMode::Fifo,
    }
}

/// What to do when the swap chain has no frame to hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameRecovery {
    /// The surface changed under the swap chain, build a new one.
    Rebuild,
    /// Wait for the next resize or grid change to redraw.
    Skip,
}

fn frame_recovery(
    err: &wgpu::SwapChainError,
    size: winit::dpi::PhysicalSize<u32>,
) -> FrameRecovery {
    match err {
        wgpu::SwapChainError::Outdated | wgpu::SwapChainError::Lost
            if size.width > 0 && size.height > 0 =>
        {
            FrameRecovery::Rebuild
        }
        _ => FrameRecovery::Skip,
    }
}

fn resize(
    device: &wgpu::Device,
    surface: &wgpu::Surface,
    swap_chain: &mut wgpu::SwapChain,
    gfx_ctx: &mut GraphicsContext,
    size: winit::dpi::PhysicalSize<u32>,
) {
    gfx_ctx.resize(size);
    // minimized, keep the old swap chain until there is something to show
    if size.width == 0 || size.height == 0 {
        return;
    }
    *swap_chain = device.create_swap_chain(surface, &swap_chain_desc(size));
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = SessionConfig::default();

    let event_loop = EventLoop::<MazeEvent>::with_user_event();
    let window = WindowBuilder::new()
        .with_title("maze-saver")
        .build(&event_loop)?;

    let proxy = Mutex::new(event_loop.create_proxy());
    let redraw = RedrawRequester::new(move || {
        if let Ok(proxy) = proxy.lock() {
            // closed means the loop is already exiting
            let _ = proxy.send_event(MazeEvent::Redraw);
        }
    });

    let instance = wgpu::Instance::new(wgpu::BackendBit::PRIMARY);
    let surface = unsafe { instance.create_surface(&window) };
    let size = window.inner_size();

    // Since main can't be async, we're going to need to block
    let adapter = block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::Default,
        compatible_surface: Some(&surface),
    }))
    .context("no graphics adapter for this window")?;

    let (device, queue) = block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            features: wgpu::Features::empty(),
            limits: wgpu::Limits::default(),
            shader_validation: true,
        },
        None, // Trace path
    ))
    .map_err(|err| anyhow::anyhow!("failed to open a graphics device: {:?}", err))?;

    let sc_desc = swap_chain_desc(size);
    let mut swap_chain = device.create_swap_chain(&surface, &sc_desc);
    let mut gfx_ctx = block_on(GraphicsContext::new(&window, &device, &sc_desc));

    let mut driver = open_session(&config, redraw.clone())?;
    // painting is pinned to the thread that builds the renderer
    let renderer = driver.renderer(config.palette);
    driver.start();
    let mut driver = Some(driver);
    info!(
        "showing a {}x{} maze in a {}x{} window",
        config.width, config.height, size.width, size.height
    );

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;
        match event {
            Event::UserEvent(MazeEvent::Redraw) => window.request_redraw(),
            Event::RedrawRequested(_) => {
                redraw.take();
                // minimized, the stale swap chain can't present
                if gfx_ctx.size.width == 0 || gfx_ctx.size.height == 0 {
                    return;
                }

                let frame = match swap_chain.get_current_frame() {
                    Ok(frame) => frame,
                    Err(err) => {
                        warn!("dropped frame: {:?}", err);
                        if frame_recovery(&err, gfx_ctx.size) == FrameRecovery::Rebuild {
                            swap_chain =
                                device.create_swap_chain(&surface, &swap_chain_desc(gfx_ctx.size));
                        }
                        return;
                    }
                };

                let mut canvas =
                    VertexCanvas::new(SurfaceSize::new(gfx_ctx.size.width, gfx_ctx.size.height));
                if let PaintOutcome::Painted { .. } = renderer.paint(&mut canvas) {
                    gfx_ctx.render(&canvas, &frame.output.view, &device, &queue);
                }
            }
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => match event {
                WindowEvent::CloseRequested
                | WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                } => {
                    if let Some(driver) = driver.take() {
                        driver.shutdown();
                    }
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::Resized(new_size) => {
                    resize(&device, &surface, &mut swap_chain, &mut gfx_ctx, *new_size);
                    redraw.request();
                }
                WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                    resize(&device, &surface, &mut swap_chain, &mut gfx_ctx, **new_inner_size);
                    redraw.request();
                }
                _ => {}
            },
            _ => {}
        }
    });
}
