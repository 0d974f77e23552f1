use glcanvas_canvas::{CanvasBridge, CanvasColor, CanvasUpdate, ConversionMode, NullDisplay, rgb565_to_canvas};
use glcanvas_common::{FrameStatus, SkipReason};
use glcanvas_raster::Pixels;
use glcanvas_render::{RenderConfig, RenderSession};

#[test]
fn rgb565_frame_reaches_canvas_exactly() {
    let mut session = RenderSession::open(64, 64, 16).unwrap();
    let mut canvas = CanvasBridge::init(64, 64, NullDisplay).unwrap();

    assert_eq!(session.render_frame().unwrap(), FrameStatus::Rendered);
    let fb = session.framebuffer().unwrap();
    assert_eq!(fb.as_bytes().len(), 64 * 64 * 2);

    assert_eq!(canvas.update(Some(fb)), CanvasUpdate::Converted);

    let Pixels::Rgb565(native) = fb.pixels() else {
        panic!("expected a 16-bit framebuffer");
    };
    let cells = canvas.pixels().unwrap();
    assert_eq!(cells.len(), native.len());
    for (cell, &p) in cells.iter().zip(native) {
        assert_eq!(*cell, rgb565_to_canvas(p, ConversionMode::Shift));
    }
    // The triangle put some color on screen.
    assert!(cells.iter().any(|&c| c != CanvasColor::BLACK));
}

#[test]
fn rgba32_frame_is_copied() {
    let mut session = RenderSession::open(32, 16, 32).unwrap();
    let mut canvas = CanvasBridge::init(32, 16, NullDisplay).unwrap();
    session.render_frame().unwrap();
    let fb = session.framebuffer().unwrap();

    assert_eq!(canvas.update(Some(fb)), CanvasUpdate::Copied);
    let Pixels::Rgba32(native) = fb.pixels() else {
        panic!("expected a 32-bit framebuffer");
    };
    let cells: Vec<u32> = canvas.pixels().unwrap().iter().map(|c| c.0).collect();
    assert_eq!(cells, native);
}

#[test]
fn closed_session_leaves_canvas_untouched() {
    let config = RenderConfig {
        width: 16,
        height: 16,
        overlay: false,
        ..RenderConfig::default()
    };
    let mut session = RenderSession::open_with(config).unwrap();
    let mut canvas = CanvasBridge::init(16, 16, NullDisplay).unwrap();

    session.render_frame().unwrap();
    canvas.update(session.framebuffer());
    let before = canvas.pixels().unwrap().to_vec();

    session.close();
    assert_eq!(
        session.render_frame().unwrap(),
        FrameStatus::Skipped(SkipReason::FramebufferUnavailable)
    );
    assert_eq!(
        canvas.update(session.framebuffer()),
        CanvasUpdate::Skipped(SkipReason::FramebufferUnavailable)
    );
    assert_eq!(canvas.pixels().unwrap(), before.as_slice());
}
