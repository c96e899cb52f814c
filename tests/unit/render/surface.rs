use super::*;

fn solid(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    px.iter().copied().cycle().take((w * h * 4) as usize).collect()
}

#[test]
fn fill_always_covers_canvas() {
    let canvas = Canvas::new(640, 360).unwrap();
    let r = fit_rect(100, 100, canvas, FitMode::Fill);
    assert_eq!(
        r,
        DrawRect {
            x: 0,
            y: 0,
            width: 640,
            height: 360
        }
    );
}

#[test]
fn letterbox_centres_narrow_source() {
    let canvas = Canvas::new(640, 360).unwrap();
    let r = fit_rect(360, 360, canvas, FitMode::Letterbox);
    assert_eq!(r.width, 360);
    assert_eq!(r.height, 360);
    assert_eq!(r.x, 140);
    assert_eq!(r.y, 0);
}

#[test]
fn letterbox_centres_wide_source() {
    let canvas = Canvas::new(100, 100).unwrap();
    let r = fit_rect(200, 100, canvas, FitMode::Letterbox);
    assert_eq!((r.x, r.y, r.width, r.height), (0, 25, 100, 50));
}

#[test]
fn cpu_surface_scales_source_to_fill() {
    let canvas = Canvas::new(8, 4).unwrap();
    let mut s = CpuSurface::new(canvas, ScaleFilter::Nearest).unwrap();
    s.clear([0, 0, 0, 255]);
    let src = solid(2, 2, [200, 10, 10, 255]);
    s.draw_rgba(&src, 2, 2, fit_rect(2, 2, canvas, FitMode::Fill))
        .unwrap();
    assert_eq!(s.pixels().len(), canvas.rgba_len());
    assert!(s.pixels().chunks_exact(4).all(|p| p == [200, 10, 10, 255]));
}

#[test]
fn cpu_surface_letterbox_keeps_background_bars() {
    let canvas = Canvas::new(8, 4).unwrap();
    let mut s = CpuSurface::new(canvas, ScaleFilter::Nearest).unwrap();
    s.clear([1, 2, 3, 255]);
    let src = solid(4, 4, [9, 9, 9, 255]);
    s.draw_rgba(&src, 4, 4, fit_rect(4, 4, canvas, FitMode::Letterbox))
        .unwrap();
    let px = |x: usize, y: usize| &s.pixels()[(y * 8 + x) * 4..(y * 8 + x) * 4 + 4];
    assert_eq!(px(0, 0), [1, 2, 3, 255]);
    assert_eq!(px(4, 2), [9, 9, 9, 255]);
    assert_eq!(px(7, 3), [1, 2, 3, 255]);
}

#[test]
fn short_source_buffer_is_rejected() {
    let canvas = Canvas::new(4, 4).unwrap();
    let mut s = CpuSurface::new(canvas, ScaleFilter::Triangle).unwrap();
    let err = s
        .draw_rgba(&[0u8; 8], 4, 4, fit_rect(4, 4, canvas, FitMode::Fill))
        .unwrap_err();
    assert!(matches!(err, MergeError::Decode(_)));
}
