use super::*;

fn frame(w: u32, h: u32) -> image::RgbaImage {
    image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]))
}

#[test]
fn empty_frames_are_rejected() {
    assert!(InheritedBackground::new(frame(0, 10), "a").is_none());
    assert!(InheritedBackground::new(frame(10, 0), "a").is_none());
}

#[test]
fn fit_uses_capture_dimensions() {
    let mut bg = InheritedBackground::new(frame(1280, 720), "intro").unwrap();
    assert_eq!(bg.source(), "intro");
    assert_eq!(bg.native_size(), Size::new(1280.0, 720.0));
    assert!(bg.placement().is_none());

    let p = bg.fit(Size::new(1920.0, 1080.0));
    assert_eq!(p.scale, 1.5);
    assert_eq!(p.size, Size::new(1920.0, 1080.0));
    assert_eq!(bg.placement(), Some(p));
}

#[test]
fn refits_on_resize_and_survives_degenerate_viewport() {
    let mut bg = InheritedBackground::new(frame(100, 100), "x").unwrap();
    let first = bg.fit(Size::new(200.0, 100.0));
    assert_eq!(first.offset, Vec2::new(50.0, 0.0));

    let kept = bg.fit(Size::ZERO);
    assert_eq!(kept, first);

    let mut fresh = InheritedBackground::new(frame(100, 100), "y").unwrap();
    let unscaled = fresh.fit(Size::ZERO);
    assert_eq!(unscaled.scale, 1.0);
    assert_eq!(unscaled.size, Size::new(100.0, 100.0));
}

#[test]
fn props_sit_below_video_layers() {
    let bg = InheritedBackground::new(frame(4, 4), "intro").unwrap();
    let props = bg.props();
    assert_eq!(props.z, InheritedBackground::Z);
    assert!(props.z < 0);
    assert_eq!(props.opacity, 1.0);
}
