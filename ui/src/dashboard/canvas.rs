use dashboard_core::{ChartKind, Frame, Shape};
use gpui::{
    BorderStyle, Bounds, Canvas, PathBuilder, Pixels, Point, canvas, point, px, quad, rgb, size,
    transparent_black,
};

/// Paints whatever the engine presented on a surface. Unit-space geometry is
/// stretched to the canvas bounds, except for pies and aspect-locked charts,
/// which are fitted into a centered square.
pub(super) fn frame_canvas(frame: Option<Frame>) -> Canvas<Option<Frame>> {
    canvas(
        move |_, _, _| frame,
        move |bounds, frame, window, _| {
            window.paint_quad(quad(
                bounds,
                px(0.),
                rgb(0x0b1220),
                px(0.),
                transparent_black(),
                BorderStyle::default(),
            ));

            let Some(frame) = frame else {
                return;
            };
            let width = f32::from(bounds.size.width);
            let height = f32::from(bounds.size.height);
            if height <= 0.0 || width <= 0.0 {
                return;
            }

            let square = frame.config.kind == ChartKind::Pie
                || frame.config.options.maintain_aspect_ratio;
            let (sx, sy, ox, oy) = if square {
                let side = width.min(height);
                (
                    side,
                    side,
                    f32::from(bounds.origin.x) + (width - side) * 0.5,
                    f32::from(bounds.origin.y) + (height - side) * 0.5,
                )
            } else {
                (
                    width,
                    height,
                    f32::from(bounds.origin.x),
                    f32::from(bounds.origin.y),
                )
            };
            let to_px = |(x, y): (f32, f32)| -> Point<Pixels> {
                point(px(ox + x * sx), px(oy + y * sy))
            };

            for shape in &frame.shapes {
                match shape {
                    Shape::Rect { x, y, w, h, color } => {
                        let rect = Bounds {
                            origin: to_px((*x, *y)),
                            size: size(px(w * sx), px((h * sy).max(1.0))),
                        };
                        window.paint_quad(quad(
                            rect,
                            px(2.),
                            rgb(color.0),
                            px(0.),
                            rgb(color.0),
                            BorderStyle::default(),
                        ));
                    }
                    Shape::Polyline {
                        points,
                        width,
                        color,
                    } => {
                        let mut builder = PathBuilder::stroke(px(*width));
                        trace(&mut builder, points, &to_px);
                        if let Ok(path) = builder.build() {
                            window.paint_path(path, rgb(color.0));
                        }
                    }
                    Shape::Polygon { points, color } => {
                        let mut builder = PathBuilder::fill();
                        trace(&mut builder, points, &to_px);
                        builder.close();
                        if let Ok(path) = builder.build() {
                            window.paint_path(path, rgb(color.0));
                        }
                    }
                }
            }
        },
    )
}

fn trace(
    builder: &mut PathBuilder,
    points: &[(f32, f32)],
    to_px: &impl Fn((f32, f32)) -> Point<Pixels>,
) {
    let mut points = points.iter().copied();
    if let Some(first) = points.next() {
        builder.move_to(to_px(first));
    }
    for p in points {
        builder.line_to(to_px(p));
    }
}
