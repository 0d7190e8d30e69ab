use kurbo::{PathEl, Shape as _};

/// Rounded rectangle as a `vello_cpu` path.
pub(crate) fn rounded_rect_path(rect: kurbo::Rect, radius: f64) -> vello_cpu::kurbo::BezPath {
    let shape = kurbo::RoundedRect::from_rect(rect, radius.max(0.0));
    let mut out = vello_cpu::kurbo::BezPath::new();
    for el in shape.path_elements(0.1) {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

/// Fresh render context covering a `width` x `height` surface.
pub(crate) fn render_context(width: u32, height: u32) -> vello_cpu::RenderContext {
    // Callers hold canvases validated to fit u16.
    let w = u16::try_from(width).unwrap_or(u16::MAX);
    let h = u16::try_from(height).unwrap_or(u16::MAX);
    vello_cpu::RenderContext::new(w, h)
}
