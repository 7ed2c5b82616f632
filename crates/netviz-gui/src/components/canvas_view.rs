use eframe::egui;
use netviz_core::{Color, Vec2};
use netviz_graph::{DrawCommand, GraphCanvas, RenderPacket, Stroke};

/// Scroll points egui reports for one mouse-wheel notch.
const SCROLL_POINTS_PER_NOTCH: f32 = 40.0;
/// Angle-delta units per notch expected by the canvas.
const ANGLE_DELTA_PER_NOTCH: f32 = 120.0;

pub fn to_color32(color: Color) -> egui::Color32 {
    egui::Color32::from_rgb(color.r, color.g, color.b)
}

fn to_stroke(stroke: Stroke) -> egui::Stroke {
    egui::Stroke::new(stroke.width, to_color32(stroke.color))
}

fn to_pos(origin: egui::Pos2, v: Vec2) -> egui::Pos2 {
    origin + egui::vec2(v.x, v.y)
}

/// Pointer position relative to the canvas' top-left corner.
pub fn to_local(origin: egui::Pos2, pos: egui::Pos2) -> Vec2 {
    let delta = pos - origin;
    Vec2::new(delta.x, delta.y)
}

pub fn scroll_to_angle_delta(scroll_y: f32) -> f32 {
    scroll_y / SCROLL_POINTS_PER_NOTCH * ANGLE_DELTA_PER_NOTCH
}

pub fn paint(painter: &egui::Painter, rect: egui::Rect, packet: &RenderPacket) {
    painter.rect_filled(rect, 0.0, to_color32(packet.background));
    for command in &packet.commands {
        match *command {
            DrawCommand::Line { from, to, stroke } => {
                painter.line_segment(
                    [to_pos(rect.min, from), to_pos(rect.min, to)],
                    to_stroke(stroke),
                );
            }
            DrawCommand::Circle {
                center,
                radius,
                fill,
                stroke,
            } => {
                painter.circle(
                    to_pos(rect.min, center),
                    radius,
                    to_color32(fill),
                    to_stroke(stroke),
                );
            }
        }
    }
}

/// Central drawing surface: forwards pointer and wheel input to the canvas
/// and paints its render packet.
pub fn show(ui: &mut egui::Ui, canvas: &mut GraphCanvas) {
    let (response, painter) =
        ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
    let rect = response.rect;
    canvas.resize(Vec2::new(rect.width(), rect.height()));

    let (pressed, released, down, scroll_y, pointer) = ui.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.primary_down(),
            i.raw_scroll_delta.y,
            i.pointer.interact_pos(),
        )
    });

    if let Some(pos) = pointer {
        let local = to_local(rect.min, pos);
        if pressed && response.hovered() {
            if let Err(e) = canvas.pointer_press(local) {
                tracing::debug!("Pointer press rejected: {}", e);
            }
        } else if down {
            canvas.pointer_move(local);
        }
    }
    if released {
        canvas.pointer_release();
    }
    if scroll_y != 0.0 && response.hovered() {
        canvas.wheel(scroll_to_angle_delta(scroll_y));
    }

    paint(&painter, rect, &canvas.render());

    if canvas.take_repaint_request() {
        ui.ctx().request_repaint();
    }
}
