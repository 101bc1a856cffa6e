use egui::Context;

use crate::controller::FrameView;
use crate::model::RoundOutcome;

/// Build the HUD for one frame and return egui output
pub fn build_ui(egui_ctx: &Context, raw_input: egui::RawInput, frame: &FrameView<'_>) -> egui::FullOutput {
    egui_ctx.run(raw_input, |ctx| {
        if frame.player.is_playing() {
            draw_crosshair(ctx);
        } else {
            draw_title(ctx, frame.last_outcome);
        }
        draw_score_panel(ctx, frame);
    })
}

fn draw_crosshair(ctx: &Context) {
    let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::Foreground, egui::Id::new("crosshair")));
    let center = ctx.available_rect().center();
    let size = 10.0;
    let stroke = egui::Stroke::new(1.0, egui::Color32::WHITE);
    painter.line_segment(
        [
            egui::Pos2::new(center.x - size, center.y),
            egui::Pos2::new(center.x + size, center.y),
        ],
        stroke,
    );
    painter.line_segment(
        [
            egui::Pos2::new(center.x, center.y - size),
            egui::Pos2::new(center.x, center.y + size),
        ],
        stroke,
    );
}

pub fn outcome_banner(outcome: Option<RoundOutcome>) -> Option<&'static str> {
    match outcome? {
        RoundOutcome::Won => Some("Goal reached!"),
        RoundOutcome::Died => Some("You died"),
        RoundOutcome::Playing => None,
    }
}

fn draw_title(ctx: &Context, last_outcome: Option<RoundOutcome>) {
    egui::Area::new(egui::Id::new("title"))
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                if let Some(banner) = outcome_banner(last_outcome) {
                    ui.label(egui::RichText::new(banner).size(28.0).color(egui::Color32::YELLOW));
                }
                ui.label(egui::RichText::new("Press Enter to play").size(20.0).color(egui::Color32::WHITE));
                ui.label(egui::RichText::new("WASD move, Space jump, E reverse gravity").small());
                ui.label(egui::RichText::new("Left mouse: ray, right mouse: light").small());
            });
        });
}

fn draw_score_panel(ctx: &Context, frame: &FrameView<'_>) {
    let info = &frame.ctx.game_info;
    egui::Window::new("Score")
        .default_pos([8.0, 8.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(egui::RichText::new(format!("Score: {:.0}", info.current_score)).strong());
            ui.label(egui::RichText::new(format!("Last: {}", info.last_score)).small());
            ui.label(egui::RichText::new(format!("Best: {}", info.highest_score)).small());
            ui.separator();
            ui.label(egui::RichText::new(format!("FPS: {:.0}", frame.fps)).small());
            if frame.player.is_playing() {
                let eye = frame.player.camera().eye;
                ui.label(egui::RichText::new(format!("Pos: x: {:.0} y: {:.0} z: {:.0}", eye.x, eye.y, eye.z)).small());
                let gravity = if frame.player.gravity() > 0.0 { "up" } else { "down" };
                ui.label(egui::RichText::new(format!("Gravity: {gravity}")).small());
            }
        });
}
