//! Scene composition: turns game state into screen-space draw calls

use glam::Vec2;

use super::{
    BACKGROUND, BALL_FILL, BALL_OUTLINE, Canvas, Color, INVALID, PLATFORM, PLATFORM_LIT, VALID,
};
use crate::sim::platform::{Platform, polygon};
use crate::sim::{Game, GamePhase};

#[inline]
fn to_screen(p: Vec2, vertical_offset: f32) -> Vec2 {
    Vec2::new(p.x, p.y - vertical_offset)
}

/// Ball with a one-pixel outline
pub fn ball(canvas: &mut impl Canvas, center: Vec2, radius: f32) {
    canvas.draw_disk(center, radius, BALL_OUTLINE);
    canvas.draw_disk(center, (radius - 1.0).max(0.0), BALL_FILL);
}

/// Platform polygon built from its own anchor at the given camera offset
pub fn platform(canvas: &mut impl Canvas, p: &Platform, vertical_offset: f32, color: Color) {
    let verts = polygon(p.anchor, p.angle(), p.length, p.width, p.offset)
        .map(|v| to_screen(v, vertical_offset));
    canvas.draw_polygon(&verts, color);
}

/// Preview of the bounce: one ball-sized disk per projected tick
pub fn projected_path(
    canvas: &mut impl Canvas,
    path: &[Vec2],
    radius: f32,
    vertical_offset: f32,
    color: Color,
) {
    for &p in path {
        canvas.draw_disk(to_screen(p, vertical_offset), radius, color);
    }
}

/// Draw one frame of the game
pub fn draw_game(game: &Game, canvas: &mut impl Canvas) {
    canvas.clear(BACKGROUND);
    let session = &game.session;
    let radius = session.ball.radius;

    match game.phase {
        GamePhase::MainMenu | GamePhase::InitBuilder => {}
        GamePhase::Builder | GamePhase::InitPlayback | GamePhase::Finished(_) => {
            let offset = session.vertical_offset();
            for p in &session.platforms {
                platform(canvas, p, offset, PLATFORM);
            }
            if session.is_paused() {
                let color = if game.can_resume { VALID } else { INVALID };
                projected_path(canvas, &session.ball.projected_path, radius, offset, color);
            }
            ball(canvas, to_screen(session.ball.pos, offset), radius);
        }
        GamePhase::Playback { notes, .. } => {
            let pos = game.ball_position();
            let offset = session.settings.vertical_offset(pos.y);
            for (i, p) in session.platforms.iter().enumerate() {
                let color = if i < notes { PLATFORM_LIT } else { PLATFORM };
                platform(canvas, p, offset, color);
            }
            ball(canvas, to_screen(pos, offset), radius);
        }
    }

    canvas.present();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::input::Input;
    use crate::playback::TimelineSignal;
    use crate::renderer::{DrawCall, RecordingCanvas};
    use crate::sim::{TickInput, tick};

    fn paused_game() -> Game {
        let mut game = Game::new(Settings::default());
        tick(&mut game, &TickInput::events(vec![Input::Start]));
        tick(&mut game, &TickInput::default());
        tick(
            &mut game,
            &TickInput::signals(vec![TimelineSignal::NoteOn {
                time: 0.5,
                next_gap: Some(0.5),
            }]),
        );
        game
    }

    #[test]
    fn test_menu_only_clears() {
        let game = Game::new(Settings::default());
        let mut canvas = RecordingCanvas::new();
        draw_game(&game, &mut canvas);
        assert_eq!(canvas.calls, vec![DrawCall::Clear(BACKGROUND)]);
        assert_eq!(canvas.frames, 1);
    }

    #[test]
    fn test_ball_on_camera_row() {
        let game = paused_game();
        let mut canvas = RecordingCanvas::new();
        draw_game(&game, &mut canvas);
        let (center, r, color) = canvas.disks().last().unwrap();
        assert_eq!(color, BALL_FILL);
        assert_eq!(r, 14.0);
        assert!((center.y - game.settings().camera_center).abs() < 1e-3);
        assert_eq!(canvas.polygons().count(), 1);
    }

    #[test]
    fn test_ball_outline_visible() {
        let game = paused_game();
        let mut canvas = RecordingCanvas::new();
        draw_game(&game, &mut canvas);
        let disks: Vec<_> = canvas.disks().collect();
        let (_, r, outline) = disks[disks.len() - 2];
        assert_eq!(r, 15.0);
        assert_eq!(outline, BALL_OUTLINE);
        assert_ne!(outline, BACKGROUND);
        assert_ne!(outline, BALL_FILL);
    }

    #[test]
    fn test_path_color_follows_legality() {
        let mut game = paused_game();
        let ball = game.session.ball.pos;
        let offset = game.session.vertical_offset();

        // aim the floor below the ball: legal
        let below = Vec2::new(ball.x, ball.y - offset + 40.0);
        tick(&mut game, &TickInput::events(vec![Input::PointerMoved(below)]));
        let mut canvas = RecordingCanvas::new();
        draw_game(&game, &mut canvas);
        let path: Vec<_> = canvas.disks().filter(|d| d.2 == VALID).collect();
        assert_eq!(path.len(), 15);
        assert!(canvas.disks().all(|d| d.2 != INVALID));

        // ceiling above: illegal
        let above = Vec2::new(ball.x, ball.y - offset - 40.0);
        tick(&mut game, &TickInput::events(vec![Input::PointerMoved(above)]));
        draw_game(&game, &mut canvas);
        assert_eq!(canvas.disks().filter(|d| d.2 == INVALID).count(), 15);
    }
}
