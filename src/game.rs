//! Session controller shared by the browser host and the headless stepper
//!
//! Owns the simulation, the framebuffer and the audio sink. The host feeds it
//! timestamps and input; everything else happens here.

use crate::audio::{AudioSignal, AudioSink, SilentAudio};
use crate::renderer::{Framebuffer, SceneRenderer, danger_level};
use crate::settings::{GameConfig, QualityPreset};
use crate::sim::{
    FrameInput, GameEvent, GamePhase, GameState, SessionSummary, Status, shape_input, tick,
};

/// One game instance
pub struct Game {
    cfg: GameConfig,
    state: GameState,
    input: FrameInput,
    framebuffer: Framebuffer,
    renderer: SceneRenderer,
    audio: Box<dyn AudioSink>,
    /// Previous frame timestamp (ms); `None` restarts the baseline
    last_time: Option<f64>,
    /// Display size in CSS pixels
    view: (u32, u32),
    muted: bool,
}

impl Game {
    /// New session with a silent audio sink
    pub fn new(cfg: GameConfig, seed: u32) -> Self {
        Self::with_audio(cfg, seed, Box::new(SilentAudio))
    }

    pub fn with_audio(cfg: GameConfig, seed: u32, audio: Box<dyn AudioSink>) -> Self {
        let cfg = cfg.sanitized();
        let state = GameState::new(seed, &cfg);
        Self::from_state(cfg, state, audio)
    }

    /// Wrap an already built session. Out-of-range tunables are clamped.
    pub fn from_state(cfg: GameConfig, state: GameState, mut audio: Box<dyn AudioSink>) -> Self {
        let cfg = cfg.sanitized();
        audio.set_volume(cfg.master_volume);
        audio.start();
        let view = (320, 200);
        let (w, h) = scaled_size(view, cfg.quality);
        Self {
            cfg,
            state,
            input: FrameInput::default(),
            framebuffer: Framebuffer::new(w, h),
            renderer: SceneRenderer::new(),
            audio,
            last_time: None,
            view,
            muted: false,
        }
    }

    /// Throw the current session away and generate a fresh one. Returns the
    /// seed used (clock-derived when `seed` is `None`).
    pub fn start_new(&mut self, seed: Option<u32>) -> u32 {
        let seed = seed.unwrap_or_else(clock_seed);
        self.state = GameState::new(seed, &self.cfg);
        self.input = FrameInput::default();
        self.last_time = None;
        self.audio.stop();
        self.audio.start();
        log::info!("Session started with seed {}", seed);
        seed
    }

    /// Pause or resume. Resuming restarts frame timing so the pause is not
    /// simulated as one long frame.
    pub fn toggle_pause(&mut self) {
        let toggle = FrameInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut self.state, &toggle, 0.0, &self.cfg);
        self.last_time = None;
        match self.state.phase {
            GamePhase::Paused => {
                self.audio.stop();
                log::info!("Paused");
            }
            GamePhase::Running => {
                self.audio.start();
                log::info!("Resumed");
            }
            GamePhase::Won | GamePhase::Lost => {}
        }
    }

    /// Browsers only let audio start from a user gesture; hosts call this
    /// from input handlers
    pub fn resume_audio(&mut self) {
        if self.state.is_running() {
            self.audio.start();
        }
    }

    /// Pause only if currently running (tab hidden, focus lost)
    pub fn auto_pause(&mut self) {
        if self.state.is_running() {
            self.toggle_pause();
        }
    }

    /// End the session as a win
    pub fn win(&mut self) {
        if self.finish(GamePhase::Won, Status::Escaped) {
            log::info!("{}", self.state.summary().headline());
        }
    }

    /// End the session as a loss
    pub fn game_over(&mut self) {
        if self.finish(GamePhase::Lost, Status::Caught) {
            log::info!("{}", self.state.summary().headline());
        }
    }

    fn finish(&mut self, phase: GamePhase, status: Status) -> bool {
        if matches!(self.state.phase, GamePhase::Won | GamePhase::Lost) {
            return false;
        }
        self.state.phase = phase;
        self.state.status = status;
        self.input = FrameInput::default();
        self.audio.stop();
        true
    }

    /// Display size changed (CSS pixels); the framebuffer follows at the
    /// quality preset's resolution scale
    pub fn resize(&mut self, width: u32, height: u32) {
        self.view = (width.max(1), height.max(1));
        let (w, h) = scaled_size(self.view, self.cfg.quality);
        self.framebuffer.resize(w, h);
    }

    pub fn set_quality(&mut self, quality: QualityPreset) {
        self.cfg.quality = quality;
        self.resize(self.view.0, self.view.1);
        log::info!("Quality set to {}", quality.as_str());
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.audio.set_muted(muted);
    }

    /// Returns the new mute state
    pub fn toggle_mute(&mut self) -> bool {
        self.set_muted(!self.muted);
        log::info!("Audio {}", if self.muted { "muted" } else { "unmuted" });
        self.muted
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Joystick position: x strafes right, y walks forward
    pub fn set_move(&mut self, vx: f32, vy: f32) {
        self.input.move_x = vx;
        self.input.move_y = vy;
    }

    /// Accumulate horizontal look drag (pixels) until the next frame
    pub fn add_look(&mut self, dx: f32) {
        self.input.look_dx += dx;
    }

    /// Run one presented frame at `now_ms`: simulate then render.
    /// Returns the events the frame produced.
    pub fn frame(&mut self, now_ms: f64) -> Vec<GameEvent> {
        let dt = match self.last_time {
            Some(prev) => ((now_ms - prev) / 1000.0).max(0.0) as f32,
            None => 0.0,
        };
        self.last_time = Some(now_ms);

        let events = self.update(dt);
        self.render();
        events
    }

    /// Advance the simulation by `dt` seconds (clamped inside `tick`)
    pub fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        let was_running = self.state.is_running();
        tick(&mut self.state, &self.input, dt, &self.cfg);

        // One-shot inputs
        self.input.look_dx = 0.0;
        self.input.pause = false;

        let events = self.state.drain_events();
        for event in &events {
            match event {
                GameEvent::Footstep => self.audio.blip_foot(),
                GameEvent::Won | GameEvent::Caught => {
                    self.audio.stop();
                    log::info!("{}", self.state.summary().headline());
                }
                GameEvent::EnemySpotted => log::debug!("Enemy spotted the player"),
                GameEvent::EnemyLostTrack => log::debug!("Enemy lost track"),
                GameEvent::KeyCollected { .. } | GameEvent::ExitLocked { .. } => {}
            }
        }

        if was_running && self.state.is_running() {
            self.audio.update(self.audio_signal());
        }
        events
    }

    fn audio_signal(&self) -> AudioSignal {
        let stick = shape_input(
            self.input.move_x,
            self.input.move_y,
            self.cfg.input_deadzone,
            self.cfg.input_curve,
        );
        AudioSignal::new(
            stick.length(),
            danger_level(self.state.enemy_distance(), self.cfg.danger_range),
        )
    }

    /// Draw the current state into the framebuffer
    pub fn render(&mut self) {
        self.renderer.render(&mut self.framebuffer, &self.state, &self.cfg);
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.cfg
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn seed(&self) -> u32 {
        self.state.seed
    }

    pub fn summary(&self) -> SessionSummary {
        self.state.summary()
    }
}

fn scaled_size(view: (u32, u32), quality: QualityPreset) -> (u32, u32) {
    let s = quality.resolution_scale();
    let w = ((view.0 as f32 * s) as u32).max(1);
    let h = ((view.1 as f32 * s) as u32).max(1);
    (w, h)
}

#[cfg(target_arch = "wasm32")]
fn clock_seed() -> u32 {
    js_sys::Date::now() as u64 as u32
}

#[cfg(not(target_arch = "wasm32"))]
fn clock_seed() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u32)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Grid, Mulberry32, Spawns, cell_center};
    use glam::IVec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Calls {
        starts: u32,
        stops: u32,
        updates: Vec<AudioSignal>,
        feet: u32,
        volume: Option<f32>,
        muted: Option<bool>,
    }

    struct RecordingAudio(Rc<RefCell<Calls>>);

    impl AudioSink for RecordingAudio {
        fn start(&mut self) {
            self.0.borrow_mut().starts += 1;
        }
        fn stop(&mut self) {
            self.0.borrow_mut().stops += 1;
        }
        fn update(&mut self, signal: AudioSignal) {
            self.0.borrow_mut().updates.push(signal);
        }
        fn blip_foot(&mut self) {
            self.0.borrow_mut().feet += 1;
        }
        fn set_volume(&mut self, volume: f32) {
            self.0.borrow_mut().volume = Some(volume);
        }
        fn set_muted(&mut self, muted: bool) {
            self.0.borrow_mut().muted = Some(muted);
        }
    }

    /// Long corridor with the enemy sealed off
    fn corridor_game(calls: &Rc<RefCell<Calls>>) -> Game {
        let cfg = GameConfig::default();
        let grid = Grid::from_rows(&[
            "#######################",
            "#.....................#",
            "#######################",
            "#.#####################",
            "#######################",
        ]);
        let spawns = Spawns {
            player: IVec2::new(1, 1),
            keys: [IVec2::new(19, 1), IVec2::new(20, 1), IVec2::new(21, 1)],
            exit: IVec2::new(17, 1),
            enemy: IVec2::new(1, 3),
        };
        let mut state = GameState::from_parts(9, grid, spawns, Mulberry32::new(9), &cfg);
        state.player.facing = 0.0;
        Game::from_state(cfg, state, Box::new(RecordingAudio(calls.clone())))
    }

    #[test]
    fn test_first_frame_has_zero_dt() {
        let mut game = Game::new(GameConfig::default(), 5);
        game.frame(10_000.0);
        assert_eq!(game.state().elapsed, 0.0);
        game.frame(10_020.0);
        assert!((game.state().elapsed - 0.02).abs() < 1e-5);
    }

    #[test]
    fn test_resume_resets_timestamp_baseline() {
        let mut game = Game::new(GameConfig::default(), 5);
        game.frame(0.0);
        game.frame(16.0);
        let before = game.state().elapsed;

        game.toggle_pause();
        assert_eq!(game.phase(), GamePhase::Paused);
        game.frame(5_000.0);
        assert_eq!(game.state().elapsed, before);

        game.toggle_pause();
        assert_eq!(game.phase(), GamePhase::Running);
        game.frame(60_000.0);
        assert_eq!(game.state().elapsed, before, "long gap is not simulated");
    }

    #[test]
    fn test_start_new_is_reproducible() {
        let mut game = Game::new(GameConfig::default(), 1);
        let seed = game.start_new(Some(777));
        assert_eq!(seed, 777);
        let other = Game::new(GameConfig::default(), 777);
        assert_eq!(game.state().grid, other.state().grid);
        assert_eq!(game.state().player.pos, other.state().player.pos);
    }

    #[test]
    fn test_walking_plays_footsteps_and_feeds_audio() {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let mut game = corridor_game(&calls);
        game.set_move(0.0, 1.0);
        let mut t = 0.0;
        for _ in 0..60 {
            t += 16.0;
            game.frame(t);
        }
        let calls = calls.borrow();
        assert!(calls.feet >= 1);
        assert!(!calls.updates.is_empty());
        assert!(calls.updates.iter().all(|s| s.moving > 0.9));
        // Walking away from the sealed-off enemy
        let first = calls.updates[0].danger;
        let last = calls.updates[calls.updates.len() - 1].danger;
        assert!(first > last);
    }

    #[test]
    fn test_locked_exit_reports_event() {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let mut game = corridor_game(&calls);
        game.set_move(0.0, 1.0);
        let mut seen = Vec::new();
        let mut t = 0.0;
        while game.state().player_cell() != IVec2::new(17, 1) && t < 20_000.0 {
            t += 16.0;
            seen.extend(game.frame(t));
        }
        assert!(seen.contains(&GameEvent::ExitLocked { missing: 3 }));
        assert_eq!(game.status(), Status::ExitLocked { missing: 3 });
        assert_eq!(game.phase(), GamePhase::Running);
    }

    #[test]
    fn test_end_hooks_stop_audio_once() {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let mut game = corridor_game(&calls);
        game.game_over();
        game.win();
        assert_eq!(game.phase(), GamePhase::Lost);
        assert_eq!(game.status(), Status::Caught);
        assert_eq!(calls.borrow().stops, 1);

        game.frame(0.0);
        game.frame(16.0);
        assert!(calls.borrow().updates.is_empty());
    }

    #[test]
    fn test_resize_follows_quality() {
        let mut game = Game::new(GameConfig::default(), 3);
        game.resize(800, 600);
        assert_eq!(game.framebuffer().width, 400);
        assert_eq!(game.framebuffer().height, 300);
        game.set_quality(QualityPreset::High);
        assert_eq!(game.framebuffer().width, 800);
        game.render();
        assert_eq!(game.framebuffer().as_bytes().len(), 800 * 600 * 4);
    }

    #[test]
    fn test_wild_config_is_clamped_before_play() {
        let cfg = GameConfig {
            wander_turn_chance: 1.5,
            collision_radius: -1.0,
            master_volume: 4.0,
            ..Default::default()
        };
        let mut game = Game::new(cfg, 42);
        assert_eq!(game.config().wander_turn_chance, 1.0);
        assert_eq!(game.config().master_volume, 1.0);
        assert!(game.config().collision_radius > 0.0);
        // Enemy wander draws with the clamped chance every frame
        for i in 0..300 {
            game.frame(i as f64 * 16.0);
        }
        assert!(game.state().elapsed > 0.0);
    }

    #[test]
    fn test_volume_and_mute_reach_audio() {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let mut game = corridor_game(&calls);
        assert_eq!(calls.borrow().volume, Some(GameConfig::default().master_volume));
        assert!(!game.is_muted());

        assert!(game.toggle_mute());
        assert_eq!(calls.borrow().muted, Some(true));
        assert!(!game.toggle_mute());
        assert_eq!(calls.borrow().muted, Some(false));
    }

    #[test]
    fn test_player_starts_on_floor() {
        let game = Game::new(GameConfig::default(), 31337);
        let cell = game.state().player_cell();
        assert!(!game.state().grid.is_wall(cell.x, cell.y));
        assert_eq!(game.state().player.pos, cell_center(cell));
    }
}
