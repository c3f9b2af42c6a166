//! Dread Maze entry point
//!
//! In the browser this is a thin host: canvas blit, input wiring and the
//! animation loop. Natively it steps a session headlessly from a seed.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_host {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::{Clamped, JsCast};
    use web_sys::{
        CanvasRenderingContext2d, Document, HtmlCanvasElement, ImageData, KeyboardEvent,
        PointerEvent, TouchEvent,
    };

    use dread_maze::audio::AmbientAudio;
    use dread_maze::sim::{GameEvent, GamePhase};
    use dread_maze::{Game, GameConfig, QualityPreset};

    /// Look speed for the arrow keys (drag pixels per second)
    const KEY_TURN_RATE: f32 = 420.0;
    /// Joystick travel (CSS pixels) for a full deflection
    const JOYSTICK_RADIUS: f32 = 60.0;

    #[derive(Default)]
    struct HeldKeys {
        forward: bool,
        back: bool,
        left: bool,
        right: bool,
        turn_left: bool,
        turn_right: bool,
    }

    impl HeldKeys {
        fn axis(&self) -> (f32, f32) {
            let x = self.right as i32 - self.left as i32;
            let y = self.forward as i32 - self.back as i32;
            (x as f32, y as f32)
        }

        fn turn(&self) -> f32 {
            (self.turn_right as i32 - self.turn_left as i32) as f32
        }
    }

    /// Active on-screen stick (left half of the canvas)
    struct Joystick {
        touch_id: i32,
        origin: (f32, f32),
    }

    struct Host {
        game: Game,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        document: Document,
        keys: HeldKeys,
        joystick: Option<Joystick>,
        /// Touch id and last x of the look finger
        look_touch: Option<(i32, f32)>,
        /// Last x of a mouse/pen drag
        drag_x: Option<f32>,
        last_frame: Option<f64>,
        last_status: String,
        last_phase: GamePhase,
    }

    impl Host {
        /// Match the framebuffer to the canvas' on-screen size
        fn resize(&mut self) {
            let w = self.canvas.client_width().max(1) as u32;
            let h = self.canvas.client_height().max(1) as u32;
            self.game.resize(w, h);
            let fb = self.game.framebuffer();
            if self.canvas.width() != fb.width || self.canvas.height() != fb.height {
                self.canvas.set_width(fb.width);
                self.canvas.set_height(fb.height);
            }
        }

        fn apply_keys(&mut self, frame_ms: f64) {
            // The stick owns movement while a finger is on it
            if self.joystick.is_none() {
                let (x, y) = self.keys.axis();
                self.game.set_move(x, y);
            }
            let turn = self.keys.turn();
            if turn != 0.0 {
                self.game
                    .add_look(turn * KEY_TURN_RATE * (frame_ms / 1000.0) as f32);
            }
        }

        fn blit(&self) -> Result<(), JsValue> {
            let fb = self.game.framebuffer();
            let image =
                ImageData::new_with_u8_clamped_array_and_sh(Clamped(fb.as_bytes()), fb.width, fb.height)?;
            self.ctx.put_image_data(&image, 0.0, 0.0)
        }

        fn update_hud(&mut self) {
            let status = self.game.status().to_string();
            if status != self.last_status {
                if let Some(el) = self.document.get_element_by_id("status") {
                    el.set_text_content(Some(&status));
                }
                self.last_status = status;
            }

            let phase = self.game.phase();
            if phase == self.last_phase {
                return;
            }
            self.last_phase = phase;

            let Some(overlay) = self.document.get_element_by_id("overlay") else {
                return;
            };
            let (title, detail) = match phase {
                GamePhase::Running => {
                    let _ = overlay.class_list().add_1("hidden");
                    return;
                }
                GamePhase::Paused => ("Paused".to_string(), "Press Esc or tap to resume".to_string()),
                GamePhase::Won | GamePhase::Lost => {
                    let summary = self.game.summary();
                    let title = self.game.status().to_string();
                    (title, summary.headline())
                }
            };
            if let Some(el) = self.document.get_element_by_id("overlay-title") {
                el.set_text_content(Some(&title));
            }
            if let Some(el) = self.document.get_element_by_id("overlay-detail") {
                el.set_text_content(Some(&detail));
            }
            let _ = overlay.class_list().remove_1("hidden");
        }

        fn restart(&mut self) {
            self.keys = HeldKeys::default();
            self.joystick = None;
            self.look_touch = None;
            self.drag_x = None;
            self.game.set_move(0.0, 0.0);
            self.game.start_new(None);
            self.game.resume_audio();
        }
    }

    /// Value of `name=` in the page URL query
    fn url_param(name: &str) -> Option<String> {
        let search = web_sys::window()?.location().search().ok()?;
        search
            .trim_start_matches('?')
            .split('&')
            .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
            .map(str::to_owned)
    }

    /// Optional `?seed=N`
    fn url_seed() -> Option<u32> {
        url_param("seed")?.parse().ok()
    }

    /// Optional `?quality=low|medium|high`
    fn url_quality() -> Option<QualityPreset> {
        let value = url_param("quality")?;
        let quality = QualityPreset::from_str(&value);
        if quality.is_none() {
            log::warn!("Unknown quality '{}', keeping the configured preset", value);
        }
        quality
    }

    /// Optional `<script id="config" type="application/json">` block
    fn page_config(document: &Document) -> GameConfig {
        let Some(text) = document
            .get_element_by_id("config")
            .and_then(|el| el.text_content())
        else {
            return GameConfig::default();
        };
        match GameConfig::from_json(&text) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::error!("Invalid config block, using defaults: {}", e);
                GameConfig::default()
            }
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Dread Maze starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no #canvas element")?
            .dyn_into()?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("2d context unavailable")?
            .dyn_into()?;
        ctx.set_image_smoothing_enabled(false);

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.class_list().add_1("hidden");
        }

        let cfg = page_config(&document);
        let seed = url_seed().unwrap_or(js_sys::Date::now() as u64 as u32);
        let mut game = Game::with_audio(cfg, seed, Box::new(AmbientAudio::new()));
        if let Some(quality) = url_quality() {
            game.set_quality(quality);
        }
        log::info!("Session started with seed {}", seed);

        let host = Rc::new(RefCell::new(Host {
            game,
            canvas: canvas.clone(),
            ctx,
            document: document.clone(),
            keys: HeldKeys::default(),
            joystick: None,
            look_touch: None,
            drag_x: None,
            last_frame: None,
            last_status: String::new(),
            last_phase: GamePhase::Running,
        }));
        host.borrow_mut().resize();

        setup_keyboard(host.clone());
        setup_pointer(&canvas, host.clone());
        setup_touch(&canvas, host.clone());
        setup_buttons(&document, host.clone());
        setup_resize(host.clone());
        setup_auto_pause(host.clone());

        request_animation_frame(host);

        log::info!("Dread Maze running!");
        Ok(())
    }

    fn setup_keyboard(host: Rc<RefCell<Host>>) {
        let window = web_sys::window().unwrap();

        {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut h = host.borrow_mut();
                h.game.resume_audio();
                match event.key().as_str() {
                    "w" | "W" | "ArrowUp" => h.keys.forward = true,
                    "s" | "S" | "ArrowDown" => h.keys.back = true,
                    "a" | "A" => h.keys.left = true,
                    "d" | "D" => h.keys.right = true,
                    "ArrowLeft" | "q" | "Q" => h.keys.turn_left = true,
                    "ArrowRight" | "e" | "E" => h.keys.turn_right = true,
                    "Escape" | "p" | "P" => h.game.toggle_pause(),
                    "m" | "M" => {
                        h.game.toggle_mute();
                    }
                    "Enter" | "r" | "R" => {
                        if matches!(h.game.phase(), GamePhase::Won | GamePhase::Lost) {
                            h.restart();
                        }
                    }
                    _ => return,
                }
                event.prevent_default();
            });
            let _ =
                window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut h = host.borrow_mut();
                match event.key().as_str() {
                    "w" | "W" | "ArrowUp" => h.keys.forward = false,
                    "s" | "S" | "ArrowDown" => h.keys.back = false,
                    "a" | "A" => h.keys.left = false,
                    "d" | "D" => h.keys.right = false,
                    "ArrowLeft" | "q" | "Q" => h.keys.turn_left = false,
                    "ArrowRight" | "e" | "E" => h.keys.turn_right = false,
                    _ => {}
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Mouse and pen drag to look; touches are handled separately
    fn setup_pointer(canvas: &HtmlCanvasElement, host: Rc<RefCell<Host>>) {
        {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                if event.pointer_type() == "touch" {
                    return;
                }
                let mut h = host.borrow_mut();
                h.game.resume_audio();
                h.drag_x = Some(event.client_x() as f32);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut h = host.borrow_mut();
                if let Some(last) = h.drag_x {
                    let x = event.client_x() as f32;
                    h.game.add_look(x - last);
                    h.drag_x = Some(x);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        for name in ["pointerup", "pointerleave", "pointercancel"] {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                host.borrow_mut().drag_x = None;
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Left half: floating joystick. Right half: look drag.
    fn setup_touch(canvas: &HtmlCanvasElement, host: Rc<RefCell<Host>>) {
        {
            let host = host.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut h = host.borrow_mut();
                h.game.resume_audio();
                let rect = canvas_clone.get_bounding_client_rect();
                let mid = (rect.left() + rect.width() / 2.0) as f32;
                let touches = event.changed_touches();
                for i in 0..touches.length() {
                    let Some(touch) = touches.get(i) else { continue };
                    let (x, y) = (touch.client_x() as f32, touch.client_y() as f32);
                    if x < mid && h.joystick.is_none() {
                        h.joystick = Some(Joystick {
                            touch_id: touch.identifier(),
                            origin: (x, y),
                        });
                    } else if h.look_touch.is_none() {
                        h.look_touch = Some((touch.identifier(), x));
                    }
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut guard = host.borrow_mut();
                let h = &mut *guard;
                let touches = event.changed_touches();
                for i in 0..touches.length() {
                    let Some(touch) = touches.get(i) else { continue };
                    let id = touch.identifier();
                    let (x, y) = (touch.client_x() as f32, touch.client_y() as f32);
                    if let Some(stick) = h.joystick.as_ref().filter(|s| s.touch_id == id) {
                        let vx = (x - stick.origin.0) / JOYSTICK_RADIUS;
                        // Screen Y grows downward; pushing up walks forward
                        let vy = (stick.origin.1 - y) / JOYSTICK_RADIUS;
                        h.game.set_move(vx.clamp(-1.0, 1.0), vy.clamp(-1.0, 1.0));
                    } else if let Some((look_id, last)) = h.look_touch
                        && look_id == id
                    {
                        h.game.add_look(x - last);
                        h.look_touch = Some((id, x));
                    }
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        for name in ["touchend", "touchcancel"] {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut h = host.borrow_mut();
                let touches = event.changed_touches();
                for i in 0..touches.length() {
                    let Some(touch) = touches.get(i) else { continue };
                    let id = touch.identifier();
                    if h.joystick.as_ref().is_some_and(|s| s.touch_id == id) {
                        h.joystick = None;
                        h.game.set_move(0.0, 0.0);
                    }
                    if h.look_touch.is_some_and(|(look_id, _)| look_id == id) {
                        h.look_touch = None;
                    }
                }
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(document: &Document, host: Rc<RefCell<Host>>) {
        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                host.borrow_mut().restart();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("pause-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut h = host.borrow_mut();
                h.game.toggle_pause();
                h.game.resume_audio();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(host: Rc<RefCell<Host>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            host.borrow_mut().resize();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_auto_pause(host: Rc<RefCell<Host>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // Visibility change (tab switch, minimize)
        {
            let host = host.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut h = host.borrow_mut();
                    if h.game.state().is_running() {
                        h.game.auto_pause();
                        log::info!("Auto-paused (tab hidden)");
                    }
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut h = host.borrow_mut();
                h.keys = HeldKeys::default();
                if h.game.state().is_running() {
                    h.game.auto_pause();
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(host: Rc<RefCell<Host>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(host, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(host: Rc<RefCell<Host>>, time: f64) {
        {
            let mut h = host.borrow_mut();

            let frame_ms = h.last_frame.map_or(0.0, |prev| time - prev);
            h.last_frame = Some(time);
            h.apply_keys(frame_ms);

            let events = h.game.frame(time);
            for event in &events {
                match event {
                    GameEvent::KeyCollected { total, .. } => {
                        log::info!("Picked up key {}", total)
                    }
                    GameEvent::ExitLocked { missing } => {
                        log::info!("Exit locked, {} missing", missing)
                    }
                    GameEvent::Won | GameEvent::Caught => {
                        h.keys = HeldKeys::default();
                        h.joystick = None;
                    }
                    _ => {}
                }
            }

            if let Err(e) = h.blit() {
                log::error!("Blit failed: {:?}", e);
            }
            h.update_hud();
        }

        request_animation_frame(host);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = web_host::run() {
        log::error!("Failed to start: {:?}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless stepper: `dread-maze [seed] [config.json]`
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use dread_maze::sim::{GameEvent, GamePhase};
    use dread_maze::{Game, GameConfig};
    use std::f32::consts::FRAC_PI_2;

    /// Simulated frame length (ms)
    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Give up after this many simulated frames
    const MAX_FRAMES: u32 = 60 * 180;

    env_logger::init();
    log::info!("Dread Maze (native) starting...");

    let args: Vec<String> = std::env::args().collect();
    let seed = args
        .get(1)
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(0x5EED);
    let cfg = match args.get(2) {
        Some(path) => load_config(path),
        None => GameConfig::default(),
    };

    let turn_px = FRAC_PI_2 / cfg.look_sensitivity;
    let mut game = Game::new(cfg, seed);
    println!("{}", game.state().grid.to_ascii());

    // Autopilot: walk forward, turn right when stuck
    game.set_move(0.0, 1.0);
    let mut now = 0.0;
    let mut footsteps = 0u32;
    for _ in 0..MAX_FRAMES {
        let before = game.state().player.pos;
        now += FRAME_MS;
        for event in game.frame(now) {
            match event {
                GameEvent::Footstep => footsteps += 1,
                other => log::info!("{:?}", other),
            }
        }
        if game.phase() != GamePhase::Running {
            break;
        }
        if game.state().player.pos.distance(before) < 1e-4 {
            game.add_look(turn_px);
        }
    }

    let summary = game.summary();
    log::info!("{} ({} footsteps)", summary.headline(), footsteps);
    match serde_json::to_string(&summary) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Could not serialize summary: {}", e),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn load_config(path: &str) -> dread_maze::GameConfig {
    use dread_maze::GameConfig;

    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            log::error!("Could not read {}: {} - using defaults", path, e);
            return GameConfig::default();
        }
    };
    match GameConfig::from_json(&text) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::error!("Invalid config {}: {} - using defaults", path, e);
            GameConfig::default()
        }
    }
}
