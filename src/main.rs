//! BounceTone entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent};

    use bounce_tone::audio::{Mixer, ToneBank, WebAudio};
    use bounce_tone::persistence::LocalStorage;
    use bounce_tone::platform::{Clock, FixedStep, InputState, PerformanceClock};
    use bounce_tone::renderer::{RenderState, build_scene};
    use bounce_tone::sim::{Canvas, Difficulty, RunPhase};
    use bounce_tone::{
        ClearReport, QualityPreset, SessionController, SessionEvent, Settings, Tuning,
    };

    /// Keyboard listeners that live exactly as long as a run
    struct KeyListeners {
        keydown: Closure<dyn FnMut(KeyboardEvent)>,
        keyup: Closure<dyn FnMut(KeyboardEvent)>,
    }

    impl KeyListeners {
        fn attach(input: Rc<RefCell<InputState>>) -> Option<Self> {
            let window = web_sys::window()?;

            let down_input = input.clone();
            let keydown = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if down_input.borrow_mut().key_down(&event.code(), event.repeat()) {
                    event.prevent_default();
                }
            });
            let keyup = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if input.borrow_mut().key_up(&event.code()) {
                    event.prevent_default();
                }
            });

            let _ = window
                .add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref());
            let _ =
                window.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref());
            Some(Self { keydown, keyup })
        }

        fn detach(self) {
            if let Some(window) = web_sys::window() {
                let _ = window.remove_event_listener_with_callback(
                    "keydown",
                    self.keydown.as_ref().unchecked_ref(),
                );
                let _ = window.remove_event_listener_with_callback(
                    "keyup",
                    self.keyup.as_ref().unchecked_ref(),
                );
            }
        }
    }

    /// Game instance holding all state
    struct Game {
        canvas: HtmlCanvasElement,
        session: SessionController<LocalStorage>,
        render_state: Option<RenderState>,
        audio: WebAudio,
        clock: PerformanceClock,
        fixed_step: FixedStep,
        last_time: f64,
        input: Rc<RefCell<InputState>>,
        listeners: Option<KeyListeners>,
    }

    impl Game {
        fn new(canvas: HtmlCanvasElement, viewport: Canvas) -> Self {
            let storage = LocalStorage::new();
            let settings = Settings::load(&storage);
            let tuning = Tuning::load(&storage);
            let mixer = Mixer::from_settings(&settings);
            Self {
                canvas,
                session: SessionController::new(settings, tuning, viewport, storage),
                render_state: None,
                audio: WebAudio::new(ToneBank::standard(), mixer),
                clock: PerformanceClock::new(),
                fixed_step: FixedStep::new(),
                last_time: 0.0,
                input: Rc::new(RefCell::new(InputState::default())),
                listeners: None,
            }
        }

        /// Teardown first, then build the new run and hook up the keyboard
        fn start(&mut self, difficulty: Difficulty) {
            if self.session.reload_pending() {
                log::info!("Reload pending, ignoring start");
                return;
            }
            self.stop_input();
            let now = self.clock.now_ms();
            let seed = js_sys::Date::now() as u64;
            match self.session.start(difficulty, seed, now) {
                Ok(_) => {
                    self.fixed_step.reset();
                    self.audio.resume();
                    self.listeners = KeyListeners::attach(self.input.clone());
                    show_menu(false);
                    show_clear(None);
                }
                Err(e) => log::error!("Could not start {} run: {}", difficulty, e),
            }
        }

        fn stop_input(&mut self) {
            if let Some(listeners) = self.listeners.take() {
                listeners.detach();
            }
            self.input.borrow_mut().clear();
        }

        fn back_to_menu(&mut self) {
            self.stop_input();
            self.session.reset();
            show_clear(None);
            show_menu(true);
        }

        fn change_settings(&mut self, change: impl FnOnce(&mut Settings)) {
            if let Err(e) = self.session.update_settings(change) {
                log::warn!("Settings not saved: {}", e);
            }
            self.audio.mixer = Mixer::from_settings(self.session.settings());
            update_settings_ui(self.session.settings());
        }

        /// Match the backing store to the canvas' CSS size
        fn resize(&mut self) {
            let Some(window) = web_sys::window() else { return };
            let (width, height, viewport) = fit_canvas(&window, &self.canvas);
            if let Some(ref mut render_state) = self.render_state {
                render_state.resize(width, height, viewport);
            }
            self.session.set_canvas(Canvas::new(viewport.0, viewport.1));
            if let Some(state) = self.session.state_mut() {
                state.camera.viewport = glam::Vec2::new(viewport.0, viewport.1);
            }
        }

        fn handle(&mut self, event: SessionEvent) {
            match event {
                SessionEvent::Cleared(report) => {
                    self.stop_input();
                    show_clear(Some(&report));
                }
                SessionEvent::Failed => self.stop_input(),
                SessionEvent::Reloaded => {
                    if self.session.phase() == RunPhase::Idle {
                        show_menu(true);
                    } else {
                        self.listeners = KeyListeners::attach(self.input.clone());
                    }
                }
                SessionEvent::Started { .. } => {}
            }
        }

        /// Run simulation steps for this frame
        fn update(&mut self, dt: f32) {
            let now = self.clock.now_ms();
            let steps = self.fixed_step.advance(dt);
            for _ in 0..steps {
                let input = self.input.borrow_mut().snapshot();
                for event in self.session.step(&input, now) {
                    self.handle(event);
                }
            }
            if let Some(event) = self.session.poll(now) {
                self.handle(event);
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            let now = self.clock.now_ms();
            self.session.render(now, &mut self.audio);

            let Some(state) = self.session.state() else {
                return;
            };
            let frame = build_scene(state);
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&frame) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        let (w, h) = render_state.size;
                        let viewport = render_state.viewport;
                        render_state.resize(w, h, viewport);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = document() else { return };
            let now = self.clock.now_ms();
            if let Some(el) = document.query_selector("#hud-time .hud-value").ok().flatten() {
                let text = match self.session.elapsed_ms(now) {
                    Some(ms) => format!("{:.1}", ms / 1000.0),
                    None => "0.0".to_string(),
                };
                el.set_text_content(Some(&text));
            }
            if let Some(el) = document.get_element_by_id("hud") {
                let class = if self.session.phase() == RunPhase::Idle {
                    "hidden"
                } else {
                    ""
                };
                let _ = el.set_attribute("class", class);
            }
        }
    }

    /// Size the backing store in device pixels; the game works in CSS pixels
    fn fit_canvas(
        window: &web_sys::Window,
        canvas: &HtmlCanvasElement,
    ) -> (u32, u32, (f32, f32)) {
        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width().max(1);
        let client_h = canvas.client_height().max(1);
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        (width, height, (client_w as f32, client_h as f32))
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_visible(id: &str, visible: bool) {
        if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    fn set_text(id: &str, text: &str) {
        if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
            el.set_text_content(Some(text));
        }
    }

    fn update_settings_ui(settings: &Settings) {
        set_text("mute-btn", if settings.muted { "Unmute" } else { "Mute" });
        set_text(
            "restart-btn",
            if settings.restart_on_fail {
                "Retry on fall: on"
            } else {
                "Retry on fall: off"
            },
        );
        set_text("quality-label", settings.quality.as_str());
    }

    fn show_menu(visible: bool) {
        set_visible("menu", visible);
    }

    fn show_clear(report: Option<&ClearReport>) {
        let Some(report) = report else {
            set_visible("clear-overlay", false);
            return;
        };
        set_text("clear-time", &format!("{:.2}s", report.elapsed_ms / 1000.0));
        set_text("clear-score", &report.score.to_string());
        set_text("clear-grade", report.grade.as_str());
        set_text("clear-best", &report.best.to_string());
        set_visible("clear-record", report.new_record);
        set_visible("clear-overlay", true);
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("BounceTone starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let (width, height, viewport) = fit_canvas(&window, &canvas);
        let game = Rc::new(RefCell::new(Game::new(
            canvas.clone(),
            Canvas::new(viewport.0, viewport.1),
        )));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => {
                let adapter = instance
                    .request_adapter(&wgpu::RequestAdapterOptions {
                        power_preference: wgpu::PowerPreference::HighPerformance,
                        compatible_surface: Some(&surface),
                        force_fallback_adapter: false,
                    })
                    .await;
                match adapter {
                    Ok(adapter) => {
                        log::info!("Using adapter: {:?}", adapter.get_info().name);
                        match RenderState::new(surface, &adapter, width, height, viewport).await {
                            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
                            Err(e) => log::error!("Failed to create device: {}", e),
                        }
                    }
                    Err(e) => log::error!("Failed to get adapter: {}", e),
                }
            }
            Err(e) => log::error!("Failed to create surface: {}", e),
        }

        setup_menu(game.clone());
        setup_reset_button(game.clone());
        setup_blur_release(game.clone());
        setup_settings(game.clone());
        setup_resize(game.clone());
        update_settings_ui(game.borrow().session.settings());
        show_menu(true);

        request_animation_frame(game);

        log::info!("BounceTone running!");
    }

    fn setup_menu(game: Rc<RefCell<Game>>) {
        let Some(document) = document() else { return };
        for difficulty in Difficulty::ALL {
            let id = format!("{}-btn", difficulty.as_str());
            let Some(btn) = document.get_element_by_id(&id) else {
                log::warn!("Missing menu button #{}", id);
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().start(difficulty);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_reset_button(game: Rc<RefCell<Game>>) {
        let Some(document) = document() else { return };
        for id in ["reset-btn", "clear-menu-btn"] {
            if let Some(btn) = document.get_element_by_id(id) {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                    game.borrow_mut().back_to_menu();
                });
                let _ =
                    btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    fn on_click(id: &str, mut handler: impl FnMut() + 'static) {
        let Some(btn) = document().and_then(|d| d.get_element_by_id(id)) else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| handler());
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_settings(game: Rc<RefCell<Game>>) {
        let g = game.clone();
        on_click("mute-btn", move || {
            g.borrow_mut().change_settings(|s| s.muted = !s.muted);
        });
        let g = game.clone();
        on_click("restart-btn", move || {
            g.borrow_mut()
                .change_settings(|s| s.restart_on_fail = !s.restart_on_fail);
        });
        let g = game.clone();
        on_click("clear-records-btn", move || {
            g.borrow_mut().session.clear_best_scores();
        });

        // Quality buttons carry their preset in data-quality
        let Some(document) = document() else { return };
        let Ok(buttons) = document.query_selector_all("[data-quality]") else {
            return;
        };
        for i in 0..buttons.length() {
            let Some(btn) = buttons.item(i).and_then(|n| n.dyn_into::<web_sys::Element>().ok())
            else {
                continue;
            };
            let Some(preset) = btn
                .get_attribute("data-quality")
                .and_then(|q| QualityPreset::parse(&q))
            else {
                log::warn!("Unknown quality preset on button");
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().change_settings(|s| s.apply_preset(preset));
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            game.borrow_mut().resize();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Release held keys when the window loses focus
    fn setup_blur_release(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            game.borrow().input.borrow_mut().clear();
        });
        let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                bounce_tone::consts::SIM_DT
            };
            g.last_time = time;

            g.update(dt);
            g.render();
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("BounceTone (native) starting...");
    log::info!("Native mode runs a headless autopilot; use `trunk serve` for the web version");

    let mut args = std::env::args().skip(1);
    let mode = args.next().unwrap_or_else(|| "easy".to_string());
    let seed = match args.next() {
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            log::warn!("Bad seed '{}' ({}), using 2024", raw, e);
            2024
        }),
        None => 2024,
    };

    // Optional tuning document, e.g. `bounce-tone hard 7 tuning.json`
    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(json) => match bounce_tone::Tuning::from_json(&json) {
                Ok(tuning) => tuning,
                Err(e) => {
                    log::error!("Invalid tuning in {}: {}", path, e);
                    std::process::exit(2);
                }
            },
            Err(e) => {
                log::error!("Could not read {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => bounce_tone::Tuning::default(),
    };

    if let Err(e) = headless::run(&mode, seed, tuning) {
        log::error!("{}", e);
        std::process::exit(2);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;

    use bounce_tone::audio::{RecordingAudio, ToneBank};
    use bounce_tone::consts::SIM_DT;
    use bounce_tone::persistence::MemoryStorage;
    use bounce_tone::platform::{Clock, ManualClock};
    use bounce_tone::sim::{Canvas, GameState, RunPhase, TickInput};
    use bounce_tone::{MapError, SessionController, SessionEvent, Settings, Tuning};

    /// Give up after two simulated minutes
    const MAX_TICKS: u32 = 60 * 120;

    /// Steer toward the goal, hopping whenever progress stalls
    fn autopilot(state: &GameState, tick: u32) -> TickInput {
        let (Some(player), Some(goal)) = (state.player_body(), state.goal_shape()) else {
            return TickInput::default();
        };
        let to_goal = goal.center - player.pos();
        let stalled = player.vel.x.abs() < 20.0;
        let goal_above = to_goal.y < -goal.height();
        TickInput {
            left: to_goal.x < -5.0,
            right: to_goal.x > 5.0,
            jump: tick % 20 == 0 && (stalled || goal_above),
        }
    }

    pub fn run(mode: &str, seed: u64, tuning: Tuning) -> Result<(), MapError> {
        let mut session = SessionController::new(
            Settings::default(),
            tuning,
            Canvas::new(1280.0, 720.0),
            MemoryStorage::new(),
        );
        let mut clock = ManualClock::new(0.0);
        let mut audio = RecordingAudio::new(ToneBank::standard());

        session.start_mode(mode, seed, clock.now_ms())?;
        if let Some(state) = session.state() {
            println!(
                "{} course '{}' with {} walls",
                state.difficulty,
                state.layout_name,
                state.walls.len()
            );
        }

        let mut outcome = None;
        for tick in 0..MAX_TICKS {
            let input = session
                .state()
                .map_or_else(TickInput::default, |s| autopilot(s, tick));
            clock.advance(SIM_DT as f64 * 1000.0);
            for event in session.step(&input, clock.now_ms()) {
                if matches!(event, SessionEvent::Cleared(_) | SessionEvent::Failed) {
                    outcome = Some(event);
                }
            }
            session.render(clock.now_ms(), &mut audio);
            if session.phase() != RunPhase::Running {
                break;
            }
        }

        match outcome {
            Some(SessionEvent::Cleared(report)) => println!(
                "Cleared in {:.2}s: score {} grade {}",
                report.elapsed_ms / 1000.0,
                report.score,
                report.grade
            ),
            Some(_) => println!("Fell out of the course"),
            None => {
                let pos = session
                    .state()
                    .and_then(|s| s.player_pos())
                    .unwrap_or(Vec2::ZERO);
                println!("Gave up at ({:.0}, {:.0})", pos.x, pos.y);
            }
        }
        println!("{} notes played", audio.played.len());
        Ok(())
    }
}
