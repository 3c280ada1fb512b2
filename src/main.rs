//! Hidden Objects entry point
//!
//! On the web: binds the host page's DOM to the gameplay core and owns the
//! 1-second interval. Natively: plays one scripted round headless.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, MouseEvent};

    use hidden_objects::sim::{
        Game, GameEvent, GameStatus, Intent, LevelCatalog, TimerToken, TimerUrgency,
    };
    use hidden_objects::{Settings, format_time, normalize_click};

    /// Page-side state around the game
    struct App {
        game: Game,
        settings: Settings,
        /// Handle of the running `setInterval`
        interval: Option<i32>,
        /// Shared tick callback, created once
        tick_fn: Option<js_sys::Function>,
        level_buttons: Vec<(Element, f64)>,
    }

    impl App {
        fn new(game: Game, settings: Settings) -> Self {
            Self {
                game,
                settings,
                interval: None,
                tick_fn: None,
                level_buttons: Vec::new(),
            }
        }

        /// Apply an intent, then sync timer and page
        fn dispatch(&mut self, intent: Intent) {
            if let Err(e) = self.game.apply(intent) {
                log::warn!("{}", e);
            }
            self.process_events();
            self.update_page();
        }

        fn process_events(&mut self) {
            for event in self.game.drain_events() {
                match event {
                    GameEvent::TimerStarted(token) => self.schedule_interval(token),
                    GameEvent::TimerStopped => self.cancel_interval(),
                    GameEvent::ObjectFound { name, points, .. } => {
                        self.toast("Object Found!", &format!("{} +{} points", name, points));
                    }
                    GameEvent::LevelCompleted(stats) => {
                        self.toast(
                            "Level Complete!",
                            &format!("You found all objects! +{} time bonus", stats.time_bonus),
                        );
                    }
                    GameEvent::TimeUp(stats) => {
                        self.toast(
                            "Time's up!",
                            &format!("{} / {} found", stats.objects_found, stats.total_objects),
                        );
                    }
                    GameEvent::LevelStarted { level, name } => {
                        log::info!("Playing level {}: {}", level, name);
                    }
                    GameEvent::Paused | GameEvent::Resumed | GameEvent::ReturnedToMenu => {}
                }
            }
        }

        fn schedule_interval(&mut self, token: TimerToken) {
            self.cancel_interval();
            let Some(window) = web_sys::window() else {
                return;
            };
            let Some(tick_fn) = self.tick_fn.as_ref() else {
                log::error!("Tick callback not installed");
                return;
            };
            match window.set_interval_with_callback_and_timeout_and_arguments_1(
                tick_fn,
                self.game.rules().tick_interval_ms as i32,
                &JsValue::from_f64(token.as_u64() as f64),
            ) {
                Ok(handle) => self.interval = Some(handle),
                Err(e) => log::error!("setInterval failed: {:?}", e),
            }
        }

        fn cancel_interval(&mut self) {
            if let Some(handle) = self.interval.take() {
                if let Some(window) = web_sys::window() {
                    window.clear_interval_with_handle(handle);
                }
            }
        }

        fn toast(&self, title: &str, body: &str) {
            log::info!("{}: {}", title, body);
            if !self.settings.show_toasts {
                return;
            }
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            set_text(&document, "toast-title", title);
            set_text(&document, "toast-body", body);
            set_hidden(&document, "toast", false);

            let hide = Closure::once_into_js(move || {
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    set_hidden(&document, "toast", true);
                }
            });
            if let Some(window) = web_sys::window() {
                let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                    hide.unchecked_ref(),
                    2000,
                );
            }
        }

        /// Push session state into the page
        fn update_page(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let session = self.game.session();
            let status = session.status();

            set_hidden(&document, "menu-screen", status != GameStatus::Menu);
            set_hidden(&document, "game-screen", status == GameStatus::Menu);
            set_hidden(&document, "pause-overlay", status != GameStatus::Paused);
            set_hidden(&document, "complete-screen", !status.is_concluded());
            set_text(
                &document,
                "pause-btn",
                if status == GameStatus::Paused { "Resume" } else { "Pause" },
            );

            // HUD
            set_text(&document, "hud-level", &session.current_level().to_string());
            set_text(&document, "hud-score", &session.score().to_string());
            set_text(&document, "hud-time", &format_time(session.time_left()));
            if let Some(el) = document.get_element_by_id("hud-time") {
                let urgency = TimerUrgency::for_remaining(session.time_left());
                let _ = el.set_attribute("class", urgency.css_class());
            }
            if let Some(level) = self.game.level() {
                set_text(
                    &document,
                    "hud-found",
                    &format!("{} / {}", session.found_objects().len(), level.objects.len()),
                );
                set_text(&document, "level-name", &level.name);
                if let Some(scene) = document.get_element_by_id("scene") {
                    let _ = scene.set_attribute("data-background", &level.background);
                }
            }

            // Menu
            set_text(&document, "menu-level", &session.current_level().to_string());
            set_text(&document, "menu-score", &session.score().to_string());
            for (button, raw) in &self.level_buttons {
                let number = *raw as u32;
                let classes = button.class_list();
                let _ = classes.toggle_with_force("locked", !self.game.is_level_unlocked(number));
                let _ = classes.toggle_with_force("current", number == session.current_level());
            }

            // Level summary
            if let Some(stats) = self.game.stats() {
                let title = if stats.is_success() { "Level Complete!" } else { "Level Failed" };
                set_text(&document, "stats-title", title);
                set_text(&document, "stats-score", &stats.score.to_string());
                set_text(&document, "stats-time", &format_time(stats.total_time));
                set_text(
                    &document,
                    "stats-found",
                    &format!("{} / {}", stats.objects_found, stats.total_objects),
                );
                set_text(&document, "stats-bonus", &format!("+{}", stats.time_bonus));
                set_hidden(&document, "stats-bonus", stats.time_bonus == 0);
                set_hidden(
                    &document,
                    "next-btn",
                    !stats.is_success() || session.is_last_level(),
                );
                set_hidden(&document, "all-levels-done", !session.is_last_level());
            }
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", hidden);
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Hidden Objects starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let game = Game::with_parts(
            LevelCatalog::default(),
            settings.rules.clone(),
            Pcg32::seed_from_u64(seed),
        )
        .unwrap_or_else(|e| {
            log::warn!("Falling back to default rules: {}", e);
            Game::new(seed)
        });
        log::info!("Game initialized with seed: {}", seed);

        let app = Rc::new(RefCell::new(App::new(game, settings)));

        install_tick_callback(app.clone());
        setup_scene_click(&document, app.clone());
        setup_buttons(&document, app.clone());
        setup_level_select(&document, app.clone());
        setup_auto_pause(&document, app.clone());

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }
        app.borrow().update_page();

        log::info!("Hidden Objects running!");
    }

    fn install_tick_callback(app: Rc<RefCell<App>>) {
        let shared = app.clone();
        let closure = Closure::<dyn FnMut(JsValue)>::new(move |token: JsValue| {
            let Some(raw) = token.as_f64() else {
                return;
            };
            shared
                .borrow_mut()
                .dispatch(Intent::Tick(TimerToken::from_u64(raw as u64)));
        });
        let tick_fn: js_sys::Function =
            closure.as_ref().unchecked_ref::<js_sys::Function>().clone();
        closure.forget();
        app.borrow_mut().tick_fn = Some(tick_fn);
    }

    fn setup_scene_click(document: &Document, app: Rc<RefCell<App>>) {
        let Some(scene) = document.get_element_by_id("scene") else {
            log::error!("No #scene element");
            return;
        };
        let target = scene.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            let rect = target.get_bounding_client_rect();
            let client = Vec2::new(event.client_x() as f32, event.client_y() as f32);
            let bounds = (
                rect.left() as f32,
                rect.top() as f32,
                rect.width() as f32,
                rect.height() as f32,
            );
            if let Some(point) = normalize_click(client, bounds) {
                app.borrow_mut().dispatch(Intent::Click(point));
            }
        });
        let _ = scene.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn bind_button(document: &Document, id: &str, app: Rc<RefCell<App>>, intent: Intent) {
        if let Some(btn) = document.get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                app.borrow_mut().dispatch(intent.clone());
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(document: &Document, app: Rc<RefCell<App>>) {
        bind_button(document, "continue-btn", app.clone(), Intent::Continue);
        bind_button(document, "restart-btn", app.clone(), Intent::SelectLevel(1.0));
        bind_button(document, "pause-btn", app.clone(), Intent::TogglePause);
        bind_button(document, "resume-btn", app.clone(), Intent::TogglePause);
        bind_button(document, "home-btn", app.clone(), Intent::Home);
        bind_button(document, "menu-btn", app.clone(), Intent::Home);
        bind_button(document, "retry-btn", app.clone(), Intent::Retry);
        bind_button(document, "next-btn", app, Intent::NextLevel);
    }

    fn setup_level_select(document: &Document, app: Rc<RefCell<App>>) {
        let Ok(nodes) = document.query_selector_all(".level-btn") else {
            return;
        };
        let mut buttons = Vec::new();
        for i in 0..nodes.length() {
            let Some(el) = nodes.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let raw = el
                .get_attribute("data-level")
                .and_then(|s| s.trim().parse::<f64>().ok())
                .unwrap_or(f64::NAN);

            let handler_app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                handler_app.borrow_mut().dispatch(Intent::SelectLevel(raw));
            });
            let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
            buttons.push((el, raw));
        }
        log::info!("Bound {} level buttons", buttons.len());
        app.borrow_mut().level_buttons = buttons;
    }

    fn setup_auto_pause(document: &Document, app: Rc<RefCell<App>>) {
        if !app.borrow().settings.auto_pause_on_blur {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let app = app.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut a = app.borrow_mut();
                    if a.game.status() == GameStatus::Playing {
                        log::info!("Auto-paused (tab hidden)");
                        a.dispatch(Intent::TogglePause);
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
                let mut a = app.borrow_mut();
                if a.game.status() == GameStatus::Playing {
                    log::info!("Auto-paused (window blur)");
                    a.dispatch(Intent::TogglePause);
                }
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Hidden Objects (native) starting...");
    log::info!("The browser build is the real game - run with `trunk serve` for the web version");

    let settings_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let settings = hidden_objects::Settings::load_from(settings_path.as_deref());

    if let Err(e) = headless_round(&settings) {
        log::error!("Headless round failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Play level 1 by clicking every object's center, ten seconds apart
#[cfg(not(target_arch = "wasm32"))]
fn headless_round(settings: &hidden_objects::Settings) -> Result<(), hidden_objects::GameError> {
    use hidden_objects::format_time;
    use hidden_objects::sim::{Game, GameObject, Intent, LevelCatalog};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let mut game = Game::with_parts(
        LevelCatalog::default(),
        settings.rules.clone(),
        Pcg32::seed_from_u64(seed),
    )?;
    log::info!("Game initialized with seed: {}", seed);

    game.apply(Intent::SelectLevel(1.0))?;
    let centers: Vec<glam::Vec2> = game
        .level()
        .map(|level| level.objects.iter().map(GameObject::center).collect())
        .unwrap_or_default();

    for center in centers {
        for _ in 0..10 {
            if let Some(token) = game.timer_token() {
                game.apply(Intent::Tick(token))?;
            }
        }
        if let Some(hit) = game.click(center)? {
            println!("Found {} (+{} points)", hit.name, hit.points);
        }
    }

    match game.stats() {
        Some(stats) => {
            println!(
                "Level {} {}: score {} (time bonus {}), {} / {} found in {}",
                stats.level,
                if stats.is_success() { "complete" } else { "failed" },
                stats.score,
                stats.time_bonus,
                stats.objects_found,
                stats.total_objects,
                format_time(stats.total_time)
            );
        }
        None => println!("Level still running with {}s left", game.session().time_left()),
    }
    Ok(())
}
