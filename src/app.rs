// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::Path;
use std::time::{Duration, Instant};

use eframe::egui;
use log::{info, warn};
use poolbars_core::{
    Clock, FileVoteGuard, LocalClock, Secrets, StartupError, SupabaseClient, VoteLedger,
};

use crate::backend::{Backend, BackendEvent};
use crate::config::{self, AppConfig};
use crate::map::{streets_tiles, WalkersSurface};
use crate::state::{AppState, Notice};
use crate::ui::{self, popup::PopupView, PopupAction};

const TOAST_DURATION: Duration = Duration::from_secs(4);

#[derive(Debug)]
struct Toast {
    notice: Notice,
    expires: Instant,
}

pub struct PoolBarsApp {
    state: AppState<FileVoteGuard>,
    surface: WalkersSurface,
    backend: Backend,
    clock: LocalClock,
    show_list: bool,
    list_width: f32,
    register_bar_url: String,
    toasts: Vec<Toast>,
}

impl std::fmt::Debug for PoolBarsApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolBarsApp")
            .field("surface", &self.surface)
            .field("show_list", &self.show_list)
            .finish_non_exhaustive()
    }
}

impl PoolBarsApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: &AppConfig,
        secrets: &Secrets,
        data_dir: &Path,
        show_list: bool,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let ctx = cc.egui_ctx.clone();

        let store = SupabaseClient::new(config.supabase_config(secrets))?;
        let backend = Backend::spawn(store, ctx.clone())?;

        let tiles = streets_tiles(&secrets.mapbox_token, config.tile_cache_dir(), &ctx);
        let surface = WalkersSurface::new(tiles, config.home(), config.default_zoom);

        let voted = config::voted_path(data_dir);
        info!("Remembering votes in {}", voted.display());
        let ledger = VoteLedger::new(FileVoteGuard::open_or_empty(&voted));
        let clock = LocalClock;

        Ok(Self {
            state: AppState::new(ledger, clock.today()),
            surface,
            backend,
            clock,
            show_list,
            list_width: config.list_width,
            register_bar_url: config.register_bar_url.clone(),
            toasts: Vec::new(),
        })
    }

    fn toast(&mut self, notice: Notice) {
        self.toasts.push(Toast {
            notice,
            expires: Instant::now() + TOAST_DURATION,
        });
    }

    fn drain_backend(&mut self) {
        for event in self.backend.drain() {
            match event {
                BackendEvent::Loaded(snapshot) => {
                    self.state.apply_snapshot(snapshot, &mut self.surface);
                }
                BackendEvent::VoteFinished { pending, result } => {
                    let (_, notice) = self.state.finish_vote(pending, result);
                    self.toast(notice);
                }
            }
        }
    }

    fn handle_popup_action(&mut self, action: PopupAction) {
        match action {
            PopupAction::Close => self.state.close_popup(&mut self.surface),
            PopupAction::OpenUrl(url) => open_url(&url),
            PopupAction::Vote(name) => match self.state.start_vote(&name) {
                Ok(pending) => {
                    if let Err(pending) = self.backend.vote(pending) {
                        warn!("Background worker is gone, dropping vote for {name}");
                        let notice = self.state.abandon_vote(pending);
                        self.toast(notice);
                    }
                }
                Err(notice) => self.toast(notice),
            },
        }
    }

    fn draw_overlays(&mut self, ui: &mut egui::Ui, rect: egui::Rect) {
        let painter = ui.painter_at(rect);

        if self.state.is_loading() {
            painter.rect_filled(rect, 0.0, egui::Color32::from_white_alpha(160));
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "🎱 Racking 'em up...",
                egui::FontId::proportional(20.0),
                egui::Color32::from_gray(40),
            );
            ui.ctx().request_repaint_after(Duration::from_millis(100));
        }

        // Load errors at the top
        let mut y = rect.top() + 20.0;
        for message in self.state.load_errors() {
            y += bubble(&painter, egui::pos2(rect.center().x, y), message, true);
        }

        // Toasts above the bottom edge, newest last
        self.toasts.retain(|toast| toast.expires > Instant::now());
        let mut y = rect.bottom() - 30.0;
        for toast in self.toasts.iter().rev() {
            y -= bubble(
                &painter,
                egui::pos2(rect.center().x, y),
                &toast.notice.text,
                toast.notice.is_error,
            );
        }
        if let Some(next) = self.toasts.iter().map(|t| t.expires).min() {
            ui.ctx()
                .request_repaint_after(next.saturating_duration_since(Instant::now()));
        }

        let button_rect = egui::Rect::from_min_size(
            rect.left_bottom() + egui::vec2(10.0, -44.0),
            egui::vec2(140.0, 34.0),
        );
        let register = ui.put(
            button_rect,
            egui::Button::new(egui::RichText::new("+ Register Bar")
                .color(egui::Color32::WHITE)
                .strong())
                .fill(egui::Color32::from_rgb(40, 120, 70))
                .corner_radius(6.0),
        );
        if register.on_hover_text("Suggest a bar for the map").clicked() {
            open_url(&self.register_bar_url);
        }
    }
}

impl eframe::App for PoolBarsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_backend();
        self.state.set_today(self.clock.today(), &mut self.surface);

        let mut criteria = self.state.criteria().clone();
        ui::header::show(ctx, &mut criteria, &mut self.show_list);
        self.state.set_criteria(criteria, &mut self.surface);

        if self.show_list {
            let clicked = ui::sidebar::show(
                ctx,
                self.state.list_bars(),
                self.state.filtered().len(),
                self.state.selection(),
                self.list_width,
            );
            if let Some(id) = clicked {
                self.state.select_from_list(id, &mut self.surface);
            }
        }

        let map_frame = egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let map_frame = self.surface.show(ui);
                self.draw_overlays(ui, rect);
                map_frame
            })
            .inner;

        for event in self.surface.drain_events() {
            self.state.handle_map_event(event, &self.surface);
        }

        if let Some(id) = map_frame.clicked {
            self.state.click_marker(id, &mut self.surface);
        }

        let action = match (self.state.popup_bar(), map_frame.popup_anchor) {
            (Some(bar), Some(anchor)) => PopupView {
                bar,
                votes: self.state.vote_count(&bar.name),
                has_voted: self.state.has_voted(&bar.name),
                vote_in_flight: self.state.is_vote_in_flight(&bar.name),
                today: self.state.today(),
            }
            .show(ctx, anchor),
            _ => None,
        };
        if let Some(action) = action {
            self.handle_popup_action(action);
        }
    }
}

/// Shown instead of the map when required secrets are missing.
#[derive(Debug)]
pub struct StartupErrorApp {
    error: StartupError,
    config_path: Option<String>,
}

impl StartupErrorApp {
    pub fn new(error: StartupError) -> Self {
        let config_path = AppConfig::config_path()
            .ok()
            .map(|path| path.display().to_string());
        Self { error, config_path }
    }
}

impl eframe::App for StartupErrorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.label(egui::RichText::new("🎱 Cue Club can't start")
                    .size(22.0)
                    .strong());
                ui.add_space(12.0);
                ui.label(egui::RichText::new(self.error.to_string())
                    .color(egui::Color32::from_rgb(200, 60, 60)));
                ui.add_space(12.0);
                ui.label("Set the environment variable or add the key to your config file, then restart.");
                if let Some(path) = &self.config_path {
                    ui.add_space(6.0);
                    ui.label(egui::RichText::new(path).monospace());
                }
            });
        });
    }
}

fn open_url(url: &str) {
    if let Err(e) = webbrowser::open(url) {
        warn!("Failed to open {url}: {e}");
    }
}

/// Draw a centred message bubble and return the vertical space it used.
fn bubble(painter: &egui::Painter, center: egui::Pos2, text: &str, is_error: bool) -> f32 {
    let bg_color = if is_error {
        egui::Color32::from_rgb(220, 50, 50)
    } else {
        egui::Color32::from_rgb(40, 120, 70)
    };

    let galley = painter.layout_no_wrap(
        text.to_string(),
        egui::FontId::proportional(13.0),
        egui::Color32::WHITE,
    );
    let padding = egui::vec2(12.0, 6.0);
    let bubble_rect = egui::Rect::from_center_size(center, galley.size() + padding * 2.0);

    painter.rect_filled(bubble_rect, 5.0, bg_color);
    painter.galley(bubble_rect.min + padding, galley, egui::Color32::WHITE);

    bubble_rect.height() + 6.0
}
