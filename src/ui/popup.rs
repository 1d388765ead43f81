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

//! Detail popup drawn above the selected marker.

use chrono::Weekday;
use eframe::egui;
use poolbars_core::{Bar, MarkerGlyph};

/// Vertical gap between the marker and the popup's bottom edge.
const POPUP_OFFSET: f32 = 25.0;

const POPUP_WIDTH: f32 = 260.0;

/// What the user did inside the popup this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupAction {
    Close,
    Vote(String),
    OpenUrl(String),
}

/// Everything the popup shows for one bar.
#[derive(Debug)]
pub struct PopupView<'a> {
    pub bar: &'a Bar,
    pub votes: u64,
    pub has_voted: bool,
    pub vote_in_flight: bool,
    pub today: Weekday,
}

impl PopupView<'_> {
    /// Draw the popup with its bottom centre `POPUP_OFFSET` above `anchor`.
    pub fn show(&self, ctx: &egui::Context, anchor: egui::Pos2) -> Option<PopupAction> {
        let mut action = None;
        let bar = self.bar;

        egui::Area::new(egui::Id::new("bar_popup"))
            .order(egui::Order::Foreground)
            .pivot(egui::Align2::CENTER_BOTTOM)
            .fixed_pos(anchor - egui::vec2(0.0, POPUP_OFFSET))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style())
                    .corner_radius(6.0)
                    .show(ui, |ui| {
                        ui.set_width(POPUP_WIDTH);

                        ui.horizontal(|ui| {
                            ui.label(egui::RichText::new(format!(
                                "{} {}",
                                MarkerGlyph::for_bar(bar).as_str(),
                                bar.name
                            ))
                            .size(15.0)
                            .strong());

                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                if ui.small_button("✕").on_hover_text("Close").clicked() {
                                    action = Some(PopupAction::Close);
                                }
                            });
                        });

                        if bar.live_table {
                            ui.label(egui::RichText::new("📍 Live table tonight!")
                                .color(egui::Color32::from_rgb(200, 60, 60)));
                        }

                        match bar.maps_search_url() {
                            Some(url) => {
                                if ui.link(&bar.address).on_hover_text("Open in Google Maps").clicked() {
                                    action = Some(PopupAction::OpenUrl(url));
                                }
                            }
                            None => {
                                ui.label(&bar.address);
                            }
                        }

                        ui.label(format!("{} tables", bar.tables_label()));
                        if bar.guinness {
                            ui.label("🍺 Guinness on draft");
                        }

                        let days = bar.free_pool.days();
                        if !days.is_empty() {
                            ui.add_space(2.0);
                            ui.label(egui::RichText::new("Free pool").size(11.0).strong());
                            ui.horizontal_wrapped(|ui| {
                                for day in days {
                                    day_chip(ui, day, day == self.today);
                                }
                            });
                        }

                        ui.add_space(4.0);
                        ui.horizontal(|ui| {
                            if let Some(website) = bar.website.as_deref().filter(|w| !w.trim().is_empty()) {
                                if ui.link("Visit Website").clicked() {
                                    action = Some(PopupAction::OpenUrl(website.to_string()));
                                }
                            }

                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                let label = if self.vote_in_flight {
                                    format!("Voting… {}", self.votes)
                                } else {
                                    format!("👍 Upvote {}", self.votes)
                                };
                                let button = ui.add_enabled(!self.vote_in_flight, egui::Button::new(label));
                                let button = if self.has_voted {
                                    button.on_hover_text("You already voted for this bar")
                                } else {
                                    button
                                };
                                if button.clicked() {
                                    action = Some(PopupAction::Vote(bar.name.clone()));
                                }
                            });
                        });
                    });
            });

        action
    }
}

fn day_chip(ui: &mut egui::Ui, day: Weekday, is_today: bool) {
    let (fill, text) = if is_today {
        (egui::Color32::from_rgb(40, 120, 70), egui::Color32::WHITE)
    } else {
        (egui::Color32::from_gray(225), egui::Color32::from_gray(60))
    };

    egui::Frame::NONE
        .fill(fill)
        .corner_radius(8.0)
        .inner_margin(egui::Margin::symmetric(6, 1))
        .show(ui, |ui| {
            ui.label(egui::RichText::new(day.to_string()).color(text).size(10.0));
        });
}
