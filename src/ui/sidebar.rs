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

//! The bar list panel on the right of the map.

use eframe::egui;
use poolbars_core::{Bar, BarId};

/// Draw one card per bar and return the bar that was clicked, if any.
pub fn show(
    ctx: &egui::Context,
    bars: &[Bar],
    matching: usize,
    selected: Option<BarId>,
    default_width: f32,
) -> Option<BarId> {
    let mut clicked = None;

    egui::SidePanel::right("bar_list")
        .default_width(default_width)
        .resizable(true)
        .show(ctx, |ui| {
            ui.label(egui::RichText::new(format!("{} of {matching} bars", bars.len()))
                .color(egui::Color32::GRAY)
                .size(11.0));
            ui.add_space(4.0);

            if bars.is_empty() {
                ui.label(egui::RichText::new("No bars here. Try moving the map or clearing filters.")
                    .italics());
                return;
            }

            egui::ScrollArea::vertical().show(ui, |ui| {
                for bar in bars {
                    if card(ui, bar, selected == Some(bar.id)) {
                        clicked = Some(bar.id);
                    }
                    ui.add_space(4.0);
                }
            });
        });

    clicked
}

fn card(ui: &mut egui::Ui, bar: &Bar, is_selected: bool) -> bool {
    let frame = if is_selected {
        egui::Frame::group(ui.style())
            .fill(egui::Color32::from_rgba_unmultiplied(60, 140, 90, 60))
    } else {
        egui::Frame::group(ui.style())
    };

    let response = frame.show(ui, |ui| {
        ui.set_width(ui.available_width());

        ui.label(egui::RichText::new(&bar.name)
            .size(14.0)
            .strong());

        if bar.live_table {
            ui.label(egui::RichText::new("📍 Live table tonight!")
                .color(egui::Color32::from_rgb(200, 60, 60))
                .size(11.0));
        }

        ui.label(egui::RichText::new(&bar.address)
            .color(egui::Color32::GRAY)
            .size(11.0));

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(format!("{} tables", bar.tables_label())).size(11.0));
            if bar.guinness {
                ui.label(egui::RichText::new("🍺 Guinness").size(11.0));
            }
        });
    });

    response
        .response
        .interact(egui::Sense::click())
        .on_hover_cursor(egui::CursorIcon::PointingHand)
        .clicked()
}
