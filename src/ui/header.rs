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

use eframe::egui;
use poolbars_core::{FilterCriteria, TableBucket};

const ACCENT: egui::Color32 = egui::Color32::from_rgb(40, 120, 70);

/// Widget id of the search box.
pub const SEARCH_ID: &str = "bar_search";

/// Draw the title bar with the search box and filter controls.
///
/// Edits land in `criteria` and `show_list`; the caller compares against the
/// previous values. Focusing the search box opens the list.
pub fn show(ctx: &egui::Context, criteria: &mut FilterCriteria, show_list: &mut bool) {
    egui::TopBottomPanel::top("header")
        .frame(egui::Frame::side_top_panel(&ctx.style())
            .inner_margin(egui::Margin::symmetric(12, 8)))
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("🎱 Cue Club")
                    .color(ACCENT)
                    .size(20.0)
                    .strong());
                ui.label(egui::RichText::new("Best pool bars in SF")
                    .color(egui::Color32::GRAY)
                    .size(12.0));

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let list_label = if *show_list { "Hide List" } else { "Show List" };
                    if ui.button(list_label).clicked() {
                        *show_list = !*show_list;
                    }
                });
            });

            ui.add_space(4.0);

            ui.horizontal_wrapped(|ui| {
                let search = ui.add(egui::TextEdit::singleline(&mut criteria.query)
                    .id(egui::Id::new(SEARCH_ID))
                    .hint_text("Search bars...")
                    .desired_width(220.0));
                if search.gained_focus() {
                    *show_list = true;
                }

                egui::ComboBox::from_id_salt("table_bucket")
                    .selected_text(criteria.tables.label())
                    .show_ui(ui, |ui| {
                        for bucket in TableBucket::CHOICES {
                            ui.selectable_value(&mut criteria.tables, bucket, bucket.label());
                        }
                    });

                ui.toggle_value(&mut criteria.live_table_only, "📣 Live table");
                ui.toggle_value(&mut criteria.guinness_only, "🍺 Guinness on draft");
                ui.toggle_value(&mut criteria.free_pool_tonight, "🎯 Free Pool tonight");

                if criteria.is_active()
                    && ui.small_button("✕ Clear filters").clicked()
                {
                    criteria.clear();
                }
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(ctx: &egui::Context, criteria: &mut FilterCriteria, show_list: &mut bool) {
        let _ = ctx.run(egui::RawInput::default(), |ctx| show(ctx, criteria, show_list));
    }

    #[test]
    fn test_search_focus_opens_list() {
        let ctx = egui::Context::default();
        let mut criteria = FilterCriteria::default();
        let mut show_list = false;

        frame(&ctx, &mut criteria, &mut show_list);
        assert!(!show_list);

        ctx.memory_mut(|memory| memory.request_focus(egui::Id::new(SEARCH_ID)));
        frame(&ctx, &mut criteria, &mut show_list);
        assert!(show_list);
    }

    #[test]
    fn test_list_stays_closed_without_focus() {
        let ctx = egui::Context::default();
        let mut criteria = FilterCriteria::default();
        let mut show_list = false;

        frame(&ctx, &mut criteria, &mut show_list);
        frame(&ctx, &mut criteria, &mut show_list);
        assert!(!show_list);
        assert_eq!(criteria, FilterCriteria::default());
    }
}
