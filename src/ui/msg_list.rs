use eframe::egui;

use crate::monitor::{LogEntry, LogPolicy};

#[derive(Debug)]
pub enum Response {
    Clear,
    SetLogPolicy(LogPolicy),
}

pub struct MsgListPanel {
    pub follows_cursor: bool,
    pub policy: LogPolicy,
}

impl MsgListPanel {
    pub fn new(follows_cursor: bool, policy: LogPolicy) -> Self {
        Self {
            follows_cursor,
            policy,
        }
    }

    #[must_use]
    pub fn show(&mut self, ui: &mut egui::Ui, list: &[LogEntry]) -> Option<Response> {
        let mut response = None;

        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                ui.checkbox(&mut self.follows_cursor, "Follow");
                if ui.button("Clear").clicked() {
                    response = Some(Response::Clear);
                }

                ui.separator();
                for policy in [LogPolicy::Accumulate, LogPolicy::LastOnly] {
                    if ui
                        .radio_value(&mut self.policy, policy, policy.as_str())
                        .clicked()
                    {
                        response = Some(Response::SetLogPolicy(policy));
                    }
                }
            });

            if list.is_empty() {
                return;
            }

            ui.separator();
            ui.heading("MIDI Messages:");
            egui::ScrollArea::both().show(ui, |ui| {
                egui::Grid::new("Msg List").num_columns(2).show(ui, |ui| {
                    ui.label("Timestamp");
                    ui.label("Message");
                    ui.end_row();

                    ui.separator();
                    ui.separator();
                    ui.end_row();

                    for msg in list.iter() {
                        let _ = ui.selectable_label(false, &msg.ts_str);
                        let _ = ui.selectable_label(
                            false,
                            egui::RichText::new(&msg.text).color(egui::Color32::WHITE),
                        );
                        ui.end_row();
                    }
                });

                if self.follows_cursor {
                    ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                }
            });
        });

        response
    }
}
