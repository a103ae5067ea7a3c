use eframe::egui;

use super::view::Inputs;

pub struct PortsPanel;

impl PortsPanel {
    pub fn show(ui: &mut egui::Ui, inputs: &Inputs, sysex: &str) {
        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                ui.label("Available MIDI Inputs:");
                ui.separator();
                ui.weak(sysex);
            });

            match inputs {
                Inputs::None(text) => {
                    ui.label(*text);
                }
                Inputs::List(list) => {
                    for input in list {
                        ui.label(format!("• {}", input));
                    }
                }
            }
        });
    }
}
