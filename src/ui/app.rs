use crossbeam_channel as channel;
use eframe::egui;
use std::sync::{Arc, Mutex};

use super::{msg_list, MsgListPanel, PortsPanel, View};
use crate::{
    monitor::{LogPolicy, MonitorState},
    Settings,
};

pub enum Request {
    ClearLog,
    SetLogPolicy(LogPolicy),
    Shutdown,
}

pub struct App {
    app_name: &'static str,
    state: Arc<Mutex<MonitorState>>,
    settings: Settings,
    msg_list_panel: MsgListPanel,
    req_tx: channel::Sender<Request>,
    err_rx: channel::Receiver<anyhow::Error>,
    last_err: Option<anyhow::Error>,
    controller_thread: Option<std::thread::JoinHandle<()>>,
}

impl App {
    pub fn new(app_name: &'static str, cc: &eframe::CreationContext) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let settings = Settings::load(cc.storage);
        let state = Arc::new(Mutex::new(MonitorState::new(settings.log_policy)));

        let (err_tx, err_rx) = channel::unbounded();
        let (req_tx, req_rx) = channel::unbounded();

        let controller_thread = super::controller::Spawner {
            req_rx,
            err_tx,
            state: state.clone(),
            settings: settings.clone(),
            egui_ctx: cc.egui_ctx.clone(),
        }
        .spawn();

        Self {
            app_name,
            state,
            msg_list_panel: MsgListPanel::new(settings.follows_cursor, settings.log_policy),
            settings,
            req_tx,
            err_rx,
            last_err: None,
            controller_thread: Some(controller_thread),
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // The view borrows the log, keep the state locked while rendering
        let state = self.state.clone();
        let state = state.lock().unwrap();
        let view = View::from(&*state);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(self.app_name);
            ui.add_space(10f32);

            if let Some(unsupported) = view.unsupported {
                Self::banner(ui, unsupported);
            }
            if let Some(ref error) = view.error {
                Self::banner(ui, error);
            }

            ui.group(|ui| {
                PortsPanel::show(ui, &view.inputs, view.sysex);

                if let Some(ref status) = view.status {
                    ui.add_space(2f32);
                    ui.weak(status.as_str());
                }

                ui.add_space(2f32);
                ui.separator();
                ui.add_space(2f32);

                if let Some(resp) = self.msg_list_panel.show(ui, view.messages) {
                    use msg_list::Response::*;
                    match resp {
                        Clear => self.send_req(Request::ClearLog),
                        SetLogPolicy(policy) => {
                            self.settings.log_policy = policy;
                            self.send_req(Request::SetLogPolicy(policy));
                        }
                    }
                }
                self.settings.follows_cursor = self.msg_list_panel.follows_cursor;
            });

            self.pop_error();
            if let Some(ref err) = self.last_err {
                ui.add_space(5f32);
                let text = egui::RichText::new(format!("{:#}", err))
                    .color(egui::Color32::WHITE)
                    .background_color(egui::Color32::DARK_RED);
                ui.group(|ui| {
                    ui.horizontal_wrapped(|ui| {
                        use egui::Widget;
                        let label = egui::Label::new(text).sense(egui::Sense::click());
                        if label.ui(ui).clicked() {
                            self.last_err = None;
                        }
                    })
                });
            }
        });
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        self.settings.save(storage);
    }
}

impl App {
    fn banner(ui: &mut egui::Ui, text: &str) {
        ui.label(
            egui::RichText::new(text)
                .color(egui::Color32::WHITE)
                .background_color(egui::Color32::DARK_RED),
        );
        ui.add_space(5f32);
    }

    fn send_req(&self, request: Request) {
        if self.req_tx.send(request).is_err() {
            log::error!("Monitor controller is gone");
        }
    }

    fn pop_error(&mut self) {
        match self.err_rx.try_recv() {
            Ok(err) => self.last_err = Some(err),
            Err(channel::TryRecvError::Empty) => (),
            Err(channel::TryRecvError::Disconnected) => (),
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(controller_thread) = self.controller_thread.take() {
            if let Err(err) = self.req_tx.send(Request::Shutdown) {
                log::error!("Monitor couldn't request shutdown: {}", err);
            } else {
                let _ = controller_thread.join();
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        log::debug!("Shutting down");
        self.shutdown();
    }
}
