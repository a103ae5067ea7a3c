use anyhow::Context;
use crossbeam_channel as channel;
use eframe::egui;
use std::{
    ops::ControlFlow,
    sync::{Arc, Mutex},
};

use super::app;
use crate::{
    midi,
    monitor::{Event, Monitor, MonitorState, Status},
    Settings,
};

pub struct Spawner {
    pub req_rx: channel::Receiver<app::Request>,
    pub err_tx: channel::Sender<anyhow::Error>,
    pub state: Arc<Mutex<MonitorState>>,
    pub settings: Settings,
    pub egui_ctx: egui::Context,
}

impl Spawner {
    pub fn spawn(self) -> std::thread::JoinHandle<()> {
        std::thread::spawn(move || {
            let platform = midi::MidirPlatform::new(
                self.settings.client_name.as_str(),
                self.settings.port_poll_interval(),
            );

            Controller {
                err_tx: self.err_tx,
                monitor: Monitor::new(platform, self.state),
                must_repaint: false,
                egui_ctx: self.egui_ctx,
            }
            .run_loop(self.req_rx);
        })
    }
}

struct Controller<P: midi::MidiPlatform> {
    err_tx: channel::Sender<anyhow::Error>,
    monitor: Monitor<P>,
    must_repaint: bool,
    egui_ctx: egui::Context,
}

impl<P: midi::MidiPlatform> Controller<P> {
    fn handle(&mut self, request: app::Request) -> ControlFlow<(), ()> {
        use app::Request::*;
        let event = match request {
            ClearLog => Event::ClearLog,
            SetLogPolicy(policy) => Event::SetLogPolicy(policy),
            Shutdown => return ControlFlow::Break(()),
        };

        let status = self.monitor.apply(event);
        self.update(status);

        ControlFlow::Continue(())
    }

    fn update(&mut self, status: Status) {
        if status.was_updated() {
            self.must_repaint = true;
        }
    }

    fn report(&mut self, err: anyhow::Error) {
        log::error!("{:#}", err);
        let _ = self.err_tx.send(err);
        self.must_repaint = true;
    }

    fn run_loop(mut self, req_rx: channel::Receiver<app::Request>) {
        match self.monitor.init().context("Failed to subscribe to Midi inputs") {
            Ok(status) => self.update(status),
            Err(err) => self.report(err),
        }
        self.egui_ctx.request_repaint();

        let notif_rx = self.monitor.notifications();
        loop {
            channel::select! {
                recv(req_rx) -> request => {
                    match request {
                        Ok(request) => {
                            if self.handle(request).is_break() {
                                break;
                            }
                        }
                        Err(err) => {
                            log::error!("Error UI request channel: {err}");
                            break;
                        }
                    }
                }
                recv(notif_rx) -> notification => {
                    match notification {
                        Ok(notification) => {
                            match self
                                .monitor
                                .handle(notification)
                                .context("Failed to update Midi input subscriptions")
                            {
                                Ok(status) => self.update(status),
                                Err(err) => self.report(err),
                            }
                        }
                        Err(err) => {
                            log::error!("Error Midi notification channel: {err}");
                            break;
                        }
                    }
                }
            }

            if self.must_repaint {
                self.egui_ctx.request_repaint();
                self.must_repaint = false;
            }
        }

        self.monitor.teardown();
        log::debug!("Shutting down Monitor Controller loop");
    }
}
