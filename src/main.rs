pub mod midi;

pub mod monitor;

pub mod settings;
pub use settings::Settings;

mod ui;

const APP_NAME: &str = "MIDI Monitor";

fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "midi-monitor",
        options,
        Box::new(|cc| Box::new(ui::App::new(APP_NAME, cc))),
    );
}
