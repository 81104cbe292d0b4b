use clap::Parser;
use eframe::egui;

use drawingfun::app::DrawingApp;
use drawingfun::cli::LaunchArgs;
use drawingfun::log_info;
use drawingfun::settings::AppSettings;

fn main() -> Result<(), eframe::Error> {
    let args = LaunchArgs::parse();

    if !args.no_log {
        drawingfun::logger::init();
    }

    // Persist the on-disk settings (normalised) before applying session overrides
    let mut settings = AppSettings::load();
    settings.save();
    args.apply(&mut settings);
    log_info!("Settings: {:?}", settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([settings.window_width, settings.window_height])
            .with_min_inner_size([240.0, 320.0])
            .with_title("DrawingFun"),
        ..Default::default()
    };

    eframe::run_native(
        "DrawingFun",
        options,
        Box::new(move |cc| Box::new(DrawingApp::new(cc, settings))),
    )
}
