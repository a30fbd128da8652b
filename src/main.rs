//! Process entry: run the shell with a demo UI callback, surface any
//! escaping error once through a blocking dialog, and map the outcome to
//! the exit status.

use std::process::ExitCode;

use dear_shell::{ShellConfig, imgui::Condition, run};
use tracing::error;

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dear_shell=info,wgpu_core=warn,wgpu_hal=warn,warn".into());

    fmt().with_env_filter(filter).with_target(true).init();
}

fn main() -> ExitCode {
    init_tracing();

    let result = run(ShellConfig::default(), |ui| {
        ui.window("Hello, world!")
            .size([320.0, 120.0], Condition::FirstUseEver)
            .build(|| {
                ui.text("This is some useful text.");
            });
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(%e, "shell terminated with an error");
            rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Error)
                .set_title("Error")
                .set_description(e.to_string())
                .set_buttons(rfd::MessageButtons::Ok)
                .show();
            ExitCode::FAILURE
        }
    }
}
