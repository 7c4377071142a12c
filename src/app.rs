//! Main window
//!
//! One form: text, speed, destination directory, Submit. While a job is
//! running the form is disabled behind a "Please wait" indicator that has
//! no cancel button; the indicator closes when the worker reports back,
//! and failures are shown in a dialog.

use crate::form::{Form, VALIDATION_DIALOG_TITLE};
use crate::submission::Speed;
use crate::worker::{Dispatcher, JobOutcome};
use eframe::egui;
use log::{debug, info, warn};
use std::sync::Arc;

/// Blocking message shown over the form
#[derive(Debug, Clone, PartialEq)]
enum Dialog {
    InputError(String),
    SynthesisFailed(String),
}

impl Dialog {
    fn title(&self) -> &'static str {
        match self {
            Dialog::InputError(_) => VALIDATION_DIALOG_TITLE,
            Dialog::SynthesisFailed(_) => "Synthesis Failed",
        }
    }

    fn message(&self) -> &str {
        match self {
            Dialog::InputError(msg) | Dialog::SynthesisFailed(msg) => msg,
        }
    }
}

/// The synthesizer window
pub struct HablaApp {
    form: Form,
    dispatcher: Dispatcher,
    dialog: Option<Dialog>,

    /// Where the last successful job wrote its file
    last_saved: Option<String>,
}

impl HablaApp {
    pub fn new(cc: &eframe::CreationContext<'_>, mut dispatcher: Dispatcher) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());

        // Wake the UI thread when a worker finishes
        let ctx = cc.egui_ctx.clone();
        dispatcher.set_notifier(Arc::new(move || ctx.request_repaint()));

        Self {
            form: Form::new(),
            dispatcher,
            dialog: None,
            last_saved: None,
        }
    }

    fn on_submit(&mut self) {
        let submission = match self.form.submit() {
            Ok(submission) => submission,
            Err(e) => {
                debug!("Submit rejected: {:?}", e);
                self.dialog = Some(Dialog::InputError(e.to_string()));
                return;
            }
        };

        if let Err(e) = self.dispatcher.dispatch(submission) {
            warn!("Could not dispatch: {}", e);
            self.dialog = Some(Dialog::SynthesisFailed(e.to_string()));
        }
    }

    fn on_select_directory(&mut self) {
        let chosen = rfd::FileDialog::new()
            .set_title("Select Output Directory")
            .pick_folder();
        self.form.set_directory(chosen);
    }

    /// Apply outcomes reported since the last frame
    fn drain_outcomes(&mut self) {
        while let Some(outcome) = self.dispatcher.try_recv() {
            match outcome {
                JobOutcome::Completed { path, .. } => {
                    info!("Saved {}", path.display());
                    self.last_saved = Some(path.display().to_string());
                }
                JobOutcome::Failed { path, error, .. } => {
                    self.dialog = Some(Dialog::SynthesisFailed(format!(
                        "Could not write {}:\n{}",
                        path.display(),
                        error
                    )));
                }
            }
        }
    }

    fn form_ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut self.form.text)
                    .hint_text("Enter some text here")
                    .desired_width(320.0),
            );

            egui::ComboBox::from_id_source("speed")
                .selected_text(self.form.speed.to_string())
                .show_ui(ui, |ui| {
                    for speed in Speed::all() {
                        ui.selectable_value(&mut self.form.speed, *speed, speed.to_string());
                    }
                });
        });

        ui.add_space(8.0);
        if ui.button("Select Destination Directory").clicked() {
            self.on_select_directory();
        }
        if let Some(dir) = self.form.directory() {
            ui.label(dir.display().to_string());
        }

        ui.add_space(8.0);
        if ui.button("Submit").clicked() {
            self.on_submit();
        }

        if let Some(saved) = &self.last_saved {
            ui.add_space(8.0);
            ui.weak(format!("Saved {}", saved));
        }
    }
}

fn centered_window(title: &str) -> egui::Window<'static> {
    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
}

impl eframe::App for HablaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_outcomes();

        let busy = self.dispatcher.in_flight() > 0;
        let blocked = busy || self.dialog.is_some();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(24.0);
            ui.add_enabled_ui(!blocked, |ui| self.form_ui(ui));
        });

        if busy {
            centered_window("Please wait").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Synthesizing...");
                });
            });
        }

        let mut dismissed = false;
        if let Some(dialog) = &self.dialog {
            centered_window(dialog.title()).show(ctx, |ui| {
                ui.label(dialog.message());
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        }
        if dismissed {
            self.dialog = None;
        }
    }
}
