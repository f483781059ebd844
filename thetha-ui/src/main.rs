use std::time::Duration;

use eframe::{Frame, egui};
use egui::Context;

use reqwest::Result;
use reqwest::blocking::Client;

/// Generation granularity on the UI side.
/// Serialized manually to the server's query-string names.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Word,
    Character,
}

impl Mode {
    fn as_str(&self) -> &'static str {
        match self {
            Mode::Word => "word",
            Mode::Character => "character",
        }
    }
}

/// Smoothing selection on the UI side.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SmoothingChoice {
    MaximumLikelihood,
    Laplace,
    KneserNey,
}

impl SmoothingChoice {
    fn as_str(&self) -> &'static str {
        match self {
            SmoothingChoice::MaximumLikelihood => "mle",
            SmoothingChoice::Laplace => "laplace",
            SmoothingChoice::KneserNey => "kneser_ney",
        }
    }
}

/// REST context holding a reusable blocking HTTP client.
struct RESTContext {
    client: Client,
}

impl RESTContext {
    /// Creates a new REST context with a timeout.
    fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::new(5, 0))
            .build()?;
        Ok(Self { client })
    }

    /// Sends a GET request to `/v1/respond` with the chat message.
    fn get_respond(&self, message: &str) -> Result<String> {
        let response = self.client
            .get("http://127.0.0.1:5000/v1/respond")
            .query(&[("message", message)])
            .send()?
            .error_for_status()?;

        Ok(response.text()?)
    }

    /// Sends a GET request to `/v1/generate` with query parameters.
    fn get_generated(&self, params: &[(String, String)]) -> Result<String> {
        let response = self.client
            .get("http://127.0.0.1:5000/v1/generate")
            .query(params)
            .send()?
            .error_for_status()?;

        Ok(response.text()?)
    }

    /// Sends a GET request to `/v1/stats`.
    fn get_stats(&self) -> Result<String> {
        let response = self.client
            .get("http://127.0.0.1:5000/v1/stats")
            .query(&[("k", "10")])
            .send()?
            .error_for_status()?;

        Ok(response.text()?)
    }

    /// Sends a PUT request to `/v1/configure` with the new settings.
    fn put_configure(&self, n: usize, mode: Mode, smoothing: SmoothingChoice) -> Result<String> {
        let response = self.client
            .put("http://127.0.0.1:5000/v1/configure")
            .query(&[
                ("n", n.to_string()),
                ("mode", mode.as_str().to_owned()),
                ("smoothing", smoothing.as_str().to_owned()),
            ])
            .send()?
            .error_for_status()?;

        Ok(response.text()?)
    }
}

/// Global UI state (MUST persist between frames in egui).
struct ChatbotUI {
    rest: RESTContext,

    n: usize,
    mode: Mode,
    smoothing: SmoothingChoice,

    message: String,
    conversation: Vec<(String, String)>, // (speaker, text)

    sample_prompt: String,
    sample_length: usize,
    last_sample: Option<String>,

    stats: Option<String>,
    status: Option<String>,
}

impl ChatbotUI {
    /// Initializes the UI with the server's default settings.
    fn new() -> Result<Self> {
        Ok(Self {
            rest: RESTContext::new()?,

            n: 3,
            mode: Mode::Word,
            smoothing: SmoothingChoice::KneserNey,

            message: String::new(),
            conversation: Vec::new(),

            sample_prompt: String::new(),
            sample_length: 20,
            last_sample: None,

            stats: None,
            status: None,
        })
    }

    /// Sends the typed message and records both sides of the exchange.
    fn send_message(&mut self) {
        let message = self.message.trim().to_owned();
        if message.is_empty() {
            return;
        }
        self.message.clear();

        match self.rest.get_respond(&message) {
            Ok(reply) => {
                self.conversation.push(("You".to_owned(), message));
                self.conversation.push(("Bot".to_owned(), reply));
            }
            Err(e) => self.status = Some(format!("Error: {e}")),
        }
    }

    /// Performs the sample generation request.
    fn generate_sample(&mut self) {
        let mut params = vec![
            ("count".to_owned(), "1".to_owned()),
            ("max_length".to_owned(), self.sample_length.to_string()),
        ];
        if !self.sample_prompt.trim().is_empty() {
            params.push(("seed".to_owned(), self.sample_prompt.trim().to_owned()));
        }

        match self.rest.get_generated(&params) {
            Ok(sample) => self.last_sample = Some(sample),
            Err(e) => self.status = Some(format!("Error: {e}")),
        }
    }

    /// Fetches a fresh statistics snapshot.
    fn refresh_stats(&mut self) {
        match self.rest.get_stats() {
            Ok(stats) => self.stats = Some(stats),
            Err(e) => self.status = Some(format!("Error: {e}")),
        }
    }

    /// Pushes the current settings to the server, clearing the chat.
    fn apply_settings(&mut self) {
        match self.rest.put_configure(self.n, self.mode, self.smoothing) {
            Ok(answer) => {
                self.status = Some(answer);
                self.conversation.clear();
            }
            Err(e) => self.status = Some(format!("Error: {e}")),
        }
    }
}

impl eframe::App for ChatbotUI {
    /// UI update loop (called every frame).
    fn update(&mut self, ctx: &Context, _: &mut Frame) {
        egui::SidePanel::left("settings_panel").show(ctx, |ui| {
            ui.heading("Configuration");

            ui.label("N-gram order");
            ui.add(egui::Slider::new(&mut self.n, 2..=5));

            ui.label("Generation mode");
            ui.radio_value(&mut self.mode, Mode::Word, "Word");
            ui.radio_value(&mut self.mode, Mode::Character, "Character");

            ui.label("Smoothing");
            ui.radio_value(&mut self.smoothing, SmoothingChoice::KneserNey, "Kneser-Ney");
            ui.radio_value(&mut self.smoothing, SmoothingChoice::Laplace, "Laplace");
            ui.radio_value(
                &mut self.smoothing,
                SmoothingChoice::MaximumLikelihood,
                "Maximum likelihood",
            );

            if ui.button("Apply settings").clicked() {
                self.apply_settings();
            }

            ui.separator();

            ui.heading("Sample generation");
            ui.label("Prompt");
            ui.text_edit_singleline(&mut self.sample_prompt);
            ui.label("Length");
            ui.add(egui::Slider::new(&mut self.sample_length, 1..=50));
            if ui.button("Generate sample").clicked() {
                self.generate_sample();
            }
            if let Some(sample) = &self.last_sample {
                ui.label(sample);
            }

            ui.separator();

            if ui.button("Model stats").clicked() {
                self.refresh_stats();
            }
            if let Some(stats) = &self.stats {
                ui.label(stats);
            }

            if let Some(status) = &self.status {
                ui.separator();
                ui.label(status);
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Xhosa N-gram Chatbot");

            egui::ScrollArea::vertical()
                .auto_shrink([false, true])
                .max_height(ui.available_height() - 40.0)
                .show(ui, |ui| {
                    for (speaker, text) in &self.conversation {
                        ui.label(format!("{speaker}: {text}"));
                    }
                });

            ui.horizontal(|ui| {
                let input = ui.text_edit_singleline(&mut self.message);
                let submitted = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Send").clicked() || submitted {
                    self.send_message();
                }
            });
        });
    }
}

/// Application entry point.
fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([720.0, 480.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "thetha-chat",
        options,
        Box::new(|_| Ok(Box::new(ChatbotUI::new()?))),
    )
}
