use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware, put, web};

use serde::Deserialize;
use thetha_core::chat::{Chatbot, GenerationMode};
use thetha_core::model::smoothing::Smoothing;

/// Query parameters for the `/v1/respond` endpoint
#[derive(Deserialize)]
struct RespondParams {
	message: Option<String>,
}

/// Query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	count: Option<usize>,
	max_length: Option<usize>,
	seed: Option<String>,
}

/// Query parameters for the `/v1/stats` endpoint
#[derive(Deserialize)]
struct StatsParams {
	k: Option<usize>,
}

/// Query parameters for the `/v1/configure` endpoint
#[derive(Deserialize)]
struct ConfigureParams {
	n: Option<usize>,
	mode: Option<String>,
	smoothing: Option<String>,
}

struct SharedData {
	chatbot: Chatbot,
}

/// HTTP GET endpoint `/v1/respond`
///
/// Generates a chat reply to the given message. An absent or empty
/// message yields a random greeting.
#[get("/v1/respond")]
async fn get_respond(data: web::Data<Mutex<SharedData>>, query: web::Query<RespondParams>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let message = query.message.as_deref().unwrap_or("");
	HttpResponse::Ok().body(shared_data.chatbot.respond(message))
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates `count` words or sentences (depending on the configured
/// mode), one per line, optionally continuing a seed prefix.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let count = query.count.unwrap_or(5);
	let max_length = query.max_length.unwrap_or(15);
	let seed = query.seed.as_deref().filter(|s| !s.trim().is_empty());

	if count == 0 || count > 100 {
		return HttpResponse::BadRequest().body("count must be between 1 and 100");
	}

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let results = shared_data.chatbot.generate_batch(count, max_length, seed);
	HttpResponse::Ok().body(results.join("\n"))
}

/// HTTP GET endpoint `/v1/stats`
///
/// Returns a JSON statistics snapshot of the active model, including
/// the top-k most frequent n-grams.
#[get("/v1/stats")]
async fn get_stats(data: web::Data<Mutex<SharedData>>, query: web::Query<StatsParams>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	HttpResponse::Ok().json(shared_data.chatbot.stats(query.k.unwrap_or(10)))
}

/// HTTP PUT endpoint `/v1/configure`
///
/// Rebuilds the chatbot with new settings. Unspecified parameters keep
/// their current values; models are always retrained from scratch
/// rather than mutated, so corpora are never mixed ambiguously.
#[put("/v1/configure")]
async fn put_configure(data: web::Data<Mutex<SharedData>>, query: web::Query<ConfigureParams>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let n = query.n.unwrap_or(shared_data.chatbot.n());

	let mode = match &query.mode {
		None => shared_data.chatbot.mode(),
		Some(value) => match value.parse::<GenerationMode>() {
			Ok(mode) => mode,
			Err(e) => return HttpResponse::BadRequest().body(e),
		},
	};

	let smoothing = match &query.smoothing {
		None => shared_data.chatbot.smoothing(),
		Some(value) => match value.parse::<Smoothing>() {
			Ok(smoothing) => smoothing,
			Err(e) => return HttpResponse::BadRequest().body(e),
		},
	};

	match Chatbot::new(n, mode, smoothing) {
		Ok(chatbot) => {
			log::info!("Rebuilt chatbot: n={}, mode={}, smoothing={}", n, mode.as_str(), smoothing.as_str());
			shared_data.chatbot = chatbot;
			HttpResponse::Ok().body("Settings applied")
		}
		Err(e) => HttpResponse::BadRequest().body(e),
	}
}

/// Main entry point for the server.
///
/// Trains the default chatbot, wraps it in a `Mutex` for thread
/// safety, and starts an Actix-web HTTP server with the chat,
/// generation, statistics and configuration endpoints.
///
/// # Notes
/// - The server binds to 127.0.0.1:5000.
/// - All model state lives in memory; configuration rebuilds it.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

	let chatbot = Chatbot::new(3, GenerationMode::Word, Smoothing::KneserNey)
		.map_err(std::io::Error::other)?;
	let shared_model = web::Data::new(Mutex::new(SharedData { chatbot }));

	log::info!("Listening on 127.0.0.1:5000");

	HttpServer::new(move || {
		App::new()
			.wrap(middleware::Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.service(get_respond)
			.service(get_generated)
			.service(get_stats)
			.service(put_configure)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}
