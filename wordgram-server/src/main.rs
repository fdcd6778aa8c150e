use std::path::PathBuf;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};

use clap::Parser;
use log::info;
use serde::Deserialize;
use wordgram_core::{Config, NGramError, NGramModel, Normalize};

#[derive(Parser, Debug)]
#[command(name = "wordgram-server")]
#[command(about = "HTTP front-end for the word n-gram model")]
#[command(version)]
struct Args {
	/// TOML configuration file
	#[arg(long)]
	config: Option<PathBuf>,

	/// Sentence corpus (overrides the configuration)
	#[arg(long)]
	corpus: Option<PathBuf>,

	/// Model order (overrides the configuration)
	#[arg(short)]
	n: Option<usize>,
}

/// Query parameters for `/v1/predict`
#[derive(Deserialize)]
struct PredictParams {
	context: Option<String>,
	limit: Option<usize>,
}

/// Query parameters for `/v1/score`
#[derive(Deserialize)]
struct ScoreParams {
	ngram: Option<String>,
}

/// Query parameters for `/v1/update`
#[derive(Deserialize)]
struct UpdateParams {
	sentence: Option<String>,
}

struct SharedData {
	model: NGramModel,
	suggestions: usize,
}

fn words(text: &Option<String>) -> Vec<&str> {
	text.as_deref().map(|t| t.split_whitespace().collect()).unwrap_or_default()
}

/// HTTP GET endpoint `/v1/predict`
///
/// Returns the most likely next words for `context`, one per line.
/// The context goes through the model's normalizer, as updates do.
#[get("/v1/predict")]
async fn get_predict(data: web::Data<Mutex<SharedData>>, query: web::Query<PredictParams>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let limit = query.limit.unwrap_or(shared_data.suggestions);
	let context = shared_data.model.normalizer().normalize(query.context.as_deref().unwrap_or_default());
	let context: Vec<&str> = context.split_whitespace().collect();
	let predictions: Vec<String> = shared_data.model.predict(&context).into_iter().take(limit).collect();
	HttpResponse::Ok().body(predictions.join("\n"))
}

/// HTTP GET endpoint `/v1/score`
///
/// Returns the score of `ngram` as JSON. Infinite perplexities serialize as `null`.
#[get("/v1/score")]
async fn get_score(data: web::Data<Mutex<SharedData>>, query: web::Query<ScoreParams>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	match shared_data.model.score(&words(&query.ngram)) {
		Ok(score) => HttpResponse::Ok().json(score),
		Err(e @ NGramError::LengthMismatch { .. }) => HttpResponse::BadRequest().body(e.to_string()),
		Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
	}
}

#[get("/v1/average")]
async fn get_average(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	match shared_data.model.average_perplexity() {
		Some(perplexity) => HttpResponse::Ok().body(perplexity.to_string()),
		None => HttpResponse::NotFound().body("Model is empty"),
	}
}

#[put("/v1/update")]
async fn put_update(data: web::Data<Mutex<SharedData>>, query: web::Query<UpdateParams>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let sentence = match &query.sentence {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty sentence"),
	};

	shared_data.model.update(sentence);
	HttpResponse::Ok().body("Sentence learned")
}

/// Main entry point for the server.
///
/// Builds the model described by the configuration, wraps it in a `Mutex`
/// (the model itself is not synchronized) and serves it over HTTP.
#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init();
	let args = Args::parse();

	let mut config = match &args.config {
		Some(path) => Config::load(path)?,
		None => Config::default(),
	};
	if let Some(corpus) = args.corpus {
		config.corpus = corpus;
	}
	config.order = args.n.unwrap_or(config.order);

	let shared_data = SharedData {
		model: NGramModel::from_config(&config)?,
		suggestions: config.suggestions,
	};
	let shared_model = web::Data::new(Mutex::new(shared_data));

	info!("listening on {}:{}", config.server.host, config.server.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::default().allow_any_origin().allowed_methods(vec!["GET", "PUT"]))
			.app_data(shared_model.clone())
			.service(get_predict)
			.service(get_score)
			.service(get_average)
			.service(put_update)
	})
		.bind((config.server.host.as_str(), config.server.port))?
		.run()
		.await?;

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::http::StatusCode;
	use actix_web::test;
	use std::sync::Arc;
	use wordgram_core::Corpus;

	#[derive(Deserialize)]
	struct ScoreBody {
		probability: f64,
		count: u64,
	}

	fn shared(sentences: &[&str], order: usize) -> web::Data<Mutex<SharedData>> {
		let corpus = Corpus::from_sentences(sentences.iter().copied());
		let model = NGramModel::new(Arc::new(corpus), order).unwrap();
		web::Data::new(Mutex::new(SharedData { model, suggestions: 3 }))
	}

	#[actix_web::test]
	async fn predict_after_update() {
		let data = shared(&["the cat sat", "the cat ran"], 2);
		let app = test::init_service(App::new().app_data(data.clone()).service(get_predict).service(put_update)).await;

		let req = test::TestRequest::get().uri("/v1/predict?context=the").to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, "cat");

		let req = test::TestRequest::put().uri("/v1/update?sentence=The%20dog%20barked").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

		let req = test::TestRequest::get().uri("/v1/predict?context=the&limit=5").to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, "cat\ndog");

		let req = test::TestRequest::put().uri("/v1/update?sentence=%20").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn predict_normalizes_the_context() {
		let data = shared(&["the cat sat"], 2);
		let app = test::init_service(App::new().app_data(data.clone()).service(get_predict).service(put_update)).await;

		let req = test::TestRequest::put().uri("/v1/update?sentence=The%20dog").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

		let req = test::TestRequest::get().uri("/v1/predict?context=The").to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, "cat\ndog");

		let req = test::TestRequest::get().uri("/v1/predict?context=the!").to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, "cat\ndog");
	}

	#[actix_web::test]
	async fn score_reports_counts_and_length_errors() {
		let data = shared(&["the cat sat", "the cat ran"], 2);
		let app = test::init_service(App::new().app_data(data.clone()).service(get_score).service(get_average)).await;

		let req = test::TestRequest::get().uri("/v1/score?ngram=the+cat").to_request();
		let body: ScoreBody = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body.count, 2);
		assert!(body.probability > 0.0);

		let req = test::TestRequest::get().uri("/v1/score?ngram=the").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

		let req = test::TestRequest::get().uri("/v1/average").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
	}

	#[actix_web::test]
	async fn empty_model_has_no_average() {
		let data = shared(&[], 2);
		let app = test::init_service(App::new().app_data(data.clone()).service(get_average)).await;

		let req = test::TestRequest::get().uri("/v1/average").to_request();
		assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
	}
}
