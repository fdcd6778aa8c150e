use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::info;

use wordgram_core::{Config, Corpus, NGramModel};

mod completion;
mod repl;

#[derive(Parser, Debug)]
#[command(name = "wordgram")]
#[command(about = "Word n-gram language model: predictive typing and perplexity")]
#[command(version)]
struct Args {
	/// TOML configuration file
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	/// Sentence corpus, one sentence per line (overrides the configuration)
	#[arg(long, global = true)]
	corpus: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Interactive typing: completions for each line, then learn it
	Repl {
		/// Model order
		#[arg(short)]
		n: Option<usize>,

		/// Neighbor table or `.vec` word vectors enabling the fallback
		#[arg(long)]
		embedding: Option<PathBuf>,

		/// Completions shown per line
		#[arg(long)]
		suggestions: Option<usize>,
	},

	/// Average perplexity of every order from 1 to `max_n`
	Evaluate {
		#[arg(long, default_value_t = 5)]
		max_n: usize,
	},

	/// Score one n-gram; the order is the number of words
	Score {
		#[arg(required = true)]
		words: Vec<String>,
	},
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init();
	let args = Args::parse();

	let mut config = match &args.config {
		Some(path) => Config::load(path)?,
		None => Config::default(),
	};
	if let Some(corpus) = args.corpus {
		config.corpus = corpus;
	}

	match args.command {
		Command::Repl { n, embedding, suggestions } => {
			config.order = n.unwrap_or(config.order);
			config.embedding = embedding.or(config.embedding);
			config.suggestions = suggestions.unwrap_or(config.suggestions);

			let mut model = NGramModel::from_config(&config)?;
			repl::run(&mut model, config.suggestions, io::stdin().lock(), io::stdout().lock())?;
		}
		Command::Evaluate { max_n } => {
			let corpus = Arc::new(Corpus::from_file(&config.corpus)?);
			for n in 1..=max_n {
				let model = NGramModel::new(corpus.clone(), n)?;
				match model.average_perplexity() {
					Some(perplexity) => println!("{}-grams: {}", n, perplexity),
					None => println!("{}-grams: no n-grams in corpus", n),
				}
			}
		}
		Command::Score { words } => {
			let model = NGramModel::from_file(&config.corpus, words.len())?;
			let score = model.score(&words)?;
			info!("scored {:?}", words);
			println!("perplexity: {}", score.perplexity);
			println!("probability: {}", score.probability);
			println!("count: {}", score.count);
		}
	}

	Ok(())
}
