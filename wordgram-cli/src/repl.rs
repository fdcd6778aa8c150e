use std::io::{self, BufRead, Write};

use log::debug;

use wordgram_core::NGramModel;

use crate::completion::{TypedText, complete};

/// Line-oriented typing loop.
///
/// For every line: print completions for its tail, then learn the line.
/// `q` or end of input quits.
pub fn run<R: BufRead, W: Write>(model: &mut NGramModel, suggestions: usize, input: R, mut output: W) -> io::Result<()> {
	writeln!(output, "Welcome to wordgram ({}-gram model), 'q' to quit", model.order())?;

	let mut lines = input.lines();
	loop {
		write!(output, "> ")?;
		output.flush()?;

		let Some(line) = lines.next() else { break };
		let line = line?;
		if line.trim() == "q" {
			break;
		}

		let typed = TypedText::parse(model.normalizer(), &line);
		let completions = complete(model, &typed, suggestions);
		if !completions.is_empty() {
			writeln!(output, "  {}", completions.join(" | "))?;
		}

		model.update(&line);
		debug!("learned {:?}", line);
	}

	Ok(())
}
