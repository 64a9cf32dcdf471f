use std::io::{BufRead, Write};

use anyhow::{Result, anyhow};

use s3cleaner_rs::S3cleanerError;
use s3cleaner_rs::selection::{Selector, filter_candidates};

/// Terminal selection: shows a numbered list, accepts a number or a search
/// term. A search term narrows the list until one entry is left. An empty
/// line cancels; end of input fails with `InputUnavailable`.
pub struct StdioSelector;

impl Selector for StdioSelector {
    fn select_one(&self, label: &str, candidates: &[String]) -> Result<String> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        select_from(&mut stdin.lock(), &mut stdout, label, candidates)
    }
}

fn select_from<R, W>(input: &mut R, out: &mut W, label: &str, candidates: &[String]) -> Result<String>
where
    R: BufRead,
    W: Write,
{
    let mut shown: Vec<&String> = candidates.iter().collect();

    loop {
        writeln!(out, "{label}")?;
        for (index, candidate) in shown.iter().enumerate() {
            writeln!(out, "  {:>3}) {candidate}", index + 1)?;
        }
        write!(out, "Search or number: ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Err(anyhow!(S3cleanerError::InputUnavailable(format!(
                "input closed before an entry of '{label}' was selected"
            ))));
        }
        let answer = line.trim();
        if answer.is_empty() {
            return Err(anyhow!(S3cleanerError::Cancelled));
        }

        if let Ok(number) = answer.parse::<usize>() {
            if let Some(candidate) = number.checked_sub(1).and_then(|i| shown.get(i)) {
                return Ok((*candidate).clone());
            }
            writeln!(out, "No entry {number}.")?;
            continue;
        }

        let matched = filter_candidates(candidates, answer);
        match matched.len() {
            0 => writeln!(out, "Nothing matches '{answer}'.")?,
            1 => return Ok(matched[0].clone()),
            _ => shown = matched,
        }
    }
}
