//! The `process` subcommand: one document through the processor.

use anyhow::{Context, Result};
use std::{
    fs,
    io::{Read, Write},
    path::Path,
};

use crate::config::Config;
use crate::log;
use crate::tidy::TidyProcessor;

pub fn run(input: Option<&Path>, output: Option<&Path>, config: &Config) -> Result<()> {
    let processor = TidyProcessor::new(&config.tidy);

    let src = match input {
        Some(p) if p != Path::new("-") => {
            fs::read(p).with_context(|| format!("failed to read {}", p.display()))?
        }
        _ => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let out = processor.process(&src);

    match output {
        Some(p) if p != Path::new("-") => {
            fs::write(p, &out).with_context(|| format!("failed to write {}", p.display()))?;
            log!("process"; "{} ({} -> {} bytes)", p.display(), src.len(), out.len());
        }
        // Keep stdout clean for piping; the result is the only output.
        _ => std::io::stdout()
            .write_all(&out)
            .context("failed to write stdout")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.html");
        let output = dir.path().join("out.html");
        fs::write(&input, "<p>x</p><!-- gone --><p>y</p>").unwrap();

        let mut config = Config::default();
        config.override_options("REMOVE_COMMENTS").unwrap();
        run(Some(input.as_path()), Some(output.as_path()), &config).unwrap();

        let result = fs::read_to_string(&output).unwrap();
        assert_eq!(result, "<p>x</p><p>y</p>");
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.html");
        let config = Config::default();
        assert!(run(Some(missing.as_path()), None, &config).is_err());
    }
}
