use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceError {
    NotANumber,
    OutOfRange,
}

pub fn parse_choice(input: &str, len: usize) -> Result<usize, ChoiceError> {
    let idx: usize = input.trim().parse().map_err(|_| ChoiceError::NotANumber)?;
    if idx < len {
        Ok(idx)
    } else {
        Err(ChoiceError::OutOfRange)
    }
}

/// Asks for an index below `len` until a valid one is typed.
/// Returns `None` once input is exhausted.
pub fn choose<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
    len: usize,
) -> io::Result<Option<usize>> {
    loop {
        write!(output, "\n[?] {}: ", question)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        match parse_choice(&line, len) {
            Ok(idx) => return Ok(Some(idx)),
            Err(ChoiceError::NotANumber) => writeln!(output, "[!] Enter a valid number.")?,
            Err(ChoiceError::OutOfRange) => writeln!(output, "[!] Index out of range.")?,
        }
    }
}

/// Yes/no question, anything but `y`/`yes` counts as no.
pub fn confirm<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> io::Result<bool> {
    write!(output, "\n[?] {} [y/N]: ", question)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
