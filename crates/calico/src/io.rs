//! Output and input abstraction for the interpreter.
//!
//! `print`/`printr` write through a [`PrintWriter`] and `read` pulls tokens
//! through a [`ReadInput`], so embedders and tests can capture or feed the
//! program's I/O without touching the process streams.

use std::{
    borrow::Cow,
    io::{Read, Write},
};

/// Trait for handling output from the `print`/`printr` builtins.
pub trait PrintWriter {
    /// Writes one formatted value, without separators or terminators.
    fn stdout_write(&mut self, output: Cow<'_, str>);

    /// Writes a single separator or terminator character.
    fn stdout_push(&mut self, end: char);
}

/// Default `PrintWriter` that writes straight to stdout.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn stdout_write(&mut self, output: Cow<'_, str>) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(output.as_bytes());
    }

    fn stdout_push(&mut self, end: char) {
        let mut stdout = std::io::stdout().lock();
        let mut buf = [0u8; 4];
        let _ = stdout.write_all(end.encode_utf8(&mut buf).as_bytes());
        if end == '\n' {
            let _ = stdout.flush();
        }
    }
}

/// A `PrintWriter` that collects all output into a string.
///
/// Useful for testing or capturing print output programmatically.
#[derive(Debug, Default)]
pub struct CollectStringPrint(String);

impl CollectStringPrint {
    #[must_use]
    pub fn new() -> Self {
        Self(String::new())
    }

    /// The collected output so far.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.0
    }

    /// Consumes the writer and returns the collected output.
    #[must_use]
    pub fn into_output(self) -> String {
        self.0
    }
}

impl PrintWriter for CollectStringPrint {
    fn stdout_write(&mut self, output: Cow<'_, str>) {
        self.0.push_str(&output);
    }

    fn stdout_push(&mut self, end: char) {
        self.0.push(end);
    }
}

/// `PrintWriter` that ignores all output.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn stdout_write(&mut self, _output: Cow<'_, str>) {}

    fn stdout_push(&mut self, _end: char) {}
}

/// Trait supplying tokens to the `read` builtin (the `__read__` protocol).
pub trait ReadInput {
    /// Returns the next whitespace-delimited token, or `None` at end of
    /// input.
    fn read_token(&mut self) -> Option<String>;
}

/// Reads tokens from the process's stdin, one byte at a time.
#[derive(Debug, Default)]
pub struct StdInput;

impl ReadInput for StdInput {
    fn read_token(&mut self) -> Option<String> {
        let stdin = std::io::stdin();
        let mut token = String::new();
        for byte in stdin.lock().bytes() {
            let Ok(byte) = byte else { break };
            if byte.is_ascii_whitespace() {
                if token.is_empty() {
                    continue;
                }
                break;
            }
            token.push(byte as char);
        }
        if token.is_empty() { None } else { Some(token) }
    }
}

/// Feeds tokens from a fixed string; for tests and embedding.
#[derive(Debug)]
pub struct StrInput {
    tokens: Vec<String>,
    next: usize,
}

impl StrInput {
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self {
            tokens: input.split_ascii_whitespace().map(str::to_owned).collect(),
            next: 0,
        }
    }
}

impl ReadInput for StrInput {
    fn read_token(&mut self) -> Option<String> {
        let token = self.tokens.get(self.next).cloned();
        if token.is_some() {
            self.next += 1;
        }
        token
    }
}
