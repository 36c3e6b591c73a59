//! Interactive line loop.

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use zen_eval::{Config, EnvRef, Environment, Interpreter, Value, DEFAULT_SOURCE_NAME};
use zen_types::{Result, SourceFile};

use crate::error::{format_error, CliResult};
use crate::runner::flush_printed;

const PROMPT: &str = ">> ";
const CONTINUATION_PROMPT: &str = ".. ";

/// An interactive session. Every input runs in the same top-level scope.
pub struct Repl {
    interpreter: Interpreter,
    env: EnvRef,
    json: bool,
}

impl Repl {
    pub fn new(config: Config, json: bool) -> Self {
        Self {
            interpreter: Interpreter::new(config),
            env: Environment::root(),
            json,
        }
    }

    /// Evaluate one complete input against the session scope.
    pub fn eval_input(&mut self, input: &str) -> Result<Value> {
        let result = self.interpreter.evaluate(input, &self.env);
        flush_printed(&mut self.interpreter);
        result
    }

    pub fn run(&mut self) -> CliResult<()> {
        let mut editor = DefaultEditor::new()?;
        let mut buffer = String::new();
        loop {
            let prompt = if buffer.is_empty() {
                PROMPT
            } else {
                CONTINUATION_PROMPT
            };
            let line = match editor.readline(prompt) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) if !buffer.is_empty() => {
                    buffer.clear();
                    continue;
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            };

            if buffer.is_empty() {
                let trimmed = line.trim();
                if trimmed == ":quit" || trimmed == ":exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
            }
            buffer.push_str(&line);
            buffer.push('\n');
            if needs_more_input(&buffer) {
                continue;
            }

            let input = std::mem::take(&mut buffer);
            editor.add_history_entry(input.trim_end()).ok();
            match self.eval_input(&input) {
                Ok(Value::Nil) => {}
                Ok(value) => println!("{value:?}"),
                Err(err) => {
                    let unit = SourceFile::new(DEFAULT_SOURCE_NAME, input);
                    eprintln!("{}", format_error(&err, &unit, self.json));
                }
            }
        }
        Ok(())
    }
}

/// Whether `source` has an unclosed `{`, `(`, string or block comment, so
/// the loop should keep reading lines before evaluating.
pub fn needs_more_input(source: &str) -> bool {
    let mut depth: i32 = 0;
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' | '(' => depth += 1,
            '}' | ')' => depth -= 1,
            '"' => {
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        '"' => {
                            closed = true;
                            break;
                        }
                        _ => {}
                    }
                }
                if !closed {
                    return true;
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                let mut closed = false;
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        closed = true;
                        break;
                    }
                    prev = c;
                }
                if !closed {
                    return true;
                }
            }
            _ => {}
        }
    }
    // Extra closers are left for the parser to report.
    depth > 0
}
