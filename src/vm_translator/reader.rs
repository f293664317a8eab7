// VM Command Reader
// Strips comments and whitespace from source lines and classifies them into Commands

use crate::vm_translator::command::{Command, CommandKind};
use crate::vm_translator::error::TranslatorError;

const COMMENT_PREFIX: &str = "//";

/// Remove a trailing `//` comment and surrounding whitespace
pub fn strip_line(raw: &str) -> &str {
    match raw.find(COMMENT_PREFIX) {
        Some(pos) => raw[..pos].trim(),
        None => raw.trim(),
    }
}

/// Classify one already-stripped, non-empty line
pub fn parse_line(line: &str) -> Result<Command, TranslatorError> {
    let mut tokens = line.split_whitespace();
    let mnemonic = tokens
        .next()
        .ok_or_else(|| TranslatorError::UnrecognizedCommand(String::new()))?;

    let kind = CommandKind::from_mnemonic(mnemonic)
        .ok_or_else(|| TranslatorError::UnrecognizedCommand(mnemonic.to_string()))?;

    match kind.operand_count() {
        0 => match kind {
            CommandKind::Arithmetic => Command::new(kind, Some(mnemonic.to_string()), None),
            _ => Command::new(kind, None, None),
        },
        1 => {
            let name = required_token(tokens.next(), mnemonic, "name")?;
            Command::new(kind, Some(name.to_string()), None)
        }
        _ => {
            let name = required_token(tokens.next(), mnemonic, "name")?;
            let raw_value = required_token(tokens.next(), mnemonic, "integer")?;
            // Full u16 range; see AddressMode::Immediate for constants
            let value = raw_value.parse::<u16>().map_err(|_| {
                TranslatorError::MalformedOperand(format!(
                    "'{}' expects a non-negative integer, found '{}'",
                    mnemonic, raw_value
                ))
            })?;
            Command::new(kind, Some(name.to_string()), Some(value))
        }
    }
}

fn required_token<'a>(
    token: Option<&'a str>,
    mnemonic: &str,
    what: &str,
) -> Result<&'a str, TranslatorError> {
    token.ok_or_else(|| {
        TranslatorError::MalformedOperand(format!("'{}' is missing its {} operand", mnemonic, what))
    })
}

/// Sequential reader over the lines of one translation unit.
///
/// Yields `(line_number, Command)` pairs with 1-based line numbers; blank and
/// comment-only lines are skipped. Parse failures are yielded once, after
/// which the reader is exhausted.
pub struct CommandReader<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    failed: bool,
}

impl<'a> CommandReader<'a> {
    pub fn new(source: &'a str) -> Self {
        CommandReader {
            lines: source.lines().enumerate(),
            failed: false,
        }
    }
}

impl<'a> Iterator for CommandReader<'a> {
    type Item = Result<(usize, Command), (usize, TranslatorError)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        for (index, raw) in self.lines.by_ref() {
            let line = strip_line(raw);
            if line.is_empty() {
                continue;
            }

            let line_number = index + 1;
            return match parse_line(line) {
                Ok(command) => Some(Ok((line_number, command))),
                Err(err) => {
                    self.failed = true;
                    Some(Err((line_number, err)))
                }
            };
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm_translator::command::ArithmeticOp;

    #[test]
    fn test_strip_line() {
        assert_eq!(strip_line("  push constant 7   // seven"), "push constant 7");
        assert_eq!(strip_line("// only a comment"), "");
        assert_eq!(strip_line("\t\r"), "");
        assert_eq!(strip_line("add//tight"), "add");
    }

    #[test]
    fn test_parse_every_kind() {
        assert_eq!(parse_line("add").unwrap(), Command::arithmetic(ArithmeticOp::Add));
        assert_eq!(parse_line("push argument 2").unwrap(), Command::push("argument", 2));
        assert_eq!(parse_line("pop that 5").unwrap(), Command::pop("that", 5));
        assert_eq!(parse_line("label LOOP_START").unwrap(), Command::label("LOOP_START"));
        assert_eq!(parse_line("goto END").unwrap(), Command::goto("END"));
        assert_eq!(parse_line("if-goto END").unwrap(), Command::if_goto("END"));
        assert_eq!(parse_line("function Main.fib 0").unwrap(), Command::function("Main.fib", 0));
        assert_eq!(parse_line("call Main.fib 1").unwrap(), Command::call("Main.fib", 1));
        assert_eq!(parse_line("return").unwrap(), Command::ret());
    }

    #[test]
    fn test_segment_names_are_not_validated_here() {
        assert_eq!(parse_line("push heap 3").unwrap(), Command::push("heap", 3));
    }

    #[test]
    fn test_unrecognized_mnemonic() {
        assert_eq!(
            parse_line("mul").unwrap_err(),
            TranslatorError::UnrecognizedCommand("mul".to_string())
        );
    }

    #[test]
    fn test_malformed_operands() {
        for line in ["push constant", "push", "pop local x", "call Foo -1", "label", "function f 1.5"] {
            let err = parse_line(line).unwrap_err();
            assert!(
                matches!(err, TranslatorError::MalformedOperand(_)),
                "'{}' should be a malformed operand, got {:?}",
                line,
                err
            );
        }
    }

    #[test]
    fn test_operands_span_u16() {
        assert_eq!(parse_line("push constant 40000").unwrap(), Command::push("constant", 40000));
        assert!(matches!(
            parse_line("push constant 65536"),
            Err(TranslatorError::MalformedOperand(_))
        ));
    }

    #[test]
    fn test_reader_skips_blank_lines_and_reports_line_numbers() {
        let source = "// header\n\npush constant 1\n   \npush constant 2 // two\nadd\n";
        let commands: Vec<_> = CommandReader::new(source).map(|r| r.unwrap()).collect();
        assert_eq!(
            commands,
            vec![
                (3, Command::push("constant", 1)),
                (5, Command::push("constant", 2)),
                (6, Command::arithmetic(ArithmeticOp::Add)),
            ]
        );
    }

    #[test]
    fn test_reader_stops_after_first_error() {
        let source = "push constant 1\nbogus\npush constant 2\n";
        let mut reader = CommandReader::new(source);
        assert!(reader.next().unwrap().is_ok());
        let (line, err) = reader.next().unwrap().unwrap_err();
        assert_eq!(line, 2);
        assert_eq!(err, TranslatorError::UnrecognizedCommand("bogus".to_string()));
        assert!(reader.next().is_none());
    }
}
