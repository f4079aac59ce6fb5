//! Line oriented parser for provisioning scripts.
//!
//! Each line of a script is one of:
//!
//! * blank, skipped
//! * a directive, `#$` followed by a keyword and its argument
//! * a comment, any other line starting with `#`
//! * a shell command, everything else
//!
//! Leading and trailing whitespace is ignored, so a `#` only starts a
//! comment at the beginning of a line. `modem set psk ab#cd` is a
//! command.
//!
//! | Directive              | Argument                    |
//! |------------------------|-----------------------------|
//! | `#$ send <text>`       | text written framed         |
//! | `#$ send-raw <text>`   | text written with one frame |
//! | `#$ sleep <ms>`        | milliseconds                |
//! | `#$ drain`             | none                        |
//! | `#$ expect <text>`     | substring of last output    |
//! | `#$ regex <pattern>`   | pattern over last output    |
//! | `#$ include <path>`    | script relative to this one |
use crate::{error::LexError, interpreter::ScriptSource, Error, Result};
use logos::Logos;
use regex::{Captures, Regex};
use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

const DIRECTIVE: &str = "#$";
const COMMENT: char = '#';

#[derive(Logos, Debug, PartialEq, Clone, Copy)]
#[logos(error = LexError)]
#[logos(skip r"[ \t]+")]
enum Keyword {
    #[token("send")]
    Send,
    #[token("send-raw")]
    SendRaw,
    #[token("sleep")]
    Sleep,
    #[token("drain")]
    Drain,
    #[token("expect")]
    Expect,
    #[token("regex")]
    Regex,
    #[token("include")]
    Include,
}

/// Include reference.
#[derive(Debug)]
pub struct Include {
    /// Path to the file.
    pub path: PathBuf,
    /// Index in the parent instructions.
    pub index: usize,
}

/// Instruction to execute.
#[derive(Debug)]
pub enum Instruction<'s> {
    /// Run a shell command and check its acknowledgment.
    Command(&'s str),
    /// Send framed text without waiting for a response.
    Send(&'s str),
    /// Send text followed by a single frame.
    SendRaw(&'s str),
    /// Sleep a while.
    Sleep(u64),
    /// Discard pending output.
    Drain,
    /// Expect a string in the output of the last command.
    Expect(&'s str),
    /// Expect a regex match in the output of the last command.
    Regex(&'s str),
    /// Comment text.
    Comment(&'s str),
    /// Include script.
    Include(ScriptSource),
}

/// Sequence of instructions to execute.
pub type Instructions<'s> = Vec<Instruction<'s>>;

enum Line<'s> {
    Instruction(Instruction<'s>),
    Include(&'s str),
}

/// Parser for provisioning scripts.
#[derive(Debug)]
pub struct ScriptParser;

impl ScriptParser {
    /// Parse input instructions.
    pub fn parse(source: &str) -> Result<Instructions<'_>> {
        let (instructions, _) = ScriptParser::parse_file(source, "")?;
        Ok(instructions)
    }

    /// Parse input instructions relative to a file path.
    ///
    /// Includes are returned separately with the position they take
    /// in the instructions, the caller parses and splices them.
    pub fn parse_file(
        source: &str,
        base: impl AsRef<Path>,
    ) -> Result<(Instructions<'_>, Vec<Include>)> {
        let mut instructions = Vec::new();
        let mut includes = Vec::new();
        for (number, line) in source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            tracing::trace!(line = %(number + 1), text = %line, "parse");
            if let Some(body) = line.strip_prefix(DIRECTIVE) {
                match Self::directive(line, body)? {
                    Line::Instruction(instruction) => {
                        instructions.push(instruction)
                    }
                    Line::Include(target) => includes.push(Include {
                        path: include_path(base.as_ref(), target)?,
                        index: instructions.len(),
                    }),
                }
            } else if line.starts_with(COMMENT) {
                instructions.push(Instruction::Comment(line));
            } else {
                instructions.push(Instruction::Command(line));
            }
        }
        Ok((instructions, includes))
    }

    fn directive<'s>(line: &'s str, body: &'s str) -> Result<Line<'s>> {
        let unknown = || Error::UnknownInstruction(line.to_owned());
        let mut lex = Keyword::lexer(body);
        let keyword = match lex.next() {
            Some(Ok(keyword)) => keyword,
            _ => return Err(unknown()),
        };
        // The keyword must be a whole word.
        let rest = lex.remainder();
        if !(rest.is_empty() || rest.starts_with([' ', '\t'])) {
            return Err(unknown());
        }

        let argument = rest.trim();
        let required = || {
            if argument.is_empty() {
                Err(Error::Argument(line.to_owned()))
            } else {
                Ok(argument)
            }
        };
        let instruction = match keyword {
            Keyword::Send => Instruction::Send(required()?),
            Keyword::SendRaw => Instruction::SendRaw(required()?),
            Keyword::Sleep => Instruction::Sleep(
                argument
                    .parse()
                    .map_err(|_| Error::Argument(line.to_owned()))?,
            ),
            Keyword::Drain if argument.is_empty() => Instruction::Drain,
            Keyword::Drain => return Err(Error::Argument(line.to_owned())),
            Keyword::Expect => Instruction::Expect(required()?),
            Keyword::Regex => Instruction::Regex(required()?),
            Keyword::Include => return Ok(Line::Include(required()?)),
        };
        Ok(Line::Instruction(instruction))
    }

    /// Replace `$NAME` with the value of the environment variable.
    ///
    /// Unknown variables are left untouched.
    pub fn interpolate(value: &str) -> Result<Cow<'_, str>> {
        if !value.contains('$') {
            return Ok(Cow::Borrowed(value));
        }
        let vars = Regex::new(r"\$([A-Za-z0-9_]+)")?;
        Ok(vars.replace_all(value, |caps: &Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_owned())
        }))
    }
}

/// Resolve an include target against the including script.
fn include_path(base: &Path, target: &str) -> Result<PathBuf> {
    let path = match base.parent() {
        Some(dir) if Path::new(target).is_relative() => dir.join(target),
        _ => PathBuf::from(target),
    };
    if path.is_file() {
        Ok(path)
    } else {
        Err(Error::Include(target.to_owned(), path))
    }
}
