use crate::{
    report::{Outcome, Report},
    Error, Instruction, Instructions, Result, ScriptParser,
};
use ouroboros::self_referencing;
use rtt_shell::{
    log::LogWriter, Exchange, RttShell, Sleep, Transport, Verdict,
};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{span, Level};

/// Script file.
#[derive(Debug)]
pub struct ScriptFile {
    path: PathBuf,
    source: ScriptSource,
}

impl ScriptFile {
    /// Path to the source file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Source contents of the file.
    pub fn source(&self) -> &str {
        self.source.borrow_source()
    }

    /// Script instructions.
    pub fn instructions(&self) -> &Instructions<'_> {
        self.source.borrow_instructions()
    }
}

#[self_referencing]
#[derive(Debug)]
/// Script source.
pub struct ScriptSource {
    /// Script source.
    pub source: String,
    /// Parsed instructions.
    #[borrows(source)]
    #[covariant]
    pub instructions: Instructions<'this>,
}

impl ScriptFile {
    /// Parse a collection of files.
    pub fn parse_files(paths: Vec<PathBuf>) -> Result<Vec<ScriptFile>> {
        let mut results = Vec::new();
        for path in paths {
            let script = Self::parse(path)?;
            results.push(script);
        }
        Ok(results)
    }

    /// Parse a single file.
    pub fn parse(path: impl AsRef<Path>) -> Result<ScriptFile> {
        tracing::debug!(path = ?path.as_ref(), "parse file");
        let source = Self::parse_source(path.as_ref())?;
        Ok(ScriptFile {
            path: path.as_ref().to_owned(),
            source,
        })
    }

    fn parse_source(path: impl AsRef<Path>) -> Result<ScriptSource> {
        let mut includes = Vec::new();
        let source = std::fs::read_to_string(path.as_ref())?;
        let mut source = ScriptSourceTryBuilder {
            source,
            instructions_builder: |source| {
                let (instructions, mut file_includes) =
                    ScriptParser::parse_file(source, path.as_ref())?;
                includes.append(&mut file_includes);
                Ok::<_, Error>(instructions)
            },
        }
        .try_build()?;

        // Insert from the back so earlier indices stay valid.
        for raw in includes.into_iter().rev() {
            let src = Self::parse_source(&raw.path)?;
            let instruction = Instruction::Include(src);
            source.with_instructions_mut(|i| {
                if raw.index < i.len() {
                    i.insert(raw.index, instruction);
                } else {
                    i.push(instruction);
                }
            });
        }

        Ok(source)
    }

    /// Run the instructions against a shell session.
    ///
    /// Failed and timed out steps are recorded in the report;
    /// transport errors abort the script.
    pub fn run<T, O, S>(&self, shell: &mut RttShell<T, O, S>) -> Result<Report>
    where
        T: Transport,
        O: LogWriter,
        S: Sleep,
    {
        let span = span!(Level::DEBUG, "run", script = ?self.path);
        let _enter = span.enter();

        let mut state = State {
            report: Report::new(&self.path),
            last: None,
        };
        exec(shell, self.source.borrow_instructions(), &mut state)?;

        let report = state.report;
        tracing::info!(
            pass = %report.count(Verdict::Pass),
            fail = %report.count(Verdict::Fail),
            timeout = %report.count(Verdict::Timeout),
            "script finished",
        );
        Ok(report)
    }
}

struct State {
    report: Report,
    /// Result of the most recent command, `Some(None)` on timeout.
    last: Option<Option<Exchange>>,
}

impl State {
    fn check(
        &mut self,
        step: String,
        matches: impl FnOnce(&str) -> bool,
    ) -> Result<()> {
        let last = self
            .last
            .as_ref()
            .ok_or_else(|| Error::NoExchange(step.clone()))?;
        let outcome = match last {
            Some(exchange) => Outcome {
                step,
                verdict: if matches(&exchange.output) {
                    Verdict::Pass
                } else {
                    Verdict::Fail
                },
                response: Some(exchange.response.clone()),
            },
            None => Outcome {
                step,
                verdict: Verdict::Timeout,
                response: None,
            },
        };
        if outcome.verdict == Verdict::Fail {
            tracing::error!(step = %outcome.step, "check failed");
        }
        self.report.push(outcome);
        Ok(())
    }
}

fn exec<T, O, S>(
    shell: &mut RttShell<T, O, S>,
    instructions: &[Instruction<'_>],
    state: &mut State,
) -> Result<()>
where
    T: Transport,
    O: LogWriter,
    S: Sleep,
{
    for cmd in instructions.iter() {
        tracing::debug!(instruction = ?cmd);
        match cmd {
            Instruction::Command(line) => {
                let line = ScriptParser::interpolate(line)?;
                let exchange = shell.run_exchange(line.as_ref())?;
                state
                    .report
                    .push(Outcome::exchange(line.as_ref(), exchange.as_ref()));
                state.last = Some(exchange);
            }
            Instruction::Send(text) => {
                let text = ScriptParser::interpolate(text)?;
                shell.send_line(text.as_ref())?;
            }
            Instruction::SendRaw(text) => {
                let text = ScriptParser::interpolate(text)?;
                shell.send_raw_line(text.as_ref())?;
            }
            Instruction::Sleep(delay) => {
                shell.sleep(Duration::from_millis(*delay));
            }
            Instruction::Drain => {
                shell.drain()?;
            }
            Instruction::Expect(text) => {
                state.check(format!("expect {}", text), |output| {
                    output.contains(text)
                })?;
            }
            Instruction::Regex(pattern) => {
                let regex = regex::Regex::new(pattern)?;
                state.check(format!("regex {}", pattern), |output| {
                    regex.is_match(output)
                })?;
            }
            Instruction::Comment(_) => {}
            Instruction::Include(source) => {
                exec(shell, source.borrow_instructions(), state)?;
            }
        }
    }
    Ok(())
}
