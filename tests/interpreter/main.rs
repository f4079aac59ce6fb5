use anyhow::Result;
use rtt_provision_runner::{
    shell::{
        log::NoopLogWriter, Error as ShellError, RttShell, ShellOptions,
        Sleep, Transport, Verdict,
    },
    Error, ScriptFile,
};
use std::{collections::HashMap, time::Duration};

const PROMPT: &str = "rtt:~$ ";

/// Shell which echoes commands and answers from a table.
///
/// Commands without an answer are ignored so the exchange times out.
#[derive(Default)]
struct FakeShell {
    answers: HashMap<String, String>,
    pending: Vec<u8>,
    written: Vec<String>,
    frames: Vec<Vec<u8>>,
}

impl FakeShell {
    fn answer(mut self, command: &str, response: &str) -> Self {
        self.answers.insert(command.to_owned(), response.to_owned());
        self
    }
}

impl Transport for FakeShell {
    fn read(
        &mut self,
        _channel: usize,
        buf: &mut [u8],
    ) -> std::result::Result<usize, ShellError> {
        let len = buf.len().min(self.pending.len());
        buf[..len].copy_from_slice(&self.pending[..len]);
        self.pending.drain(..len);
        Ok(len)
    }

    fn write(
        &mut self,
        _channel: usize,
        data: &[u8],
    ) -> std::result::Result<usize, ShellError> {
        let text = String::from_utf8_lossy(data);
        let command = text.trim_matches(|c| c == '\n' || c == '\0');
        if let Some(response) = self.answers.get(command) {
            let reply = format!("{}\r\n{}\r\n{}", command, response, PROMPT);
            self.pending.extend_from_slice(reply.as_bytes());
        }
        self.written.push(command.to_owned());
        self.frames.push(data.to_vec());
        Ok(data.len())
    }
}

#[derive(Default)]
struct RecordingSleep {
    calls: Vec<Duration>,
}

impl Sleep for RecordingSleep {
    fn sleep(&mut self, duration: Duration) {
        self.calls.push(duration);
    }
}

type TestShell = RttShell<FakeShell, NoopLogWriter, RecordingSleep>;

fn shell(fake: FakeShell, max_polls: u32) -> TestShell {
    let options = ShellOptions {
        max_polls,
        ..Default::default()
    };
    RttShell::new(fake, options).with_sleeper(RecordingSleep::default())
}

fn script(path: &str) -> Result<ScriptFile> {
    let mut files = ScriptFile::parse_files(vec![path.into()])?;
    Ok(files.remove(0))
}

#[test]
fn interpret_provision() -> Result<()> {
    std::env::set_var("RTT_TEST_PSK", "abcdef");
    let fake = FakeShell::default()
        .answer("help", "modem <set|get|start|stop>")
        .answer("modem set psk abcdef", "psk ok: abcdef")
        .answer("modem get psk", "psk ok: abcdef");
    let mut shell = shell(fake, 10);

    let report = script("tests/fixtures/provision.rtt")?.run(&mut shell)?;
    assert!(report.passed());

    let steps: Vec<&str> =
        report.outcomes().iter().map(|o| o.step.as_str()).collect();
    assert_eq!(
        vec![
            "modem set psk abcdef",
            "expect psk ok",
            "modem get psk",
            "regex psk ok: [0-9a-f]+",
        ],
        steps
    );
    assert_eq!(
        Some("psk ok: abcdef"),
        report.outcomes()[0].response.as_deref()
    );

    assert_eq!(vec![Duration::from_millis(5)], shell.sleeper().calls);
    let session = shell.into_session();
    assert_eq!(
        vec!["help", "modem set psk abcdef", "modem get psk"],
        session.get_transport().written
    );
    Ok(())
}

#[test]
fn interpret_include() -> Result<()> {
    let fake = FakeShell::default()
        .answer("modem set psk abcdef", "psk ok: abcdef")
        .answer("modem start", "modem ok");
    let mut shell = shell(fake, 10);

    let report = script("tests/fixtures/include.rtt")?.run(&mut shell)?;
    let steps: Vec<&str> =
        report.outcomes().iter().map(|o| o.step.as_str()).collect();
    assert_eq!(vec!["modem set psk abcdef", "modem start"], steps);
    assert!(report.passed());
    Ok(())
}

#[test]
fn interpret_rejected() -> Result<()> {
    let fake = FakeShell::default()
        .answer("modem set apn internet", "apn error: busy")
        .answer("modem start", "modem ok");
    let mut shell = shell(fake, 10);

    let report = script("tests/fixtures/rejected.rtt")?.run(&mut shell)?;
    let verdicts: Vec<Verdict> =
        report.outcomes().iter().map(|o| o.verdict).collect();
    assert_eq!(vec![Verdict::Fail, Verdict::Fail, Verdict::Pass], verdicts);
    assert_eq!(
        Some("apn error: busy"),
        report.outcomes()[0].response.as_deref()
    );
    assert!(!report.passed());
    assert_eq!(2, report.count(Verdict::Fail));
    Ok(())
}

#[test]
fn interpret_timeout() -> Result<()> {
    let fake = FakeShell::default().answer("modem start", "modem ok");
    let mut shell = shell(fake, 3);

    let report = script("tests/fixtures/rejected.rtt")?.run(&mut shell)?;
    let verdicts: Vec<Verdict> =
        report.outcomes().iter().map(|o| o.verdict).collect();
    assert_eq!(
        vec![Verdict::Timeout, Verdict::Timeout, Verdict::Pass],
        verdicts
    );
    assert_eq!(None, report.outcomes()[0].response);

    // Three polls plus the final wait.
    assert_eq!(4, shell.sleeper().calls.len());
    Ok(())
}

#[test]
fn interpret_check_without_command() -> Result<()> {
    let mut shell = shell(FakeShell::default(), 3);
    let result = script("tests/fixtures/no-command.rtt")?.run(&mut shell);
    assert!(matches!(result, Err(Error::NoExchange(_))));
    Ok(())
}

#[test]
fn interpret_send_raw() -> Result<()> {
    let mut shell = shell(FakeShell::default(), 3);
    let report = script("tests/fixtures/wake.rtt")?.run(&mut shell)?;
    assert!(report.outcomes().is_empty());
    assert_eq!(
        vec![b"help\n\0".to_vec(), b"\n\0help\n\0".to_vec()],
        shell.get_transport().frames
    );
    Ok(())
}
