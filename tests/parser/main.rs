use anyhow::Result;
use rtt_provision_runner::{Error, Instruction, ScriptFile, ScriptParser};

#[test]
fn parse_command() -> Result<()> {
    let source = "modem set psk abcdef";
    let instructions = ScriptParser::parse(source)?;
    assert_eq!(1, instructions.len());
    assert!(matches!(
        instructions.first(),
        Some(Instruction::Command("modem set psk abcdef"))
    ));
    Ok(())
}

#[test]
fn parse_command_trimmed() -> Result<()> {
    let source = "  modem start  \r\n\r\nmodem stop\n";
    let instructions = ScriptParser::parse(source)?;
    assert_eq!(2, instructions.len());
    assert!(matches!(
        instructions.first(),
        Some(Instruction::Command("modem start"))
    ));
    assert!(matches!(
        instructions.get(1),
        Some(Instruction::Command("modem stop"))
    ));
    Ok(())
}

#[test]
fn parse_send() -> Result<()> {
    let source = "#$ send help";
    let instructions = ScriptParser::parse(source)?;
    assert_eq!(1, instructions.len());
    assert!(matches!(instructions.first(), Some(Instruction::Send("help"))));
    Ok(())
}

#[test]
fn parse_send_raw() -> Result<()> {
    let source = "#$ send-raw help\n#$ sendraw help";
    let result = ScriptParser::parse(source);
    assert!(matches!(result, Err(Error::UnknownInstruction(_))));

    let instructions = ScriptParser::parse("#$ send-raw help")?;
    assert!(matches!(
        instructions.first(),
        Some(Instruction::SendRaw("help"))
    ));
    Ok(())
}

#[test]
fn parse_sleep() -> Result<()> {
    let source = "#$ sleep 500";
    let instructions = ScriptParser::parse(source)?;
    assert_eq!(1, instructions.len());
    assert!(matches!(instructions.first(), Some(Instruction::Sleep(500))));
    Ok(())
}

#[test]
fn parse_drain() -> Result<()> {
    let source = "#$ drain\nmodem start";
    let instructions = ScriptParser::parse(source)?;
    assert_eq!(2, instructions.len());
    assert!(matches!(instructions.first(), Some(Instruction::Drain)));
    assert!(matches!(
        instructions.get(1),
        Some(Instruction::Command("modem start"))
    ));
    Ok(())
}

#[test]
fn parse_expect() -> Result<()> {
    let source = "#$ expect psk ok";
    let instructions = ScriptParser::parse(source)?;
    assert_eq!(1, instructions.len());
    assert!(matches!(
        instructions.first(),
        Some(Instruction::Expect("psk ok"))
    ));
    Ok(())
}

#[test]
fn parse_regex() -> Result<()> {
    let source = "#$ regex psk ok: [0-9a-f]+";
    let instructions = ScriptParser::parse(source)?;
    assert_eq!(1, instructions.len());
    assert!(matches!(
        instructions.first(),
        Some(Instruction::Regex("psk ok: [0-9a-f]+"))
    ));
    Ok(())
}

#[test]
fn parse_comment() -> Result<()> {
    let source = "# configure the modem";
    let instructions = ScriptParser::parse(source)?;
    assert_eq!(1, instructions.len());
    assert!(matches!(
        instructions.first(),
        Some(Instruction::Comment("# configure the modem"))
    ));
    Ok(())
}

#[test]
fn parse_hash_inside_command() -> Result<()> {
    let source = "modem set psk ab#cd\n  # indented comment\n";
    let instructions = ScriptParser::parse(source)?;
    assert_eq!(2, instructions.len());
    assert!(matches!(
        instructions.first(),
        Some(Instruction::Command("modem set psk ab#cd"))
    ));
    assert!(matches!(
        instructions.get(1),
        Some(Instruction::Comment("# indented comment"))
    ));
    Ok(())
}

#[test]
fn parse_directive_arguments() {
    for source in ["#$ sleep", "#$ sleep soon", "#$ expect", "#$ drain now"] {
        let result = ScriptParser::parse(source);
        match result {
            Err(Error::Argument(line)) => assert_eq!(source, line),
            other => panic!("unexpected result {:?}", other),
        }
    }
}

#[test]
fn parse_directive_keyword_is_a_word() {
    for source in ["#$ sendhelp", "#$ drained", "#$"] {
        let result = ScriptParser::parse(source);
        assert!(matches!(result, Err(Error::UnknownInstruction(_))));
    }
}

#[test]
fn parse_unknown_instruction() -> Result<()> {
    let source = "#$ frobnicate";
    let result = ScriptParser::parse(source);
    match result {
        Err(Error::UnknownInstruction(text)) => {
            assert_eq!("#$ frobnicate", text);
        }
        other => panic!("unexpected result {:?}", other),
    }
    Ok(())
}

#[test]
fn parse_include() -> Result<()> {
    let script = ScriptFile::parse("tests/fixtures/include.rtt")?;
    let instructions = script.instructions();
    assert_eq!(2, instructions.len());
    assert!(matches!(instructions.first(), Some(Instruction::Include(_))));
    assert!(matches!(
        instructions.get(1),
        Some(Instruction::Command("modem start"))
    ));
    Ok(())
}

#[test]
fn parse_include_missing() -> Result<()> {
    let source = "#$ include missing.rtt";
    let result =
        ScriptParser::parse_file(source, "tests/fixtures/include.rtt");
    assert!(matches!(result, Err(Error::Include(_, _))));
    Ok(())
}

#[test]
fn parse_fixture() -> Result<()> {
    let script = ScriptFile::parse("tests/fixtures/provision.rtt")?;
    let instructions = script.instructions();
    assert!(matches!(instructions.first(), Some(Instruction::Comment(_))));
    assert!(matches!(instructions.get(1), Some(Instruction::Send("help"))));
    assert!(matches!(instructions.get(2), Some(Instruction::Sleep(5))));
    assert!(matches!(instructions.get(3), Some(Instruction::Drain)));
    assert!(matches!(
        instructions.get(4),
        Some(Instruction::Command("modem set psk $RTT_TEST_PSK"))
    ));
    assert_eq!(8, instructions.len());
    Ok(())
}

#[test]
fn interpolate_env_var() -> Result<()> {
    std::env::set_var("RTT_PARSER_PSK", "abcdef");
    let value = ScriptParser::interpolate("modem set psk $RTT_PARSER_PSK")?;
    assert_eq!("modem set psk abcdef", value.as_ref());

    let value = ScriptParser::interpolate("modem set apn $RTT_PARSER_UNSET")?;
    assert_eq!("modem set apn $RTT_PARSER_UNSET", value.as_ref());

    let value = ScriptParser::interpolate("modem start")?;
    assert_eq!("modem start", value.as_ref());
    Ok(())
}
