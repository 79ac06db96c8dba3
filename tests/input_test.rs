//! Console input tests
//!
//! Tests the command table and how lines are interpreted in and out of
//! an answer

use kidspeak::input::{create_default_commands, Command, LineAction, LineInterpreter};
use kidspeak::questions::QuestionBank;

fn interpreter() -> LineInterpreter {
    LineInterpreter::new(create_default_commands())
}

#[test]
fn test_command_table_creation() {
    let commands = create_default_commands();

    assert_eq!(commands.get("r"), Some(&Command::Repeat));
    assert_eq!(commands.get("repeat"), Some(&Command::Repeat));
    assert_eq!(commands.get("l"), Some(&Command::Listen));
    assert_eq!(commands.get("listen"), Some(&Command::Listen));
    assert_eq!(commands.get("a"), Some(&Command::ToggleAutoListen));
    assert_eq!(commands.get("b"), Some(&Command::Back));
    assert_eq!(commands.get("q"), Some(&Command::Quit));
    assert_eq!(commands.get("h"), Some(&Command::Help));
    assert_eq!(commands.get("cow"), None);
}

#[test]
fn test_commands_are_case_insensitive() {
    let bank = QuestionBank::builtin();
    let interpreter = interpreter();

    assert_eq!(
        interpreter.interpret("  REPEAT ", false, &bank),
        LineAction::Command(Command::Repeat)
    );
    // Commands still work while an answer is awaited
    assert_eq!(
        interpreter.interpret("Back", true, &bank),
        LineAction::Command(Command::Back)
    );
}

#[test]
fn test_level_selection() {
    let bank = QuestionBank::builtin();
    let interpreter = interpreter();

    match interpreter.interpret("2", false, &bank) {
        LineAction::SelectLevel(level) => assert_eq!(level.name, "Intermediate"),
        other => panic!("expected level selection, got {:?}", other),
    }
    match interpreter.interpret("expert", false, &bank) {
        LineAction::SelectLevel(level) => assert_eq!(level.name, "Expert"),
        other => panic!("expected level selection, got {:?}", other),
    }

    assert_eq!(
        interpreter.interpret("7", false, &bank),
        LineAction::Unknown("7".to_string())
    );
    assert_eq!(interpreter.interpret("   ", false, &bank), LineAction::Empty);
}

#[test]
fn test_lines_are_answers_while_answering() {
    let bank = QuestionBank::builtin();
    let interpreter = interpreter();

    assert_eq!(
        interpreter.interpret(" It's a Cat ", true, &bank),
        LineAction::Answer("It's a Cat".to_string())
    );
    // Level names and numbers are answers too
    assert_eq!(
        interpreter.interpret("3", true, &bank),
        LineAction::Answer("3".to_string())
    );
    // A blank line is handed over so it can count as no speech
    assert_eq!(
        interpreter.interpret("", true, &bank),
        LineAction::Answer(String::new())
    );
}
