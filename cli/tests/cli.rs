use std::{
    fs,
    io::Write,
    process::{Command, Output, Stdio},
};

use pretty_assertions::assert_eq;

fn printcalc() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_printcalc"));
    command.env_remove("PRINTCALC_CONFIG").env_remove("RUST_LOG");
    command
}

fn stdout(output: Output) -> String {
    assert!(
        output.status.success(),
        "printcalc exited with error: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("non-utf8 output")
}

fn run(args: &[&str]) -> String {
    stdout(printcalc().args(args).output().expect("failed to run printcalc"))
}

#[test]
fn prints_each_line_with_its_result() {
    assert_eq!(
        run(&["# Section 1", "2+2", "r:=10", "r*2", "1/0"]),
        "# Section 1\n2+2 = 4\nr:=10 = 10\nr*2 = 20\n1/0 = error\n"
    );
}

#[test]
fn functions_and_carets() {
    assert_eq!(
        run(&["f(n) := n^2 + 1", "f(3)", "2^^3", "--", "-2**2"]),
        "f(n) := n^2 + 1\nf(3) = 10\n2^^3 = 1\n-2**2 = -4\n"
    );
}

#[test]
fn error_details_on_request() {
    assert_eq!(
        run(&["--details", "1/0", "nope + 1"]),
        "1/0 = error (division by zero)\nnope + 1 = error (unknown name `nope`)\n"
    );
}

#[test]
fn reads_a_file_and_exports() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("homework.calc");
    fs::write(&input, "# Area\nr := 2\npi * r**2 > 12\n").unwrap();
    let tape = dir.path().join("homework.md");

    let out = run(&[
        "--file",
        input.to_str().unwrap(),
        "--export",
        tape.to_str().unwrap(),
        "--title",
        "Homework",
        "r * 3",
    ]);
    assert_eq!(out, "# Area\nr := 2 = 2\npi * r**2 > 12 = true\nr * 3 = 6\n");
    assert_eq!(
        fs::read_to_string(&tape).unwrap(),
        "# Homework\n\nArea\n\n`pi * r**2 > 12` = true\n\n`r * 3` = 6\n"
    );
}

#[test]
fn export_format_flag_wins() {
    let dir = tempfile::tempdir().unwrap();
    let tape = dir.path().join("tape.md");
    run(&[
        "--export",
        tape.to_str().unwrap(),
        "--format",
        "plain",
        "1 + 1",
    ]);
    assert_eq!(fs::read_to_string(&tape).unwrap(), "1 + 1 = 2\n");
}

#[test]
fn config_from_the_environment() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("printcalc.json");
    fs::write(
        &config,
        r#"{ "export": { "format": "plain", "comment": "Checked" }, "show_error_details": true }"#,
    )
    .unwrap();
    let tape = dir.path().join("tape");

    let output = printcalc()
        .env("PRINTCALC_CONFIG", &config)
        .args(["--export", tape.to_str().unwrap(), "2*3", "1//0"])
        .output()
        .unwrap();
    assert_eq!(stdout(output), "2*3 = 6\n1//0 = error (division by zero)\n");
    assert_eq!(
        fs::read_to_string(&tape).unwrap(),
        "Checked\n\n2*3 = 6\n1//0 = error\n"
    );
}

#[test]
fn bad_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("printcalc.json");
    fs::write(&config, r#"{ "colour": "red" }"#).unwrap();
    let output = printcalc()
        .args(["--config", config.to_str().unwrap(), "1"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.starts_with("printcalc: invalid config"), "{stderr}");
}

#[test]
fn unknown_format_is_rejected() {
    let output = printcalc()
        .args(["--export", "out", "--format", "docx", "1"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn interactive_session() {
    let mut child = printcalc()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"a := 4\na / 2\n:edit 1 a := 10\n:list\n:delete 7\n:quit\n3 + 3\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    let stderr = String::from_utf8(output.stderr.clone()).unwrap();
    assert_eq!(
        stdout(output),
        "[1] a := 4 = 4\n[2] a / 2 = 2\n[1] a := 10 = 10\n[1] a := 10 = 10\n[2] a / 2 = 2\n"
    );
    assert_eq!(stderr, "there is no line 7\n");
}
