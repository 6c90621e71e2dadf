use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn command_score() -> anyhow::Result<()> {
    let input = "((A,B),(C,D));\n((A,B),(C,D));\n((A,C),(B,D));\n";
    let mut cmd = cargo_bin_cmd!("mulrf");
    let output = cmd.arg("score").arg("stdin").write_stdin(input).output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "[ Species Tree: Unrooted RF Score = 2.00]");
    assert_eq!(lines[3], "[ Gene Tree 0 MulRF Score = 0.00]");
    assert_eq!(lines[4], "[&WEIGHT=1.00]((A,B),(C,D));");
    assert_eq!(lines[6], "[ Gene Tree 1 MulRF Score = 2.00]");

    Ok(())
}

#[test]
fn command_score_weighted() -> anyhow::Result<()> {
    let input = "((A,B),(C,D));\n[&WEIGHT=0.25]((A,C),(B,D));\n[&WEIGHT=0.5]((A,D),(B,C));\n";
    let mut cmd = cargo_bin_cmd!("mulrf");
    cmd.arg("score").write_stdin(input);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Unrooted RF Score = 1.50]"))
        .stdout(predicate::str::contains("[ Gene Tree 0 MulRF Score = 0.50]"))
        .stdout(predicate::str::contains("[ Gene Tree 1 MulRF Score = 1.00]"));

    Ok(())
}

#[test]
fn command_score_trims_unknown() -> anyhow::Result<()> {
    let input = "((A,B),(C,(D,X)));\n((A,B),(C,D));\n";
    let mut cmd = cargo_bin_cmd!("mulrf");
    let output = cmd.arg("score").write_stdin(input).output()?;
    let stdout = String::from_utf8(output.stdout)?;
    let stderr = String::from_utf8(output.stderr)?;

    assert!(output.status.success());
    assert!(stdout.contains("Unrooted RF Score = 0.00]"));
    assert!(!stdout.lines().nth(1).unwrap().contains('X'));
    assert!(stderr.contains("Species tree leaf X is in no gene tree"));

    Ok(())
}

#[test]
fn command_score_multi_labelled() -> anyhow::Result<()> {
    let input = "((A,B),(C,D));\n(((A,A),B),(C,D));\n((A,(A,B)),(C,D));\n";
    let mut cmd = cargo_bin_cmd!("mulrf");
    cmd.arg("score").write_stdin(input);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("[ Gene Tree 0 MulRF Score = 0.00]"));

    Ok(())
}

#[test]
fn command_score_errors() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("mulrf");
    cmd.arg("score").write_stdin("((A,B),(C,D));\n");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No input trees found"));

    let mut cmd = cargo_bin_cmd!("mulrf");
    cmd.arg("score")
        .write_stdin("((A,B,C),D);\n((A,B),(C,D));\n");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Initial species tree is not binary"));

    let mut cmd = cargo_bin_cmd!("mulrf");
    cmd.arg("score")
        .write_stdin("((A,B),(A,D));\n((A,B),(C,D));\n");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("more than once"));

    Ok(())
}
