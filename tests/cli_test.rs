mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::{SERVICE_ID, USER_ID, write_seed};
use predicates::prelude::*;
use std::process::Command;
use tempfile::{TempDir, tempdir};

fn seeded(dir: &TempDir, args: &[&str]) -> Result<Command, Box<dyn std::error::Error>> {
    let seed = dir.path().join("seed.json");
    write_seed(&seed)?;

    let mut cmd = Command::new(cargo_bin!("decor-booking"));
    cmd.arg("--seed").arg(&seed).args(args);
    Ok(cmd)
}

#[test]
fn test_cli_lists_seeded_services() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seeded(&dir, &["services"])?
        .assert()
        .success()
        .stdout(predicate::str::contains("Wedding Stage Decoration"))
        .stdout(predicate::str::contains(SERVICE_ID));
    Ok(())
}

#[test]
fn test_cli_top_decorators_skip_disabled() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seeded(&dir, &["top-decorators"])?
        .assert()
        .success()
        .stdout(predicate::str::contains("mim@live.com"))
        .stdout(predicate::str::contains("old@live.com").not());
    Ok(())
}

#[test]
fn test_cli_set_role_reports_profile() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seeded(&dir, &["set-role", USER_ID, "decorator"])?
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""outcome": "created""#))
        .stdout(predicate::str::contains(r#""previousRole": "user""#));
    Ok(())
}

#[test]
fn test_cli_books_pending() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seeded(&dir, &[
        "book",
        "--user",
        "tuba@live.com",
        "--service",
        SERVICE_ID,
        "--date",
        "2026-12-20",
        "--location",
        "Dhaka",
    ])?
    .assert()
    .success()
    .stdout(predicate::str::contains(r#""status": "pending""#))
    .stdout(predicate::str::contains(r#""paymentStatus": "unpaid""#));
    Ok(())
}

#[test]
fn test_cli_unknown_booking_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seeded(&dir, &[
        "update-booking",
        "5d0c7a4e-1b2f-4c3d-8e9f-a0b1c2d3e4f5",
        "--status",
        "completed",
    ])?
    .assert()
    .failure()
    .stderr(predicate::str::contains("not found"));
    Ok(())
}

#[test]
fn test_cli_rejects_malformed_id() {
    let mut cmd = Command::new(cargo_bin!("decor-booking"));
    cmd.args(["set-role", "not-an-id", "admin"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("malformed id"));
}

#[test]
fn test_cli_charge_declined() {
    let mut cmd = Command::new(cargo_bin!("decor-booking"));
    cmd.args(["charge", "--method", "pm_card_declined", "100"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("declined"));
}

#[test]
fn test_cli_sign_in_with_configured_token() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let config = dir.path().join("settings.toml");
    std::fs::write(
        &config,
        "[[credentials]]\ntoken = \"t-nadia\"\nemail = \"nadia@live.com\"\n",
    )?;

    let mut cmd = Command::new(cargo_bin!("decor-booking"));
    cmd.arg("--config")
        .arg(&config)
        .args(["sign-in", "--token", "t-nadia", "--name", "Nadia"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""email": "nadia@live.com""#))
        .stdout(predicate::str::contains(r#""role": "user""#));

    let mut cmd = Command::new(cargo_bin!("decor-booking"));
    cmd.arg("--config")
        .arg(&config)
        .args(["sign-in", "--token", "forged"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unauthenticated"));
    Ok(())
}
