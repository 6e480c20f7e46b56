//! Tests running the `edgepress` binary.

use std::process::{Command, Output};

fn edgepress(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_edgepress"))
        .args(args)
        .env_remove("EDGEPRESS_API_URL")
        .env_remove("EDGEPRESS_EMAIL")
        .env_remove("EDGEPRESS_PASSWORD")
        .output()
        .expect("Failed to run edgepress")
}

#[test]
fn test_help_lists_subcommands() {
    let output = edgepress(&["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for subcommand in ["convert", "benchmark", "compress", "devices", "whoami"] {
        assert!(stdout.contains(subcommand), "missing {} in help", subcommand);
    }
}

#[test]
fn test_missing_credentials_is_a_usage_error() {
    let output = edgepress(&["whoami"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--email"));
}

#[test]
fn test_unreachable_api_fails_without_panicking() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);

    let output = edgepress(&[
        "--api-url",
        &format!("http://{}", dead),
        "--email",
        "dev@example.com",
        "--password",
        "secret",
        "whoami",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("panicked"));
}
