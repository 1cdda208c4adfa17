use std::process::Command;

fn cultivator_defence() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cultivator-defence"))
}

#[test]
fn json_snapshot_reports_bounded_run() {
    let output = cultivator_defence()
        .args([
            "--max-ticks",
            "200",
            "--seed",
            "11",
            "--tower",
            "inner_disciple@5,4",
            "--json",
            "--log-level",
            "warn",
        ])
        .output()
        .expect("failed to launch cultivator-defence");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let snapshot: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is a JSON snapshot");
    assert_eq!(snapshot["wave"], 1);
    assert_eq!(snapshot["qi"].as_u64().map(|qi| qi >= 300), Some(true));
    assert_eq!(snapshot["towers"].as_array().map(Vec::len), Some(1));
    assert_eq!(snapshot["status"], "playing");
}

#[test]
fn unknown_defender_is_an_error() {
    let output = cultivator_defence()
        .args(["--max-ticks", "1", "--tower", "ghost@1,1"])
        .output()
        .expect("failed to launch cultivator-defence");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ghost"));
}

#[test]
fn speed_outside_supported_range_is_rejected() {
    let output = cultivator_defence()
        .args(["--speed", "4"])
        .output()
        .expect("failed to launch cultivator-defence");

    assert!(!output.status.success());
}
