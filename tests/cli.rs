use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_scene() -> NamedTempFile {
    let scene = r#"<scene>
  <camera>
    <position>0 3 8</position>
  </camera>
  <object>
    <name>Top</name>
    <geometry>octahedron 1 0</geometry>
    <spin>0.5</spin>
  </object>
  <light>
    <name>Lamp</name>
    <type>spot</type>
    <intensity>2</intensity>
    <position>0 10 0</position>
    <target>orbit</target>
  </light>
</scene>
"#;
    let mut tmp = NamedTempFile::new().expect("temp scene");
    tmp.write_all(scene.as_bytes()).expect("write scene");
    tmp
}

#[test]
fn headless_run_spins_the_disco_ball() {
    let mut cmd = Command::cargo_bin("disco-scene").expect("binary exists");
    cmd.args(["--summary-only", "--frames", "100", "--time-ms", "1000"]);
    cmd.assert()
        .success()
        .stdout(contains("Loaded scene with 3 objects (5 lights)"))
        .stdout(contains(" - DiscoBall (octahedron)"))
        .stdout(contains("Final scene state after 100 frame(s):"))
        .stdout(contains(
            " - DiscoBall pos=(0.00, 15.00, 0.00) rotation=(0.00, 1.00, 0.00)",
        ))
        .stdout(contains(" - Sphere pos=(0.00, 1.00, 0.00) rotation=(0.00, 0.00, 0.00)"))
        .stdout(contains("Light target=(5.40, 5.40, 5.40)"));
}

#[test]
fn orbit_target_starts_at_ten() {
    let mut cmd = Command::cargo_bin("disco-scene").expect("binary exists");
    cmd.args(["--summary-only", "--time-ms", "0"]);
    cmd.assert()
        .success()
        .stdout(contains("Final scene state after 1 frame(s):"))
        .stdout(contains("Light target=(10.00, 10.00, 10.00)"));
}

#[test]
fn scene_file_replaces_the_built_in_scene() {
    let scene = write_scene();
    let mut cmd = Command::cargo_bin("disco-scene").expect("binary exists");
    cmd.arg("--scene")
        .arg(scene.path())
        .args(["--summary-only", "--frames", "2", "--time-ms", "0"]);
    cmd.assert()
        .success()
        .stdout(contains("Loaded scene with 1 objects (1 lights)"))
        .stdout(contains(" - Top pos=(0.00, 0.00, 0.00) rotation=(0.00, 1.00, 0.00)"))
        .stdout(contains(" - Lamp spot intensity=2.00 pos=(0.00, 10.00, 0.00)"))
        .stdout(contains("DiscoBall").not());
}

#[test]
fn unknown_argument_is_rejected() {
    let mut cmd = Command::cargo_bin("disco-scene").expect("binary exists");
    cmd.arg("--run-scripts");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --run-scripts"));
}

#[test]
fn invalid_scene_reports_the_parse_error() {
    let mut tmp = NamedTempFile::new().expect("temp scene");
    tmp.write_all(b"<scene><object><name>Broken</name><geometry>torus 1</geometry></object></scene>")
        .expect("write scene");
    let mut cmd = Command::cargo_bin("disco-scene").expect("binary exists");
    cmd.arg("--scene").arg(tmp.path()).arg("--summary-only");
    cmd.assert()
        .failure()
        .stderr(contains("failed to parse scene XML"))
        .stderr(contains("unknown geometry"));
}
