mod common;

use std::process::Command;

#[test]
fn cli_layout_writes_png_and_prints_layout() {
    let dir = tempfile::tempdir().unwrap();
    let background = dir.path().join("bg.png");
    std::fs::write(&background, common::solid_png(64, 48, [20, 120, 200, 255])).unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(
        &config,
        r#"{ "aspect_ratios": [ { "label": "sq", "canvas": { "width": 120, "height": 120 } } ] }"#,
    )
    .unwrap();
    let out_path = dir.path().join("nested/out.png");

    let out = Command::new(env!("CARGO_BIN_EXE_adcraft"))
        .args(["layout", "--aspect", "sq", "--text", "Fresh picks daily"])
        .arg("--background")
        .arg(&background)
        .arg("--config")
        .arg(&config)
        .arg("--font")
        .arg(common::font_path())
        .arg("--out")
        .arg(&out_path)
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );

    let img = image::open(&out_path).unwrap();
    assert_eq!((img.width(), img.height()), (120, 120));
    let layout: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(layout["safe_zone"]["y"], 90);
    assert!(!layout["lines"].as_array().unwrap().is_empty());
}

#[test]
fn cli_layout_rejects_unknown_aspect() {
    let dir = tempfile::tempdir().unwrap();
    let background = dir.path().join("bg.png");
    std::fs::write(&background, common::solid_png(8, 8, [0, 0, 0, 255])).unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_adcraft"))
        .args(["layout", "--aspect", "3x7", "--text", "hi"])
        .arg("--background")
        .arg(&background)
        .arg("--font")
        .arg(common::font_path())
        .arg("--out")
        .arg(dir.path().join("x.png"))
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("3x7"));
}
