//! Cassette replay integration tests - zero network I/O.
//!
//! All tests set `STORYBOARD_REPLAY` so the binary never contacts a live API.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use base64::Engine;
use predicates::prelude::*;

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

fn cmd(cassette: &Path) -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("storyboard");
    cmd.env("STORYBOARD_REPLAY", cassette)
        .env("STORYBOARD_CONFIG", "/nonexistent/storyboard/config.toml")
        .env_remove("GEMINI_API_KEY")
        .env_remove("API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("OPENROUTER_API_KEY");
    cmd
}

/// Absolute path to the `test_fixtures` directory.
fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_fixtures").join(name)
}

fn fresh_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn image_artifact_is_saved() {
    let dir = fresh_dir("storyboard_replay_image");
    let out = dir.join("lighthouse.png");

    cmd(&fixture("storyboard_session.cassette.yaml"))
        .args(["image", "-a", "16:9", "--style", "cinematic", "-o", out.to_str().unwrap()])
        .arg("a lighthouse in a storm")
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved:"));

    assert_eq!(std::fs::read(&out).unwrap(), PNG_MAGIC);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn auto_filename_uses_kebab_case_prompt() {
    let dir = fresh_dir("storyboard_replay_autofile");

    cmd(&fixture("storyboard_session.cassette.yaml"))
        .args(["image", "A lighthouse, in a storm!"])
        .current_dir(&dir)
        .assert()
        .success();

    let files: Vec<_> = std::fs::read_dir(&dir).unwrap().flatten().collect();
    assert_eq!(files.len(), 1, "exactly one file should be created");
    let name = files[0].file_name().to_string_lossy().into_owned();
    assert!(name.starts_with("a-lighthouse-in-a-storm-"), "got: {name}");
    assert!(name.ends_with(".png"), "got: {name}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn suggestions_strip_code_fences() {
    cmd(&fixture("storyboard_session.cassette.yaml"))
        .args(["suggest", "a lighthouse in a storm", "--category", "Camera Angles", "-n", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Low angle looking up"))
        .stdout(predicate::str::contains("Top down view"))
        .stdout(predicate::str::contains("Dutch angle").not());
}

#[test]
fn verbose_flag_shows_binary_diagnostics() {
    cmd(&fixture("storyboard_session.cassette.yaml"))
        .env_remove("RUST_LOG")
        .args(["-v", "suggest", "a lighthouse in a storm", "--category", "Camera Angles", "-n", "2"])
        .assert()
        .success()
        .stderr(predicate::str::contains("resolved settings"))
        .stderr(predicate::str::contains("replaying"));
}

#[test]
fn variation_batch_saves_numbered_files() {
    let dir = fresh_dir("storyboard_replay_batch");
    let out = dir.join("angles.png");

    cmd(&fixture("storyboard_session.cassette.yaml"))
        .args([
            "vary",
            "-i",
            "https://cdn.example.com/lighthouse.png",
            "--category",
            "Camera Angles",
            "--prompt",
            "Low angle looking up",
            "--prompt",
            "Top down view",
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert!(dir.join("angles-1.png").exists());
    assert!(dir.join("angles-2.png").exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn failed_batch_saves_nothing() {
    let dir = fresh_dir("storyboard_replay_batch_failure");
    let out = dir.join("story.png");

    cmd(&fixture("variation_failure.cassette.yaml"))
        .args([
            "vary",
            "-i",
            "https://cdn.example.com/lighthouse.png",
            "--category",
            "Narrative",
            "--prompt",
            "The storm breaks",
            "--prompt",
            "The storm passes",
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Variation generation failed"));

    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replayed_failure_is_reported_with_operation() {
    cmd(&fixture("variation_failure.cassette.yaml"))
        .args(["vary", "-i", "https://cdn.example.com/lighthouse.png", "--instruction", "night"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Error: Variation generation failed: Unsupported operation",
        ));
}

#[test]
fn format_jpeg_converts_png_artifact() {
    let png_bytes = {
        let img = image::DynamicImage::new_rgb8(2, 2);
        let mut buf = std::io::Cursor::new(Vec::<u8>::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    };
    let b64 = base64::engine::general_purpose::STANDARD.encode(&png_bytes);
    let dir = fresh_dir("storyboard_replay_convert");
    let cassette = dir.join("convert.cassette.yaml");
    std::fs::write(
        &cassette,
        format!(
            "name: convert\nrecorded_at: \"2026-03-14T10:00:00Z\"\ncommit: test\ninteractions:\n  \
             - seq: 0\n    port: provider\n    method: generate_variation\n    input: {{}}\n    \
             output:\n      Ok: \"data:image/png;base64,{b64}\"\n"
        ),
    )
    .unwrap();
    let out = dir.join("edited.jpg");

    cmd(&cassette)
        .args([
            "edit",
            "add rain",
            "-i",
            "https://cdn.example.com/lighthouse.png",
            "-f",
            "jpeg",
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved:"));

    let data = std::fs::read(&out).unwrap();
    assert_eq!(&data[..3], &[0xFF, 0xD8, 0xFF], "output should be a JPEG");
    let _ = std::fs::remove_dir_all(&dir);
}
