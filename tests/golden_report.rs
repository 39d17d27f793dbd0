use std::fs;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

use imgduel::render::{Color, ReportRenderer, ReportSpec, ResultEntry, Surface};
use imgduel::ImageRef;

fn golden_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from("tests/goldens/expected");
    p.push(name);
    p
}

fn sample_image(w: u32, h: u32, color: Color) -> ImageRef {
    let s = Surface::new(w, h, color);
    ImageRef::from_bytes("image/png", &s.encode_png().unwrap())
}

fn fixed_spec() -> ReportSpec {
    ReportSpec {
        prompt: "a lighthouse keeper's cat, oil on canvas, dramatic storm light".to_string(),
        references: vec![sample_image(64, 48, Color::PANEL_GREY)],
        left: ResultEntry {
            image: sample_image(256, 256, Color::ACCENT_RED),
            label: "NANO".to_string(),
            latency_ms: 820,
            accent: Color::ACCENT_RED,
        },
        right: ResultEntry {
            image: sample_image(256, 192, Color::ACCENT_BLUE),
            label: "PRO".to_string(),
            latency_ms: 1340,
            accent: Color::ACCENT_BLUE,
        },
    }
}

#[tokio::test]
async fn golden_report_digest_matches_fixture() {
    // Fixed clock so the timestamp row and filename are reproducible.
    let report = ReportRenderer::default()
        .render_at(&fixed_spec(), 1_700_000_000_000)
        .await
        .expect("render report");

    let digest = hex::encode(Sha256::digest(&report.png_data));

    let expected_path = golden_path("report.sha256");
    if std::env::var("UPDATE_GOLDENS").is_ok() {
        fs::create_dir_all("tests/goldens/expected").ok();
        fs::write(&expected_path, &digest).expect("write golden");
        println!("Updated golden: {:?}", expected_path);
        return;
    }

    if !expected_path.exists() {
        println!(
            "No golden at {:?}; run with UPDATE_GOLDENS=1 to create it. Skipping.",
            expected_path
        );
        return;
    }

    let expected = fs::read_to_string(&expected_path).expect("unable to read golden");
    assert_eq!(digest, expected.trim());
}

#[tokio::test]
async fn report_is_deterministic_for_a_fixed_clock() {
    let spec = fixed_spec();
    let renderer = ReportRenderer::default();
    let a = renderer.render_at(&spec, 1_700_000_000_000).await.unwrap();
    let b = renderer.render_at(&spec, 1_700_000_000_000).await.unwrap();
    assert_eq!(a.png_data, b.png_data);
    assert_eq!(a.filename, "ImgDuel_Report_1700000000000.png");
}
