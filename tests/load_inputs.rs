//! Loading parameters and images from disk.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::PathBuf;

use adcensus_disparity::prelude::*;
use adcensus_disparity::Error;

// -----------------------------------------------------------------------------------------------
// HELPERS
// -----------------------------------------------------------------------------------------------

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("adcensus-{}-{}", std::process::id(), name))
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[test]
fn params_from_json_file() -> Result<(), Box<dyn std::error::Error>> {
    let path = temp_path("params.json");
    std::fs::write(&path, r#"{ "max_disparity": 20, "aggregation_rounds": 1 }"#)?;

    let params = Params::from_json_file(&path)?;
    std::fs::remove_file(&path)?;

    assert_eq!(params.max_disparity, 20);
    assert_eq!(params.aggregation_rounds, 1);
    assert_eq!(params.census_window, (7, 9));
    assert_eq!(params.border_policy, BorderMode::SharedSentinel);

    Ok(())
}

#[test]
fn missing_params_file_is_io_error() {
    let res = Params::from_json_file(temp_path("missing.json"));
    assert!(matches!(res, Err(Error::Io(_))));
}

#[test]
fn params_round_trip_through_json() {
    let params = Params {
        max_disparity: 60,
        border_policy: BorderMode::ReplicateEdge,
        ..Params::default()
    };

    let json = serde_json::to_string(&params).unwrap();
    assert_eq!(Params::from_json_str(&json).unwrap(), params);
}

#[test]
fn png_pair_computes_disparity() -> Result<(), Box<dyn std::error::Error>> {
    let left_path = temp_path("left.png");
    let right_path = temp_path("right.png");

    let left = image::RgbImage::from_fn(16, 6, |x, y| {
        let v = ((x * 53 + y * 17) % 256) as u8;
        image::Rgb([v, v.wrapping_mul(3), 255 - v])
    });
    left.save(&left_path)?;
    left.save(&right_path)?;

    let frame = StereoFrame::new(ColorImage::open(&left_path)?, ColorImage::open(&right_path)?);
    std::fs::remove_file(&left_path)?;
    std::fs::remove_file(&right_path)?;

    assert_eq!(frame.left.pixel(3, 2), &[193.0, 67.0, 62.0]);

    let mut alg = AdCensus::new(Params { max_disparity: 4, ..Params::default() })?;
    let disp = alg.compute(&frame)?;

    assert_eq!(disp.to_luma_scaled(16.0).dimensions(), (16, 6));
    assert!(disp.as_slice().iter().all(|&d| d == 0.0));

    Ok(())
}

#[test]
fn missing_image_is_reported() {
    let res = ColorImage::open(temp_path("missing.png"));
    assert!(matches!(res, Err(Error::Image(_))));
}
