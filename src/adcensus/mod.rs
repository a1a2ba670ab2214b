//! # AD-Census disparity computation
//!
//! This module provides a local stereo matcher combining an absolute colour difference cost with
//! a census transform cost, smoothed by cross-based aggregation over adaptive support windows
//! and resolved by winner-take-all.
//!
//! The pipeline is:
//!
//! 1. census signatures of both images ([`census`]),
//! 2. AD and census cost volumes fused into one total cost ([`cost`]),
//! 3. support windows of both images ([`window`]),
//! 4. a fixed number of horizontal and vertical aggregation rounds ([`aggregate`]),
//! 5. winner-take-all selection ([`select`]).

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod aggregate;
pub mod census;
pub mod cost;
pub mod select;
pub mod window;

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;
use std::time::Instant;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use self::aggregate::{aggregate, Schedule, Stage};
use self::census::{CensusImage, ReplicateEdge, SharedSentinel};
use self::select::winner_take_all;
use self::window::{ArmLimits, WindowMap};
use crate::disparity::{DisparityAlgorithm, DisparityMap};
use crate::error::*;
use crate::frame::{ColorImage, StereoFrame};
use crate::volume::CostVolume;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

pub struct AdCensus {
    params: Params
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Params {
    /// Number of disparities searched, `0..max_disparity`.
    pub max_disparity: usize,
    /// Census neighbourhood as `(height, width)`, both odd.
    pub census_window: (usize, usize),
    pub lambda_ad: f64,
    pub lambda_census: f64,
    pub tau1: f64,
    pub tau2: f64,
    pub l1: usize,
    pub l2: usize,
    /// Number of horizontal + vertical aggregation rounds.
    pub aggregation_rounds: usize,
    pub border_policy: BorderMode
}

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Selects the census [`BorderPolicy`](census::BorderPolicy).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BorderMode {
    SharedSentinel,
    ReplicateEdge
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for BorderMode {
    fn default() -> Self {
        BorderMode::SharedSentinel
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            max_disparity: 16,
            census_window: (7, 9),
            lambda_ad: 10.0,
            lambda_census: 30.0,
            tau1: 20.0,
            tau2: 6.0,
            l1: 34,
            l2: 17,
            aggregation_rounds: 2,
            border_policy: BorderMode::SharedSentinel
        }
    }
}

impl Params {
    /// Parse parameters from JSON, missing fields taking their default values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: Params = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Load parameters from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_disparity == 0 {
            return Err(invalid("max_disparity must be at least 1"));
        }

        let (h, w) = self.census_window;
        if h == 0 || w == 0 || h % 2 == 0 || w % 2 == 0 {
            return Err(invalid(&format!(
                "census_window must have odd, non-zero dimensions, got {:?}",
                self.census_window
            )));
        }

        for &(name, val) in &[
            ("lambda_ad", self.lambda_ad),
            ("lambda_census", self.lambda_census),
            ("tau1", self.tau1),
            ("tau2", self.tau2)
        ] {
            if !(val.is_finite() && val > 0.0) {
                return Err(invalid(&format!("{} must be positive, got {}", name, val)));
            }
        }

        if self.l1 == 0 || self.l2 == 0 {
            return Err(invalid("arm lengths l1 and l2 must be at least 1"));
        }
        if self.l2 >= self.l1 {
            warn!(
                "l2 ({}) is not below l1 ({}), tau2 will never limit arm growth",
                self.l2, self.l1
            );
        }

        Ok(())
    }

    pub fn arm_limits(&self) -> ArmLimits {
        ArmLimits {
            tau1: self.tau1,
            tau2: self.tau2,
            l1: self.l1,
            l2: self.l2
        }
    }
}

impl AdCensus {
    /// Create a new instance of the algorithm with the given parameters.
    pub fn new(params: Params) -> Result<Self> {
        params.validate()?;
        debug!("AD-Census parameters: {:#?}", params);

        Ok(Self { params })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Compute the aggregated total cost volume of the frame.
    pub fn cost_volume(&self, frame: &StereoFrame) -> Result<CostVolume> {
        self.run(frame, |_, _| ())
    }

    /// Compute the winner-take-all disparity map after every stage of the pipeline.
    ///
    /// The first entry is taken straight from the fused cost, then one per aggregation pass.
    pub fn snapshots(&self, frame: &StereoFrame) -> Result<Vec<(Stage, DisparityMap)>> {
        let mut snapshots = Vec::new();
        self.run(frame, |stage, volume| snapshots.push((stage, winner_take_all(volume))))?;
        Ok(snapshots)
    }

    fn census(&self, image: &ColorImage) -> CensusImage {
        match self.params.border_policy {
            BorderMode::SharedSentinel => {
                CensusImage::build(image, self.params.census_window, &SharedSentinel)
            }
            BorderMode::ReplicateEdge => {
                CensusImage::build(image, self.params.census_window, &ReplicateEdge)
            }
        }
    }

    /// Run cost computation and aggregation, handing every intermediate volume to `observe`.
    fn run<F>(&self, frame: &StereoFrame, mut observe: F) -> Result<CostVolume>
    where
        F: FnMut(Stage, &CostVolume)
    {
        frame.check_shape()?;

        let max_disp = self.params.max_disparity;
        let mut stage = Stage::Init;

        // ---- COST COMPUTATION ----

        info!(
            "Cost computation ({}x{}, {} disparities)",
            frame.width(), frame.height(), max_disp
        );
        let tic = Instant::now();

        let mut volume = {
            let left_census = self.census(&frame.left);
            let right_census = self.census(&frame.right);

            let ad = cost::ad_volume(&frame.left, &frame.right, max_disp);
            let census = cost::census_volume(&left_census, &right_census, max_disp);

            cost::fuse(&ad, &census, self.params.lambda_ad, self.params.lambda_census)
        };

        stage = stage.cost_built();
        observe(stage, &volume);
        info!("Elapsed time (cost computation): {:.3} s", tic.elapsed().as_secs_f64());

        // ---- COST AGGREGATION ----

        let tic = Instant::now();
        let limits = self.params.arm_limits();
        let left_windows = WindowMap::build(&frame.left, &limits);
        let right_windows = WindowMap::build(&frame.right, &limits);
        debug!("Support windows built in {:.3} s", tic.elapsed().as_secs_f64());

        for pass in Schedule::new(self.params.aggregation_rounds) {
            let pass_tic = Instant::now();

            volume = aggregate(&left_windows, &right_windows, &volume, pass.direction)?;
            stage = stage.after(pass);

            observe(stage, &volume);
            info!(
                "Cost aggregation ({}) took {:.3} s",
                stage, pass_tic.elapsed().as_secs_f64()
            );
        }

        info!("Elapsed time (cost aggregation): {:.3} s", tic.elapsed().as_secs_f64());

        Ok(volume)
    }
}

impl DisparityAlgorithm for AdCensus {
    /// Compute the disparity map for the given frame.
    fn compute(&mut self, frame: &StereoFrame) -> Result<DisparityMap> {
        let volume = self.cost_volume(frame)?;

        // ---- DISPARITY SELECTION ----

        let tic = Instant::now();
        let disp_map = winner_take_all(&volume);
        info!("Elapsed time (disparity optimization): {:.3} s", tic.elapsed().as_secs_f64());

        Ok(disp_map)
    }
}

fn invalid(msg: &str) -> Error {
    Error::InvalidConfiguration(msg.to_string())
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, Once};

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = Params::default();

        assert!(params.validate().is_ok());
        assert_eq!(params.census_window, (7, 9));
        assert_eq!(params.aggregation_rounds, 2);
    }

    #[test]
    fn rejects_bad_parameters() {
        let cases = vec![
            Params { max_disparity: 0, ..Params::default() },
            Params { census_window: (6, 9), ..Params::default() },
            Params { census_window: (7, 0), ..Params::default() },
            Params { lambda_ad: 0.0, ..Params::default() },
            Params { lambda_census: -1.0, ..Params::default() },
            Params { tau1: f64::NAN, ..Params::default() },
            Params { tau2: 0.0, ..Params::default() },
            Params { l1: 0, ..Params::default() },
        ];

        for params in cases {
            assert!(
                matches!(AdCensus::new(params.clone()), Err(Error::InvalidConfiguration(_))),
                "accepted {:?}",
                params
            );
        }
    }

    #[test]
    fn long_l2_is_accepted() {
        let params = Params { l1: 10, l2: 17, ..Params::default() };

        assert!(params.validate().is_ok());
        assert_eq!(AdCensus::new(params).unwrap().params().l2, 17);
    }

    #[test]
    fn json_overlays_defaults() {
        let params = Params::from_json_str(
            r#"{ "max_disparity": 60, "border_policy": "replicate_edge" }"#
        ).unwrap();

        assert_eq!(params.max_disparity, 60);
        assert_eq!(params.border_policy, BorderMode::ReplicateEdge);
        assert_eq!(params.tau1, 20.0);
    }

    #[test]
    fn json_is_validated() {
        assert!(matches!(
            Params::from_json_str(r#"{ "census_window": [4, 4] }"#),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(matches!(Params::from_json_str("{ nope"), Err(Error::Config(_))));
    }

    /// Records every log message so tests can check levels.
    struct Recorder;

    static RECORDS: Mutex<Vec<(log::Level, String)>> = Mutex::new(Vec::new());
    static INIT_RECORDER: Once = Once::new();

    impl log::Log for Recorder {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            if let Ok(mut records) = RECORDS.lock() {
                records.push((record.level(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    #[test]
    fn every_pass_reports_its_time() {
        INIT_RECORDER.call_once(|| {
            if log::set_logger(&Recorder).is_ok() {
                log::set_max_level(log::LevelFilter::Debug);
            }
        });

        let img = ColorImage::from_fn(5, 3, |x, y| [(x * 40 + y * 9) as f64; 3]);
        let frame = StereoFrame::new(img.clone(), img);
        let alg = AdCensus::new(Params { max_disparity: 2, ..Params::default() }).unwrap();
        alg.cost_volume(&frame).unwrap();

        let records = RECORDS.lock().unwrap();
        for stage in &["horizontal pass 1", "vertical pass 1", "horizontal pass 2", "vertical pass 2"] {
            let prefix = format!("Cost aggregation ({})", stage);
            assert!(
                records.iter().any(|(level, msg)| *level == log::Level::Info && msg.starts_with(&prefix)),
                "no info record for {}",
                stage
            );
        }
    }

    #[test]
    fn snapshots_follow_the_schedule() {
        let img = ColorImage::from_fn(6, 4, |x, y| [(x * 30 + y * 5) as f64; 3]);
        let frame = StereoFrame::new(img.clone(), img);
        let alg = AdCensus::new(Params { max_disparity: 3, ..Params::default() }).unwrap();

        let snaps = alg.snapshots(&frame).unwrap();
        let stages: Vec<String> = snaps.iter().map(|(s, _)| s.to_string()).collect();

        assert_eq!(stages, vec![
            "cost",
            "horizontal pass 1",
            "vertical pass 1",
            "horizontal pass 2",
            "vertical pass 2"
        ]);
    }
}
