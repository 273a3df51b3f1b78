//! Extract ball positions and speeds from an image sequence.

use clap::*;
use log::*;
use serde::Serialize;
use spinspeed::prelude::v1::{Result, *};
use std::fs::File;
use std::io::{BufReader, Write};

mod overlay;

/// Single CSV row.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
struct Row {
    frame: usize,
    timestamp: f64,
    x: Option<f32>,
    y: Option<f32>,
    radius: Option<f32>,
    speed: Option<f64>,
    ball_count: usize,
}

impl Row {
    fn new(frame: usize, report: &FrameReport) -> Self {
        Self {
            frame,
            timestamp: report.timestamp,
            x: report.primary.map(|b| b.position.x),
            y: report.primary.map(|b| b.position.y),
            radius: report.primary.map(|b| b.radius),
            speed: report.speed,
            ball_count: report.moving.len(),
        }
    }
}

/// Split a `Name=value` override.
fn parse_override(arg: &str) -> Result<(&str, &str)> {
    arg.split_once('=')
        .map(|(n, v)| (n.trim(), v.trim()))
        .filter(|(n, _)| !n.is_empty())
        .ok_or_else(|| anyhow!("Expected Name=value, got {arg:?}"))
}

fn load_config(path: Option<&str>) -> Result<TrackerConfig> {
    match path {
        Some(path) => {
            let file = File::open(path).map_err(|e| anyhow!("Failed to open {path}: {e}"))?;
            Ok(serde_json::from_reader(BufReader::new(file))?)
        }
        None => Ok(Default::default()),
    }
}

fn create_detector(name: &str, config: &TrackerConfig) -> Result<Box<dyn Detector>> {
    match name {
        "contour" => Ok(Box::new(ContourDetector::from(config))),
        #[cfg(feature = "opencv")]
        "cv" => Ok(Box::new(cv_detector::CvDetector::from(config))),
        _ => Err(anyhow!("Unknown detector: {name}")),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let matches = Command::new("spin-extract")
        .version(crate_version!())
        .author(crate_authors!())
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .takes_value(true)
                .required_unless_present("list-props"),
        )
        .arg(
            Arg::new("fps")
                .long("fps")
                .short('f')
                .takes_value(true)
                .default_value("30"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .takes_value(true),
        )
        .arg(
            Arg::new("set")
                .long("set")
                .short('s')
                .takes_value(true)
                .multiple_occurrences(true),
        )
        .arg(
            Arg::new("annotate")
                .long("annotate")
                .short('a')
                .takes_value(true),
        )
        .arg(
            Arg::new("detector")
                .long("detector")
                .short('d')
                .takes_value(true)
                .default_value("contour"),
        )
        .arg(Arg::new("list-props").long("list-props").required(false))
        .arg(Arg::new("output").takes_value(true).required(false))
        .get_matches();

    let mut config = load_config(matches.value_of("config"))?;

    for arg in matches.values_of("set").into_iter().flatten() {
        let (name, value) = parse_override(arg)?;
        config.set_prop(name, value)?;
    }

    if matches.occurrences_of("list-props") > 0 {
        for (name, prop) in config.props() {
            println!("{name}: {prop}");
        }
        return Ok(());
    }

    let input = matches
        .value_of("input")
        .ok_or_else(|| anyhow!("Please supply an input directory!"))?;
    let fps: f64 = matches.value_of("fps").unwrap_or("30").parse()?;
    let annotate = matches.value_of("annotate");

    if let Some(dir) = annotate {
        std::fs::create_dir_all(dir)?;
    }

    let out: Box<dyn Write> = match matches.value_of("output") {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(std::io::stdout()),
    };

    let mut writer = csv::Writer::from_writer(out);

    let detector = create_detector(matches.value_of("detector").unwrap_or("contour"), &config)?;
    let mut tracker = BallTracker::with_detector(detector, &config);
    let mut source = ImageSequence::open(input, fps)?;

    let mut cnt = 0usize;

    while let Some((mut frame, timestamp)) = source.next_frame()? {
        let report = tracker.process(&frame, timestamp);

        writer.serialize(Row::new(cnt, &report))?;

        if let Some(dir) = annotate {
            overlay::draw(&mut frame, &report, tracker.classifier());
            frame.save(format!("{dir}/{cnt:06}.png"))?;
        }

        cnt += 1;
    }

    writer.flush()?;

    let stats = tracker.stats();
    let metres_per_pixel = config.speed.metres_per_pixel;

    info!("Processed {} frames", stats.frames);

    eprintln!("Frames: {}", stats.frames);
    eprintln!("Frames with ball: {}", stats.frames_with_ball);
    eprintln!("Max balls in frame: {}", stats.max_ball_count);
    eprintln!(
        "Max speed: {:.2} px/s ({:.2} m/s)",
        stats.max_speed,
        stats.max_speed_metric(metres_per_pixel)
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_apply_to_config() {
        let mut config = TrackerConfig::default();

        for arg in ["Static threshold=12", " max age = 4.5 ", "Min circularity=7"] {
            let (name, value) = parse_override(arg).unwrap();
            config.set_prop(name, value).unwrap();
        }

        assert_eq!(config.classifier.static_threshold, 12);
        assert_eq!(config.classifier.max_age, 4.5);
        // Clamped to the upper bound.
        assert_eq!(config.extractor.min_circularity, 1.0);
    }

    #[test]
    fn malformed_overrides() {
        assert!(parse_override("Max age").is_err());
        assert!(parse_override("=3").is_err());

        let mut config = TrackerConfig::default();
        let (name, value) = parse_override("Spin=3").unwrap();
        assert!(config.set_prop(name, value).is_err());
    }

    #[test]
    fn rows_follow_primary_ball() {
        let ball = Candidate::new(12.0, 34.0, 15.0);
        let report = FrameReport {
            timestamp: 0.5,
            candidates: vec![ball, Candidate::new(1.0, 1.0, 11.0)],
            moving: vec![ball],
            primary: Some(ball),
            speed: Some(40.0),
        };

        let row = Row::new(3, &report);
        assert_eq!(row.frame, 3);
        assert_eq!((row.x, row.y, row.radius), (Some(12.0), Some(34.0), Some(15.0)));
        assert_eq!(row.speed, Some(40.0));
        assert_eq!(row.ball_count, 1);

        assert_eq!(Row::new(4, &FrameReport::default()).x, None);
    }

    #[test]
    fn unknown_detector() {
        assert!(create_detector("contour", &Default::default()).is_ok());
        assert!(create_detector("hough", &Default::default()).is_err());
    }
}
