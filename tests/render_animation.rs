use std::path::{Path, PathBuf};

use image::AnimationDecoder as _;
use wealthgap::{
    AnimationSession, ChartConfig, Era, FontSet, FrameIndex, GifSink, GifSinkOpts, InMemorySink,
    Series,
};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("wealth_gap.csv")
}

fn small_config() -> ChartConfig {
    ChartConfig {
        dpi: 12,
        gif_speed: 30,
        ..ChartConfig::default()
    }
}

fn session() -> AnimationSession {
    let series = Series::load(&fixture()).unwrap();
    AnimationSession::new(series, &small_config(), &FontSet::empty()).unwrap()
}

#[test]
fn gif_has_one_frame_per_row() {
    let out = PathBuf::from("target").join("render_animation").join("fixture.gif");
    let _ = std::fs::remove_file(&out);

    let mut s = session();
    let mut opts = GifSinkOpts::new(out.clone());
    opts.speed = small_config().gif_speed;
    let mut sink = GifSink::new(opts).unwrap();
    let stats = s.render_all(&mut sink).unwrap();
    assert_eq!(stats.frames_rendered, 12);

    let f = std::fs::File::open(&out).unwrap();
    let decoder = image::codecs::gif::GifDecoder::new(std::io::BufReader::new(f)).unwrap();
    let frames = decoder.into_frames().collect_frames().unwrap();
    assert_eq!(frames.len(), 12);
    assert_eq!(frames[0].buffer().dimensions(), (192, 108));
}

#[test]
fn every_event_label_is_revealed_by_the_last_frame() {
    let mut s = session();
    let mut sink = InMemorySink::new();
    let stats = s.render_all(&mut sink).unwrap();

    // Events at 1863, 1865, 1868, 1896 and 1944 are passed; 1968 is the final end year.
    assert_eq!(stats.labels_revealed, 5);
    assert!(s.labels().get(1968).is_some_and(|l| !l.is_revealed()));
}

#[test]
fn eras_advance_with_the_frames() {
    let s = session();
    let eras: Vec<Era> = s
        .frames()
        .iter()
        .map(|f| s.plan(f).unwrap().theme.era)
        .collect();

    assert_eq!(eras[0], Era::Reconstruction);
    assert_eq!(eras[8], Era::Reconstruction); // 1896
    assert_eq!(eras[9], Era::EarlyCentury); // 1920
    assert_eq!(eras[10], Era::MidCentury); // 1944
    assert!(eras.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn tick_interval_thins_as_the_window_grows() {
    let s = session();
    let intervals: Vec<i32> = s
        .frames()
        .iter()
        .map(|f| s.plan(f).unwrap().x_tick_interval)
        .collect();
    assert_eq!(intervals[0], 5);
    assert_eq!(intervals[9], 10); // 1920
    assert_eq!(intervals[11], 20); // 1968
}

#[test]
fn stills_match_the_theme_background() {
    let mut s = session();
    let frame = s.render_frame(FrameIndex(11)).unwrap();
    assert_eq!((frame.width, frame.height), (192, 108));
    assert_eq!(frame.pixel(1, 1), Some([0xd7, 0xd7, 0xd7, 0xff]));
}

/// Pixels in rows `y0..y1` that stand out from the figure background.
fn ink_rows(frame: &wealthgap::FrameRGBA, y0: u32, y1: u32) -> usize {
    let Some(bg) = frame.pixel(1, 1) else {
        return 0;
    };
    let mut n = 0;
    for y in y0..y1 {
        for x in 0..frame.width {
            let Some(px) = frame.pixel(x, y) else {
                continue;
            };
            if (0..3).any(|c| px[c].abs_diff(bg[c]) > 48) {
                n += 1;
            }
        }
    }
    n
}

#[test]
fn titles_and_tick_labels_render_in_every_era() {
    let fonts = FontSet::load(&[]).unwrap();
    if fonts.face_count() == 0 {
        eprintln!("no system fonts, text cannot be drawn");
        return;
    }
    let cfg = ChartConfig {
        dpi: 36,
        ..ChartConfig::default()
    };
    let mut s = AnimationSession::new(Series::load(&fixture()).unwrap(), &cfg, &fonts).unwrap();

    // At 36 dpi one pixel is two points: the title sits in rows 0..24 and the x tick labels in
    // rows 292..302.
    for (frame, era) in [
        (0, Era::Reconstruction),
        (9, Era::EarlyCentury),
        (10, Era::MidCentury),
    ] {
        assert_eq!(s.plan(FrameIndex(frame)).unwrap().theme.era, era);
        let pixels = s.render_frame(FrameIndex(frame)).unwrap();
        assert_eq!((pixels.width, pixels.height), (576, 324));
        assert!(ink_rows(&pixels, 0, 24) > 0, "{era:?}: no title");
        assert!(ink_rows(&pixels, 292, 302) > 0, "{era:?}: no tick labels");
    }
}
