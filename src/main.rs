//! `lifeview [frames.json] [config.json]`
//!
//! Plays back a recording of frames, or a sweep pattern when none is given.

use std::process::ExitCode;

use lifeview::{GridDims, ReplaySource, SweepSource, ViewConfig, Viewer, ViewerError};

fn run() -> Result<(), ViewerError> {
    let mut args = std::env::args().skip(1);
    let frames = args.next();
    let config = match args.next() {
        Some(path) => ViewConfig::load(path)?,
        None => ViewConfig::default(),
    };

    let viewer = Viewer::new(config);
    let viewer = match frames {
        Some(path) => {
            let source = ReplaySource::load(&path)?;
            log::info!("replaying {} frames from {}", source.len(), path);
            viewer.with_source(source).with_title(format!("lifeview - {}", path))
        }
        None => viewer.with_source(SweepSource::new(GridDims::new(8, 32, 32))),
    };
    viewer.run()
}

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
