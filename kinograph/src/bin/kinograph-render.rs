use std::path::Path;
use std::rc::Rc;

use log::info;

use kinograph::error::KinographError;
use kinograph::graph::ImageGraph;
use kinograph::host::ImageEffectHost;
use kinograph::host::effect_host::plugin_search_paths;
use kinograph::model::document;
use kinograph::model::time::RationalTime;
use kinograph::util::ScopedTimer;

fn main() -> Result<(), KinographError> {
    env_logger::init();
    run(std::env::args().collect())
}

fn run(args: Vec<String>) -> Result<(), KinographError> {
    if args.len() != 3 && args.len() != 5 {
        return Err(KinographError::InvalidArgument(
            "usage: kinograph-render <timeline.json> <output-dir> [start-frame end-frame]"
                .to_string(),
        ));
    }
    let timeline_path = Path::new(&args[1]);
    let output_dir = Path::new(&args[2]);

    let timeline = document::load_timeline(timeline_path)?;
    let duration = timeline.duration();
    let rate = duration.rate();
    let stack_start = timeline.item(timeline.root()).range.start_time();
    // Frames are numbered from the global start time when one is set.
    let numbering_offset = timeline
        .global_start_time()
        .map(|time| time.rescaled_to(rate).to_frames())
        .unwrap_or(0);

    let (start_frame, end_frame) = if args.len() == 5 {
        (parse_frame(&args[3])?, parse_frame(&args[4])?)
    } else {
        (0, duration.to_frames() - 1)
    };
    if end_frame < start_frame {
        return Err(KinographError::InvalidArgument(format!(
            "end frame {} lies before start frame {}",
            end_frame, start_frame
        )));
    }

    let mut host = ImageEffectHost::new(&plugin_search_paths());
    let mut graph = ImageGraph::new(Rc::new(timeline));
    let (width, height) = graph.image_size();
    if width == 0 || height == 0 {
        return Err(KinographError::Render(
            "timeline has no media with a determinable image size".to_string(),
        ));
    }

    std::fs::create_dir_all(output_dir)?;
    info!(
        "Rendering {} frame(s) at {}x{}",
        end_frame - start_frame + 1,
        width,
        height
    );
    let _timer = ScopedTimer::info("Render");
    for frame in start_frame..=end_frame {
        let time = stack_start + RationalTime::new(frame as f64, rate);
        let node = graph.exec(&mut host, time);
        let image = node.borrow_mut().exec(time)?;
        let path = output_dir.join(format!("frame_{:06}.png", numbering_offset + frame));
        image.save_png(&path)?;
        info!("Wrote {}", path.display());
    }
    Ok(())
}

fn parse_frame(text: &str) -> Result<i64, KinographError> {
    text.parse::<i64>().map_err(|_| {
        KinographError::InvalidArgument(format!("invalid frame number '{}'", text))
    })
}
