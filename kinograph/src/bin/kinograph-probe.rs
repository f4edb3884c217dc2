use std::path::Path;
use std::rc::Rc;

use kinograph::error::KinographError;
use kinograph::graph::ImageGraph;
use kinograph::host::ImageEffectHost;
use kinograph::host::effect_host::plugin_search_paths;
use kinograph::model::document;
use kinograph::model::item::{ItemId, ItemKind, Timeline};
use kinograph::model::time::TimeRange;

fn main() -> Result<(), KinographError> {
    env_logger::init();
    run(std::env::args().collect())
}

fn run(args: Vec<String>) -> Result<(), KinographError> {
    if args.len() != 2 {
        return Err(KinographError::InvalidArgument(
            "usage: kinograph-probe <timeline.json>".to_string(),
        ));
    }
    let timeline = Rc::new(document::load_timeline(Path::new(&args[1]))?);

    println!("Timeline: {}", timeline.name());
    let duration = timeline.duration();
    println!(
        "Duration: {} frame(s) at {} fps ({:.2}s)",
        duration.to_frames(),
        duration.rate(),
        duration.to_seconds()
    );
    if let Some(global) = timeline.global_start_time() {
        println!("Global start: {} at {} fps", global.value(), global.rate());
    }

    let graph = ImageGraph::new(Rc::clone(&timeline));
    let (width, height) = graph.image_size();
    println!("Image size: {}x{}", width, height);

    println!("Structure:");
    print_item(&timeline, timeline.root(), 1);

    let mut host = ImageEffectHost::new(&plugin_search_paths());
    host.load_all_plugins();
    println!("Effects:");
    for name in host.effect_names() {
        println!("  {}", name);
    }
    Ok(())
}

fn print_item(timeline: &Timeline, id: ItemId, depth: usize) {
    let item = timeline.item(id);
    let indent = "  ".repeat(depth);
    match &item.kind {
        ItemKind::Transition {
            transition_type,
            in_offset,
            out_offset,
        } => {
            println!(
                "{}Transition '{}' {} (in {}, out {})",
                indent,
                item.name,
                transition_type,
                in_offset.value(),
                out_offset.value()
            );
        }
        ItemKind::Track { kind, .. } => {
            println!(
                "{}Track '{}' ({}) {}",
                indent,
                item.name,
                kind,
                format_range(&item.range)
            );
        }
        other => {
            println!(
                "{}{} '{}' {}",
                indent,
                other.type_name(),
                item.name,
                format_range(&item.range)
            );
        }
    }
    for &child in timeline.children(id) {
        print_item(timeline, child, depth + 1);
    }
}

fn format_range(range: &TimeRange) -> String {
    format!(
        "[{} +{} @ {} fps]",
        range.start_time().value(),
        range.duration().value(),
        range.duration().rate()
    )
}
