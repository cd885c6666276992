use std::collections::HashMap;

use arcgauge::{
    draw_gauge, ArcStyle, DrawCommand, GaugeOptions, ImmediateFrames, LineCap, Scene,
    TickMarkStyle,
};
use rand::Rng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Three gauges on three surfaces, configured with the bon-generated builder
    let mut surfaces: HashMap<String, Scene> = ["cpu", "memory", "disk"]
        .into_iter()
        .map(|id| (id.to_string(), Scene::new(240.0, 240.0)))
        .collect();

    let cpu = GaugeOptions::builder()
        .label("CPU")
        .show_tick_mark(true)
        .build();
    let memory = GaugeOptions::builder()
        .label("Memory")
        .arc(ArcStyle {
            radius: 100.0,
            line_width: 8.0,
        })
        .line_cap(LineCap::Butt)
        .build();
    let disk = GaugeOptions::builder()
        .label("Disk")
        .show_tick_mark(true)
        .tick_mark(TickMarkStyle {
            number: 40,
            height: 6.0,
            ..TickMarkStyle::default()
        })
        .default_color("#333")
        .build();

    let mut rng = rand::rng();
    let mut frames = ImmediateFrames::new();

    for (id, options) in [("cpu", cpu), ("memory", memory), ("disk", disk)] {
        let target = rng.random_range(0..=100);
        let mut task = draw_gauge(&mut surfaces, &mut frames, id, target, &options, None)?;
        let rendered = task.run_to_completion(&mut surfaces, &mut frames)?;

        let last = surfaces[id].last_frame();
        let ticks = last
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
            .count();
        println!("{id:>6}: {target:>3}% in {rendered} frames, last frame has {} commands ({ticks} ticks)", last.len());
    }

    Ok(())
}
