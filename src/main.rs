// src/main.rs

use std::sync::Arc;

use bufsource::{
    AudioBuffer, EngineConfig, QUANTUM_FRAMES, SourceBuffer, SourceResult, SourceStream,
    create_source,
};

/// ===============================
/// Test Buffer
/// ===============================

fn sine_buffer(sample_rate: f64, frames: usize) -> SourceResult<SourceBuffer> {
    let left: Vec<f32> = (0..frames)
        .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / sample_rate as f32).sin() * 0.5)
        .collect();
    let right = left.iter().map(|s| -s).collect();
    SourceBuffer::new(sample_rate, vec![left, right])
}

/// ===============================
/// Main
/// ===============================

fn main() -> SourceResult<()> {
    let config = EngineConfig::default();
    let block_frames = QUANTUM_FRAMES * 4;

    // --------------------------------
    // Control side
    // --------------------------------

    let (mut node, renderer) = create_source(config);
    node.set_buffer(Some(Arc::new(sine_buffer(config.sample_rate, 1000)?)));
    node.set_loop(true);
    node.set_loop_start(200.0 / config.sample_rate);
    node.set_loop_end(300.0 / config.sample_rate);
    node.start(0.0, 0.0, None)?;
    node.stop(4096.0 / config.sample_rate)?;

    // --------------------------------
    // Render side
    // --------------------------------

    let mut stream = SourceStream::new(renderer, &config);
    let mut data = vec![0.0f32; block_frames * 2];

    println!("Starting buffer source sanity test…");

    let mut block = 0;
    loop {
        let mut out = AudioBuffer::new(&mut data, 2);
        let active = stream.render_into(&mut out);
        let peak = out.channel(0).iter().fold(0.0f32, |m, s| m.max(s.abs()));

        println!(
            "Block {} @ tick {}: peak {:.3}, loop state {:?}",
            block,
            stream.position(),
            peak,
            stream.renderer().loop_state()
        );

        block += 1;
        if !active {
            break;
        }
    }

    println!(
        "Finished after {} quanta at {:.4}s.",
        node.quanta_rendered(),
        node.current_time()
    );
    Ok(())
}
