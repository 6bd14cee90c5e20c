//! Builds the dissolve scene for an icosahedron and steps a few frames, printing the
//! composed shader sources and the uniform state.
//!
//! Run with: RUST_LOG=debug cargo run --example dissolve_demo

use dissolve::*;

/// A flat-shaded octahedron, standing in for the engine's icosphere.
fn octahedron(radius: f32) -> MeshGeometry {
    let positions = vec![
        Vec3::X * radius,
        Vec3::NEG_X * radius,
        Vec3::Y * radius,
        Vec3::NEG_Y * radius,
        Vec3::Z * radius,
        Vec3::NEG_Z * radius,
    ];
    let indices = vec![
        0, 2, 4, 4, 2, 1, 1, 2, 5, 5, 2, 0, //
        4, 3, 0, 1, 3, 4, 5, 3, 1, 0, 3, 5,
    ];
    MeshGeometry::indexed(positions, indices)
}

fn main() -> Result<()> {
    env_logger::init();

    let config = SceneConfig::default();
    let radius = match &config.subject {
        Subject::Icosahedron { radius, .. } => *radius,
        Subject::Model { .. } => 1.0,
    };

    let catalog = TemplateCatalog::new();
    let mut scene = DissolveScene::build(config, &catalog)?;

    let prepared = scene.prepare_geometry(&octahedron(radius))?;
    println!(
        "prepared {} vertices ({} with {})",
        prepared.geometry.vertex_count(),
        RANDOM_ATTRIBUTE,
        CENTER_ATTRIBUTE
    );

    println!("--- {} vertex ---\n{}", scene.surface().name(), scene.surface().vertex_source());
    println!("--- {} fragment ---\n{}", scene.surface().name(), scene.surface().fragment_source());
    println!("--- {} vertex ---\n{}", scene.depth().name(), scene.depth().vertex_source());

    scene.set_control("factor", 0.4)?;
    for step in 0..=10u8 {
        scene.set_progress(f32::from(step) / 10.0)?;
        scene.frame()?;
        println!("frame {step:>2}: {:?}", scene.depth().uniforms().snapshot());
    }

    let block = scene.surface().uniform_block();
    println!("uniform block: {} bytes", block.size());
    for entry in block.entries() {
        println!("  {:<10} @ {:>3} ({} bytes)", entry.name, entry.offset, entry.size);
    }

    Ok(())
}
