//! Meshes a small deck on two girders and prints the resulting sets.

use fempart::adapter::GeomRepr;
use fempart::config::{MeshParams, SessionOptions};
use fempart::kernel::GridKernel;
use fempart::math::Point3;
use fempart::structure::section::{CrossSection, ISection};
use fempart::structure::{Beam, Plate};
use fempart::tasker::{MeshTask, MultiSessionTasker};

fn main() -> fempart::Result<()> {
    // Default: WARN for everything, INFO for fempart.
    // Override with RUST_LOG env var (e.g. RUST_LOG=fempart=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("fempart=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let section = CrossSection::I(ISection::new(0.3, 0.15, 0.0071, 0.0107));
    let girder = |name: &str, y: f64| {
        Beam::new(name, Point3::new(0.0, y, 0.0), Point3::new(4.0, y, 0.0), section.clone())
    };

    let deck = MeshTask::new("deck", MeshParams::new(0.25).with_quads(true))
        .with_object(Plate::horizontal("deck", (0.0, 0.0), (4.0, 2.0), 0.0, 0.012), GeomRepr::Shell)
        .with_object(girder("girder_a", 0.5), GeomRepr::Line)
        .with_object(girder("girder_b", 1.5), GeomRepr::Line);

    let mut kernel = GridKernel::new();
    let mut tasker = MultiSessionTasker::new(&mut kernel, SessionOptions::default());
    let model = tasker.run(&[deck])?;

    println!("{} nodes, {} elements", model.node_count(), model.element_count());
    for set in model.sets() {
        println!("  {:<12} {:>5} elements {:>5} nodes", set.name, set.elements.len(), set.nodes.len());
    }
    Ok(())
}
