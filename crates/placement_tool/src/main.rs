//! Rigid Placement
//!
//! Headless driver for a placement session: loads (or builds) a scene,
//! settles the selected objects with physics while everything else stays
//! frozen, reports the result and finally rolls the scene back.
//!
//! Run with: cargo run -p placement_tool -- [config.toml] [scene.toml]

mod config;
mod demo;

use config::ToolConfig;
use placement_scene::{EditorWorld, SceneSerializer};
use placement_session::prelude::*;

/// Host frame length while a step-visualized run is ticking
const FRAME_DT: f32 = 1.0 / 60.0;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let config = match ToolConfig::load(&args) {
        Ok(config) => config,
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(2);
        }
    };
    config.print_summary();

    let (scene, default_selection) = match &config.scene {
        Some(path) => match SceneSerializer::load(path) {
            Ok(scene) => (scene, None),
            Err(err) => {
                log::error!("{}", err);
                std::process::exit(1);
            }
        },
        None => (demo::demo_scene(), Some(demo::DEMO_SELECTION)),
    };

    let mut world = EditorWorld::new(scene, config.physics.clone());
    select_objects(&mut world, &config.select, default_selection);

    let mut session = PlacementSession::from_settings(&config.session);
    run(&mut world, &mut session, &config);
}

/// Select objects by name, or every object that physics may move
fn select_objects(world: &mut EditorWorld, names: &[String], fallback: Option<&[&str]>) {
    let handles: Vec<ObjectHandle> = if !names.is_empty() {
        names.iter().filter_map(|name| find_or_warn(world, name)).collect()
    } else if let Some(fallback) = fallback {
        fallback.iter().filter_map(|name| find_or_warn(world, name)).collect()
    } else {
        world
            .scene()
            .iter()
            .filter(|(_, object)| object.body.is_none() || object.is_dynamic())
            .map(|(handle, _)| handle)
            .collect()
    };
    log::info!("Selected {} objects", handles.len());
    world.selection_mut().select_multiple(handles);
}

fn find_or_warn(world: &EditorWorld, name: &str) -> Option<ObjectHandle> {
    let handle = world.scene().find(name);
    if handle.is_none() {
        log::warn!("No object named '{}'", name);
    }
    handle
}

fn run(world: &mut EditorWorld, session: &mut PlacementSession, config: &ToolConfig) {
    print_status(session);

    session.add_selection(world);
    print_status(session);

    let mut status = session.simulate_with(world, &config.session);
    if status == Status::SimulationInProgress {
        let mut frames = 0u32;
        status = loop {
            world.update(FRAME_DT);
            if let Some(done) = session.tick(world) {
                break done;
            }
            frames += 1;
            if frames % 100 == 0 {
                log::info!("Settling... {} iterations", frames);
            }
        };
    }
    println!("Status: {}", status);

    print_poses("Settled", world, session);

    if let Some(path) = &config.output {
        match SceneSerializer::save(world.scene(), path) {
            Ok(()) => log::info!("Saved settled scene to {}", path.display()),
            Err(err) => log::error!("{}", err),
        }
    }

    session.reset(world);
    print_poses("After reset", world, session);
}

fn print_status(session: &PlacementSession) {
    match session.last_status() {
        Some(status) => println!("Status: {}", status),
        None => println!("Status: . . ."),
    }
}

fn print_poses(title: &str, world: &EditorWorld, session: &PlacementSession) {
    println!("{}:", title);
    for participant in session.participants() {
        let handle = participant.handle();
        let name = world.scene().get(handle).map(|o| o.name.as_str()).unwrap_or("?");
        if let Some(pose) = world.transform_of(handle) {
            let [x, y, z] = pose.position;
            println!("  {:<12} ({:>7.3}, {:>7.3}, {:>7.3})", name, x, y, z);
        }
    }
    println!();
}
