//! tilehop main entry point.
//!
//! A small 2D tile-based platformer written in Rust using:
//! - **raylib** for windowing, graphics and input
//! - **bevy_ecs** for entity-component-system architecture
//!
//! Levels are maps made with the Tiled editor (`.tmx` or `.tmj`). Tile types
//! (`Player_idle`, `Terrain_ground`, `Platform_wood`, `Item_coin`...) and
//! custom properties (`collidable`, `canDescend`...) drive the game.
//!
//! # Main Loop
//!
//! 1. Load `config.ini`, open the window, load the level
//! 2. Register observers and systems
//! 3. Each frame: input, window requests, background scroll, tile animation,
//!    player controller, player animation, render
//! 4. Exit on Escape or window close
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --config config.ini
//! ```

// Do not create console on Windows
#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;

use tilehop::events::switchfullscreen::{SwitchFullScreenEvent, switch_fullscreen_observer};
use tilehop::game;
use tilehop::resources::gameconfig::GameConfig;
use tilehop::resources::input::InputState;
use tilehop::resources::worldtime::WorldTime;
use tilehop::systems::animation::tileset_animation;
use tilehop::systems::background::background_scroll;
use tilehop::systems::input::{update_input_state, window_requests};
use tilehop::systems::player::{player_animation, player_controller};
use tilehop::systems::render::render_system;
use tilehop::systems::time::update_world_time;

/// tilehop, a tile-based platformer
#[derive(Parser)]
#[command(version, about = "A small 2D tile-based platformer driven by Tiled maps.")]
struct Cli {
    /// Configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Map to load, overriding `[map] path` from the configuration.
    #[arg(long, value_name = "PATH")]
    map: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // --------------- Configuration ---------------
    let mut config = GameConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        warn!("{} ({}), using defaults", e, cli.config.display());
    }
    if let Some(map) = cli.map.as_ref() {
        config.set_map_path(map);
    }

    let mut input = InputState::default();
    input.apply_bindings(&config.controls);

    // --------------- Raylib window ---------------
    let (window_width, window_height) = config.window_size();
    let (mut rl, thread) = raylib::init()
        .size(window_width as i32, window_height as i32)
        .resizable()
        .title("tilehop")
        .build();
    rl.set_target_fps(config.target_fps);
    // Escape is handled as a quit request, not by raylib
    rl.set_exit_key(None);

    // --------------- ECS world + level ---------------
    let mut world = World::new();
    world.insert_resource(WorldTime::default().with_time_scale(1.0));

    if let Err(e) = game::setup(&mut world, &mut rl, &thread, &config) {
        error!("Failed to load level {}: {}", config.map_path.display(), e);
        std::process::exit(1);
    }

    let start_fullscreen = config.fullscreen;
    world.insert_resource(config);
    world.insert_resource(input);
    world.insert_non_send_resource(rl);
    world.insert_non_send_resource(thread);

    world.spawn(Observer::new(switch_fullscreen_observer));
    // Ensure the observer is registered before we run any systems that may trigger events.
    world.flush();
    if start_fullscreen {
        world.trigger(SwitchFullScreenEvent {});
    }

    let mut update = Schedule::default();
    update.add_systems(
        (
            update_input_state,
            window_requests,
            background_scroll,
            tileset_animation,
            player_controller,
            player_animation,
            render_system,
        )
            .chain(),
    );

    if let Err(e) = update.initialize(&mut world) {
        error!("Failed to initialize schedule: {}", e);
        std::process::exit(1);
    }

    info!("Level ready, entering main loop");
    // --------------- Main loop ---------------
    while !world.resource::<InputState>().quit_requested {
        let dt = world
            .non_send_resource::<raylib::RaylibHandle>()
            .get_frame_time();
        update_world_time(&mut world, dt);

        update.run(&mut world);

        world.clear_trackers();
    }
    info!("Bye");
}
