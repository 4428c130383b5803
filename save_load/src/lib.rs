//! Persistence for the dispatch engine.
//!
//! Engine state (stations' sections, controller configuration, node ids,
//! the tracking ledger) serializes as plain records via Bevy's
//! DynamicSceneBuilder. Wire topology is deliberately not saved: the graph
//! belongs to the host world and caches are rebuilt by the periodic
//! topology refresh after a load. The migration step lives in
//! `reconstruction` and normalizes old record shapes before the engine
//! resumes.

pub mod reconstruction;

use {
    bevy::prelude::*,
    chrono::Local,
    circuit_components::IncludeInSave,
    dispatch_resources::TrackingLedger,
    states::SimState,
    std::{fs, io::Write, path::Path},
};

/// Event to write a save file now (autosave has its own timer).
#[derive(Event)]
pub struct SaveRelay;

/// Event to load the named save file, replacing current engine state.
#[derive(Event)]
pub struct LoadRelay {
    pub path: String,
}

/// Timer resource for automatic saves.
#[derive(Resource)]
pub struct AutosaveTimer(Timer);

impl Default for AutosaveTimer {
    fn default() -> Self {
        Self(Timer::from_seconds(60.0, TimerMode::Repeating))
    }
}

#[derive(Resource, Default)]
struct PendingSave(bool);

pub struct SaveLoadPlugin;

impl Plugin for SaveLoadPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AutosaveTimer>()
            .init_resource::<PendingSave>()
            .add_observer(queue_manual_save)
            .add_observer(execute_load)
            .add_observer(reconstruction::on_scene_ready)
            .add_systems(
                PostUpdate,
                execute_save.run_if(in_state(SimState::Running)),
            );
    }
}

fn queue_manual_save(_trigger: On<SaveRelay>, mut pending: ResMut<PendingSave>) {
    pending.0 = true;
}

/// Exclusive system that handles manual and automatic saves.
fn execute_save(world: &mut World) {
    let manual = {
        let mut pending = world.resource_mut::<PendingSave>();
        std::mem::take(&mut pending.0)
    };

    let is_autosave = if manual {
        // Reset the autosave timer to avoid back-to-back saves.
        if let Some(mut timer) = world.get_resource_mut::<AutosaveTimer>() {
            timer.0.reset();
        }
        false
    } else {
        let Some(delta) = world.get_resource::<Time>().map(|t| t.delta()) else {
            return;
        };
        let Some(mut timer) = world.get_resource_mut::<AutosaveTimer>() else {
            return;
        };
        if !timer.0.tick(delta).just_finished() {
            return;
        }
        true
    };

    let filename = if is_autosave {
        "autosave.scn.ron".to_string()
    } else {
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        format!("save_{}.scn.ron", timestamp)
    };
    // Under assets/ so the asset server can read saves back in.
    let saves_dir = Path::new("assets/saves");
    let filepath = saves_dir.join(&filename);

    if let Err(e) = fs::create_dir_all(saves_dir) {
        error!("Failed to create saves directory: {}", e);
        return;
    }

    let mut query = world.query_filtered::<Entity, With<IncludeInSave>>();
    let saveable: Vec<Entity> = query.iter(world).collect();
    let scene = build_save_scene(world, saveable);

    let type_registry = world.resource::<AppTypeRegistry>().clone();
    let type_registry = type_registry.read();
    let serialized = match scene.serialize(&type_registry) {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to serialize save scene: {}", e);
            return;
        }
    };

    match fs::File::options()
        .write(true)
        .truncate(true)
        .create(true)
        .open(&filepath)
    {
        Ok(mut file) => {
            if let Err(e) = file.write_all(serialized.as_bytes()) {
                error!("Failed to write save file: {}", e);
                return;
            }
            info!("Engine state saved to {}", filepath.display());
        }
        Err(e) => error!("Failed to create save file: {}", e),
    }
}

/// Builds a DynamicScene with the engine's serializable records.
///
/// Wire terminals are denied: they hold raw `Entity` references into the
/// host graph and are rediscovered after load instead.
fn build_save_scene(world: &World, saveable: Vec<Entity>) -> DynamicScene {
    DynamicSceneBuilder::from_world(world)
        .deny_component::<circuit_components::BusTerminals>()
        .allow_resource::<TrackingLedger>()
        .extract_entities(saveable.into_iter())
        .extract_resources()
        .build()
}

/// Observer that replaces current engine state with a save file.
fn execute_load(
    trigger: On<LoadRelay>,
    saved: Query<Entity, With<IncludeInSave>>,
    asset_server: Res<AssetServer>,
    mut commands: Commands,
) {
    for entity in &saved {
        commands.entity(entity).despawn();
    }

    let path = Path::new("saves").join(&trigger.event().path);
    info!("Loading save file: {}", path.display());
    commands.spawn(DynamicSceneRoot(asset_server.load(path)));
}
