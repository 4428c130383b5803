use {
    bevy::prelude::*,
    bevy_common_assets::ron::RonAssetPlugin,
    dispatch::DispatchPlugin,
    save_load::SaveLoadPlugin,
    scenario_assets::ScenarioDefinition,
    states::SimState,
    system_schedule::DispatchSchedule,
};

mod systems;

pub struct SimCorePlugin;

impl Plugin for SimCorePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<SimState>()
            .add_plugins(RonAssetPlugin::<ScenarioDefinition>::new(&["scenario.ron"]))
            .add_plugins((DispatchPlugin, SaveLoadPlugin))
            .configure_sets(
                Update,
                (
                    DispatchSchedule::Sense,
                    DispatchSchedule::RefreshTopology,
                    DispatchSchedule::Reconcile,
                    DispatchSchedule::FrameEnd,
                )
                    .chain(),
            )
            .init_resource::<systems::DriftTimer>()
            .add_systems(Startup, systems::queue_scenario)
            .add_systems(
                Update,
                systems::spawn_when_loaded.run_if(in_state(SimState::Loading)),
            )
            .add_systems(
                Update,
                systems::drift_emitters
                    .in_set(DispatchSchedule::Sense)
                    .run_if(in_state(SimState::Running)),
            );
    }
}
