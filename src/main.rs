use {
    bevy::{log::LogPlugin, prelude::*},
    sim_core::SimCorePlugin,
};

fn main() {
    App::new()
        .add_plugins(
            DefaultPlugins.set(LogPlugin {
                filter: "error,\
                    bus=info,\
                    dispatch=debug,\
                    save_load=info,\
                    sim_core=info"
                    .into(),
                level: bevy::log::Level::TRACE,
                ..Default::default()
            }),
        )
        .add_plugins(SimCorePlugin)
        .run();
}
