//! Plugins compiled into the application
//!
//! These are always registered, whatever happens to federated extensions.

use super::record::{ModuleExports, PluginExports, PluginRecord};

/// Token provided by the paths plugin
pub const PATHS_TOKEN: &str = "@federated/app:IPaths";

/// Token provided by the top area plugin
pub const TOP_AREA_TOKEN: &str = "@federated/app:ITopArea";

/// Application URL paths
#[must_use]
pub fn paths() -> ModuleExports {
    ModuleExports::EsModule(
        PluginRecord::new("@federated/app:paths")
            .with_description("Application URL paths")
            .auto_start()
            .provides(PATHS_TOKEN)
            .into(),
    )
}

/// Top area of the application shell
#[must_use]
pub fn top() -> ModuleExports {
    ModuleExports::EsModule(PluginExports::Many(vec![
        PluginRecord::new("@federated/app:top")
            .with_description("Top area widgets")
            .auto_start()
            .requires(PATHS_TOKEN)
            .provides(TOP_AREA_TOKEN),
    ]))
}

/// Example content plugin
#[must_use]
pub fn example() -> ModuleExports {
    ModuleExports::EsModule(
        PluginRecord::new("@federated/app:example")
            .with_description("Example content")
            .auto_start()
            .requires(TOP_AREA_TOKEN)
            .into(),
    )
}

/// All built-in plugin modules, in registration order
#[must_use]
pub fn modules() -> Vec<ModuleExports> {
    vec![paths(), top(), example()]
}
