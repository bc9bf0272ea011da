//! Resolution of the "new dock" choice of dock lists.

use tracing::{info, warn};

use crate::builder::Builder;
use crate::source::{DESKTOP_ENTRY, NEW_DOCK};
use crate::value::Value;

/// Replace a `_NewDock_` selection with the name of a freshly created dock.
///
/// Returns `None` when the stored value must be kept: the icon is a detached
/// desklet, or the config is neither an icon nor a launcher.
pub fn resolve_new_dock(builder: &Builder, value: Value) -> Option<Value> {
    if !matches!(&value, Value::String(s) if s == NEW_DOCK) {
        return Some(value);
    }

    if builder.key("Icon", "dock name").is_some() {
        if builder.key("Desklet", "initially detached").is_some()
            && builder.key_bool("Desklet", "initially detached")
        {
            info!("detached desklet, new dock not created");
            return None;
        }
    } else if builder.key(DESKTOP_ENTRY, "Container").is_none() {
        warn!("new dock requested outside of an icon or launcher config");
        return None;
    }

    let name = builder.source().create_main_dock();
    info!(dock = %name, "new dock created");
    Some(Value::String(name))
}
