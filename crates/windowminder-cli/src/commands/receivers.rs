use std::path::Path;
use windowminder_core::ReceiverRegistry;

use super::load_config;

/// Print each built-in receiver and whether it survives configuration.
pub fn run(explicit: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(explicit)?;

    let known: Vec<(String, String, String)> = ReceiverRegistry::builtin()
        .receivers()
        .iter()
        .map(|r| {
            (
                r.name().to_string(),
                r.display_name().to_string(),
                r.version().to_string(),
            )
        })
        .collect();
    let active = ReceiverRegistry::builtin().configure(&config.receivers);

    for (name, display_name, version) in known {
        let state = match active.iter().find(|r| r.name() == name) {
            Some(r) if r.enabled() => "active",
            Some(_) => "disabled (enabled = false)",
            None => "disabled (configuration rejected)",
        };
        let source = if config.receivers.contains_key(&name) {
            "configured"
        } else {
            "defaults"
        };
        println!("{name:<14} v{version:<5} {display_name} [{source}, {state}]");
    }
    Ok(())
}
