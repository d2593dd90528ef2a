use crate::error::Result;
use crate::events::{AlertContext, EventRegistry};

/// Execute the `list` command: display every registered alert.
pub fn execute(registry: &EventRegistry, ctx: &AlertContext) -> Result<()> {
    if registry.is_empty() {
        println!("No alerts registered.");
        return Ok(());
    }

    println!("{:<24} {:<18} {:<10} TEXT", "EVENT", "TYPE", "PRIORITY");
    for (name, event_type) in registry.iter() {
        let (priority, text) = match registry.resolve(name, event_type, ctx) {
            Some(alert) => (alert.priority.0.to_string(), alert.text1),
            None => ("-".to_string(), String::new()),
        };
        println!(
            "{:<24} {:<18} {:<10} {}",
            name.as_str(),
            event_type.as_str(),
            priority,
            text
        );
    }

    println!("\n{} alert(s) total", registry.len());
    Ok(())
}
