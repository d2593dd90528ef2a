use crate::error::{AlertError, Result};
use crate::events::{AlertContext, EventName, EventRegistry};
use crate::types::EventType;

/// Execute the `show` command: display the alert one event resolves to.
pub fn execute(
    event: &str,
    event_type: &str,
    registry: &EventRegistry,
    ctx: &AlertContext,
) -> Result<()> {
    let name: EventName = event.parse()?;
    let et: EventType = event_type.parse()?;

    let alert = registry
        .resolve(name, et, ctx)
        .ok_or_else(|| AlertError::UnknownEvent(format!("{}/{}", name, et)))?;

    println!("Alert: {}", alert.alert_type);
    println!("Text 1: {}", alert.text1);
    if !alert.text2.is_empty() {
        println!("Text 2: {}", alert.text2);
    }
    println!("Status: {:?}", alert.status);
    println!("Size: {:?}", alert.size);
    println!("Sound: {:?}", alert.sound);
    println!("Priority: {}", alert.priority.0);
    println!("Duration: {} frames", alert.duration_frames());

    let others: Vec<&str> = registry
        .types_for(name)
        .into_iter()
        .filter(|t| *t != et)
        .map(|t| t.as_str())
        .collect();
    if !others.is_empty() {
        println!("\nAlso registered as: {}", others.join(", "));
    }

    Ok(())
}
