//! Probe command implementation

use probeflash_flash::{FlashError, Orchestrator};

/// Probe every interface and print the ones that answered
pub fn run_probe(orchestrator: &mut Orchestrator) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    log::info!("Probing for interfaces...");
    let found = orchestrator.probe_all()?;

    if found.is_empty() {
        return Err(FlashError::NoInterfaceFound.into());
    }

    println!("Found {} interface(s):", found.len());
    for name in &found {
        println!("  {}", name);
    }
    Ok(found)
}
