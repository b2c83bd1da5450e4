//! List command implementation

use probeflash_flash::ProgrammerRegistry;

/// List all supported interfaces, in probe order
pub fn list_interfaces(registry: &ProgrammerRegistry) {
    println!("Supported interfaces:");
    println!();
    for p in registry.iter() {
        println!("  {:16} - {}", p.identifier(), p.description());
    }
}
