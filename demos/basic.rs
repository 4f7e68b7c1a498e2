/// Basic example demonstrating archive creation and reading
///
/// Run with: cargo run --example basic
use ar_rs::{Archive, MemberOptions};
use std::error::Error;

const ARCHIVE: &str = "example_basic.a";

fn main() -> Result<(), Box<dyn Error>> {
    println!("=== ar-rs Basic Example ===\n");

    // Create an archive
    println!("1. Creating archive...");
    create_archive()?;

    // Read from the archive
    println!("\n2. Reading from archive...");
    read_archive()?;

    println!("\n✓ Example complete!");
    Ok(())
}

fn create_archive() -> Result<(), Box<dyn Error>> {
    let mut archive = Archive::create(ARCHIVE, true)?;

    // Same layout as a Debian package
    archive.add("debian-binary", b"2.0\n", 100644, None, 0, 0)?;
    archive.add("control.tar", b"control files", 100644, None, 0, 0)?;

    // Options can be reused across members
    let options = MemberOptions::deterministic().with_mode(100755);
    archive.add_with("data.tar", b"payload", &options)?;

    archive.close();
    println!("   ✓ Archive created: {}", ARCHIVE);

    Ok(())
}

fn read_archive() -> Result<(), Box<dyn Error>> {
    let mut archive = Archive::open(ARCHIVE)?;

    // List all members
    println!("   Members in archive:");
    for entry in archive.list()? {
        println!(
            "     - {:<16} {:>6} bytes  mode {}",
            entry.name(),
            entry.size(),
            entry.meta.mode
        );
    }

    // Read a specific member
    println!("\n   Reading debian-binary:");
    let version = archive.get("debian-binary")?;
    println!("     {}", String::from_utf8_lossy(&version).trim());

    Ok(())
}
