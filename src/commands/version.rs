use anyhow::Result;

pub fn execute() -> Result<()> {
    println!("cputemp version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
