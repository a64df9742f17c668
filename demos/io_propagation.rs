use dbgapi_error::{ErrorHandle, Result};
use std::fs;

fn load_core(path: &str) -> Result<usize> {
    let bytes = fs::read(path)?;
    Ok(bytes.len())
}

fn main() {
    println!("--- I/O Propagation Example ---\n");

    for path in ["/proc/self/status", "/no/such/core.1234"] {
        let handle = ErrorHandle::from(load_core(path));
        println!("{path}");
        println!("   valid={} code={} type={}", handle.is_valid(), handle.error_code(), handle.error_type());
        println!("   {handle}");
    }
}
