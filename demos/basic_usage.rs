use dbgapi_error::{ErrorHandle, ErrorType, Stream, set_error_fmt};

/// Pretend to read inferior memory, reporting through an out-parameter
/// the way API functions do.
fn read_memory(addr: u64, len: usize, error: &mut ErrorHandle) -> Vec<u8> {
    if addr == 0 {
        set_error_fmt!(error, "cannot read {} bytes at null address", len);
        return Vec::new();
    }
    if len > 4096 {
        error.set_error(22, ErrorType::Posix);
        return Vec::new();
    }
    error.clear();
    vec![0; len]
}

fn describe(error: &ErrorHandle) -> String {
    let mut stream = Stream::new();
    error.get_description(&mut stream);
    stream.data().to_owned()
}

fn main() {
    println!("--- Basic Usage Example ---\n");

    let mut error = ErrorHandle::new();
    println!("1. Fresh handle");
    println!("   valid={} success={} -> {}", error.is_valid(), error.success(), describe(&error));

    let _ = read_memory(0, 16, &mut error);
    println!("\n2. After a failed read");
    println!("   code=0x{:08x} type={} -> {}", error.error_code(), error.error_type(), describe(&error));

    let _ = read_memory(0x1000, 1 << 20, &mut error);
    println!("\n3. After an oversized read (POSIX EINVAL, text rendered on demand)");
    println!("   code={} type={} -> {}", error.error_code(), error.error_type(), describe(&error));

    let snapshot = error.clone();
    let bytes = read_memory(0x1000, 64, &mut error);
    println!("\n4. After a good read of {} bytes", bytes.len());
    println!("   current:  valid={} -> {}", error.is_valid(), describe(&error));
    println!("   snapshot: -> {}", describe(&snapshot));
}
