use dbgapi_error::{
    ErrorHandle, ErrorType, LogCategory, RingBufferSink, clear_log_sink, install_log_sink,
};
use std::sync::Arc;

fn main() {
    println!("--- API Logging Example ---\n");

    // Keep the last 8 lines, 96 bytes each
    let sink = RingBufferSink::new(8, 96);
    install_log_sink(Arc::new(sink.clone()));

    let mut error = ErrorHandle::new();
    for pid in [0u32, 17, 0, 42] {
        if pid == 0 {
            error.set_error(3, ErrorType::Posix);
        } else {
            error.clear();
        }
        let _ = error.fail();
        let _ = error.error_code();
    }

    println!("1. Recorded {} lines, evicted {}", sink.len(), sink.eviction_count());
    for entry in sink.get_all().iter().rev() {
        println!("   [{:<5}] {}", entry.category, entry.line);
    }

    println!("\n2. State transitions only:");
    for entry in sink.get_filtered(|e| e.category == LogCategory::State) {
        println!("   {}", entry.line);
    }

    clear_log_sink();
    let _ = error.fail();
    println!("\n3. After removing the sink, queries log nothing: {} lines", sink.len());
}
