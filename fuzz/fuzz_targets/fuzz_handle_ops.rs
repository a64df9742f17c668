#![no_main]

use dbgapi_error::{ErrorHandle, ErrorState, ErrorType, Stream};
use libfuzzer_sys::fuzz_target;

// Each input byte picks an operation; the following bytes feed its arguments.
fuzz_target!(|data: &[u8]| {
    let mut handles = [ErrorHandle::new(), ErrorHandle::new()];
    let mut i = 0;

    while i < data.len() {
        let op = data[i];
        let target = usize::from(op >> 7);
        let arg = data.get(i + 1).copied().unwrap_or(0);
        let text = String::from_utf8_lossy(&data[(i + 1).min(data.len())..(i + 1 + usize::from(arg % 32)).min(data.len())]);

        let handle = &mut handles[target];
        match op & 0x0f {
            0 => handle.set_error(u32::from(arg), ErrorType::from_raw(u32::from(arg >> 4))),
            1 => handle.set_error_string(&text),
            2 => {
                let written = handle.set_error_string_with_format(format_args!("{text}#{arg}"));
                assert_eq!(written as usize, handle.error_str().unwrap_or("").len());
            }
            3 => handle.set_error_to_generic_error(),
            4 => handle.set_error_to_system_default(),
            5 => handle.clear(),
            6 => handle.reset(),
            7 => handle.set_error_from_state(&ErrorState::with_message(&text)),
            8 => {
                let [a, b] = &mut handles;
                if target == 0 { a.clone_from(b) } else { b.clone_from(a) }
            }
            _ => {}
        }

        for handle in &handles {
            assert!(!(handle.success() && handle.fail()));
            if !handle.is_valid() {
                assert!(handle.success());
                assert_eq!(handle.error_code(), 0);
            }
            let mut stream = Stream::new();
            assert!(handle.get_description(&mut stream));
            assert!(!stream.is_empty());
        }

        i += 2;
    }
});
