//! Process-wide panic hook
//!
//! A panic inside the control loop would otherwise leave scripts paused
//! and the session in whatever state the break reached, with nothing in the
//! structured logs. The hook logs location and message through `tracing`
//! and exits non-zero so a supervisor restarts the process cleanly.
//!
//! ```no_run
//! respite_core::resilience::install_panic_handler();
//! ```

use std::panic;
use std::process;
use tracing::error;

/// Message carried by a panic payload
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<no message>".to_string()
    }
}

/// Install a panic hook that logs and exits with status 1
pub fn install_panic_handler() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_else(|| "<unknown location>".to_string());
        let message = panic_message(panic_info.payload());

        error!(
            location = %location,
            message = %message,
            "PANIC: break manager crashed"
        );
        eprintln!("FATAL PANIC at {}: {}", location, message);

        // Prints the backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);

        // Let the log writer flush
        std::thread::sleep(std::time::Duration::from_millis(100));
        process::exit(1);
    }));

    tracing::info!("Panic handler installed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_extracts_payload() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static text");
        assert_eq!(panic_message(payload.as_ref()), "static text");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned text"));
        assert_eq!(panic_message(payload.as_ref()), "owned text");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(payload.as_ref()), "<no message>");
    }
}
