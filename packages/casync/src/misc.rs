use std::any::Any;

/// Try to get the message from a panic payload caught in a coroutine body
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        log::debug!(
            "coroutine panicked with unknown payload type id: {:?}",
            payload.type_id()
        );
        "unknown panic info"
    }
}
