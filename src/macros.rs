//! The event table and the formatted-event macro.
//!
//! Every event code is declared exactly once, in `for_each_ctf_event!`. The
//! table is handed to a callback macro, so the code space (`event`), the
//! encoder entry points (`encoder::ctf`), the kernel-hook functions (`hooks`)
//! and the C exports all expand from the same rows and cannot drift apart.
//!
//! # Table format
//!
//! ```text
//! fixed {
//!     Variant = code => entry_point(field, field, ...),
//! }
//! text {
//!     Variant = code => entry_point(field),
//! }
//! ```
//!
//! `fixed` rows carry only 32-bit fields. `text` rows carry a single
//! NUL-terminated text field. Codes are part of the wire contract: rows may be
//! appended, never renumbered.

/// Expand `$callback!` with the full event table.
macro_rules! for_each_ctf_event {
    ($callback:ident) => {
        $callback! {
            fixed {
                /// Interrupt handler entered; `isr_number` is the interrupt source.
                IsrEnter = 0x10 => isr_enter(isr_number),
                /// Interrupt handler left without a context switch.
                IsrExit = 0x11 => isr_exit(),
                /// Running task asked to block for `ticks_to_delay` ticks.
                TaskDelay = 0x12 => task_delay(ticks_to_delay),
                /// Task is waiting on its notification counter.
                TaskNotifyTake = 0x13 => task_notify_take(clear_count_on_exit, ticks_to_wait),
                /// Running task blocked until an absolute wake time.
                TaskDelayUntil = 0x14 => task_delay_until(),
                /// Notification given from an interrupt.
                TaskNotifyGiveFromIsr = 0x15 => task_notify_give_from_isr(tcb, higher_priority_task_woken),
                /// Mutex holder `mutex_holder` inherited a higher priority.
                TaskPriorityInherit = 0x16 => task_priority_inherit(mutex_holder),
                /// Suspended task `tcb` resumed.
                TaskResume = 0x17 => task_resume(tcb),
                /// Tick count advanced by `ticks_to_jump` after tickless idle.
                IncreaseTickCount = 0x18 => increase_tick_count(ticks_to_jump),
                /// Task `tcb` suspended.
                TaskSuspend = 0x19 => task_suspend(tcb),
                /// Mutex holder `mutex_holder` returned to its base priority.
                TaskPriorityDisinherit = 0x1A => task_priority_disinherit(mutex_holder),
                /// Suspended task `tcb` resumed from an interrupt.
                TaskResumeFromIsr = 0x1B => task_resume_from_isr(tcb),
                /// Task `tcb` notified. `previous_value_ptr` is the address of
                /// the caller's output slot, not its contents.
                TaskNotify = 0x1C => task_notify(tcb, value, action, previous_value_ptr),
                /// Task `tcb` notified from an interrupt. `previous_value_ptr`
                /// is an address snapshot.
                TaskNotifyFromIsr = 0x1D => task_notify_from_isr(tcb, value, action, previous_value_ptr, higher_priority_task_woken),
                /// Task waiting for a notification. `notification_value_ptr` is
                /// an address snapshot.
                TaskNotifyWait = 0x1E => task_notify_wait(bits_to_clear_on_entry, bits_to_clear_on_exit, notification_value_ptr, ticks_to_wait),
                /// Queue created.
                QueueCreate = 0x1F => queue_create(queue_length, item_size, queue_type),
                /// Queue deleted.
                QueueDelete = 0x20 => queue_delete(queue),
                /// Item peeked from a queue.
                QueuePeek = 0x21 => queue_peek(queue, buffer, ticks_to_wait, just_peeking),
                /// Item peeked from a queue inside an interrupt.
                QueuePeekFromIsr = 0x22 => queue_peek_from_isr(queue, ticks_to_wait),
                /// Peek from an interrupt found the queue empty.
                QueuePeekFromIsrFailed = 0x23 => queue_peek_from_isr_failed(queue, ticks_to_wait),
                /// Item received from a queue.
                QueueReceive = 0x24 => queue_receive(queue, buffer, ticks_to_wait, just_peeking),
                /// Receive timed out on an empty queue.
                QueueReceiveFailed = 0x25 => queue_receive_failed(queue, buffer, ticks_to_wait, copy_position),
                /// Semaphore taken.
                QueueSemaphoreReceive = 0x26 => queue_semaphore_receive(queue, buffer, ticks_to_wait, just_peeking),
                /// Item received from a queue inside an interrupt.
                QueueReceiveFromIsr = 0x27 => queue_receive_from_isr(queue, buffer, higher_priority_task_woken),
                /// Receive from an interrupt found the queue empty.
                QueueReceiveFromIsrFailed = 0x28 => queue_receive_from_isr_failed(queue, buffer, higher_priority_task_woken),
                /// Queue given a debug name; `queue_name` is the string's address.
                QueueRegistryAdd = 0x29 => queue_registry_add(queue, queue_name),
                /// Send timed out on a full queue.
                QueueSendFailed = 0x2A => queue_send_failed(queue, item, ticks_to_wait, copy_position),
                /// Item sent to a queue inside an interrupt.
                QueueSendFromIsr = 0x2B => queue_send_from_isr(queue, item, higher_priority_task_woken, copy_position),
                /// Send from an interrupt found the queue full.
                QueueSendFromIsrFailed = 0x2C => queue_send_from_isr_failed(queue, item, ticks_to_wait, copy_position),
                /// Semaphore given inside an interrupt.
                QueueGiveFromIsr = 0x2D => queue_give_from_isr(queue, higher_priority_task_woken),
                /// Semaphore give from an interrupt failed.
                QueueGiveFromIsrFailed = 0x2E => queue_give_from_isr_failed(queue, ticks_to_wait),
                /// Stream or message buffer created.
                StreamBufferCreate = 0x2F => stream_buffer_create(is_message_buffer, stream_buffer),
                /// Stream or message buffer allocation failed.
                StreamBufferCreateFailed = 0x30 => stream_buffer_create_failed(is_message_buffer, stream_buffer),
                /// Stream buffer deleted.
                StreamBufferDelete = 0x31 => stream_buffer_delete(stream_buffer),
                /// Stream buffer reset.
                StreamBufferReset = 0x32 => stream_buffer_reset(stream_buffer),
                /// Bytes written to a stream buffer.
                StreamBufferSend = 0x33 => stream_buffer_send(stream_buffer, bytes_sent),
                /// Write to a stream buffer timed out.
                StreamBufferSendFailed = 0x34 => stream_buffer_send_failed(stream_buffer, bytes_sent),
                /// Bytes written to a stream buffer inside an interrupt.
                StreamBufferSendFromIsr = 0x35 => stream_buffer_send_from_isr(stream_buffer, bytes_sent),
                /// Bytes read from a stream buffer.
                StreamBufferReceive = 0x36 => stream_buffer_receive(stream_buffer, received_length),
                /// Read from a stream buffer timed out.
                StreamBufferReceiveFailed = 0x37 => stream_buffer_receive_failed(stream_buffer, received_length),
                /// Bytes read from a stream buffer inside an interrupt.
                StreamBufferReceiveFromIsr = 0x38 => stream_buffer_receive_from_isr(stream_buffer, received_length),
                /// Task `tcb` deleted.
                TaskDelete = 0x39 => task_delete(tcb),
                /// Task `tcb` created.
                TaskCreate = 0x3A => task_create(tcb),
                /// Priority of `task` changed to `new_priority`.
                TaskPrioritySet = 0x3B => task_priority_set(task, new_priority),
                /// Task `tcb` switched in on this core.
                TaskSwitchedIn = 0x3C => task_switched_in(tcb),
                /// Idle task switched in on this core.
                Idle = 0x3D => idle(),
                /// Task `tcb` moved to a ready list.
                TaskToReadyState = 0x3E => task_to_ready_state(tcb),
                /// Task `tcb` moved to the delayed list.
                TaskToDelayedList = 0x3F => task_to_delayed_list(tcb, cause),
                /// Task `tcb` moved to the overflow delayed list.
                TaskToOverflowDelayedList = 0x40 => task_to_overflow_delayed_list(tcb, cause),
                /// Task `tcb` moved to the suspended list.
                TaskToSuspendedList = 0x41 => task_to_suspended_list(tcb, cause),
                /// Interrupt handler left and requested a context switch.
                IsrExitToScheduler = 0x42 => isr_exit_to_scheduler(),
            }
            text {
                /// Formatted text message, `"[name] text"`.
                PrintEvent = 0x43 => print_event(msg),
            }
        }
    };
}

pub(crate) use for_each_ctf_event;

/// Emit a formatted text event through the active encoder.
///
/// The message is formatted into a bounded stack buffer and silently
/// truncated at `PRINT_EVENT_CAPACITY - 1` bytes. The encoder prefixes it with
/// `[name] ` and applies the same bound again. Evaluates to
/// `Result<(), TraceError>`; fails with `InvalidState` if no encoder is active.
///
/// Formatting costs far more than a fixed event. Keep it out of ISR paths.
///
/// # Example
///
/// ```rust,ignore
/// trace_event!("sensor_reading", "temperature: {}", 25);
/// ```
#[macro_export]
macro_rules! trace_event {
    ($name:expr, $($arg:tt)+) => {{
        let mut text =
            $crate::text::TextBuf::<{ $crate::record::PRINT_EVENT_CAPACITY }>::new();
        let _ = ::core::fmt::Write::write_fmt(&mut text, format_args!($($arg)+));
        $crate::registry::TRACER.print_event($name, text.as_str())
    }};
}
