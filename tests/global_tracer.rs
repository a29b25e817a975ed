use rtos_trace::decode::RecordIter;
use rtos_trace::hooks;
use rtos_trace::registry::{self, OpenParams, TRACER};
use rtos_trace::timestamp::set_core_id_source;
use rtos_trace::transport::ring::RingTransport;
use rtos_trace::{trace_event, EncoderConfig, EventCode, Timeout, TraceError, CTF_ENCODER};

static RING: RingTransport<1024> = RingTransport::new();

/// Full startup sequence against the process-wide tracer, then decode what
/// reached the ring. Runs as a single test since activation happens once.
#[test]
fn test_global_tracer_lifecycle() {
    println!("Testing global tracer lifecycle...");

    set_core_id_source(|| 1).unwrap();
    assert_eq!(set_core_id_source(|| 0), Err(TraceError::InvalidState));

    registry::init().unwrap();
    registry::init().unwrap();
    assert_eq!(TRACER.encoder_count(), 1);
    TRACER.register_transport("ring", &RING).unwrap();

    // Nothing is active yet: hooks fail and nothing is written
    assert_eq!(hooks::idle(), Err(TraceError::InvalidState));
    assert_eq!(TRACER.print_event("early", "boot"), Err(TraceError::InvalidState));
    assert!(RING.is_empty());

    assert_eq!(
        TRACER.open(&OpenParams::new("nope", "ring")).err(),
        Some(TraceError::NotFound)
    );
    let params = OpenParams {
        encoder_cfg: Some(EncoderConfig {
            timeout: Timeout::NO_WAIT,
        }),
        ..OpenParams::new("ctf", "ring")
    };
    let enc = TRACER.open(&params).unwrap();
    assert_eq!(enc.name(), "ctf");
    assert_eq!(
        TRACER.open(&params).err(),
        Some(TraceError::InvalidState)
    );
    assert_eq!(CTF_ENCODER.timeout(), Timeout::NO_WAIT);

    hooks::task_switched_in(0x3FFB_2000).unwrap();
    hooks::queue_create(8, 16, 0).unwrap();
    trace_event!("custom_event", "value: {}", 147).unwrap();
    hooks::isr_exit_to_scheduler().unwrap();

    let mut captured = [0u8; 1024];
    let len = RING.drain(&mut captured);
    assert_eq!(len, 10 + 18 + (6 + 26) + 6);

    let records: Vec<_> = RecordIter::new(&captured[..len])
        .map(|record| record.unwrap())
        .collect();
    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|record| record.core_id == 1));

    assert_eq!(records[0].code, EventCode::TaskSwitchedIn);
    assert_eq!(records[0].field("tcb"), Some(0x3FFB_2000));

    assert_eq!(records[1].code, EventCode::QueueCreate);
    assert_eq!(records[1].values(), &[8, 16, 0]);

    assert_eq!(records[2].code, EventCode::PrintEvent);
    assert_eq!(records[2].text(), Some(&b"[custom_event] value: 147"[..]));

    assert_eq!(records[3].code, EventCode::IsrExitToScheduler);
    for record in &records {
        println!("{}", record);
    }

    let stats = CTF_ENCODER.stats();
    assert_eq!(stats.records_per_core, [0, 4]);
    assert_eq!(stats.bytes, len);

    println!("✅ Global tracer lifecycle test passed");
}
