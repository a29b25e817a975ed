//! Encoder registry and the process-wide active encoder.
//!
//! Encoders and transports are registered by name during startup, before any
//! event is traced. Startup then selects one encoder and one transport by name
//! (`Tracer::open`); the encoder is bound to the transport, initialized, and
//! becomes the active encoder for the rest of the run.
//!
//! # Lifecycle
//!
//! ```text
//! registry::init()                      built-in encoders registered
//! TRACER.register_transport("uart", &U)  platform sinks registered
//! TRACER.open(&OpenParams { .. })        encoder bound + initialized + active
//! hooks::* / trace_event!               events flow to the transport
//! ```
//!
//! Activation happens once. A second `activate`/`open` fails with
//! `InvalidState` and the active encoder stays as it was; switching encoders
//! mid-trace is not supported. The name tables use a `spin::Mutex`, which is
//! fine because they are only touched at startup. The active encoder is read
//! on every traced event and is a plain atomic pointer.

use core::ptr;
use core::sync::atomic::{AtomicBool, AtomicPtr, AtomicUsize, Ordering};

use conquer_once::spin::OnceCell;
use spin::Mutex;

use crate::encoder::ctf::CTF_ENTRY;
use crate::encoder::{EncoderConfig, EncoderOps, TraceEncoder};
use crate::error::TraceError;
use crate::transport::{Timeout, Transport};

/// Encoder table capacity.
pub const MAX_ENCODERS: usize = 8;

/// Transport table capacity.
pub const MAX_TRANSPORTS: usize = 8;

/// The process-wide tracer.
pub static TRACER: Tracer = Tracer::new();

/// Set once the built-in encoders are registered.
static BUILTINS_REGISTERED: AtomicBool = AtomicBool::new(false);

/// Register the built-in encoders with `TRACER`.
///
/// Must run before `TRACER.open`. Safe to call more than once.
pub fn init() -> Result<(), TraceError> {
    if BUILTINS_REGISTERED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }
    TRACER.register_encoder(&CTF_ENTRY)?;
    log::info!(
        "Trace registry initialized: {} encoder(s)",
        TRACER.encoder_count()
    );
    Ok(())
}

// =============================================================================
// Name Table
// =============================================================================

/// Fixed-capacity table of `'static` items keyed by unique name.
struct NameTable<T: ?Sized + 'static, const N: usize> {
    slots: Mutex<[Option<(&'static str, &'static T)>; N]>,
}

impl<T: ?Sized + 'static, const N: usize> NameTable<T, N> {
    const fn new() -> Self {
        Self {
            slots: Mutex::new([None; N]),
        }
    }

    fn insert(&self, name: &'static str, item: &'static T) -> Result<(), TraceError> {
        if name.is_empty() {
            return Err(TraceError::InvalidArg);
        }
        let mut slots = self.slots.lock();
        if slots.iter().flatten().any(|(existing, _)| *existing == name) {
            return Err(TraceError::InvalidState);
        }
        let slot = slots
            .iter_mut()
            .find(|slot| slot.is_none())
            .ok_or(TraceError::NoMem)?;
        *slot = Some((name, item));
        Ok(())
    }

    fn get(&self, name: &str) -> Option<&'static T> {
        self.slots
            .lock()
            .iter()
            .flatten()
            .find(|(existing, _)| *existing == name)
            .map(|(_, item)| *item)
    }

    fn len(&self) -> usize {
        self.slots.lock().iter().flatten().count()
    }
}

// =============================================================================
// Encoder Entries
// =============================================================================

/// Activation attempts an entry accepts before it runs out of handles.
pub const MAX_BIND_ATTEMPTS: usize = 4;

/// A registrable encoder: its name, its operations, and the handle it gets
/// once bound to a transport.
///
/// Every activation attempt stages a fresh handle in its own slot; only the
/// one whose `init` succeeds is committed. A failed attempt leaves the entry
/// free for another transport.
pub struct EncoderEntry {
    name: &'static str,
    ops: &'static dyn EncoderOps,
    attempts: [OnceCell<TraceEncoder>; MAX_BIND_ATTEMPTS],
    next_attempt: AtomicUsize,
    /// Committed handle; null until an activation succeeds.
    bound: AtomicPtr<TraceEncoder>,
}

impl EncoderEntry {
    pub const fn new(name: &'static str, ops: &'static dyn EncoderOps) -> Self {
        #[allow(clippy::declare_interior_mutable_const)]
        const SLOT: OnceCell<TraceEncoder> = OnceCell::uninit();
        Self {
            name,
            ops,
            attempts: [SLOT; MAX_BIND_ATTEMPTS],
            next_attempt: AtomicUsize::new(0),
            bound: AtomicPtr::new(ptr::null_mut()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The bound handle, once this entry has been activated.
    pub fn handle(&self) -> Option<&'static TraceEncoder> {
        let enc = self.bound.load(Ordering::Acquire);
        // SAFETY: `bound` only holds null or a handle living in a slot of a
        // `'static` entry (see `commit`).
        unsafe { enc.as_ref() }
    }

    /// Stage a handle bound to `transport` for one activation attempt.
    ///
    /// Fails with `InvalidState` once the entry is committed and `NoMem`
    /// when every attempt slot is used.
    fn stage(
        &'static self,
        transport: &'static dyn Transport,
    ) -> Result<&'static TraceEncoder, TraceError> {
        if self.handle().is_some() {
            return Err(TraceError::InvalidState);
        }
        let index = self.next_attempt.fetch_add(1, Ordering::AcqRel);
        let slot = match self.attempts.get(index) {
            Some(slot) => slot,
            None => {
                log::warn!("Encoder {} out of activation attempts", self.name);
                return Err(TraceError::NoMem);
            }
        };
        slot.try_init_once(|| TraceEncoder::new(self.name, self.ops, Some(transport)))
            .map_err(|_| TraceError::InvalidState)?;
        slot.get().ok_or(TraceError::InvalidState)
    }

    /// Make `enc` the entry's handle for the rest of the process.
    fn commit(&'static self, enc: &'static TraceEncoder) -> Result<(), TraceError> {
        self.bound
            .compare_exchange(
                ptr::null_mut(),
                enc as *const TraceEncoder as *mut TraceEncoder,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|_| TraceError::InvalidState)
    }
}

// =============================================================================
// Tracer
// =============================================================================

/// Parameters for `Tracer::open`.
#[derive(Clone, Copy, Debug)]
pub struct OpenParams<'a> {
    pub encoder_name: &'a str,
    pub transport_name: &'a str,
    pub encoder_cfg: Option<EncoderConfig>,
}

impl<'a> OpenParams<'a> {
    pub const fn new(encoder_name: &'a str, transport_name: &'a str) -> Self {
        Self {
            encoder_name,
            transport_name,
            encoder_cfg: None,
        }
    }
}

/// Encoder and transport tables plus the active encoder.
pub struct Tracer {
    encoders: NameTable<EncoderEntry, MAX_ENCODERS>,
    transports: NameTable<dyn Transport, MAX_TRANSPORTS>,
    active: AtomicPtr<TraceEncoder>,
}

impl Tracer {
    pub const fn new() -> Self {
        Self {
            encoders: NameTable::new(),
            transports: NameTable::new(),
            active: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Add an encoder under its entry name.
    ///
    /// Fails with `InvalidArg` for an empty name, `InvalidState` if the name
    /// is taken and `NoMem` if the table is full.
    pub fn register_encoder(&self, entry: &'static EncoderEntry) -> Result<(), TraceError> {
        self.encoders.insert(entry.name(), entry)?;
        log::debug!("Registered encoder {}", entry.name());
        Ok(())
    }

    /// Add a transport under `name`, with the same rules as encoders.
    pub fn register_transport(
        &self,
        name: &'static str,
        transport: &'static dyn Transport,
    ) -> Result<(), TraceError> {
        self.transports.insert(name, transport)?;
        log::debug!("Registered transport {}", name);
        Ok(())
    }

    pub fn find_encoder(&self, name: &str) -> Option<&'static EncoderEntry> {
        self.encoders.get(name)
    }

    pub fn find_transport(&self, name: &str) -> Option<&'static dyn Transport> {
        self.transports.get(name)
    }

    pub fn encoder_count(&self) -> usize {
        self.encoders.len()
    }

    pub fn transport_count(&self) -> usize {
        self.transports.len()
    }

    /// Bind the encoder `name` to `transport`, initialize it and make it the
    /// active encoder.
    ///
    /// Fails with `NotFound` for an unknown name, `InvalidState` if an
    /// encoder is already active or this entry was committed before, `NoMem`
    /// if the entry has used up its attempts, and with the encoder's own
    /// error if `init` rejects the transport. On failure the active encoder
    /// is unchanged and the entry can be activated again.
    pub fn activate(
        &self,
        name: &str,
        transport: &'static dyn Transport,
        cfg: Option<&EncoderConfig>,
    ) -> Result<&'static TraceEncoder, TraceError> {
        let entry = match self.find_encoder(name) {
            Some(entry) => entry,
            None => {
                log::warn!("No encoder named {}", name);
                return Err(TraceError::NotFound);
            }
        };
        if let Some(current) = self.active() {
            log::warn!(
                "Encoder {} already active, not activating {}",
                current.name(),
                name
            );
            return Err(TraceError::InvalidState);
        }

        let enc = entry.stage(transport)?;
        enc.init(cfg)?;

        let raw = enc as *const TraceEncoder as *mut TraceEncoder;
        self.active
            .compare_exchange(ptr::null_mut(), raw, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| TraceError::InvalidState)?;
        if let Err(err) = entry.commit(enc) {
            // Entry already committed through another tracer
            self.active.store(ptr::null_mut(), Ordering::Release);
            return Err(err);
        }

        log::info!("Tracing with encoder {}", enc.name());
        Ok(enc)
    }

    /// Resolve encoder and transport by name and activate.
    pub fn open(&self, params: &OpenParams<'_>) -> Result<&'static TraceEncoder, TraceError> {
        let transport = match self.find_transport(params.transport_name) {
            Some(transport) => transport,
            None => {
                log::warn!("No transport named {}", params.transport_name);
                return Err(TraceError::NotFound);
            }
        };
        self.activate(params.encoder_name, transport, params.encoder_cfg.as_ref())
    }

    /// The active encoder, if one has been activated.
    #[inline(always)]
    pub fn active(&self) -> Option<&'static TraceEncoder> {
        let enc = self.active.load(Ordering::Acquire);
        // SAFETY: `active` only ever holds null or a handle obtained from an
        // `EncoderEntry` with `'static` lifetime.
        unsafe { enc.as_ref() }
    }

    /// Write raw bytes through the active encoder.
    pub fn write(&self, data: &[u8], timeout: Timeout) -> Result<(), TraceError> {
        let enc = self.active().ok_or(TraceError::InvalidState)?;
        enc.write(data, timeout)
    }

    /// Emit `"[name] text"` through the active encoder.
    pub fn print_event(&self, name: &str, text: &str) -> Result<(), TraceError> {
        let enc = self.active().ok_or(TraceError::InvalidState)?;
        enc.print_event(name, text)
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::ctf::CtfEncoder;
    use crate::event::EventCode;
    use crate::record::HEADER_SIZE;
    use crate::testing::{leak, FakeTransport, FixedClock};

    fn ctf_entry(name: &'static str) -> &'static EncoderEntry {
        let ctf = leak(CtfEncoder::new(leak(FixedClock::new(0, 0))));
        leak(EncoderEntry::new(name, ctf))
    }

    #[test]
    fn register_and_find() {
        let tracer = Tracer::new();
        let entry = ctf_entry("ctf");
        tracer.register_encoder(entry).unwrap();
        tracer
            .register_transport("fake", leak(FakeTransport::new()))
            .unwrap();

        assert!(ptr::eq(tracer.find_encoder("ctf").unwrap(), entry));
        assert!(tracer.find_encoder("CTF").is_none());
        assert!(tracer.find_transport("fake").is_some());
        assert!(tracer.find_transport("uart").is_none());
        assert_eq!(tracer.encoder_count(), 1);
        assert_eq!(tracer.transport_count(), 1);
    }

    #[test]
    fn registration_rules() {
        let tracer = Tracer::new();
        tracer.register_encoder(ctf_entry("ctf")).unwrap();
        assert_eq!(
            tracer.register_encoder(ctf_entry("ctf")),
            Err(TraceError::InvalidState)
        );
        assert_eq!(
            tracer.register_encoder(ctf_entry("")),
            Err(TraceError::InvalidArg)
        );

        const NAMES: [&str; MAX_TRANSPORTS + 1] =
            ["t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7", "t8"];
        for name in NAMES.into_iter().take(MAX_TRANSPORTS) {
            tracer
                .register_transport(name, leak(FakeTransport::new()))
                .unwrap();
        }
        assert_eq!(
            tracer.register_transport(NAMES[MAX_TRANSPORTS], leak(FakeTransport::new())),
            Err(TraceError::NoMem)
        );
    }

    #[test]
    fn unknown_encoder_is_not_found() {
        let tracer = Tracer::new();
        let transport = leak(FakeTransport::new());
        assert_eq!(
            tracer.activate("ctf", transport, None).err(),
            Some(TraceError::NotFound)
        );
        assert!(tracer.active().is_none());
    }

    #[test]
    fn activation_happens_once() {
        let tracer = Tracer::new();
        let first = ctf_entry("ctf");
        tracer.register_encoder(first).unwrap();
        tracer.register_encoder(ctf_entry("alt")).unwrap();
        let transport = leak(FakeTransport::new());

        let enc = tracer.activate("ctf", transport, None).unwrap();
        assert_eq!(enc.name(), "ctf");
        assert!(ptr::eq(first.handle().unwrap(), enc));

        assert_eq!(
            tracer.activate("alt", transport, None).err(),
            Some(TraceError::InvalidState)
        );
        assert_eq!(
            tracer.activate("missing", transport, None).err(),
            Some(TraceError::NotFound)
        );
        assert_eq!(tracer.active().map(|enc| enc.name()), Some("ctf"));
    }

    #[test]
    fn failed_init_leaves_no_active_encoder() {
        let tracer = Tracer::new();
        tracer.register_encoder(ctf_entry("ctf")).unwrap();
        let closed = leak(FakeTransport::not_ready());
        assert_eq!(
            tracer.activate("ctf", closed, None).err(),
            Some(TraceError::InvalidState)
        );
        assert!(tracer.active().is_none());
    }

    #[test]
    fn failed_init_does_not_consume_entry() {
        let tracer = Tracer::new();
        let entry = ctf_entry("ctf");
        tracer.register_encoder(entry).unwrap();

        let closed = leak(FakeTransport::not_ready());
        assert_eq!(
            tracer.activate("ctf", closed, None).err(),
            Some(TraceError::InvalidState)
        );
        assert!(entry.handle().is_none());

        // Sink came up later: the same encoder activates on the retry
        let ready = leak(FakeTransport::new());
        let enc = tracer.activate("ctf", ready, None).unwrap();
        assert!(ptr::eq(entry.handle().unwrap(), enc));
        assert!(ptr::eq(tracer.active().unwrap(), enc));

        tracer.write(b"up", Timeout::INFINITE).unwrap();
        assert_eq!(ready.writes(), [b"up".to_vec()]);
        assert_eq!(closed.calls(), 0);
    }

    #[test]
    fn activation_attempts_are_bounded() {
        let tracer = Tracer::new();
        tracer.register_encoder(ctf_entry("ctf")).unwrap();
        let closed = leak(FakeTransport::not_ready());
        for _ in 0..MAX_BIND_ATTEMPTS {
            assert_eq!(
                tracer.activate("ctf", closed, None).err(),
                Some(TraceError::InvalidState)
            );
        }
        assert_eq!(
            tracer.activate("ctf", leak(FakeTransport::new()), None).err(),
            Some(TraceError::NoMem)
        );
        assert!(tracer.active().is_none());
    }

    #[test]
    fn open_resolves_names() {
        let tracer = Tracer::new();
        tracer.register_encoder(ctf_entry("ctf")).unwrap();
        let transport = leak(FakeTransport::new());
        tracer.register_transport("fake", transport).unwrap();

        assert_eq!(
            tracer.open(&OpenParams::new("ctf", "uart")).err(),
            Some(TraceError::NotFound)
        );
        assert!(tracer.active().is_none());

        let params = OpenParams {
            encoder_cfg: Some(EncoderConfig {
                timeout: Timeout::NO_WAIT,
            }),
            ..OpenParams::new("ctf", "fake")
        };
        tracer.open(&params).unwrap();

        tracer.write(b"raw", Timeout::INFINITE).unwrap();
        assert_eq!(transport.writes(), [b"raw".to_vec()]);
    }

    #[test]
    fn print_event_goes_through_active_encoder() {
        let tracer = Tracer::new();
        assert_eq!(tracer.print_event("boot", "ok"), Err(TraceError::InvalidState));

        let clock = leak(FixedClock::new(0, 1));
        let ctf = leak(CtfEncoder::new(clock));
        tracer
            .register_encoder(leak(EncoderEntry::new("ctf", ctf)))
            .unwrap();
        let transport = leak(FakeTransport::new());
        tracer.activate("ctf", transport, None).unwrap();

        clock.set_cycles(42);
        tracer.print_event("boot", "ok").unwrap();

        let writes = transport.writes();
        let record = &writes[0];
        assert_eq!(&record[..4], &42u32.to_ne_bytes());
        assert_eq!(record[4], EventCode::PrintEvent.as_u8());
        assert_eq!(record[5], 1);
        assert_eq!(&record[HEADER_SIZE..], b"[boot] ok\0");
    }
}
