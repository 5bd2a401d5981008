//! Ports - the abstraction layer.
//!
//! Each trait hides one external concern behind an interface: persistence,
//! retrieval, transformation, artifact storage, notification delivery, time,
//! and ID generation. The aggregation logic only sees these traits, so
//! backends swap without touching the state machine.

pub mod artifact_store;
pub mod callback;
pub mod clock;
pub mod fetcher;
pub mod id_generator;
pub mod record_store;
pub mod transformer;

pub use self::artifact_store::{ArtifactStore, LocalArtifactStore};
pub use self::callback::{CallbackPayload, CallbackSink, HttpCallbackSink};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::fetcher::{HttpFetcher, ImageFetcher};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::record_store::RecordStore;
pub use self::transformer::{ImageTransformer, JpegCompressor};
