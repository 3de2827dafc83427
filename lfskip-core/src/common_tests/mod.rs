//! Test suites shared by every reclamation backend.
//!
//! Each function is generic over the `Guard` and is instantiated from the
//! `tests/` directories of `lfskip-core` (DeferredGuard) and
//! `lfskip-crossbeam` (EpochGuard).
