//! Voice model backends

// MeloTTS through a persistent Python driver process
pub mod melo;

// espeak-ng command-line fallback
pub mod espeak;
