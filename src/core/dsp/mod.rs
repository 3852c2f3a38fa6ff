//! DSP primitives: windows, real-input FFT, IIR filtering, resampling

pub mod fft;
pub mod filters;
pub mod resample;
pub mod windows;

pub use filters::DspError;
pub use windows::WindowType;
