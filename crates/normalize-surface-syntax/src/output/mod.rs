//! Per-target generators - emit IR as source code.

#[cfg(feature = "write-cpp")]
mod cpp;
#[cfg(feature = "write-go")]
mod go;
#[cfg(feature = "write-java")]
mod java;
#[cfg(feature = "write-javascript")]
mod javascript;
#[cfg(feature = "write-python")]
mod python;
#[cfg(feature = "write-rust")]
mod rust;
// JavaScript renders through the TypeScript emitter
#[cfg(any(feature = "write-typescript", feature = "write-javascript"))]
mod typescript;

#[cfg(feature = "write-cpp")]
pub use cpp::CppGenerator;
#[cfg(feature = "write-go")]
pub use go::GoGenerator;
#[cfg(feature = "write-java")]
pub use java::JavaGenerator;
#[cfg(feature = "write-javascript")]
pub use javascript::JavaScriptGenerator;
#[cfg(feature = "write-python")]
pub use python::PythonGenerator;
#[cfg(feature = "write-rust")]
pub use rust::RustGenerator;
#[cfg(feature = "write-typescript")]
pub use typescript::TypeScriptGenerator;
