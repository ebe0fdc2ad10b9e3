//! Concrete conversion providers.

pub mod builtin;
pub mod chromium;
pub mod ghostscript;
pub mod libreoffice;
pub mod ocrmypdf;

pub use builtin::BuiltinProvider;
pub use chromium::ChromiumProvider;
pub use ghostscript::GhostscriptProvider;
pub use libreoffice::LibreOfficeProvider;
pub use ocrmypdf::OcrMyPdfProvider;
