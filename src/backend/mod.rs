mod http;
pub use http::HttpBackend;

mod mmap;
pub use mmap::MmapBackend;
