mod document;
mod error_disclosure;
mod server;
