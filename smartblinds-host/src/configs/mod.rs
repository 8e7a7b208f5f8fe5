pub mod settings;

pub use settings::{Blind, Http, Logger, Polling, Server, Settings};
