#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod addr;
pub mod endpoint_translator;
pub mod metrics;
mod sink;

pub use self::{
    addr::AddrError,
    endpoint_translator::{EndpointTranslator, TranslatorConfig},
    metrics::TranslatorMetrics,
    sink::{response_stream, BoxUpdateStream, UpdateSink},
};
