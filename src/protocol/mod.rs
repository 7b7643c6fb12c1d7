//! Wire protocol between the agent and the model.
//!
//! A request is one UTF-8 record terminated by `\r\n`. A reply is one
//! record of `;`-separated fields: field 0 is the next gate time in
//! `MM:DD:YYYY:HH:MM:SS` form, fields 1..N are directives.

pub mod codec;
pub mod decoder;
pub mod gate_time;

pub use codec::RecordCodec;
pub use decoder::{DecodedResponse, Directive, DirectiveQueue};
pub use gate_time::GateTime;
