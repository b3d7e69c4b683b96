#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]

pub mod chart;
pub mod encode;
pub mod inputs;
pub mod model;
pub mod pipeline;
pub mod present;
pub mod report;
