//! Messages of the `altium.plm.custom` package, generated from
//! `proto/custom.proto`.

tonic::include_proto!("altium.plm.custom");

pub mod reverse;
