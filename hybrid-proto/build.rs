//! Build script for hybrid-proto
//!
//! Compiles the hub contract into prost messages and a tonic client.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_prost_build::configure()
        // The agent only ever calls the hub
        .build_server(false)
        .build_client(true)
        .boxed(".altium.plm.custom.ListValue.value")
        .boxed(".altium.plm.custom.Value.typed_value.list_value")
        .compile_protos(&["proto/custom.proto", "proto/reverse.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/custom.proto");
    println!("cargo:rerun-if-changed=proto/reverse.proto");

    Ok(())
}
