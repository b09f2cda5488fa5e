//! Link directives for the IoTivity-lite C stack when the `iotivity-lite` feature is on.
//! IOTIVITY_LITE_LIB_DIR adds a search path, IOTIVITY_LITE_LIB overrides the library name.

use std::env;

const DEFAULT_LIB: &str = "iotivity-lite-client-server";

fn main() {
    println!("cargo:rerun-if-env-changed=IOTIVITY_LITE_LIB_DIR");
    println!("cargo:rerun-if-env-changed=IOTIVITY_LITE_LIB");

    if env::var_os("CARGO_FEATURE_IOTIVITY_LITE").is_none() {
        return;
    }
    if let Ok(dir) = env::var("IOTIVITY_LITE_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir);
    }
    let lib = env::var("IOTIVITY_LITE_LIB").unwrap_or_else(|_| DEFAULT_LIB.to_string());
    println!("cargo:rustc-link-lib={}", lib);
}
