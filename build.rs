// build.rs - Build script for locale-detector
//
// This build script is used for NAPI (Node-API) integration.
// It sets up the build environment for creating Node.js native addons.

fn main() {
    napi_build::setup();
}
