fn main() {
    println!("cargo:rerun-if-changed=src/gpu/winograd.cl");
    println!("cargo:rerun-if-env-changed=OPENCL_LIB_DIR");

    // Only configure OpenCL linking when the gpu feature is enabled
    if std::env::var_os("CARGO_FEATURE_GPU").is_some() {
        if let Ok(dir) = std::env::var("OPENCL_LIB_DIR") {
            println!("cargo:rustc-link-search=native={}", dir);
        }
        println!("cargo:rustc-link-lib=OpenCL");
    }
}
