// GDAL linking hints; the actual linking happens in gdal-sys.

fn main() {
    println!("cargo:rerun-if-env-changed=GDAL_HOME");
    println!("cargo:rerun-if-env-changed=GDAL_DATA");

    if std::env::var("GDAL_HOME").is_err() {
        println!("cargo:warning=GDAL_HOME not set, detecting GDAL from system paths");
    }
}
